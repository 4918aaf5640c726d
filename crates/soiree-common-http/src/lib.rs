// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Soiree.
//!
//! This crate provides:
//! - A pre-configured HTTP client with consistent User-Agent header
//! - Retry/backoff arithmetic for transient delivery failures

mod client;
mod retry;

pub use client::{builder, new_client, new_client_with_timeout, user_agent};
pub use retry::{RetryConfig, RetryableError};
