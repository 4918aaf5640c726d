// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Creates a new HTTP client with the standard Soiree User-Agent header.
///
/// The User-Agent format is: `soiree/{version}`
/// Example: `soiree/0.1.0`
pub fn new_client() -> Client {
	builder().build().expect("failed to build HTTP client")
}

/// Creates a new HTTP client builder with the standard Soiree User-Agent header.
///
/// Use this when you need to customize the client (e.g., set timeout).
///
/// # Example
/// ```ignore
/// let client = soiree_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with a custom timeout and the standard User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> Client {
	builder()
		.timeout(timeout)
		.build()
		.expect("failed to build HTTP client")
}

/// Returns the standard Soiree User-Agent string.
///
/// Format: `soiree/{version}`
pub fn user_agent() -> String {
	format!("soiree/{}", env!("CARGO_PKG_VERSION"))
}
