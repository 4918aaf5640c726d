// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use soiree_common_http::RetryableError;
use thiserror::Error;

/// Errors internal to the audit pipeline.
///
/// None of these ever reach a producer call-site: recording an audit
/// event is fire-and-forget, and the pipeline absorbs failures by
/// logging and retrying.
#[derive(Error, Debug)]
pub enum AuditError {
	#[error("storage error: {0}")]
	Storage(#[from] StoreError),

	#[error("delivery error: {0}")]
	Delivery(#[from] DeliveryError),

	#[error("real-time channel error: {0}")]
	Realtime(String),

	#[error("configuration error: {0}")]
	Config(String),
}

/// Errors from the persistent key/value store backing the queue mirror.
#[derive(Error, Debug)]
pub enum StoreError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("store unavailable: {0}")]
	Unavailable(String),
}

/// Errors from one batch delivery attempt against the ingestion endpoint.
#[derive(Error, Debug)]
pub enum DeliveryError {
	/// The endpoint answered with a non-2xx status.
	#[error("ingestion endpoint returned {status}: {message}")]
	Status { status: u16, message: String },

	/// The request never completed (connect/timeout/transport failure).
	#[error("transport error: {0}")]
	Transport(String),
}

impl RetryableError for DeliveryError {
	fn is_retryable(&self) -> bool {
		match self {
			DeliveryError::Status { status, .. } => {
				matches!(*status, 429 | 408) || (500..600).contains(status)
			}
			DeliveryError::Transport(_) => true,
		}
	}
}
