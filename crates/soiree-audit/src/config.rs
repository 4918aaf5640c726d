// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pipeline configuration.

use std::time::Duration;

use serde::Deserialize;

use soiree_common_http::RetryConfig;

/// Tuning knobs for the audit pipeline.
///
/// `Default` carries the production constants; only the endpoint URLs
/// have no sensible default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
	/// Ingestion endpoint accepting `POST { events: [...] }`.
	pub ingest_url: String,
	/// Real-time channel URL (ws/wss or http/https, mapped to ws). `None`
	/// disables the fan-out client.
	pub realtime_url: Option<String>,
	/// Bearer token attached to ingestion requests.
	pub api_token: Option<String>,

	/// Flush as soon as this many events are queued.
	pub batch_size: usize,
	/// Debounce window after the first unflushed event.
	#[serde(with = "duration_ms")]
	pub batch_interval: Duration,
	/// Hard ceiling on the in-memory queue.
	pub max_queue_size: usize,
	/// How many queued events are mirrored to persistent storage.
	pub max_offline_events: usize,

	/// Delivery retry attempts per batch before stranding the events.
	pub max_retries: u32,
	/// First retry delay; doubles per attempt.
	#[serde(with = "duration_ms")]
	pub retry_base_delay: Duration,
	/// Ceiling on any single retry delay.
	#[serde(with = "duration_ms")]
	pub retry_max_delay: Duration,
	/// Per-request timeout so a hung request cannot hold the dispatcher.
	#[serde(with = "duration_ms")]
	pub request_timeout: Duration,

	/// Consecutive real-time reconnect attempts before giving up.
	pub max_reconnect_attempts: u32,
	/// First reconnect delay; doubles per attempt.
	#[serde(with = "duration_ms")]
	pub reconnect_base_delay: Duration,
}

impl Default for AuditConfig {
	fn default() -> Self {
		Self {
			ingest_url: String::new(),
			realtime_url: None,
			api_token: None,
			batch_size: 10,
			batch_interval: Duration::from_secs(30),
			max_queue_size: 500,
			max_offline_events: 100,
			max_retries: 3,
			retry_base_delay: Duration::from_secs(1),
			retry_max_delay: Duration::from_secs(60),
			request_timeout: Duration::from_secs(10),
			max_reconnect_attempts: 5,
			reconnect_base_delay: Duration::from_secs(1),
		}
	}
}

impl AuditConfig {
	/// Production defaults pointed at the given ingestion endpoint.
	pub fn new(ingest_url: impl Into<String>) -> Self {
		Self {
			ingest_url: ingest_url.into(),
			..Self::default()
		}
	}

	/// Enables the real-time fan-out client.
	pub fn with_realtime_url(mut self, url: impl Into<String>) -> Self {
		self.realtime_url = Some(url.into());
		self
	}

	/// Attaches a bearer token to ingestion requests.
	pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
		self.api_token = Some(token.into());
		self
	}

	/// The delivery retry schedule derived from this config.
	pub fn retry_config(&self) -> RetryConfig {
		RetryConfig {
			max_retries: self.max_retries,
			base_delay: self.retry_base_delay,
			max_delay: self.retry_max_delay,
			jitter: false,
		}
	}

	/// The reconnect backoff schedule for the real-time client.
	pub fn reconnect_config(&self) -> RetryConfig {
		RetryConfig {
			max_retries: self.max_reconnect_attempts,
			base_delay: self.reconnect_base_delay,
			max_delay: self.retry_max_delay,
			jitter: true,
		}
	}
}

mod duration_ms {
	use serde::{Deserialize, Deserializer};
	use std::time::Duration;

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		let millis = u64::deserialize(deserializer)?;
		Ok(Duration::from_millis(millis))
	}
}
