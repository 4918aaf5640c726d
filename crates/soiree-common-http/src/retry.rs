// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry arithmetic with exponential backoff for transient failures.

use std::time::Duration;

/// Classifies errors as retryable (transient) or not (permanent).
pub trait RetryableError {
	/// Returns true if the operation that produced this error may
	/// succeed on a later attempt.
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}
		match self.status() {
			Some(status) => status.is_server_error() || status.as_u16() == 429,
			// No status means the request never completed (transport error).
			None => !self.is_builder(),
		}
	}
}

/// Configuration for exponential backoff between retry attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Maximum number of retry attempts before giving up.
	pub max_retries: u32,
	/// Delay before the first retry; doubles on each subsequent attempt.
	pub base_delay: Duration,
	/// Ceiling applied to the computed delay.
	pub max_delay: Duration,
	/// Randomize each delay by up to +/-25% to avoid thundering herds.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(60),
			jitter: false,
		}
	}
}

impl RetryConfig {
	/// Returns the delay before retry attempt `attempt` (1-based), or
	/// `None` once the retry budget is exhausted.
	///
	/// The schedule is `base_delay * 2^(attempt - 1)`, capped at
	/// `max_delay`, so consecutive delays strictly increase until the cap.
	pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
		if attempt == 0 || attempt > self.max_retries {
			return None;
		}

		let exp = attempt.saturating_sub(1).min(31);
		let delay = self
			.base_delay
			.saturating_mul(1u32 << exp)
			.min(self.max_delay);

		if self.jitter {
			let millis = delay.as_millis() as u64;
			let spread = millis / 4;
			let jittered = millis - spread + fastrand::u64(0..=spread * 2);
			Some(Duration::from_millis(jittered).min(self.max_delay))
		} else {
			Some(delay)
		}
	}

	/// Sleeps for the computed delay, logging the wait. Returns false if
	/// the retry budget is exhausted.
	pub async fn wait_for_attempt(&self, attempt: u32) -> bool {
		match self.delay_for_attempt(attempt) {
			Some(delay) => {
				tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
				tokio::time::sleep(delay).await;
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(max_retries: u32) -> RetryConfig {
		RetryConfig {
			max_retries,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_secs(10),
			jitter: false,
		}
	}

	#[test]
	fn delays_double_per_attempt() {
		let config = config(4);
		assert_eq!(
			config.delay_for_attempt(1),
			Some(Duration::from_millis(100))
		);
		assert_eq!(
			config.delay_for_attempt(2),
			Some(Duration::from_millis(200))
		);
		assert_eq!(
			config.delay_for_attempt(3),
			Some(Duration::from_millis(400))
		);
		assert_eq!(
			config.delay_for_attempt(4),
			Some(Duration::from_millis(800))
		);
	}

	#[test]
	fn delays_strictly_increase_until_cap() {
		let config = config(10);
		let mut previous = Duration::ZERO;
		for attempt in 1..=10 {
			let delay = config.delay_for_attempt(attempt).unwrap();
			assert!(delay >= previous, "attempt {attempt} regressed");
			assert!(delay <= config.max_delay);
			previous = delay;
		}
	}

	#[test]
	fn exhausted_budget_returns_none() {
		let config = config(3);
		assert!(config.delay_for_attempt(4).is_none());
		assert!(config.delay_for_attempt(0).is_none());
	}

	#[test]
	fn cap_applies_to_large_attempts() {
		let config = RetryConfig {
			max_retries: 40,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(30),
			jitter: false,
		};
		assert_eq!(
			config.delay_for_attempt(40),
			Some(Duration::from_secs(30))
		);
	}

	#[test]
	fn wait_reports_exhaustion() {
		let config = config(1);
		assert!(tokio_test::block_on(config.wait_for_attempt(1)));
		assert!(!tokio_test::block_on(config.wait_for_attempt(2)));
	}

	#[test]
	fn jitter_stays_within_spread() {
		let config = RetryConfig {
			max_retries: 3,
			base_delay: Duration::from_millis(1000),
			max_delay: Duration::from_secs(60),
			jitter: true,
		};
		for _ in 0..100 {
			let delay = config.delay_for_attempt(1).unwrap();
			assert!(delay >= Duration::from_millis(750));
			assert!(delay <= Duration::from_millis(1250));
		}
	}
}
