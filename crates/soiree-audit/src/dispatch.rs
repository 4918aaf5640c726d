// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Batch delivery to the ingestion endpoint.
//!
//! The dispatcher watches the durable queue and flushes when either the
//! size threshold is reached or the debounce window after the first
//! unflushed event elapses. One batch is in flight at a time; failures
//! retry with exponential backoff up to the retry ceiling, after which
//! the affected events are flagged `offline_queued` and wait for the
//! next organic trigger (enqueue, timer, reconnect).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use soiree_audit_core::{AuditEvent, IngestBatch};
use soiree_common_http::{RetryConfig, RetryableError};

use crate::connectivity::ConnectivityProbe;
use crate::error::DeliveryError;
use crate::queue::DurableQueue;

/// Delivers one batch to the ingestion endpoint.
#[async_trait]
pub trait IngestSink: Send + Sync {
	async fn send_batch(&self, batch: IngestBatch) -> Result<(), DeliveryError>;
}

/// HTTP sink: `POST { events: [...] }`, any non-2xx or transport error
/// is a batch failure. Requests carry an explicit timeout so a hung
/// request cannot hold the single-flight guard indefinitely.
pub struct HttpIngestSink {
	client: reqwest::Client,
	url: String,
	api_token: Option<String>,
}

impl HttpIngestSink {
	pub fn new(url: impl Into<String>, timeout: Duration, api_token: Option<String>) -> Self {
		Self {
			client: soiree_common_http::new_client_with_timeout(timeout),
			url: url.into(),
			api_token,
		}
	}
}

#[async_trait]
impl IngestSink for HttpIngestSink {
	async fn send_batch(&self, batch: IngestBatch) -> Result<(), DeliveryError> {
		let mut request = self.client.post(&self.url).json(&batch);
		if let Some(token) = &self.api_token {
			request = request.header("Authorization", format!("Bearer {token}"));
		}

		let response = request
			.send()
			.await
			.map_err(|e| DeliveryError::Transport(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(DeliveryError::Status {
				status: status.as_u16(),
				message,
			});
		}
		Ok(())
	}
}

/// Result of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
	/// The batch was acknowledged and removed from the queue.
	Delivered(usize),
	/// Nothing to send.
	Empty,
	/// Network reported offline; nothing attempted, no timer rescheduled.
	Offline,
	/// Another send was already in flight.
	InFlight,
	/// Retry budget exhausted; the events stay queued, flagged
	/// `offline_queued`, until the next organic trigger.
	Stranded(usize),
}

/// Tuning for the dispatcher, derived from
/// [`crate::config::AuditConfig`].
#[derive(Debug, Clone)]
pub struct DispatchConfig {
	pub batch_size: usize,
	pub batch_interval: Duration,
	pub retry: RetryConfig,
}

/// The batch dispatcher. Shared behind an `Arc` between the background
/// run loop and callers triggering explicit flushes.
pub struct BatchDispatcher {
	queue: Arc<DurableQueue>,
	sink: Arc<dyn IngestSink>,
	probe: Arc<dyn ConnectivityProbe>,
	config: DispatchConfig,
	/// Single-flight guard: overlapping triggers must not race to
	/// remove/re-send the same queue entries.
	sending: Mutex<()>,
	flush_notify: Notify,
	shutdown: AtomicBool,
	last_sync: StdMutex<Option<DateTime<Utc>>>,
}

impl BatchDispatcher {
	pub fn new(
		queue: Arc<DurableQueue>,
		sink: Arc<dyn IngestSink>,
		probe: Arc<dyn ConnectivityProbe>,
		config: DispatchConfig,
	) -> Self {
		Self {
			queue,
			sink,
			probe,
			config,
			sending: Mutex::new(()),
			flush_notify: Notify::new(),
			shutdown: AtomicBool::new(false),
			last_sync: StdMutex::new(None),
		}
	}

	/// Wakes the run loop to re-evaluate its triggers. Called after every
	/// enqueue and on connectivity transitions.
	pub fn poke(&self) {
		self.flush_notify.notify_one();
	}

	/// Signals the run loop to stop after one best-effort final flush.
	pub fn shutdown(&self) {
		self.shutdown.store(true, Ordering::SeqCst);
		self.flush_notify.notify_one();
	}

	pub fn is_shutdown(&self) -> bool {
		self.shutdown.load(Ordering::SeqCst)
	}

	/// When the last batch was positively acknowledged.
	pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
		*self
			.last_sync
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Flushes up to one batch, retrying transient failures with
	/// exponential backoff until the retry ceiling.
	///
	/// Awaiting this method is the deterministic way to know a dispatch
	/// cycle completed; the background loop calls it too.
	pub async fn flush(&self) -> FlushOutcome {
		let outcome = self.flush_locked().await;
		if outcome != FlushOutcome::InFlight {
			// The guard is released; wake anything parked waiting for it.
			self.flush_notify.notify_one();
		}
		outcome
	}

	async fn flush_locked(&self) -> FlushOutcome {
		let Ok(_guard) = self.sending.try_lock() else {
			return FlushOutcome::InFlight;
		};

		if self.queue.is_empty() {
			return FlushOutcome::Empty;
		}
		if !self.probe.is_online() {
			debug!("skipping audit flush while offline");
			return FlushOutcome::Offline;
		}

		let batch = self.queue.first_batch(self.config.batch_size);
		let ids: Vec<Uuid> = batch.iter().map(|e| e.id).collect();
		let count = batch.len();

		let mut attempt = 0u32;
		loop {
			match self
				.sink
				.send_batch(IngestBatch::new(batch.clone()))
				.await
			{
				Ok(()) => {
					// Remove by identity: enqueues that happened during the
					// request stay queued.
					self.queue.acknowledge(&ids);
					*self
						.last_sync
						.lock()
						.unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Utc::now());
					debug!(delivered = count, "audit batch delivered");
					return FlushOutcome::Delivered(count);
				}
				Err(e) => {
					attempt += 1;
					warn!(
						attempt,
						max_retries = self.config.retry.max_retries,
						error = %e,
						"audit batch delivery failed"
					);
					// Rejections (4xx) will not improve with retries.
					if !e.is_retryable() || attempt >= self.config.retry.max_retries {
						self.queue.mark_offline(&ids);
						warn!(
							stranded = count,
							"retry budget exhausted, events remain queued for the next trigger"
						);
						return FlushOutcome::Stranded(count);
					}
					self.config.retry.wait_for_attempt(attempt).await;
				}
			}
		}
	}

	/// Sends one event as its own singleton batch, bypassing the size
	/// threshold, the debounce timer, and the single-flight guard.
	///
	/// Failure is swallowed after a log line: the event is already in the
	/// durable queue, so the batch path delivers it eventually and the
	/// server dedupes by event id.
	pub async fn send_immediate(&self, event: AuditEvent) {
		let event_id = event.id;
		match self.sink.send_batch(IngestBatch::new(vec![event])).await {
			Ok(()) => debug!(%event_id, "urgent event delivered immediately"),
			Err(e) => debug!(
				%event_id,
				error = %e,
				"immediate send failed, event remains queued"
			),
		}
	}

	/// Background loop: debounce timer + threshold triggers.
	pub async fn run(&self) {
		info!(
			batch_size = self.config.batch_size,
			interval_ms = self.config.batch_interval.as_millis() as u64,
			"starting audit batch dispatcher"
		);

		// Armed when the first unflushed event is queued; cleared on flush.
		let mut deadline: Option<Instant> = None;

		loop {
			if self.is_shutdown() {
				break;
			}

			// Offline or idle: park until an enqueue/online signal. No
			// timer is rescheduled while offline.
			if self.queue.is_empty() || !self.probe.is_online() {
				deadline = None;
				self.flush_notify.notified().await;
				continue;
			}

			if self.queue.len() < self.config.batch_size {
				let at = *deadline.get_or_insert_with(|| Instant::now() + self.config.batch_interval);
				tokio::select! {
					_ = tokio::time::sleep_until(at) => {}
					_ = self.flush_notify.notified() => {
						// Re-evaluate triggers; the debounce deadline stays
						// anchored to the first unflushed event.
						continue;
					}
				}
			}

			deadline = None;
			match self.flush().await {
				// Stranded: stop retrying until the next organic trigger.
				// InFlight: the guard holder notifies when it finishes;
				// never spin against it.
				FlushOutcome::Stranded(_) | FlushOutcome::InFlight => {
					self.flush_notify.notified().await;
				}
				_ => {}
			}
		}

		self.flush_once_best_effort().await;
		info!("audit batch dispatcher stopped");
	}

	/// One send attempt with no retries, used on shutdown. Inherently
	/// best-effort: the process may die mid-send.
	async fn flush_once_best_effort(&self) {
		let Ok(_guard) = self.sending.try_lock() else {
			return;
		};
		if self.queue.is_empty() || !self.probe.is_online() {
			return;
		}

		let batch = self.queue.first_batch(self.config.batch_size);
		let ids: Vec<Uuid> = batch.iter().map(|e| e.id).collect();
		match self.sink.send_batch(IngestBatch::new(batch)).await {
			Ok(()) => {
				self.queue.acknowledge(&ids);
				debug!(delivered = ids.len(), "final audit flush delivered");
			}
			Err(e) => debug!(error = %e, "final audit flush failed"),
		}
	}
}
