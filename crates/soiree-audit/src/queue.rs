// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The durable event queue.
//!
//! An ordered in-memory buffer of pending events mirrored to a
//! [`KeyValueStore`] on every mutation, so a crash between mutation and
//! persistence cannot occur. Events leave the queue only when a batch
//! containing them is positively acknowledged; the one exception is the
//! overflow policy, which evicts the oldest half as a last resort.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use soiree_audit_core::{AuditEvent, AuditSeverity};

use crate::store::{KeyValueStore, QUEUE_STORAGE_KEY};

/// Bounded, persistently mirrored FIFO of pending audit events.
pub struct DurableQueue {
	store: Box<dyn KeyValueStore>,
	events: Mutex<VecDeque<AuditEvent>>,
	/// Hard ceiling on in-memory queue length.
	max_queue_size: usize,
	/// How many of the newest entries are mirrored to storage.
	max_offline_events: usize,
}

impl DurableQueue {
	/// Creates an empty queue. Call [`DurableQueue::load`] to restore the
	/// previously persisted contents.
	pub fn new(
		store: Box<dyn KeyValueStore>,
		max_queue_size: usize,
		max_offline_events: usize,
	) -> Self {
		Self {
			store,
			events: Mutex::new(VecDeque::new()),
			max_queue_size: max_queue_size.max(1),
			max_offline_events: max_offline_events.max(1),
		}
	}

	/// Restores whatever was last persisted. Entries failing basic shape
	/// validation (missing or malformed id) are dropped silently; a
	/// corrupted blob is discarded wholesale rather than crashing.
	pub fn load(&self) {
		let blob = match self.store.get(QUEUE_STORAGE_KEY) {
			Ok(Some(blob)) => blob,
			Ok(None) => return,
			Err(e) => {
				warn!(error = %e, "failed to read persisted audit queue");
				return;
			}
		};

		let values: Vec<Value> = match serde_json::from_str(&blob) {
			Ok(values) => values,
			Err(e) => {
				warn!(error = %e, "discarding corrupted persisted audit queue");
				let _ = self.store.remove(QUEUE_STORAGE_KEY);
				return;
			}
		};

		let total = values.len();
		let mut restored: VecDeque<AuditEvent> = VecDeque::new();
		for value in values {
			let has_id = value
				.get("id")
				.and_then(Value::as_str)
				.is_some_and(|id| Uuid::parse_str(id).is_ok());
			if !has_id {
				continue;
			}
			if let Ok(event) = serde_json::from_value::<AuditEvent>(value) {
				restored.push_back(event);
			}
		}

		debug!(
			restored = restored.len(),
			dropped = total - restored.len(),
			"restored persisted audit queue"
		);

		let mut events = self.lock();
		*events = restored;
	}

	/// Appends an event, evicting the oldest half (at least one entry)
	/// first if the queue is at capacity, then mirrors the queue to
	/// storage.
	pub fn enqueue(&self, event: AuditEvent) {
		let mut events = self.lock();
		if events.len() >= self.max_queue_size {
			let evicted = (self.max_queue_size / 2).max(1);
			events.drain(..evicted);
			warn!(
				evicted,
				capacity = self.max_queue_size,
				"audit queue overflow, dropped oldest events"
			);
		}
		events.push_back(event);
		self.persist(&events);
	}

	/// Returns clones of the oldest `n` events in enqueue order, leaving
	/// them queued until acknowledged.
	pub fn first_batch(&self, n: usize) -> Vec<AuditEvent> {
		let events = self.lock();
		events.iter().take(n).cloned().collect()
	}

	/// Removes exactly the given events by identity and persists. Removal
	/// by id tolerates concurrent enqueues during a delivery request.
	pub fn acknowledge(&self, ids: &[Uuid]) {
		let mut events = self.lock();
		events.retain(|event| !ids.contains(&event.id));
		self.persist(&events);
	}

	/// Flags the given events as stranded offline (terminal-retry
	/// exhaustion) and persists. The events stay queued.
	pub fn mark_offline(&self, ids: &[Uuid]) {
		let mut events = self.lock();
		for event in events.iter_mut() {
			if ids.contains(&event.id) {
				event.offline_queued = true;
			}
		}
		self.persist(&events);
	}

	/// Number of queued events.
	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	/// Number of queued events at `High` severity or above.
	pub fn urgent_len(&self) -> usize {
		self.lock()
			.iter()
			.filter(|event| event.severity >= AuditSeverity::High)
			.count()
	}

	/// The oldest queued event, if any.
	pub fn peek(&self) -> Option<AuditEvent> {
		self.lock().front().cloned()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AuditEvent>> {
		// The queue is only mutated from pipeline tasks; a poisoned lock
		// means one of them panicked mid-mutation, and the data is still
		// structurally sound.
		self.events
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Mirrors the newest `max_offline_events` entries to storage. Older
	/// unpersisted entries survive only in memory. Storage failures are
	/// logged and the in-memory queue keeps working.
	fn persist(&self, events: &VecDeque<AuditEvent>) {
		let skip = events.len().saturating_sub(self.max_offline_events);
		let persisted: Vec<&AuditEvent> = events.iter().skip(skip).collect();
		match serde_json::to_string(&persisted) {
			Ok(blob) => {
				if let Err(e) = self.store.set(QUEUE_STORAGE_KEY, &blob) {
					warn!(error = %e, "failed to persist audit queue");
				}
			}
			Err(e) => warn!(error = %e, "failed to serialize audit queue"),
		}
	}
}
