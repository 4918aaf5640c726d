// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-process publish/subscribe for UI observers.
//!
//! Listeners are notified synchronously whenever an event is created
//! locally or received over the real-time channel, independent of
//! delivery status. A panicking handler is isolated: it neither stops
//! the remaining handlers nor reaches the publisher.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::warn;

use soiree_audit_core::AuditEvent;

type Handler = Arc<dyn Fn(&AuditEvent) + Send + Sync>;

/// Synchronous fan-out registry for audit events.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
	handlers: Arc<Mutex<HashMap<u64, Handler>>>,
	next_id: Arc<AtomicU64>,
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a handler. Dropping the returned [`Subscription`] (or
	/// calling [`Subscription::unsubscribe`]) removes it.
	pub fn subscribe(&self, handler: impl Fn(&AuditEvent) + Send + Sync + 'static) -> Subscription {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.lock().insert(id, Arc::new(handler));
		Subscription {
			id,
			handlers: Arc::downgrade(&self.handlers),
		}
	}

	/// Invokes every handler with the event; no iteration order is
	/// guaranteed. Handler panics are caught and logged.
	pub fn publish(&self, event: &AuditEvent) {
		let handlers: Vec<Handler> = self.lock().values().cloned().collect();
		for handler in handlers {
			if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
				warn!(
					event_id = %event.id,
					action = %event.action,
					"audit listener panicked, continuing"
				);
			}
		}
	}

	/// Number of registered handlers.
	pub fn listener_count(&self) -> usize {
		self.lock().len()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Handler>> {
		self.handlers
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

/// Handle returned by [`ListenerRegistry::subscribe`]. The handler stays
/// registered for the lifetime of this value.
pub struct Subscription {
	id: u64,
	handlers: Weak<Mutex<HashMap<u64, Handler>>>,
}

impl Subscription {
	/// Removes the handler now instead of waiting for drop.
	pub fn unsubscribe(self) {
		// Drop does the actual removal.
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(handlers) = self.handlers.upgrade() {
			if let Ok(mut handlers) = handlers.lock() {
				handlers.remove(&self.id);
			}
		}
	}
}
