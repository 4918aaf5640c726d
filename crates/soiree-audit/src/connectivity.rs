// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Network availability reporting.
//!
//! The pipeline asks a [`ConnectivityProbe`] before dispatching rather
//! than binding to any runtime's notion of "online". Hosts flip a
//! [`SharedProbe`] from their own connectivity events and then call
//! [`crate::pipeline::AuditPipeline::notify_online`] to wake the
//! dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reports whether the network is currently believed reachable.
pub trait ConnectivityProbe: Send + Sync {
	fn is_online(&self) -> bool;
}

/// Probe for hosts without connectivity signals; always reports online.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
	fn is_online(&self) -> bool {
		true
	}
}

/// A flag-backed probe the host application updates.
#[derive(Debug, Clone)]
pub struct SharedProbe {
	online: Arc<AtomicBool>,
}

impl SharedProbe {
	/// Creates a probe with the given initial state.
	pub fn new(online: bool) -> Self {
		Self {
			online: Arc::new(AtomicBool::new(online)),
		}
	}

	/// Updates the reported state.
	pub fn set_online(&self, online: bool) {
		self.online.store(online, Ordering::SeqCst);
	}
}

impl Default for SharedProbe {
	fn default() -> Self {
		Self::new(true)
	}
}

impl ConnectivityProbe for SharedProbe {
	fn is_online(&self) -> bool {
		self.online.load(Ordering::SeqCst)
	}
}
