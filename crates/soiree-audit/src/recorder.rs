// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Convenience verbs over [`AuditPipeline::record`].
//!
//! Call sites record the common actions without assembling an
//! [`EventInput`] by hand; the recorder picks the action, status, and
//! field diffs for them.

use serde_json::Value;

use soiree_audit_core::{diff_values, AuditAction, AuditEvent, EventStatus};

use crate::factory::EventInput;
use crate::pipeline::AuditPipeline;

/// Thin, cloneable facade over a pipeline.
#[derive(Clone)]
pub struct AuditRecorder {
	pipeline: AuditPipeline,
}

impl AuditRecorder {
	pub fn new(pipeline: AuditPipeline) -> Self {
		Self { pipeline }
	}

	pub fn created(&self, resource_type: &str, resource_id: &str, name: &str) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::Create, resource_type)
				.resource_id(resource_id)
				.resource_name(name),
		)
	}

	/// Records an update with a structural diff of the before/after
	/// snapshots. No-change updates are still recorded, with an empty
	/// change list.
	pub fn updated(
		&self,
		resource_type: &str,
		resource_id: &str,
		name: &str,
		before: &Value,
		after: &Value,
	) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::Update, resource_type)
				.resource_id(resource_id)
				.resource_name(name)
				.changes(diff_values(before, after)),
		)
	}

	pub fn deleted(&self, resource_type: &str, resource_id: &str, name: &str) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::Delete, resource_type)
				.resource_id(resource_id)
				.resource_name(name),
		)
	}

	pub fn bulk_deleted(&self, resource_type: &str, count: usize) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::BulkDelete, resource_type)
				.metadata("count", Value::from(count)),
		)
	}

	pub fn logged_in(&self) -> AuditEvent {
		self.pipeline
			.record(EventInput::new(AuditAction::Login, "session"))
	}

	/// A failed login attempt. `identifier` is whatever the attempt was
	/// made with, not necessarily a known account.
	pub fn login_failed(&self, identifier: &str) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::LoginFailed, "session")
				.status(EventStatus::Failure)
				.metadata("identifier", Value::String(identifier.to_string())),
		)
	}

	pub fn logged_out(&self) -> AuditEvent {
		self.pipeline
			.record(EventInput::new(AuditAction::Logout, "session"))
	}

	pub fn exported(&self, resource_type: &str, format: &str, count: usize) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::Export, resource_type)
				.metadata("format", Value::String(format.to_string()))
				.metadata("count", Value::from(count)),
		)
	}

	pub fn imported(&self, resource_type: &str, count: usize) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::Import, resource_type)
				.metadata("count", Value::from(count)),
		)
	}

	pub fn published(&self, resource_type: &str, resource_id: &str, name: &str) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::Publish, resource_type)
				.resource_id(resource_id)
				.resource_name(name),
		)
	}

	pub fn permission_denied(&self, resource_type: &str, attempted: &str) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::PermissionDenied, resource_type)
				.status(EventStatus::Failure)
				.metadata("attempted", Value::String(attempted.to_string())),
		)
	}

	pub fn permission_changed(
		&self,
		granted: bool,
		subject: &str,
		permission: &str,
	) -> AuditEvent {
		let action = if granted {
			AuditAction::PermissionGrant
		} else {
			AuditAction::PermissionRevoke
		};
		self.pipeline.record(
			EventInput::new(action, "permission")
				.resource_name(permission)
				.metadata("subject", Value::String(subject.to_string())),
		)
	}

	pub fn system_error(&self, message: &str) -> AuditEvent {
		self.pipeline.record(
			EventInput::new(AuditAction::SystemError, "system")
				.status(EventStatus::Failure)
				.metadata("message", Value::String(message.to_string())),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::AuditConfig;
	use crate::connectivity::SharedProbe;
	use crate::dispatch::IngestSink;
	use crate::error::DeliveryError;
	use crate::store::MemoryStore;
	use async_trait::async_trait;
	use serde_json::json;
	use soiree_audit_core::{AuditSeverity, IngestBatch};
	use std::sync::Arc;

	struct NullSink;

	#[async_trait]
	impl IngestSink for NullSink {
		async fn send_batch(&self, _batch: IngestBatch) -> Result<(), DeliveryError> {
			Ok(())
		}
	}

	fn recorder() -> AuditRecorder {
		// Offline probe keeps events queued and suppresses immediate sends,
		// so assertions only see factory output.
		let pipeline = AuditPipeline::builder(AuditConfig::default())
			.ingest_sink(Arc::new(NullSink))
			.store(Box::new(MemoryStore::new()))
			.connectivity(Arc::new(SharedProbe::new(false)))
			.build()
			.unwrap();
		AuditRecorder::new(pipeline)
	}

	#[test]
	fn updated_diffs_snapshots() {
		let recorder = recorder();
		let before = json!({"name": "Launch Party", "capacity": 100});
		let after = json!({"name": "Launch Party", "capacity": 150});

		let event = recorder.updated("event", "ev_1", "Launch Party", &before, &after);

		let changes = event.changes.unwrap();
		assert_eq!(changes.len(), 1);
		assert_eq!(changes[0].field, "capacity");
		assert_eq!(changes[0].old_value, json!(100));
		assert_eq!(changes[0].new_value, json!(150));
	}

	#[test]
	fn login_failed_is_critical() {
		let recorder = recorder();
		let event = recorder.login_failed("mallory@example.com");
		assert_eq!(event.severity, AuditSeverity::Critical);
		assert_eq!(event.status, EventStatus::Failure);
		assert_eq!(
			event.metadata["identifier"],
			json!("mallory@example.com")
		);
	}

	#[test]
	fn deleted_is_high_severity() {
		let recorder = recorder();
		let event = recorder.deleted("guest", "g_7", "Alice");
		assert_eq!(event.severity, AuditSeverity::High);
		assert_eq!(event.resource_id.as_deref(), Some("g_7"));
	}

	#[test]
	fn permission_changed_picks_direction() {
		let recorder = recorder();
		let granted = recorder.permission_changed(true, "alice", "events.write");
		let revoked = recorder.permission_changed(false, "alice", "events.write");
		assert_eq!(granted.action, AuditAction::PermissionGrant);
		assert_eq!(revoked.action, AuditAction::PermissionRevoke);
		// Revocation is treated as destructive.
		assert_eq!(revoked.severity, AuditSeverity::High);
		assert_eq!(granted.severity, AuditSeverity::Medium);
	}

	#[test]
	fn export_carries_shape_metadata() {
		let recorder = recorder();
		let event = recorder.exported("guest_list", "csv", 42);
		assert_eq!(event.severity, AuditSeverity::Medium);
		assert_eq!(event.metadata["format"], json!("csv"));
		assert_eq!(event.metadata["count"], json!(42));
	}
}
