// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The audit event record and its builder.
//!
//! An [`AuditEvent`] is immutable once it enters the durable queue, with
//! one exception: the `offline_queued` flag may be flipped to `true` when
//! delivery retries are exhausted or the event was created offline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::action::AuditAction;
use crate::actor::Actor;
use crate::change::FieldChange;
use crate::severity::AuditSeverity;

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
	#[default]
	Success,
	Failure,
}

/// A fully-populated audit event.
///
/// The `id` is generated client-side and sufficiently random for the
/// server to dedupe across retries and the immediate-send path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
	pub id: Uuid,
	pub action: AuditAction,
	pub resource_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub resource_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub resource_name: Option<String>,
	pub actor: Actor,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub changes: Option<Vec<FieldChange>>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	pub severity: AuditSeverity,
	pub status: EventStatus,
	/// Server-facing event time, client clock.
	pub timestamp: DateTime<Utc>,
	/// Creation time on the client, preserved verbatim across retries.
	pub client_timestamp: DateTime<Utc>,
	/// True when the event was created offline or stranded by retry
	/// exhaustion.
	#[serde(default)]
	pub offline_queued: bool,
}

impl AuditEvent {
	/// Starts building an event for the given action and resource type.
	pub fn builder(action: AuditAction, resource_type: impl Into<String>) -> AuditEventBuilder {
		AuditEventBuilder::new(action, resource_type)
	}
}

/// Builder for [`AuditEvent`] with a fluent API.
///
/// Severity defaults to the action's auto-detected tier unless the
/// producer supplies one explicitly.
#[derive(Debug, Clone)]
pub struct AuditEventBuilder {
	action: AuditAction,
	resource_type: String,
	resource_id: Option<String>,
	resource_name: Option<String>,
	actor: Option<Actor>,
	changes: Option<Vec<FieldChange>>,
	metadata: Map<String, Value>,
	severity: Option<AuditSeverity>,
	status: EventStatus,
	offline_queued: bool,
}

impl AuditEventBuilder {
	/// Creates a new builder. Only the action and resource type are
	/// required; everything else is optional.
	pub fn new(action: AuditAction, resource_type: impl Into<String>) -> Self {
		Self {
			action,
			resource_type: resource_type.into(),
			resource_id: None,
			resource_name: None,
			actor: None,
			changes: None,
			metadata: Map::new(),
			severity: None,
			status: EventStatus::Success,
			offline_queued: false,
		}
	}

	/// Sets the id and display name of the affected resource.
	pub fn resource(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
		self.resource_id = Some(id.into());
		self.resource_name = Some(name.into());
		self
	}

	/// Sets the id of the affected resource.
	pub fn resource_id(mut self, id: impl Into<String>) -> Self {
		self.resource_id = Some(id.into());
		self
	}

	/// Sets the display name of the affected resource.
	pub fn resource_name(mut self, name: impl Into<String>) -> Self {
		self.resource_name = Some(name.into());
		self
	}

	/// Sets the actor. Defaults to [`Actor::system`].
	pub fn actor(mut self, actor: Actor) -> Self {
		self.actor = Some(actor);
		self
	}

	/// Attaches field-level changes (update-family events).
	pub fn changes(mut self, changes: Vec<FieldChange>) -> Self {
		self.changes = Some(changes);
		self
	}

	/// Adds a metadata entry.
	pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
		self.metadata.insert(key.into(), value);
		self
	}

	/// Overrides the auto-detected severity.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	/// Sets the operation outcome. Defaults to `Success`.
	pub fn status(mut self, status: EventStatus) -> Self {
		self.status = status;
		self
	}

	/// Marks the event as created while the network was unavailable.
	pub fn offline_queued(mut self, offline: bool) -> Self {
		self.offline_queued = offline;
		self
	}

	/// Builds the event, stamping id, timestamps, and severity.
	pub fn build(self) -> AuditEvent {
		let now = Utc::now();
		let severity = self
			.severity
			.unwrap_or_else(|| self.action.default_severity(self.status));
		AuditEvent {
			id: Uuid::new_v4(),
			action: self.action,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			resource_name: self.resource_name,
			actor: self.actor.unwrap_or_default(),
			changes: self.changes,
			metadata: self.metadata,
			severity,
			status: self.status,
			timestamp: now,
			client_timestamp: now,
			offline_queued: self.offline_queued,
		}
	}
}
