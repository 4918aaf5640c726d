// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Event construction.
//!
//! The factory turns a terse [`EventInput`] into a fully-populated
//! [`AuditEvent`]: actor identity, timestamps, auto-detected severity,
//! and environment metadata. It is pure with respect to queue state —
//! creating an event never enqueues it.

use std::sync::Arc;

use serde_json::{Map, Value};

use soiree_audit_core::{
	Actor, AuditAction, AuditEvent, AuditSeverity, EventStatus, FieldChange,
};

use crate::connectivity::ConnectivityProbe;

/// Resolves the currently authenticated identity at event creation time.
pub trait ActorProvider: Send + Sync {
	fn current_actor(&self) -> Actor;
}

/// Provider for unattended hosts; always attributes to the system actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemActorProvider;

impl ActorProvider for SystemActorProvider {
	fn current_actor(&self) -> Actor {
		Actor::system()
	}
}

/// Supplies the environment metadata injected into every event.
pub trait ContextProvider: Send + Sync {
	/// The location the actor was viewing when the event was produced.
	fn current_url(&self) -> Option<String>;
	/// Where the actor navigated from.
	fn referrer(&self) -> Option<String>;
}

/// Context provider for hosts with no navigation concept.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

impl ContextProvider for NoContext {
	fn current_url(&self) -> Option<String> {
		None
	}

	fn referrer(&self) -> Option<String> {
		None
	}
}

/// Terse descriptor a producer hands to the factory. Only `action` and
/// `resource_type` are required.
#[derive(Debug, Clone)]
pub struct EventInput {
	pub action: AuditAction,
	pub resource_type: String,
	pub resource_id: Option<String>,
	pub resource_name: Option<String>,
	pub changes: Option<Vec<FieldChange>>,
	pub metadata: Map<String, Value>,
	pub severity: Option<AuditSeverity>,
	pub status: EventStatus,
}

impl EventInput {
	pub fn new(action: AuditAction, resource_type: impl Into<String>) -> Self {
		Self {
			action,
			resource_type: resource_type.into(),
			resource_id: None,
			resource_name: None,
			changes: None,
			metadata: Map::new(),
			severity: None,
			status: EventStatus::Success,
		}
	}

	pub fn resource_id(mut self, id: impl Into<String>) -> Self {
		self.resource_id = Some(id.into());
		self
	}

	pub fn resource_name(mut self, name: impl Into<String>) -> Self {
		self.resource_name = Some(name.into());
		self
	}

	pub fn changes(mut self, changes: Vec<FieldChange>) -> Self {
		self.changes = Some(changes);
		self
	}

	pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
		self.metadata.insert(key.into(), value);
		self
	}

	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn status(mut self, status: EventStatus) -> Self {
		self.status = status;
		self
	}
}

/// Builds fully-populated audit events from terse inputs.
pub struct EventFactory {
	actor_provider: Arc<dyn ActorProvider>,
	context: Arc<dyn ContextProvider>,
	probe: Arc<dyn ConnectivityProbe>,
}

impl EventFactory {
	pub fn new(
		actor_provider: Arc<dyn ActorProvider>,
		context: Arc<dyn ContextProvider>,
		probe: Arc<dyn ConnectivityProbe>,
	) -> Self {
		Self {
			actor_provider,
			context,
			probe,
		}
	}

	/// Creates an immutable event from the input, resolving actor and
	/// environment at this moment.
	pub fn create(&self, input: EventInput) -> AuditEvent {
		let mut builder = AuditEvent::builder(input.action, input.resource_type)
			.actor(self.actor_provider.current_actor())
			.status(input.status)
			.offline_queued(!self.probe.is_online());

		if let Some(id) = input.resource_id {
			builder = builder.resource_id(id);
		}
		if let Some(name) = input.resource_name {
			builder = builder.resource_name(name);
		}
		if let Some(changes) = input.changes {
			builder = builder.changes(changes);
		}
		if let Some(severity) = input.severity {
			builder = builder.severity(severity);
		}
		for (key, value) in input.metadata {
			builder = builder.metadata(key, value);
		}

		// url/referrer ride along on every event.
		builder = builder.metadata(
			"url",
			self.context
				.current_url()
				.map(Value::String)
				.unwrap_or(Value::Null),
		);
		builder = builder.metadata(
			"referrer",
			self.context
				.referrer()
				.map(Value::String)
				.unwrap_or(Value::Null),
		);

		builder.build()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::connectivity::{AlwaysOnline, SharedProbe};
	use serde_json::json;

	struct FixedActor(Actor);

	impl ActorProvider for FixedActor {
		fn current_actor(&self) -> Actor {
			self.0.clone()
		}
	}

	struct FixedContext;

	impl ContextProvider for FixedContext {
		fn current_url(&self) -> Option<String> {
			Some("/projects/prj_1/guests".to_string())
		}

		fn referrer(&self) -> Option<String> {
			Some("/projects/prj_1".to_string())
		}
	}

	fn factory() -> EventFactory {
		EventFactory::new(
			Arc::new(FixedActor(Actor::user("usr_1"))),
			Arc::new(FixedContext),
			Arc::new(AlwaysOnline),
		)
	}

	#[test]
	fn attaches_current_actor() {
		let event = factory().create(EventInput::new(AuditAction::Create, "guest"));
		assert_eq!(event.actor.id, "usr_1");
	}

	#[test]
	fn falls_back_to_system_actor() {
		let factory = EventFactory::new(
			Arc::new(SystemActorProvider),
			Arc::new(NoContext),
			Arc::new(AlwaysOnline),
		);
		let event = factory.create(EventInput::new(AuditAction::Create, "guest"));
		assert_eq!(event.actor, Actor::system());
	}

	#[test]
	fn injects_url_and_referrer_metadata() {
		let event = factory().create(EventInput::new(AuditAction::Create, "guest"));
		assert_eq!(event.metadata["url"], json!("/projects/prj_1/guests"));
		assert_eq!(event.metadata["referrer"], json!("/projects/prj_1"));
	}

	#[test]
	fn missing_context_injects_null_keys() {
		let factory = EventFactory::new(
			Arc::new(SystemActorProvider),
			Arc::new(NoContext),
			Arc::new(AlwaysOnline),
		);
		let event = factory.create(EventInput::new(AuditAction::Create, "guest"));
		assert_eq!(event.metadata["url"], Value::Null);
		assert_eq!(event.metadata["referrer"], Value::Null);
	}

	#[test]
	fn caller_metadata_is_preserved() {
		let event = factory().create(
			EventInput::new(AuditAction::Export, "guest_list").metadata("format", json!("csv")),
		);
		assert_eq!(event.metadata["format"], json!("csv"));
	}

	#[test]
	fn severity_auto_detected_when_absent() {
		let event = factory().create(
			EventInput::new(AuditAction::PermissionDenied, "site").status(EventStatus::Failure),
		);
		assert_eq!(event.severity, AuditSeverity::Critical);
	}

	#[test]
	fn caller_severity_wins() {
		let event = factory().create(
			EventInput::new(AuditAction::Delete, "project").severity(AuditSeverity::Info),
		);
		assert_eq!(event.severity, AuditSeverity::Info);
	}

	#[test]
	fn offline_creation_sets_flag() {
		let probe = SharedProbe::new(false);
		let factory = EventFactory::new(
			Arc::new(SystemActorProvider),
			Arc::new(NoContext),
			Arc::new(probe),
		);
		let event = factory.create(EventInput::new(AuditAction::Create, "guest"));
		assert!(event.offline_queued);
	}
}
