// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire envelopes for the ingestion endpoint and the real-time channel.

use serde::{Deserialize, Serialize};

use crate::event::AuditEvent;

/// Frame type tag the real-time channel uses for audit events.
pub const REALTIME_FRAME_TYPE: &str = "audit_event";

/// Request body for `POST /ingest`: one delivery attempt's worth of
/// events, in enqueue order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestBatch {
	pub events: Vec<AuditEvent>,
}

impl IngestBatch {
	pub fn new(events: Vec<AuditEvent>) -> Self {
		Self { events }
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}
}

/// A JSON text frame pushed over the real-time channel.
///
/// Frames with an unexpected `type` are ignored by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeFrame {
	#[serde(rename = "type")]
	pub frame_type: String,
	pub event: AuditEvent,
}

impl RealtimeFrame {
	/// Wraps an event in the audit frame envelope.
	pub fn audit_event(event: AuditEvent) -> Self {
		Self {
			frame_type: REALTIME_FRAME_TYPE.to_string(),
			event,
		}
	}

	/// True when the frame carries an audit event.
	pub fn is_audit_event(&self) -> bool {
		self.frame_type == REALTIME_FRAME_TYPE
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::action::AuditAction;

	#[test]
	fn batch_serializes_events_in_order() {
		let first = AuditEvent::builder(AuditAction::Create, "guest").build();
		let second = AuditEvent::builder(AuditAction::Update, "guest").build();
		let batch = IngestBatch::new(vec![first.clone(), second.clone()]);

		let json = serde_json::to_value(&batch).unwrap();
		let events = json["events"].as_array().unwrap();
		assert_eq!(events.len(), 2);
		assert_eq!(events[0]["id"], first.id.to_string());
		assert_eq!(events[1]["id"], second.id.to_string());
	}

	#[test]
	fn frame_roundtrip() {
		let event = AuditEvent::builder(AuditAction::Publish, "site").build();
		let frame = RealtimeFrame::audit_event(event.clone());
		assert!(frame.is_audit_event());

		let json = serde_json::to_string(&frame).unwrap();
		assert!(json.contains("\"type\":\"audit_event\""));

		let restored: RealtimeFrame = serde_json::from_str(&json).unwrap();
		assert_eq!(restored.event, event);
	}

	#[test]
	fn unexpected_frame_type_is_detectable() {
		let event = AuditEvent::builder(AuditAction::Create, "guest").build();
		let frame = RealtimeFrame {
			frame_type: "presence".to_string(),
			event,
		};
		assert!(!frame.is_audit_event());
	}
}
