// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actor identity attributed to audit events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the event was performed by a human or by the platform itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
	User,
	#[default]
	System,
}

impl fmt::Display for ActorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ActorKind::User => "user",
			ActorKind::System => "system",
		};
		write!(f, "{s}")
	}
}

/// The identity an audit event is attributed to.
///
/// Resolved once at event creation time from the currently authenticated
/// session, or [`Actor::system`] when no identity is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: ActorKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ip: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

impl Actor {
	/// Creates a user actor with the given id.
	pub fn user(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind: ActorKind::User,
			email: None,
			name: None,
			ip: None,
			user_agent: None,
			session_id: None,
		}
	}

	/// The well-known actor used when no authenticated identity exists.
	pub fn system() -> Self {
		Self {
			id: "system".to_string(),
			kind: ActorKind::System,
			email: None,
			name: None,
			ip: None,
			user_agent: None,
			session_id: None,
		}
	}

	/// Sets the email address (builder pattern).
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());
		self
	}

	/// Sets the display name (builder pattern).
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the originating IP address (builder pattern).
	pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
		self.ip = Some(ip.into());
		self
	}

	/// Sets the user agent string (builder pattern).
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	/// Sets the session id (builder pattern).
	pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
		self.session_id = Some(session_id.into());
		self
	}
}

impl Default for Actor {
	fn default() -> Self {
		Self::system()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn system_actor_has_well_known_id() {
		let actor = Actor::system();
		assert_eq!(actor.id, "system");
		assert_eq!(actor.kind, ActorKind::System);
		assert!(actor.email.is_none());
	}

	#[test]
	fn user_actor_builder() {
		let actor = Actor::user("usr_42")
			.with_email("host@soiree.example")
			.with_name("Host")
			.with_ip("203.0.113.9")
			.with_session_id("sess_7");

		assert_eq!(actor.kind, ActorKind::User);
		assert_eq!(actor.email.as_deref(), Some("host@soiree.example"));
		assert_eq!(actor.ip.as_deref(), Some("203.0.113.9"));
		assert_eq!(actor.session_id.as_deref(), Some("sess_7"));
	}

	#[test]
	fn kind_serializes_under_type_key() {
		let json = serde_json::to_value(Actor::user("usr_1")).unwrap();
		assert_eq!(json["type"], "user");
		assert_eq!(json["id"], "usr_1");
		// Unset optional fields stay off the wire entirely.
		assert!(json.get("email").is_none());
	}

	#[test]
	fn deserializes_from_wire_shape() {
		let actor: Actor = serde_json::from_str(
			r#"{"id":"usr_9","type":"user","email":"a@b.c","user_agent":"Mozilla/5.0"}"#,
		)
		.unwrap();
		assert_eq!(actor.kind, ActorKind::User);
		assert_eq!(actor.user_agent.as_deref(), Some("Mozilla/5.0"));
	}
}
