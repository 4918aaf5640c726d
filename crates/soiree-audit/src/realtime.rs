// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Real-time fan-out over a websocket.
//!
//! The client is read-only: it never writes events to the socket, it
//! only forwards server-pushed frames to the listener registry. On each
//! successful connect it pokes the dispatcher so events queued while
//! disconnected go out over the batch path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::Notify;
use tokio_tungstenite::{
	connect_async,
	tungstenite::{client::IntoClientRequest, Message},
};
use tracing::{debug, info, warn};
use url::Url;

use soiree_audit_core::{AuditEvent, RealtimeFrame};
use soiree_common_http::RetryConfig;

use crate::dispatch::BatchDispatcher;
use crate::error::AuditError;
use crate::listener::ListenerRegistry;

#[derive(Debug, Clone)]
pub struct RealtimeConfig {
	pub url: Url,
	pub api_token: Option<String>,
	/// Automatic reconnect attempts per outage; after these are spent the
	/// client waits for an explicit [`RealtimeClient::reconnect`].
	pub max_reconnect_attempts: u32,
	pub backoff: RetryConfig,
}

/// Maps an HTTP(S) endpoint onto its websocket scheme.
pub fn websocket_url(base: &str) -> Result<Url, AuditError> {
	let mut url = Url::parse(base).map_err(|e| AuditError::Config(format!("invalid realtime URL: {e}")))?;
	match url.scheme() {
		"http" => url.set_scheme("ws").unwrap(),
		"https" => url.set_scheme("wss").unwrap(),
		"ws" | "wss" => {}
		other => {
			return Err(AuditError::Config(format!(
				"unsupported realtime URL scheme: {other}"
			)));
		}
	}
	Ok(url)
}

/// Parses one text frame. Returns the carried event for `audit_event`
/// frames; anything else (unknown type, malformed JSON) is dropped
/// after a log line so one bad frame cannot take the connection down.
fn parse_frame(text: &str) -> Option<AuditEvent> {
	match serde_json::from_str::<RealtimeFrame>(text) {
		Ok(frame) if frame.is_audit_event() => Some(frame.event),
		Ok(frame) => {
			debug!(frame_type = %frame.frame_type, "ignoring non-audit realtime frame");
			None
		}
		Err(e) => {
			warn!(error = %e, "dropping malformed realtime frame");
			None
		}
	}
}

pub struct RealtimeClient {
	config: RealtimeConfig,
	registry: ListenerRegistry,
	dispatcher: Arc<BatchDispatcher>,
	connected: AtomicBool,
	reconnect_notify: Notify,
	shutdown: AtomicBool,
	shutdown_notify: Notify,
}

impl RealtimeClient {
	pub fn new(
		config: RealtimeConfig,
		registry: ListenerRegistry,
		dispatcher: Arc<BatchDispatcher>,
	) -> Self {
		Self {
			config,
			registry,
			dispatcher,
			connected: AtomicBool::new(false),
			reconnect_notify: Notify::new(),
			shutdown: AtomicBool::new(false),
			shutdown_notify: Notify::new(),
		}
	}

	pub fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst)
	}

	/// Restarts the connect cycle after automatic reconnects were
	/// exhausted. A no-op while the client is still trying on its own.
	pub fn reconnect(&self) {
		self.reconnect_notify.notify_one();
	}

	pub fn shutdown(&self) {
		self.shutdown.store(true, Ordering::SeqCst);
		self.shutdown_notify.notify_waiters();
		self.reconnect_notify.notify_one();
	}

	fn is_shutdown(&self) -> bool {
		self.shutdown.load(Ordering::SeqCst)
	}

	/// Connect loop: run until shutdown, reconnecting with capped
	/// exponential backoff. The attempt counter resets whenever a
	/// connection is established, so every fresh outage starts over at
	/// the base delay.
	pub async fn run(&self) {
		info!(url = %self.config.url, "starting realtime audit client");
		let mut attempts = 0u32;

		loop {
			if self.is_shutdown() {
				break;
			}

			if let Err(e) = self.connect_and_listen(&mut attempts).await {
				warn!(error = %e, "realtime connection lost");
			}
			self.connected.store(false, Ordering::SeqCst);

			if self.is_shutdown() {
				break;
			}

			attempts += 1;
			if attempts > self.config.max_reconnect_attempts {
				warn!(
					attempts = attempts - 1,
					"automatic reconnects exhausted, waiting for explicit reconnect"
				);
				self.reconnect_notify.notified().await;
				attempts = 0;
				continue;
			}

			// Clamp so the delay keeps growing up to the ceiling even when
			// the attempt budget outlives the backoff schedule.
			let attempt = attempts.min(self.config.backoff.max_retries.max(1));
			if let Some(delay) = self.config.backoff.delay_for_attempt(attempt) {
				tokio::select! {
					_ = tokio::time::sleep(delay) => {}
					_ = self.shutdown_notify.notified() => {}
				}
			}
		}

		self.connected.store(false, Ordering::SeqCst);
		info!("realtime audit client stopped");
	}

	async fn connect_and_listen(&self, attempts: &mut u32) -> Result<(), AuditError> {
		let mut request = self
			.config
			.url
			.as_str()
			.into_client_request()
			.map_err(|e| AuditError::Realtime(e.to_string()))?;
		if let Some(token) = &self.config.api_token {
			let auth_value = format!("Bearer {token}")
				.parse()
				.map_err(|_| AuditError::Realtime("invalid token for Authorization header".to_string()))?;
			request.headers_mut().insert("Authorization", auth_value);
		}

		let (ws_stream, _) = connect_async(request)
			.await
			.map_err(|e| AuditError::Realtime(e.to_string()))?;

		self.connected.store(true, Ordering::SeqCst);
		*attempts = 0;
		info!("realtime audit channel connected");
		// Drain anything queued while disconnected.
		self.dispatcher.poke();

		let (mut write, mut read) = ws_stream.split();

		loop {
			let msg = tokio::select! {
				msg = read.next() => msg,
				_ = self.shutdown_notify.notified() => return Ok(()),
			};

			match msg {
				Some(Ok(Message::Text(text))) => {
					if let Some(event) = parse_frame(&text) {
						self.registry.publish(&event);
					}
				}
				Some(Ok(Message::Ping(data))) => {
					if write.send(Message::Pong(data)).await.is_err() {
						return Err(AuditError::Realtime("failed to answer ping".to_string()));
					}
				}
				Some(Ok(Message::Close(_))) | None => return Ok(()),
				Some(Ok(_)) => {}
				Some(Err(e)) => return Err(AuditError::Realtime(e.to_string())),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use soiree_audit_core::AuditAction;
	use std::sync::Mutex;

	#[test]
	fn maps_http_schemes_to_websocket() {
		assert_eq!(
			websocket_url("http://localhost:3000/realtime").unwrap().scheme(),
			"ws"
		);
		assert_eq!(
			websocket_url("https://api.example.com/realtime").unwrap().scheme(),
			"wss"
		);
		assert_eq!(
			websocket_url("wss://api.example.com/realtime").unwrap().scheme(),
			"wss"
		);
	}

	#[test]
	fn rejects_unsupported_scheme() {
		assert!(websocket_url("ftp://example.com").is_err());
		assert!(websocket_url("not a url").is_err());
	}

	#[test]
	fn parses_audit_event_frames() {
		let event = AuditEvent::builder(AuditAction::Delete, "guest").build();
		let json = serde_json::to_string(&RealtimeFrame::audit_event(event.clone())).unwrap();

		let parsed = parse_frame(&json).expect("frame should parse");
		assert_eq!(parsed.id, event.id);
	}

	#[test]
	fn ignores_unknown_frame_types() {
		let event = AuditEvent::builder(AuditAction::Delete, "guest").build();
		let frame = RealtimeFrame {
			frame_type: "presence".to_string(),
			event,
		};
		let json = serde_json::to_string(&frame).unwrap();
		assert!(parse_frame(&json).is_none());
	}

	#[test]
	fn drops_malformed_frames() {
		assert!(parse_frame("{not json").is_none());
		assert!(parse_frame("{\"type\":\"audit_event\"}").is_none());
	}

	#[test]
	fn parsed_frames_reach_listeners() {
		let registry = ListenerRegistry::default();
		let seen: Arc<Mutex<Vec<uuid::Uuid>>> = Arc::default();
		let sink = seen.clone();
		let _subscription = registry.subscribe(move |event| {
			sink.lock().unwrap().push(event.id);
		});

		let event = AuditEvent::builder(AuditAction::Export, "guest_list").build();
		let json = serde_json::to_string(&RealtimeFrame::audit_event(event.clone())).unwrap();
		if let Some(parsed) = parse_frame(&json) {
			registry.publish(&parsed);
		}

		assert_eq!(seen.lock().unwrap().as_slice(), [event.id]);
	}
}
