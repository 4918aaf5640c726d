// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pipeline assembly and lifecycle.
//!
//! [`AuditPipeline`] owns every stage: the event factory, the durable
//! queue, the batch dispatcher, the listener registry, and (optionally)
//! the real-time client. Construct one per process via the builder,
//! call [`AuditPipeline::init`] to restore persisted state and start
//! the background tasks, and [`AuditPipeline::shutdown`] to stop them
//! with one best-effort final flush.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use soiree_audit_core::AuditEvent;

use crate::config::AuditConfig;
use crate::connectivity::{AlwaysOnline, ConnectivityProbe};
use crate::dispatch::{BatchDispatcher, DispatchConfig, FlushOutcome, HttpIngestSink, IngestSink};
use crate::error::AuditError;
use crate::factory::{ActorProvider, ContextProvider, EventFactory, EventInput, NoContext, SystemActorProvider};
use crate::listener::{ListenerRegistry, Subscription};
use crate::queue::DurableQueue;
use crate::realtime::{websocket_url, RealtimeClient, RealtimeConfig};
use crate::store::{FileStore, KeyValueStore, MemoryStore};

/// Point-in-time snapshot of pipeline health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
	pub queue_len: usize,
	/// Queued events at high or critical severity.
	pub urgent_pending: usize,
	pub last_sync_at: Option<DateTime<Utc>>,
	pub realtime_connected: bool,
	pub online: bool,
}

pub struct AuditPipelineBuilder {
	config: AuditConfig,
	store: Option<Box<dyn KeyValueStore>>,
	probe: Option<Arc<dyn ConnectivityProbe>>,
	actor_provider: Option<Arc<dyn ActorProvider>>,
	context: Option<Arc<dyn ContextProvider>>,
	sink: Option<Arc<dyn IngestSink>>,
}

impl AuditPipelineBuilder {
	pub fn new(config: AuditConfig) -> Self {
		Self {
			config,
			store: None,
			probe: None,
			actor_provider: None,
			context: None,
			sink: None,
		}
	}

	/// Overrides the queue's persistence backend. Defaults to a
	/// [`FileStore`] in the platform data directory, falling back to an
	/// in-memory store when that directory is unavailable.
	pub fn store(mut self, store: Box<dyn KeyValueStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn connectivity(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
		self.probe = Some(probe);
		self
	}

	pub fn actor_provider(mut self, provider: Arc<dyn ActorProvider>) -> Self {
		self.actor_provider = Some(provider);
		self
	}

	pub fn context_provider(mut self, context: Arc<dyn ContextProvider>) -> Self {
		self.context = Some(context);
		self
	}

	/// Overrides the delivery sink, replacing the HTTP client entirely.
	pub fn ingest_sink(mut self, sink: Arc<dyn IngestSink>) -> Self {
		self.sink = Some(sink);
		self
	}

	pub fn build(self) -> Result<AuditPipeline, AuditError> {
		if self.config.ingest_url.is_empty() && self.sink.is_none() {
			return Err(AuditError::Config(
				"ingest_url is required unless a custom sink is provided".to_string(),
			));
		}

		let store = match self.store {
			Some(store) => store,
			None => match FileStore::default_location() {
				Ok(store) => Box::new(store) as Box<dyn KeyValueStore>,
				Err(e) => {
					warn!(error = %e, "audit storage unavailable, queue will not survive restarts");
					Box::new(MemoryStore::new())
				}
			},
		};

		let probe = self.probe.unwrap_or_else(|| Arc::new(AlwaysOnline));
		let actor_provider = self
			.actor_provider
			.unwrap_or_else(|| Arc::new(SystemActorProvider));
		let context = self.context.unwrap_or_else(|| Arc::new(NoContext));

		let sink = match self.sink {
			Some(sink) => sink,
			None => Arc::new(HttpIngestSink::new(
				self.config.ingest_url.clone(),
				self.config.request_timeout,
				self.config.api_token.clone(),
			)),
		};

		let queue = Arc::new(DurableQueue::new(
			store,
			self.config.max_queue_size,
			self.config.max_offline_events,
		));

		let dispatcher = Arc::new(BatchDispatcher::new(
			queue.clone(),
			sink,
			probe.clone(),
			DispatchConfig {
				batch_size: self.config.batch_size,
				batch_interval: self.config.batch_interval,
				retry: self.config.retry_config(),
			},
		));

		let registry = ListenerRegistry::default();

		let realtime = match &self.config.realtime_url {
			Some(url) => Some(Arc::new(RealtimeClient::new(
				RealtimeConfig {
					url: websocket_url(url)?,
					api_token: self.config.api_token.clone(),
					max_reconnect_attempts: self.config.max_reconnect_attempts,
					backoff: self.config.reconnect_config(),
				},
				registry.clone(),
				dispatcher.clone(),
			))),
			None => None,
		};

		let factory = EventFactory::new(actor_provider, context, probe.clone());

		Ok(AuditPipeline {
			inner: Arc::new(PipelineInner {
				factory,
				queue,
				dispatcher,
				realtime,
				registry,
				probe,
				tasks: StdMutex::new(Vec::new()),
			}),
		})
	}
}

struct PipelineInner {
	factory: EventFactory,
	queue: Arc<DurableQueue>,
	dispatcher: Arc<BatchDispatcher>,
	realtime: Option<Arc<RealtimeClient>>,
	registry: ListenerRegistry,
	probe: Arc<dyn ConnectivityProbe>,
	tasks: StdMutex<Vec<JoinHandle<()>>>,
}

/// The assembled audit pipeline. Cheap to clone; all clones share the
/// same queue, dispatcher, and listener registry.
#[derive(Clone)]
pub struct AuditPipeline {
	inner: Arc<PipelineInner>,
}

impl AuditPipeline {
	pub fn builder(config: AuditConfig) -> AuditPipelineBuilder {
		AuditPipelineBuilder::new(config)
	}

	/// Restores the persisted queue and starts the background tasks.
	/// Must be called from within a tokio runtime. Idempotent in effect:
	/// calling it twice starts duplicate loops, so don't.
	pub fn init(&self) {
		self.inner.queue.load();
		info!(restored = self.inner.queue.len(), "audit pipeline starting");

		let mut tasks = self.lock_tasks();
		let dispatcher = self.inner.dispatcher.clone();
		tasks.push(tokio::spawn(async move { dispatcher.run().await }));

		if let Some(realtime) = &self.inner.realtime {
			let realtime = realtime.clone();
			tasks.push(tokio::spawn(async move { realtime.run().await }));
		}
	}

	/// Records one audit event: publish to local listeners, enqueue for
	/// batch delivery, and for high/critical severity fire an immediate
	/// best-effort send alongside. Returns the fully-populated event.
	pub fn record(&self, input: EventInput) -> AuditEvent {
		let event = self.inner.factory.create(input);

		// Local listeners observe every event, delivered or not.
		self.inner.registry.publish(&event);

		self.inner.queue.enqueue(event.clone());

		// Offline short-circuit: the attempt is skipped rather than made
		// and failed. Either way the event is already queued and goes out
		// with the first batch after reconnect.
		if event.severity.is_urgent() && self.inner.probe.is_online() {
			match tokio::runtime::Handle::try_current() {
				Ok(handle) => {
					let dispatcher = self.inner.dispatcher.clone();
					let urgent = event.clone();
					handle.spawn(async move { dispatcher.send_immediate(urgent).await });
				}
				Err(_) => debug!("no runtime for immediate send, batch path will deliver"),
			}
		}

		self.inner.dispatcher.poke();
		event
	}

	/// Registers a listener for every event this pipeline records or
	/// receives over the real-time channel. Dropping the returned
	/// subscription unregisters it.
	pub fn subscribe(
		&self,
		handler: impl Fn(&AuditEvent) + Send + Sync + 'static,
	) -> Subscription {
		self.inner.registry.subscribe(handler)
	}

	/// Explicitly flushes up to one batch and waits for the outcome.
	pub async fn flush(&self) -> FlushOutcome {
		self.inner.dispatcher.flush().await
	}

	/// Signals that connectivity was restored; wakes the dispatcher so
	/// queued events go out.
	pub fn notify_online(&self) {
		debug!("connectivity restored, draining audit queue");
		self.inner.dispatcher.poke();
	}

	/// Restarts the real-time connect cycle after its automatic
	/// reconnects were exhausted. No-op when real-time is disabled.
	pub fn reconnect_realtime(&self) {
		if let Some(realtime) = &self.inner.realtime {
			realtime.reconnect();
		}
	}

	pub fn status(&self) -> PipelineStatus {
		PipelineStatus {
			queue_len: self.inner.queue.len(),
			urgent_pending: self.inner.queue.urgent_len(),
			last_sync_at: self.inner.dispatcher.last_sync_at(),
			realtime_connected: self
				.inner
				.realtime
				.as_ref()
				.is_some_and(|r| r.is_connected()),
			online: self.inner.probe.is_online(),
		}
	}

	/// Stops the background tasks after one best-effort final flush and
	/// waits for them to finish.
	pub async fn shutdown(&self) {
		info!(pending = self.inner.queue.len(), "audit pipeline shutting down");
		self.inner.dispatcher.shutdown();
		if let Some(realtime) = &self.inner.realtime {
			realtime.shutdown();
		}

		let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.lock_tasks());
		for task in tasks {
			if let Err(e) = task.await {
				warn!(error = %e, "audit background task ended abnormally");
			}
		}
		info!("audit pipeline stopped");
	}

	fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
		self.inner
			.tasks
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}
