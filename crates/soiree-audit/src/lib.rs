// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side audit event pipeline.
//!
//! Events are created by an [`factory::EventFactory`], held in a
//! storage-mirrored [`queue::DurableQueue`], and delivered in batches
//! by a [`dispatch::BatchDispatcher`] with exponential-backoff retry.
//! High and critical severity events additionally get an immediate
//! best-effort send. A [`realtime::RealtimeClient`] fans server-pushed
//! events out to local [`listener::ListenerRegistry`] subscribers.
//!
//! [`AuditPipeline`] wires the stages together:
//!
//! ```no_run
//! use soiree_audit::{AuditConfig, AuditPipeline, EventInput};
//! use soiree_audit_core::AuditAction;
//!
//! # async fn demo() -> Result<(), soiree_audit::AuditError> {
//! let pipeline = AuditPipeline::builder(
//!     AuditConfig::new("https://api.example.com/audit/ingest")
//!         .with_realtime_url("https://api.example.com/audit/realtime"),
//! )
//! .build()?;
//! pipeline.init();
//!
//! pipeline.record(EventInput::new(AuditAction::Create, "event").resource_name("Launch Party"));
//!
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connectivity;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod listener;
pub mod pipeline;
pub mod queue;
pub mod realtime;
pub mod recorder;
pub mod store;

pub use config::AuditConfig;
pub use connectivity::{AlwaysOnline, ConnectivityProbe, SharedProbe};
pub use dispatch::{BatchDispatcher, FlushOutcome, HttpIngestSink, IngestSink};
pub use error::{AuditError, DeliveryError, StoreError};
pub use factory::{ActorProvider, ContextProvider, EventFactory, EventInput};
pub use listener::{ListenerRegistry, Subscription};
pub use pipeline::{AuditPipeline, AuditPipelineBuilder, PipelineStatus};
pub use queue::DurableQueue;
pub use realtime::RealtimeClient;
pub use recorder::AuditRecorder;
pub use store::{FileStore, KeyValueStore, MemoryStore};
