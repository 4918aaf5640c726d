// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Queue persistence across process restarts, using the file-backed
//! store in a temp directory.

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use soiree_audit::store::QUEUE_STORAGE_KEY;
use soiree_audit::{
	AuditConfig, AuditPipeline, DeliveryError, EventInput, FileStore, FlushOutcome, IngestSink,
	KeyValueStore, SharedProbe,
};
use soiree_audit_core::{AuditAction, IngestBatch};

struct NoopSink;

#[async_trait]
impl IngestSink for NoopSink {
	async fn send_batch(&self, _batch: IngestBatch) -> Result<(), DeliveryError> {
		Ok(())
	}
}

fn pipeline_at(dir: &TempDir, probe: Arc<SharedProbe>) -> AuditPipeline {
	AuditPipeline::builder(AuditConfig::default())
		.ingest_sink(Arc::new(NoopSink))
		.store(Box::new(FileStore::new(dir.path()).unwrap()))
		.connectivity(probe)
		.build()
		.unwrap()
}

#[tokio::test]
async fn offline_events_survive_restart() {
	let dir = TempDir::new().unwrap();
	let probe = Arc::new(SharedProbe::new(false));

	let first = pipeline_at(&dir, probe.clone());
	first.init();
	let alice = first.record(EventInput::new(AuditAction::Create, "guest").resource_name("Alice"));
	let bob = first.record(EventInput::new(AuditAction::Create, "guest").resource_name("Bob"));
	first.shutdown().await;

	// A fresh pipeline over the same directory restores the backlog in
	// enqueue order.
	let second = pipeline_at(&dir, probe.clone());
	second.init();
	assert_eq!(second.status().queue_len, 2);

	probe.set_online(true);
	second.notify_online();
	assert_eq!(second.flush().await, FlushOutcome::Delivered(2));
	assert_eq!(second.status().queue_len, 0);
	second.shutdown().await;

	// The queue mirror on disk is now empty too.
	let third = pipeline_at(&dir, probe);
	third.init();
	assert_eq!(third.status().queue_len, 0);
	third.shutdown().await;

	assert_ne!(alice.id, bob.id);
}

#[tokio::test]
async fn corrupted_mirror_is_discarded() {
	let dir = TempDir::new().unwrap();

	let store = FileStore::new(dir.path()).unwrap();
	store.set(QUEUE_STORAGE_KEY, "definitely not json").unwrap();

	let probe = Arc::new(SharedProbe::new(false));
	let pipeline = pipeline_at(&dir, probe);
	pipeline.init();

	// The corrupt blob is dropped wholesale rather than crashing, and
	// removed so the next load starts clean.
	assert_eq!(pipeline.status().queue_len, 0);
	let store = FileStore::new(dir.path()).unwrap();
	assert!(store.get(QUEUE_STORAGE_KEY).unwrap().is_none());

	pipeline.shutdown().await;
}

#[tokio::test]
async fn mirror_is_capped_at_max_offline_events() {
	let dir = TempDir::new().unwrap();

	let mut config = AuditConfig::default();
	config.max_offline_events = 3;

	let probe = Arc::new(SharedProbe::new(false));
	let pipeline = AuditPipeline::builder(config.clone())
		.ingest_sink(Arc::new(NoopSink))
		.store(Box::new(FileStore::new(dir.path()).unwrap()))
		.connectivity(probe.clone())
		.build()
		.unwrap();
	pipeline.init();

	for name in ["a", "b", "c", "d", "e"] {
		pipeline.record(EventInput::new(AuditAction::Create, "guest").resource_name(name));
	}
	assert_eq!(pipeline.status().queue_len, 5);
	pipeline.shutdown().await;

	// Only the newest `max_offline_events` events survive the restart.
	let restored = AuditPipeline::builder(config)
		.ingest_sink(Arc::new(NoopSink))
		.store(Box::new(FileStore::new(dir.path()).unwrap()))
		.connectivity(probe)
		.build()
		.unwrap();
	restored.init();
	assert_eq!(restored.status().queue_len, 3);
	restored.shutdown().await;
}
