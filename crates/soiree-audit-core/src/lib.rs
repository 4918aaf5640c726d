// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Soiree audit event pipeline.
//!
//! This crate is pure data: it defines the audit event model, the
//! severity tiers that drive delivery urgency, and the wire envelopes
//! exchanged with the ingestion endpoint and the real-time channel.
//! All I/O lives in `soiree-audit`.

pub mod action;
pub mod actor;
pub mod change;
pub mod envelope;
pub mod event;
pub mod severity;

pub use action::AuditAction;
pub use actor::{Actor, ActorKind};
pub use change::{diff_values, FieldChange};
pub use envelope::{IngestBatch, RealtimeFrame, REALTIME_FRAME_TYPE};
pub use event::{AuditEvent, AuditEventBuilder, EventStatus};
pub use severity::AuditSeverity;
