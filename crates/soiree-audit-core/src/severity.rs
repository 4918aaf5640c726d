// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Severity tiers for audit events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse priority/risk tier attached to every audit event.
///
/// Ordering is `Info < Medium < High < Critical`. Events at `High` or
/// above take the immediate-send path in addition to normal batching.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	#[default]
	Info,
	Medium,
	High,
	Critical,
}

impl AuditSeverity {
	/// Returns true if events at this tier bypass the batch timer.
	pub fn is_urgent(&self) -> bool {
		*self >= AuditSeverity::High
	}

	/// Returns all severity tiers from least to most severe.
	pub fn all() -> &'static [AuditSeverity] {
		&[
			AuditSeverity::Info,
			AuditSeverity::Medium,
			AuditSeverity::High,
			AuditSeverity::Critical,
		]
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Info => "info",
			AuditSeverity::Medium => "medium",
			AuditSeverity::High => "high",
			AuditSeverity::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn ordering_increases_with_risk() {
		assert!(AuditSeverity::Info < AuditSeverity::Medium);
		assert!(AuditSeverity::Medium < AuditSeverity::High);
		assert!(AuditSeverity::High < AuditSeverity::Critical);
	}

	#[test]
	fn urgency_starts_at_high() {
		assert!(!AuditSeverity::Info.is_urgent());
		assert!(!AuditSeverity::Medium.is_urgent());
		assert!(AuditSeverity::High.is_urgent());
		assert!(AuditSeverity::Critical.is_urgent());
	}

	#[test]
	fn default_is_info() {
		assert_eq!(AuditSeverity::default(), AuditSeverity::Info);
	}

	#[test]
	fn serializes_snake_case() {
		assert_eq!(
			serde_json::to_string(&AuditSeverity::Critical).unwrap(),
			"\"critical\""
		);
		assert_eq!(
			serde_json::to_string(&AuditSeverity::Medium).unwrap(),
			"\"medium\""
		);
	}

	#[test]
	fn deserializes_snake_case() {
		let severity: AuditSeverity = serde_json::from_str("\"high\"").unwrap();
		assert_eq!(severity, AuditSeverity::High);
	}

	#[test]
	fn all_is_sorted_ascending() {
		let all = AuditSeverity::all();
		assert_eq!(all.len(), 4);
		for pair in all.windows(2) {
			assert!(pair[0] < pair[1]);
		}
	}

	fn arb_severity() -> impl Strategy<Value = AuditSeverity> {
		prop_oneof![
			Just(AuditSeverity::Info),
			Just(AuditSeverity::Medium),
			Just(AuditSeverity::High),
			Just(AuditSeverity::Critical),
		]
	}

	proptest! {
		#[test]
		fn severity_serde_roundtrip(severity in arb_severity()) {
			let json = serde_json::to_string(&severity).unwrap();
			let roundtrip: AuditSeverity = serde_json::from_str(&json).unwrap();
			prop_assert_eq!(severity, roundtrip);
		}

		#[test]
		fn severity_ordering_is_total(a in arb_severity(), b in arb_severity()) {
			prop_assert!(a <= b || b <= a);
		}
	}
}
