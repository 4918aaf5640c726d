// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field-level change records for update-style events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One changed field on an updated resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
	pub field: String,
	pub old_value: Value,
	pub new_value: Value,
}

impl FieldChange {
	pub fn new(field: impl Into<String>, old_value: Value, new_value: Value) -> Self {
		Self {
			field: field.into(),
			old_value,
			new_value,
		}
	}
}

/// Computes the field-level differences between two JSON snapshots.
///
/// Comparison is structural: nested values are equal when their whole
/// trees are equal, never by reference. For object snapshots the result
/// covers the union of both key sets in the new snapshot's order
/// (removed keys follow, in the old snapshot's order); a field present
/// on only one side diffs against `Null`. Non-object snapshots that
/// differ produce a single change under an empty field name.
pub fn diff_values(old: &Value, new: &Value) -> Vec<FieldChange> {
	match (old, new) {
		(Value::Object(old_map), Value::Object(new_map)) => {
			let mut changes = Vec::new();
			for (field, new_value) in new_map {
				let old_value = old_map.get(field).cloned().unwrap_or(Value::Null);
				if &old_value != new_value {
					changes.push(FieldChange::new(field, old_value, new_value.clone()));
				}
			}
			for (field, old_value) in old_map {
				if !new_map.contains_key(field) {
					changes.push(FieldChange::new(field, old_value.clone(), Value::Null));
				}
			}
			changes
		}
		(old, new) if old != new => vec![FieldChange::new("", old.clone(), new.clone())],
		_ => Vec::new(),
	}
}
