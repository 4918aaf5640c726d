// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit action names and the severity auto-detection table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::event::EventStatus;
use crate::severity::AuditSeverity;

/// The operation an audit event records.
///
/// Known operations get a variant; anything else round-trips through
/// `Custom` so producers can log one-off actions without a core change.
/// The wire form is always the snake_case string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuditAction {
	Create,
	Update,
	Delete,
	BulkDelete,
	Login,
	Logout,
	LoginFailed,
	PasswordChange,
	PasswordReset,
	PermissionDenied,
	PermissionGrant,
	PermissionRevoke,
	RoleAssign,
	RoleRemove,
	Publish,
	Unpublish,
	Export,
	Import,
	Download,
	Backup,
	Restore,
	SystemError,
	Custom(String),
}

impl AuditAction {
	/// Returns the snake_case wire name of this action.
	pub fn as_str(&self) -> &str {
		match self {
			AuditAction::Create => "create",
			AuditAction::Update => "update",
			AuditAction::Delete => "delete",
			AuditAction::BulkDelete => "bulk_delete",
			AuditAction::Login => "login",
			AuditAction::Logout => "logout",
			AuditAction::LoginFailed => "login_failed",
			AuditAction::PasswordChange => "password_change",
			AuditAction::PasswordReset => "password_reset",
			AuditAction::PermissionDenied => "permission_denied",
			AuditAction::PermissionGrant => "permission_grant",
			AuditAction::PermissionRevoke => "permission_revoke",
			AuditAction::RoleAssign => "role_assign",
			AuditAction::RoleRemove => "role_remove",
			AuditAction::Publish => "publish",
			AuditAction::Unpublish => "unpublish",
			AuditAction::Export => "export",
			AuditAction::Import => "import",
			AuditAction::Download => "download",
			AuditAction::Backup => "backup",
			AuditAction::Restore => "restore",
			AuditAction::SystemError => "system_error",
			AuditAction::Custom(name) => name,
		}
	}

	/// Parses a wire name back into an action. Unknown names become `Custom`.
	pub fn parse(name: &str) -> Self {
		match name {
			"create" => AuditAction::Create,
			"update" => AuditAction::Update,
			"delete" => AuditAction::Delete,
			"bulk_delete" => AuditAction::BulkDelete,
			"login" => AuditAction::Login,
			"logout" => AuditAction::Logout,
			"login_failed" => AuditAction::LoginFailed,
			"password_change" => AuditAction::PasswordChange,
			"password_reset" => AuditAction::PasswordReset,
			"permission_denied" => AuditAction::PermissionDenied,
			"permission_grant" => AuditAction::PermissionGrant,
			"permission_revoke" => AuditAction::PermissionRevoke,
			"role_assign" => AuditAction::RoleAssign,
			"role_remove" => AuditAction::RoleRemove,
			"publish" => AuditAction::Publish,
			"unpublish" => AuditAction::Unpublish,
			"export" => AuditAction::Export,
			"import" => AuditAction::Import,
			"download" => AuditAction::Download,
			"backup" => AuditAction::Backup,
			"restore" => AuditAction::Restore,
			"system_error" => AuditAction::SystemError,
			other => AuditAction::Custom(other.to_string()),
		}
	}

	/// Returns the severity for this action when the producer supplies none.
	///
	/// The table, most specific rule first:
	/// - `login_failed`, `permission_denied`, `system_error`: `Critical` on
	///   failure, `High` otherwise
	/// - `delete`, `bulk_delete`, `permission_revoke`, `role_remove`: `High`
	/// - auth lifecycle (`login`, `logout`, password change/reset): `Medium`
	/// - data movement (`export`, `import`, `download`, `backup`,
	///   `restore`): `Medium`
	/// - any action whose name contains "permission" or "role": `Medium`
	/// - everything else: `Info`
	pub fn default_severity(&self, status: EventStatus) -> AuditSeverity {
		match self {
			AuditAction::LoginFailed | AuditAction::PermissionDenied | AuditAction::SystemError => {
				if status == EventStatus::Failure {
					AuditSeverity::Critical
				} else {
					AuditSeverity::High
				}
			}

			AuditAction::Delete
			| AuditAction::BulkDelete
			| AuditAction::PermissionRevoke
			| AuditAction::RoleRemove => AuditSeverity::High,

			AuditAction::Login
			| AuditAction::Logout
			| AuditAction::PasswordChange
			| AuditAction::PasswordReset => AuditSeverity::Medium,

			AuditAction::Export
			| AuditAction::Import
			| AuditAction::Download
			| AuditAction::Backup
			| AuditAction::Restore => AuditSeverity::Medium,

			other => {
				let name = other.as_str();
				if name.contains("permission") || name.contains("role") {
					AuditSeverity::Medium
				} else {
					AuditSeverity::Info
				}
			}
		}
	}
}

impl fmt::Display for AuditAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl From<&str> for AuditAction {
	fn from(name: &str) -> Self {
		AuditAction::parse(name)
	}
}

impl Serialize for AuditAction {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for AuditAction {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let name = String::deserialize(deserializer)?;
		Ok(AuditAction::parse(&name))
	}
}
