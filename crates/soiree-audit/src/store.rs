// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Persistent key/value storage backing the durable queue mirror.
//!
//! The pipeline talks to storage through [`KeyValueStore`] so it never
//! hard-depends on a specific runtime. [`MemoryStore`] backs tests and
//! ephemeral hosts; [`FileStore`] is the desktop/daemon equivalent of
//! browser local storage.
//!
//! Writes are synchronous on purpose: the queue contract requires every
//! mutation to be mirrored before the mutating call returns.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;

/// Fixed namespace key under which the queue is mirrored.
pub const QUEUE_STORAGE_KEY: &str = "soiree.audit.queue";

/// A namespaced string-blob store that survives process restarts.
pub trait KeyValueStore: Send + Sync {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Contents do not survive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		let entries = self
			.entries
			.lock()
			.map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
		Ok(entries.get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		let mut entries = self
			.entries
			.lock()
			.map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
		entries.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		let mut entries = self
			.entries
			.lock()
			.map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
		entries.remove(key);
		Ok(())
	}
}

/// File-backed store: one file per key under a data directory.
///
/// Writes go through a temp file followed by a rename, so a crash
/// mid-write leaves the previous blob intact.
#[derive(Debug)]
pub struct FileStore {
	dir: PathBuf,
}

impl FileStore {
	/// Creates a store rooted at `dir`, creating the directory if needed.
	pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();
		fs::create_dir_all(&dir)?;
		Ok(Self { dir })
	}

	/// Creates a store under the platform data directory
	/// (`<data_dir>/soiree/audit`).
	pub fn default_location() -> Result<Self, StoreError> {
		let base = dirs::data_dir()
			.ok_or_else(|| StoreError::Unavailable("no platform data directory".to_string()))?;
		Self::new(base.join("soiree").join("audit"))
	}

	fn path_for(&self, key: &str) -> PathBuf {
		// Keys are dotted namespaces; keep them filesystem-safe.
		let name: String = key
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
				c
			} else {
				'_'
			})
			.collect();
		self.dir.join(format!("{name}.json"))
	}

	fn write_atomic(path: &Path, value: &str) -> Result<(), StoreError> {
		let tmp = path.with_extension("json.tmp");
		fs::write(&tmp, value)?;
		fs::rename(&tmp, path)?;
		Ok(())
	}
}

impl KeyValueStore for FileStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		match fs::read_to_string(self.path_for(key)) {
			Ok(value) => Ok(Some(value)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		Self::write_atomic(&self.path_for(key), value)
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		match fs::remove_file(self.path_for(key)) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}
