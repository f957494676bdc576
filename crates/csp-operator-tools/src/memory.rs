//! A flat, file-backed memory store with a diff/merge-shaped API.
//!
//! Generalized from a vector-store-of-records diff (comparing two commits'
//! memories key by key) down to a plain key/value store: same shape, no
//! database. Not part of the discovery core — `csp-core` has no notion of
//! "memory" beyond the run artifacts it writes itself.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryEntry {
    pub value: String,
    pub content_hash: String,
}

fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, MemoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConflict {
    pub key: String,
    pub value_a: String,
    pub value_b: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryDelta {
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    pub conflicts: Vec<MemoryConflict>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let content_hash = hash_value(&value);
        self.entries.insert(key.into(), MemoryEntry { value, content_hash });
    }

    pub fn get(&self, key: &str) -> Option<&MemoryEntry> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MemoryEntry> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads the store from `path`, or returns an empty store if the file is
    /// absent — a missing memory file is a fresh store, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Keys only in `self`, keys only in `other`, and keys present in both
    /// with differing content hashes.
    pub fn diff(&self, other: &MemoryStore) -> MemoryDelta {
        let mut delta = MemoryDelta::default();
        for (key, entry) in &self.entries {
            match other.entries.get(key) {
                None => delta.only_in_a.push(key.clone()),
                Some(other_entry) if other_entry.content_hash != entry.content_hash => {
                    delta.conflicts.push(MemoryConflict {
                        key: key.clone(),
                        value_a: entry.value.clone(),
                        value_b: other_entry.value.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        for key in other.entries.keys() {
            if !self.entries.contains_key(key) {
                delta.only_in_b.push(key.clone());
            }
        }
        delta
    }

    /// Merges `other` into `self`, consuming both. Non-conflicting keys from
    /// either side are kept as-is; conflicting keys take `other`'s value iff
    /// `prefer_other_on_conflict`.
    pub fn merge(mut self, other: MemoryStore, prefer_other_on_conflict: bool) -> MemoryStore {
        for (key, entry) in other.entries {
            match self.entries.get(&key) {
                Some(existing) if existing.content_hash != entry.content_hash => {
                    if prefer_other_on_conflict {
                        self.entries.insert(key, entry);
                    }
                }
                _ => {
                    self.entries.insert(key, entry);
                }
            }
        }
        self
    }
}
