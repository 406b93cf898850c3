//! Process-local staging table.
//!
//! Owns the copy-on-first-write from the current version and the
//! commit/discard decision at flush time. Accessed only from the driver
//! thread — the FUSE bridge dispatches upcalls cooperatively on a single
//! thread, so no locking is needed here.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::config::is_hidden_name;
use crate::error::VfsError;
use crate::layout;

/// A staging file for an open write session on a logical name.
#[derive(Debug, Clone)]
pub struct StagingEntry {
    pub path: PathBuf,
}

/// Outcome of applying the commit-policy on flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No staging entry existed; nothing to do.
    NoChange,
    /// Staging content matched `name.1`; staging file discarded, no new
    /// version was created.
    Unchanged,
    /// Staging content differed from `name.1`; the chain was rotated and
    /// the staging file installed as the new `name.1`.
    Committed,
}

/// Process-local mapping from logical name to staging descriptor.
///
/// Owned by the driver instance — never a global singleton.
#[derive(Debug, Default)]
pub struct StagingManager {
    entries: HashMap<String, StagingEntry>,
}

impl StagingManager {
    pub fn new() -> Self {
        StagingManager {
            entries: HashMap::new(),
        }
    }

    /// Acquire (or return the existing) staging entry for `name`.
    ///
    /// Copy-on-first-write: if `name.1` exists, its content (and mtime) is
    /// copied into the staging file; otherwise an empty staging file is
    /// created. This happens lazily, on the first mutating call, so that
    /// pure readers never create a staging file.
    pub fn acquire(&mut self, store: &std::path::Path, name: &str) -> Result<&StagingEntry, VfsError> {
        if is_hidden_name(name) {
            return Err(VfsError::NotPermitted(name.to_string()));
        }

        if !self.entries.contains_key(name) {
            let staging = layout::staging_path(store, name);
            let current = layout::store_path(store, name, 1);

            if current.exists() {
                fs::copy(&current, &staging).map_err(|e| VfsError::io(&staging, e))?;
                if let Ok(meta) = fs::metadata(&current) {
                    if let Ok(mtime) = meta.modified() {
                        if let Ok(file) = fs::File::open(&staging) {
                            let _ = file.set_modified(mtime);
                        }
                    }
                }
            } else {
                fs::write(&staging, []).map_err(|e| VfsError::io(&staging, e))?;
            }

            tracing::debug!(name, path = ?staging, "staging entry acquired");
            self.entries.insert(name.to_string(), StagingEntry { path: staging });
        }

        Ok(self.entries.get(name).expect("just inserted"))
    }

    /// Returns the staging entry for `name`, if a write session is open.
    pub fn get(&self, name: &str) -> Option<&StagingEntry> {
        self.entries.get(name)
    }

    /// Discard a staging entry and remove its backing file, without
    /// committing it.
    pub fn discard(&mut self, store: &std::path::Path, name: &str) {
        if let Some(entry) = self.entries.remove(name) {
            let _ = fs::remove_file(&entry.path);
        } else {
            let _ = fs::remove_file(layout::staging_path(store, name));
        }
    }

    /// Re-key a staging entry after a rename.
    pub fn rekey(&mut self, store: &std::path::Path, old: &str, new: &str) {
        if let Some(entry) = self.entries.remove(old) {
            let new_path = layout::staging_path(store, new);
            if fs::rename(&entry.path, &new_path).is_ok() {
                self.entries.insert(
                    new.to_string(),
                    StagingEntry { path: new_path },
                );
            }
        }
    }

    /// Apply the commit-policy for `name`: if no staging entry exists, do
    /// nothing. Otherwise compare against `name.1` and
    /// either rotate-and-commit or discard-as-unchanged, then remove the
    /// table entry either way.
    pub fn commit(&mut self, store: &std::path::Path, name: &str) -> Result<CommitOutcome, VfsError> {
        let Some(entry) = self.entries.remove(name) else {
            return Ok(CommitOutcome::NoChange);
        };

        let current = layout::store_path(store, name, 1);
        let outcome = if !current.exists() || !layout::bytes_equal(&current, &entry.path) {
            layout::rotate(store, name)?;
            fs::rename(&entry.path, &current).map_err(|e| VfsError::io(&current, e))?;
            tracing::debug!(name, "flush committed a new version");
            CommitOutcome::Committed
        } else {
            let _ = fs::remove_file(&entry.path);
            tracing::debug!(name, "flush saw unchanged content, no version created");
            CommitOutcome::Unchanged
        };

        Ok(outcome)
    }
}
