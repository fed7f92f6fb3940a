//! Document store backed by the dataset manifest file.

use super::{CREATED_FORMAT, DocumentKey, DocumentStore};
use crate::dataset::AlignmentEntry;
use crate::error::{PhonetrackError, Result};
use crate::export::PhonemeTrack;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// `alignment.json` as a document store.
///
/// The whole manifest is held in memory; writes mark it dirty and are
/// persisted by [`flush`](Self::flush) or [`close`](DocumentStore::close).
#[derive(Debug)]
pub struct JsonManifestStore {
    path: PathBuf,
    phonemes_field: String,
    entries: Vec<AlignmentEntry>,
    dirty: bool,
    closed: bool,
}

impl JsonManifestStore {
    pub fn open(path: impl Into<PathBuf>, phonemes_field: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path).map_err(|e| PhonetrackError::Store {
            message: format!("cannot open manifest {}: {}", path.display(), e),
        })?;
        let entries: Vec<AlignmentEntry> =
            serde_json::from_str(&contents).map_err(|e| PhonetrackError::Store {
                message: format!("malformed manifest {}: {}", path.display(), e),
            })?;

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened manifest store");
        Ok(Self {
            path,
            phonemes_field: phonemes_field.into(),
            entries,
            dirty: false,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write pending changes back to the manifest (temp file, then rename).
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.dirty {
            return Ok(());
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;

        tracing::debug!(path = %self.path.display(), "Flushed manifest store");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(PhonetrackError::Store {
                message: format!("store {} is closed", self.path.display()),
            });
        }
        Ok(())
    }
}

impl DocumentStore for JsonManifestStore {
    fn read_entries(&self, created_before: Option<DateTime<Utc>>) -> Result<Vec<AlignmentEntry>> {
        self.ensure_open()?;
        let entries = match created_before {
            None => self.entries.clone(),
            Some(cutoff) => self
                .entries
                .iter()
                .filter(|e| e.created_at().is_some_and(|created| created < cutoff))
                .cloned()
                .collect(),
        };
        Ok(entries)
    }

    fn find(&self, key: &DocumentKey) -> Result<AlignmentEntry> {
        self.ensure_open()?;
        self.entries
            .iter()
            .find(|e| key.matches(e))
            .cloned()
            .ok_or_else(|| PhonetrackError::DocumentNotFound {
                key: key.to_string(),
            })
    }

    fn write_phonemes_at(
        &mut self,
        key: &DocumentKey,
        track: &PhonemeTrack,
        created: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        let value = json!({
            "created": created.format(CREATED_FORMAT).to_string(),
            "alignment": track.to_json_value()?,
        });

        let entry = self
            .entries
            .iter_mut()
            .find(|e| key.matches(e))
            .ok_or_else(|| PhonetrackError::DocumentNotFound {
                key: key.to_string(),
            })?;
        entry.extra.insert(self.phonemes_field.clone(), value);
        self.dirty = true;

        tracing::debug!(%key, records = track.len(), "Stamped phoneme track");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for JsonManifestStore {
    fn drop(&mut self) {
        if !self.closed && self.dirty {
            tracing::warn!(path = %self.path.display(), "Manifest store dropped with unsaved writes");
        }
    }
}
