//! Document store abstraction for publishing phoneme tracks.

mod manifest;
#[cfg(feature = "mongo")]
mod mongo;

pub use manifest::JsonManifestStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

use crate::config::{Config, StoreBackend};
use crate::dataset::AlignmentEntry;
use crate::error::Result;
use crate::export::PhonemeTrack;
use chrono::{DateTime, Utc};
use std::fmt;

/// Format of the `created` stamp written next to a published track.
pub const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// How a document is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    VoiceKeyHash(String),
    DocumentId(String),
}

impl DocumentKey {
    pub fn matches(&self, entry: &AlignmentEntry) -> bool {
        match self {
            DocumentKey::VoiceKeyHash(hash) => entry.key() == Some(hash.as_str()),
            DocumentKey::DocumentId(id) => entry.document_id().as_deref() == Some(id.as_str()),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKey::VoiceKeyHash(hash) => write!(f, "voiceKeyHash={}", hash),
            DocumentKey::DocumentId(id) => write!(f, "_id={}", id),
        }
    }
}

/// A store of utterance documents that phoneme tracks are published into.
///
/// Handles are opened explicitly and must be closed; operations on a closed
/// handle fail.
pub trait DocumentStore {
    /// Entries, optionally only those created strictly before `created_before`.
    fn read_entries(&self, created_before: Option<DateTime<Utc>>) -> Result<Vec<AlignmentEntry>>;

    /// The first document matching `key`.
    fn find(&self, key: &DocumentKey) -> Result<AlignmentEntry>;

    /// Stamp `track` into the matching document with the given creation time.
    fn write_phonemes_at(
        &mut self,
        key: &DocumentKey,
        track: &PhonemeTrack,
        created: DateTime<Utc>,
    ) -> Result<()>;

    fn write_phonemes(&mut self, key: &DocumentKey, track: &PhonemeTrack) -> Result<()> {
        self.write_phonemes_at(key, track, Utc::now())
    }

    /// Persist pending writes and release the handle. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Open the backend `config.store` selects.
pub fn open(config: &Config) -> Result<Box<dyn DocumentStore>> {
    let store = &config.store;
    match store.backend {
        StoreBackend::Manifest => Ok(Box::new(JsonManifestStore::open(
            config.store_path(),
            &store.phonemes_field,
        )?)),
        #[cfg(feature = "mongo")]
        StoreBackend::Mongo => Ok(Box::new(MongoStore::open(
            &store.uri,
            &store.database,
            &store.collection,
            &store.phonemes_field,
        )?)),
        #[cfg(not(feature = "mongo"))]
        StoreBackend::Mongo => Err(crate::error::PhonetrackError::Store {
            message: "the mongo backend needs phonetrack built with the `mongo` feature"
                .to_string(),
        }),
    }
}
