//! Document store backed by a MongoDB collection (sync driver).

use super::{DocumentKey, DocumentStore};
use crate::dataset::AlignmentEntry;
use crate::error::{PhonetrackError, Result};
use crate::export::PhonemeTrack;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, Bson, Document, doc, oid::ObjectId};
use mongodb::sync::{Client, Collection};

/// A MongoDB collection of utterance documents.
///
/// The driver connects lazily, so an unreachable server surfaces on the
/// first read or write rather than in [`open`](Self::open).
pub struct MongoStore {
    namespace: String,
    phonemes_field: String,
    collection: Option<Collection<Document>>,
}

impl MongoStore {
    pub fn open(
        uri: &str,
        database: &str,
        collection: &str,
        phonemes_field: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::with_uri_str(uri).map_err(|e| PhonetrackError::Store {
            message: format!("invalid MongoDB connection string: {}", e),
        })?;
        let collection = client.database(database).collection::<Document>(collection);
        let namespace = collection.namespace().to_string();

        tracing::debug!(%namespace, "Opened MongoDB store");
        Ok(Self {
            namespace,
            phonemes_field: phonemes_field.into(),
            collection: Some(collection),
        })
    }

    /// `database.collection`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_closed(&self) -> bool {
        self.collection.is_none()
    }

    fn collection(&self) -> Result<&Collection<Document>> {
        self.collection.as_ref().ok_or_else(|| PhonetrackError::Store {
            message: format!("store {} is closed", self.namespace),
        })
    }

    fn driver_error(&self, action: &str, e: mongodb::error::Error) -> PhonetrackError {
        PhonetrackError::Store {
            message: format!("{} {}: {}", action, self.namespace, e),
        }
    }
}

impl DocumentStore for MongoStore {
    fn read_entries(&self, created_before: Option<DateTime<Utc>>) -> Result<Vec<AlignmentEntry>> {
        let cursor = self
            .collection()?
            .find(entries_filter(created_before))
            .run()
            .map_err(|e| self.driver_error("cannot query", e))?;

        let mut entries = Vec::new();
        for document in cursor {
            let document = document.map_err(|e| self.driver_error("cannot read from", e))?;
            entries.push(entry_from_document(document)?);
        }

        tracing::debug!(namespace = %self.namespace, entries = entries.len(), "Read documents");
        Ok(entries)
    }

    fn find(&self, key: &DocumentKey) -> Result<AlignmentEntry> {
        let document = self
            .collection()?
            .find_one(key_filter(key))
            .run()
            .map_err(|e| self.driver_error("cannot query", e))?
            .ok_or_else(|| PhonetrackError::DocumentNotFound {
                key: key.to_string(),
            })?;
        entry_from_document(document)
    }

    fn write_phonemes_at(
        &mut self,
        key: &DocumentKey,
        track: &PhonemeTrack,
        created: DateTime<Utc>,
    ) -> Result<()> {
        let update = phonemes_update(&self.phonemes_field, track, created);
        let result = self
            .collection()?
            .update_one(key_filter(key), update)
            .run()
            .map_err(|e| self.driver_error("cannot update", e))?;

        if result.matched_count == 0 {
            return Err(PhonetrackError::DocumentNotFound {
                key: key.to_string(),
            });
        }

        tracing::debug!(%key, records = track.len(), "Stamped phoneme track");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.collection.take().is_some() {
            tracing::debug!(namespace = %self.namespace, "Closed MongoDB store");
        }
        Ok(())
    }
}

/// Query for documents created strictly before `created_before`; all
/// documents without a cutoff.
pub(crate) fn entries_filter(created_before: Option<DateTime<Utc>>) -> Document {
    match created_before {
        None => Document::new(),
        Some(cutoff) => doc! { "created": { "$lt": to_bson_datetime(cutoff) } },
    }
}

/// Query matching one document. Ids that parse as an ObjectId are matched
/// as one; anything else is matched as a plain string id.
pub(crate) fn key_filter(key: &DocumentKey) -> Document {
    match key {
        DocumentKey::VoiceKeyHash(hash) => doc! { "voiceKeyHash": hash.as_str() },
        DocumentKey::DocumentId(id) => match ObjectId::parse_str(id) {
            Ok(oid) => doc! { "_id": oid },
            Err(_) => doc! { "_id": id.as_str() },
        },
    }
}

/// `$set` update stamping `track` into `field` as `{created, alignment}`.
pub(crate) fn phonemes_update(
    field: &str,
    track: &PhonemeTrack,
    created: DateTime<Utc>,
) -> Document {
    let label_field = track.phone_set.label_field();
    let alignment: Vec<Bson> = track
        .records
        .iter()
        .map(|record| {
            let mut item = Document::new();
            item.insert(label_field, record.label.as_str());
            item.insert("start", record.start);
            item.insert("end", record.end);
            Bson::Document(item)
        })
        .collect();

    let mut stamp = Document::new();
    stamp.insert("created", to_bson_datetime(created));
    stamp.insert("alignment", alignment);

    let mut set = Document::new();
    set.insert(field, stamp);
    doc! { "$set": set }
}

/// Decode a document through relaxed extended JSON, so ObjectIds arrive as
/// `{"$oid": ..}` and dates as `{"$date": "<RFC 3339>"}`.
pub(crate) fn entry_from_document(document: Document) -> Result<AlignmentEntry> {
    let value = Bson::Document(document).into_relaxed_extjson();
    serde_json::from_value(value).map_err(|e| PhonetrackError::Store {
        message: format!("malformed document: {}", e),
    })
}

fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}
