//! Dataset manifest entries (`alignment.json` documents).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One utterance document.
///
/// Only the fields the batch run needs are typed; everything else is kept
/// in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentEntry {
    /// Store-native document id: a plain string or an extended-JSON `{"$oid": ..}`.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_key_hash: Option<String>,
    /// MP3 payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalised_alignment: Option<NormalisedAlignment>,
    /// RFC 3339 string or extended-JSON `{"$date": ..}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Character-level alignment shipped with the TTS audio; only the
/// characters are used, as the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalisedAlignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlignmentEntry {
    /// Non-empty voice key hash, the utterance key used for file names.
    pub fn key(&self) -> Option<&str> {
        self.voice_key_hash.as_deref().filter(|k| !k.is_empty())
    }

    pub fn document_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) => Some(id.clone()),
            Value::Object(obj) => obj.get("$oid").and_then(Value::as_str).map(String::from),
            other => Some(other.to_string()),
        }
    }

    /// Transcript text: the joined, trimmed normalised characters.
    pub fn transcript(&self) -> Option<String> {
        let characters = self.normalised_alignment.as_ref()?.characters.as_ref()?;
        Some(characters.concat().trim().to_string())
    }

    /// Creation time, if present and RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = match self.created.as_ref()? {
            Value::String(raw) => raw.as_str(),
            Value::Object(obj) => obj.get("$date")?.as_str()?,
            _ => return None,
        };
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
