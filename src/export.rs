//! Export shaping: rounded phoneme records and their JSON artifacts.
//!
//! A track serializes as a plain JSON array of `{<label>, start, end}`
//! objects where the label key names the alphabet (`cmu` or `ipa`).

use crate::error::{PhonetrackError, Result};
use crate::phoneme::{PhoneSet, Segment};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

/// One exported phoneme.
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemeRecord {
    pub label: String,
    pub start: f64,
    pub end: f64,
}

/// Final, rounded phoneme timing track for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemeTrack {
    pub phone_set: PhoneSet,
    pub records: Vec<PhonemeRecord>,
}

/// Round to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

impl PhonemeTrack {
    /// Round every timestamp and map segments to records, preserving order.
    pub fn from_segments(phone_set: PhoneSet, segments: &[Segment], decimals: u32) -> Self {
        let records = segments
            .iter()
            .map(|s| PhonemeRecord {
                label: s.label.clone(),
                start: round_to(s.start, decimals),
                end: round_to(s.end, decimals),
            })
            .collect();
        Self { phone_set, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an exported track. The alphabet is taken from the label key;
    /// an empty array yields `fallback`.
    pub fn from_json_str(json: &str, fallback: PhoneSet) -> Result<Self> {
        let raw: Vec<RawRecord> = serde_json::from_str(json)?;
        Self::from_raw(raw, fallback)
    }

    pub fn from_json_value(value: serde_json::Value, fallback: PhoneSet) -> Result<Self> {
        let raw: Vec<RawRecord> = serde_json::from_value(value)?;
        Self::from_raw(raw, fallback)
    }

    fn from_raw(raw: Vec<RawRecord>, fallback: PhoneSet) -> Result<Self> {
        let phone_set = raw.first().map_or(fallback, RawRecord::phone_set);

        let records = raw
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                if r.phone_set() != phone_set {
                    return Err(PhonetrackError::Other(format!(
                        "record {} uses {} labels in a {} track",
                        index,
                        r.phone_set(),
                        phone_set
                    )));
                }
                Ok(r.into_record())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { phone_set, records })
    }
}

impl Serialize for PhonemeTrack {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let field = self.phone_set.label_field();
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(&LabeledRecord { field, record })?;
        }
        seq.end()
    }
}

struct LabeledRecord<'a> {
    field: &'static str,
    record: &'a PhonemeRecord,
}

impl Serialize for LabeledRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.field, &self.record.label)?;
        map.serialize_entry("start", &self.record.start)?;
        map.serialize_entry("end", &self.record.end)?;
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Cmu { cmu: String, start: f64, end: f64 },
    Ipa { ipa: String, start: f64, end: f64 },
}

impl RawRecord {
    fn phone_set(&self) -> PhoneSet {
        match self {
            RawRecord::Cmu { .. } => PhoneSet::Arpabet,
            RawRecord::Ipa { .. } => PhoneSet::Ipa,
        }
    }

    fn into_record(self) -> PhonemeRecord {
        match self {
            RawRecord::Cmu { cmu, start, end } => PhonemeRecord {
                label: cmu,
                start,
                end,
            },
            RawRecord::Ipa { ipa, start, end } => PhonemeRecord {
                label: ipa,
                start,
                end,
            },
        }
    }
}

/// Writes per-utterance JSON artifacts into one directory.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    dir: PathBuf,
}

impl JsonExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, utterance: &str) -> PathBuf {
        self.dir.join(format!("{}.json", utterance))
    }

    /// Write `<dir>/<utterance>.json`, creating the directory if needed.
    pub fn write(&self, utterance: &str, track: &PhonemeTrack) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(utterance);
        fs::write(&path, track.to_json_pretty()?)?;
        tracing::debug!(utterance, path = %path.display(), records = track.len(), "Wrote JSON track");
        Ok(path)
    }

    /// Load a previously exported track.
    pub fn load(path: &Path, fallback: PhoneSet) -> Result<PhonemeTrack> {
        let contents = fs::read_to_string(path)?;
        PhonemeTrack::from_json_str(&contents, fallback)
    }
}
