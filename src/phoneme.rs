//! Phoneme segments and phone alphabets.

use crate::error::{PhonetrackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ARPABET_PLOSIVES: &[&str] = &["B", "D", "G", "P", "T", "K"];
const IPA_PLOSIVES: &[&str] = &["b", "d", "g", "ɡ", "p", "t", "k", "pʰ", "tʰ", "kʰ"];

/// Labels the aligner emits for silence, noise and out-of-vocabulary audio.
const NOISE_LABELS: &[&str] = &["spn", "sil", "sp", "<unk>", "<eps>"];

/// Phone alphabet used for an entire run.
///
/// Each variant carries the data the timing stages need (plosive set, release
/// vowel) and the names used when talking to the aligner and the exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhoneSet {
    /// CMU ARPABET, uppercase labels (e.g. "EH").
    #[default]
    #[serde(alias = "cmu")]
    Arpabet,
    /// IPA labels as produced by the MFA english model (e.g. "ɛ").
    #[serde(alias = "mfa")]
    Ipa,
}

impl PhoneSet {
    /// Labels eligible for release-schwa synthesis.
    pub fn plosives(self) -> &'static [&'static str] {
        match self {
            PhoneSet::Arpabet => ARPABET_PLOSIVES,
            PhoneSet::Ipa => IPA_PLOSIVES,
        }
    }

    pub fn is_plosive(self, label: &str) -> bool {
        self.plosives().contains(&label)
    }

    /// Release vowel inserted after word-final plosives.
    pub fn schwa(self) -> &'static str {
        match self {
            PhoneSet::Arpabet => "EH",
            PhoneSet::Ipa => "ɛ",
        }
    }

    /// Field name the label is exported under.
    pub fn label_field(self) -> &'static str {
        match self {
            PhoneSet::Arpabet => "cmu",
            PhoneSet::Ipa => "ipa",
        }
    }

    /// Default MFA acoustic model for this alphabet.
    pub fn acoustic_model(self) -> &'static str {
        match self {
            PhoneSet::Arpabet => "english_us_arpa",
            PhoneSet::Ipa => "english_mfa",
        }
    }

    /// Default MFA pronunciation dictionary for this alphabet.
    pub fn dictionary(self) -> &'static str {
        self.acoustic_model()
    }

    /// Canonical spelling of a raw aligner label.
    ///
    /// ARPABET labels are upper-cased; IPA labels are only trimmed since case
    /// carries meaning there.
    pub fn normalize_label(self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            PhoneSet::Arpabet => trimmed.to_uppercase(),
            PhoneSet::Ipa => trimmed.to_string(),
        }
    }

    /// True for labels that never reach the timing pipeline.
    pub fn is_noise_label(label: &str) -> bool {
        let trimmed = label.trim();
        trimmed.is_empty()
            || NOISE_LABELS
                .iter()
                .any(|noise| noise.eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for PhoneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneSet::Arpabet => write!(f, "arpabet"),
            PhoneSet::Ipa => write!(f, "ipa"),
        }
    }
}

impl FromStr for PhoneSet {
    type Err = PhonetrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arpabet" | "arpa" | "cmu" => Ok(PhoneSet::Arpabet),
            "ipa" | "mfa" => Ok(PhoneSet::Ipa),
            other => Err(PhonetrackError::ConfigInvalidValue {
                key: "phones.set".to_string(),
                message: format!("unknown phone set '{}', expected arpabet or ipa", other),
            }),
        }
    }
}

/// One labeled time interval, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(label: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the creation invariants; `index` is the segment's position in
    /// its sequence and is reported in the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        let reason = if self.label.trim().is_empty() {
            Some("empty label")
        } else if !self.start.is_finite() || !self.end.is_finite() {
            Some("non-numeric timestamp")
        } else if self.start < 0.0 {
            Some("negative start")
        } else if self.end < self.start {
            Some("end precedes start")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PhonetrackError::InvalidSegment {
                index,
                label: self.label.clone(),
                start: self.start,
                end: self.end,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Validate every segment of a sequence, failing on the first bad one.
pub fn validate_sequence(segments: &[Segment]) -> Result<()> {
    segments
        .iter()
        .enumerate()
        .try_for_each(|(index, segment)| segment.validate(index))
}
