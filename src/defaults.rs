//! Default configuration constants for phonetrack.
//!
//! Shared between the configuration types and the timing stages so a run
//! without a config file reproduces the stock timing exactly.

/// Minimum phoneme duration in seconds (35 ms).
///
/// Segments shorter than this are not reliably renderable by animation
/// playback. Also the gap a plosive needs before a release schwa is added,
/// and the length of that schwa.
pub const MIN_PHONE_DUR: f64 = 0.035;

/// Segments shorter than this (25 ms) are folded into the previous segment.
pub const MERGE_THRESHOLD: f64 = 0.025;

/// Uniform leftward shift applied to every segment start (15 ms).
pub const ANTICIPATION_SHIFT: f64 = 0.015;

/// Decimal places kept in exported timestamps.
pub const ROUND_DECIMALS: u32 = 4;

/// Sample rate the aligner expects for its input WAV files.
pub const ALIGNER_SAMPLE_RATE: u32 = 16000;

/// Name of the phone tier in MFA TextGrid output.
pub const PHONES_TIER: &str = "phones";

/// Aligner executable.
pub const ALIGNER_COMMAND: &str = "mfa";

/// Audio converter executable.
pub const CONVERTER_COMMAND: &str = "ffmpeg";

/// Dataset root directory (relative to the working directory).
pub const DATASET_DIR: &str = "dataset";

/// Scratch directory for WAV/LAB files and aligner output.
pub const WORK_DIR: &str = "mfa_work";

/// Manifest file inside the dataset directory.
pub const MANIFEST_FILE: &str = "alignment.json";

/// Per-utterance JSON export directory inside the dataset directory.
pub const JSON_OUT_DIR: &str = "phonemes_json";

/// Document field the phoneme track is written to.
pub const PHONEMES_FIELD: &str = "phonemeAlignment";

/// MongoDB connection string used when the Mongo backend has no URI.
pub const MONGO_URI: &str = "mongodb://localhost:27017";

/// MongoDB database holding the utterance documents.
pub const MONGO_DATABASE: &str = "learn-nation";

/// MongoDB collection holding the utterance documents.
pub const MONGO_COLLECTION: &str = "audioentries";

/// Number of postprocessing workers used by the batch driver.
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_threshold_is_below_minimum_duration() {
        assert!(MERGE_THRESHOLD < MIN_PHONE_DUR);
    }

    #[test]
    fn worker_count_is_bounded() {
        let n = worker_count();
        assert!((1..=8).contains(&n), "got {}", n);
    }
}
