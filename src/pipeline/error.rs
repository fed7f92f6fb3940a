//! Reporting of per-utterance failures in batch runs.

use crate::error::PhonetrackError;

/// Trait for reporting an utterance that was skipped.
pub trait ErrorReporter: Send + Sync {
    /// Reports the error that caused `utterance` to be skipped.
    fn report(&self, utterance: &str, error: &PhonetrackError);
}

/// Reporter that emits a `tracing` warning, tagged with the failing stage
/// when there is one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, utterance: &str, error: &PhonetrackError) {
        match error.stage() {
            Some(stage) => {
                tracing::warn!(utterance, stage, error = %error, "Skipping utterance")
            }
            None => tracing::warn!(utterance, error = %error, "Skipping utterance"),
        }
    }
}
