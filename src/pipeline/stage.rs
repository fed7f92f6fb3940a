//! The `TimingStage` trait every pipeline stage implements.

use crate::error::Result;
use crate::phoneme::Segment;

/// One step of the timing pipeline.
///
/// A stage consumes the full output of the previous stage and returns a new
/// sequence. Stages inspect neighbors, so they are never split across
/// segments.
pub trait TimingStage: Send + Sync {
    /// Stable name used in logs and in stage errors.
    fn name(&self) -> &'static str;

    /// Transform the sequence.
    fn apply(&self, segments: Vec<Segment>) -> Result<Vec<Segment>>;
}
