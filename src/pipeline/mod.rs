//! Phoneme timing postprocessing.
//!
//! Four stages, each restoring an invariant the previous one may break,
//! chained by [`TimingPipeline`] in a fixed order.

pub mod anticipation;
pub mod error;
pub mod merge;
pub mod min_duration;
pub mod orchestrator;
pub mod schwa;
pub mod stage;
pub mod types;

pub use anticipation::AnticipationShift;
pub use error::{ErrorReporter, LogReporter};
pub use merge::TinySegmentMerge;
pub use min_duration::MinDurationEnforcement;
pub use orchestrator::TimingPipeline;
pub use schwa::SchwaSynthesis;
pub use stage::TimingStage;
pub use types::TimingParams;
