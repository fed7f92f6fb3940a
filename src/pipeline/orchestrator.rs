//! The timing pipeline: fixed-order chain of timing stages.

use crate::config::Config;
use crate::defaults;
use crate::error::{PhonetrackError, Result};
use crate::export::PhonemeTrack;
use crate::phoneme::{PhoneSet, Segment, validate_sequence};
use crate::pipeline::anticipation::AnticipationShift;
use crate::pipeline::merge::TinySegmentMerge;
use crate::pipeline::min_duration::MinDurationEnforcement;
use crate::pipeline::schwa::SchwaSynthesis;
use crate::pipeline::stage::TimingStage;
use crate::pipeline::types::TimingParams;

/// Postprocessing pipeline for one run.
///
/// Stages always run in this order:
/// schwa synthesis (optional) → anticipation shift → tiny merge → min duration.
/// Turning schwa synthesis off changes output segment counts.
pub struct TimingPipeline {
    phone_set: PhoneSet,
    params: TimingParams,
    round_decimals: u32,
    stages: Vec<Box<dyn TimingStage>>,
}

impl TimingPipeline {
    pub fn new(phone_set: PhoneSet, params: TimingParams, schwa: bool) -> Self {
        let mut stages: Vec<Box<dyn TimingStage>> = Vec::with_capacity(4);
        if schwa {
            stages.push(Box::new(SchwaSynthesis::new(phone_set, params.min_phone_dur)));
        }
        stages.push(Box::new(AnticipationShift::new(params.anticipation_shift)));
        stages.push(Box::new(TinySegmentMerge::new(params.merge_threshold)));
        stages.push(Box::new(MinDurationEnforcement::new(params.min_phone_dur)));

        Self {
            phone_set,
            params,
            round_decimals: defaults::ROUND_DECIMALS,
            stages,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.phones.set, config.timing.params(), config.timing.schwa)
            .with_round_decimals(config.timing.round_decimals)
    }

    pub fn with_round_decimals(mut self, decimals: u32) -> Self {
        self.round_decimals = decimals;
        self
    }

    pub fn phone_set(&self) -> PhoneSet {
        self.phone_set
    }

    pub fn params(&self) -> TimingParams {
        self.params
    }

    pub fn schwa_enabled(&self) -> bool {
        self.stages.iter().any(|s| s.name() == "schwa-synthesis")
    }

    /// Names of the active stages in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `segments` and return the unrounded result.
    ///
    /// Fails fast on malformed input. Errors raised inside a stage, or a
    /// stage output that breaks the segment invariants, are reported as
    /// [`PhonetrackError::Stage`] naming the stage.
    pub fn run(&self, segments: Vec<Segment>) -> Result<Vec<Segment>> {
        validate_sequence(&segments)?;

        let mut current = segments;
        for stage in &self.stages {
            let name = stage.name();
            let before = current.len();

            current = stage.apply(current).map_err(|e| match e {
                stage_error @ PhonetrackError::Stage { .. } => stage_error,
                other => PhonetrackError::Stage {
                    stage: name,
                    message: other.to_string(),
                },
            })?;

            validate_sequence(&current).map_err(|e| PhonetrackError::Stage {
                stage: name,
                message: e.to_string(),
            })?;

            tracing::trace!(stage = name, before, after = current.len(), "Stage complete");
        }

        Ok(current)
    }

    /// Run the pipeline and shape the result for export.
    pub fn process(&self, segments: Vec<Segment>) -> Result<PhonemeTrack> {
        let input = segments.len();
        let output = self.run(segments)?;
        tracing::debug!(input, output = output.len(), "Postprocessed phoneme track");
        Ok(PhonemeTrack::from_segments(
            self.phone_set,
            &output,
            self.round_decimals,
        ))
    }
}

impl std::fmt::Debug for TimingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingPipeline")
            .field("phone_set", &self.phone_set)
            .field("params", &self.params)
            .field("round_decimals", &self.round_decimals)
            .field("stages", &self.stage_names())
            .finish()
    }
}
