//! Data types shared by the timing stages.

use crate::defaults;

/// Numeric constants of one timing run, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingParams {
    /// Minimum segment duration; also the schwa gap threshold and schwa length.
    pub min_phone_dur: f64,
    /// Segments shorter than this are folded into their predecessor.
    pub merge_threshold: f64,
    /// Uniform leftward shift of every start time.
    pub anticipation_shift: f64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            min_phone_dur: defaults::MIN_PHONE_DUR,
            merge_threshold: defaults::MERGE_THRESHOLD,
            anticipation_shift: defaults::ANTICIPATION_SHIFT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_stock_timing() {
        let params = TimingParams::default();
        assert_eq!(params.min_phone_dur, 0.035);
        assert_eq!(params.merge_threshold, 0.025);
        assert_eq!(params.anticipation_shift, 0.015);
    }
}
