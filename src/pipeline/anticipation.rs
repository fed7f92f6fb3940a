//! Anticipation shift: every onset moves earlier by a fixed amount.

use crate::error::Result;
use crate::phoneme::Segment;
use crate::pipeline::stage::TimingStage;

/// `start := max(0, start - shift)` for every segment. End times are untouched.
#[derive(Debug, Clone)]
pub struct AnticipationShift {
    shift: f64,
}

impl AnticipationShift {
    pub fn new(shift: f64) -> Self {
        Self { shift }
    }
}

impl TimingStage for AnticipationShift {
    fn name(&self) -> &'static str {
        "anticipation-shift"
    }

    fn apply(&self, mut segments: Vec<Segment>) -> Result<Vec<Segment>> {
        for segment in &mut segments {
            segment.start = (segment.start - self.shift).max(0.0);
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::ANTICIPATION_SHIFT;

    #[test]
    fn shifts_start_and_keeps_end() {
        let out = AnticipationShift::new(ANTICIPATION_SHIFT)
            .apply(vec![Segment::new("AH", 0.10, 0.20)])
            .unwrap();
        assert!((out[0].start - 0.085).abs() < 1e-12);
        assert_eq!(out[0].end, 0.20);
    }

    #[test]
    fn clamps_at_zero() {
        let out = AnticipationShift::new(ANTICIPATION_SHIFT)
            .apply(vec![
                Segment::new("AH", 0.0, 0.05),
                Segment::new("B", 0.01, 0.05),
            ])
            .unwrap();
        assert_eq!(out[0].start, 0.0);
        assert_eq!(out[1].start, 0.0);
    }

    #[test]
    fn keeps_segment_count_and_labels() {
        let input = vec![
            Segment::new("HH", 0.0, 0.1),
            Segment::new("AY", 0.1, 0.3),
        ];
        let out = AnticipationShift::new(ANTICIPATION_SHIFT)
            .apply(input.clone())
            .unwrap();
        assert_eq!(out.len(), input.len());
        for (a, b) in input.iter().zip(&out) {
            assert_eq!(a.label, b.label);
        }
    }
}
