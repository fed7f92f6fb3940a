//! Tiny-segment merge: folds sub-threshold segments into their predecessor.

use crate::error::Result;
use crate::phoneme::Segment;
use crate::pipeline::stage::TimingStage;

/// Single left-to-right pass over a running output list.
///
/// A segment shorter than the threshold extends the last *output* segment's
/// end to its own end and disappears (its label is dropped). The first
/// segment has no predecessor and always survives. Because the comparison is
/// against the running output, several short segments in a row all cascade
/// into the same absorbing segment.
#[derive(Debug, Clone)]
pub struct TinySegmentMerge {
    threshold: f64,
}

impl TinySegmentMerge {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl TimingStage for TinySegmentMerge {
    fn name(&self) -> &'static str {
        "tiny-merge"
    }

    fn apply(&self, segments: Vec<Segment>) -> Result<Vec<Segment>> {
        let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());

        for segment in segments {
            match merged.last_mut() {
                Some(last) if segment.duration() < self.threshold => last.end = segment.end,
                _ => merged.push(segment),
            }
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::MERGE_THRESHOLD;

    fn merge(input: Vec<Segment>) -> Vec<Segment> {
        TinySegmentMerge::new(MERGE_THRESHOLD).apply(input).unwrap()
    }

    #[test]
    fn short_segment_folds_into_previous() {
        let out = merge(vec![
            Segment::new("AH", 0.0, 0.05),
            Segment::new("K", 0.05, 0.06),
        ]);
        assert_eq!(out, vec![Segment::new("AH", 0.0, 0.06)]);
    }

    #[test]
    fn first_segment_survives_even_when_tiny() {
        let out = merge(vec![
            Segment::new("K", 0.0, 0.001),
            Segment::new("AH", 0.001, 0.1),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Segment::new("K", 0.0, 0.001));
    }

    #[test]
    fn consecutive_short_segments_cascade() {
        let out = merge(vec![
            Segment::new("AH", 0.0, 0.1),
            Segment::new("T", 0.1, 0.11),
            Segment::new("K", 0.11, 0.12),
            Segment::new("S", 0.12, 0.13),
            Segment::new("IY", 0.13, 0.3),
        ]);
        assert_eq!(
            out,
            vec![Segment::new("AH", 0.0, 0.13), Segment::new("IY", 0.13, 0.3)]
        );
    }

    #[test]
    fn segment_at_threshold_is_kept() {
        let out = TinySegmentMerge::new(0.25).apply(vec![
            Segment::new("AH", 0.0, 0.5),
            Segment::new("K", 0.5, 0.75),
        ]);
        assert_eq!(out.unwrap().len(), 2);
    }

    #[test]
    fn absorbing_segment_keeps_label_and_start() {
        let out = merge(vec![
            Segment::new("M", 0.0, 0.04),
            Segment::new("AA", 0.04, 0.2),
            Segment::new("D", 0.2, 0.21),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].label, "AA");
        assert_eq!(out[1].start, 0.04);
        assert_eq!(out[1].end, 0.21);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge(Vec::new()).is_empty());
    }
}
