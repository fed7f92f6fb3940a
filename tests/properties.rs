//! Property tests for the timing stages.

use phonetrack::defaults::{ANTICIPATION_SHIFT, MERGE_THRESHOLD, MIN_PHONE_DUR};
use phonetrack::phoneme::validate_sequence;
use phonetrack::pipeline::{
    AnticipationShift, MinDurationEnforcement, SchwaSynthesis, TimingStage, TinySegmentMerge,
};
use phonetrack::{PhoneSet, Segment, TimingParams, TimingPipeline};
use proptest::prelude::*;

const EPS: f64 = 1e-9;
const LABELS: &[&str] = &["AH", "T", "K", "S", "IY", "B", "N", "P"];

/// Ordered, non-overlapping segments: (label, gap before, duration) steps.
fn segments() -> impl Strategy<Value = Vec<Segment>> {
    prop::collection::vec((0..LABELS.len(), 0.0f64..0.1, 0.0f64..0.2), 1..30).prop_map(|steps| {
        let mut t = 0.0;
        steps
            .into_iter()
            .map(|(label, gap, dur)| {
                let start = t + gap;
                t = start + dur;
                Segment::new(LABELS[label], start, t)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn shift_preserves_count_and_ends(input in segments()) {
        let out = AnticipationShift::new(ANTICIPATION_SHIFT).apply(input.clone()).unwrap();
        prop_assert_eq!(out.len(), input.len());
        for (a, b) in input.iter().zip(&out) {
            prop_assert_eq!(a.end, b.end);
            prop_assert!(b.start >= 0.0);
            prop_assert_eq!(b.start, (a.start - ANTICIPATION_SHIFT).max(0.0));
            prop_assert!(b.duration() <= a.duration() + ANTICIPATION_SHIFT + EPS);
        }
    }

    #[test]
    fn merge_keeps_first_segment_and_final_end(input in segments()) {
        let out = TinySegmentMerge::new(MERGE_THRESHOLD).apply(input.clone()).unwrap();
        prop_assert!(!out.is_empty());
        prop_assert!(out.len() <= input.len());
        prop_assert_eq!(&out[0].label, &input[0].label);
        prop_assert_eq!(out[0].start, input[0].start);
        prop_assert_eq!(out.last().map(|s| s.end), input.last().map(|s| s.end));
        // Every segment after the first survived on its own duration
        for s in &out[1..] {
            prop_assert!(s.duration() >= MERGE_THRESHOLD);
        }
    }

    #[test]
    fn schwa_count_matches_qualifying_plosives(input in segments()) {
        let set = PhoneSet::Arpabet;
        let qualifies: Vec<bool> = input
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let gap = input.get(i + 1).map_or(f64::INFINITY, |n| n.start - s.end);
                set.is_plosive(&s.label) && gap > MIN_PHONE_DUR
            })
            .collect();
        let expected = qualifies.iter().filter(|&&q| q).count();

        let out = SchwaSynthesis::new(set, MIN_PHONE_DUR).apply(input.clone()).unwrap();
        prop_assert_eq!(out.len(), input.len() + expected);

        // Walk the output: each input segment in place, its release right after it
        let mut kept = Vec::with_capacity(input.len());
        let mut pos = 0;
        for (segment, &release) in input.iter().zip(&qualifies) {
            prop_assert_eq!(&out[pos], segment);
            kept.push(out[pos].clone());
            pos += 1;
            if release {
                let schwa = &out[pos];
                prop_assert_eq!(schwa.label.as_str(), set.schwa());
                prop_assert_eq!(schwa.start, segment.end);
                prop_assert!((schwa.duration() - MIN_PHONE_DUR).abs() < EPS);
                pos += 1;
            }
        }
        prop_assert_eq!(pos, out.len());
        prop_assert_eq!(kept, input);
    }

    #[test]
    fn min_duration_reaches_minimum_everywhere(input in segments()) {
        let out = MinDurationEnforcement::new(MIN_PHONE_DUR).apply(input.clone()).unwrap();
        prop_assert_eq!(out.len(), input.len());
        for s in &out {
            prop_assert!(s.duration() >= MIN_PHONE_DUR - EPS, "{:?}", s);
        }
    }

    #[test]
    fn min_duration_second_pass_is_stable(input in segments()) {
        let stage = MinDurationEnforcement::new(MIN_PHONE_DUR);
        let once = stage.apply(input).unwrap();
        let twice = stage.apply(once.clone()).unwrap();
        for (a, b) in once.iter().zip(&twice) {
            prop_assert!((a.start - b.start).abs() < EPS);
            prop_assert!((a.end - b.end).abs() < EPS);
        }
    }

    #[test]
    fn pipeline_output_is_valid_and_rounded(input in segments(), schwa in any::<bool>()) {
        let pipeline = TimingPipeline::new(PhoneSet::Arpabet, TimingParams::default(), schwa);
        let track = pipeline.process(input).unwrap();

        prop_assert!(!track.is_empty());
        let segments: Vec<Segment> = track
            .records
            .iter()
            .map(|r| Segment::new(r.label.clone(), r.start, r.end))
            .collect();
        prop_assert!(validate_sequence(&segments).is_ok());
        for r in &track.records {
            prop_assert!(((r.start * 1e4).round() - r.start * 1e4).abs() < 1e-6);
            prop_assert!(((r.end * 1e4).round() - r.end * 1e4).abs() < 1e-6);
        }
    }
}
