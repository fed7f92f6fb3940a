//! Release-vowel synthesis after plosives followed by a pause.

use crate::error::Result;
use crate::phoneme::{PhoneSet, Segment};
use crate::pipeline::stage::TimingStage;

/// Inserts a short schwa after every plosive whose gap to the next segment
/// exceeds the minimum phone duration. The last segment has an infinite
/// trailing gap. Existing segments are never modified.
#[derive(Debug, Clone)]
pub struct SchwaSynthesis {
    phone_set: PhoneSet,
    min_phone_dur: f64,
}

impl SchwaSynthesis {
    pub fn new(phone_set: PhoneSet, min_phone_dur: f64) -> Self {
        Self {
            phone_set,
            min_phone_dur,
        }
    }
}

impl TimingStage for SchwaSynthesis {
    fn name(&self) -> &'static str {
        "schwa-synthesis"
    }

    fn apply(&self, segments: Vec<Segment>) -> Result<Vec<Segment>> {
        let mut out = Vec::with_capacity(segments.len() + segments.len() / 4);
        let mut iter = segments.into_iter().peekable();

        while let Some(segment) = iter.next() {
            let gap = iter
                .peek()
                .map_or(f64::INFINITY, |next| next.start - segment.end);

            let release = (self.phone_set.is_plosive(&segment.label) && gap > self.min_phone_dur)
                .then(|| {
                    Segment::new(
                        self.phone_set.schwa(),
                        segment.end,
                        segment.end + self.min_phone_dur,
                    )
                });

            out.push(segment);
            out.extend(release);
        }

        Ok(out)
    }
}
