//! Minimum-duration enforcement.

use crate::error::Result;
use crate::phoneme::Segment;
use crate::pipeline::stage::TimingStage;

/// Extends every segment shorter than the minimum and shrinks the right
/// neighbor from the left when the extension runs into it.
///
/// This is one forward pass, not a fixed-point iteration. The shrink of
/// segment `i + 1` happens before `i + 1` is visited, so its own check sees
/// the shrunk duration; nothing is ever re-checked behind the cursor, and
/// overlaps that the extension did not create are left as they are.
#[derive(Debug, Clone)]
pub struct MinDurationEnforcement {
    min_phone_dur: f64,
}

impl MinDurationEnforcement {
    pub fn new(min_phone_dur: f64) -> Self {
        Self { min_phone_dur }
    }
}

impl TimingStage for MinDurationEnforcement {
    fn name(&self) -> &'static str {
        "min-duration"
    }

    fn apply(&self, mut segments: Vec<Segment>) -> Result<Vec<Segment>> {
        for i in 0..segments.len() {
            let duration = segments[i].duration();
            if duration >= self.min_phone_dur {
                continue;
            }

            segments[i].end += self.min_phone_dur - duration;
            let end = segments[i].end;

            if let Some(next) = segments.get_mut(i + 1)
                && next.start < end
            {
                next.start = end;
            }
        }

        Ok(segments)
    }
}
