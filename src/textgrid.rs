//! Reading phone intervals from aligner TextGrid output.

use crate::defaults::PHONES_TIER;
use crate::error::{PhonetrackError, Result};
use crate::phoneme::{PhoneSet, Segment};
use std::path::{Path, PathBuf};
use ::textgrid::{TextGrid, Tier};

/// Load the phone tier of a TextGrid as raw pipeline input.
///
/// The utterance key is the file stem. A file without a `phones` tier, or
/// whose tier holds only silence/noise, yields
/// [`PhonetrackError::NoPhonemeData`].
pub fn load_phones(path: &Path, phone_set: PhoneSet) -> Result<Vec<Segment>> {
    let grid = TextGrid::from_file(path).map_err(|e| PhonetrackError::TextGrid {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let utterance = utterance_key(path);
    let tier = grid
        .tiers
        .iter()
        .find(|tier| tier.name == PHONES_TIER)
        .ok_or_else(|| PhonetrackError::NoPhonemeData {
            utterance: utterance.clone(),
        })?;

    let phones = phones_from_tier(tier, phone_set);
    if phones.is_empty() {
        return Err(PhonetrackError::NoPhonemeData { utterance });
    }
    Ok(phones)
}

/// Convert a phone tier to segments, dropping empty and noise intervals and
/// normalizing labels for `phone_set`.
pub fn phones_from_tier(tier: &Tier, phone_set: PhoneSet) -> Vec<Segment> {
    tier.intervals
        .iter()
        .filter(|interval| !PhoneSet::is_noise_label(&interval.text))
        .map(|interval| {
            Segment::new(
                phone_set.normalize_label(&interval.text),
                interval.xmin,
                interval.xmax,
            )
        })
        .collect()
}

/// Utterance key of an aligner output file (its stem).
pub fn utterance_key(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// All `*.TextGrid` files below `dir`, sorted for reproducible batch order.
pub fn find_textgrids(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if dir.is_dir() {
        collect_textgrids(dir, &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn collect_textgrids(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_textgrids(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == "TextGrid") {
            found.push(path);
        }
    }
    Ok(())
}
