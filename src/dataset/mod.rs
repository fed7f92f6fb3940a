//! Dataset manifest entries and aligner corpus preparation.

pub mod entry;
pub mod prepare;

pub use entry::{AlignmentEntry, NormalisedAlignment};
pub use prepare::{AudioConverter, ensure_dirs, verify_wav, write_transcripts};
