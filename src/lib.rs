//! phonetrack - phoneme timing tracks from forced alignment
//!
//! Turns aligner phone intervals into lip-sync ready timing: release schwas,
//! anticipatory shift, tiny-segment merging and minimum durations.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod aligner;
pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod logging;
pub mod phoneme;
pub mod pipeline;
pub mod store;
pub mod textgrid;

// Core types
pub use phoneme::{PhoneSet, Segment};
pub use export::{JsonExporter, PhonemeRecord, PhonemeTrack};

// Pipeline
pub use pipeline::{TimingParams, TimingPipeline, TimingStage};

// External tools
pub use aligner::{CommandExecutor, MfaAligner, SystemCommandExecutor};

// Store and batch
pub use batch::{BatchOptions, BatchReport, run_batch};
pub use store::{DocumentKey, DocumentStore, JsonManifestStore};
#[cfg(feature = "mongo")]
pub use store::MongoStore;

// Error handling
pub use error::{PhonetrackError, Result};

// Config
pub use config::Config;
