//! Command-line interface for phonetrack
//!
//! Provides argument parsing using clap derive macros.

use crate::phoneme::PhoneSet;
use crate::store::DocumentKey;
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Phoneme timing tracks from forced alignment
#[derive(Parser, Debug)]
#[command(
    name = "phonetrack",
    version = env!("PHONETRACK_VERSION"),
    about = "Phoneme timing tracks from forced alignment"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use the IPA phone set (MFA english_mfa model)
    #[arg(long, global = true, conflicts_with = "cmu")]
    pub ipa: bool,

    /// Use the ARPABET phone set (CMU labels)
    #[arg(long, global = true)]
    pub cmu: bool,

    /// Insert release schwas after plosives
    #[arg(long, global = true, conflicts_with = "no_schwa")]
    pub schwa: bool,

    /// Skip release schwa synthesis
    #[arg(long, global = true)]
    pub no_schwa: bool,
}

impl Cli {
    /// Phone set requested on the command line, if any.
    pub fn phone_set_override(&self) -> Option<PhoneSet> {
        match (self.ipa, self.cmu) {
            (true, _) => Some(PhoneSet::Ipa),
            (_, true) => Some(PhoneSet::Arpabet),
            _ => None,
        }
    }

    /// Schwa synthesis switch requested on the command line, if any.
    pub fn schwa_override(&self) -> Option<bool> {
        match (self.schwa, self.no_schwa) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Parse an RFC 3339 timestamp (`2024-05-01T00:00:00Z`).
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {}", e))
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare, align, postprocess, export and publish the whole dataset
    Run {
        /// Only process documents created before this time (RFC 3339)
        #[arg(long, value_name = "TIME", value_parser = parse_timestamp)]
        created_before: Option<DateTime<Utc>>,

        /// Reuse TextGrids already in the aligned directory
        #[arg(long)]
        skip_align: bool,

        /// Export JSON only; leave the document store untouched
        #[arg(long)]
        no_store: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Read and publish through MongoDB at this URI instead of the manifest
        #[arg(long, value_name = "URI", conflicts_with = "no_store")]
        use_mongo: Option<String>,
    },

    /// Postprocess one TextGrid and print the track as JSON
    Postprocess {
        /// Aligner TextGrid with a "phones" tier
        textgrid: PathBuf,

        /// Write the JSON here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write an exported track into the document store
    Publish(PublishArgs),

    /// Check external tool availability
    Check,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Target document for `publish`: exactly one key.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("key").required(true).args(["voice_key_hash", "document_id"])))]
pub struct PublishArgs {
    /// Exported track JSON
    pub json: PathBuf,

    /// Match the document by voice key hash
    #[arg(long, value_name = "HASH")]
    pub voice_key_hash: Option<String>,

    /// Match the document by store id
    #[arg(long, value_name = "ID")]
    pub document_id: Option<String>,

    /// Publish into MongoDB at this URI instead of the manifest
    #[arg(long, value_name = "URI")]
    pub use_mongo: Option<String>,
}

impl PublishArgs {
    pub fn key(&self) -> Option<DocumentKey> {
        match (&self.voice_key_hash, &self.document_id) {
            (Some(hash), _) => Some(DocumentKey::VoiceKeyHash(hash.clone())),
            (_, Some(id)) => Some(DocumentKey::DocumentId(id.clone())),
            _ => None,
        }
    }
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
    /// Dump a commented configuration template
    Dump,
}
