//! Montreal Forced Aligner invocation.

use crate::aligner::executor::CommandExecutor;
use crate::config::Config;
use crate::error::{PhonetrackError, Result};
use std::path::Path;

/// Runs `mfa align` over a prepared corpus directory.
///
/// One invocation aligns every WAV/LAB pair in the work directory and writes
/// one TextGrid per utterance into the output directory.
pub struct MfaAligner<E: CommandExecutor> {
    executor: E,
    command: String,
    acoustic_model: String,
    dictionary: String,
    extra_args: Vec<String>,
}

impl<E: CommandExecutor> MfaAligner<E> {
    pub fn new(executor: E, config: &Config) -> Self {
        Self {
            executor,
            command: config.aligner.command.clone(),
            acoustic_model: config.acoustic_model(),
            dictionary: config.dictionary(),
            extra_args: config.aligner.extra_args.clone(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Arguments for one alignment run.
    pub fn align_args(&self, corpus_dir: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "align".to_string(),
            corpus_dir.display().to_string(),
            self.dictionary.clone(),
            self.acoustic_model.clone(),
            output_dir.display().to_string(),
            "--clean".to_string(),
            "--overwrite".to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Align the corpus in `corpus_dir`, writing TextGrids to `output_dir`.
    pub fn align(&self, corpus_dir: &Path, output_dir: &Path) -> Result<()> {
        let args = self.align_args(corpus_dir, output_dir);
        tracing::info!(
            command = %self.command,
            model = %self.acoustic_model,
            dictionary = %self.dictionary,
            "Running forced alignment"
        );

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.executor
            .execute(&self.command, &arg_refs)
            .map_err(|e| match e {
                PhonetrackError::ToolNotFound { tool } => PhonetrackError::ToolNotFound {
                    tool: format!(
                        "{} (install Montreal Forced Aligner: conda install -c conda-forge montreal-forced-aligner)",
                        tool
                    ),
                },
                other => other,
            })?;
        Ok(())
    }

    /// Reported aligner version.
    pub fn version(&self) -> Result<String> {
        Ok(self
            .executor
            .execute(&self.command, &["version"])?
            .trim()
            .to_string())
    }
}
