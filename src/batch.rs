//! Batch driver: prepare the corpus, align, postprocess, export, publish.
//!
//! Loading and postprocessing run on a worker pool; export and store writes
//! stay on the calling thread so the store handle needs no locking.

use crate::aligner::{CommandExecutor, MfaAligner};
use crate::config::Config;
use crate::dataset::{AudioConverter, ensure_dirs, write_transcripts};
use crate::error::Result;
use crate::export::{JsonExporter, PhonemeTrack};
use crate::pipeline::{ErrorReporter, TimingPipeline};
use crate::store::{DocumentKey, DocumentStore};
use crate::textgrid::{find_textgrids, load_phones, utterance_key};
use chrono::{DateTime, Utc};
use crossbeam_channel::unbounded;
use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Only process documents created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Reuse TextGrids already in the aligned directory.
    pub skip_align: bool,
    /// Stamp tracks into the document store.
    pub write_store: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            created_before: None,
            skip_align: false,
            write_store: true,
        }
    }
}

/// Outcome counters of a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub entries: usize,
    pub transcripts: usize,
    pub converted: usize,
    pub textgrids: usize,
    pub exported: usize,
    pub published: usize,
    /// Utterance keys skipped after an error, in processing order.
    pub skipped: Vec<String>,
}

/// Progress callbacks for the postprocessing phase.
pub trait Progress {
    fn start(&self, _total: u64) {}
    fn advance(&self) {}
    fn finish(&self) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Run the whole batch.
///
/// Failures of a single utterance are reported through `reporter` and
/// skipped; setup, store reads and the aligner run are fatal. The store is
/// left open for the caller to close.
pub fn run_batch<E, S>(
    config: &Config,
    executor: &E,
    store: &mut S,
    reporter: &dyn ErrorReporter,
    options: &BatchOptions,
    progress: &dyn Progress,
) -> Result<BatchReport>
where
    E: CommandExecutor,
    S: DocumentStore + ?Sized,
{
    let paths = &config.paths;
    let mut report = BatchReport::default();

    ensure_dirs(paths, config.aligner.clean && !options.skip_align)?;

    let entries = store.read_entries(options.created_before)?;
    report.entries = entries.len();
    tracing::info!(entries = entries.len(), "Loaded dataset entries");

    if !options.skip_align {
        report.transcripts = write_transcripts(&entries, &paths.work_dir)?;

        let converter = AudioConverter::new(executor, config.aligner.converter.as_str());
        for entry in &entries {
            match converter.convert_entry(entry, &paths.work_dir) {
                Ok(Some(_)) => report.converted += 1,
                Ok(None) => {}
                Err(e) => {
                    let key = entry.key().unwrap_or_default().to_string();
                    reporter.report(&key, &e);
                    report.skipped.push(key);
                }
            }
        }
        tracing::info!(
            transcripts = report.transcripts,
            converted = report.converted,
            "Prepared aligner corpus"
        );

        MfaAligner::new(executor, config).align(&paths.work_dir, &paths.align_dir())?;
    }

    let keys: HashSet<&str> = entries.iter().filter_map(|e| e.key()).collect();
    let grids: Vec<PathBuf> = find_textgrids(&paths.align_dir())?
        .into_iter()
        .filter(|path| keys.contains(utterance_key(path).as_str()))
        .collect();
    report.textgrids = grids.len();

    let pipeline = TimingPipeline::from_config(config);
    let results = postprocess_all(&pipeline, grids, config.batch.workers, progress);

    let exporter = JsonExporter::new(paths.json_out_dir());
    let publish = options.write_store && config.store.enabled;
    for (key, result) in results {
        let outcome = result.and_then(|track| {
            exporter.write(&key, &track)?;
            report.exported += 1;
            if publish {
                store.write_phonemes(&DocumentKey::VoiceKeyHash(key.clone()), &track)?;
                report.published += 1;
            }
            Ok(())
        });
        if let Err(e) = outcome {
            reporter.report(&key, &e);
            report.skipped.push(key);
        }
    }

    tracing::info!(
        exported = report.exported,
        published = report.published,
        skipped = report.skipped.len(),
        "Batch finished"
    );
    Ok(report)
}

/// Load and postprocess every TextGrid on `workers` threads. Results come
/// back in input order.
fn postprocess_all(
    pipeline: &TimingPipeline,
    grids: Vec<PathBuf>,
    workers: usize,
    progress: &dyn Progress,
) -> Vec<(String, Result<PhonemeTrack>)> {
    let total = grids.len();
    let workers = workers.clamp(1, total.max(1));
    progress.start(total as u64);

    let (job_tx, job_rx) = unbounded::<(usize, PathBuf)>();
    let (result_tx, result_rx) = unbounded();
    for job in grids.into_iter().enumerate() {
        if job_tx.send(job).is_err() {
            break;
        }
    }
    drop(job_tx);

    let mut results: Vec<(usize, String, Result<PhonemeTrack>)> = thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (index, path) in job_rx {
                    let key = utterance_key(&path);
                    let result = load_phones(&path, pipeline.phone_set())
                        .and_then(|segments| pipeline.process(segments));
                    if result_tx.send((index, key, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        result_rx
            .iter()
            .inspect(|_| progress.advance())
            .collect()
    });

    progress.finish();
    results.sort_by_key(|(index, _, _)| *index);
    results
        .into_iter()
        .map(|(_, key, result)| (key, result))
        .collect()
}
