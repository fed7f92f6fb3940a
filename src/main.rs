use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use phonetrack::aligner::SystemCommandExecutor;
use phonetrack::batch::{BatchOptions, BatchReport, Progress, run_batch};
use phonetrack::cli::{Cli, Commands, ConfigAction, PublishArgs};
use phonetrack::config::Config;
use phonetrack::diagnostics::{check_tools, print_checks};
use phonetrack::export::JsonExporter;
use phonetrack::pipeline::{LogReporter, TimingPipeline};
use phonetrack::store::{self, DocumentStore};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    phonetrack::logging::init(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Run {
            created_before,
            skip_align,
            no_store,
            no_progress,
            use_mongo,
        } => {
            let mut config = load_config(&cli)?;
            if let Some(uri) = use_mongo {
                config.use_mongo(uri.as_str());
                config.validate()?;
            }
            let options = BatchOptions {
                created_before: *created_before,
                skip_align: *skip_align,
                write_store: !*no_store,
            };
            let show_progress = !cli.quiet && !*no_progress;
            let report = handle_run(&config, &options, show_progress)?;
            if !cli.quiet {
                print_report(&report);
            }
        }
        Commands::Postprocess { textgrid, output } => {
            let config = load_config(&cli)?;
            handle_postprocess(&config, textgrid, output.as_deref())?;
        }
        Commands::Publish(args) => {
            let mut config = load_config(&cli)?;
            if let Some(uri) = &args.use_mongo {
                config.use_mongo(uri.as_str());
                config.validate()?;
            }
            handle_publish(&config, args, cli.quiet)?;
        }
        Commands::Check => {
            let config = load_config(&cli)?;
            if !print_checks(&check_tools(&config, &SystemCommandExecutor::new())) {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, &cli)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "phonetrack",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// File (or defaults), then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };

    let mut config = config.with_env_overrides()?;
    if let Some(set) = cli.phone_set_override() {
        config.phones.set = set;
    }
    if let Some(schwa) = cli.schwa_override() {
        config.timing.schwa = schwa;
    }
    config.validate()?;
    Ok(config)
}

/// Progress bar over postprocessed utterances.
struct BarProgress(ProgressBar);

impl BarProgress {
    fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            // SAFETY: hardcoded template string, always valid
            #[allow(clippy::expect_used)]
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} utterances ({eta})")
                .expect("hardcoded progress bar template")
                .progress_chars("#>-"),
        );
        Self(pb)
    }
}

impl Progress for BarProgress {
    fn start(&self, total: u64) {
        self.0.set_length(total);
    }
    fn advance(&self) {
        self.0.inc(1);
    }
    fn finish(&self) {
        self.0.finish_and_clear();
    }
}

fn handle_run(config: &Config, options: &BatchOptions, show_progress: bool) -> Result<BatchReport> {
    let mut store = store::open(config)
        .with_context(|| format!("Failed to open the {} store", config.store.backend))?;
    let executor = SystemCommandExecutor::new();

    let result = if show_progress {
        run_batch(
            config,
            &executor,
            store.as_mut(),
            &LogReporter,
            options,
            &BarProgress::new(),
        )
    } else {
        run_batch(
            config,
            &executor,
            store.as_mut(),
            &LogReporter,
            options,
            &phonetrack::batch::NoProgress,
        )
    };

    // Close even after a failed run so completed writes are kept
    let closed = store.close();
    let report = result?;
    closed?;
    Ok(report)
}

fn print_report(report: &BatchReport) {
    eprintln!(
        "{} {} entries, {} TextGrids, {} exported, {} published",
        "Done:".green().bold(),
        report.entries,
        report.textgrids,
        report.exported,
        report.published
    );
    if !report.skipped.is_empty() {
        eprintln!(
            "{} {} skipped: {}",
            "Warning:".yellow().bold(),
            report.skipped.len(),
            report.skipped.join(", ")
        );
    }
}

fn handle_postprocess(config: &Config, textgrid: &Path, output: Option<&Path>) -> Result<()> {
    let pipeline = TimingPipeline::from_config(config);
    let segments = phonetrack::textgrid::load_phones(textgrid, pipeline.phone_set())?;
    let track = pipeline.process(segments)?;
    let json = track.to_json_pretty()?;

    match output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn handle_publish(config: &Config, args: &PublishArgs, quiet: bool) -> Result<()> {
    let key = args
        .key()
        .context("publish needs --voice-key-hash or --document-id")?;
    let track = JsonExporter::load(&args.json, config.phones.set)
        .with_context(|| format!("Failed to load {}", args.json.display()))?;

    let mut store = store::open(config)
        .with_context(|| format!("Failed to open the {} store", config.store.backend))?;
    let written = store.write_phonemes(&key, &track);
    store.close()?;
    written?;

    if !quiet {
        eprintln!(
            "{} {} records into {}",
            "Published".green().bold(),
            track.len(),
            key
        );
    }
    Ok(())
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::default_path()?,
            };
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config(cli)?;
            println!(
                "{}",
                toml::to_string_pretty(&config).context("Failed to render configuration")?
            );
        }
        ConfigAction::Dump => {
            print!("{}", Config::dump_template()?);
        }
    }
    Ok(())
}
