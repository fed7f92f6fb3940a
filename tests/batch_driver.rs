//! Batch run against a temporary dataset with stand-in external tools.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use phonetrack::aligner::CommandExecutor;
use phonetrack::batch::{BatchOptions, NoProgress, run_batch};
use phonetrack::pipeline::LogReporter;
use phonetrack::{Config, DocumentKey, DocumentStore, JsonManifestStore, PhonetrackError};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use textgrid::{Interval, TextGrid, Tier, TierType};

/// Plays ffmpeg (writes a 16 kHz mono WAV) and mfa (writes one TextGrid per
/// WAV/LAB pair, one 80 ms phone per transcript character).
#[derive(Default)]
struct FakeTools {
    commands: Mutex<Vec<String>>,
}

impl FakeTools {
    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandExecutor for FakeTools {
    fn execute(&self, command: &str, args: &[&str]) -> phonetrack::Result<String> {
        self.commands.lock().unwrap().push(command.to_string());
        match command {
            "ffmpeg" => {
                write_wav(Path::new(args[args.len() - 1]));
                Ok(String::new())
            }
            "mfa" => {
                align(Path::new(args[1]), Path::new(args[4]));
                Ok(String::new())
            }
            other => Err(PhonetrackError::ToolNotFound {
                tool: other.to_string(),
            }),
        }
    }
}

fn write_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..1600 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn align(corpus: &Path, out: &Path) {
    fs::create_dir_all(out).unwrap();
    for entry in fs::read_dir(corpus).unwrap() {
        let lab = entry.unwrap().path();
        if lab.extension().is_none_or(|e| e != "lab") || !lab.with_extension("wav").exists() {
            continue;
        }
        let text = fs::read_to_string(&lab).unwrap();
        let intervals: Vec<Interval> = text
            .chars()
            .filter(|c| c.is_alphabetic())
            .enumerate()
            .map(|(i, c)| Interval {
                xmin: i as f64 * 0.08,
                xmax: (i + 1) as f64 * 0.08,
                text: c.to_string(),
            })
            .collect();
        let xmax = intervals.len() as f64 * 0.08;

        let mut grid = TextGrid::new(0.0, xmax).unwrap();
        grid.add_tier(Tier {
            name: "phones".to_string(),
            tier_type: TierType::IntervalTier,
            xmin: 0.0,
            xmax,
            intervals,
            points: Vec::new(),
        })
        .unwrap();
        let stem = lab.file_stem().unwrap().to_string_lossy().into_owned();
        grid.to_file(&out.join(format!("{}.TextGrid", stem)), false)
            .unwrap();
    }
}

fn dataset(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.paths.dataset_dir = dir.path().join("dataset");
    config.paths.work_dir = dir.path().join("work");
    config.batch.workers = 3;
    fs::create_dir_all(&config.paths.dataset_dir).unwrap();

    let audio = STANDARD.encode(b"ID3 fake mp3");
    let chars = |s: &str| s.chars().map(String::from).collect::<Vec<_>>();
    let docs = json!([
        {
            "_id": {"$oid": "0001"},
            "voiceKeyHash": "cat",
            "audioBase64": audio,
            "normalisedAlignment": {"characters": chars(" kat ")},
            "voiceId": "narrator"
        },
        {
            "_id": {"$oid": "0002"},
            "voiceKeyHash": "dog",
            "audioBase64": audio,
            "normalisedAlignment": {"characters": chars("dog")}
        },
        {
            "voiceKeyHash": "silent",
            "normalisedAlignment": {"characters": chars("hm")}
        },
        {
            "voiceKeyHash": "broken",
            "audioBase64": "%%%",
            "normalisedAlignment": {"characters": chars("oops")}
        }
    ]);
    fs::write(config.paths.manifest(), docs.to_string()).unwrap();
    config
}

#[test]
fn full_run_exports_and_publishes() {
    let dir = TempDir::new().unwrap();
    let config = dataset(&dir);
    let tools = FakeTools::default();
    let mut store =
        JsonManifestStore::open(config.store_path(), &config.store.phonemes_field).unwrap();

    let report = run_batch(
        &config,
        &tools,
        &mut store,
        &LogReporter,
        &BatchOptions::default(),
        &NoProgress,
    )
    .unwrap();
    store.close().unwrap();

    assert_eq!(report.entries, 4);
    assert_eq!(report.transcripts, 4);
    assert_eq!(report.converted, 2);
    assert_eq!(report.textgrids, 2);
    assert_eq!(report.exported, 2);
    assert_eq!(report.published, 2);
    assert_eq!(report.skipped, vec!["broken".to_string()]);
    assert_eq!(tools.commands(), ["ffmpeg", "ffmpeg", "mfa"]);

    // K A T: the final T gets a release schwa, then everything shifts
    let exported: Value = serde_json::from_str(
        &fs::read_to_string(config.paths.json_out_dir().join("cat.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(
        exported,
        json!([
            {"cmu": "K", "start": 0.0, "end": 0.08},
            {"cmu": "A", "start": 0.065, "end": 0.16},
            {"cmu": "T", "start": 0.145, "end": 0.24},
            {"cmu": "EH", "start": 0.225, "end": 0.275}
        ])
    );

    let saved: Value =
        serde_json::from_str(&fs::read_to_string(config.paths.manifest()).unwrap()).unwrap();
    assert_eq!(saved[0]["phonemeAlignment"]["alignment"], exported);
    assert_eq!(saved[0]["voiceId"], "narrator");
    assert!(saved[1]["phonemeAlignment"]["created"].is_string());
    assert!(saved[2].get("phonemeAlignment").is_none());
    assert!(saved[3].get("phonemeAlignment").is_none());
}

#[test]
fn rerun_skips_existing_audio() {
    let dir = TempDir::new().unwrap();
    let mut config = dataset(&dir);
    config.aligner.clean = false;
    let tools = FakeTools::default();

    for _ in 0..2 {
        let mut store =
            JsonManifestStore::open(config.store_path(), &config.store.phonemes_field).unwrap();
        run_batch(
            &config,
            &tools,
            &mut store,
            &LogReporter,
            &BatchOptions::default(),
            &NoProgress,
        )
        .unwrap();
        store.close().unwrap();
    }

    assert_eq!(tools.commands(), ["ffmpeg", "ffmpeg", "mfa", "mfa"]);
}

#[test]
fn published_track_can_be_found_again() {
    let dir = TempDir::new().unwrap();
    let config = dataset(&dir);
    let mut store =
        JsonManifestStore::open(config.store_path(), &config.store.phonemes_field).unwrap();
    let options = BatchOptions {
        write_store: false,
        ..BatchOptions::default()
    };
    run_batch(&config, &FakeTools::default(), &mut store, &LogReporter, &options, &NoProgress)
        .unwrap();

    let track = phonetrack::JsonExporter::load(
        &config.paths.json_out_dir().join("dog.json"),
        config.phones.set,
    )
    .unwrap();
    let key = DocumentKey::DocumentId("0002".into());
    store.write_phonemes(&key, &track).unwrap();
    store.close().unwrap();

    let reopened =
        JsonManifestStore::open(config.store_path(), &config.store.phonemes_field).unwrap();
    let entry = reopened.find(&key).unwrap();
    assert_eq!(entry.key(), Some("dog"));
    assert_eq!(
        entry.extra["phonemeAlignment"]["alignment"],
        track.to_json_value().unwrap()
    );
}
