//! Work directory preparation: aligner corpus (WAV + LAB pairs).

use crate::aligner::CommandExecutor;
use crate::config::PathsConfig;
use crate::dataset::entry::AlignmentEntry;
use crate::defaults::ALIGNER_SAMPLE_RATE;
use crate::error::{PhonetrackError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::{Path, PathBuf};

/// Create the work, aligned and JSON output directories; with `clean`,
/// remove the work directory first.
pub fn ensure_dirs(paths: &PathsConfig, clean: bool) -> Result<()> {
    if clean && paths.work_dir.exists() {
        tracing::debug!(dir = %paths.work_dir.display(), "Cleaning work directory");
        fs::remove_dir_all(&paths.work_dir)?;
    }

    for dir in [&paths.work_dir, &paths.align_dir(), &paths.json_out_dir()] {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Write `<key>.lab` transcripts for every entry that has a key and
/// characters. Returns the number written.
pub fn write_transcripts(entries: &[AlignmentEntry], lab_dir: &Path) -> Result<usize> {
    let mut written = 0;
    for entry in entries {
        let (Some(key), Some(text)) = (entry.key(), entry.transcript()) else {
            continue;
        };

        fs::write(lab_dir.join(format!("{}.lab", key)), text)?;
        tracing::debug!(utterance = key, "Wrote transcript");
        written += 1;
    }
    Ok(written)
}

/// Converts base64 MP3 payloads into the 16 kHz mono WAV files the aligner
/// expects, through an external converter (ffmpeg).
pub struct AudioConverter<E: CommandExecutor> {
    executor: E,
    command: String,
}

impl<E: CommandExecutor> AudioConverter<E> {
    pub fn new(executor: E, command: impl Into<String>) -> Self {
        Self {
            executor,
            command: command.into(),
        }
    }

    /// Convert one entry into `<wav_dir>/<key>.wav`.
    ///
    /// Returns `Ok(None)` when the entry has no key or no audio, or when the
    /// WAV already exists.
    pub fn convert_entry(&self, entry: &AlignmentEntry, wav_dir: &Path) -> Result<Option<PathBuf>> {
        let (Some(key), Some(audio)) = (entry.key(), entry.audio_base64.as_deref()) else {
            return Ok(None);
        };

        let wav_path = wav_dir.join(format!("{}.wav", key));
        if wav_path.exists() {
            return Ok(None);
        }

        let bytes = STANDARD
            .decode(audio.trim())
            .map_err(|e| PhonetrackError::Audio {
                utterance: key.to_string(),
                message: format!("invalid base64 audio: {}", e),
            })?;

        let mp3_path = wav_dir.join(format!("{}.mp3", key));
        fs::write(&mp3_path, &bytes)?;

        let result = self.run_converter(&mp3_path, &wav_path);
        if let Err(e) = fs::remove_file(&mp3_path) {
            tracing::debug!(path = %mp3_path.display(), error = %e, "Could not remove temporary MP3");
        }
        result.map_err(|e| PhonetrackError::Audio {
            utterance: key.to_string(),
            message: e.to_string(),
        })?;

        verify_wav(&wav_path).map_err(|message| PhonetrackError::Audio {
            utterance: key.to_string(),
            message,
        })?;

        tracing::debug!(utterance = key, "Converted audio");
        Ok(Some(wav_path))
    }

    fn run_converter(&self, input: &Path, output: &Path) -> Result<String> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        let rate = ALIGNER_SAMPLE_RATE.to_string();
        self.executor.execute(
            &self.command,
            &[
                "-y", "-loglevel", "error", "-i", &input, "-ac", "1", "-ar", &rate, &output,
            ],
        )
    }
}

/// Check that `path` is a mono WAV at the aligner sample rate.
pub fn verify_wav(path: &Path) -> std::result::Result<(), String> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| format!("unreadable WAV {}: {}", path.display(), e))?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != ALIGNER_SAMPLE_RATE {
        return Err(format!(
            "expected {} Hz mono, got {} Hz with {} channels",
            ALIGNER_SAMPLE_RATE, spec.sample_rate, spec.channels
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::MockCommandExecutor;
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(value: serde_json::Value) -> AlignmentEntry {
        serde_json::from_value(value).unwrap()
    }

    fn write_test_wav(path: &Path, sample_rate: u32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..160 * channels as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    /// Executor that plays ffmpeg by writing a WAV to the last argument.
    struct FakeFfmpeg {
        sample_rate: u32,
    }

    impl CommandExecutor for FakeFfmpeg {
        fn execute(&self, _command: &str, args: &[&str]) -> Result<String> {
            let output = Path::new(args[args.len() - 1]);
            write_test_wav(output, self.sample_rate, 1);
            Ok(String::new())
        }
    }

    #[test]
    fn ensure_dirs_creates_and_cleans() {
        let dir = TempDir::new().unwrap();
        let paths = PathsConfig {
            dataset_dir: dir.path().join("dataset"),
            work_dir: dir.path().join("work"),
        };
        fs::create_dir_all(&paths.work_dir).unwrap();
        fs::write(paths.work_dir.join("stale.wav"), b"x").unwrap();

        ensure_dirs(&paths, true).unwrap();

        assert!(paths.align_dir().is_dir());
        assert!(paths.json_out_dir().is_dir());
        assert!(!paths.work_dir.join("stale.wav").exists());
    }

    #[test]
    fn ensure_dirs_without_clean_keeps_files() {
        let dir = TempDir::new().unwrap();
        let paths = PathsConfig {
            dataset_dir: dir.path().join("dataset"),
            work_dir: dir.path().join("work"),
        };
        fs::create_dir_all(&paths.work_dir).unwrap();
        fs::write(paths.work_dir.join("keep.wav"), b"x").unwrap();

        ensure_dirs(&paths, false).unwrap();
        assert!(paths.work_dir.join("keep.wav").exists());
    }

    #[test]
    fn write_transcripts_joins_characters() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            entry(json!({
                "voiceKeyHash": "abc",
                "normalisedAlignment": {"characters": [" ", "h", "i", " "]}
            })),
            entry(json!({"voiceKeyHash": "nochars"})),
            entry(json!({"normalisedAlignment": {"characters": ["x"]}})),
        ];

        let written = write_transcripts(&entries, dir.path()).unwrap();

        assert_eq!(written, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("abc.lab")).unwrap(),
            "hi"
        );
        assert!(!dir.path().join("nochars.lab").exists());
    }

    #[test]
    fn convert_entry_runs_converter_and_verifies() {
        let dir = TempDir::new().unwrap();
        let converter = AudioConverter::new(FakeFfmpeg { sample_rate: 16000 }, "ffmpeg");
        let e = entry(json!({"voiceKeyHash": "abc", "audioBase64": STANDARD.encode(b"ID3")}));

        let wav = converter.convert_entry(&e, dir.path()).unwrap().unwrap();

        assert!(wav.ends_with("abc.wav"));
        assert!(wav.exists());
        assert!(!dir.path().join("abc.mp3").exists());
    }

    #[test]
    fn convert_entry_passes_resample_arguments() {
        let dir = TempDir::new().unwrap();
        let mock = MockCommandExecutor::new();
        let converter = AudioConverter::new(&mock, "ffmpeg");
        let e = entry(json!({"voiceKeyHash": "abc", "audioBase64": STANDARD.encode(b"ID3")}));

        // Mock writes nothing, so verification fails after the call
        assert!(converter.convert_entry(&e, dir.path()).is_err());

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "ffmpeg");
        let args = &calls[0].1;
        assert!(args.windows(2).any(|w| w == ["-ac", "1"]));
        assert!(args.windows(2).any(|w| w == ["-ar", "16000"]));
    }

    #[test]
    fn convert_entry_skips_existing_and_incomplete_entries() {
        let dir = TempDir::new().unwrap();
        let mock = MockCommandExecutor::new();
        let converter = AudioConverter::new(&mock, "ffmpeg");

        fs::write(dir.path().join("done.wav"), b"x").unwrap();
        let existing = entry(json!({"voiceKeyHash": "done", "audioBase64": "AAAA"}));
        let no_audio = entry(json!({"voiceKeyHash": "silent"}));

        assert_eq!(converter.convert_entry(&existing, dir.path()).unwrap(), None);
        assert_eq!(converter.convert_entry(&no_audio, dir.path()).unwrap(), None);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn convert_entry_rejects_bad_base64() {
        let dir = TempDir::new().unwrap();
        let converter = AudioConverter::new(MockCommandExecutor::new(), "ffmpeg");
        let e = entry(json!({"voiceKeyHash": "abc", "audioBase64": "!!not base64!!"}));

        match converter.convert_entry(&e, dir.path()) {
            Err(PhonetrackError::Audio { utterance, .. }) => assert_eq!(utterance, "abc"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn convert_entry_rejects_wrong_sample_rate() {
        let dir = TempDir::new().unwrap();
        let converter = AudioConverter::new(FakeFfmpeg { sample_rate: 44100 }, "ffmpeg");
        let e = entry(json!({"voiceKeyHash": "abc", "audioBase64": STANDARD.encode(b"ID3")}));

        let err = converter.convert_entry(&e, dir.path()).unwrap_err();
        assert!(err.to_string().contains("16000 Hz mono"), "got: {}", err);
    }

    #[test]
    fn verify_wav_accepts_aligner_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ok.wav");
        write_test_wav(&path, 16000, 1);
        assert!(verify_wav(&path).is_ok());

        let stereo = dir.path().join("stereo.wav");
        write_test_wav(&stereo, 16000, 2);
        assert!(verify_wav(&stereo).is_err());
    }
}
