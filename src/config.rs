use crate::defaults;
use crate::error::{PhonetrackError, Result};
use crate::phoneme::PhoneSet;
use crate::pipeline::TimingParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub phones: PhonesConfig,
    pub paths: PathsConfig,
    pub aligner: AlignerConfig,
    pub store: StoreConfig,
    pub batch: BatchConfig,
}

/// Timing pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub min_phone_dur: f64,
    pub merge_threshold: f64,
    pub anticipation_shift: f64,
    /// Insert a release schwa after plosives followed by a pause.
    pub schwa: bool,
    pub round_decimals: u32,
}

/// Phone alphabet configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PhonesConfig {
    pub set: PhoneSet,
}

/// Dataset and scratch directories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub dataset_dir: PathBuf,
    pub work_dir: PathBuf,
}

/// External aligner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignerConfig {
    pub command: String,
    /// Overrides the phone set's default acoustic model.
    pub acoustic_model: Option<String>,
    /// Overrides the phone set's default dictionary.
    pub dictionary: Option<String>,
    pub extra_args: Vec<String>,
    /// Remove the work directory before preparing a run.
    pub clean: bool,
    pub converter: String,
}

/// Where utterance documents live
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// `alignment.json` in the dataset directory
    #[default]
    Manifest,
    /// A MongoDB collection (requires the `mongo` feature)
    Mongo,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Manifest => write!(f, "manifest"),
            StoreBackend::Mongo => write!(f, "mongo"),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Manifest path; defaults to `<dataset_dir>/alignment.json`.
    pub path: Option<PathBuf>,
    /// MongoDB connection string.
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Document field the phoneme track is written to.
    pub phonemes_field: String,
    /// Write tracks back to the store during batch runs.
    pub enabled: bool,
}

/// Batch driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub workers: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_phone_dur: defaults::MIN_PHONE_DUR,
            merge_threshold: defaults::MERGE_THRESHOLD,
            anticipation_shift: defaults::ANTICIPATION_SHIFT,
            schwa: true,
            round_decimals: defaults::ROUND_DECIMALS,
        }
    }
}

impl TimingConfig {
    pub fn params(&self) -> TimingParams {
        TimingParams {
            min_phone_dur: self.min_phone_dur,
            merge_threshold: self.merge_threshold,
            anticipation_shift: self.anticipation_shift,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from(defaults::DATASET_DIR),
            work_dir: PathBuf::from(defaults::WORK_DIR),
        }
    }
}

impl PathsConfig {
    /// Directory MFA writes TextGrids into.
    pub fn align_dir(&self) -> PathBuf {
        self.work_dir.join("aligned")
    }

    /// Directory per-utterance JSON tracks are written into.
    pub fn json_out_dir(&self) -> PathBuf {
        self.dataset_dir.join(defaults::JSON_OUT_DIR)
    }

    pub fn manifest(&self) -> PathBuf {
        self.dataset_dir.join(defaults::MANIFEST_FILE)
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            command: defaults::ALIGNER_COMMAND.to_string(),
            acoustic_model: None,
            dictionary: None,
            extra_args: Vec::new(),
            clean: true,
            converter: defaults::CONVERTER_COMMAND.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            uri: defaults::MONGO_URI.to_string(),
            database: defaults::MONGO_DATABASE.to_string(),
            collection: defaults::MONGO_COLLECTION.to_string(),
            phonemes_field: defaults::PHONEMES_FIELD.to_string(),
            enabled: true,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: defaults::worker_count(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values; the result is validated.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PhonetrackError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                PhonetrackError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PhonetrackError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PHONETRACK_PHONE_SET → phones.set
    /// - PHONETRACK_DATASET_DIR → paths.dataset_dir
    /// - PHONETRACK_STORE_PATH → store.path
    /// - PHONETRACK_ALIGNER → aligner.command
    /// - MONGO_URI → store.uri
    /// - MONGO_DATABASE → store.database
    /// - MONGO_COLLECTION → store.collection
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(set) = std::env::var("PHONETRACK_PHONE_SET")
            && !set.is_empty()
        {
            self.phones.set = set.parse()?;
        }

        if let Ok(dir) = std::env::var("PHONETRACK_DATASET_DIR")
            && !dir.is_empty()
        {
            self.paths.dataset_dir = PathBuf::from(dir);
        }

        if let Ok(path) = std::env::var("PHONETRACK_STORE_PATH")
            && !path.is_empty()
        {
            self.store.path = Some(PathBuf::from(path));
        }

        if let Ok(command) = std::env::var("PHONETRACK_ALIGNER")
            && !command.is_empty()
        {
            self.aligner.command = command;
        }

        if let Ok(uri) = std::env::var("MONGO_URI")
            && !uri.is_empty()
        {
            self.store.uri = uri;
        }

        if let Ok(database) = std::env::var("MONGO_DATABASE")
            && !database.is_empty()
        {
            self.store.database = database;
        }

        if let Ok(collection) = std::env::var("MONGO_COLLECTION")
            && !collection.is_empty()
        {
            self.store.collection = collection;
        }

        Ok(self)
    }

    /// Reject values the timing stages cannot work with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        check_duration("timing.min_phone_dur", t.min_phone_dur, false)?;
        check_duration("timing.merge_threshold", t.merge_threshold, true)?;
        check_duration("timing.anticipation_shift", t.anticipation_shift, true)?;

        if t.merge_threshold > t.min_phone_dur {
            return Err(PhonetrackError::ConfigInvalidValue {
                key: "timing.merge_threshold".to_string(),
                message: format!(
                    "must not exceed timing.min_phone_dur ({})",
                    t.min_phone_dur
                ),
            });
        }

        if t.round_decimals > 9 {
            return Err(PhonetrackError::ConfigInvalidValue {
                key: "timing.round_decimals".to_string(),
                message: "must be at most 9".to_string(),
            });
        }

        if self.store.backend == StoreBackend::Mongo {
            for (key, value) in [
                ("store.uri", &self.store.uri),
                ("store.database", &self.store.database),
                ("store.collection", &self.store.collection),
            ] {
                if value.trim().is_empty() {
                    return Err(PhonetrackError::ConfigInvalidValue {
                        key: key.to_string(),
                        message: "must not be empty for the mongo backend".to_string(),
                    });
                }
            }
        }

        if self.batch.workers == 0 {
            return Err(PhonetrackError::ConfigInvalidValue {
                key: "batch.workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Switch to the MongoDB backend at `uri`.
    pub fn use_mongo(&mut self, uri: impl Into<String>) {
        self.store.backend = StoreBackend::Mongo;
        self.store.uri = uri.into();
    }

    /// Manifest the document store reads and writes.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| self.paths.manifest())
    }

    pub fn acoustic_model(&self) -> String {
        self.aligner
            .acoustic_model
            .clone()
            .unwrap_or_else(|| self.phones.set.acoustic_model().to_string())
    }

    pub fn dictionary(&self) -> String {
        self.aligner
            .dictionary
            .clone()
            .unwrap_or_else(|| self.phones.set.dictionary().to_string())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/phonetrack/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("phonetrack").join("config.toml"))
            .ok_or_else(|| PhonetrackError::Other("Could not determine config directory".into()))
    }

    /// Commented TOML template with every key at its default.
    pub fn dump_template() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())
            .map_err(|e| PhonetrackError::Other(format!("Failed to render config: {}", e)))?;
        Ok(format!(
            "# phonetrack configuration\n\
             # Times are in seconds. phones.set is \"arpabet\" or \"ipa\".\n\
             # store.backend is \"manifest\" or \"mongo\" (needs the mongo feature).\n\n{}",
            body
        ))
    }
}

fn check_duration(key: &str, value: f64, allow_zero: bool) -> Result<()> {
    let ok = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
    if ok {
        Ok(())
    } else {
        Err(PhonetrackError::ConfigInvalidValue {
            key: key.to_string(),
            message: format!(
                "must be a finite {} number of seconds, got {}",
                if allow_zero { "non-negative" } else { "positive" },
                value
            ),
        })
    }
}
