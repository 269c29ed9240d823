//! Experiment configuration – reads/writes `chroma.toml`.
//!
//! ```toml
//! min_support = 1000
//! trials = 4
//!
//! [trial]
//! num_episodes = 1000
//! sequence = "walk"
//! seed = 8675309
//! target = "#808080"
//! algorithm = "neighbor-heuristic"
//! num_labels = 20
//! num_neighbors = 5
//! always_use_neighbors = false
//! changes = [[0, 2], [500, 20]]
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chroma_memory::{DEFAULT_MIN_SUPPORT, LabelIndex};
use chroma_types::{Algorithm, ChromaError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::trial::{TrialConfig, TrialError, TrialReport, run_batch};

/// Config file looked up when `CHROMA_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "chroma.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Persisted experiment description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Reference centroid file.  The bundled list is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroids_path: Option<PathBuf>,

    /// Centroids with less survey support than this are ignored.
    #[serde(default = "default_min_support")]
    pub min_support: u64,

    /// How many trials to run; trial *i* uses seed `trial.seed + i`.
    #[serde(default = "default_trials")]
    pub trials: usize,

    #[serde(default)]
    pub trial: TrialConfig,
}

fn default_min_support() -> u64 {
    DEFAULT_MIN_SUPPORT
}
fn default_trials() -> usize {
    1
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            centroids_path: None,
            min_support: default_min_support(),
            trials: default_trials(),
            trial: TrialConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load the centroid list this experiment refers to.
    pub fn label_index(&self) -> Result<LabelIndex, ChromaError> {
        match &self.centroids_path {
            Some(path) => LabelIndex::load(path, self.min_support),
            None => LabelIndex::bundled_with_min_support(self.min_support),
        }
    }

    /// One trial configuration per requested trial, with consecutive seeds.
    pub fn trial_configs(&self) -> Vec<TrialConfig> {
        (0..self.trials as u64)
            .map(|i| TrialConfig { seed: self.trial.seed.wrapping_add(i), ..self.trial.clone() })
            .collect()
    }

    /// Load the centroids and run every trial in parallel.
    pub fn run(&self) -> Result<Vec<Result<TrialReport, TrialError>>, ChromaError> {
        let labels = Arc::new(self.label_index()?);
        debug!(labels = labels.len(), trials = self.trials, "running experiment");
        Ok(run_batch(labels, &self.trial_configs()))
    }
}

/// `$CHROMA_CONFIG`, or `chroma.toml` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var_os("CHROMA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config from [`config_path`].  Returns `None` if the file does not
/// exist.
pub fn load() -> Result<Option<ExperimentConfig>, ConfigError> {
    load_from(&config_path())
}

/// Load the config from a specific path, then apply environment overrides.
pub fn load_from(path: &Path) -> Result<Option<ExperimentConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let mut cfg: ExperimentConfig = toml::from_str(&raw)?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `CHROMA_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `CHROMA_CENTROIDS` | `centroids_path` |
/// | `CHROMA_MIN_SUPPORT` | `min_support` |
/// | `CHROMA_SEED` | `trial.seed` |
/// | `CHROMA_ALGORITHM` | `trial.algorithm` |
///
/// Values that do not parse are ignored with a warning.
pub fn apply_env_overrides(cfg: &mut ExperimentConfig) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut ExperimentConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CHROMA_CENTROIDS") {
        cfg.centroids_path = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("CHROMA_MIN_SUPPORT") {
        match v.parse::<u64>() {
            Ok(min_support) => cfg.min_support = min_support,
            Err(e) => warn!(value = %v, error = %e, "ignoring CHROMA_MIN_SUPPORT"),
        }
    }
    if let Some(v) = lookup("CHROMA_SEED") {
        match v.parse::<u64>() {
            Ok(seed) => cfg.trial.seed = seed,
            Err(e) => warn!(value = %v, error = %e, "ignoring CHROMA_SEED"),
        }
    }
    if let Some(v) = lookup("CHROMA_ALGORITHM") {
        match v.parse::<Algorithm>() {
            Ok(algorithm) => cfg.trial.retrieval.algorithm = algorithm,
            Err(e) => warn!(error = %e, "ignoring CHROMA_ALGORITHM"),
        }
    }
}

/// Save the config to [`config_path`].
pub fn save(cfg: &ExperimentConfig) -> Result<(), ConfigError> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path, creating parent directories.
pub fn save_to(cfg: &ExperimentConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|source| ConfigError::Write { path: parent.to_path_buf(), source })?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
}
