//! Configuration loading and parsing for provtriage
//!
//! Provides functionality to load and parse `provtriage.toml` configuration files.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::automaton::DEFAULT_MAX_HOPS;
use crate::estimator::{DEFAULT_AVERAGE_DEPTH, DEFAULT_MU, DEFAULT_TRIALS, EstimatorConfig};

pub const CONFIG_FILENAME: &str = "provtriage.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["estimator", "automaton"];
const KNOWN_ESTIMATOR_KEYS: &[&str] = &["mu", "average_depth", "epsilon", "trials", "seed"];
const KNOWN_AUTOMATON_KEYS: &[&str] = &["max_hops"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub estimator: EstimatorSettings,
    pub automaton: AutomatonSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Average count of attacker-controllable leaves.
    pub mu: u32,
    /// Average provenance graph depth, used to derive epsilon.
    pub average_depth: f64,
    /// Overrides the derived per-hop leakage probability.
    pub epsilon: Option<f64>,
    pub trials: usize,
    pub seed: u64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            average_depth: DEFAULT_AVERAGE_DEPTH,
            epsilon: None,
            trials: DEFAULT_TRIALS,
            seed: 0,
        }
    }
}

impl EstimatorSettings {
    pub fn estimator_config(&self) -> EstimatorConfig {
        let mut config = EstimatorConfig::from_population(self.mu, self.average_depth, self.trials);
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        config
    }
}

impl Config {
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            max_hops: self.automaton.max_hops,
            ..self.estimator.estimator_config()
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutomatonSettings {
    pub max_hops: usize,
}

impl Default for AutomatonSettings {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Ok(load_config_with_warnings(path)?.config)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in [
        ("estimator", KNOWN_ESTIMATOR_KEYS),
        ("automaton", KNOWN_AUTOMATON_KEYS),
    ] {
        if let Some(toml::Value::Table(entries)) = table.get(section) {
            for key in entries.keys() {
                if !known.contains(&key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    warnings
}

/// Loads the nearest config file above `start_dir`, or defaults when there is none.
///
/// A config file that exists but cannot be read or parsed is an error.
pub fn load_config_or_default_with_warnings(
    start_dir: &Path,
) -> Result<ConfigResult, ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path),
        None => Ok(ConfigResult::default()),
    }
}
