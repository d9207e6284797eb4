//! Triage command - estimates exploitability of provenance graph files

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use provtriage_core::config::{
    ConfigResult, load_config_or_default_with_warnings, load_config_with_warnings,
};
use provtriage_core::{EstimatorConfig, TriageReport, triage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use super::load_graph;
use crate::output::FileTriage;
use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;

const GRAPH_EXTENSION: &str = "json";

#[derive(Args, Debug)]
pub struct TriageArgs {
    /// Provenance graph files or directories containing them
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Configuration file (defaults to the nearest provtriage.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed for the Monte Carlo simulation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of simulated attacker runs per graph
    #[arg(long)]
    pub trials: Option<usize>,

    /// Output format (pretty, json)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Estimator parameters after applying command-line overrides to the config file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriageSettings {
    pub estimator: EstimatorConfig,
    pub seed: u64,
}

impl TriageArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let settings = self.settings()?;
        let files = discover_graphs(&self.paths)?;
        if files.is_empty() {
            println!("No provenance graph files found.");
            return Ok(());
        }

        let results = triage_files(&files, settings);
        match self.format.as_str() {
            "json" => println!(
                "{}",
                JsonFormatter::new(settings.seed, settings.estimator.trials).format(&results)
            ),
            "pretty" => print!("{}", PrettyFormatter::format(&results)),
            other => anyhow::bail!("Invalid format '{}'. Valid values: pretty, json", other),
        }

        if results.iter().any(FileTriage::is_failure) {
            process::exit(1);
        }
        Ok(())
    }

    fn settings(&self) -> Result<TriageSettings> {
        let cwd = env::current_dir()?;
        self.settings_from(&cwd)
    }

    /// Resolves settings, searching for a config file from `start_dir` when none is given.
    fn settings_from(&self, start_dir: &Path) -> Result<TriageSettings> {
        let config_result = self.load_config(start_dir)?;
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let config = config_result.config;

        let mut estimator = config.estimator_config();
        if let Some(trials) = self.trials {
            estimator.trials = trials;
        }
        let seed = self.seed.unwrap_or(config.estimator.seed);
        debug!(?estimator, seed, "triage settings");

        Ok(TriageSettings { estimator, seed })
    }

    fn load_config(&self, start_dir: &Path) -> Result<ConfigResult> {
        let result = match &self.config {
            Some(path) => load_config_with_warnings(path)?,
            None => load_config_or_default_with_warnings(start_dir)?,
        };
        Ok(result)
    }

    fn configure_colors(&self) {
        let no_color_env = env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }
}

/// Each file gets its own generator seeded with `seed`, so results do not
/// depend on how rayon schedules the files.
fn triage_files(files: &[PathBuf], settings: TriageSettings) -> Vec<FileTriage> {
    files
        .par_iter()
        .map(|path| FileTriage {
            path: path.clone(),
            outcome: triage_file(path, settings).map_err(|e| format!("{e:#}")),
        })
        .collect()
}

fn triage_file(path: &Path, settings: TriageSettings) -> Result<TriageReport> {
    let graph = load_graph(path)?;
    let rng = StdRng::seed_from_u64(settings.seed);
    triage(&graph, settings.estimator, rng)
        .with_context(|| format!("Failed to triage '{}'", path.display()))
}

fn discover_graphs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }

        if path.is_file() {
            files.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| is_graph_file(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn is_graph_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == GRAPH_EXTENSION)
        .unwrap_or(false)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
