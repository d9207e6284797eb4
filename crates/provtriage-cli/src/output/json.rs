//! JSON output formatter for triage reports
//!
//! One document per run, with a report or an error per graph file.

use provtriage_core::{Rating, TriageReport};
use serde::Serialize;

use super::FileTriage;

#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub graphs: Vec<JsonGraph<'a>>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub provtriage_version: &'static str,
    pub seed: u64,
    pub trials: usize,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_graphs: usize,
    pub failed: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Serialize)]
pub struct JsonGraph<'a> {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a TriageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

pub struct JsonFormatter {
    seed: u64,
    trials: usize,
}

impl JsonFormatter {
    pub fn new(seed: u64, trials: usize) -> Self {
        Self { seed, trials }
    }

    pub fn format(&self, results: &[FileTriage]) -> String {
        let output = self.build_output(results);
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn build_output<'a>(&self, results: &'a [FileTriage]) -> JsonOutput<'a> {
        JsonOutput {
            version: "1.0",
            metadata: JsonMetadata {
                provtriage_version: env!("CARGO_PKG_VERSION"),
                seed: self.seed,
                trials: self.trials,
            },
            summary: build_summary(results),
            graphs: results.iter().map(convert_result).collect(),
        }
    }
}

fn build_summary(results: &[FileTriage]) -> JsonSummary {
    let mut summary = JsonSummary {
        total_graphs: results.len(),
        failed: 0,
        high: 0,
        medium: 0,
        low: 0,
    };
    for result in results {
        match &result.outcome {
            Ok(report) => match report.result.rating {
                Rating::High => summary.high += 1,
                Rating::Medium => summary.medium += 1,
                Rating::Low => summary.low += 1,
            },
            Err(_) => summary.failed += 1,
        }
    }
    summary
}

fn convert_result(result: &FileTriage) -> JsonGraph<'_> {
    JsonGraph {
        file: result.path.to_string_lossy().to_string(),
        report: result.outcome.as_ref().ok(),
        error: result.outcome.as_ref().err().map(String::as_str),
    }
}
