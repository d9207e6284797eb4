//! Output formatters for triage results

pub mod json;
pub mod pretty;

use std::path::PathBuf;

use provtriage_core::TriageReport;

/// Triage result for one graph file; failures carry the rendered error chain.
#[derive(Debug)]
pub struct FileTriage {
    pub path: PathBuf,
    pub outcome: Result<TriageReport, String>,
}

impl FileTriage {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}
