//! Interpretation of solver output for a synthesized query
//!
//! The solver itself runs elsewhere; this reads back what it printed.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static QUOTED_MODEL_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(.+)""#).expect("Invalid regex pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverVerdict {
    Sat,
    Unsat,
    Unknown,
    Unrecognized,
}

impl SolverVerdict {
    /// `unsat` contains `sat`, so the negative answers are checked first.
    pub fn from_output(output: &str) -> Self {
        if output.contains("unsat") {
            SolverVerdict::Unsat
        } else if output.contains("unknown") {
            SolverVerdict::Unknown
        } else if output.contains("sat") {
            SolverVerdict::Sat
        } else {
            SolverVerdict::Unrecognized
        }
    }
}

/// Pulls the first quoted model value out of solver output and re-quotes it.
///
/// The first `\x00` escape is turned into a space so the exploit can be pasted
/// into a shell or script.
pub fn extract_exploit(model: &str) -> Option<String> {
    let captures = QUOTED_MODEL_VALUE.captures(model)?;
    let value = captures.get(1)?.as_str().replacen(r"\x00", " ", 1);
    Some(format!("\"{value}\""))
}
