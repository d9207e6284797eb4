//! Exploit command - reads a saved solver model and prints the exploit string

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use provtriage_core::solver_output::{SolverVerdict, extract_exploit};

#[derive(Args, Debug)]
pub struct ExploitArgs {
    /// Solver output saved after running the query from `provtriage smt`
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,
}

impl ExploitArgs {
    pub fn run(&self) -> Result<()> {
        let output = fs::read_to_string(&self.model)
            .with_context(|| format!("Failed to read solver output '{}'", self.model.display()))?;

        match interpret(&output) {
            Ok(exploit) => {
                println!("{exploit}");
                Ok(())
            }
            Err(verdict) => {
                eprintln!(
                    "{} solver answered {}, no exploit to extract",
                    "error:".red().bold(),
                    verdict_name(verdict)
                );
                process::exit(1);
            }
        }
    }
}

fn interpret(output: &str) -> Result<String, SolverVerdict> {
    match SolverVerdict::from_output(output) {
        SolverVerdict::Sat => extract_exploit(output).ok_or(SolverVerdict::Unrecognized),
        other => Err(other),
    }
}

fn verdict_name(verdict: SolverVerdict) -> &'static str {
    match verdict {
        SolverVerdict::Sat => "sat",
        SolverVerdict::Unsat => "unsat",
        SolverVerdict::Unknown => "unknown",
        SolverVerdict::Unrecognized => "with unrecognized output",
    }
}
