//! provtriage CLI - Command-line interface for provenance graph triage
//!
//! Builds operation trees and solver queries from taint provenance graphs and
//! estimates how exploitable each flow is.

mod cli;
mod commands;
mod logging;
mod output;

use clap::Parser;
use cli::Cli;
use commands::Commands;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli);

    match cli.command {
        Commands::Optree(args) => args.run(),
        Commands::Smt(args) => args.run(),
        Commands::Sink(args) => args.run(),
        Commands::Triage(args) => args.run(),
        Commands::Exploit(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn cli_parses_optree_command() {
        let cli = Cli::try_parse_from(["provtriage", "optree", "graph.json"]).unwrap();
        match cli.command {
            Commands::Optree(args) => {
                assert_eq!(args.graph, PathBuf::from("graph.json"));
            }
            _ => panic!("Expected Optree command"),
        }
    }

    #[test]
    fn cli_parses_smt_with_output() {
        let cli = Cli::try_parse_from([
            "provtriage",
            "smt",
            "graph.json",
            "--output",
            "query.smt2",
        ])
        .unwrap();
        match cli.command {
            Commands::Smt(args) => {
                assert_eq!(args.output, Some(PathBuf::from("query.smt2")));
            }
            _ => panic!("Expected Smt command"),
        }
    }

    #[test]
    fn cli_parses_triage_with_overrides() {
        let cli = Cli::try_parse_from([
            "provtriage",
            "triage",
            "graphs/",
            "more.json",
            "--seed",
            "7",
            "--trials",
            "50",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Triage(args) => {
                assert_eq!(args.paths.len(), 2);
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.trials, Some(50));
                assert_eq!(args.format, "json");
            }
            _ => panic!("Expected Triage command"),
        }
    }

    #[test]
    fn cli_triage_requires_a_path() {
        assert!(Cli::try_parse_from(["provtriage", "triage"]).is_err());
    }

    #[test]
    fn cli_parses_sink_command() {
        let cli = Cli::try_parse_from(["provtriage", "sink", "graph.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Sink(_)));
    }

    #[test]
    fn cli_parses_exploit_command() {
        let cli = Cli::try_parse_from(["provtriage", "exploit", "model.txt"]).unwrap();
        match cli.command {
            Commands::Exploit(args) => {
                assert_eq!(args.model, PathBuf::from("model.txt"));
            }
            _ => panic!("Expected Exploit command"),
        }
    }

    #[test]
    fn cli_version_is_set() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn cli_help_contains_commands() {
        let mut cmd = Cli::command();
        let help = cmd.render_help().to_string();
        for command in ["optree", "smt", "sink", "triage", "exploit"] {
            assert!(help.contains(command), "missing {command}");
        }
    }

    #[test]
    fn triage_help_shows_options() {
        let mut cmd = Cli::command();
        let triage_cmd = cmd
            .get_subcommands_mut()
            .find(|c| c.get_name() == "triage")
            .unwrap();
        let help = triage_cmd.render_help().to_string();
        assert!(help.contains("PATH"));
        assert!(help.contains("--seed"));
        assert!(help.contains("--config"));
        assert!(help.contains("--format"));
    }
}
