//! Colored terminal summary of triage results

use colored::{ColoredString, Colorize};
use provtriage_core::{Rating, TriageReport};

use super::FileTriage;

pub struct PrettyFormatter;

impl PrettyFormatter {
    pub fn format(results: &[FileTriage]) -> String {
        let mut out = String::new();

        for result in results {
            let file = result.path.to_string_lossy();
            match &result.outcome {
                Ok(report) => {
                    out.push_str(&format!("{} {}\n", rating_badge(report.result.rating), file.bold()));
                    out.push_str(&format_details(report));
                }
                Err(message) => {
                    out.push_str(&format!("{} {}\n", "FAILED".red().bold(), file.bold()));
                    out.push_str(&format!("  {}\n", message.red()));
                }
            }
        }

        let failed = results.iter().filter(|r| r.is_failure()).count();
        let triaged = results.len() - failed;
        out.push('\n');
        if failed > 0 {
            out.push_str(&format!(
                "{} {} triaged, {} failed\n",
                "✗".red().bold(),
                triaged,
                failed
            ));
        } else {
            out.push_str(&format!("{} {} triaged\n", "✓".green().bold(), triaged));
        }
        out
    }
}

fn rating_badge(rating: Rating) -> ColoredString {
    let label = format!("{:<6}", rating.as_str());
    match rating {
        Rating::High => label.red().bold(),
        Rating::Medium => label.yellow().bold(),
        Rating::Low => label.green().bold(),
    }
}

fn format_details(report: &TriageReport) -> String {
    let mut out = format!(
        "  {} {:.3} {} {} {} {} {} {}/{}\n",
        "score".dimmed(),
        report.result.score,
        "sink".dimmed(),
        report.sink.as_str(),
        "longest path".dimmed(),
        report.longest_path,
        "controllable leaves".dimmed(),
        report.count_controllable_leaves,
        report.count_leaves,
    );

    for (label, count, names) in [
        ("implicit", report.count_implicit, &report.implicit),
        ("explicit", report.count_explicit, &report.explicit),
        ("object access", report.count_access, &report.object_access),
    ] {
        if count > 0 {
            out.push_str(&format!(
                "  {} {} ({})\n",
                label.cyan(),
                count,
                names.join(", ")
            ));
        }
    }
    out
}
