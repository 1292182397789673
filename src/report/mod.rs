pub mod types;

pub use types::{FileOutcome, FileReport, RunReport};

use crate::config::Environment;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Combine per-file outcomes with the pull request identity.
pub fn build(files: Vec<FileReport>, env: &Environment) -> RunReport {
    let (posted, failed) = files.iter().fold((0, 0), |(p, f), file| match file.outcome {
        FileOutcome::Commented { posted, failed } => (p + posted, f + failed),
        _ => (p, f),
    });

    RunReport {
        repo: env.repo.to_string(),
        pr_number: env.pr_number,
        files,
        posted,
        failed,
    }
}

/// Print the summary to the terminal, or write it as markdown when a path is given.
#[instrument(skip(report), fields(pr = report.pr_number, files = report.files.len()))]
pub fn output(report: &RunReport, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing summary to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing summary to file");
            write_markdown_report(report, path)
        }
    }
}

fn print_terminal_report(report: &RunReport) {
    println!();
    println!("Review of {} #{}", report.repo, report.pr_number);
    if report.files.is_empty() {
        println!("  No reviewable files.");
        println!();
        return;
    }

    for file in &report.files {
        println!("  • {}: {}", file.filename, colorize_outcome(&file.outcome));
    }
    println!();
    println!(
        "═══ {} comments posted, {} failed ═══",
        report.posted.to_string().green().bold(),
        report.failed.to_string().red().bold()
    );
    println!();
}

fn render_markdown(report: &RunReport) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Review of {} #{}\n\n", report.repo, report.pr_number));

    if report.files.is_empty() {
        md.push_str("No reviewable files.\n");
        return md;
    }

    md.push_str("| File | Outcome |\n|---|---|\n");
    for file in &report.files {
        md.push_str(&format!("| `{}` | {} |\n", file.filename, file.outcome));
    }
    md.push_str(&format!(
        "\n**Comments posted:** {} | **Failed:** {}\n",
        report.posted, report.failed
    ));
    md
}

fn write_markdown_report(report: &RunReport, path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, render_markdown(report))?;
    Ok(())
}

fn colorize_outcome(outcome: &FileOutcome) -> colored::ColoredString {
    let text = outcome.to_string();
    match outcome {
        FileOutcome::ReviewFailed(_) | FileOutcome::Fallback | FileOutcome::FallbackFailed => {
            text.red()
        }
        FileOutcome::Commented { failed, .. } if *failed > 0 => text.yellow(),
        FileOutcome::Skipped => text.dimmed(),
        _ => text.green(),
    }
}
