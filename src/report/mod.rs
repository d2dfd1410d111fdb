pub mod types;

pub use types::{AnalysisResponse, Mode};

use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to encode report as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a CLI review ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format<'a> {
    Terminal,
    Markdown(&'a Path),
    Json,
}

/// Render a review to the terminal (default), a markdown file, or JSON on
/// stdout. JSON output is exactly the HTTP response body.
#[instrument(skip(response), fields(mode = %response.mode, source = %response.source))]
pub fn output(response: &AnalysisResponse, format: Format<'_>) -> Result<(), ReportError> {
    match format {
        Format::Terminal => {
            debug!("writing review to terminal");
            print_terminal_report(response);
            Ok(())
        }
        Format::Markdown(path) => {
            debug!(path = %path.display(), "writing review to file");
            std::fs::write(path, render_markdown(response))?;
            Ok(())
        }
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
            Ok(())
        }
    }
}

/// PR #7: "Add foo"
/// owner/repo | Author: alice | Files changed: 3 | +20 -4
///
/// ═══ Summary ═══
/// ...
/// ═══ Verdict: MERGE ═══
fn print_terminal_report(response: &AnalysisResponse) {
    let meta = &response.metadata;
    println!();
    println!("PR #{}: \"{}\"", meta.pr_number, response.title);
    println!(
        "{} | Author: {} | Files changed: {} | +{} -{}",
        meta.repository, meta.author, meta.files_changed, meta.additions, meta.deletions
    );
    println!("Mode: {} | Source: {}", colorize_mode(response.mode), response.source);
    if let Some(note) = &response.note {
        println!("{}", note.yellow());
    }
    println!();

    println!("═══ Summary ═══");
    println!("{}", response.summary);
    println!();

    println!("═══ Files ═══");
    for (label, files) in [
        ("Code", &response.files_grouped.code),
        ("Tests", &response.files_grouped.tests),
        ("Docs", &response.files_grouped.docs),
    ] {
        println!("{label} ({}):", files.len());
        for file in files {
            println!("  • {file}");
        }
    }
    println!();

    println!("═══ Risks ═══");
    for risk in &response.risks {
        println!("  • {}", risk.red());
    }
    println!();

    println!("═══ Checklist ═══");
    for item in &response.checklist {
        println!("  ☐ {item}");
    }
    println!();

    println!("{}", response.lint_summary.dimmed());
    println!();
    println!("═══ Verdict: {} ═══", colorize_verdict(response.should_merge));
    println!("{}", response.explanation);
    println!();
}

fn render_markdown(response: &AnalysisResponse) -> String {
    let meta = &response.metadata;
    let mut md = String::new();
    md.push_str(&format!("# PR #{}: \"{}\"\n\n", meta.pr_number, response.title));
    md.push_str(&format!(
        "**Repository:** {} | **Author:** {} | **Files changed:** {} | **+{} -{}**\n\n",
        meta.repository, meta.author, meta.files_changed, meta.additions, meta.deletions
    ));
    md.push_str(&format!("**Mode:** {} | **Source:** {}\n\n", response.mode, response.source));
    if let Some(note) = &response.note {
        md.push_str(&format!("> {note}\n\n"));
    }

    md.push_str(&format!("## Summary\n\n{}\n\n", response.summary));

    md.push_str("## Files\n\n");
    for (label, files) in [
        ("Code", &response.files_grouped.code),
        ("Tests", &response.files_grouped.tests),
        ("Docs", &response.files_grouped.docs),
    ] {
        md.push_str(&format!("### {label}\n\n"));
        if files.is_empty() {
            md.push_str("None.\n\n");
        } else {
            for file in files {
                md.push_str(&format!("- `{file}`\n"));
            }
            md.push('\n');
        }
    }

    md.push_str("## Risks\n\n");
    for risk in &response.risks {
        md.push_str(&format!("- {risk}\n"));
    }
    md.push_str("\n## Checklist\n\n");
    for item in &response.checklist {
        md.push_str(&format!("- [ ] {item}\n"));
    }

    md.push_str(&format!("\n_{}_\n\n", response.lint_summary));
    md.push_str(&format!("## Verdict: {}\n\n", verdict(response.should_merge)));
    md.push_str(&format!("{}\n", response.explanation));
    md
}

fn verdict(should_merge: bool) -> &'static str {
    if should_merge {
        "MERGE"
    } else {
        "HOLD"
    }
}

fn colorize_verdict(should_merge: bool) -> colored::ColoredString {
    if should_merge {
        verdict(true).green().bold()
    } else {
        verdict(false).red().bold()
    }
}

fn colorize_mode(mode: Mode) -> colored::ColoredString {
    match mode {
        Mode::Live => "live".green(),
        Mode::Demo => "demo".cyan(),
        Mode::Fallback => "fallback".yellow(),
    }
}
