//! Command implementations.

pub mod install;
pub mod issue;
pub mod status;
pub mod uninstall;

use colored::Colorize;

use devca_core::{TrustReport, TrustStatus};

/// Shared state passed to every command.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Emit machine-readable JSON instead of human output
    pub json: bool,
}

/// Render a per-store trust report.
pub fn print_report(ctx: Context, report: &TrustReport) {
    if ctx.json {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to serialize report: {e}"),
        }
        return;
    }

    if report.is_empty() {
        println!("No trust stores were consulted.");
        return;
    }

    for (store, status) in report.iter() {
        let label = match status.status {
            TrustStatus::Trusted => "trusted".green().bold(),
            TrustStatus::NotTrusted => "not trusted".red().bold(),
            TrustStatus::Unknown => "unknown".yellow(),
            TrustStatus::Other => "n/a".dimmed(),
        };
        println!("  {:<10} {label}  {}", store.to_string(), status.reason.dimmed());
    }
}
