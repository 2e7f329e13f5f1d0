//! Plain text console output.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::ScanReport;
use crate::types::ScanTarget;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Longest banner shown in the summary.
const SUMMARY_BANNER_LEN: usize = 80;

/// Print the line announcing a scan.
pub fn print_scan_header(target: &ScanTarget, mode_label: &str, workers: usize) {
    eprintln!(
        "{} {} v{} | {} | {} ports | {} threads",
        style("Starting").cyan(),
        style("portsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION"),
        style(target).white().bold(),
        target.ports().len(),
        workers,
    );
    eprintln!("{} Scan type: {}", style("•").dim(), style(mode_label).yellow());
}

/// Print the open ports of a finished scan to stdout.
pub fn print_summary(report: &ScanReport, elapsed: Duration) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "{} {} ports scanned in {:.2}s, {} open ({})",
        style("Done:").bold(),
        report.results.len(),
        elapsed.as_secs_f64(),
        style(report.open_count()).green().bold(),
        report.scan_type,
    )?;

    for result in report.open_ports() {
        match &result.banner {
            Some(banner) => writeln!(
                out,
                "  {:>5}/tcp  {}  {}",
                result.port,
                style("open").green(),
                style(summarize_banner(banner)).dim()
            )?,
            None => writeln!(out, "  {:>5}/tcp  {}", result.port, style("open").green())?,
        }
    }

    Ok(())
}

/// Build the per-port progress bar, drawn on stderr.
pub fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(bar_style.progress_chars("=>-"));
    }
    pb
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// First line of a banner, cut to [`SUMMARY_BANNER_LEN`] characters.
fn summarize_banner(banner: &str) -> String {
    let line = banner.lines().next().unwrap_or_default().trim_end();
    if line.chars().count() <= SUMMARY_BANNER_LEN {
        line.to_string()
    } else {
        let cut: String = line.chars().take(SUMMARY_BANNER_LEN - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_banner() {
        assert_eq!(summarize_banner("SSH-2.0-OpenSSH\r\n"), "SSH-2.0-OpenSSH");
        assert_eq!(summarize_banner("HTTP/1.0 200 OK\r\nServer: x"), "HTTP/1.0 200 OK");
        assert_eq!(summarize_banner(""), "");

        let long = "é".repeat(100);
        let short = summarize_banner(&long);
        assert_eq!(short.chars().count(), SUMMARY_BANNER_LEN);
        assert!(short.ends_with("..."));
    }
}
