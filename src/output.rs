//! Console output helpers.
//!
//! Human-facing startup and summary lines; diagnostics go through
//! `tracing`, not here.

use crate::engine::ScanSummary;
use console::style;

/// Print a scan header before scanning begins.
pub fn print_scan_header(targets: &str, hosts: usize, ports: usize, workers: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("sounder").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Targets: {}",
        style("•").dim(),
        style(targets).white().bold()
    );
    println!(
        "{} Probing {} ports on {} host(s) with {} workers...",
        style("•").dim(),
        style(ports).white().bold(),
        style(hosts).white().bold(),
        style(workers).white().bold()
    );
    println!();
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &ScanSummary) {
    println!();
    if summary.hit_deadline {
        print_warning("deadline reached: scan aborted, partial results kept");
    }
    println!(
        "{} {} open ports in {:.2}s ({} of {} probes completed)",
        style("Done:").green().bold(),
        style(summary.open_ports).green().bold(),
        summary.elapsed.as_secs_f64(),
        summary.tasks_probed,
        summary.tasks_total
    );
    if summary.probe_faults > 0 {
        println!(
            "{} {} probes hit unexpected faults (see log)",
            style("•").dim(),
            style(summary.probe_faults).yellow()
        );
    }
    println!(
        "{} Started {}, results saved to {}",
        style("•").dim(),
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        style(summary.output.display()).white().bold()
    );
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
