//! Progress display and run summary.

use std::path::Path;
use std::sync::Mutex;

use console::style;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use cbzmerge::merge::{MergeProgress, RunReport, SourceStatus, UnitOutcome, UnitReport};

const BAR_TEMPLATE: &str = "{spinner:.green} {msg:<24} [{bar:30.cyan/blue}] {pos}/{len}";

/// Progress bar per merge unit, advanced once per source file.
pub struct BarProgress {
    hidden: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new(hidden: bool) -> Self {
        Self {
            hidden,
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        if let Ok(mut bar) = self.bar.lock() {
            f(&mut bar);
        }
    }
}

impl MergeProgress for BarProgress {
    fn unit_started(&self, directory: &Path, sources: usize) {
        if self.hidden {
            return;
        }
        let bar = ProgressBar::new(sources as u64);
        let bar_style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(bar_style);
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(name);
        self.with_bar(|slot| *slot = Some(bar));
    }

    fn source_finished(&self, _source: &Path, _status: &SourceStatus) {
        self.with_bar(|slot| {
            if let Some(bar) = slot.as_ref() {
                bar.inc(1);
            }
        });
    }

    fn unit_finished(&self, _report: &UnitReport) {
        self.with_bar(|slot| {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        });
    }
}

/// One summary line for a unit.
pub fn format_unit(unit: &UnitReport) -> String {
    match &unit.outcome {
        UnitOutcome::Completed {
            output,
            entries,
            bytes,
        } => {
            let marker = if unit.has_omissions() {
                style("!").yellow().bold()
            } else {
                style("✓").green().bold()
            };
            let mut line = format!(
                "{} {} ({} entries, {})",
                marker,
                output.display(),
                entries,
                HumanBytes(*bytes)
            );
            if unit.has_omissions() {
                line.push_str(&format!(
                    " - {} skipped, {} failed",
                    unit.skipped_count(),
                    unit.failed_count()
                ));
            }
            if !unit.cleanup_failures.is_empty() {
                line.push_str(" - staging not removed");
            }
            line
        }
        UnitOutcome::Aborted { reason } => format!(
            "{} {}: {}",
            style("✗").red().bold(),
            unit.name,
            reason
        ),
    }
}

/// Print every unit line, failed sources, and totals.
pub fn print_summary(report: &RunReport) {
    println!();
    for unit in &report.units {
        println!("{}", format_unit(unit));
        for failure in &unit.failures {
            println!("    {}: {}", failure.path.display(), failure.error);
        }
        for cleanup in &unit.cleanup_failures {
            println!("    {}", cleanup);
        }
    }
    println!();
    println!(
        "{} written, {} aborted, {} source(s) failed",
        report.completed_count(),
        report.aborted_count(),
        report.total_failures()
    );
}
