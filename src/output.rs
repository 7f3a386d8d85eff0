//! Output and reporting.
//!
//! Formats a [`RunReport`] for humans, gated by verbosity: counts only at
//! the base level, non-pass detail with `-v`, full detail including passes
//! with `-vv`. Environment problems (`error`) and content defects (`fail`)
//! stay visually distinct.

use atty;

use crate::cli::VerbosityLevel;
use crate::report::{CheckResult, FileValidationRecord, RunReport, Status};

/// Output formatter for human-readable results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    #[cfg(test)]
    fn plain(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: false,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn status_word(&self, status: Status) -> String {
        match status {
            Status::Pass => self.colorize("pass", "32"),
            Status::Fail => self.colorize("fail", "31"),
            Status::Error => self.colorize("error", "33"),
        }
    }

    pub fn format_report(&self, report: &RunReport) -> String {
        let mut output = String::new();
        let width = report.max_name_len();

        match self.verbosity {
            VerbosityLevel::Summary => {}
            VerbosityLevel::Failures => {
                for record in &report.records {
                    if !record.aggregate.is_pass() {
                        output.push_str(&self.format_record(record, width));
                    }
                }
            }
            VerbosityLevel::Full => {
                for record in &report.records {
                    output.push_str(&self.format_record(record, width));
                }
            }
        }

        output.push_str(&self.format_summary(report));
        output
    }

    pub fn format_record(&self, record: &FileValidationRecord, width: usize) -> String {
        let mut output = format!(
            "{:<width$}: {}\n",
            record.display_name,
            self.status_word(record.aggregate),
            width = width
        );

        if !record.schema.status.is_pass() {
            output.push_str(&format!(
                "    schema {}: {}\n",
                self.status_word(record.schema.status),
                record.schema.diagnostic
            ));
        }

        for check in &record.checks {
            let show = self.verbosity >= VerbosityLevel::Full || !check.status.is_pass();
            if show {
                output.push_str(&self.format_check(check));
            }
        }

        output
    }

    fn format_check(&self, check: &CheckResult) -> String {
        let mut line = format!("    {} {}", self.status_word(check.status), check.name);
        if let Some(location) = check.location {
            line.push_str(&format!(" ({location})"));
        }
        if !check.message.is_empty() {
            line.push_str(&format!(": {}", check.message));
        }
        line.push('\n');
        line
    }

    fn format_summary(&self, report: &RunReport) -> String {
        let passed = self.colorize(
            &format!("{}/{} file(s)", report.passed, report.total),
            "32",
        );
        let failed = self.colorize(&format!("{} file(s)", report.failed), "31");
        let mut summary =
            format!("Result: {passed} successfully validated, {failed} failed");
        if report.errored > 0 {
            let errored = self.colorize(&format!("{} file(s)", report.errored), "33");
            summary.push_str(&format!(", {errored} with errors"));
        }
        summary.push_str(".\n");
        summary
    }
}
