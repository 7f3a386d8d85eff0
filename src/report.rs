//! Result data model and aggregation.
//!
//! Everything a validation run produces is expressed in the three-state
//! taxonomy (`pass`/`fail`/`error`) end-to-end: `error` flags tooling or
//! environment problems (missing binary, timeout, unparsable input, broken
//! check) that require fixing the environment, while `fail` flags genuine
//! content defects. Reports and exit-code computation keep the two
//! distinguishable; nothing in this module collapses them into a boolean.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Three-state outcome classification used for schema outcomes, individual
/// checks, and the per-file aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Conformant / check satisfied
    Pass,
    /// Genuine content defect
    Fail,
    /// Tooling or environment problem
    Error,
}

impl Status {
    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Status::Fail)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error)
    }

    /// Combine a schema outcome with check results into the per-file
    /// aggregate, with precedence `error` > `fail` > `pass`.
    ///
    /// This is a pure function; records never set their aggregate any other
    /// way.
    pub fn combine(schema: &SchemaOutcome, checks: &[CheckResult]) -> Status {
        if schema.status.is_error() || checks.iter().any(|c| c.status.is_error()) {
            Status::Error
        } else if schema.status.is_fail() || checks.iter().any(|c| c.status.is_fail()) {
            Status::Fail
        } else {
            Status::Pass
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pass => write!(f, "pass"),
            Status::Fail => write!(f, "fail"),
            Status::Error => write!(f, "error"),
        }
    }
}

/// A line/column position in the source document, when one is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Outcome of exactly one external grammar-validation invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOutcome {
    pub status: Status,
    /// Captured diagnostic output; empty on pass.
    pub diagnostic: String,
}

impl SchemaOutcome {
    pub fn pass() -> Self {
        Self {
            status: Status::Pass,
            diagnostic: String::new(),
        }
    }

    pub fn fail(diagnostic: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn error(diagnostic: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Outcome of exactly one check invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: Status,
    pub message: String,
    pub location: Option<Location>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Pass,
            message: String::new(),
            location: None,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Fail,
            message: message.into(),
            location: None,
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Error,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// Diagnostic attached to cancelled records; kept stable so reporters and
/// tests can recognize it.
pub const CANCELLED_DIAGNOSTIC: &str = "validation cancelled before completion";

/// One immutable record per validation target. Created when aggregation for
/// the target completes; never revisited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidationRecord {
    /// Path to the validated file
    pub path: PathBuf,
    /// Shortened name used for display (last two path components)
    pub display_name: String,
    /// Outcome of the external grammar validation
    pub schema: SchemaOutcome,
    /// Check results in registration order
    pub checks: Vec<CheckResult>,
    /// Combined status, `error` > `fail` > `pass`
    pub aggregate: Status,
    /// Wall-clock duration of this file's validation
    pub duration: Duration,
}

impl FileValidationRecord {
    /// Aggregate one file's schema outcome and check outcomes.
    ///
    /// A schema outcome of `error` means there was no usable document to
    /// check (resolution failed, tool missing, timeout), so any check
    /// results produced by the concurrently running check path are dropped.
    pub fn new(
        path: PathBuf,
        schema: SchemaOutcome,
        checks: Vec<CheckResult>,
        duration: Duration,
    ) -> Self {
        let checks = if schema.status.is_error() {
            Vec::new()
        } else {
            checks
        };
        let aggregate = Status::combine(&schema, &checks);
        let display_name = short_name(&path);
        Self {
            path,
            display_name,
            schema,
            checks,
            aggregate,
            duration,
        }
    }

    /// Record for a target whose validation was cancelled at the run level.
    pub fn cancelled(path: PathBuf, duration: Duration) -> Self {
        Self::new(
            path,
            SchemaOutcome::error(CANCELLED_DIAGNOSTIC),
            Vec::new(),
            duration,
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.schema.diagnostic == CANCELLED_DIAGNOSTIC
    }
}

/// Aggregated results of one validation run, in original target order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub records: Vec<FileValidationRecord>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub total_duration: Duration,
}

impl RunReport {
    pub fn from_records(records: Vec<FileValidationRecord>) -> Self {
        let total = records.len();
        let mut passed = 0;
        let mut failed = 0;
        let mut errored = 0;
        let mut total_duration = Duration::ZERO;

        for record in &records {
            match record.aggregate {
                Status::Pass => passed += 1,
                Status::Fail => failed += 1,
                Status::Error => errored += 1,
            }
            total_duration += record.duration;
        }

        Self {
            records,
            total,
            passed,
            failed,
            errored,
            total_duration,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Overall process exit code: zero only if every record is `pass`.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    /// Longest display name, used to align report columns.
    pub fn max_name_len(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.display_name.len())
            .max()
            .unwrap_or(0)
    }
}

/// Shorten a path to its last two components for display.
pub fn short_name(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.len() >= 2 {
        format!("{}/{}", parts[parts.len() - 2], parts[parts.len() - 1])
    } else {
        path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(path: &str, schema: SchemaOutcome, checks: Vec<CheckResult>) -> FileValidationRecord {
        FileValidationRecord::new(
            PathBuf::from(path),
            schema,
            checks,
            Duration::from_millis(10),
        )
    }

    #[test]
    fn test_status_predicates() {
        assert!(Status::Pass.is_pass());
        assert!(!Status::Pass.is_fail());
        assert!(!Status::Pass.is_error());

        assert!(Status::Fail.is_fail());
        assert!(Status::Error.is_error());
    }

    #[test]
    fn test_combine_all_pass() {
        let checks = vec![CheckResult::pass("a"), CheckResult::pass("b")];
        assert_eq!(
            Status::combine(&SchemaOutcome::pass(), &checks),
            Status::Pass
        );
    }

    #[test]
    fn test_combine_fail_precedence() {
        let checks = vec![CheckResult::pass("a"), CheckResult::fail("b", "dup")];
        assert_eq!(
            Status::combine(&SchemaOutcome::pass(), &checks),
            Status::Fail
        );
        assert_eq!(
            Status::combine(&SchemaOutcome::fail("nope"), &[]),
            Status::Fail
        );
    }

    #[test]
    fn test_combine_error_beats_fail() {
        let checks = vec![
            CheckResult::fail("a", "dup"),
            CheckResult::error("b", "boom"),
        ];
        assert_eq!(
            Status::combine(&SchemaOutcome::pass(), &checks),
            Status::Error
        );
        assert_eq!(
            Status::combine(&SchemaOutcome::error("no tool"), &[]),
            Status::Error
        );
        // Schema fail + check error still aggregates to error.
        assert_eq!(
            Status::combine(&SchemaOutcome::fail("nope"), &checks),
            Status::Error
        );
    }

    #[test]
    fn test_record_aggregate_is_combine() {
        let record = rec(
            "config.d/sles.xml",
            SchemaOutcome::pass(),
            vec![CheckResult::fail("enabled_format", "no enabled format")],
        );
        assert_eq!(record.aggregate, Status::Fail);
        assert_eq!(
            record.aggregate,
            Status::combine(&record.schema, &record.checks)
        );
    }

    #[test]
    fn test_schema_error_drops_check_results() {
        let record = rec(
            "config.d/sles.xml",
            SchemaOutcome::error("jing command not found"),
            vec![CheckResult::pass("enabled_format")],
        );
        assert!(record.checks.is_empty());
        assert_eq!(record.aggregate, Status::Error);
    }

    #[test]
    fn test_cancelled_record_is_distinct() {
        let record =
            FileValidationRecord::cancelled(PathBuf::from("a.xml"), Duration::from_millis(1));
        assert!(record.is_cancelled());
        assert_eq!(record.aggregate, Status::Error);
        assert!(record.schema.diagnostic.contains("cancelled"));
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name(Path::new("/srv/config.d/sles.xml")), "config.d/sles.xml");
        assert_eq!(short_name(Path::new("sles.xml")), "sles.xml");
    }

    #[test]
    fn test_run_report_counts_and_exit_code() {
        let report = RunReport::from_records(vec![
            rec("a.xml", SchemaOutcome::pass(), vec![CheckResult::pass("c")]),
            rec("b.xml", SchemaOutcome::fail("bad"), vec![]),
            rec(
                "c.xml",
                SchemaOutcome::pass(),
                vec![CheckResult::error("c", "boom")],
            ),
        ]);

        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errored, 1);
        assert!(!report.all_passed());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_run_report_empty_set_passes() {
        let report = RunReport::from_records(Vec::new());
        assert!(report.all_passed());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_run_report_all_pass_exit_zero() {
        let report = RunReport::from_records(vec![
            rec("a.xml", SchemaOutcome::pass(), vec![]),
            rec("b.xml", SchemaOutcome::pass(), vec![CheckResult::pass("c")]),
        ]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_max_name_len() {
        let report = RunReport::from_records(vec![
            rec("config.d/sles.xml", SchemaOutcome::pass(), vec![]),
            rec("x.xml", SchemaOutcome::pass(), vec![]),
        ]);
        assert_eq!(report.max_name_len(), "config.d/sles.xml".len());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Pass).unwrap(), "\"pass\"");
        assert_eq!(serde_json::to_string(&Status::Error).unwrap(), "\"error\"");
    }
}
