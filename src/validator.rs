//! Validation orchestration.
//!
//! Drives concurrent validation across the full target set:
//! - **Per target**: XInclude resolution feeds the external grammar
//!   validator, concurrently with parse-then-check over the same resolved
//!   stream; both outcomes aggregate into one immutable record.
//! - **Bounded concurrency**: a semaphore caps simultaneously running
//!   external processes, since each target may spawn one or two children.
//! - **Failure isolation**: one target's failure (including a panicking
//!   task) never stops processing of the others; every target is reported.
//! - **Cancellation**: a run-level signal terminates in-flight child
//!   processes and marks the affected records distinctly.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, watch};
use tracing::{debug, info, warn};

use crate::checks::CheckRegistry;
use crate::error::{ConfigError, Result};
use crate::process::ToolInvoker;
use crate::report::{CheckResult, FileValidationRecord, Location, RunReport, SchemaOutcome};
use crate::resolver::IncludeResolver;
use crate::schema::SchemaValidator;

/// Name under which a parse failure is reported in a record's check list.
pub const PARSE_CHECK: &str = "parse";

/// Validation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// RELAX NG schema the external validator checks against
    pub schema_path: PathBuf,
    /// Expand XInclude directives before validation
    pub xinclude: bool,
    /// Upper bound on concurrently validated targets (and therefore on
    /// simultaneously running external processes)
    pub concurrency: usize,
    /// Budget for each external tool invocation; `None` disables the limit
    pub tool_timeout: Option<Duration>,
}

impl ValidationConfig {
    pub fn new(schema_path: PathBuf) -> Self {
        Self {
            schema_path,
            xinclude: true,
            concurrency: num_cpus::get(),
            tool_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Handle for cancelling a run from outside the engine (e.g. Ctrl-C).
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace updates the value even when no task has subscribed
        // yet, so a cancellation before the run starts is not lost.
        self.tx.send_replace(true);
    }
}

/// Concurrent validation engine.
///
/// Built once per run from an immutable check registry and a tool invoker;
/// the registry is shared read-only across tasks and each record slot is
/// written exactly once by its own completing task.
pub struct ValidationEngine {
    resolver: Arc<IncludeResolver>,
    schema: Arc<SchemaValidator>,
    registry: Arc<CheckRegistry>,
    concurrency: usize,
    cancel: Arc<watch::Sender<bool>>,
}

impl ValidationEngine {
    /// Create an engine, verifying the configuration up front: a missing
    /// schema file or a zero concurrency limit aborts before any target is
    /// processed.
    pub fn new(
        invoker: Arc<dyn ToolInvoker>,
        registry: Arc<CheckRegistry>,
        config: &ValidationConfig,
    ) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let schema = SchemaValidator::new(
            Arc::clone(&invoker),
            &config.schema_path,
            config.tool_timeout,
        )?;
        let resolver = IncludeResolver::new(invoker, config.xinclude, config.tool_timeout);
        let (tx, _rx) = watch::channel(false);

        Ok(Self {
            resolver: Arc::new(resolver),
            schema: Arc::new(schema),
            registry,
            concurrency: config.concurrency,
            cancel: Arc::new(tx),
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Validate every target and collect one record per target, in the
    /// original target order regardless of completion order.
    ///
    /// Never short-circuits: a run surfaces every problem, not only the
    /// first one.
    pub async fn process(&self, targets: Vec<PathBuf>) -> RunReport {
        if targets.is_empty() {
            warn!("No XML files found to validate.");
            return RunReport::from_records(Vec::new());
        }

        info!(
            files = targets.len(),
            concurrency = self.concurrency,
            checks = self.registry.len(),
            "starting validation run"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|path| {
                let resolver = Arc::clone(&self.resolver);
                let schema = Arc::clone(&self.schema);
                let registry = Arc::clone(&self.registry);
                let semaphore = Arc::clone(&semaphore);
                let cancelled = self.cancel.subscribe();
                tokio::spawn(validate_single_target(
                    path, resolver, schema, registry, semaphore, cancelled,
                ))
            })
            .collect();

        // join_all keeps the spawn order, which indexes the records by the
        // original target order regardless of completion order.
        let outcomes = futures::future::join_all(handles).await;
        let mut records = Vec::with_capacity(outcomes.len());
        for (path, outcome) in targets.into_iter().zip(outcomes) {
            match outcome {
                Ok(record) => records.push(record),
                Err(e) => records.push(FileValidationRecord::new(
                    path,
                    SchemaOutcome::error(format!("validation task panicked: {e}")),
                    Vec::new(),
                    Duration::ZERO,
                )),
            }
        }

        let report = RunReport::from_records(records);
        info!(
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            "validation run finished"
        );
        report
    }
}

async fn validate_single_target(
    path: PathBuf,
    resolver: Arc<IncludeResolver>,
    schema: Arc<SchemaValidator>,
    registry: Arc<CheckRegistry>,
    semaphore: Arc<Semaphore>,
    mut cancelled: watch::Receiver<bool>,
) -> FileValidationRecord {
    let start = Instant::now();
    let cancel_path = path.clone();

    if *cancelled.borrow() {
        return FileValidationRecord::cancelled(cancel_path, start.elapsed());
    }

    let work = async {
        let _permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return FileValidationRecord::new(
                    path.clone(),
                    SchemaOutcome::error("validation pool closed"),
                    Vec::new(),
                    start.elapsed(),
                );
            }
        };

        debug!(target = %path.display(), "validating");

        let resolved = match resolver.resolve(&path).await {
            Ok(bytes) => bytes,
            // Resolution failure escalates: there is nothing valid to
            // validate, so the grammar step is skipped and the target
            // aggregates to `error`.
            Err(e) => {
                return FileValidationRecord::new(
                    path.clone(),
                    SchemaOutcome::error(e.to_string()),
                    Vec::new(),
                    start.elapsed(),
                );
            }
        };

        // Grammar validation (child process, awaited) runs alongside the
        // in-process parse-then-check path over the same resolved stream.
        let (schema_outcome, checks) = tokio::join!(schema.validate(resolved.clone()), async {
            run_checks(&registry, &resolved)
        });

        FileValidationRecord::new(path.clone(), schema_outcome, checks, start.elapsed())
    };

    tokio::select! {
        record = work => record,
        // Dropping `work` here kills any in-flight child via kill_on_drop
        // and releases the semaphore permit.
        _ = cancelled.changed() => FileValidationRecord::cancelled(cancel_path, start.elapsed()),
    }
}

/// Parse the resolved stream and run every registered check on the tree.
///
/// A document that does not parse is reported as the single `error`-status
/// result of the synthetic well-formedness check; the checks proper require
/// a usable tree and are skipped.
fn run_checks(registry: &CheckRegistry, resolved: &[u8]) -> Vec<CheckResult> {
    let text = match std::str::from_utf8(resolved) {
        Ok(text) => text,
        Err(e) => {
            return vec![CheckResult::error(
                PARSE_CHECK,
                format!("document is not valid UTF-8: {e}"),
            )];
        }
    };

    match roxmltree::Document::parse(text) {
        Ok(doc) => registry.run_all(&doc),
        Err(e) => {
            let pos = e.pos();
            vec![
                CheckResult::error(PARSE_CHECK, format!("XML syntax error: {e}")).at(Location {
                    line: pos.row,
                    column: pos.col,
                }),
            ]
        }
    }
}
