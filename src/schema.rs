//! External RELAX NG grammar validation.
//!
//! Conformance is checked by a `jing` child process. The resolved document
//! stream is fed on stdin; compact-syntax schemas (`.rnc`) get the `-c`
//! flag. Success is determined solely by the exit code, and everything that
//! can go wrong is returned as a [`SchemaOutcome`] rather than raised: a
//! non-zero exit is a `fail` with the captured diagnostics, while a missing
//! binary or an expired timeout is an `error` so environment problems stay
//! distinguishable from content defects.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::process::{ToolCommand, ToolInvoker};
use crate::report::SchemaOutcome;

/// Name of the external grammar validator.
pub const GRAMMAR_TOOL: &str = "jing";

pub struct SchemaValidator {
    invoker: Arc<dyn ToolInvoker>,
    schema_path: PathBuf,
    compact_syntax: bool,
    timeout: Option<Duration>,
}

impl SchemaValidator {
    /// Create a validator for one schema.
    ///
    /// The schema file must exist up front; a missing schema is a
    /// configuration error that aborts the run before any target is
    /// processed.
    pub fn new(
        invoker: Arc<dyn ToolInvoker>,
        schema_path: &Path,
        timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        if !schema_path.is_file() {
            return Err(ConfigError::SchemaNotFound {
                path: schema_path.to_path_buf(),
            });
        }
        let compact_syntax = schema_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("rnc"));
        Ok(Self {
            invoker,
            schema_path: schema_path.to_path_buf(),
            compact_syntax,
            timeout,
        })
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Validate one resolved document stream against the schema.
    ///
    /// Never fails out of the component: every outcome, including a missing
    /// or timed-out validator, comes back as data.
    pub async fn validate(&self, document: Vec<u8>) -> SchemaOutcome {
        let mut command = ToolCommand::new(GRAMMAR_TOOL);
        if self.compact_syntax {
            command = command.arg("-c");
        }
        let command = command
            .arg(self.schema_path.display().to_string())
            .arg("-")
            .stdin_bytes(document)
            .timeout(self.timeout);

        match self.invoker.invoke(command).await {
            Ok(output) if output.success() => SchemaOutcome::pass(),
            Ok(output) => {
                debug!(schema = %self.schema_path.display(), "grammar validation failed");
                SchemaOutcome::fail(output.combined_output())
            }
            // Missing binary, timeout, spawn failure: environment problems,
            // returned as data rather than raised.
            Err(e) => SchemaOutcome::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::NamedTempFile;

    use crate::error::ToolError;
    use crate::process::ToolOutput;
    use crate::report::Status;

    struct ScriptedInvoker {
        result: Mutex<Option<Result<ToolOutput, ToolError>>>,
        seen: Mutex<Vec<ToolCommand>>,
    }

    impl ScriptedInvoker {
        fn new(result: Result<ToolOutput, ToolError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ToolInvoker for ScriptedInvoker {
        async fn invoke(&self, command: ToolCommand) -> Result<ToolOutput, ToolError> {
            self.seen.lock().unwrap().push(command);
            self.result.lock().unwrap().take().unwrap()
        }
    }

    fn schema_file(suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "start = element product {{ empty }}").unwrap();
        file.flush().unwrap();
        file
    }

    fn ok_output(exit_code: i32, stderr: &str) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput {
            exit_code,
            stdout: Vec::new(),
            stderr: stderr.to_string(),
        })
    }

    #[tokio::test]
    async fn test_missing_schema_is_config_error() {
        let invoker = Arc::new(ScriptedInvoker::new(ok_output(0, "")));
        let result = SchemaValidator::new(invoker, Path::new("/nonexistent.rnc"), None);
        assert!(matches!(result, Err(ConfigError::SchemaNotFound { .. })));
    }

    #[tokio::test]
    async fn test_zero_exit_is_pass() {
        let schema = schema_file(".rng");
        let invoker = Arc::new(ScriptedInvoker::new(ok_output(0, "")));
        let validator = SchemaValidator::new(invoker, schema.path(), None).unwrap();

        let outcome = validator.validate(b"<product/>".to_vec()).await;
        assert_eq!(outcome.status, Status::Pass);
        assert!(outcome.diagnostic.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_fail_with_diagnostics() {
        let schema = schema_file(".rng");
        let invoker = Arc::new(ScriptedInvoker::new(ok_output(
            1,
            "-:3:15: error: element \"docset\" not allowed here\n",
        )));
        let validator = SchemaValidator::new(invoker, schema.path(), None).unwrap();

        let outcome = validator.validate(b"<product><docset/></product>".to_vec()).await;
        assert_eq!(outcome.status, Status::Fail);
        assert!(outcome.diagnostic.contains("not allowed here"));
    }

    #[tokio::test]
    async fn test_missing_tool_is_error_outcome() {
        let schema = schema_file(".rng");
        let invoker = Arc::new(ScriptedInvoker::new(Err(ToolError::NotFound {
            tool: GRAMMAR_TOOL.to_string(),
        })));
        let validator = SchemaValidator::new(invoker, schema.path(), None).unwrap();

        let outcome = validator.validate(b"<product/>".to_vec()).await;
        assert_eq!(outcome.status, Status::Error);
        assert!(outcome.diagnostic.contains("jing command not found"));
    }

    #[tokio::test]
    async fn test_timeout_is_error_outcome() {
        let schema = schema_file(".rng");
        let invoker = Arc::new(ScriptedInvoker::new(Err(ToolError::Timeout {
            tool: GRAMMAR_TOOL.to_string(),
            timeout_secs: 5,
        })));
        let validator = SchemaValidator::new(invoker, schema.path(), None).unwrap();

        let outcome = validator.validate(b"<product/>".to_vec()).await;
        assert_eq!(outcome.status, Status::Error);
        assert!(outcome.diagnostic.contains("timed out"));
    }

    #[tokio::test]
    async fn test_compact_schema_gets_compact_flag_and_stdin_marker() {
        let schema = schema_file(".rnc");
        let invoker = Arc::new(ScriptedInvoker::new(ok_output(0, "")));
        let validator = SchemaValidator::new(invoker.clone(), schema.path(), None).unwrap();

        validator.validate(b"<product/>".to_vec()).await;

        let seen = invoker.seen.lock().unwrap();
        let command = &seen[0];
        assert_eq!(command.program, GRAMMAR_TOOL);
        assert_eq!(command.args[0], "-c");
        assert_eq!(command.args.last().unwrap(), "-");
        assert_eq!(command.stdin.as_deref(), Some(b"<product/>".as_slice()));
    }

    #[tokio::test]
    async fn test_xml_schema_omits_compact_flag() {
        let schema = schema_file(".rng");
        let invoker = Arc::new(ScriptedInvoker::new(ok_output(0, "")));
        let validator = SchemaValidator::new(invoker.clone(), schema.path(), None).unwrap();

        validator.validate(b"<product/>".to_vec()).await;

        let seen = invoker.seen.lock().unwrap();
        assert!(!seen[0].args.contains(&"-c".to_string()));
    }
}
