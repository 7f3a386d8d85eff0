//! External tool invocation.
//!
//! Every child process this crate runs goes through [`ToolInvoker`], which
//! keeps process-lifecycle handling (captured output, exit codes, timeouts,
//! missing binaries) in one place and gives tests an injection seam: the
//! engine is exercised with scripted fakes that never fork.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::ToolError;

/// Description of one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Bytes to feed to the child's stdin; `None` leaves stdin closed.
    pub stdin: Option<Vec<u8>>,
    /// Budget for the whole invocation; on expiry the process is forcibly
    /// terminated.
    pub timeout: Option<Duration>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.stdin = Some(bytes);
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured outcome of a completed child process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code; -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined stdout and stderr, the way grammar validators interleave
    /// their diagnostics.
    pub fn combined_output(&self) -> String {
        let stdout = String::from_utf8_lossy(&self.stdout);
        format!("{}{}", stdout, self.stderr).trim().to_string()
    }
}

/// The seam between the validation engine and the operating system.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Run the command to completion and capture its output.
    ///
    /// A missing binary or an expired timeout is reported as a
    /// [`ToolError`], which callers convert into per-file `error` outcomes;
    /// a non-zero exit code is not an error at this layer.
    async fn invoke(&self, command: ToolCommand) -> Result<ToolOutput, ToolError>;
}

/// Production invoker backed by `tokio::process`.
///
/// Children are spawned with `kill_on_drop` so that run-level cancellation
/// (which drops the pending future) also terminates the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolInvoker;

#[async_trait]
impl ToolInvoker for SystemToolInvoker {
    async fn invoke(&self, command: ToolCommand) -> Result<ToolOutput, ToolError> {
        debug!(program = %command.program, args = ?command.args, "invoking external tool");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        tool: command.program.clone(),
                    }
                } else {
                    ToolError::Io {
                        tool: command.program.clone(),
                        source: e,
                    }
                }
            })?;

        let stdin_handle = child.stdin.take();
        let stdin_bytes = command.stdin.clone();
        let feed_stdin = async move {
            if let (Some(mut handle), Some(bytes)) = (stdin_handle, stdin_bytes) {
                // The child may exit before consuming everything; a broken
                // pipe here is reported through the exit code instead.
                let _ = handle.write_all(&bytes).await;
                let _ = handle.shutdown().await;
            }
        };

        let wait = async {
            let (output, ()) = tokio::join!(child.wait_with_output(), feed_stdin);
            output
        };

        let output = match command.timeout {
            Some(budget) => match tokio::time::timeout(budget, wait).await {
                Ok(output) => output,
                // Dropping the timed-out future kills the child via
                // kill_on_drop.
                Err(_) => {
                    return Err(ToolError::Timeout {
                        tool: command.program.clone(),
                        timeout_secs: budget.as_secs(),
                    });
                }
            },
            None => wait.await,
        }
        .map_err(|e| ToolError::Io {
            tool: command.program.clone(),
            source: e,
        })?;

        Ok(ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
