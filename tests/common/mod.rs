use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::{NamedTempFile, TempDir};

use validate_docconfig::{ToolCommand, ToolError, ToolInvoker, ToolOutput};

/// Scripted behavior for one external tool.
#[derive(Clone, Debug)]
pub struct FakeToolBehavior {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub delay: Option<Duration>,
    pub not_found: bool,
}

impl FakeToolBehavior {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            stdout: Vec::new(),
            stderr: String::new(),
            delay: None,
            not_found: false,
        }
    }

    pub fn exit(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stderr: stderr.to_string(),
            ..Self::success()
        }
    }

    pub fn not_found() -> Self {
        Self {
            not_found: true,
            ..Self::success()
        }
    }

    pub fn with_stdout(mut self, stdout: &[u8]) -> Self {
        self.stdout = stdout.to_vec();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Fake tool invoker for testing orchestration without forking processes.
///
/// Behaviors are scripted per program name, optionally refined per stdin
/// content; every launch is logged and a gauge tracks how many invocations
/// were in flight at once.
pub struct FakeToolInvoker {
    default_behaviors: Mutex<HashMap<String, FakeToolBehavior>>,
    stdin_rules: Mutex<Vec<(String, String, FakeToolBehavior)>>,
    launch_log: Mutex<Vec<ToolCommand>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeToolInvoker {
    /// Every tool succeeds with empty output until scripted otherwise.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            default_behaviors: Mutex::new(HashMap::new()),
            stdin_rules: Mutex::new(Vec::new()),
            launch_log: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, program: &str, behavior: FakeToolBehavior) {
        self.default_behaviors
            .lock()
            .unwrap()
            .insert(program.to_string(), behavior);
    }

    /// Use `behavior` for invocations of `program` whose stdin contains
    /// `needle`; first matching rule wins.
    pub fn set_for_stdin(&self, program: &str, needle: &str, behavior: FakeToolBehavior) {
        self.stdin_rules.lock().unwrap().push((
            program.to_string(),
            needle.to_string(),
            behavior,
        ));
    }

    pub fn launches(&self) -> Vec<ToolCommand> {
        self.launch_log.lock().unwrap().clone()
    }

    pub fn launch_count(&self, program: &str) -> usize {
        self.launch_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.program == program)
            .count()
    }

    /// Highest number of simultaneously running invocations observed.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, command: &ToolCommand) -> FakeToolBehavior {
        let stdin = command
            .stdin
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        for (program, needle, behavior) in self.stdin_rules.lock().unwrap().iter() {
            if *program == command.program && stdin.contains(needle) {
                return behavior.clone();
            }
        }
        self.default_behaviors
            .lock()
            .unwrap()
            .get(&command.program)
            .cloned()
            .unwrap_or_else(FakeToolBehavior::success)
    }
}

#[async_trait]
impl ToolInvoker for FakeToolInvoker {
    async fn invoke(&self, command: ToolCommand) -> Result<ToolOutput, ToolError> {
        let behavior = self.behavior_for(&command);
        self.launch_log.lock().unwrap().push(command.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = behavior.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if behavior.not_found {
            return Err(ToolError::NotFound {
                tool: command.program,
            });
        }

        Ok(ToolOutput {
            exit_code: behavior.exit_code,
            stdout: behavior.stdout,
            stderr: behavior.stderr,
        })
    }
}

/// A syntactically plausible RELAX NG compact schema on disk.
pub fn schema_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("product-config-schema")
        .suffix(".rnc")
        .tempfile()
        .unwrap();
    write!(
        file,
        "start = element product {{ attribute productid {{ text }}? }}"
    )
    .unwrap();
    file.flush().unwrap();
    file
}

pub fn write_xml(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}
