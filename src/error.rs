use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("File discovery error: {path} - {reason}")]
    Discovery { path: PathBuf, reason: String },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

/// Configuration-level errors. These are fatal: they abort the run before
/// any target is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Schema file not found: {path}")]
    SchemaNotFound { path: PathBuf },

    #[error("Invalid configuration value: {field} = {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate check name: {name}")]
    DuplicateCheck { name: String },

    #[error("No XML files given and no config directory to search")]
    NoTargets,
}

/// Errors from invoking an external tool as a child process.
///
/// `NotFound` and `Timeout` are environment conditions, not content defects;
/// callers turn them into a per-file `error` outcome rather than a `fail`.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} command not found. Please install it to run validation.")]
    NotFound { tool: String },

    #[error("{tool} timed out after {timeout_secs}s and was terminated")]
    Timeout { tool: String, timeout_secs: u64 },

    #[error("failed to run {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from XInclude resolution of a single target.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("xmllint failed: {stderr}")]
    Expansion { stderr: String },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error raised inside a single check predicate.
///
/// The runner catches these and converts them into an `error`-status check
/// result; they never abort the remaining checks.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Invalid boolean value: {value}")]
    InvalidBool { value: String },

    #[error("{0}")]
    Message(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;
