//! # validate-docconfig Library
//!
//! An async-first Rust library for validating documentation configuration
//! XML files before they enter a build pipeline. Validation has two
//! independent layers: grammar conformance checked by an external RELAX NG
//! validator (after optional XInclude expansion), and pluggable structural
//! checks executed against the parsed in-memory tree. Both layers combine
//! into a uniform pass/fail/error result per file, with concurrent,
//! failure-isolated processing across the file set.

pub mod checks;
pub mod cli;
pub mod error;
pub mod file_discovery;
pub mod output;
pub mod process;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod validator;

pub use checks::{ALLOWED_LANGUAGES, CheckDefinition, CheckFn, CheckRegistry, Finding};
pub use cli::{Cli, Config, VerbosityLevel};
pub use error::{CheckError, ConfigError, ResolveError, ToolError, ValidationError};
pub use file_discovery::{CONFIG_FILE_PATTERN, FileDiscovery};
pub use output::Output;
pub use process::{SystemToolInvoker, ToolCommand, ToolInvoker, ToolOutput};
pub use report::{
    CheckResult, FileValidationRecord, Location, RunReport, SchemaOutcome, Status,
};
pub use resolver::{IncludeResolver, XINCLUDE_TOOL};
pub use schema::{GRAMMAR_TOOL, SchemaValidator};
pub use validator::{CancelHandle, PARSE_CHECK, ValidationConfig, ValidationEngine};
