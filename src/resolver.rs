//! XInclude resolution.
//!
//! Documents may pull in other documents through XInclude directives. Before
//! grammar validation the target is expanded by an external `xmllint`
//! process whose stdout becomes the resolved document stream; no
//! intermediate file is written. With resolution disabled the raw file
//! content is passed through unchanged.
//!
//! A failed expansion always escalates: the caller records a schema outcome
//! of `error` and skips grammar validation, never falling back to the raw
//! document (the raw form could pass a validation that the shipped, expanded
//! form would not).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ResolveError;
use crate::process::{ToolCommand, ToolInvoker};

/// Name of the external XInclude expander.
pub const XINCLUDE_TOOL: &str = "xmllint";

pub struct IncludeResolver {
    invoker: Arc<dyn ToolInvoker>,
    enabled: bool,
    timeout: Option<Duration>,
}

impl IncludeResolver {
    pub fn new(invoker: Arc<dyn ToolInvoker>, enabled: bool, timeout: Option<Duration>) -> Self {
        Self {
            invoker,
            enabled,
            timeout,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Produce the document stream for one target: the XInclude-expanded
    /// document when resolution is enabled, the raw file content otherwise.
    pub async fn resolve(&self, target: &Path) -> Result<Vec<u8>, ResolveError> {
        if !self.enabled {
            return tokio::fs::read(target).await.map_err(|e| ResolveError::Read {
                path: target.to_path_buf(),
                source: e,
            });
        }

        debug!(target = %target.display(), "expanding XIncludes");

        let command = ToolCommand::new(XINCLUDE_TOOL)
            .arg("--xinclude")
            .arg("--nonet")
            .arg(target.display().to_string())
            .timeout(self.timeout);

        let output = self.invoker.invoke(command).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(ResolveError::Expansion {
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}
