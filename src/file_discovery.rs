//! Async discovery of configuration files.
//!
//! When the CLI is given no explicit targets it searches the configured
//! directory for configuration documents. The default naming convention
//! only picks up files whose name starts with a lowercase letter, so
//! schema files and generated artifacts sitting next to the configuration
//! are left alone.

use crate::error::{Result, ValidationError};
use globset::{GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Glob matched against file names when discovering configuration files.
pub const CONFIG_FILE_PATTERN: &str = "[a-z]*.xml";

#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include (e.g., ["xml"])
    extensions: Vec<String>,
    /// Include patterns, matched against the file name
    include_set: Option<GlobSet>,
    /// Exclude patterns, matched against the file name
    exclude_set: Option<GlobSet>,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_set: None,
            exclude_set: None,
        }
    }

    /// Discovery with the configuration-file naming convention applied.
    pub fn config_defaults() -> Result<Self> {
        Self::new().with_include_patterns(vec![CONFIG_FILE_PATTERN.to_string()])
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Add include patterns (glob syntax, matched against file names)
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns)?;
        Ok(self)
    }

    /// Add exclude patterns (glob syntax, matched against file names)
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns)?;
        Ok(self)
    }

    /// Discover matching files under `path`, sorted for deterministic runs.
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path).await.map_err(ValidationError::from)?;

        let mut files = Vec::new();
        if metadata.is_file() {
            if self.should_process(path) {
                files.push(path.to_path_buf());
            }
            return Ok(files);
        }

        self.walk(path, &mut files).await?;
        files.sort();
        Ok(files)
    }

    fn walk<'a>(
        &'a self,
        dir: &'a Path,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            let mut read_dir = fs::read_dir(dir).await.map_err(|e| {
                ValidationError::Discovery {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;

            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(ValidationError::from)?
            {
                let entry_path = entry.path();
                let file_type = entry.file_type().await.map_err(ValidationError::from)?;

                if file_type.is_dir() {
                    self.walk(&entry_path, files).await?;
                } else if file_type.is_file() && self.should_process(&entry_path) {
                    files.push(entry_path);
                }
            }
            Ok(())
        })
    }

    fn should_process(&self, path: &Path) -> bool {
        let extension_matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false);
        if !extension_matches {
            return false;
        }

        let Some(file_name) = path.file_name() else {
            return false;
        };

        if let Some(ref include) = self.include_set
            && !include.is_match(file_name)
        {
            return false;
        }
        if let Some(ref exclude) = self.exclude_set
            && exclude.is_match(file_name)
        {
            return false;
        }
        true
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                crate::error::ConfigError::InvalidValue {
                    field: "pattern".to_string(),
                    value: pattern.clone(),
                    reason: e.to_string(),
                }
            })?;
        builder.add(glob);
    }

    let set = builder.build().map_err(|e| crate::error::ConfigError::InvalidValue {
        field: "pattern".to_string(),
        value: patterns.join(","),
        reason: e.to_string(),
    })?;
    Ok(Some(set))
}
