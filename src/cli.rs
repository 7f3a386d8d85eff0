use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::validator::ValidationConfig;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Counts only
    #[default]
    Summary,
    /// Per-file detail for everything that is not a pass
    Failures,
    /// Full detail including passing checks
    Full,
}

impl From<u8> for VerbosityLevel {
    fn from(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Failures,
            _ => VerbosityLevel::Full,
        }
    }
}

/// Main application configuration derived from CLI
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub files: Vec<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub schema: PathBuf,
    pub xinclude: bool,
    pub threads: usize,
    pub timeout_seconds: u64,
    pub verbose: u8,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            files: cli.xmlfiles.clone(),
            config_dir: cli.config_dir.clone(),
            schema: cli.schema.clone(),
            xinclude: !cli.no_xinclude,
            threads: cli.get_thread_count(),
            timeout_seconds: cli.timeout,
            verbose: cli.verbose,
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from(self.verbose)
    }

    /// Timeout budget per external tool invocation; zero disables it.
    pub fn tool_timeout(&self) -> Option<Duration> {
        if self.timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_seconds))
        }
    }

    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            schema_path: self.schema.clone(),
            xinclude: self.xinclude,
            concurrency: self.threads,
            tool_timeout: self.tool_timeout(),
        }
    }
}

/// Validate documentation configuration XML files
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-docconfig")]
#[command(
    about = "Validate XML configuration files with an external RELAX NG validator and structural checks"
)]
#[command(version)]
pub struct Cli {
    /// XML configuration files to validate
    #[arg(help = "XML files to validate; searches --config-dir when omitted")]
    pub xmlfiles: Vec<PathBuf>,

    /// RELAX NG schema to validate against (.rnc or .rng)
    #[arg(short = 's', long = "schema", help = "RELAX NG schema file")]
    pub schema: PathBuf,

    /// Directory searched for configuration files when no files are given
    #[arg(long = "config-dir")]
    pub config_dir: Option<PathBuf>,

    /// Skip XInclude resolution before validation
    #[arg(long = "no-xinclude")]
    pub no_xinclude: bool,

    /// Number of concurrent validations
    #[arg(
        short = 't',
        long = "threads",
        help = "Number of concurrent validations"
    )]
    pub threads: Option<usize>,

    /// External tool timeout in seconds (0 disables the limit)
    #[arg(long = "timeout", default_value = "30")]
    pub timeout: u64,

    /// Increase output detail (-v: non-pass detail, -vv: full detail)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        for file in &self.xmlfiles {
            if !file.is_file() {
                return Err(format!("XML file does not exist: {}", file.display()));
            }
        }
        if self.xmlfiles.is_empty()
            && let Some(dir) = &self.config_dir
            && !dir.is_dir()
        {
            return Err(format!("Config directory does not exist: {}", dir.display()));
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn get_thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}
