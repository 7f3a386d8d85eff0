use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use validate_docconfig::{
    CheckRegistry, Cli, Config, ConfigError, FileDiscovery, Output, SystemToolInvoker,
    ToolInvoker, ValidationEngine,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    if let Err(message) = cli.validate() {
        eprintln!("error: {message}");
        std::process::exit(2);
    }

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = Config::from_cli(&cli);

    let targets = if config.files.is_empty() {
        let config_dir = config.config_dir.clone().ok_or(ConfigError::NoTargets)?;
        FileDiscovery::config_defaults()?
            .discover_files(&config_dir)
            .await?
    } else {
        config.files.clone()
    };

    let registry = Arc::new(CheckRegistry::builtin());
    let invoker: Arc<dyn ToolInvoker> = Arc::new(SystemToolInvoker);
    let engine = ValidationEngine::new(invoker, registry, &config.validation_config())?;

    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested, terminating in-flight validations");
            cancel.cancel();
        }
    });

    let report = engine.process(targets).await;

    let output = Output::new(config.verbosity());
    print!("{}", output.format_report(&report));

    Ok(report.exit_code())
}
