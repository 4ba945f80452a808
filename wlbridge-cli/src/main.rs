use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use wlbridge_core::bridge::{run_console, Bridge, ConsoleSink};
use wlbridge_core::config::Config;
use wlbridge_core::core_command::Sender;
use wlbridge_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use wlbridge_core::metrics::init_metrics;
use wlbridge_core::shutdown::{wait_for_signal, ShutdownCoordinator};

#[derive(Parser, Debug)]
#[command(name = "wlbridge")]
#[command(author, version, about = "Chat command bridge for a game server whitelist", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Read chat lines from stdin and answer on stdout (default)
    Run {
        /// Identity the console lines are sent as
        #[arg(long, default_value = "console")]
        as_id: String,

        /// Display name recorded in the audit log
        #[arg(long, default_value = "console")]
        as_name: String,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = PathBuf::from(shellexpand::tilde(&args.config).into_owned());

    if let Some(Command::Init { force }) = args.command {
        if config_path.exists() && !force {
            bail!(
                "{} already exists, use --force to overwrite",
                config_path.display()
            );
        }
        Config::default()
            .save_to_file(&config_path)
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("Wrote default configuration to {}", config_path.display());
        return Ok(());
    }

    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let mut log_config = LogConfig::try_from(&config.logging)?;
    if let Some(level) = &args.log_level {
        log_config.level = level.parse::<LogLevel>()?;
    }
    if args.json_logs {
        log_config = log_config.json_format(true);
    }
    init_logging_with_config(log_config)?;
    init_metrics();

    match args.command {
        Some(Command::Check) => {
            info!("Configuration {} is valid", config_path.display());
            Ok(())
        }
        Some(Command::Run { as_id, as_name }) => run(config_path, config, as_id, as_name).await,
        None => run(config_path, config, "console".to_string(), "console".to_string()).await,
        Some(Command::Init { .. }) => Ok(()),
    }
}

async fn run(config_path: PathBuf, config: Config, as_id: String, as_name: String) -> Result<()> {
    info!("wlbridge starting with {}", config_path.display());

    let sink = Arc::new(ConsoleSink::stdout());
    let bridge = Arc::new(Bridge::start(config_path.clone(), sink).await?);
    let coordinator = Arc::new(ShutdownCoordinator::new(config.shutdown.timeout));

    let signals = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            coordinator.shutdown().await;
        })
    };

    let input = BufReader::new(tokio::io::stdin());
    let result = run_console(bridge, input, Sender::user(as_id, as_name), &coordinator).await;
    signals.abort();

    if let Err(e) = &result {
        error!("Console input failed: {}", e);
    }
    info!("wlbridge stopped");
    Ok(result?)
}
