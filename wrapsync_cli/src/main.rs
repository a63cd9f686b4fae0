use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use wrapsync_cli::config::{AppConfig, ConfigManager, FailurePolicy};
use wrapsync_cli::error::{CliError, CliResult, ErrorContext};
use wrapsync_cli::orchestrators::{
    DownloadOptions, DownloadOrchestrator, PublishOptions, PublishOrchestrator,
};
use wrapsync_core::{GatewayClient, KuboStore};

#[derive(Parser)]
#[command(name = "wrapsync")]
#[command(author, version, about = "Mirror and publish content-addressed wrappers", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every pinned wrapper into <target>/<cid>/
    Download {
        /// Output directory, conventionally "wrappers"
        #[arg(short, long)]
        target: PathBuf,

        /// Gateway URL (overrides client.gateway_url)
        #[arg(short, long)]
        url: Option<String>,

        /// What to do with a wrapper that cannot be fetched
        #[arg(long, value_enum)]
        on_failure: Option<FailurePolicy>,
    },

    /// Publish every <target>/<cid>/ directory and verify its identifier
    Publish {
        /// Directory holding one subdirectory per wrapper
        #[arg(short, long)]
        target: PathBuf,

        /// Gateway URL (overrides client.gateway_url)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g., retry.fetch_max_attempts)
        key: String,
    },

    /// List all effective configuration values
    List,

    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("wrapsync_core", log::LevelFilter::Debug)
            .filter_module("wrapsync_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(cli.command).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            eprint!("{}", error.format_for_user(cli.debug));
            error.exit_code().into()
        }
    }
}

async fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Download {
            target,
            url,
            on_failure,
        } => {
            let mut config = load_config()?;
            config.apply_cli_overrides(url, on_failure);
            download_command(config, target).await
        }
        Commands::Publish { target, url } => {
            let mut config = load_config()?;
            config.apply_cli_overrides(url, None);
            publish_command(config, target).await
        }
        Commands::Config { command } => config_command(command),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn load_config() -> CliResult<AppConfig> {
    let manager = ConfigManager::new();
    manager.load().map_err(|e| {
        CliError::misuse(&format!("{e:#}"))
            .with_context("config", &manager.get_config_path().display().to_string())
    })
}

async fn download_command(config: AppConfig, target: PathBuf) -> CliResult<()> {
    log::debug!("Starting download into {}", target.display());

    let index = Arc::new(GatewayClient::new(&config.client)?);
    let store = Arc::new(KuboStore::new(&config.client)?);
    let options = DownloadOptions {
        target,
        on_failure: config.download.on_failure,
        retry: config.retry.fetch_policy(),
    };

    DownloadOrchestrator::new(index, store, options).run().await?;
    Ok(())
}

async fn publish_command(config: AppConfig, target: PathBuf) -> CliResult<()> {
    log::debug!("Starting publish from {}", target.display());

    let store = Arc::new(KuboStore::new(&config.client)?);
    let options = PublishOptions {
        target,
        retry: config.retry.publish_policy(),
    };

    PublishOrchestrator::new(store, options).run().await?;
    Ok(())
}

fn config_command(command: ConfigCommand) -> CliResult<()> {
    let manager = ConfigManager::new();

    match command {
        ConfigCommand::Get { key } => {
            let value = manager
                .get(&key)
                .map_err(|e| CliError::misuse(&format!("{e:#}")))?;
            println!("{value}");
        }
        ConfigCommand::List => {
            let items = manager.list().map_err(CliError::from)?;
            eprintln!("{}", "Configuration:".bold().blue());
            eprintln!("Config file: {}", manager.get_config_path().display());
            eprintln!();

            let mut current_section = None;
            for (key, value) in items {
                let (section, rest) = key.split_once('.').unwrap_or(("general", key.as_str()));
                if current_section.as_deref() != Some(section) {
                    println!("[{}]", section.yellow());
                    current_section = Some(section.to_string());
                }
                println!("  {} = {}", rest.cyan(), value);
            }
        }
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
