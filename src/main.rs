//! Order dispatch - main entry point
//!
//! This binary provides two subcommands:
//! - session: Interactive ordering, tracking and dispatch (default)
//! - catalog: Print the equipment catalog

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use order_dispatch::config::LoggingConfig;
use order_dispatch::Config;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "order-dispatch")]
#[command(about = "Priority order dispatch with delivery status tracking", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the interactive ordering session
    Session,

    /// Print the equipment catalog
    Catalog {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Default console level; the session prompt shares the terminal
fn console_level(verbose: bool, command_name: &str) -> &'static str {
    match (verbose, command_name) {
        (true, _) => "debug",
        (false, "session") => "warn",
        (false, _) => "info",
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn setup_logging(verbose: bool, command_name: &str, logging: &LoggingConfig) -> Result<()> {
    let file_level = if verbose { "debug" } else { "info" };

    // Console output is shared with the interactive prompt, keep it to stderr
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true)
        .with_filter(env_filter(console_level(verbose, command_name)));

    if !logging.file_logging {
        tracing_subscriber::registry().with(console_layer).init();
        return Ok(());
    }

    std::fs::create_dir_all(&logging.dir)
        .with_context(|| format!("Failed to create log directory: {}", logging.dir))?;

    // Log file naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from(&logging.dir).join(&log_filename);
    let file_appender = tracing_appender::rolling::never(&logging.dir, &log_filename);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_filter(env_filter(file_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Log file: {}", log_path.display());
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let command = cli.command.unwrap_or(Commands::Session);

    let command_name = match &command {
        Commands::Session => "session",
        Commands::Catalog { .. } => "catalog",
    };
    setup_logging(cli.verbose, command_name, &config.logging)?;

    match command {
        Commands::Session => commands::session::run(&config),
        Commands::Catalog { json } => commands::catalog::run(&config, json),
    }
}
