//! Media plan editor CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use mps_cli::cli::{Cli, LogFormatArg, LogLevelArg};
use mps_cli::commands::run_command;
use mps_cli::config::{AppConfig, LoggingSettings};
use mps_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(2);
        }
    };
    let log_config = log_config_from_cli(&cli, &config.logging);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match run_command(&cli.command, &config).await {
        Ok(outcome) => {
            if !outcome.text.is_empty() {
                println!("{}", outcome.text);
            }
            if outcome.success { 0 } else { 1 }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration: flags first, then the config file.
fn log_config_from_cli(cli: &Cli, settings: &LoggingSettings) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        with_timestamps: settings.timestamps,
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        Some(LogFormatArg::Pretty) => LogFormat::Pretty,
        Some(LogFormatArg::Compact) => LogFormat::Compact,
        Some(LogFormatArg::Json) => LogFormat::Json,
        None => settings.format.unwrap_or_default(),
    };
    config.log_file = cli.log_file.clone().or_else(|| settings.file.clone());
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => config.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
