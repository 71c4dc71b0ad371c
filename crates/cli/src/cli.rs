//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// nmea-mux - NMEA0183 telemetry multiplexer
#[derive(Parser, Debug)]
#[command(
    name = "nmea-mux",
    author,
    version,
    about = "NMEA0183 telemetry multiplexer",
    long_about = "Reads NMEA0183 sentences from configured channels, keeps a damped \n\
                  telemetry cache, derives tidal current from it and forwards every \n\
                  accepted sentence to the configured outputs."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "NMEA_MUX_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "NMEA_MUX_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the multiplexer until interrupted
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display what a configuration file sets up
    Info(InfoArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "mux.toml", env = "NMEA_MUX_CONFIG")]
    pub config: PathBuf,

    /// Override the cache damping window from configuration
    #[arg(long)]
    pub damping: Option<usize>,

    /// Stop after this many seconds (0 = run until a signal)
    #[arg(long, default_value = "0", env = "NMEA_MUX_DURATION")]
    pub duration: u64,

    /// Log a status line every this many seconds (0 = never)
    #[arg(long, default_value = "60")]
    pub status_interval: u64,

    /// Prometheus exporter port (0 = disabled)
    #[arg(long, default_value = "0", env = "NMEA_MUX_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "mux.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "mux.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show cache calibration values
    #[arg(long)]
    pub calibration: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable multi-line format
    Pretty,
    /// Single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "nmea-mux",
            "-vv",
            "run",
            "-c",
            "boat.toml",
            "--duration",
            "30",
            "--damping",
            "5",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("boat.toml"));
                assert_eq!(args.duration, 30);
                assert_eq!(args.damping, Some(5));
                assert_eq!(args.metrics_port, 0);
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["nmea-mux", "-q", "-v", "validate"]).is_err());
    }
}
