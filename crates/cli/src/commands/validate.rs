//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ComputerKind, MuxConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    damping: usize,
    channel_count: usize,
    forwarder_count: usize,
    computer_count: usize,
}

pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            error: Some(format!("File not found: {config_path}")),
            config_path,
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(ConfigSummary {
                version: format!("{:?}", config.version),
                damping: config.cache.damping,
                channel_count: config.channels.len(),
                forwarder_count: config.forwarders.len(),
                computer_count: config.computers.len(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Non-fatal issues
fn collect_warnings(config: &MuxConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.channels.is_empty() {
        warnings.push("No channels configured - nothing will be read".to_string());
    }
    if config.forwarders.is_empty() {
        warnings.push("No forwarders configured - sentences only update the cache".to_string());
    }

    let has_current = config
        .computers
        .iter()
        .any(|c| matches!(c.kind, ComputerKind::TwCurrent { .. }));
    if has_current && config.cache.damping > 1 {
        warnings.push(format!(
            "Damping {} also smooths the inputs of the tw-current computer",
            config.cache.damping
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if !result.valid {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
        return;
    }

    println!("✓ Configuration is valid: {}", result.config_path);
    if let Some(ref summary) = result.summary {
        println!("\n  Version: {}", summary.version);
        println!("  Damping: {}", summary.damping);
        println!("  Channels: {}", summary.channel_count);
        println!("  Forwarders: {}", summary.forwarder_count);
        println!("  Computers: {}", summary.computer_count);
    }
    if !result.warnings.is_empty() {
        println!("\n⚠ Warnings:");
        for warning in &result.warnings {
            println!("  - {warning}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(config: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config,
            json: true,
        }
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/mux.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_file_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mux.toml");
        std::fs::write(
            &path,
            "[cache]\ndamping = 4\n\n[[computers]]\nkind = \"tw-current\"\ntime_buffer_lengths = [10000]\n",
        )
        .unwrap();

        let result = validate_config(&args(path));
        assert!(result.valid);
        assert_eq!(result.summary.as_ref().unwrap().computer_count, 1);
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mux.toml");
        std::fs::write(&path, "[[channels]]\nkind = \"tcp\"\nhost = \"\"\nport = 7001\n").unwrap();

        let result = validate_config(&args(path));
        assert!(!result.valid);
        assert!(run_validate(&ValidateArgs {
            config: dir.path().join("mux.toml"),
            json: false,
        })
        .is_err());
    }
}
