//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CacheSettings, MuxConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    feed_capacity: usize,
    damping: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    calibration: Option<CacheSettings>,
    channels: Vec<EntryInfo>,
    forwarders: Vec<EntryInfo>,
    computers: Vec<EntryInfo>,
}

#[derive(Serialize)]
struct EntryInfo {
    identity: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    filters: Vec<String>,
    verbose: bool,
}

pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let info = build_config_info(&config, args);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &MuxConfig, args: &InfoArgs) -> ConfigInfo {
    let channels = config
        .channels
        .iter()
        .map(|c| EntryInfo {
            identity: c.identity().to_string(),
            kind: c.kind.tag(),
            filters: c
                .device_filters
                .iter()
                .chain(c.sentence_filters.iter())
                .cloned()
                .collect(),
            verbose: c.verbose,
        })
        .collect();

    let forwarders = config
        .forwarders
        .iter()
        .map(|f| EntryInfo {
            identity: f.identity().to_string(),
            kind: f.kind.tag(),
            filters: Vec::new(),
            verbose: f.verbose,
        })
        .collect();

    let computers = config
        .computers
        .iter()
        .map(|c| EntryInfo {
            identity: c.identity().to_string(),
            kind: c.kind.tag(),
            filters: Vec::new(),
            verbose: c.verbose,
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        feed_capacity: config.mux.feed_capacity,
        damping: config.cache.damping,
        calibration: args.calibration.then(|| config.cache.clone()),
        channels,
        forwarders,
        computers,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== nmea-mux configuration ===\n");

    println!("Mux");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Feed capacity: {}", info.feed_capacity);
    println!("   └─ Damping: {}", info.damping);

    if let Some(cache) = &info.calibration {
        println!("\nCalibration");
        println!("   ├─ BSP factor: {}", cache.bsp_factor);
        println!("   ├─ AWS factor: {}", cache.aws_factor);
        println!("   ├─ AWA offset: {}°", cache.awa_offset);
        println!("   ├─ HDG offset: {}°", cache.hdg_offset);
        println!("   ├─ Max leeway: {}°", cache.max_leeway);
        println!("   ├─ Default declination: {}°", cache.default_declination);
        match &cache.deviation_file {
            Some(path) => println!("   └─ Deviation file: {}", path.display()),
            None => println!("   └─ Deviation file: (none)"),
        }
    }

    print_entries("Channels", &info.channels);
    print_entries("Forwarders", &info.forwarders);
    print_entries("Computers", &info.computers);
    println!();
}

fn print_entries(title: &str, entries: &[EntryInfo]) {
    println!("\n{title} ({})", entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let prefix = if i + 1 == entries.len() { "└─" } else { "├─" };
        let verbose = if entry.verbose { " [verbose]" } else { "" };
        if entry.filters.is_empty() {
            println!("   {prefix} {}{verbose}", entry.identity);
        } else {
            println!(
                "   {prefix} {} filters={:?}{verbose}",
                entry.identity, entry.filters
            );
        }
    }
}
