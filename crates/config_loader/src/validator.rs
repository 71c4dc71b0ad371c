//! Config validation.
//!
//! Rules:
//! - cache and feed settings within range
//! - every descriptor carries its required parameters
//! - identities unique within each collection
//! - computer windows non-zero and distinct

use std::collections::HashSet;

use contracts::{ComputerKind, ContractError, Identity, MuxConfig};
use validator::Validate;

/// Returns the first error found
pub fn validate(config: &MuxConfig) -> Result<(), ContractError> {
    validate_settings(config)?;
    validate_channels(config)?;
    validate_forwarders(config)?;
    validate_computers(config)?;
    Ok(())
}

fn validate_settings(config: &MuxConfig) -> Result<(), ContractError> {
    config
        .cache
        .validate()
        .map_err(|e| ContractError::config_validation("cache", e.to_string()))?;
    config
        .mux
        .validate()
        .map_err(|e| ContractError::config_validation("mux", e.to_string()))
}

/// Prefix the failing field with the entry's position
fn located(collection: &str, idx: usize, err: ContractError) -> ContractError {
    match err {
        ContractError::ConfigValidation { field, message } => {
            let leaf = field.rsplit('.').next().unwrap_or_default();
            ContractError::config_validation(format!("{collection}[{idx}].{leaf}"), message)
        }
        other => other,
    }
}

fn check_unique(
    collection: &str,
    identities: impl Iterator<Item = Identity>,
) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, identity) in identities.enumerate() {
        if !seen.insert(identity.clone()) {
            return Err(ContractError::config_validation(
                format!("{collection}[{idx}]"),
                format!("duplicate identity '{identity}'"),
            ));
        }
    }
    Ok(())
}

fn validate_channels(config: &MuxConfig) -> Result<(), ContractError> {
    for (idx, channel) in config.channels.iter().enumerate() {
        channel
            .validate()
            .map_err(|e| located("channels", idx, e))?;
    }
    check_unique("channels", config.channels.iter().map(|c| c.identity()))
}

fn validate_forwarders(config: &MuxConfig) -> Result<(), ContractError> {
    for (idx, forwarder) in config.forwarders.iter().enumerate() {
        forwarder
            .validate()
            .map_err(|e| located("forwarders", idx, e))?;
    }
    check_unique("forwarders", config.forwarders.iter().map(|f| f.identity()))
}

fn validate_computers(config: &MuxConfig) -> Result<(), ContractError> {
    for (idx, computer) in config.computers.iter().enumerate() {
        computer
            .validate()
            .map_err(|e| located("computers", idx, e))?;

        if let ComputerKind::TwCurrent {
            time_buffer_lengths,
            ..
        } = &computer.kind
        {
            let mut seen = HashSet::new();
            for &length in time_buffer_lengths {
                if length == 0 {
                    return Err(ContractError::config_validation(
                        format!("computers[{idx}].time_buffer_lengths"),
                        "window lengths must be > 0",
                    ));
                }
                if !seen.insert(length) {
                    return Err(ContractError::config_validation(
                        format!("computers[{idx}].time_buffer_lengths"),
                        format!("duplicate window length {length} ms"),
                    ));
                }
            }
        }
    }
    check_unique("computers", config.computers.iter().map(|c| c.identity()))
}
