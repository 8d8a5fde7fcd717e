//! Server configuration and command-line parsing.

use crate::store::{Label, SlotIndex};
use clap::Parser;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Default server port.
pub const DEFAULT_PORT: u16 = 9000;

/// Default number of slots.
pub const DEFAULT_SLOT_COUNT: SlotIndex = 14;

/// Built-in label table: `(wire value, display text)`.
const DEFAULT_LABELS: &[(&str, &str)] = &[
    ("Option 1", ""),
    ("Option 2", "YC"),
    ("Option 3", "Sern"),
    ("Option 4", "Wtm"),
    ("Option 5", "San"),
    ("Option 6", "Ln"),
    ("Option 7", "Bt"),
    ("Option 8", "WW"),
    ("Option 9", "Kv"),
    ("Option 10", "Kg"),
    ("Option 11", "??"),
];

/// Returns the built-in label table.
pub fn default_labels() -> Vec<Label> {
    DEFAULT_LABELS
        .iter()
        .map(|(value, text)| Label::new(*value, *text))
        .collect()
}

/// Runtime configuration of the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub listen: SocketAddr,

    /// Number of slots, addressed `1..=slot_count`.
    pub slot_count: SlotIndex,

    /// Values a slot may take, in page order.
    pub labels: Vec<Label>,

    /// How often the page reloads itself. `None` disables the reload.
    pub page_reload: Option<Duration>,

    /// Upper bound on a single socket write.
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            slot_count: DEFAULT_SLOT_COUNT,
            labels: default_labels(),
            page_reload: Some(Duration::from_secs(7)),
            write_timeout: Duration::from_secs(10),
        }
    }
}

/// Invalid configuration detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("slot count must be at least 1")]
    NoSlots,

    #[error("at least one label is required")]
    NoLabels,

    #[error("label value {0:?} is given more than once")]
    DuplicateLabel(String),
}

impl ServerConfig {
    /// Checks the invariants the rest of the server relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_count == 0 {
            return Err(ConfigError::NoSlots);
        }
        if self.labels.is_empty() {
            return Err(ConfigError::NoLabels);
        }

        let mut seen = HashSet::new();
        for label in &self.labels {
            if !seen.insert(label.value.as_str()) {
                return Err(ConfigError::DuplicateLabel(label.value.clone()));
            }
        }
        Ok(())
    }
}

/// Shared slot editor with live synchronization between browsers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket address to listen on.
    #[arg(long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
    pub listen: SocketAddr,

    /// Number of slots shown on the page.
    #[arg(long, default_value_t = DEFAULT_SLOT_COUNT)]
    pub slots: SlotIndex,

    /// Seconds between automatic page reloads. 0 disables reloading.
    #[arg(long, default_value_t = 7)]
    pub reload_secs: u64,

    /// Seconds a single socket write may take.
    #[arg(long, default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// Selectable value as VALUE=TEXT. Repeat to build the list; replaces the built-in labels.
    #[arg(long = "label", value_name = "VALUE=TEXT", value_parser = parse_label)]
    pub labels: Vec<Label>,
}

impl Cli {
    /// Builds and validates the server configuration.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let labels = if self.labels.is_empty() {
            default_labels()
        } else {
            self.labels
        };

        let config = ServerConfig {
            listen: self.listen,
            slot_count: self.slots,
            labels,
            page_reload: (self.reload_secs > 0).then(|| Duration::from_secs(self.reload_secs)),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_label(raw: &str) -> Result<Label, String> {
    let (value, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected VALUE=TEXT, got {raw:?}"))?;
    let value = value.trim();
    if value.is_empty() {
        return Err("label value cannot be empty".to_string());
    }
    Ok(Label::new(value, text.trim()))
}
