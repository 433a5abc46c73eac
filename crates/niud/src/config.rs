//! Daemon configuration (TOML)

use std::path::{Path, PathBuf};

use niu_core::Field;
use serde::Deserialize;

/// Top-level configuration file.
#[derive(Deserialize)]
pub struct Config {
    pub account: AccountConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub fields: FieldsConfig,
}

/// `[account]`: credentials and vehicle selection.
#[derive(Deserialize)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
    /// Zero-based position in the account's vehicle list.
    #[serde(default)]
    pub vehicle_index: usize,
}

/// `[poll]`: scheduler and snapshot settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// Where the redacted diagnostic snapshot is written; omit to disable.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            snapshot_path: None,
        }
    }
}

/// `[fields]`: which data points the daemon republishes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// `group.field` names; empty means every declared field.
    pub selected: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve `[fields] selected` against the declared field set.
    ///
    /// Unknown names are a startup error so configuration typos surface
    /// immediately instead of silently publishing nothing.
    pub fn selected_fields(&self) -> anyhow::Result<Vec<Field>> {
        if self.fields.selected.is_empty() {
            return Ok(Field::ALL.to_vec());
        }
        self.fields
            .selected
            .iter()
            .map(|name| {
                Field::from_qualified(name)
                    .ok_or_else(|| anyhow::anyhow!("unknown field `{name}` in [fields] selected"))
            })
            .collect()
    }
}
