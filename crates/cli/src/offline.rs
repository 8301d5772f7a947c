//! Subcommands that work on local files and never touch the wiki.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use vic_engine::{merge, resolve, BotConfig, Candidate};

/// Outcome of `inspect`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Inspection {
    Resolved(Candidate),
    Failed { identifier: String, error: String },
}

impl Inspection {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Identifier of a local candidate document: explicit, else the file name
fn identifier_for(path: &Path, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| path.file_name().and_then(|name| name.to_str()).map(str::to_string))
        .unwrap_or_default()
}

pub fn inspect(path: &Path, identifier: Option<&str>) -> Result<Inspection> {
    let document = read(path)?;
    let identifier = identifier_for(path, identifier);
    Ok(match resolve(&identifier, &document) {
        Ok(candidate) => Inspection::Resolved(candidate),
        Err(err) => Inspection::Failed {
            identifier,
            error: err.to_string(),
        },
    })
}

pub fn sort_index(path: &Path) -> Result<String> {
    Ok(merge(&read(path)?, &[]))
}

/// Configuration from `path`, or the defaults
pub fn load_config(path: Option<&Path>) -> Result<BotConfig> {
    let Some(path) = path else {
        let config = BotConfig::default();
        config.validate()?;
        return Ok(config);
    };
    let source = read(path)?;
    BotConfig::from_toml_str(&source)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

pub fn render_config(config: &BotConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}
