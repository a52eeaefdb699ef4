use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::options::{normalize_identifier_prefix, parse_ownership, OwnershipMode};

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "BREW_CASKAGE_CONFIG";

/// User defaults read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub identifier_prefix: Option<String>,
    pub ownership: Option<OwnershipMode>,
    /// Parent directory for staging and scripts temp dirs.
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    identifier_prefix: Option<String>,
    ownership: Option<String>,
    temp_dir: Option<PathBuf>,
}

/// `$BREW_CASKAGE_CONFIG`, else `<config dir>/brew-caskage/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("brew-caskage").join("config.toml"))
}

/// Load settings; a missing file yields the defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    if !path.is_file() {
        return Ok(Settings::default());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("reading settings '{}'", path.display()))?;
    parse_settings(&text).with_context(|| format!("parsing settings '{}'", path.display()))
}

fn parse_settings(text: &str) -> Result<Settings> {
    let parsed: SettingsToml = toml::from_str(text)?;

    let identifier_prefix = parsed
        .identifier_prefix
        .as_deref()
        .and_then(normalize_identifier_prefix);

    Ok(Settings {
        identifier_prefix,
        ownership: parsed.ownership.as_deref().and_then(parse_ownership),
        temp_dir: parsed.temp_dir,
    })
}
