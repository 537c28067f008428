use std::path::Path;

use anyhow::Context;
use classcloak::{
    config::{NamingMode, ObfuscationConfig},
    model::JsonClassModel,
};

/// Load a configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ObfuscationConfig> {
    let Some(path) = path else {
        return Ok(ObfuscationConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration: {}", path.display()))?;
    ObfuscationConfig::from_json(&text)
        .with_context(|| format!("invalid configuration: {}", path.display()))
}

/// Load a JSON class model.
pub fn load_model(path: &Path) -> anyhow::Result<JsonClassModel> {
    JsonClassModel::from_path(path)
        .with_context(|| format!("failed to load class model: {}", path.display()))
}

/// Parse a naming mode name.
pub fn parse_mode(name: &str) -> anyhow::Result<NamingMode> {
    name.parse::<NamingMode>()
        .with_context(|| format!("unknown naming mode: {name}"))
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
