use anyhow::{Context, Result};
use std::{fs, path::Path};
use stonequarry_world::{AllowedCodes, QuarryConfig};
use tracing::{error, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/stonequarry.toml";

/// Rocks quarried when no allowed-codes table is supplied.
pub const DEFAULT_ROCKS: &[&str] = &[
    "andesite",
    "basalt",
    "chalk",
    "chert",
    "claystone",
    "conglomerate",
    "granite",
    "limestone",
    "peridotite",
    "phyllite",
    "sandstone",
    "shale",
    "slate",
];

/// Load the quarry configuration, falling back to defaults on errors.
pub fn load_quarry_config(path: &Path) -> QuarryConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<QuarryConfig>(&contents) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!("Failed to parse {}: {err}. Using defaults", path.display());
                QuarryConfig::default()
            }
        },
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                warn!("Quarry config not found at {}. Using defaults", path.display());
            } else {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
            }
            QuarryConfig::default()
        }
    }
}

/// Store the effective configuration so every option shows up in the file.
pub fn store_quarry_config(config: &QuarryConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(config).context("failed to encode quarry config")?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Load the rock code table from JSON, or build the default one.
pub fn load_allowed_codes(path: Option<&Path>) -> Result<AllowedCodes> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            AllowedCodes::from_json(&contents)
                .with_context(|| format!("invalid allowed codes in {}", path.display()))
        }
        None => AllowedCodes::with_rocks(DEFAULT_ROCKS).context("invalid default rock list"),
    }
}
