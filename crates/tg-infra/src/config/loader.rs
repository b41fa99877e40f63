//! # Configuration Loader / 配置加载器
//!
//! Reads a TOML file into [`TourConfig`]. Missing keys take their defaults;
//! nothing else is validated here.

use std::path::Path;

use anyhow::Context;
use tg_core::TourConfig;

/// Load engine configuration from a TOML file.
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not a valid `TourConfig`.
pub fn load_config(config_path: &Path) -> anyhow::Result<TourConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}
