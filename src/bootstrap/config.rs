//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML file into [`LoaderConfig`]. Pure data loading: values are
//! accepted as written and defaults are decided by the wiring layer.
//! 仅负责读取与解析，不做验证，不计算默认值。

use std::path::Path;

use anyhow::Context;
use il_core::LoaderConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: &Path) -> anyhow::Result<LoaderConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    LoaderConfig::from_toml(&toml_value)
}
