//! # Pure Data Module / 纯数据模块
//!
//! Loader configuration read from TOML. Data only: no validation and no
//! default value calculation. Empty strings, empty paths and `0` mean
//! "not configured"; the bootstrap layer decides what that implies.
//!
//! 加载器配置 DTO：只包含数据，不做验证，不计算默认值。

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Loader configuration DTO (pure data, no logic)
/// 加载器配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// `[cache] dir`: directory for cached image files.
    pub cache_dir: PathBuf,

    /// `[cache] registry_path`: JSON file backing the disk cache registry.
    pub registry_path: PathBuf,

    /// `[cache] memory_budget_kib`: process memory budget, the memory cache
    /// gets one eighth of it.
    pub memory_budget_kib: u64,

    /// `[network] user_agent`
    pub user_agent: String,

    /// `[network] timeout_secs`
    pub timeout_secs: u64,

    /// `[engine] max_concurrent_fetches`
    pub max_concurrent_fetches: usize,

    /// `[engine] header_sniff_limit`: bytes buffered while probing a
    /// download for its bounds.
    pub header_sniff_limit: usize,

    /// `[content] roots`: content authority -> directory.
    pub content_roots: BTreeMap<String, PathBuf>,

    /// `[logging] dir`
    pub log_dir: PathBuf,
}

impl LoaderConfig {
    /// Create LoaderConfig from TOML value
    /// 从 TOML 值创建 LoaderConfig
    ///
    /// Must not validate. Negative integers are read as `0`.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let section = |name: &str, key: &str| toml_value.get(name).and_then(|s| s.get(key));
        let path = |name: &str, key: &str| {
            PathBuf::from(section(name, key).and_then(|v| v.as_str()).unwrap_or(""))
        };
        let unsigned = |name: &str, key: &str| {
            section(name, key)
                .and_then(|v| v.as_integer())
                .map(|v| v.max(0) as u64)
                .unwrap_or(0)
        };

        let content_roots = toml_value
            .get("content")
            .and_then(|c| c.get("roots"))
            .and_then(|r| r.as_table())
            .map(|table| {
                table
                    .iter()
                    .filter_map(|(authority, dir)| {
                        dir.as_str()
                            .map(|dir| (authority.clone(), PathBuf::from(dir)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            cache_dir: path("cache", "dir"),
            registry_path: path("cache", "registry_path"),
            memory_budget_kib: unsigned("cache", "memory_budget_kib"),
            user_agent: section("network", "user_agent")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            timeout_secs: unsigned("network", "timeout_secs"),
            max_concurrent_fetches: unsigned("engine", "max_concurrent_fetches") as usize,
            header_sniff_limit: unsigned("engine", "header_sniff_limit") as usize,
            content_roots,
            log_dir: path("logging", "dir"),
        })
    }

    /// Create empty LoaderConfig (all empty/default values)
    /// 创建空的 LoaderConfig
    pub fn empty() -> Self {
        Self {
            cache_dir: PathBuf::new(),
            registry_path: PathBuf::new(),
            memory_budget_kib: 0,
            user_agent: String::new(),
            timeout_secs: 0,
            max_concurrent_fetches: 0,
            header_sniff_limit: 0,
            content_roots: BTreeMap::new(),
            log_dir: PathBuf::new(),
        }
    }
}
