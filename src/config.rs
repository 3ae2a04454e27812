//! Configuration for the stagegate client.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI on top of the resolved config)
//! 2. Environment variables (STAGEGATE_API_URL, STAGEGATE_TIMEOUT_SECONDS)
//! 3. Config file (.stagegate/config.yaml, then ~/.stagegate/config.yaml)
//! 4. Defaults (http://127.0.0.1:8000, 30s timeout, bundled gate table)
//!
//! Config file discovery:
//! - Searches current directory and parents for .stagegate/config.yaml
//! - Falls back to the user's home directory

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{GateId, StageGateMap};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

const CONFIG_DIR: &str = ".stagegate";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub api: ApiConfig,
    /// Full replacement of the stage-to-gate table
    #[serde(default)]
    pub stage_gates: Option<BTreeMap<u32, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Backend connection settings
    pub api: ApiSettings,
    /// Stage-to-gate table
    pub stage_gates: StageGateMap,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            stage_gates: StageGateMap::default(),
            config_file: None,
        }
    }
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    let home_config = dirs::home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Turn the raw `stage_gates` mapping into a validated table
fn parse_stage_gates(raw: &BTreeMap<u32, String>) -> Result<StageGateMap> {
    let entries = raw
        .iter()
        .map(|(stage_id, gate)| {
            gate.parse::<GateId>()
                .map(|gate| (*stage_id, gate))
                .with_context(|| format!("Invalid gate for stage {} in stage_gates", stage_id))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(StageGateMap::new(entries))
}

/// Resolve a config from an optional parsed file and an environment lookup
fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let mut config = ResolvedConfig::default();

    if let Some((path, file)) = file {
        if let Some(base_url) = file.api.base_url {
            config.api.base_url = base_url;
        }
        if let Some(timeout) = file.api.timeout_seconds {
            if timeout == 0 {
                anyhow::bail!(
                    "Invalid api.timeout_seconds in config file {}: must be at least 1",
                    path.display()
                );
            }
            config.api.timeout_seconds = timeout;
        }
        if let Some(ref raw) = file.stage_gates {
            config.stage_gates = parse_stage_gates(raw)
                .with_context(|| format!("In config file: {}", path.display()))?;
        }
        config.config_file = Some(path);
    }

    if let Some(base_url) = env("STAGEGATE_API_URL") {
        config.api.base_url = base_url;
    }
    if let Some(timeout) = env("STAGEGATE_TIMEOUT_SECONDS") {
        let seconds: u64 = timeout
            .trim()
            .parse()
            .with_context(|| format!("Invalid STAGEGATE_TIMEOUT_SECONDS: {}", timeout))?;
        if seconds == 0 {
            anyhow::bail!("Invalid STAGEGATE_TIMEOUT_SECONDS: must be at least 1");
        }
        config.api.timeout_seconds = seconds;
    }

    Ok(config)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let file = match find_config_file() {
        Some(path) => {
            let parsed = load_config_file(&path)?;
            Some((path, parsed))
        }
        None => None,
    };

    resolve(file, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
