use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub mock: MockSettings,
    #[serde(default)]
    pub features: FeatureFlags,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_storage_key")]
    pub key: String,
    /// Schema version stamped on written state
    #[serde(default = "default_storage_version")]
    pub version: u32,
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Where dashboard state lives. `memory` keeps nothing across restarts.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshSettings {
    /// Update stream cadence
    #[serde(default = "default_projects_ms")]
    pub projects_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MockSettings {
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
    #[serde(default)]
    pub failure_rate: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub real_time_updates: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_storage_key() -> String {
    "dashboard_state".to_string()
}

fn default_storage_version() -> u32 {
    1
}

fn default_projects_ms() -> u64 {
    5000
}

fn default_min_latency_ms() -> u64 {
    500
}

fn default_max_latency_ms() -> u64 {
    1500
}

fn default_true() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: default_storage_key(),
            version: default_storage_version(),
            backend: StorageBackend::default(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            projects_ms: default_projects_ms(),
        }
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
            failure_rate: 0.0,
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            real_time_updates: true,
        }
    }
}

/// Layers `config/dashboard.*` (optional) under `DASHBOARD__*` env vars.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
