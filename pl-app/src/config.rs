//! PromptLight configuration loader.
//!
//! TOML file first, then environment overrides, then validation. A missing
//! file at the default location yields the built-in defaults.

use pl_core::{Category, LearnedOptimization, TaskIdStrategy};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptLightConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub learned: LearnedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_http_max_in_flight")]
    pub http_max_in_flight: usize,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_http_timeout_seconds() -> u64 {
    30
}

fn default_http_max_in_flight() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            http_timeout_seconds: default_http_timeout_seconds(),
            http_max_in_flight: default_http_max_in_flight(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default)]
    pub id_strategy: TaskIdStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingBackend {
    #[default]
    None,
    Log,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub backend: TrackingBackend,
    /// Collector base URL for the `http` backend.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_tracking_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_tracking_timeout_ms() -> u64 {
    2000
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            backend: TrackingBackend::default(),
            endpoint: None,
            auth_token: None,
            timeout_ms: default_tracking_timeout_ms(),
        }
    }
}

impl TrackingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearnedBackend {
    #[default]
    None,
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedConfig {
    #[serde(default)]
    pub backend: LearnedBackend,
    #[serde(default)]
    pub sqlite_path: Option<String>,
    #[serde(default = "default_learned_timeout_ms")]
    pub timeout_ms: u64,
    /// Seeds for the `memory` backend.
    #[serde(default)]
    pub entries: Vec<LearnedEntry>,
}

fn default_learned_timeout_ms() -> u64 {
    500
}

impl Default for LearnedConfig {
    fn default() -> Self {
        Self {
            backend: LearnedBackend::default(),
            sqlite_path: None,
            timeout_ms: default_learned_timeout_ms(),
            entries: Vec::new(),
        }
    }
}

impl LearnedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedEntry {
    pub category: Category,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<serde_json::Value>,
    #[serde(default)]
    pub confidence: f64,
}

impl LearnedEntry {
    pub fn to_learned(&self) -> LearnedOptimization {
        LearnedOptimization {
            learned_keywords: self.keywords.clone(),
            learned_patterns: self.patterns.clone(),
            confidence: self.confidence,
        }
    }
}

impl PromptLightConfig {
    /// Loads from `path`, or from the default location when `None`.
    pub async fn load_with_path(path: Option<PathBuf>) -> anyhow::Result<(Self, PathBuf)> {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(default_config_path);

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => toml::from_str::<PromptLightConfig>(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
                tracing::info!(config_path = %path.display(), "no config file; using defaults");
                PromptLightConfig::default()
            }
            Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        };

        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok((cfg, path))
    }

    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self::load_with_path(path).await?.0)
    }

    pub(crate) fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PORT") {
            match v.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!(value = %v, error = %e, "ignoring invalid PORT"),
            }
        }
        if let Some(v) = get("PROMPTLIGHT_BIND") {
            self.server.bind = v.trim().to_string();
        }
        if let Some(v) = get("PROMPTLIGHT_TRACKING_URL") {
            self.tracking.endpoint = Some(v.trim().to_string());
            self.tracking.backend = TrackingBackend::Http;
        }
        if let Some(v) = get("PROMPTLIGHT_TRACKING_TOKEN") {
            self.tracking.auth_token = Some(v);
        }
        if let Some(v) = get("PROMPTLIGHT_LEARNED_DB") {
            self.learned.sqlite_path = Some(v.trim().to_string());
            self.learned.backend = LearnedBackend::Sqlite;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server.port must be > 0"));
        }
        self.server
            .bind
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| anyhow::anyhow!("server.bind must be an IP address: {e}"))?;
        if self.server.http_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("server.http_timeout_seconds must be > 0"));
        }
        if self.server.http_max_in_flight == 0 {
            return Err(anyhow::anyhow!("server.http_max_in_flight must be > 0"));
        }
        if self.tracking.timeout_ms == 0 {
            return Err(anyhow::anyhow!("tracking.timeout_ms must be > 0"));
        }
        if self.tracking.backend == TrackingBackend::Http
            && self
                .tracking
                .endpoint
                .as_deref()
                .is_none_or(|v| v.trim().is_empty())
        {
            return Err(anyhow::anyhow!(
                "tracking.endpoint is required when tracking.backend = \"http\""
            ));
        }
        if self.learned.timeout_ms == 0 {
            return Err(anyhow::anyhow!("learned.timeout_ms must be > 0"));
        }
        if self.learned.backend == LearnedBackend::Sqlite
            && self
                .learned
                .sqlite_path
                .as_deref()
                .is_none_or(|v| v.trim().is_empty())
        {
            return Err(anyhow::anyhow!(
                "learned.sqlite_path is required when learned.backend = \"sqlite\""
            ));
        }
        for (index, entry) in self.learned.entries.iter().enumerate() {
            if !(0.0..=1.0).contains(&entry.confidence) {
                return Err(anyhow::anyhow!(
                    "learned.entries[{index}].confidence must be within [0, 1]"
                ));
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .server
            .bind
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| anyhow::anyhow!("server.bind must be an IP address: {e}"))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    pub fn sqlite_path(&self) -> anyhow::Result<PathBuf> {
        let raw = self
            .learned
            .sqlite_path
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("learned.sqlite_path is not configured"))?;
        expand_home(raw)
    }
}

pub fn default_config_path() -> PathBuf {
    default_root().join("config.toml")
}

pub fn default_root() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".promptlight")
}

pub fn expand_home(path: &str) -> anyhow::Result<PathBuf> {
    let trimmed = path.trim().to_string();
    if !trimmed.starts_with("~/") {
        return Ok(PathBuf::from(trimmed));
    }
    let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
    Ok(PathBuf::from(trimmed.replacen("~", &home, 1)))
}
