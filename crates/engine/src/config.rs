//! Engine configuration.
//!
//! Configuration is stored as TOML, at the path named by `STOWAGE_CONFIG`
//! or else in the platform config directory:
//! - Linux: `$XDG_CONFIG_HOME/stowage/engine.toml` (or `~/.config/...`)
//! - Windows: `%APPDATA%/stowage/engine.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stowage_remote::UpdatePolicy;
use stowage_transfer::{
    AdmissionPolicy, CostModel, DEFAULT_CHUNK_SIZE, DEFAULT_STORAGE_CEILING, RetryPolicy,
};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "STOWAGE_CONFIG";

/// Errors loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no config directory for this platform")]
    NoConfigDir,
}

/// Transfer engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chunk size bound, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Exclusive upper bound on store usage, in bytes.
    #[serde(default = "default_storage_ceiling")]
    pub storage_ceiling: u64,

    /// Rounds the retry executor runs per fan-out.
    #[serde(default = "default_retry_rounds")]
    pub retry_rounds: u32,

    /// Resend rounds per upload after the first submission.
    #[serde(default = "default_upload_retries")]
    pub upload_retries: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Visibility checks per round on top of `ceil(chunks / 2)`.
    #[serde(default = "default_poll_extra_attempts")]
    pub poll_extra_attempts: u64,

    /// Status checks before a management update is reported unresolved.
    #[serde(default = "default_update_attempts")]
    pub update_attempts: u32,

    #[serde(default = "default_throttle_batch")]
    pub throttle_batch: usize,

    #[serde(default = "default_throttle_pause_ms")]
    pub throttle_pause_ms: u64,

    /// Largest accepted listing page.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    #[serde(default)]
    pub cost: CostConfig,

    /// Root of the ticker price endpoint.
    #[serde(default = "default_price_endpoint")]
    pub price_endpoint: String,
}

/// Cost constants, in the store's cost unit. TOML integers are 64-bit,
/// so these widen when building the admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_byte_write_cost")]
    pub byte_write_cost: u64,

    #[serde(default = "default_ingress_message_cost")]
    pub ingress_message_cost: u64,

    #[serde(default = "default_gib_second_rent")]
    pub gib_second_rent: u64,

    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_storage_ceiling() -> u64 {
    DEFAULT_STORAGE_CEILING
}
fn default_retry_rounds() -> u32 {
    3
}
fn default_upload_retries() -> u32 {
    3
}
fn default_poll_interval_ms() -> u64 {
    2_000
}
fn default_poll_extra_attempts() -> u64 {
    10
}
fn default_update_attempts() -> u32 {
    10
}
fn default_throttle_batch() -> usize {
    30
}
fn default_throttle_pause_ms() -> u64 {
    2_000
}
fn default_max_page_size() -> u32 {
    5_000
}
fn default_price_endpoint() -> String {
    "https://data.binance.com/api/v3".into()
}
fn default_byte_write_cost() -> u64 {
    2_260
}
fn default_ingress_message_cost() -> u64 {
    1_200_000
}
fn default_gib_second_rent() -> u64 {
    127_000
}
fn default_retention_days() -> u64 {
    40
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            byte_write_cost: default_byte_write_cost(),
            ingress_message_cost: default_ingress_message_cost(),
            gib_second_rent: default_gib_second_rent(),
            retention_days: default_retention_days(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            storage_ceiling: default_storage_ceiling(),
            retry_rounds: default_retry_rounds(),
            upload_retries: default_upload_retries(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_extra_attempts: default_poll_extra_attempts(),
            update_attempts: default_update_attempts(),
            throttle_batch: default_throttle_batch(),
            throttle_pause_ms: default_throttle_pause_ms(),
            max_page_size: default_max_page_size(),
            cost: CostConfig::default(),
            price_endpoint: default_price_endpoint(),
        }
    }
}

impl EngineConfig {
    /// Loads from the default location, falling back to defaults when
    /// no file exists there.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            storage_ceiling: self.storage_ceiling,
            cost: CostModel {
                byte_write_cost: self.cost.byte_write_cost.into(),
                ingress_message_cost: self.cost.ingress_message_cost.into(),
                gib_second_rent: self.cost.gib_second_rent.into(),
                retention_secs: self.cost.retention_days.saturating_mul(SECS_PER_DAY),
            },
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_rounds: self.retry_rounds,
            throttle_batch: self.throttle_batch,
            throttle_pause: Duration::from_millis(self.throttle_pause_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Visibility checks per round for an object of `chunks` chunks.
    pub fn poll_attempts(&self, chunks: u64) -> u64 {
        chunks.div_ceil(2) + self.poll_extra_attempts
    }

    /// Status polling budget for management updates.
    pub fn update_policy(&self) -> UpdatePolicy {
        UpdatePolicy {
            interval: self.poll_interval(),
            max_attempts: self.update_attempts.max(1),
        }
    }
}

/// Returns the config file path: `STOWAGE_CONFIG` if set, else the
/// platform default.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    config_dir()
        .map(|d| d.join("stowage").join("engine.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
