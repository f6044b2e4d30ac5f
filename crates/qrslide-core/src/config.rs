//! Configuration system for qrslide.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $QRSLIDE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/qrslide/config.toml
//!   3. ~/.config/qrslide/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrslideConfig {
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
    pub channel: ChannelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Delay between camera polls. One symbol is decoded per poll.
    pub frame_interval_ms: u64,
    /// Give up on a transfer after this long. 0 = never.
    pub transfer_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where completed incoming files are written.
    pub received_dir: PathBuf,
}

/// Noise applied by the simulated optical channel.
/// Rates are probabilities per captured frame, `0.0..=1.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Camera frame in which no symbol was decoded.
    pub miss_rate: f64,
    /// Symbol decoded with one byte corrupted.
    pub garble_rate: f64,
    /// Symbol decoded with its tail cut off.
    pub truncate_rate: f64,
    /// RNG seed, so noisy runs are reproducible.
    pub seed: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33, // ~30 fps
            transfer_timeout_secs: 600,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            received_dir: data_dir().join("received"),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            miss_rate: 0.2,
            garble_rate: 0.05,
            truncate_rate: 0.05,
            seed: 0x5eed,
        }
    }
}

impl CaptureConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// `None` when transfers may run forever.
    pub fn transfer_timeout(&self) -> Option<Duration> {
        (self.transfer_timeout_secs > 0).then(|| Duration::from_secs(self.transfer_timeout_secs))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("qrslide")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("qrslide")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl QrslideConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path())
    }

    /// Load from an explicit path, falling back to defaults if it is absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?
        } else {
            QrslideConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("QRSLIDE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&QrslideConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply QRSLIDE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QRSLIDE_CAPTURE__FRAME_INTERVAL_MS") {
            if let Ok(ms) = v.parse() {
                self.capture.frame_interval_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("QRSLIDE_STORAGE__RECEIVED_DIR") {
            self.storage.received_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("QRSLIDE_CHANNEL__MISS_RATE") {
            if let Ok(rate) = v.parse() {
                self.channel.miss_rate = rate;
            }
        }
        if let Ok(v) = std::env::var("QRSLIDE_CHANNEL__SEED") {
            if let Ok(seed) = v.parse() {
                self.channel.seed = seed;
            }
        }
    }
}
