//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML or JSON and
//! carries the database, storage, tool, processing and notification
//! sections. Every section defaults sensibly so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub tools: ToolsConfig,
    pub processing: ProcessingConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Read and parse a config file. `.toml` files are parsed as TOML,
    /// anything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            _ => Self::from_json(&contents),
        }
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match Self::from_file(path) {
            Ok(cfg) => cfg,
            Err(Error::Io { source }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Apply the encoder environment overrides (`FFMPEG_BINARIES`,
    /// `FFPROBE_BINARIES`, `FFMPEG_TIMEOUT`, `FFMPEG_THREADS`).
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FFMPEG_BINARIES").filter(|v| !v.is_empty()) {
            self.tools.ffmpeg_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FFPROBE_BINARIES").filter(|v| !v.is_empty()) {
            self.tools.ffprobe_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FFMPEG_TIMEOUT") {
            match v.parse() {
                Ok(secs) => self.tools.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid FFMPEG_TIMEOUT value '{v}'"),
            }
        }
        if let Some(v) = lookup("FFMPEG_THREADS") {
            match v.parse() {
                Ok(threads) => self.tools.threads = threads,
                Err(_) => tracing::warn!("Ignoring invalid FFMPEG_THREADS value '{v}'"),
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.storage.disks.is_empty() {
            warnings.push("storage.disks is empty; no videos can be resolved".into());
        } else if !self.storage.disks.contains_key(&self.storage.default_disk) {
            warnings.push(format!(
                "storage.default_disk '{}' is not one of the configured disks",
                self.storage.default_disk
            ));
        }

        if self.tools.timeout_secs == 0 {
            warnings.push("tools.timeout_secs is 0; probe and encode calls run without a limit".into());
        }

        if self.tools.threads == 0 {
            warnings.push("tools.threads is 0; ffmpeg will pick its own thread count".into());
        }

        if self.processing.max_parallel_renditions == 0 {
            warnings.push("processing.max_parallel_renditions is 0; treated as 1".into());
        }

        if self.processing.worker_concurrency == 0 {
            warnings.push("processing.worker_concurrency is 0; treated as 1".into());
        }

        if let Some(ref url) = self.notifications.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(format!(
                    "notifications.webhook_url '{url}' is not an http(s) URL"
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// SQLite database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/videoladder.db"),
        }
    }
}

/// Named storage disks, each mapped to a root directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub disks: BTreeMap<String, PathBuf>,
    pub default_disk: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let mut disks = BTreeMap::new();
        disks.insert("local".to_string(), PathBuf::from("./data/storage"));
        Self {
            disks,
            default_disk: "local".into(),
        }
    }
}

/// Encoder binaries and invocation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    /// Upper bound on a single probe or encode invocation; 0 means no limit.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Thread hint passed to ffmpeg.
    #[serde(default = "default_threads")]
    pub threads: u32,
}

fn default_timeout_secs() -> u64 {
    3600
}
fn default_threads() -> u32 {
    12
}

impl ToolsConfig {
    /// The per-invocation limit, or `None` when `timeout_secs` is 0.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_timeout_secs(),
            threads: default_threads(),
        }
    }
}

/// Rendition processing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
    #[serde(default = "default_one")]
    pub max_parallel_renditions: usize,
    #[serde(default = "default_one")]
    pub worker_concurrency: usize,
    /// Mark a job `failed` when renditions were planned but none succeeded.
    pub fail_when_no_renditions_succeed: bool,
}

fn default_audio_bitrate() -> u32 {
    160
}
fn default_one() -> usize {
    1
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            audio_bitrate_kbps: default_audio_bitrate(),
            max_parallel_renditions: default_one(),
            worker_concurrency: default_one(),
            fail_when_no_renditions_succeed: false,
        }
    }
}

/// Completion notification delivery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
}
