use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine settings, optionally loaded from a TOML file given with `--config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timeout for establishing the connection. Streaming itself has no deadline.
    pub connect_timeout_secs: u64,
    /// Upper bound on the size of a single file write.
    pub chunk_size: usize,
    /// Extension appended to every sanitized title.
    pub extension: String,
    pub user_agent: String,
    /// Honor HTTP(S)_PROXY from the environment.
    pub use_system_proxy: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            chunk_size: 8192,
            extension: "mp4".to_string(),
            user_agent: concat!("vdl/", env!("CARGO_PKG_VERSION")).to_string(),
            use_system_proxy: true,
        }
    }
}

impl EngineConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let cfg: EngineConfig =
            toml::from_str(&data).with_context(|| format!("Invalid config file: {:?}", path))?;
        tracing::debug!(?cfg, "loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
