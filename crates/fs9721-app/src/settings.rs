use anyhow::{bail, Context, Result};
use fs9721_core::SerialConfig;
use fs9721_decode::DmmConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persistent defaults, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: Option<String>,
    pub retries: u32,
    pub timeout_secs: f64,
    pub dtr: Option<bool>,
    pub rts: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        let serial = SerialConfig::default();
        let dmm = DmmConfig::default();
        Self {
            port: None,
            retries: dmm.retries,
            timeout_secs: dmm.timeout.as_secs_f64(),
            dtr: serial.dtr,
            rts: serial.rts,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fs9721").join("settings.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// An explicit path must exist; the default location is optional.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn apply_overrides(&mut self, port: Option<String>, retries: Option<u32>, timeout_secs: Option<f64>) {
        if port.is_some() {
            self.port = port;
        }
        if let Some(r) = retries {
            self.retries = r;
        }
        if let Some(t) = timeout_secs {
            self.timeout_secs = t;
        }
    }

    pub fn dmm_config(&self) -> Result<DmmConfig> {
        if self.retries == 0 {
            bail!("retries must be at least 1");
        }
        if !(self.timeout_secs > 0.0) {
            bail!("timeout must be positive, got {}", self.timeout_secs);
        }
        let timeout = Duration::try_from_secs_f64(self.timeout_secs)
            .with_context(|| format!("timeout out of range: {}", self.timeout_secs))?;
        Ok(DmmConfig { retries: self.retries, timeout })
    }

    pub fn serial_config(&self, port: &str) -> SerialConfig {
        SerialConfig {
            dtr: self.dtr,
            rts: self.rts,
            ..SerialConfig::for_port(port)
        }
    }
}
