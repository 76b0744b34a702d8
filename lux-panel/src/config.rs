//! Panel receiver configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the panel receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Panel geometry and pixel format.
    pub panel: MatrixConfig,
    /// Reassembly behavior.
    pub protocol: ProtocolConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// UDP listen address for incoming chunks.
    pub listen: String,
}

/// Panel geometry and pixel format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Panel width in pixels.
    pub width: usize,
    /// Panel height in pixels.
    pub height: usize,
    /// Wire pixel encoding: "packed565" or "raw24".
    pub encoding: String,
}

/// Reassembly behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Clear a stuck partial frame after this many milliseconds.
    /// Zero disables the timeout.
    pub stale_after_ms: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            panel: MatrixConfig::default(),
            protocol: ProtocolConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:44444".into(),
        }
    }
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            encoding: "packed565".into(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self { stale_after_ms: 0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl PanelConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let cfg = Self::default();
        let text = toml::to_string_pretty(&cfg)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, text)
    }
}

impl ProtocolConfig {
    /// The staleness timeout, `None` when disabled.
    pub fn stale_after(&self) -> Option<Duration> {
        (self.stale_after_ms > 0).then(|| Duration::from_millis(self.stale_after_ms))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = PanelConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("listen"));
        assert!(text.contains("width"));
        assert!(text.contains("stale_after_ms"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = PanelConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: PanelConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.panel.width, 32);
        assert_eq!(parsed.panel.encoding, "packed565");
        assert_eq!(parsed.network.listen, "0.0.0.0:44444");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: PanelConfig = toml::from_str("[panel]\nwidth = 64\n").unwrap();
        assert_eq!(parsed.panel.width, 64);
        assert_eq!(parsed.panel.height, 32);
        assert_eq!(parsed.network.listen, "0.0.0.0:44444");
    }

    #[test]
    fn stale_after_zero_disables() {
        assert_eq!(ProtocolConfig { stale_after_ms: 0 }.stale_after(), None);
        assert_eq!(
            ProtocolConfig {
                stale_after_ms: 250
            }
            .stale_after(),
            Some(Duration::from_millis(250))
        );
    }
}
