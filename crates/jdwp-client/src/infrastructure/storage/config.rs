//! TOML-based configuration for the client binary.
//!
//! The file is optional: every field has a default, and a missing file
//! yields [`AppConfig::default()`].  Command-line flags are applied on top
//! of whatever this module loads (see `main.rs`).
//!
//! # Example file
//!
//! ```toml
//! log_level = "debug"
//!
//! [target]
//! host = "10.0.0.7"
//! port = 8000
//!
//! [timeouts]
//! connect_ms = 5000
//! read_ms = 2000
//! write_ms = 2000
//!
//! [session]
//! verify_handshake = true
//!
//! # Only needed for VMs that misreport their identifier widths.
//! [id_sizes]
//! object_id = 4
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a file only has to mention
//! what it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jdwp_core::IdSizes;
use jdwp_session::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_EVENT_QUEUE_CAPACITY, DEFAULT_HANDSHAKE_TIMEOUT,
    DEFAULT_HOST, DEFAULT_IO_TIMEOUT, DEFAULT_PORT, DEFAULT_SUBMIT_QUEUE_CAPACITY,
};
use jdwp_session::SessionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but a value is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"jdwp_session=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub session: QueueConfig,
    /// Identifier widths to use instead of asking the VM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_sizes: Option<IdSizes>,
}

/// Where the target VM listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Timeouts in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_ms")]
    pub connect_ms: u64,
    #[serde(default = "default_handshake_ms")]
    pub handshake_write_ms: u64,
    #[serde(default = "default_handshake_ms")]
    pub handshake_read_ms: u64,
    /// Bound on receiving the rest of a packet once it has started.
    #[serde(default = "default_io_ms")]
    pub read_ms: u64,
    #[serde(default = "default_io_ms")]
    pub write_ms: u64,
}

/// Queue sizes and handshake strictness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueConfig {
    #[serde(default = "default_submit_queue_capacity")]
    pub submit_queue_capacity: usize,
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
    #[serde(default = "default_true")]
    pub verify_handshake: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_connect_ms() -> u64 {
    millis(DEFAULT_CONNECT_TIMEOUT)
}
fn default_handshake_ms() -> u64 {
    millis(DEFAULT_HANDSHAKE_TIMEOUT)
}
fn default_io_ms() -> u64 {
    millis(DEFAULT_IO_TIMEOUT)
}
fn default_submit_queue_capacity() -> usize {
    DEFAULT_SUBMIT_QUEUE_CAPACITY
}
fn default_event_queue_capacity() -> usize {
    DEFAULT_EVENT_QUEUE_CAPACITY
}
fn default_true() -> bool {
    true
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            target: TargetConfig::default(),
            timeouts: TimeoutConfig::default(),
            session: QueueConfig::default(),
            id_sizes: None,
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_ms(),
            handshake_write_ms: default_handshake_ms(),
            handshake_read_ms: default_handshake_ms(),
            read_ms: default_io_ms(),
            write_ms: default_io_ms(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            submit_queue_capacity: default_submit_queue_capacity(),
            event_queue_capacity: default_event_queue_capacity(),
            verify_handshake: default_true(),
        }
    }
}

impl AppConfig {
    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.port == 0 {
            return Err(ConfigError::Invalid("target.port must not be 0".into()));
        }
        if self.session.submit_queue_capacity == 0 || self.session.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue capacities must be at least 1".into(),
            ));
        }
        if let Some(sizes) = &self.id_sizes {
            sizes
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("id_sizes: {e}")))?;
        }
        Ok(())
    }

    /// Builds the transport settings.
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            host: self.target.host.clone(),
            port: self.target.port,
            connect_timeout: Duration::from_millis(self.timeouts.connect_ms),
            handshake_write_timeout: Duration::from_millis(self.timeouts.handshake_write_ms),
            handshake_read_timeout: Duration::from_millis(self.timeouts.handshake_read_ms),
            read_timeout: Duration::from_millis(self.timeouts.read_ms),
            write_timeout: Duration::from_millis(self.timeouts.write_ms),
            submit_queue_capacity: self.session.submit_queue_capacity,
            event_queue_capacity: self.session.event_queue_capacity,
            verify_handshake: self.session.verify_handshake,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses and validates a config document.
///
/// # Errors
///
/// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`] for
/// out-of-range values.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and the errors of [`parse_config`] for bad content.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_session_defaults() {
        // Arrange / Act
        let session = AppConfig::default().to_session_config();

        // Assert
        assert_eq!(session, SessionConfig::default());
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let doc = "[target]\nport = 8000\n\n[timeouts]\nread_ms = 250\n";

        // Act
        let cfg = parse_config(doc).unwrap();
        let session = cfg.to_session_config();

        // Assert
        assert_eq!(session.host, "127.0.0.1");
        assert_eq!(session.port, 8000);
        assert_eq!(session.read_timeout, Duration::from_millis(250));
        assert_eq!(session.write_timeout, DEFAULT_IO_TIMEOUT);
    }

    #[test]
    fn test_id_sizes_section_fills_missing_widths_with_eight() {
        let cfg = parse_config("[id_sizes]\nobject_id = 4\n").unwrap();

        let sizes = cfg.id_sizes.unwrap();

        assert_eq!(sizes.object_id, 4);
        assert_eq!(sizes.frame_id, 8);
    }

    #[test]
    fn test_out_of_range_id_width_is_invalid() {
        let result = parse_config("[id_sizes]\nobject_id = 9\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_port_is_invalid() {
        let result = parse_config("[target]\nport = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = parse_config("[target\nport = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_disabling_handshake_verification() {
        let cfg = parse_config("[session]\nverify_handshake = false\n").unwrap();
        assert!(!cfg.to_session_config().verify_handshake);
    }

    #[test]
    fn test_load_config_missing_file_returns_defaults() {
        // Arrange
        let path = std::env::temp_dir().join("jdwp-client-test-does-not-exist.toml");

        // Act
        let cfg = load_config(&path).unwrap();

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!(
            "jdwp-client-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();

        // Act
        let cfg = load_config(&path);
        let _ = std::fs::remove_file(&path);

        // Assert
        assert_eq!(cfg.unwrap().log_level, "debug");
    }

    #[test]
    fn test_app_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.target.host = "10.0.0.7".to_string();
        cfg.id_sizes = Some(IdSizes {
            object_id: 4,
            ..IdSizes::default()
        });

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }
}
