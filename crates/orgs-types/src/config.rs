//! Server configuration
//!
//! [`Config`] is an owned value type: every section holds its own data, so a
//! clone never shares anything with the original. Per-org configurations are
//! produced from the root one by [`crate::derive`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default interval between reconciliation passes
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 10;

/// Root or per-org configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Org this config belongs to (empty for root)
    pub org_id: String,
    /// Name of the org this config belongs to
    pub org_name: String,
    /// Client-facing section; shipped to clients, never carries the org id
    pub client: Option<ClientConfig>,
    /// Durable storage locations; absent for client/tool deployments
    pub datastore: Option<DatastoreConfig>,
    /// Log output settings
    pub logging: Option<LoggingConfig>,
    /// Org manager settings
    pub org_manager: OrgManagerConfig,
}

/// Client-facing configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Opaque nonce identifying the client's org
    pub nonce: String,
    /// Server endpoints the client connects to
    pub server_urls: Vec<String>,
    /// Where the client writes back its local state
    pub writeback_path: String,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    /// Backend name (`FileBaseDataStore` or `Memory`)
    pub implementation: String,
    /// Root directory of the datastore
    pub location: String,
    /// Root directory for bulk file storage
    pub filestore_directory: String,
}

impl DatastoreConfig {
    /// Does this config ask for the in-memory backend
    #[inline]
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.implementation.eq_ignore_ascii_case("memory")
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Org manager settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgManagerConfig {
    /// Seconds between reconciliation passes
    pub scan_interval_secs: u64,
}

impl OrgManagerConfig {
    /// Scan interval as a duration
    #[inline]
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}

impl Default for OrgManagerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Parse and validate a YAML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for malformed YAML, [`ConfigError::Invalid`]
    /// when validation fails
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a YAML config file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_yaml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_yaml_str(&source)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// [`ConfigError::Parse`] if serialization fails
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check a root configuration
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if the config is already stamped with an org
    /// or the scan interval is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.org_id.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "root config must not carry an org id (found '{}')",
                self.org_id
            )));
        }
        if self.org_manager.scan_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "org_manager.scan_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Client nonce of this config, if a client section exists
    #[must_use]
    pub fn client_nonce(&self) -> Option<&str> {
        self.client.as_ref().map(|c| c.nonce.as_str())
    }

    /// Is durable storage configured
    #[inline]
    #[must_use]
    pub fn has_datastore(&self) -> bool {
        self.datastore.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
client:
  nonce: root-nonce
  server_urls:
    - https://frontend:8000/
datastore:
  implementation: FileBaseDataStore
  location: /var/lib/orgs
  filestore_directory: /var/lib/orgs/files
logging:
  level: debug
";

    #[test]
    fn parse_sample() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.client_nonce(), Some("root-nonce"));
        let ds = config.datastore.as_ref().unwrap();
        assert_eq!(ds.location, "/var/lib/orgs");
        assert!(!ds.is_memory());
        assert_eq!(config.logging.unwrap().level, "debug");
        assert_eq!(
            config.org_manager.scan_interval(),
            Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS)
        );
    }

    #[test]
    fn empty_document_is_tool_mode() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert!(!config.has_datastore());
        assert_eq!(config.client_nonce(), None);
    }

    #[test]
    fn rejects_zero_interval() {
        let err = Config::from_yaml_str("org_manager:\n  scan_interval_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_stamped_root() {
        let err = Config::from_yaml_str("org_id: O1\n").unwrap_err();
        assert!(err.to_string().contains("org id"));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = Config::from_yaml_str("client: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn yaml_roundtrip() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        let back = Config::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
