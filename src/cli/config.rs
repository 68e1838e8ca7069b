//! Tether configuration file handling.
//!
//! Operator settings only: where the device store lives, which gateway to
//! talk to, how much to log, how many chats to sample. TOML, stored adjacent
//! to the device store, generated with commented defaults on first run.
//! Everything account-side (session keys, device registry) belongs to the
//! gateway and never appears here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tether::gateway::GatewaySettings;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default bound on the recent-chat sample
const DEFAULT_MAX_RECENT: usize = 5;

/// Tether client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TetherConfig {
    /// Gateway connection and store location
    pub gateway: GatewaySection,

    /// Recent-chat sampling
    #[serde(default)]
    pub chats: ChatsSection,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Gateway-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySection {
    /// Path to the device store database
    pub store_path: PathBuf,

    /// Gateway URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Socket.IO namespace for companion clients
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Device name shown in the account's linked-devices list
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

/// Recent-chat sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatsSection {
    /// Distinct conversations to sample before the record stops filling
    #[serde(default = "default_max_recent")]
    pub max_recent: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_url() -> String {
    "https://gateway.tether.dev".to_string()
}

fn default_namespace() -> String {
    "/client".to_string()
}

fn default_device_name() -> String {
    "tether-cli".to_string()
}

fn default_max_recent() -> usize {
    DEFAULT_MAX_RECENT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ChatsSection {
    fn default() -> Self {
        Self {
            max_recent: DEFAULT_MAX_RECENT,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl TetherConfig {
    /// Create a new configuration with the given store path
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            gateway: GatewaySection {
                store_path,
                url: default_url(),
                namespace: default_namespace(),
                device_name: default_device_name(),
            },
            chats: ChatsSection::default(),
            logging: LoggingSection::default(),
        }
    }

    /// Gateway settings for the production client
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            url: self.gateway.url.clone(),
            namespace: self.gateway.namespace.clone(),
            device_name: self.gateway.device_name.clone(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: TetherConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(store_path: &Path) -> String {
        format!(
            r#"# Tether Configuration
#
# Operator settings for this companion device: paths, gateway, logging.
# Account-side state (session keys, the device registry) lives on the
# gateway and is not configured here.

[gateway]
# Path to the local device store database
store_path = "{store_path}"

# Gateway URL
url = "{url}"

# Socket.IO namespace for companion clients
namespace = "/client"

# Device name shown in your account's linked-devices list
device_name = "tether-cli"

[chats]
# Distinct conversations to sample from the live message stream.
# Sampling is first-come: once this many are recorded, the list is fixed.
max_recent = {max_recent}

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/tether/tether.log"
"#,
            store_path = store_path.display(),
            url = default_url(),
            max_recent = DEFAULT_MAX_RECENT,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        store_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(store_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path based on the store path
///
/// The config file is stored adjacent to the device store:
/// - Store: ~/.local/share/tether/device.db
/// - Config: ~/.local/share/tether/config.toml
pub fn default_config_path(store_path: &Path) -> PathBuf {
    store_path
        .parent()
        .unwrap_or(store_path)
        .join("config.toml")
}

/// Get the default device store path
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tether")
        .join("device.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let store_path = PathBuf::from("/data/tether/device.db");
        let config = TetherConfig::new(store_path.clone());

        assert_eq!(config.gateway.store_path, store_path);
        assert_eq!(config.gateway.namespace, "/client");
        assert_eq!(config.chats.max_recent, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn save_and_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let store_path = PathBuf::from("/data/tether/device.db");

        let config = TetherConfig::new(store_path.clone());
        config.save(&config_path).unwrap();

        let loaded = TetherConfig::load(&config_path).unwrap();
        assert_eq!(loaded.gateway.store_path, store_path);
        assert_eq!(loaded.chats.max_recent, 5);
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn create_default_writes_loadable_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let store_path = temp_dir.path().join("device.db");

        TetherConfig::create_default(&config_path, &store_path).unwrap();

        assert!(config_path.exists());
        let config = TetherConfig::load(&config_path).unwrap();
        assert_eq!(config.gateway.store_path, store_path);
        assert_eq!(config.chats.max_recent, 5);
    }

    #[test]
    fn default_config_path_is_adjacent_to_store() {
        let store_path = PathBuf::from("/data/tether/device.db");
        assert_eq!(
            default_config_path(&store_path),
            PathBuf::from("/data/tether/config.toml")
        );
    }

    #[test]
    fn minimal_config_applies_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let minimal_config = r#"
[gateway]
store_path = "/tmp/device.db"
"#;
        fs::write(&config_path, minimal_config).unwrap();

        let config = TetherConfig::load(&config_path).unwrap();
        assert_eq!(config.gateway.url, "https://gateway.tether.dev");
        assert_eq!(config.gateway.device_name, "tether-cli");
        assert_eq!(config.chats.max_recent, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn gateway_settings_mirror_config() {
        let mut config = TetherConfig::new(PathBuf::from("/tmp/device.db"));
        config.gateway.url = "https://gw.example.net".to_string();

        let settings = config.gateway_settings();
        assert_eq!(settings.url, "https://gw.example.net");
        assert_eq!(settings.namespace, "/client");
        assert_eq!(settings.device_name, "tether-cli");
    }
}
