//! Configuration loading for the kiosk gateway
//!
//! Configuration is a single TOML file, validated once at startup and
//! immutable thereafter. Secrets may be supplied from the environment
//! instead of the file (`KIOSK_ADMIN_PASSWORD`, `MQTT_PASSWORD`).
//!
//! ```toml
//! [mqtt]
//! host = "broker.local"
//! username = "gateway"
//!
//! [kiosk]
//! admin_password = "hunter2"
//!
//! [control_topics.night]
//! topic = "kiosks/control/night"
//! commands = [
//!     { command = "loadStartUrl" },
//!     { command = "screenOff" },
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::client::DEFAULT_ADMIN_PORT;
use crate::command::CommandSpec;
use crate::{Error, Result};

/// Default presence announcement topic filter
pub const DEFAULT_ANNOUNCE_TOPIC: &str = "fully/deviceInfo/+";

/// Kiosk gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// MQTT broker connection settings
    pub mqtt: MqttConfig,

    /// Kiosk fleet settings
    pub kiosk: KioskConfig,

    /// Named control topics, each bound to an ordered command list
    #[serde(default)]
    pub control_topics: BTreeMap<String, ControlTopicConfig>,
}

/// MQTT broker connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: String,

    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// Client identifier presented to the broker
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Broker username (optional)
    pub username: Option<String>,

    /// Broker password (optional; `MQTT_PASSWORD` env overrides)
    pub password: Option<String>,
}

/// Kiosk fleet settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KioskConfig {
    /// Remote admin password shared by all kiosks
    /// (`KIOSK_ADMIN_PASSWORD` env overrides)
    #[serde(default)]
    pub admin_password: String,

    /// Remote admin port, if the fleet uses a non-standard one
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,

    /// Announcement topic filter override
    #[serde(default = "default_announce_topic")]
    pub announce_topic: String,
}

/// One control topic binding
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlTopicConfig {
    /// MQTT topic whose messages trigger the command sequence
    pub topic: String,

    /// Commands to fan out, in order
    pub commands: Vec<CommandSpec>,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "kiosk-gateway".to_string()
}

const fn default_admin_port() -> u16 {
    DEFAULT_ADMIN_PORT
}

fn default_announce_topic() -> String {
    DEFAULT_ANNOUNCE_TOPIC.to_string()
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, if a control
    /// topic has no commands, or if no kiosk admin password is set.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        if let Ok(password) = std::env::var("KIOSK_ADMIN_PASSWORD") {
            config.kiosk.admin_password = password;
        }
        if let Ok(password) = std::env::var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.kiosk.admin_password.is_empty() {
            return Err(Error::Config(
                "kiosk admin password is not set ([kiosk].admin_password or KIOSK_ADMIN_PASSWORD)"
                    .to_string(),
            ));
        }
        for (name, control) in &self.control_topics {
            if control.commands.is_empty() {
                return Err(Error::Config(format!(
                    "control topic '{name}' has an empty command list"
                )));
            }
        }
        Ok(())
    }
}
