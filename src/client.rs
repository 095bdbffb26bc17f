//! HTTP client for the Fully Kiosk Browser remote admin interface
//!
//! Commands are plain GET requests against the kiosk's admin port:
//! `http://<address>:2323/?password=<secret>&type=json&cmd=<name>&<params...>`
//!
//! Every invocation resolves through [`CommandOutcome`] - transport errors,
//! undecodable bodies, and device-reported errors all arrive through the
//! same channel as success, so fan-out callers never need per-call error
//! handling.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::Result;
use crate::command::KioskCommand;

/// Default Fully Kiosk remote admin port
pub const DEFAULT_ADMIN_PORT: u16 = 2323;

/// Connect timeout for device calls; there is no request-level retry
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of one remote command invocation
#[derive(Debug)]
pub enum CommandOutcome {
    /// Decoded response object from the kiosk
    Success(Map<String, Value>),

    /// The request never produced a response (refused, timeout, DNS)
    Transport(reqwest::Error),

    /// The response body was not a flat JSON object
    Malformed(serde_json::Error),

    /// The kiosk answered with `status == "Error"`; carries its `statustext`
    Device(String),
}

impl CommandOutcome {
    /// Whether the invocation succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Seam for issuing one remote command to one kiosk
///
/// The dispatcher fans out through this trait; tests substitute an
/// instrumented implementation.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    /// Send `command` to the kiosk at `address`, appending `params` as
    /// extra query parameters. Always resolves - never returns through a
    /// synchronous error path.
    async fn invoke(
        &self,
        command: KioskCommand,
        address: &str,
        params: &BTreeMap<String, Value>,
    ) -> CommandOutcome;
}

/// HTTP client for the kiosk remote admin API
pub struct KioskClient {
    http: Client,
    admin_password: String,
    admin_port: u16,
}

impl KioskClient {
    /// Create a client targeting the default admin port
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be constructed
    pub fn new(admin_password: String) -> Result<Self> {
        Self::with_port(admin_password, DEFAULT_ADMIN_PORT)
    }

    /// Create a client targeting a non-standard admin port
    ///
    /// Fully Kiosk allows the remote admin port to be reconfigured on the
    /// device; all kiosks in the fleet are assumed to share one port.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be constructed
    pub fn with_port(admin_password: String, admin_port: u16) -> Result<Self> {
        let http = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            http,
            admin_password,
            admin_port,
        })
    }

    fn query_pairs(
        &self,
        command: KioskCommand,
        params: &BTreeMap<String, Value>,
    ) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("password".to_string(), self.admin_password.clone()),
            ("type".to_string(), "json".to_string()),
            ("cmd".to_string(), command.wire_name().to_string()),
        ];
        for (key, value) in params {
            pairs.push((key.clone(), query_value(value)));
        }
        pairs
    }
}

/// Serialize a parameter value for the query string
///
/// Strings are used verbatim; everything else falls back to its JSON text
/// form (`50`, `true`, ...).
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl CommandInvoker for KioskClient {
    async fn invoke(
        &self,
        command: KioskCommand,
        address: &str,
        params: &BTreeMap<String, Value>,
    ) -> CommandOutcome {
        let url = format!("http://{address}:{port}/", port = self.admin_port);
        let request = self.http.get(&url).query(&self.query_pairs(command, params));

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return CommandOutcome::Transport(e),
        };
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return CommandOutcome::Transport(e),
        };

        let object: Map<String, Value> = match serde_json::from_str(&body) {
            Ok(object) => object,
            Err(e) => return CommandOutcome::Malformed(e),
        };

        if object.get("status").and_then(Value::as_str) == Some("Error") {
            let message = object
                .get("statustext")
                .and_then(Value::as_str)
                .unwrap_or("unknown device error")
                .to_string();
            return CommandOutcome::Device(message);
        }

        CommandOutcome::Success(object)
    }
}
