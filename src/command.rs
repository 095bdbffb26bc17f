//! Remote command vocabulary for the Fully Kiosk Browser REST interface
//!
//! Full list of Fully Kiosk commands: <https://www.fully-kiosk.com/en/#rest>

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// A remote command understood by the kiosk's REST interface
///
/// Configuration files name commands by their wire form (e.g. `clearCache`,
/// `loadStartUrl`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KioskCommand {
    /// Query device status, battery, screen state, etc.
    GetDeviceInfo,
    /// Clear the browser cache
    ClearCache,
    /// Clear browser cookies
    ClearCookies,
    /// Clear web storage (`localStorage`, `sessionStorage`)
    ClearWebStorage,
    /// Close the current tab
    CloseTab,
    /// Focus a tab
    FocusTab,
    /// Put the device to sleep
    ForceSleep,
    /// Load the configured start URL
    LoadStartUrl,
    /// Load an arbitrary URL (`url` parameter)
    LoadUrl,
    /// Reload the current tab
    RefreshTab,
    /// Turn the screen on
    ScreenOn,
    /// Turn the screen off
    ScreenOff,
    /// Simulate a motion detection event
    TriggerMotion,
}

impl KioskCommand {
    /// Wire name sent in the `cmd` query parameter
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::GetDeviceInfo => "getDeviceInfo",
            Self::ClearCache => "clearCache",
            Self::ClearCookies => "clearCookies",
            Self::ClearWebStorage => "clearWebStorage",
            Self::CloseTab => "closeTab",
            Self::FocusTab => "focusTab",
            Self::ForceSleep => "forceSleep",
            Self::LoadStartUrl => "loadStartUrl",
            Self::LoadUrl => "loadUrl",
            Self::RefreshTab => "refreshTab",
            Self::ScreenOn => "screenOn",
            Self::ScreenOff => "screenOff",
            Self::TriggerMotion => "triggerMotion",
        }
    }
}

impl fmt::Display for KioskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One configured command with its static parameters
///
/// Owned by the [`Dispatcher`](crate::Dispatcher) bound to a control topic;
/// shared read-only across all fan-out runs triggered on that topic.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// The command to send
    pub command: KioskCommand,

    /// Extra query parameters appended to the request (e.g. `url` for
    /// `loadUrl`). Non-string values are serialized to their JSON text form.
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_deserialize_from_wire_names() {
        let cmd: KioskCommand = serde_json::from_str("\"clearWebStorage\"").unwrap();
        assert_eq!(cmd, KioskCommand::ClearWebStorage);

        let cmd: KioskCommand = serde_json::from_str("\"loadStartUrl\"").unwrap();
        assert_eq!(cmd, KioskCommand::LoadStartUrl);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let result: Result<KioskCommand, _> = serde_json::from_str("\"selfDestruct\"");
        assert!(result.is_err());
    }

    #[test]
    fn wire_name_round_trips_through_display() {
        assert_eq!(KioskCommand::ScreenOff.to_string(), "screenOff");
        assert_eq!(KioskCommand::GetDeviceInfo.wire_name(), "getDeviceInfo");
    }

    #[test]
    fn spec_params_default_to_empty() {
        let spec: CommandSpec = serde_json::from_str(r#"{"command": "refreshTab"}"#).unwrap();
        assert_eq!(spec.command, KioskCommand::RefreshTab);
        assert!(spec.params.is_empty());
    }
}
