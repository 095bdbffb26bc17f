//! Kiosk Gateway - MQTT control bridge for Fully Kiosk Browser fleets
//!
//! This library provides the core functionality for the kiosk gateway:
//! - Live kiosk presence registry with TTL eviction
//! - HTTP client for the Fully Kiosk remote admin API
//! - Command fan-out dispatchers bound to MQTT control topics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  MQTT Broker                        │
//! │   fully/deviceInfo/+   │   control topics           │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Kiosk Gateway                        │
//! │   Registry  │  Dispatchers  │  Kiosk HTTP Client    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        Fully Kiosk Browser devices (port 2323)      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Kiosks announce themselves periodically on the announcement topic and are
//! tracked by the [`KioskRegistry`]. A message arriving on a control topic
//! triggers its [`Dispatcher`], which fans the configured command sequence
//! out to every currently-live kiosk over HTTP.

pub mod client;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mqtt;
pub mod registry;

pub use client::{CommandInvoker, CommandOutcome, KioskClient, DEFAULT_ADMIN_PORT};
pub use command::{CommandSpec, KioskCommand};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use mqtt::Bridge;
pub use registry::{KioskAnnouncement, KioskEndpoint, KioskRegistry, KIOSK_TTL};
