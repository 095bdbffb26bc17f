//! Command fan-out dispatcher for one control topic
//!
//! Commands in a sequence are often semantically ordered (clear the cache
//! before loading a URL), so a full barrier separates consecutive commands.
//! Within one command the kiosks race independently - a stuck kiosk delays
//! the next command but never blocks its siblings, and individual failures
//! never abort the rest of the fan-out.

use std::sync::Arc;

use futures::future::join_all;

use crate::client::{CommandInvoker, CommandOutcome};
use crate::command::CommandSpec;
use crate::registry::{KioskEndpoint, KioskRegistry};

/// Fans a configured command sequence out to every live kiosk
///
/// One dispatcher is bound to exactly one control topic and its ordered
/// command list. The payload of a trigger message is ignored - arrival
/// itself runs the sequence.
pub struct Dispatcher {
    topic: String,
    specs: Vec<CommandSpec>,
    registry: Arc<KioskRegistry>,
    invoker: Arc<dyn CommandInvoker>,
}

impl Dispatcher {
    /// Create a dispatcher bound to `topic` with an ordered command list
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        specs: Vec<CommandSpec>,
        registry: Arc<KioskRegistry>,
        invoker: Arc<dyn CommandInvoker>,
    ) -> Self {
        Self {
            topic: topic.into(),
            specs,
            registry,
            invoker,
        }
    }

    /// The control topic this dispatcher is bound to
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Run the bound command sequence once
    ///
    /// Specs execute strictly in configured order: for each one, a fresh
    /// registry snapshot is taken, the command is sent to every kiosk in it
    /// concurrently, and all of those calls settle before the next spec
    /// starts. An empty snapshot completes the step immediately. A step
    /// whose fan-out failed on every kiosk does not short-circuit the
    /// remaining steps.
    pub async fn handle_trigger(&self) {
        tracing::debug!(topic = %self.topic, "control trigger received");

        for spec in &self.specs {
            let kiosks = self.registry.live_snapshot();
            if kiosks.is_empty() {
                tracing::debug!(
                    topic = %self.topic,
                    command = %spec.command,
                    "no live kiosks, nothing to send"
                );
                continue;
            }

            // Full barrier: every call settles before the next spec starts.
            join_all(kiosks.iter().map(|kiosk| self.send_to(spec, kiosk))).await;

            tracing::debug!(
                topic = %self.topic,
                command = %spec.command,
                kiosks = kiosks.len(),
                "command fan-out settled"
            );
        }
    }

    async fn send_to(&self, spec: &CommandSpec, kiosk: &KioskEndpoint) {
        tracing::debug!(
            command = %spec.command,
            kiosk = %kiosk.display_name,
            address = %kiosk.address,
            "sending command"
        );

        match self
            .invoker
            .invoke(spec.command, &kiosk.address, &spec.params)
            .await
        {
            CommandOutcome::Success(reply) => {
                tracing::debug!(
                    command = %spec.command,
                    kiosk = %kiosk.display_name,
                    address = %kiosk.address,
                    reply = ?reply,
                    "kiosk replied"
                );
            }
            CommandOutcome::Transport(e) => {
                tracing::warn!(
                    command = %spec.command,
                    kiosk = %kiosk.display_name,
                    address = %kiosk.address,
                    error = %e,
                    "transport failure sending command"
                );
            }
            CommandOutcome::Malformed(e) => {
                tracing::warn!(
                    command = %spec.command,
                    kiosk = %kiosk.display_name,
                    address = %kiosk.address,
                    error = %e,
                    "kiosk response body was not valid JSON"
                );
            }
            CommandOutcome::Device(message) => {
                tracing::warn!(
                    command = %spec.command,
                    kiosk = %kiosk.display_name,
                    address = %kiosk.address,
                    message,
                    "kiosk reported an error"
                );
            }
        }
    }
}
