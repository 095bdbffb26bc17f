//! MQTT transport wiring
//!
//! Connects to the broker, subscribes to the announcement topic and every
//! configured control topic, feeds announcements into the registry, and
//! forwards control triggers to their dispatchers.
//!
//! Trigger handling for one topic is serialized on a dedicated task, so two
//! command sequences for the same topic never overlap. Distinct topics run
//! concurrently, and a long fan-out never blocks the MQTT event loop.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;

use crate::config::MqttConfig;
use crate::dispatcher::Dispatcher;
use crate::registry::KioskRegistry;
use crate::{Error, Result};

/// Delay before re-polling after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Keep-alive interval presented to the broker
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Pending triggers buffered per control topic while a sequence is draining
const TRIGGER_BUFFER: usize = 8;

/// MQTT bridge between the broker and the gateway components
pub struct Bridge {
    client: AsyncClient,
    event_loop: EventLoop,
    registry: Arc<KioskRegistry>,
    announce_topic: String,
    controls: Vec<ControlBinding>,
}

/// Handle to one dispatcher's serialized trigger queue
struct ControlBinding {
    topic: String,
    trigger_tx: mpsc::Sender<()>,
}

impl Bridge {
    /// Create a bridge and spawn one trigger-handling task per dispatcher
    #[must_use]
    pub fn new(
        config: &MqttConfig,
        announce_topic: String,
        registry: Arc<KioskRegistry>,
        dispatchers: Vec<Dispatcher>,
    ) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.host.clone(),
            config.port,
        );
        options.set_keep_alive(KEEP_ALIVE);
        if let Some(username) = &config.username {
            options.set_credentials(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            );
        }

        let (client, event_loop) = AsyncClient::new(options, 64);

        let controls = dispatchers
            .into_iter()
            .map(|dispatcher| {
                let topic = dispatcher.topic().to_string();
                let (trigger_tx, mut trigger_rx) = mpsc::channel(TRIGGER_BUFFER);

                // One task per topic: triggers drain strictly one at a time.
                tokio::spawn(async move {
                    while trigger_rx.recv().await.is_some() {
                        dispatcher.handle_trigger().await;
                    }
                });

                ControlBinding { topic, trigger_tx }
            })
            .collect();

        Self {
            client,
            event_loop,
            registry,
            announce_topic,
            controls,
        }
    }

    /// Run the bridge until a fatal error occurs
    ///
    /// Connection drops are not fatal - the loop logs them, waits briefly,
    /// and resubscribes once the broker accepts the session again.
    ///
    /// # Errors
    ///
    /// Returns error if a subscription cannot be requested.
    pub async fn run(mut self) -> Result<()> {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("connected to MQTT broker");
                    self.subscribe_all().await?;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.route(&publish.topic, &publish.payload);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "MQTT connection error, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    async fn subscribe_all(&self) -> Result<()> {
        self.subscribe(&self.announce_topic).await?;
        tracing::info!(topic = %self.announce_topic, "discovering kiosks");

        for binding in &self.controls {
            self.subscribe(&binding.topic).await?;
            tracing::info!(topic = %binding.topic, "listening for control triggers");
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<()> {
        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(|e| Error::Mqtt(format!("failed to subscribe to '{topic}': {e}")))
    }

    /// Route one inbound publish to the registry or a dispatcher queue
    fn route(&self, topic: &str, payload: &[u8]) {
        if topic_matches(&self.announce_topic, topic) {
            if let Err(e) = self.registry.ingest(payload) {
                tracing::error!(topic, error = %e, "dropping malformed announcement");
            }
            return;
        }

        for binding in &self.controls {
            if topic_matches(&binding.topic, topic) {
                // Payload content is ignored - arrival is the trigger.
                if binding.trigger_tx.try_send(()).is_err() {
                    tracing::warn!(
                        topic = %binding.topic,
                        "trigger queue full, dropping trigger"
                    );
                }
            }
        }
    }
}

/// MQTT topic filter matching with `+` (single level) and `#` (multi level)
fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_parts = filter.split('/');
    let mut topic_parts = topic.split('/');
    loop {
        match (filter_parts.next(), topic_parts.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_topic_matches() {
        assert!(topic_matches("kiosks/control/night", "kiosks/control/night"));
        assert!(!topic_matches("kiosks/control/night", "kiosks/control/day"));
    }

    #[test]
    fn single_level_wildcard() {
        assert!(topic_matches("fully/deviceInfo/+", "fully/deviceInfo/abc123"));
        assert!(!topic_matches("fully/deviceInfo/+", "fully/deviceInfo/a/b"));
        assert!(!topic_matches("fully/deviceInfo/+", "fully/deviceInfo"));
    }

    #[test]
    fn multi_level_wildcard() {
        assert!(topic_matches("#", "anything/at/all"));
        assert!(topic_matches("fully/#", "fully/deviceInfo/abc123"));
        assert!(topic_matches("fully/#", "fully"));
        assert!(!topic_matches("fully/#", "other/deviceInfo"));
    }

    #[test]
    fn filter_longer_than_topic_does_not_match() {
        assert!(!topic_matches("a/b/c", "a/b"));
        assert!(!topic_matches("a/b", "a/b/c"));
    }
}
