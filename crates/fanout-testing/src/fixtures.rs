//! Packet fixtures for tests.

use fanout_core::Packet;
use serde_json::json;
use uuid::Uuid;

/// Builder for realistic log packets.
///
/// Produces the JSON shape agents submit: a packet id, the collecting
/// agent, and a batch of log messages.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    id: String,
    agent_id: String,
    messages: Vec<serde_json::Value>,
}

impl PacketBuilder {
    /// Starts a builder with a random packet id and one message.
    pub fn new() -> Self {
        Self {
            id: format!("packet-{}", Uuid::new_v4().simple()),
            agent_id: "agent-test".to_string(),
            messages: Vec::new(),
        }
    }

    /// Sets the packet id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the collecting agent id.
    #[must_use]
    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    /// Appends a log message.
    #[must_use]
    pub fn message(mut self, level: &str, source: &str, text: &str) -> Self {
        self.messages.push(json!({
            "level": level,
            "source": source,
            "message": text,
        }));
        self
    }

    /// Builds the packet, defaulting to a single INFO message.
    pub fn build(mut self) -> Packet {
        if self.messages.is_empty() {
            self.messages.push(json!({
                "level": "INFO",
                "source": "fixture",
                "message": "synthetic log line",
            }));
        }

        let body = serde_json::to_vec(&json!({
            "packet_id": self.id,
            "agent_id": self.agent_id,
            "messages": self.messages,
        }))
        .expect("fixture JSON serializes");

        Packet::new(self.id, body)
    }
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a packet with the given id and a default body.
pub fn packet(id: impl Into<String>) -> Packet {
    PacketBuilder::new().id(id).build()
}
