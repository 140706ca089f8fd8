//! `MessageBroker`: publish/subscribe transport for orchestrator progress
//! events and job control messages, keyed by [`MessageType`].

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The channel a message travels on. The orchestrator publishes progress
/// and status updates; the worker dispatch loop publishes job lifecycle
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    JobProgress,
    JobStatusChanged,
    AgentStep,
    Clarification,
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker publish failed: {0}")]
    Publish(String),
}

#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish `payload` on `message_type`. At-least-once: a subscriber may
    /// observe the same payload more than once after a redelivery.
    async fn publish(&self, message_type: MessageType, payload: serde_json::Value) -> Result<(), BrokerError>;

    /// Drain everything published on `message_type` since the last drain.
    async fn drain(&self, message_type: MessageType) -> Result<Vec<serde_json::Value>, BrokerError>;
}

/// An in-memory broker that accumulates messages per [`MessageType`] until
/// drained; used by this crate's own tests in place of a real queue.
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    queues: Mutex<HashMap<MessageType, Vec<serde_json::Value>>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, message_type: MessageType, payload: serde_json::Value) -> Result<(), BrokerError> {
        let mut queues = self.queues.lock().expect("broker mutex poisoned");
        queues.entry(message_type).or_default().push(payload);
        Ok(())
    }

    async fn drain(&self, message_type: MessageType) -> Result<Vec<serde_json::Value>, BrokerError> {
        let mut queues = self.queues.lock().expect("broker mutex poisoned");
        Ok(queues.remove(&message_type).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_then_drain_returns_in_order() {
        let broker = InMemoryBroker::new();
        broker.publish(MessageType::JobProgress, json!({"pct": 10})).await.unwrap();
        broker.publish(MessageType::JobProgress, json!({"pct": 50})).await.unwrap();
        let drained = broker.drain(MessageType::JobProgress).await.unwrap();
        assert_eq!(drained, vec![json!({"pct": 10}), json!({"pct": 50})]);
        assert!(broker.drain(MessageType::JobProgress).await.unwrap().is_empty());
    }
}
