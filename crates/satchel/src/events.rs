//! # Push Bus
//!
//! Carries authority pushes from the transport thread to the session.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │  Transport  │─────>│    Push     │─────>│   Session   │
//! │  (any thr.) │      │   Channel   │      │  (applies)  │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Pushes stay raw (name + JSON payload) until the session decodes them,
//! so a malformed push only costs that push.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde_json::Value;

/// An undecoded authority push.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundPush {
    /// Event name.
    pub name: String,
    /// Raw payload.
    pub payload: Value,
}

impl InboundPush {
    /// Creates a push.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Bounded push channel.
pub struct PushBus {
    sender: Sender<InboundPush>,
    receiver: Receiver<InboundPush>,
}

impl PushBus {
    /// Creates a bus holding at most `capacity` undelivered pushes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// A producer handle.
    #[must_use]
    pub fn sender(&self) -> PushSender {
        PushSender {
            sender: self.sender.clone(),
        }
    }

    /// A consumer handle.
    #[must_use]
    pub fn receiver(&self) -> PushReceiver {
        PushReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a connected sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (PushSender, PushReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

/// Handle for sending pushes.
#[derive(Clone)]
pub struct PushSender {
    sender: Sender<InboundPush>,
}

impl PushSender {
    /// Sends without blocking. Returns false if the bus is full or closed.
    pub fn send(&self, push: InboundPush) -> bool {
        match self.sender.try_send(push) {
            Ok(()) => true,
            Err(TrySendError::Full(push)) => {
                tracing::warn!(event = %push.name, "push bus full, push dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving pushes.
#[derive(Clone)]
pub struct PushReceiver {
    receiver: Receiver<InboundPush>,
}

impl PushReceiver {
    /// Takes every pending push, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<InboundPush> {
        self.receiver.try_iter().collect()
    }

    /// Takes one pending push.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<InboundPush> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending pushes.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drain_keeps_order() {
        let (sender, receiver) = PushBus::create_pair(8);
        assert!(sender.send(InboundPush::new("setupInventory", json!({}))));
        assert!(sender.send(InboundPush::new("refreshSlots", json!({}))));
        assert_eq!(receiver.pending_count(), 2);

        let names: Vec<String> = receiver.drain().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["setupInventory", "refreshSlots"]);
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_full_bus_drops() {
        let (sender, _receiver) = PushBus::create_pair(1);
        assert!(sender.send(InboundPush::new("a", Value::Null)));
        assert!(!sender.send(InboundPush::new("b", Value::Null)));
    }
}
