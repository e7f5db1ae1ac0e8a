//! Events emitted to the client and the sinks that carry them.

use crate::types::{ContentSnapshot, QueryParams};
use crossbeam_channel::{unbounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Events emitted by content streams and request handlers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamEvent {
    /// Content for a subscription changed.
    ContentUpdated {
        content: serde_json::Value,
        namespace: String,
        #[serde(rename = "contentPath")]
        content_path: String,
        #[serde(rename = "subscriptionID")]
        subscription_id: String,
        #[serde(rename = "queryParams")]
        query_params: QueryParams,
    },

    /// A subscription was destroyed (or never existed).
    SubscriptionDestroyed {
        #[serde(rename = "subscriptionID")]
        subscription_id: String,
    },

    /// A poll cycle failed.
    Error { cause: String },
}

impl StreamEvent {
    /// Build a `ContentUpdated` event from a snapshot.
    pub fn content_updated(snapshot: ContentSnapshot, subscription_id: impl Into<String>) -> Self {
        StreamEvent::ContentUpdated {
            content: snapshot.content,
            namespace: snapshot.namespace,
            content_path: snapshot.content_path,
            subscription_id: subscription_id.into(),
            query_params: snapshot.query_params,
        }
    }

    pub fn subscription_destroyed(subscription_id: impl Into<String>) -> Self {
        StreamEvent::SubscriptionDestroyed {
            subscription_id: subscription_id.into(),
        }
    }

    pub fn error(cause: impl ToString) -> Self {
        StreamEvent::Error {
            cause: cause.to_string(),
        }
    }

    /// Subscription this event belongs to, if any.
    pub fn subscription_id(&self) -> Option<&str> {
        match self {
            StreamEvent::ContentUpdated {
                subscription_id, ..
            }
            | StreamEvent::SubscriptionDestroyed { subscription_id } => Some(subscription_id),
            StreamEvent::Error { .. } => None,
        }
    }
}

/// Destination for emitted events (the client connection).
///
/// Implementations must not block the caller indefinitely.
pub trait EventSink: Send + Sync {
    fn send(&self, event: StreamEvent);
}

impl EventSink for Sender<StreamEvent> {
    fn send(&self, event: StreamEvent) {
        // A disconnected receiver means the client is gone; nothing to do.
        let _ = Sender::send(self, event);
    }
}

/// Sink backed by an unbounded channel.
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<StreamEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes its events.
    pub fn new() -> (Self, EventReceiver) {
        let (sender, receiver) = unbounded();
        (Self { sender }, EventReceiver { receiver })
    }
}

impl EventSink for ChannelSink {
    fn send(&self, event: StreamEvent) {
        EventSink::send(&self.sender, event);
    }
}

/// Receiving end of a [`ChannelSink`].
pub struct EventReceiver {
    receiver: Receiver<StreamEvent>,
}

impl EventReceiver {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StreamEvent, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StreamEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<StreamEvent, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every event currently buffered.
    pub fn drain(&self) -> Vec<StreamEvent> {
        self.receiver.try_iter().collect()
    }
}
