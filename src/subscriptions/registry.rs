//! Registry of active subscriptions.

use crate::cancel::CancelToken;
use crate::error::{Result, StreamError};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Maps subscription IDs to the cancellation token of their stream.
///
/// The lock only covers map mutation. Nothing here calls into a stream
/// or a content provider.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<HashMap<String, CancelToken>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` and return the token to bind to its stream.
    ///
    /// Fails with `Conflict` if `id` is already registered.
    pub fn create(&self, id: &str) -> Result<CancelToken> {
        let mut entries = self.entries.lock();
        if entries.contains_key(id) {
            return Err(StreamError::Conflict(id.to_string()));
        }

        let token = CancelToken::new();
        entries.insert(id.to_string(), token.clone());
        debug!(subscription_id = id, "registered subscription");
        Ok(token)
    }

    /// Register `id`, cancelling any subscription already holding it.
    ///
    /// Removing the old entry and inserting the new one happen under one lock.
    pub fn replace(&self, id: &str) -> CancelToken {
        let token = CancelToken::new();
        let previous = self.entries.lock().insert(id.to_string(), token.clone());

        if let Some(previous) = previous {
            previous.cancel();
            debug!(subscription_id = id, "replaced subscription");
        }
        token
    }

    /// Cancel and remove `id`. Returns false if it was not registered.
    ///
    /// The entry is gone before this returns, so a following `create`
    /// for the same ID succeeds.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.entries.lock().remove(id);
        match removed {
            Some(token) => {
                token.cancel();
                debug!(subscription_id = id, "deleted subscription");
                true
            }
            None => false,
        }
    }

    /// Cancel and remove every subscription. Returns how many were active.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<CancelToken> = self.entries.lock().drain().map(|(_, t)| t).collect();
        for token in &drained {
            token.cancel();
        }
        drained.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// IDs of active subscriptions, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
