//! Cross-cutting view state shared by every subscription of a client.

use crate::events::EventSink;
use crate::types::{filters_to_query_params, Filter, QueryParams};
use parking_lot::RwLock;
use std::sync::Arc;

/// View state read by content streams on every poll.
///
/// Getters return owned values so implementations never hold a lock
/// across a poll.
pub trait ViewState: Send + Sync {
    /// The client that receives emitted events.
    fn client(&self) -> &dyn EventSink;

    /// Content path used when a request does not name one.
    fn default_content_path(&self) -> String;

    fn content_path(&self) -> String;

    /// Replace the content path (used for not-found redirects).
    fn set_content_path(&self, content_path: &str);

    fn namespace(&self) -> String;

    fn set_namespace(&self, namespace: &str);

    fn filters(&self) -> Vec<Filter>;

    /// Replace the current filters. The list may be empty.
    fn set_filters(&self, filters: Vec<Filter>);

    fn query_params(&self) -> QueryParams;
}

#[derive(Debug, Default)]
struct MemoryStateInner {
    content_path: String,
    namespace: String,
    filters: Vec<Filter>,
}

/// In-memory [`ViewState`].
///
/// Query parameters are derived from the current filters.
pub struct MemoryState {
    inner: RwLock<MemoryStateInner>,
    default_content_path: String,
    client: Arc<dyn EventSink>,
}

impl MemoryState {
    /// Create state that sends events to `client`.
    pub fn new(client: Arc<dyn EventSink>) -> Self {
        Self {
            inner: RwLock::new(MemoryStateInner::default()),
            default_content_path: String::new(),
            client,
        }
    }

    /// Set the default content path.
    pub fn with_default_content_path(mut self, path: impl Into<String>) -> Self {
        self.default_content_path = path.into();
        self
    }

    /// Set the initial namespace.
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        self.inner.write().namespace = namespace.into();
        self
    }
}

impl ViewState for MemoryState {
    fn client(&self) -> &dyn EventSink {
        self.client.as_ref()
    }

    fn default_content_path(&self) -> String {
        self.default_content_path.clone()
    }

    fn content_path(&self) -> String {
        self.inner.read().content_path.clone()
    }

    fn set_content_path(&self, content_path: &str) {
        self.inner.write().content_path = content_path.to_string();
    }

    fn namespace(&self) -> String {
        self.inner.read().namespace.clone()
    }

    fn set_namespace(&self, namespace: &str) {
        self.inner.write().namespace = namespace.to_string();
    }

    fn filters(&self) -> Vec<Filter> {
        self.inner.read().filters.clone()
    }

    fn set_filters(&self, filters: Vec<Filter>) {
        self.inner.write().filters = filters;
    }

    fn query_params(&self) -> QueryParams {
        filters_to_query_params(&self.inner.read().filters)
    }
}
