//! Live content subscriptions.
//!
//! A subscription polls a content provider for one content path and pushes
//! the result to the client whenever it changes:
//! - [`SubscriptionRegistry`] tracks which IDs are active
//! - [`ContentStream`] is the per-subscription poll loop
//! - [`SubscriptionManager`] handles client requests and starts streams
//!
//! # Example
//!
//! ```ignore
//! let (sink, events) = ChannelSink::new();
//! let state: Arc<dyn ViewState> = Arc::new(MemoryState::new(Arc::new(sink)));
//! let manager = SubscriptionManager::new(
//!     Arc::new(SubscriptionRegistry::new()),
//!     Arc::new(router),
//!     StreamConfig::default(),
//! );
//!
//! manager.handle("createContentStream", &state, &json!({
//!     "path": "/overview/namespace/default/pods",
//!     "subscriptionID": "pods",
//! }))?;
//!
//! while let Ok(event) = events.recv() {
//!     match event {
//!         StreamEvent::ContentUpdated { content, .. } => render(content),
//!         StreamEvent::SubscriptionDestroyed { .. } => break,
//!         StreamEvent::Error { cause } => eprintln!("{}", cause),
//!     }
//! }
//! ```

mod manager;
mod registry;
mod stream;
mod types;

pub use manager::SubscriptionManager;
pub use registry::SubscriptionRegistry;
pub use stream::{ContentStream, PollOutcome};
pub use types::{
    CreateSubscriptionRequest, DestroySubscriptionRequest, DuplicatePolicy, StreamConfig,
    REQUEST_CREATE_CONTENT_STREAM, REQUEST_DESTROY_CONTENT_STREAM, REQUEST_SET_CONTENT_PATH,
    REQUEST_SET_NAMESPACE, REQUEST_SET_QUERY_PARAMS,
};
