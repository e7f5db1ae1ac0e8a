//! # Content Broker
//!
//! Streams regenerated dashboard content to a client, pushing an update
//! only when the content actually changed.
//!
//! ## Core Concepts
//!
//! - **Subscriptions**: ID-keyed requests for continuous updates on a content path
//! - **Content providers**: Pluggable sources that turn a path into a content tree
//! - **Digests**: SHA-256 over the serialized content, compared between polls
//! - **View state**: Namespace, filters and query params shared by all streams
//!
//! ## Example
//!
//! ```ignore
//! use content_broker::{
//!     ChannelSink, MemoryState, ModuleRouter, StreamConfig, SubscriptionManager,
//!     SubscriptionRegistry, ViewState,
//! };
//!
//! let (sink, events) = ChannelSink::new();
//! let state: Arc<dyn ViewState> = Arc::new(MemoryState::new(Arc::new(sink)));
//!
//! let mut router = ModuleRouter::new();
//! router.register(Arc::new(OverviewModule::new()));
//!
//! let manager = SubscriptionManager::new(
//!     Arc::new(SubscriptionRegistry::new()),
//!     Arc::new(router),
//!     StreamConfig::default(),
//! );
//!
//! manager.handle("createContentStream", &state, &json!({"path": "/overview"}))?;
//! let first = events.recv()?;
//!
//! manager.handle("destroyContentStream", &state, &json!({"subscriptionID": "/overview"}))?;
//! ```

pub mod cancel;
pub mod error;
pub mod events;
pub mod paths;
pub mod provider;
pub mod state;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use cancel::CancelToken;
pub use error::{Result, StreamError};
pub use events::{ChannelSink, EventReceiver, EventSink, StreamEvent};
pub use paths::{not_found_redirect_path, update_namespace_in_content_path};
pub use provider::{
    filters_to_label_set, ContentOptions, ContentProvider, ContentRequest, Module, ModuleRouter,
    ProviderError,
};
pub use state::{MemoryState, ViewState};
pub use subscriptions::{
    ContentStream, CreateSubscriptionRequest, DestroySubscriptionRequest, DuplicatePolicy,
    PollOutcome, StreamConfig, SubscriptionManager, SubscriptionRegistry,
    REQUEST_CREATE_CONTENT_STREAM, REQUEST_DESTROY_CONTENT_STREAM, REQUEST_SET_CONTENT_PATH,
    REQUEST_SET_NAMESPACE, REQUEST_SET_QUERY_PARAMS,
};
pub use types::*;
