//! Subscription manager: turns client requests into running content streams.

use crate::error::{Result, StreamError};
use crate::events::StreamEvent;
use crate::paths::update_namespace_in_content_path;
use crate::provider::ContentProvider;
use crate::state::ViewState;
use crate::types::{filters_from_value, Filter, FILTERS_PARAM};
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::info;

use super::registry::SubscriptionRegistry;
use super::stream::ContentStream;
use super::types::{
    parse_payload, CreateSubscriptionRequest, DestroySubscriptionRequest, DuplicatePolicy,
    SetContentPathRequest, SetNamespaceRequest, SetQueryParamsRequest, StreamConfig,
    REQUEST_CREATE_CONTENT_STREAM, REQUEST_DESTROY_CONTENT_STREAM, REQUEST_SET_CONTENT_PATH,
    REQUEST_SET_NAMESPACE, REQUEST_SET_QUERY_PARAMS,
};

/// Request types understood by [`SubscriptionManager::handle`].
const REQUEST_TYPES: &[&str] = &[
    REQUEST_CREATE_CONTENT_STREAM,
    REQUEST_DESTROY_CONTENT_STREAM,
    REQUEST_SET_NAMESPACE,
    REQUEST_SET_CONTENT_PATH,
    REQUEST_SET_QUERY_PARAMS,
];

/// Creates and destroys content subscriptions.
///
/// Each subscription runs on its own thread. Request handlers return as
/// soon as the thread is started and never wait on a poll.
pub struct SubscriptionManager {
    /// Active subscriptions.
    registry: Arc<SubscriptionRegistry>,
    /// Content source for every stream.
    provider: Arc<dyn ContentProvider>,
    config: StreamConfig,
}

impl SubscriptionManager {
    /// Create a manager over an existing registry.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        provider: Arc<dyn ContentProvider>,
        config: StreamConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Names of the requests [`handle`](Self::handle) accepts.
    pub fn request_types() -> &'static [&'static str] {
        REQUEST_TYPES
    }

    /// Dispatch a named client request.
    pub fn handle(
        &self,
        request_type: &str,
        state: &Arc<dyn ViewState>,
        payload: &serde_json::Value,
    ) -> Result<()> {
        match request_type {
            REQUEST_CREATE_CONTENT_STREAM => {
                self.create_subscription(state, parse_payload(payload)?)?;
                Ok(())
            }
            REQUEST_DESTROY_CONTENT_STREAM => {
                self.destroy_subscription(state.as_ref(), &parse_payload(payload)?)
            }
            REQUEST_SET_NAMESPACE => self.set_namespace(state.as_ref(), payload),
            REQUEST_SET_CONTENT_PATH => self.set_content_path(state.as_ref(), payload),
            REQUEST_SET_QUERY_PARAMS => self.set_query_params(state.as_ref(), payload),
            other => Err(StreamError::UnknownRequest(other.to_string())),
        }
    }

    /// Start streaming content for a path. Returns the subscription ID.
    ///
    /// On `InvalidRequest` or `Conflict` nothing is changed.
    pub fn create_subscription(
        &self,
        state: &Arc<dyn ViewState>,
        request: CreateSubscriptionRequest,
    ) -> Result<String> {
        let mut content_path = request
            .path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| state.default_content_path());
        if let Some(namespace) = request.namespace.as_deref() {
            content_path = update_namespace_in_content_path(&content_path, namespace);
        }
        if content_path.is_empty() {
            return Err(StreamError::InvalidRequest(
                "no content path given and no default content path".to_string(),
            ));
        }

        let subscription_id = request
            .subscription_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| content_path.clone());

        // Validated up front; applied to the state only once the stream runs.
        let filters = request
            .query_params
            .as_ref()
            .and_then(|params| params.get(FILTERS_PARAM))
            .map(filters_from_value)
            .transpose()?;

        let cancel = match self.config.duplicate_policy {
            DuplicatePolicy::Reject => self.registry.create(&subscription_id)?,
            DuplicatePolicy::Replace => self.registry.replace(&subscription_id),
        };

        info!(
            subscription_id = %subscription_id,
            content_path = %content_path,
            "creating content stream"
        );

        let stream = ContentStream::new(
            subscription_id.clone(),
            content_path,
            Arc::clone(state),
            Arc::clone(&self.provider),
            self.config.poll_interval,
        );
        let spawned = spawn_with_filters(state.as_ref(), filters, || {
            thread::Builder::new()
                .name(format!("content-stream-{}", subscription_id))
                .spawn(move || stream.run(cancel))
        });

        if let Err(e) = spawned {
            self.registry.delete(&subscription_id);
            return Err(StreamError::Spawn(e));
        }

        Ok(subscription_id)
    }

    /// Stop a subscription and tell the client it is gone.
    ///
    /// Succeeds and emits `SubscriptionDestroyed` even when no such
    /// subscription is active.
    pub fn destroy_subscription(
        &self,
        state: &dyn ViewState,
        request: &DestroySubscriptionRequest,
    ) -> Result<()> {
        let subscription_id = request.required_id()?;

        let existed = self.registry.delete(subscription_id);
        info!(subscription_id, existed, "destroying content stream");

        state
            .client()
            .send(StreamEvent::subscription_destroyed(subscription_id));
        Ok(())
    }

    /// Set the active namespace from a `{namespace}` payload.
    pub fn set_namespace(&self, state: &dyn ViewState, payload: &serde_json::Value) -> Result<()> {
        let request: SetNamespaceRequest = parse_payload(payload)?;
        state.set_namespace(&request.namespace);
        Ok(())
    }

    /// Set the content path from a `{contentPath, params?}` payload.
    pub fn set_content_path(
        &self,
        state: &dyn ViewState,
        payload: &serde_json::Value,
    ) -> Result<()> {
        let request: SetContentPathRequest = parse_payload(payload)?;
        if let Some(params) = &request.params {
            apply_query_params(state, params)?;
        }
        state.set_content_path(&request.content_path);
        Ok(())
    }

    /// Apply filters from a `{params: {filters}}` payload.
    pub fn set_query_params(
        &self,
        state: &dyn ViewState,
        payload: &serde_json::Value,
    ) -> Result<()> {
        let request: SetQueryParamsRequest = parse_payload(payload)?;
        if let Some(params) = &request.params {
            apply_query_params(state, params)?;
        }
        Ok(())
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// Cancel every active subscription. Returns how many were stopped.
    pub fn shutdown(&self) -> usize {
        let stopped = self.registry.cancel_all();
        info!(stopped, "content streams shut down");
        stopped
    }
}

/// Install `filters` and start the stream. The first poll sees the new
/// filters; if the spawn fails the previous filters are restored.
fn spawn_with_filters<T>(
    state: &dyn ViewState,
    filters: Option<Vec<Filter>>,
    spawn: impl FnOnce() -> io::Result<T>,
) -> io::Result<T> {
    let Some(filters) = filters else {
        return spawn();
    };

    let previous = state.filters();
    state.set_filters(filters);
    spawn().map_err(|e| {
        state.set_filters(previous);
        e
    })
}

fn apply_query_params(
    state: &dyn ViewState,
    params: &serde_json::Map<String, serde_json::Value>,
) -> Result<()> {
    if let Some(filters) = params.get(FILTERS_PARAM) {
        state.set_filters(filters_from_value(filters)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelSink, EventReceiver};
    use crate::provider::{ContentRequest, ProviderError};
    use crate::state::MemoryState;
    use serde_json::{json, Value};

    fn static_provider() -> Arc<dyn ContentProvider> {
        Arc::new(
            |req: &ContentRequest<'_>| -> std::result::Result<Value, ProviderError> {
                Ok(json!({"path": req.content_path}))
            },
        )
    }

    fn setup(policy: DuplicatePolicy) -> (SubscriptionManager, Arc<dyn ViewState>, EventReceiver) {
        let (sink, receiver) = ChannelSink::new();
        let state: Arc<dyn ViewState> = Arc::new(
            MemoryState::new(Arc::new(sink)).with_default_content_path("/overview"),
        );
        let manager = SubscriptionManager::new(
            Arc::new(SubscriptionRegistry::new()),
            static_provider(),
            StreamConfig {
                poll_interval: std::time::Duration::from_millis(10),
                duplicate_policy: policy,
            },
        );
        (manager, state, receiver)
    }

    #[test]
    fn test_request_types() {
        assert_eq!(
            SubscriptionManager::request_types(),
            &[
                "createContentStream",
                "destroyContentStream",
                "setNamespace",
                "setContentPath",
                "setQueryParams"
            ]
        );
    }

    #[test]
    fn test_id_defaults_to_path() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        let id = manager
            .create_subscription(
                &state,
                CreateSubscriptionRequest {
                    path: Some("/ns/default".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(id, "/ns/default");
        assert!(manager.registry().contains("/ns/default"));
        manager.shutdown();
    }

    #[test]
    fn test_path_defaults_to_state_default() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        let id = manager
            .create_subscription(&state, CreateSubscriptionRequest::default())
            .unwrap();
        assert_eq!(id, "/overview");
        manager.shutdown();
    }

    #[test]
    fn test_namespace_rewrites_path() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        let id = manager
            .create_subscription(
                &state,
                CreateSubscriptionRequest {
                    path: Some("overview/namespace/default/pods".into()),
                    namespace: Some("kube-system".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(id, "overview/namespace/kube-system/pods");
        manager.shutdown();
    }

    #[test]
    fn test_empty_path_without_default_is_invalid() {
        let (sink, _receiver) = ChannelSink::new();
        let state: Arc<dyn ViewState> = Arc::new(MemoryState::new(Arc::new(sink)));
        let manager = SubscriptionManager::new(
            Arc::new(SubscriptionRegistry::new()),
            static_provider(),
            StreamConfig::default(),
        );

        let result = manager.create_subscription(&state, CreateSubscriptionRequest::default());
        assert!(matches!(result, Err(StreamError::InvalidRequest(_))));
        assert_eq!(manager.subscription_count(), 0);
    }

    #[test]
    fn test_bad_filter_has_no_side_effects() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);
        let params = json!({"filters": ["nocolon"]}).as_object().cloned();

        let result = manager.create_subscription(
            &state,
            CreateSubscriptionRequest {
                path: Some("/p".into()),
                query_params: params,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StreamError::InvalidRequest(_))));
        assert_eq!(manager.subscription_count(), 0);
        assert!(state.filters().is_empty());
    }

    #[test]
    fn test_create_accepts_single_filter_string() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        manager
            .handle(
                REQUEST_CREATE_CONTENT_STREAM,
                &state,
                &json!({"path": "/p", "queryParams": {"filters": "app:web"}}),
            )
            .unwrap();

        assert_eq!(state.filters(), vec![Filter::new("app", "web")]);
        manager.shutdown();
    }

    #[test]
    fn test_failed_spawn_restores_filters() {
        let (sink, _receiver) = ChannelSink::new();
        let state = MemoryState::new(Arc::new(sink));
        state.set_filters(vec![Filter::new("tier", "db")]);

        let result = spawn_with_filters(&state, Some(vec![Filter::new("app", "web")]), || {
            assert_eq!(state.filters(), vec![Filter::new("app", "web")]);
            Err::<(), _>(io::Error::new(io::ErrorKind::WouldBlock, "no threads left"))
        });

        assert!(result.is_err());
        assert_eq!(state.filters(), vec![Filter::new("tier", "db")]);
    }

    #[test]
    fn test_spawn_without_filters_leaves_state_alone() {
        let (sink, _receiver) = ChannelSink::new();
        let state = MemoryState::new(Arc::new(sink));
        state.set_filters(vec![Filter::new("tier", "db")]);

        spawn_with_filters(&state, None, || Ok(())).unwrap();
        assert_eq!(state.filters(), vec![Filter::new("tier", "db")]);
    }

    #[test]
    fn test_conflict_has_no_side_effects() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);
        manager
            .create_subscription(
                &state,
                CreateSubscriptionRequest {
                    path: Some("/p".into()),
                    subscription_id: Some("c1".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let params = json!({"filters": ["app:web"]}).as_object().cloned();
        let result = manager.create_subscription(
            &state,
            CreateSubscriptionRequest {
                path: Some("/q".into()),
                subscription_id: Some("c1".into()),
                query_params: params,
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(StreamError::Conflict(ref id)) if id == "c1"));
        assert!(state.filters().is_empty());
        manager.shutdown();
    }

    #[test]
    fn test_destroy_requires_id() {
        let (manager, state, receiver) = setup(DuplicatePolicy::Reject);

        let result = manager.handle(REQUEST_DESTROY_CONTENT_STREAM, &state, &json!({}));
        assert!(matches!(result, Err(StreamError::InvalidRequest(_))));
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn test_unknown_request() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        let result = manager.handle("explode", &state, &json!({}));
        assert!(matches!(result, Err(StreamError::UnknownRequest(ref r)) if r == "explode"));
    }

    #[test]
    fn test_set_namespace() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        manager
            .handle(REQUEST_SET_NAMESPACE, &state, &json!({"namespace": "kube-system"}))
            .unwrap();
        assert_eq!(state.namespace(), "kube-system");

        let result = manager.handle(REQUEST_SET_NAMESPACE, &state, &json!({}));
        assert!(matches!(result, Err(StreamError::InvalidRequest(_))));
    }

    #[test]
    fn test_set_query_params_filters() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        manager
            .handle(
                REQUEST_SET_QUERY_PARAMS,
                &state,
                &json!({"params": {"filters": "foo:bar"}}),
            )
            .unwrap();
        assert_eq!(state.filters(), vec![Filter::new("foo", "bar")]);

        manager
            .handle(
                REQUEST_SET_QUERY_PARAMS,
                &state,
                &json!({"params": {"filters": ["foo:bar", "baz:qux"]}}),
            )
            .unwrap();
        assert_eq!(
            state.filters(),
            vec![Filter::new("foo", "bar"), Filter::new("baz", "qux")]
        );
    }

    #[test]
    fn test_set_content_path() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);

        manager
            .handle(
                REQUEST_SET_CONTENT_PATH,
                &state,
                &json!({"contentPath": "/overview/pods", "params": {"filters": "app:web"}}),
            )
            .unwrap();
        assert_eq!(state.content_path(), "/overview/pods");
        assert_eq!(state.filters(), vec![Filter::new("app", "web")]);

        let result = manager.handle(REQUEST_SET_CONTENT_PATH, &state, &json!({}));
        assert!(matches!(result, Err(StreamError::InvalidRequest(_))));
    }

    #[test]
    fn test_shutdown_cancels_all() {
        let (manager, state, _receiver) = setup(DuplicatePolicy::Reject);
        for id in ["a", "b"] {
            manager
                .create_subscription(
                    &state,
                    CreateSubscriptionRequest {
                        path: Some("/p".into()),
                        subscription_id: Some(id.into()),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        assert_eq!(manager.shutdown(), 2);
        assert_eq!(manager.subscription_count(), 0);
    }
}
