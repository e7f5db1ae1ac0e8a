//! Subscription configuration and request payloads.

use crate::error::{Result, StreamError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Request type: create a content stream.
pub const REQUEST_CREATE_CONTENT_STREAM: &str = "createContentStream";
/// Request type: destroy a content stream.
pub const REQUEST_DESTROY_CONTENT_STREAM: &str = "destroyContentStream";
/// Request type: set the active namespace.
pub const REQUEST_SET_NAMESPACE: &str = "setNamespace";
/// Request type: set the content path (and optionally query params).
pub const REQUEST_SET_CONTENT_PATH: &str = "setContentPath";
/// Request type: set query params.
pub const REQUEST_SET_QUERY_PARAMS: &str = "setQueryParams";

/// What to do when a create request names an ID that is already active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with `Conflict` and leave the running subscription alone.
    #[default]
    Reject,
    /// Cancel the running subscription and start the new one in its place.
    Replace,
}

/// Configuration for content streams.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Delay between the end of one poll and the start of the next.
    /// Default: 1s
    pub poll_interval: Duration,

    /// Duplicate ID handling.
    /// Default: reject
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Payload of a create request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Content path to stream. Falls back to the state's default path.
    #[serde(default, alias = "contentPath")]
    pub path: Option<String>,

    /// Subscription ID. Falls back to the resolved path.
    #[serde(default, rename = "subscriptionID", alias = "channelID")]
    pub subscription_id: Option<String>,

    /// Namespace to substitute into the content path.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Query params; `filters` (a string or a list) replaces the state's filters.
    #[serde(default, rename = "queryParams")]
    pub query_params: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Payload of a destroy request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DestroySubscriptionRequest {
    #[serde(default, rename = "subscriptionID", alias = "channelID")]
    pub subscription_id: Option<String>,
}

impl DestroySubscriptionRequest {
    /// The subscription ID, which must be present and non-empty.
    pub fn required_id(&self) -> Result<&str> {
        match self.subscription_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(StreamError::InvalidRequest(
                "subscriptionID is required".to_string(),
            )),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SetNamespaceRequest {
    pub namespace: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SetContentPathRequest {
    #[serde(rename = "contentPath")]
    pub content_path: String,

    #[serde(default)]
    pub params: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct SetQueryParamsRequest {
    #[serde(default)]
    pub params: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Decode a request payload, reporting shape errors as `InvalidRequest`.
pub(crate) fn parse_payload<T: DeserializeOwned>(payload: &serde_json::Value) -> Result<T> {
    T::deserialize(payload).map_err(|e| StreamError::InvalidRequest(e.to_string()))
}
