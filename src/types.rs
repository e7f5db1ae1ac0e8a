//! Core types shared by the broker components.

use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Query parameters in effect for a view, keyed by parameter name.
///
/// A `BTreeMap` keeps serialization order stable.
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// Query parameter carrying label filters.
pub const FILTERS_PARAM: &str = "filters";

/// A label filter (`key:value`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub value: String,
}

impl Filter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

impl FromStr for Filter {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((key, value)) if !key.is_empty() => Ok(Filter::new(key, value)),
            _ => Err(StreamError::InvalidRequest(format!(
                "filter {:?} is not in key:value form",
                s
            ))),
        }
    }
}

/// Parse filters out of a query parameter value.
///
/// Accepts a single `"key:value"` string or a list of them.
pub fn filters_from_value(value: &serde_json::Value) -> Result<Vec<Filter>> {
    match value {
        serde_json::Value::String(s) => Ok(vec![s.parse()?]),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(s) => s.parse(),
                None => Err(StreamError::InvalidRequest(format!(
                    "filter {} is not a string",
                    item
                ))),
            })
            .collect(),
        other => Err(StreamError::InvalidRequest(format!(
            "filters must be a string or a list of strings, got {}",
            other
        ))),
    }
}

/// Render filters as the `filters` query parameter.
pub fn filters_to_query_params(filters: &[Filter]) -> QueryParams {
    let mut params = QueryParams::new();
    if !filters.is_empty() {
        params.insert(
            FILTERS_PARAM.to_string(),
            filters.iter().map(Filter::to_string).collect(),
        );
    }
    params
}

/// Fingerprint of serialized content (SHA-256).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Compute digest from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hasher.finalize().into())
    }

    /// Compute digest over the JSON serialization of `content`.
    ///
    /// Object keys serialize in sorted order, so equal trees always hash equal.
    pub fn of<T: Serialize + ?Sized>(content: &T) -> Result<Self> {
        let data = serde_json::to_vec(content)?;
        Ok(Self::from_bytes(&data))
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Content generated for one poll cycle, with the view state it was generated under.
#[derive(Clone, Debug)]
pub struct ContentSnapshot {
    /// The generated content tree.
    pub content: serde_json::Value,
    /// Content path the content was generated for.
    pub content_path: String,
    /// Namespace in effect at generation time.
    pub namespace: String,
    /// Query parameters in effect at generation time.
    pub query_params: QueryParams,
}

impl ContentSnapshot {
    /// Digest of the content tree only. Path, namespace and query
    /// parameters do not contribute.
    pub fn digest(&self) -> Result<ContentDigest> {
        ContentDigest::of(&self.content)
    }
}
