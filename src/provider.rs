//! Content providers turn a content path into a content tree.

use crate::cancel::CancelToken;
use crate::paths::first_segment;
use crate::types::Filter;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Errors reported by a content provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The path does not exist. `redirect` optionally names where to go instead.
    #[error("content path not found: {path}")]
    NotFound {
        path: String,
        redirect: Option<String>,
    },

    #[error("{0}")]
    Failed(String),
}

impl ProviderError {
    pub fn not_found(path: impl Into<String>) -> Self {
        ProviderError::NotFound {
            path: path.into(),
            redirect: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ProviderError::Failed(message.into())
    }
}

/// Inputs for one content generation call.
#[derive(Debug, Clone, Copy)]
pub struct ContentRequest<'a> {
    pub content_path: &'a str,
    pub namespace: &'a str,
    pub filters: &'a [Filter],
    /// Cancelled when the owning subscription is destroyed. Long-running
    /// providers should check it and return early.
    pub cancel: &'a CancelToken,
}

/// Generates content for a path.
pub trait ContentProvider: Send + Sync {
    fn generate(&self, request: &ContentRequest<'_>) -> Result<serde_json::Value, ProviderError>;
}

impl<F> ContentProvider for F
where
    F: Fn(&ContentRequest<'_>) -> Result<serde_json::Value, ProviderError> + Send + Sync,
{
    fn generate(&self, request: &ContentRequest<'_>) -> Result<serde_json::Value, ProviderError> {
        self(request)
    }
}

/// Options passed to a [`Module`] when generating content.
#[derive(Debug, Clone, Default)]
pub struct ContentOptions {
    pub namespace: String,
    /// Label selector built from the active filters.
    pub label_set: BTreeMap<String, String>,
}

impl ContentOptions {
    fn from_request(request: &ContentRequest<'_>) -> Self {
        Self {
            namespace: request.namespace.to_string(),
            label_set: filters_to_label_set(request.filters),
        }
    }
}

/// Convert filters into a label set. Later filters win on duplicate keys.
pub fn filters_to_label_set(filters: &[Filter]) -> BTreeMap<String, String> {
    filters
        .iter()
        .map(|f| (f.key.clone(), f.value.clone()))
        .collect()
}

/// A named section of the dashboard that owns every path under its name.
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// Generate content for `module_path`, the content path with the module
    /// name stripped.
    fn content(
        &self,
        module_path: &str,
        options: &ContentOptions,
    ) -> Result<serde_json::Value, ProviderError>;
}

/// Provider that routes each content path to the module owning its first segment.
#[derive(Default)]
pub struct ModuleRouter {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Earlier registrations win on name clashes.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Module that owns `content_path`.
    pub fn module_for_content_path(&self, content_path: &str) -> Option<&Arc<dyn Module>> {
        let name = first_segment(content_path);
        self.modules.iter().find(|m| m.name() == name)
    }
}

impl ContentProvider for ModuleRouter {
    fn generate(&self, request: &ContentRequest<'_>) -> Result<serde_json::Value, ProviderError> {
        let start = Instant::now();
        let content_path = request.content_path;

        let module = self.module_for_content_path(content_path).ok_or_else(|| {
            ProviderError::failed(format!(
                "unable to find module for content path {:?}",
                content_path
            ))
        })?;

        let module_path = content_path
            .trim_start_matches('/')
            .strip_prefix(module.name())
            .unwrap_or_default();
        let result = module.content(module_path, &ContentOptions::from_request(request));

        debug!(
            content_path,
            module = module.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generated content"
        );

        result
    }
}
