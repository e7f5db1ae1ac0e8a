//! The per-subscription poll, diff and emit loop.

use crate::cancel::CancelToken;
use crate::error::StreamError;
use crate::events::StreamEvent;
use crate::paths::not_found_redirect_path;
use crate::provider::{ContentProvider, ContentRequest, ProviderError};
use crate::state::ViewState;
use crate::types::{ContentDigest, ContentSnapshot};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// Outcome of a single poll cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Content matched the previous cycle; nothing emitted.
    Unchanged,
    /// Content changed and a `ContentUpdated` event was emitted.
    Changed,
    /// The provider reported not-found; the shared content path now points here.
    Redirected(String),
    /// Generation or digesting failed; an `Error` event was emitted.
    Failed,
    /// Cancellation was observed before anything was emitted.
    Cancelled,
}

/// Regenerates content for one subscription and emits it when it changes.
pub struct ContentStream {
    subscription_id: String,
    content_path: String,
    state: Arc<dyn ViewState>,
    provider: Arc<dyn ContentProvider>,
    poll_interval: Duration,
    previous: Option<ContentDigest>,
}

impl ContentStream {
    pub fn new(
        subscription_id: impl Into<String>,
        content_path: impl Into<String>,
        state: Arc<dyn ViewState>,
        provider: Arc<dyn ContentProvider>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            content_path: content_path.into(),
            state,
            provider,
            poll_interval,
            previous: None,
        }
    }

    /// Digest of the last emitted content.
    pub fn previous_digest(&self) -> Option<ContentDigest> {
        self.previous
    }

    /// Poll until `cancel` fires.
    ///
    /// The first poll runs immediately. Cancellation is checked before every
    /// poll and wins over an elapsed interval.
    pub fn run(mut self, cancel: CancelToken) {
        let span = info_span!(
            "content_stream",
            subscription_id = %self.subscription_id,
            content_path = %self.content_path
        );
        let _guard = span.enter();
        info!("content stream started");

        let mut polls: u64 = 0;
        while !cancel.is_cancelled() {
            self.poll_once(&cancel);
            polls += 1;

            if cancel.wait_timeout(self.poll_interval) {
                break;
            }
        }

        info!(polls, "content stream stopped");
    }

    /// Run one generate, digest and compare cycle.
    pub fn poll_once(&mut self, cancel: &CancelToken) -> PollOutcome {
        let start = Instant::now();
        let outcome = self.poll_inner(cancel);
        debug!(
            subscription_id = %self.subscription_id,
            outcome = ?outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "poll complete"
        );
        outcome
    }

    fn poll_inner(&mut self, cancel: &CancelToken) -> PollOutcome {
        // View state is read fresh every cycle.
        let namespace = self.state.namespace();
        let filters = self.state.filters();
        let query_params = self.state.query_params();

        let request = ContentRequest {
            content_path: &self.content_path,
            namespace: &namespace,
            filters: &filters,
            cancel,
        };
        let generated = self.provider.generate(&request);

        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        let content = match generated {
            Ok(content) => content,
            Err(ProviderError::NotFound { path, redirect }) => {
                // The provider may report a path relative to itself, so the
                // parent is taken from the streamed path.
                let target =
                    redirect.unwrap_or_else(|| not_found_redirect_path(&self.content_path));
                debug!(
                    subscription_id = %self.subscription_id,
                    path = %path,
                    redirect = %target,
                    "path not found, redirecting to parent"
                );
                self.state.set_content_path(&target);
                return PollOutcome::Redirected(target);
            }
            Err(err) => return self.fail(err.into()),
        };

        let snapshot = ContentSnapshot {
            content,
            content_path: self.content_path.clone(),
            namespace,
            query_params,
        };

        let digest = match snapshot.digest() {
            Ok(digest) => digest,
            Err(err) => return self.fail(err),
        };

        if self.previous == Some(digest) {
            return PollOutcome::Unchanged;
        }

        self.state
            .client()
            .send(StreamEvent::content_updated(snapshot, self.subscription_id.as_str()));
        self.previous = Some(digest);
        PollOutcome::Changed
    }

    fn fail(&self, err: StreamError) -> PollOutcome {
        warn!(
            subscription_id = %self.subscription_id,
            content_path = %self.content_path,
            error = %err,
            "content generation failed"
        );
        self.state.client().send(StreamEvent::error(&err));
        PollOutcome::Failed
    }
}
