//! In-memory run backend for tests and demos.
//!
//! Feeds are registered per run id, either scripted up front ([`MockRunBackend::script`]) or
//! pushed live through a channel ([`MockRunBackend::live_feed`]). Each feed is consumed by
//! the first subscription to its run. Decisions are recorded and can be made to fail.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::backend::{EventStream, RunBackend};
use crate::error::{BackendError, StreamError};
use crate::types::{Resolution, RunEvent};

/// Sender side of a live mock feed; drop it to end the feed.
pub type FeedSender = mpsc::UnboundedSender<Result<RunEvent, StreamError>>;

enum Feed {
    Scripted(Vec<Result<RunEvent, StreamError>>),
    Live(mpsc::UnboundedReceiver<Result<RunEvent, StreamError>>),
}

#[derive(Default)]
struct MockState {
    feeds: HashMap<String, Feed>,
    subscribe_failure: Option<StreamError>,
    decision_failure: Option<BackendError>,
    decisions: Vec<(String, Resolution)>,
    subscriptions: Vec<String>,
}

#[derive(Default)]
pub struct MockRunBackend {
    state: Mutex<MockState>,
}

impl MockRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a finite feed of events for `run_id`.
    pub fn with_events(self, run_id: &str, events: Vec<RunEvent>) -> Self {
        self.script(run_id, events.into_iter().map(Ok).collect());
        self
    }

    /// Registers a finite feed that may contain errors.
    pub fn script(&self, run_id: &str, items: Vec<Result<RunEvent, StreamError>>) {
        self.lock()
            .feeds
            .insert(run_id.to_string(), Feed::Scripted(items));
    }

    /// Registers an open-ended feed for `run_id` and returns its sender.
    pub fn live_feed(&self, run_id: &str) -> FeedSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().feeds.insert(run_id.to_string(), Feed::Live(rx));
        tx
    }

    pub fn set_subscribe_failure(&self, error: Option<StreamError>) {
        self.lock().subscribe_failure = error;
    }

    pub fn set_decision_failure(&self, error: Option<BackendError>) {
        self.lock().decision_failure = error;
    }

    /// Decisions submitted, in call order (including failed calls).
    pub fn decisions(&self) -> Vec<(String, Resolution)> {
        self.lock().decisions.clone()
    }

    /// Run ids subscribed to, in call order.
    pub fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.clone()
    }
}

#[async_trait]
impl RunBackend for MockRunBackend {
    async fn subscribe(&self, run_id: &str) -> Result<EventStream, StreamError> {
        let mut state = self.lock();
        state.subscriptions.push(run_id.to_string());
        if let Some(ref e) = state.subscribe_failure {
            return Err(e.clone());
        }
        match state.feeds.remove(run_id) {
            Some(Feed::Scripted(items)) => Ok(futures::stream::iter(items).boxed()),
            Some(Feed::Live(rx)) => Ok(UnboundedReceiverStream::new(rx).boxed()),
            None => Err(StreamError::Subscribe(BackendError::Status {
                status: 404,
                body: format!("no feed for run {}", run_id),
            })),
        }
    }

    async fn submit_decision(
        &self,
        approval_id: &str,
        resolution: Resolution,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.decisions.push((approval_id.to_string(), resolution));
        match state.decision_failure {
            Some(ref e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
