use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::{BackendError, StreamError};
use crate::types::{Resolution, RunEvent};

/// Live feed of one run's events, in server order. Ends after a terminal event or on error.
pub type EventStream = BoxStream<'static, Result<RunEvent, StreamError>>;

/// Run/event service: subscribe to a run's events and submit approval decisions.
#[async_trait]
pub trait RunBackend: Send + Sync {
    async fn subscribe(&self, run_id: &str) -> Result<EventStream, StreamError>;
    async fn submit_decision(
        &self,
        approval_id: &str,
        resolution: Resolution,
    ) -> Result<(), BackendError>;
}
