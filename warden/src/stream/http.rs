//! HTTP run backend: server-sent events for the feed, JSON POST for decisions.
//!
//! - `GET /runs/{id}/events` (`text/event-stream`): one JSON [`RunEvent`] per `data:` frame.
//!   Frames with `event: ping` are keepalives and skipped.
//! - `POST /approvals/{id}/decision` with `{"decision": "approved" | "rejected"}`.

use std::collections::VecDeque;
use std::fmt::Display;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Method;
use serde::Serialize;
use stream_event::{parse_event, FrameResult, SseDecoder};

use super::backend::{EventStream, RunBackend};
use crate::client::ApiClient;
use crate::error::{BackendError, StreamError, ValidationError};
use crate::types::{Resolution, RunEvent};

pub struct HttpRunBackend {
    client: ApiClient,
}

impl HttpRunBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct DecisionBody {
    decision: Resolution,
}

fn frame_to_event(frame: FrameResult) -> Option<Result<RunEvent, StreamError>> {
    let frame = match frame {
        Ok(frame) => frame,
        Err(e) => return Some(Err(StreamError::Validation(ValidationError::Event(e)))),
    };
    if frame.event.as_deref() == Some("ping") {
        return None;
    }
    Some(parse_event(&frame.data).map_err(|e| StreamError::Validation(ValidationError::Event(e))))
}

/// Turns a chunked SSE body into a stream of parsed events. A body error becomes the last item.
pub(crate) fn sse_events<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    struct State<S> {
        body: std::pin::Pin<Box<S>>,
        decoder: SseDecoder,
        queue: VecDeque<Result<RunEvent, StreamError>>,
        done: bool,
    }

    let state = State {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        queue: VecDeque::new(),
        done: false,
    };
    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.queue.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    let frames = st.decoder.push(chunk.as_ref());
                    st.queue.extend(frames.into_iter().filter_map(frame_to_event));
                }
                Some(Err(e)) => {
                    st.done = true;
                    st.queue.push_back(Err(StreamError::Transport(e.to_string())));
                }
                None => {
                    st.done = true;
                    if let Some(item) = st.decoder.finish().and_then(frame_to_event) {
                        st.queue.push_back(item);
                    }
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl RunBackend for HttpRunBackend {
    async fn subscribe(&self, run_id: &str) -> Result<EventStream, StreamError> {
        let resp = self
            .client
            .open_event_stream(&format!("/runs/{}/events", run_id))
            .await?;
        Ok(sse_events(resp.bytes_stream()))
    }

    async fn submit_decision(
        &self,
        approval_id: &str,
        resolution: Resolution,
    ) -> Result<(), BackendError> {
        self.client
            .send_json(
                Method::POST,
                &format!("/approvals/{}/decision", approval_id),
                &DecisionBody {
                    decision: resolution,
                },
            )
            .await
    }
}
