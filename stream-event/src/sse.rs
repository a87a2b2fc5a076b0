//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::push`] buffers partial lines and returns
//! every frame completed by the chunk. Lines are split on `\n` (a trailing `\r` is dropped),
//! `:` lines are comments, and a blank line dispatches the pending frame. A frame with any
//! line that is not UTF-8 is dispatched as [`ValidationError::Malformed`].

use crate::parse::ValidationError;

/// One dispatched SSE frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field, when present.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// `id:` field, when present.
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    /// Set when a line of the pending frame failed UTF-8 decoding.
    invalid: Option<String>,
}

pub type FrameResult = Result<SseFrame, ValidationError>;

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns frames completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FrameResult> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(frame) = self.feed_bytes(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Dispatches a frame left pending when the body ends without a blank line.
    pub fn finish(&mut self) -> Option<FrameResult> {
        if !self.buf.is_empty() {
            let mut rest = std::mem::take(&mut self.buf);
            if rest.last() == Some(&b'\r') {
                rest.pop();
            }
            if let Some(frame) = self.feed_bytes(rest) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn feed_bytes(&mut self, line: Vec<u8>) -> Option<FrameResult> {
        match String::from_utf8(line) {
            Ok(line) => self.feed_line(&line),
            Err(e) => {
                let reason = format!("event stream is not UTF-8: {}", e.utf8_error());
                self.invalid.get_or_insert(reason);
                None
            }
        }
    }

    fn feed_line(&mut self, line: &str) -> Option<FrameResult> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<FrameResult> {
        if let Some(reason) = self.invalid.take() {
            self.event = None;
            self.data.clear();
            return Some(Err(ValidationError::Malformed(reason)));
        }
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        let frame = SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.id.clone(),
        };
        Some(Ok(frame))
    }
}
