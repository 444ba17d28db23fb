//! Server-sent event stream decoding.
//!
//! Only `data:` fields matter to the client. Consecutive `data:` lines are
//! joined with `\n` and dispatched on a blank line; comments (lines starting
//! with `:`) and the `event`, `id` and `retry` fields are ignored. Bytes may
//! arrive split anywhere, including inside a UTF-8 sequence.

use std::collections::VecDeque;

use bytes::Bytes;
use field_common::{FieldMapError, ServerEvent};
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Incremental decoder turning raw bytes into message `data` strings.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the data of every message it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut messages = Vec::new();

        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(message) = self.line(&line) {
                messages.push(message);
            }
        }
        messages
    }

    fn line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            return Some(std::mem::take(&mut self.data).join("\n"));
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}

/// Decode a byte stream into [`ServerEvent`]s.
///
/// Events for entities the client does not know are logged and skipped.
/// Malformed events and transport errors are yielded as errors without
/// ending the stream.
pub fn decode_events<S, E>(bytes: S) -> impl Stream<Item = ApiResult<ServerEvent>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<ApiError>,
{
    futures::stream::unfold(
        (bytes, SseDecoder::new(), VecDeque::<String>::new()),
        |(mut bytes, mut decoder, mut queued)| async move {
            loop {
                if let Some(data) = queued.pop_front() {
                    match ServerEvent::parse(&data) {
                        Ok(event) => {
                            debug!(entity = %event.entity, action = %event.action, "Server event");
                            return Some((Ok(event), (bytes, decoder, queued)));
                        }
                        Err(FieldMapError::UnknownEntity(entity)) => {
                            warn!(entity = %entity, "Skipping event for unknown entity");
                            continue;
                        }
                        Err(err) => return Some((Err(err.into()), (bytes, decoder, queued))),
                    }
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => queued.extend(decoder.feed(&chunk)),
                    Some(Err(err)) => return Some((Err(err.into()), (bytes, decoder, queued))),
                    None => return None,
                }
            }
        },
    )
}
