//! Incremental decoder for server-sent-event completion streams.
//!
//! The backend delivers response bodies as arbitrary byte chunks that do not
//! respect event, line, or even UTF-8 character boundaries. [`SseDecoder`]
//! buffers bytes and yields complete text deltas as soon as the newline
//! terminating their `data:` line arrives. [`decode_stream`] wraps a raw
//! byte stream in a decoder and exposes it as a stream of deltas.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{trace, warn};

use redraft_core::{Error, Result, TokenStream};

use crate::types::StreamPayload;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Incremental SSE decoder.
///
/// Feed it raw bytes as they arrive; it returns the text deltas completed by
/// each feed. Splitting the same byte sequence differently never changes the
/// concatenated output, since deltas are only emitted on complete lines and
/// a multi-byte UTF-8 sequence never contains the `\n` byte.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal `[DONE]` marker has been seen. Any bytes fed
    /// after that are ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of raw response bytes, returning the deltas completed by
    /// this chunk in arrival order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buf.extend_from_slice(bytes);

        let mut deltas = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(delta) = self.process_line(&line[..line.len() - 1]) {
                deltas.push(delta);
            }
            if self.done {
                break;
            }
        }
        deltas
    }

    /// Flush any trailing payload left in the buffer when the transport
    /// closes without a final newline or `[DONE]` marker.
    pub fn finish(&mut self) -> Option<String> {
        if self.done || self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        self.done = true;
        self.process_line(&line)
    }

    fn process_line(&mut self, line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();

        // Blank lines separate events; lines starting with ':' are comments
        // (keep-alives from some proxies). Both carry no payload.
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let payload = match line.strip_prefix(DATA_PREFIX) {
            Some(rest) => rest.trim_start(),
            // Not an SSE field we understand (e.g. `event:`); skip.
            None => return None,
        };

        if payload == DONE_MARKER {
            trace!("stream terminator received");
            self.done = true;
            return None;
        }

        match serde_json::from_str::<StreamPayload>(payload) {
            Ok(parsed) => parsed.into_delta(),
            Err(e) => {
                warn!(error = %e, "skipping unparseable stream payload");
                None
            }
        }
    }
}

/// Adapt a raw byte stream (e.g. `reqwest::Response::bytes_stream`) into a
/// stream of decoded text deltas.
///
/// Transport errors surface as a single `Err` item and terminate the stream.
pub fn decode_stream<S>(bytes: S) -> TokenStream
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    Box::pin(DecodedStream {
        inner: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    })
}

struct DecodedStream {
    inner: Pin<Box<dyn Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl Stream for DecodedStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(delta) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(delta)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match self.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let deltas = self.decoder.feed(&bytes);
                    self.pending.extend(deltas);
                    if self.decoder.is_done() {
                        self.finished = true;
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(Error::Request(e.to_string()))));
                }
                Poll::Ready(None) => {
                    self.finished = true;
                    if let Some(delta) = self.decoder.finish() {
                        self.pending.push_back(delta);
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
