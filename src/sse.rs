//! Server-Sent Events (SSE) processing for streaming completions.
//!
//! This module turns the raw byte stream of a `chat/completions` response into parsed
//! [`ChatCompletionChunk`]s.  Each event is a run of `field: value` lines ended by a blank
//! line; the stream ends with `data: [DONE]`.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};
use crate::{ChatCompletionChunk, Error, Result};

/// Marker that terminates an OpenAI-style event stream.
const DONE_MARKER: &str = "[DONE]";

/// Error envelope sent by the service, both as an HTTP error body and mid-stream.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(rename = "type")]
    pub(crate) error_type: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) param: Option<String>,
}

/// What a single SSE event decoded to.
enum Decoded {
    Chunk(Result<ChatCompletionChunk>),
    Done,
    Skip,
}

/// Process a stream of bytes into a stream of completion chunks.
///
/// Bytes are buffered until a full event is available, so events and multi-byte characters
/// may be split arbitrarily across network reads.  The returned stream ends at `[DONE]` or
/// when the body ends, whichever comes first.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();
    let finished = false;

    stream::unfold(
        (stream, buffer, finished),
        move |(mut stream, mut buffer, finished)| async move {
            if finished {
                return None;
            }
            loop {
                // First drain any complete events already buffered
                while let Some((end, rest)) = find_event_boundary(&buffer) {
                    let event: Vec<u8> = buffer.drain(..rest).take(end).collect();
                    match decode_event(&event) {
                        Decoded::Chunk(chunk) => {
                            count_chunk(&chunk);
                            return Some((chunk, (stream, buffer, false)));
                        }
                        Decoded::Done => return None,
                        Decoded::Skip => continue,
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, true)));
                    }
                    None => {
                        // End of body; a final event may lack its blank line
                        let event = std::mem::take(&mut buffer);
                        return match decode_event(&event) {
                            Decoded::Chunk(chunk) => {
                                count_chunk(&chunk);
                                Some((chunk, (stream, buffer, true)))
                            }
                            Decoded::Done | Decoded::Skip => None,
                        };
                    }
                }
            }
        },
    )
}

fn count_chunk(chunk: &Result<ChatCompletionChunk>) {
    if chunk.is_ok() {
        STREAM_CHUNKS.click();
    } else {
        STREAM_ERRORS.click();
    }
}

/// Locate the blank line ending the first event.
///
/// Returns the length of the event and the offset where the next event begins.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < buffer.len() {
        if buffer[i] == b'\n' {
            let next = i + 1;
            if buffer.get(next) == Some(&b'\n') {
                return Some((i, next + 1));
            }
            if buffer.get(next) == Some(&b'\r') && buffer.get(next + 1) == Some(&b'\n') {
                return Some((i, next + 2));
            }
        }
        i += 1;
    }
    None
}

/// Decode the lines of one event.
fn decode_event(event: &[u8]) -> Decoded {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => {
            return Decoded::Chunk(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let mut event_type = None;
    let mut data: Option<String> = None;
    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event_type = Some(value.to_string()),
            "data" => match data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            // id and retry carry nothing a chat session needs
            _ => {}
        }
    }

    let Some(data) = data else {
        return Decoded::Skip;
    };
    let data = data.trim();
    if data == DONE_MARKER {
        return Decoded::Done;
    }
    if data.is_empty() {
        return Decoded::Skip;
    }

    if let Ok(envelope) = serde_json::from_str::<ErrorResponse>(data) {
        return Decoded::Chunk(Err(stream_error(envelope.error)));
    }
    if event_type.as_deref() == Some("error") {
        return Decoded::Chunk(Err(Error::api(
            500,
            Some("stream_error".to_string()),
            data.to_string(),
            None,
        )));
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => Decoded::Chunk(Ok(chunk)),
        Err(e) => Decoded::Chunk(Err(Error::serialization(
            format!("Failed to parse chunk JSON: {e}"),
            Some(Box::new(e)),
        ))),
    }
}

fn stream_error(detail: ErrorDetail) -> Error {
    let message = detail
        .message
        .unwrap_or_else(|| "error event without a message".to_string());
    match detail.error_type.as_deref() {
        Some("invalid_request_error") => Error::bad_request(message, detail.param),
        Some("authentication_error") | Some("invalid_api_key") => Error::authentication(message),
        Some("rate_limit_exceeded") | Some("rate_limit_error") => Error::rate_limit(message, None),
        _ => Error::api(500, detail.error_type, message, None),
    }
}
