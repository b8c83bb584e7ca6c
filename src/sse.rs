//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module handles parsing of the `alt=sse` stream returned by
//! `streamGenerateContent`, converting raw byte streams into
//! [`GenerateContentResponse`] chunks.  Each event carries one JSON chunk in
//! its `data:` lines; events are separated by a blank line.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};
use crate::{Error, GenerateContentResponse, Result};

/// Process a stream of bytes into a stream of response chunks.
///
/// Transport errors and undecodable events are yielded as `Err` items; the
/// caller decides whether to stop.  Comment-only and empty events are skipped.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    let stream = byte_stream.map(|result| {
        result.map_err(|e| {
            STREAM_ERRORS.click();
            Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
        })
    });

    // Bytes are buffered until they decode; a UTF-8 sequence may straddle chunks.
    let pending: Vec<u8> = Vec::new();
    let buffer = String::new();

    stream::unfold(
        (stream, pending, buffer),
        move |(mut stream, mut pending, mut buffer)| async move {
            loop {
                if let Some((event, remaining)) = extract_event(&buffer) {
                    buffer = remaining;
                    match event {
                        Some(event) => return Some((event, (stream, pending, buffer))),
                        None => continue,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        pending.extend_from_slice(&bytes);
                        match std::str::from_utf8(&pending) {
                            Ok(text) => {
                                push_normalized(&mut buffer, text);
                                pending.clear();
                            }
                            Err(e) if e.error_len().is_none() => {
                                let valid = e.valid_up_to();
                                if let Ok(text) = std::str::from_utf8(&pending[..valid]) {
                                    push_normalized(&mut buffer, text);
                                }
                                pending.drain(..valid);
                            }
                            Err(e) => {
                                STREAM_ERRORS.click();
                                pending.clear();
                                return Some((
                                    Err(Error::encoding(
                                        format!("Invalid UTF-8 in stream: {e}"),
                                        Some(Box::new(e)),
                                    )),
                                    (stream, pending, buffer),
                                ));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, pending, buffer)));
                    }
                    None => {
                        // A final event may lack its trailing blank line.
                        if !buffer.trim().is_empty() {
                            buffer.push_str("\n\n");
                            if let Some((Some(event), _)) = extract_event(&buffer) {
                                buffer.clear();
                                return Some((event, (stream, pending, buffer)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Append `text` with CRLF line endings folded to LF.
///
/// A CRLF may straddle two reads, leaving a bare `\r` at the end of the buffer.
fn push_normalized(buffer: &mut String, text: &str) {
    if buffer.ends_with('\r') && text.starts_with('\n') {
        buffer.pop();
    }
    buffer.push_str(&text.replace("\r\n", "\n"));
}

/// Extract a complete SSE event from a buffer string.
///
/// Returns `None` when no complete event is buffered.  Otherwise returns the
/// parsed event (or `None` for an event without data) and the rest of the
/// buffer.
fn extract_event(buffer: &str) -> Option<(Option<Result<GenerateContentResponse>>, String)> {
    let (event_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let mut data = Vec::new();
    for line in event_text.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data.is_empty() {
        return Some((None, rest));
    }
    let data = data.join("\n");
    if data.trim().is_empty() {
        return Some((None, rest));
    }

    Some((Some(parse_chunk(&data)), rest))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error { error: StreamError },
    Chunk(GenerateContentResponse),
}

#[derive(Deserialize)]
struct StreamError {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

/// Parse one `data:` payload.  An `{"error": ...}` payload mid-stream becomes
/// an API error.
fn parse_chunk(data: &str) -> Result<GenerateContentResponse> {
    match serde_json::from_str::<StreamPayload>(data) {
        Ok(StreamPayload::Chunk(chunk)) => {
            STREAM_CHUNKS.click();
            Ok(chunk)
        }
        Ok(StreamPayload::Error { error }) => {
            STREAM_ERRORS.click();
            Err(Error::api(
                error.code.unwrap_or(500),
                error.status,
                error
                    .message
                    .unwrap_or_else(|| "error event in response stream".to_string()),
            ))
        }
        Err(e) => {
            STREAM_ERRORS.click();
            Err(Error::serialization(
                format!("Failed to parse chunk JSON: {e}"),
                Some(Box::new(e)),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    const TEXT_CHUNK: &str =
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"}]}}]}"#;

    fn text_of(chunk: &GenerateContentResponse) -> Option<&str> {
        chunk.candidates()[0].content.as_ref()?.parts()[0].as_text()
    }

    #[tokio::test]
    async fn parse_single_event() {
        let data = format!("data: {TEXT_CHUNK}\r\n\r\n");
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(text_of(&chunk), Some("Hello"));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn parse_multiple_events() {
        let data = format!("data: {TEXT_CHUNK}\n\ndata: {TEXT_CHUNK}\n\n");
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        assert!(sse_stream.next().await.unwrap().is_ok());
        assert!(sse_stream.next().await.unwrap().is_ok());
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_split_event() {
        let (head, tail) = TEXT_CHUNK.split_at(20);
        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::from(format!("data: {head}"))),
            Ok(Bytes::from(format!("{tail}\r\n\r\n"))),
        ]));

        let mut sse_stream = Box::pin(process_sse(stream));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(text_of(&chunk), Some("Hello"));
    }

    #[tokio::test]
    async fn handle_crlf_split_across_reads() {
        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::from(format!("data: {TEXT_CHUNK}\r\n\r"))),
            Ok(Bytes::from(format!("\ndata: {TEXT_CHUNK}\r"))),
            Ok(Bytes::from("\n\r\n")),
        ]));

        let mut sse_stream = Box::pin(process_sse(stream));
        let first = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(text_of(&first), Some("Hello"));
        let second = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(text_of(&second), Some("Hello"));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_split_utf8_sequence() {
        let data = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"caf\u{e9}\"}]}}]}\n\n";
        let bytes = data.as_bytes();
        let split = data.find('\u{e9}').unwrap() + 1;
        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::copy_from_slice(&bytes[..split])),
            Ok(Bytes::copy_from_slice(&bytes[split..])),
        ]));

        let mut sse_stream = Box::pin(process_sse(stream));
        let chunk = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(text_of(&chunk), Some("caf\u{e9}"));
    }

    #[tokio::test]
    async fn skip_comments_and_empty_events() {
        let data = format!(": keep-alive\n\n\n\ndata: {TEXT_CHUNK}\n\n");
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        assert!(sse_stream.next().await.unwrap().is_ok());
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn final_event_without_blank_line() {
        let data = format!("data: {TEXT_CHUNK}\n");
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        assert!(sse_stream.next().await.unwrap().is_ok());
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_malformed_event() {
        let data = b"data: {not json\n\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();
        assert!(event.is_err());
    }

    #[tokio::test]
    async fn error_payload_becomes_api_error() {
        let data = br#"data: {"error": {"code": 503, "message": "overloaded", "status": "UNAVAILABLE"}}

"#;
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let err = sse_stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("overloaded"));
    }
}
