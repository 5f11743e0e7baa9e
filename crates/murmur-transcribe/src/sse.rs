//! Line-level parsing of the streaming transcription response.
//!
//! The body is a server-sent-event stream: `data: <json>` lines, a
//! `data: [DONE]` terminator, and assorted noise (comments, blank lines,
//! `event:` lines). Anything that is not a well-formed data line with a
//! non-empty text delta is skipped, not surfaced — a best-effort transcript
//! beats a fatal parse error mid-stream.

use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One streaming event as decoded from a data line's JSON payload.
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    text: Option<String>,
}

/// Classification of one line of the streaming body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// Not a data line, malformed JSON, or no text delta: ignore.
    Skip,
    /// The end-of-stream sentinel: stop reading (not an error).
    Done,
    /// A non-empty text delta to append and forward.
    Delta(String),
}

/// Classify a single line of the streaming response body.
pub fn parse_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Skip;
    };
    if payload == DONE_SENTINEL {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => match event.text {
            Some(text) if !text.is_empty() => SseLine::Delta(text),
            _ => SseLine::Skip,
        },
        Err(_) => SseLine::Skip,
    }
}
