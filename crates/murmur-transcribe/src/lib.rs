//! Murmur transcribe crate - streaming HTTP transcription client.
//!
//! One multipart POST per utterance against an OpenAI-compatible
//! `/audio/transcriptions` endpoint with `stream=true`; the server-sent
//! `data:` lines are parsed incrementally and each text delta is forwarded
//! to the caller as it arrives.

pub mod client;
pub mod sse;

pub use client::StreamingTranscriber;
pub use sse::{parse_line, SseLine};
