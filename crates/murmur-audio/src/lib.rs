//! Murmur audio crate - microphone capture and WAV encoding.
//!
//! One utterance at a time: `AudioCapture` accumulates 16-bit mono sample
//! blocks from the cpal callback thread and drains them into a WAV byte
//! payload on stop. A lock-free loudness scalar feeds the terminal meter.

pub mod capture;
pub mod wav;

pub use capture::{AudioCapture, CaptureBuffer};
pub use wav::encode_wav;
