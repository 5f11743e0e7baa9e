//! Murmur session crate - the dictation session state machine and the
//! orchestrator that binds hotkey, capture, transcription, and insertion.
//!
//! Exactly one session is ever in flight. The lifecycle is a strict cycle:
//! Idle -> Recording -> Transcribing -> {Inserting | Idle} -> Idle, with all
//! transitions serialized through one session lock.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{
    CaptureSource, LevelMeter, RecordingIndicator, SessionOrchestrator, SessionUi, TextInserter,
    Transcriber, TranscriptDisplay,
};
pub use state::{SessionState, StateMachine};
