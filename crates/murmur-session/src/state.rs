//! Session state machine with thread-safe transitions.
//!
//! Enforces the dictation lifecycle:
//! - Idle -> Recording (confirmed press)
//! - Recording -> Transcribing (release)
//! - Transcribing -> Inserting (non-empty transcript)
//! - Inserting -> Idle (session complete)
//! - Transcribing -> Idle (empty capture / empty transcript / failure)

use std::fmt;
use std::sync::{Arc, Mutex};

use murmur_core::error::MurmurError;

/// Operational state of the dictation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session in progress. Ready for a confirmed press.
    Idle,
    /// Hotkey held; microphone capture is running.
    Recording,
    /// Audio captured; the streaming transcription round-trip is in flight.
    Transcribing,
    /// Transcript ready; handing text to the inserter.
    Inserting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Recording => write!(f, "Recording"),
            SessionState::Transcribing => write!(f, "Transcribing"),
            SessionState::Inserting => write!(f, "Inserting"),
        }
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle, SessionState::Recording)
                | (SessionState::Recording, SessionState::Transcribing)
                | (SessionState::Transcribing, SessionState::Inserting)
                | (SessionState::Inserting, SessionState::Idle)
                // Short-circuit: nothing captured, nothing transcribed, or failure.
                | (SessionState::Transcribing, SessionState::Idle)
        )
    }
}

/// Thread-safe state machine for the single process-wide session.
///
/// Wraps `SessionState` in an `Arc<Mutex<>>`; clones share the same state.
/// Transitions are validated under the lock, so no two threads ever observe
/// an inconsistent intermediate state. Callers use a failed transition as
/// an ignore-guard (e.g. a press while not Idle is a no-op).
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<SessionState>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> SessionState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: SessionState) -> Result<(), MurmurError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Session state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(MurmurError::Session(format!(
                "Invalid session transition: {} -> {}",
                *state, target
            )))
        }
    }

    /// Force the state back to Idle. Runs on every worker exit path.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if *state != SessionState::Idle {
            tracing::debug!("Session state reset to Idle from {}", *state);
            *state = SessionState::Idle;
        }
    }
}
