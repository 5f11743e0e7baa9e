//! The session orchestrator: binds the hotkey edge callbacks to capture,
//! transcription, and insertion.
//!
//! Threading model: the press/release callbacks arrive on the input-tap
//! thread; audio blocks arrive on the driver thread; each session spawns
//! one loudness-poll thread (lives while Recording) and at most one worker
//! thread (network round-trip + insertion). State transitions are the only
//! cross-thread synchronization point.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use murmur_audio::AudioCapture;
use murmur_core::error::Result;

use crate::state::{SessionState, StateMachine};

/// Source of captured audio for one utterance at a time.
///
/// `stop` returns the encoded payload; a zero-length payload means "no
/// audio captured" and is not an error.
pub trait CaptureSource: Send + Sync {
    fn start(&self) -> Result<()>;
    fn stop(&self) -> Result<Vec<u8>>;
    fn current_loudness(&self) -> f32;
}

impl CaptureSource for AudioCapture {
    fn start(&self) -> Result<()> {
        AudioCapture::start(self)
    }

    fn stop(&self) -> Result<Vec<u8>> {
        AudioCapture::stop(self)
    }

    fn current_loudness(&self) -> f32 {
        AudioCapture::current_loudness(self)
    }
}

/// Streaming transcription of one utterance payload.
pub trait Transcriber: Send + Sync {
    /// Transcribe the payload, invoking `on_delta` for each text fragment
    /// as it arrives, and return the full concatenated text.
    fn transcribe(&self, wav: &[u8], on_delta: &dyn Fn(&str)) -> Result<String>;
}

/// Transfers final text into the focused application.
pub trait TextInserter: Send + Sync {
    fn insert(&self, text: &str) -> Result<()>;
}

/// The always-on-top "recording" indicator.
pub trait RecordingIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// The input-level meter fed by the loudness poll thread.
pub trait LevelMeter: Send + Sync {
    fn update(&self, level: f32);
}

/// Terminal echo of the streaming transcript.
pub trait TranscriptDisplay: Send + Sync {
    fn begin(&self);
    fn delta(&self, text: &str);
    fn finish(&self);
}

/// The user-visible collaborators, grouped. None of their return values are
/// consumed by the core.
pub struct SessionUi {
    pub indicator: Arc<dyn RecordingIndicator>,
    pub meter: Arc<dyn LevelMeter>,
    pub display: Arc<dyn TranscriptDisplay>,
}

/// Identity and timing of one session, for logging.
#[derive(Debug, Clone)]
struct SessionInfo {
    id: Uuid,
    started: DateTime<Utc>,
}

impl SessionInfo {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Utc::now(),
        }
    }

    fn elapsed_secs(&self) -> f32 {
        let elapsed = Utc::now() - self.started;
        elapsed.num_milliseconds() as f32 / 1000.0
    }
}

/// Resets the session state to Idle when dropped.
///
/// The worker thread holds one of these for its whole body, so the
/// restore-to-Idle guarantee covers every exit path, panics included.
struct IdleGuard {
    state: StateMachine,
}

impl Drop for IdleGuard {
    fn drop(&mut self) {
        self.state.reset();
    }
}

/// The dictation session orchestrator.
///
/// `on_confirmed_press` / `on_release` are wired to the hotkey detector.
/// A press is accepted only from Idle and a release only from Recording;
/// anything else is ignored, which is what keeps at most one session in
/// flight. An in-flight transcription is never cancelled: a re-press during
/// Transcribing is dropped by the same guard.
pub struct SessionOrchestrator {
    state: StateMachine,
    capture: Arc<dyn CaptureSource>,
    transcriber: Arc<dyn Transcriber>,
    inserter: Arc<dyn TextInserter>,
    ui: SessionUi,
    poll_interval: Duration,
    session: Mutex<Option<SessionInfo>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionOrchestrator {
    pub fn new(
        capture: Arc<dyn CaptureSource>,
        transcriber: Arc<dyn Transcriber>,
        inserter: Arc<dyn TextInserter>,
        ui: SessionUi,
        poll_interval: Duration,
    ) -> Self {
        Self {
            state: StateMachine::new(),
            capture,
            transcriber,
            inserter,
            ui,
            poll_interval,
            session: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Current session state (primarily for tests and the status line).
    pub fn current_state(&self) -> SessionState {
        self.state.current()
    }

    /// Confirmed-press edge: start recording.
    ///
    /// Ignored unless the session is Idle.
    pub fn on_confirmed_press(&self) {
        if self.state.transition(SessionState::Recording).is_err() {
            tracing::debug!(
                state = %self.state.current(),
                "Press ignored: session already in flight"
            );
            return;
        }

        let info = SessionInfo::new();
        tracing::info!(session_id = %info.id, "Recording started");
        *self.session.lock().expect("session mutex poisoned") = Some(info);

        if let Err(e) = self.capture.start() {
            tracing::error!(error = %e, "Failed to start audio capture");
            *self.session.lock().expect("session mutex poisoned") = None;
            self.state.reset();
            return;
        }

        self.ui.indicator.show();
        self.spawn_loudness_poll();
    }

    /// Release edge: stop recording and hand off to the worker.
    ///
    /// Ignored unless the session is Recording. The loudness poll thread
    /// notices the state change and winds down on its own.
    pub fn on_release(&self) {
        if self.state.transition(SessionState::Transcribing).is_err() {
            tracing::debug!(
                state = %self.state.current(),
                "Release ignored: not recording"
            );
            return;
        }

        let payload = self.capture.stop();
        self.ui.indicator.hide();

        let info = self
            .session
            .lock()
            .expect("session mutex poisoned")
            .take()
            .unwrap_or_else(SessionInfo::new);

        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(session_id = %info.id, error = %e, "Failed to stop capture");
                self.state.reset();
                return;
            }
        };

        if payload.is_empty() {
            tracing::info!(session_id = %info.id, "No audio captured");
            self.state.reset();
            return;
        }

        self.spawn_worker(info, payload);
    }

    /// Block until the current worker (if any) finishes.
    ///
    /// Used by tests for determinism and by the app at shutdown.
    pub fn wait_for_worker(&self) {
        let handle = self.worker.lock().expect("worker mutex poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn spawn_loudness_poll(&self) {
        let state = self.state.clone();
        let capture = Arc::clone(&self.capture);
        let meter = Arc::clone(&self.ui.meter);
        let interval = self.poll_interval;

        std::thread::spawn(move || {
            // Cooperative: bounded by the poll interval, not cancelled.
            while state.current() == SessionState::Recording {
                meter.update(capture.current_loudness());
                std::thread::sleep(interval);
            }
        });
    }

    fn spawn_worker(&self, info: SessionInfo, payload: Vec<u8>) {
        tracing::info!(
            session_id = %info.id,
            payload_bytes = payload.len(),
            "Transcription started"
        );

        let state = self.state.clone();
        let transcriber = Arc::clone(&self.transcriber);
        let inserter = Arc::clone(&self.inserter);
        let display = Arc::clone(&self.ui.display);

        let handle = std::thread::spawn(move || {
            let _guard = IdleGuard {
                state: state.clone(),
            };

            display.begin();
            let result = transcriber.transcribe(&payload, &|delta| display.delta(delta));
            display.finish();

            match result {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        tracing::info!(session_id = %info.id, "Empty transcription");
                        return;
                    }
                    if state.transition(SessionState::Inserting).is_err() {
                        return;
                    }
                    match inserter.insert(text) {
                        Ok(()) => tracing::info!(
                            session_id = %info.id,
                            chars = text.len(),
                            elapsed_secs = info.elapsed_secs(),
                            "Session complete"
                        ),
                        Err(e) => {
                            tracing::warn!(session_id = %info.id, error = %e, "Insertion failed")
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(session_id = %info.id, error = %e, "Transcription failed")
                }
            }
        });

        *self.worker.lock().expect("worker mutex poisoned") = Some(handle);
    }
}
