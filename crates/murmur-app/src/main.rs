//! Murmur binary: wires the hotkey detector, audio capture, streaming
//! transcription client, and clipboard inserter into the session
//! orchestrator, then blocks on the global input listener.

mod cli;
mod display;
mod inserter;

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use murmur_core::auth::{redact, resolve_api_key};
use murmur_core::config::MurmurConfig;
use murmur_core::error::{MurmurError, Result};

use murmur_audio::AudioCapture;
use murmur_hotkey::{HotkeyDetector, KeyFlagEvent, KEYCODE_LEFT_OPTION, KEYCODE_RIGHT_OPTION};
use murmur_session::{SessionOrchestrator, SessionUi, Transcriber};
use murmur_transcribe::StreamingTranscriber;

use cli::{CliArgs, Command};
use display::{print_banner, TerminalUi};
use inserter::ClipboardInserter;

/// Loudness poll cadence for the level meter.
const METER_POLL: Duration = Duration::from_millis(50);

/// Adapts the HTTP client to the orchestrator's transcriber seam.
struct ApiTranscriber(StreamingTranscriber);

impl Transcriber for ApiTranscriber {
    fn transcribe(&self, wav: &[u8], on_delta: &dyn Fn(&str)) -> Result<String> {
        self.0.transcribe(wav, on_delta)
    }
}

fn main() {
    let args = CliArgs::parse();
    let config_path = args.resolve_config_path();
    let config = MurmurConfig::load_or_default(&config_path);

    let level = args.resolve_log_level(&config);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Some(Command::Config { key, value }) => cli::run_config_command(&config_path, key, value),
        None => run(config),
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal error");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config: MurmurConfig) -> Result<()> {
    let api_key = match resolve_api_key(&config) {
        Some(key) => key,
        None => {
            eprintln!("No API key found.");
            eprintln!("Set MURMUR_API_KEY or OPENAI_API_KEY, or add it to the config:");
            eprintln!("  murmur config transcription.api_key sk-...");
            process::exit(2);
        }
    };
    info!(api_key = %redact(&api_key), "API key resolved");

    print_banner(&config);

    let capture = Arc::new(AudioCapture::new(config.audio.clone()));
    let transcriber = Arc::new(ApiTranscriber(StreamingTranscriber::new(
        config.transcription.clone(),
        api_key,
    )?));
    let ui = Arc::new(TerminalUi::new());

    let orchestrator = Arc::new(SessionOrchestrator::new(
        capture,
        transcriber,
        Arc::new(ClipboardInserter::new()),
        SessionUi {
            indicator: ui.clone(),
            meter: ui.clone(),
            display: ui,
        },
        METER_POLL,
    ));

    let on_press = {
        let orchestrator = Arc::clone(&orchestrator);
        move || orchestrator.on_confirmed_press()
    };
    let on_release = {
        let orchestrator = Arc::clone(&orchestrator);
        move || orchestrator.on_release()
    };
    let detector = HotkeyDetector::new(
        config.hotkey.binding,
        Duration::from_millis(config.hotkey.debounce_ms),
        on_press,
        on_release,
    );

    info!(binding = %config.hotkey.binding, "Listening for hotkey events");
    rdev::listen(move |event| {
        if let Some(flag_event) = map_event(&event) {
            detector.feed(flag_event);
        }
    })
    .map_err(|e| MurmurError::Hotkey(format!("Input listener failed: {:?}", e)))
}

/// Translate a raw input event into a modifier edge the detector understands.
/// Non-Option keys are dropped here so the detector only ever sees its own
/// key codes.
fn map_event(event: &rdev::Event) -> Option<KeyFlagEvent> {
    let (key, modifier_down) = match event.event_type {
        rdev::EventType::KeyPress(key) => (key, true),
        rdev::EventType::KeyRelease(key) => (key, false),
        _ => return None,
    };
    let key_code = match key {
        rdev::Key::Alt => KEYCODE_LEFT_OPTION,
        rdev::Key::AltGr => KEYCODE_RIGHT_OPTION,
        _ => return None,
    };
    Some(KeyFlagEvent::FlagsChanged {
        key_code,
        modifier_down,
    })
}
