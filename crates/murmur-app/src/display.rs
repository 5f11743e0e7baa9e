//! Terminal feedback: recording indicator, loudness meter, transcript echo.

use std::io::Write;
use std::sync::Mutex;

use murmur_core::config::MurmurConfig;
use murmur_session::{LevelMeter, RecordingIndicator, TranscriptDisplay};

const METER_WIDTH: usize = 24;

/// Renders session feedback on the controlling terminal. The recording
/// indicator and level meter share stderr's current line; transcript text
/// goes to stdout so it can be piped.
pub struct TerminalUi {
    stdout: Mutex<()>,
}

impl TerminalUi {
    pub fn new() -> Self {
        TerminalUi { stdout: Mutex::new(()) }
    }

    fn clear_status_line(&self) {
        eprint!("\r\x1b[2K");
        let _ = std::io::stderr().flush();
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingIndicator for TerminalUi {
    fn show(&self) {
        eprint!("\r\x1b[2K● rec ");
        let _ = std::io::stderr().flush();
    }

    fn hide(&self) {
        self.clear_status_line();
    }
}

impl LevelMeter for TerminalUi {
    fn update(&self, level: f32) {
        let filled = ((level.clamp(0.0, 1.0) * METER_WIDTH as f32) as usize).min(METER_WIDTH);
        let bar: String = "█".repeat(filled) + &"░".repeat(METER_WIDTH - filled);
        eprint!("\r\x1b[2K● rec {}", bar);
        let _ = std::io::stderr().flush();
    }
}

impl TranscriptDisplay for TerminalUi {
    fn begin(&self) {
        self.clear_status_line();
        eprint!("… ");
        let _ = std::io::stderr().flush();
    }

    fn delta(&self, text: &str) {
        let _guard = self.stdout.lock().expect("stdout mutex poisoned");
        self.clear_status_line();
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }

    fn finish(&self) {
        let _guard = self.stdout.lock().expect("stdout mutex poisoned");
        self.clear_status_line();
        println!();
        let _ = std::io::stdout().flush();
    }
}

/// Print the startup banner describing the active configuration.
pub fn print_banner(config: &MurmurConfig) {
    println!("murmur {}", env!("CARGO_PKG_VERSION"));
    println!("  model:    {}", config.transcription.model);
    println!("  hotkey:   option ({})", config.hotkey.binding);
    if !config.transcription.language.is_empty() {
        println!("  language: {}", config.transcription.language);
    }
    println!("Hold Option to dictate. Ctrl-C to quit.");
}
