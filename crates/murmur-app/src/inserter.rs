//! Text insertion via the clipboard.
//!
//! Saves the current clipboard contents, writes the transcript, sends the
//! platform paste chord with virtual key codes (so it works regardless of
//! keyboard layout), then restores whatever was on the clipboard before.

use std::time::Duration;

use arboard::Clipboard;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::debug;

use murmur_core::error::{MurmurError, Result};
use murmur_session::TextInserter;

const CLIPBOARD_SETTLE: Duration = Duration::from_millis(50);
const PASTE_SETTLE: Duration = Duration::from_millis(100);

pub struct ClipboardInserter;

impl ClipboardInserter {
    pub fn new() -> Self {
        ClipboardInserter
    }
}

impl Default for ClipboardInserter {
    fn default() -> Self {
        Self::new()
    }
}

fn send_paste() -> Result<()> {
    #[cfg(target_os = "macos")]
    let (modifier, v_key) = (Key::Meta, Key::Other(9));
    #[cfg(target_os = "windows")]
    let (modifier, v_key) = (Key::Control, Key::Other(0x56)); // VK_V
    #[cfg(target_os = "linux")]
    let (modifier, v_key) = (Key::Control, Key::Unicode('v'));

    let mut enigo = Enigo::new(&Settings::default())
        .map_err(|e| MurmurError::InsertionFailed(format!("Failed to initialize input: {}", e)))?;

    enigo
        .key(modifier, Direction::Press)
        .map_err(|e| MurmurError::InsertionFailed(format!("Failed to press modifier: {}", e)))?;
    enigo
        .key(v_key, Direction::Click)
        .map_err(|e| MurmurError::InsertionFailed(format!("Failed to send paste key: {}", e)))?;

    std::thread::sleep(PASTE_SETTLE);

    enigo
        .key(modifier, Direction::Release)
        .map_err(|e| MurmurError::InsertionFailed(format!("Failed to release modifier: {}", e)))?;

    Ok(())
}

impl TextInserter for ClipboardInserter {
    fn insert(&self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new()
            .map_err(|e| MurmurError::InsertionFailed(format!("Clipboard unavailable: {}", e)))?;

        // Remember prior contents so dictation does not clobber the clipboard.
        let previous = clipboard.get_text().ok();

        clipboard
            .set_text(text)
            .map_err(|e| MurmurError::InsertionFailed(format!("Clipboard write failed: {}", e)))?;
        std::thread::sleep(CLIPBOARD_SETTLE);

        send_paste()?;

        if let Some(previous) = previous {
            if let Err(e) = clipboard.set_text(&previous) {
                debug!(error = %e, "Failed to restore clipboard contents");
            }
        }

        Ok(())
    }
}
