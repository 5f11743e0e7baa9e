//! Murmur hotkey crate - debounced press/release detection for the
//! push-to-hold modifier key.
//!
//! The detector is a non-intercepting observer: it consumes low-level
//! key-flag events from the host input tap, tracks the press/release edge
//! with a debounce window, and emits `on_confirmed_press` / `on_release`
//! callbacks. Events always pass through unmodified.

pub mod detector;

pub use detector::{HotkeyDetector, KeyFlagEvent, KEYCODE_LEFT_OPTION, KEYCODE_RIGHT_OPTION};
