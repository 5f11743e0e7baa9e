use std::sync::{Arc, Mutex};
use std::time::Duration;

use murmur_core::config::HotkeyBinding;

/// macOS virtual key code for the left Option key.
pub const KEYCODE_LEFT_OPTION: u32 = 0x3A;
/// macOS virtual key code for the right Option key.
pub const KEYCODE_RIGHT_OPTION: u32 = 0x3D;

/// A low-level event delivered by the host input tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFlagEvent {
    /// A modifier-flags-changed event: which key, and whether the target
    /// modifier bit is currently set.
    FlagsChanged { key_code: u32, modifier_down: bool },
    /// The host disabled the tap (it does this under load). The detector
    /// re-enables via the configured hook; edge state is NOT reset.
    TapDisabled,
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Press/release edge state.
///
/// Invariants: `confirmed` only while `key_down`; a debounce timer is armed
/// only while `key_down && !confirmed`. The `generation` counter resolves
/// the cancel-vs-fire race: a timer fires only if its generation is still
/// the active arm, checked under the same lock a release uses to cancel,
/// so exactly one of {cancel, fire} ever takes effect.
#[derive(Debug, Default)]
struct EdgeState {
    key_down: bool,
    confirmed: bool,
    generation: u64,
}

struct Inner {
    state: Mutex<EdgeState>,
    debounce: Duration,
    on_confirmed_press: Hook,
    on_release: Hook,
    on_tap_reenable: Option<Hook>,
}

impl Inner {
    /// Debounce timer body. Fires the press callback only if this arm is
    /// still active and the key is still held unconfirmed.
    fn debounce_elapsed(&self, armed_generation: u64) {
        let fire = {
            let mut state = self.state.lock().expect("edge state mutex poisoned");
            if state.generation == armed_generation && state.key_down && !state.confirmed {
                state.confirmed = true;
                true
            } else {
                false
            }
        };
        if fire {
            tracing::debug!("Hotkey press confirmed");
            (self.on_confirmed_press)();
        }
    }
}

/// Debounced push-to-hold detector for the configured Option key(s).
///
/// `feed` is called from the input-tap callback thread; the press callback
/// is invoked from a timer thread once the debounce window elapses, and the
/// release callback from the tap thread. A tap shorter than the debounce
/// window never fires either callback.
pub struct HotkeyDetector {
    binding: HotkeyBinding,
    inner: Arc<Inner>,
}

impl HotkeyDetector {
    pub fn new(
        binding: HotkeyBinding,
        debounce: Duration,
        on_confirmed_press: impl Fn() + Send + Sync + 'static,
        on_release: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            binding,
            inner: Arc::new(Inner {
                state: Mutex::new(EdgeState::default()),
                debounce,
                on_confirmed_press: Box::new(on_confirmed_press),
                on_release: Box::new(on_release),
                on_tap_reenable: None,
            }),
        }
    }

    /// Install a hook invoked when the host reports the tap disabled.
    ///
    /// Must be called before the detector is shared with the tap thread.
    pub fn with_tap_reenable(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        let inner = Arc::get_mut(&mut self.inner)
            .expect("with_tap_reenable called after detector was shared");
        inner.on_tap_reenable = Some(Box::new(hook));
        self
    }

    fn matches(&self, key_code: u32) -> bool {
        match self.binding {
            HotkeyBinding::LeftOnly => key_code == KEYCODE_LEFT_OPTION,
            HotkeyBinding::RightOnly => key_code == KEYCODE_RIGHT_OPTION,
            HotkeyBinding::Either => {
                key_code == KEYCODE_LEFT_OPTION || key_code == KEYCODE_RIGHT_OPTION
            }
        }
    }

    /// Consume one input event and return it unmodified (pass-through).
    pub fn feed(&self, event: KeyFlagEvent) -> KeyFlagEvent {
        match event {
            KeyFlagEvent::TapDisabled => {
                tracing::warn!("Input tap disabled by host; re-enabling");
                if let Some(ref hook) = self.inner.on_tap_reenable {
                    hook();
                }
            }
            KeyFlagEvent::FlagsChanged {
                key_code,
                modifier_down,
            } => {
                if self.matches(key_code) {
                    if modifier_down {
                        self.on_press_edge();
                    } else {
                        self.on_release_edge();
                    }
                }
            }
        }
        event
    }

    fn on_press_edge(&self) {
        let armed_generation = {
            let mut state = self.inner.state.lock().expect("edge state mutex poisoned");
            if state.key_down {
                // Repeated flag events while held are idempotent.
                return;
            }
            state.key_down = true;
            state.confirmed = false;
            state.generation += 1;
            state.generation
        };

        let inner = Arc::clone(&self.inner);
        std::thread::spawn(move || {
            std::thread::sleep(inner.debounce);
            inner.debounce_elapsed(armed_generation);
        });
    }

    fn on_release_edge(&self) {
        let was_confirmed = {
            let mut state = self.inner.state.lock().expect("edge state mutex poisoned");
            if !state.key_down {
                return;
            }
            state.key_down = false;
            // Invalidate any pending debounce timer.
            state.generation += 1;
            let was_confirmed = state.confirmed;
            state.confirmed = false;
            was_confirmed
        };

        if was_confirmed {
            tracing::debug!("Hotkey released");
            (self.inner.on_release)();
        }
    }
}
