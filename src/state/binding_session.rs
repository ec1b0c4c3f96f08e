use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use thiserror::Error;

use crate::state::keybinds::{KeyBindingTable, KeyPress, Lane, RebindOutcome};

/// Observable phase of the binding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPhase {
    /// No lane is waiting for a key.
    Idle,
    /// The next key press will be bound to this lane.
    AwaitingKey(Lane),
}

/// Whether a load or save is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Nothing is in flight.
    Ready,
    /// A load or save is in flight; binding starts are refused.
    Busy,
}

/// Error returned when a binding cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindingRejected {
    /// A load or save is in flight.
    #[error("settings are being loaded or saved")]
    Busy,
}

/// Result of entering `AwaitingKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingStarted {
    /// Lane now waiting for a key.
    pub lane: Lane,
    /// Lane whose pending request was dropped by this start, if any.
    pub abandoned: Option<Lane>,
}

/// What happened to a key press handed to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPressOutcome {
    /// No binding was pending; the press belongs to whoever else handles it.
    Ignored,
    /// The press was consumed and bound.
    Bound(RebindOutcome),
}

impl KeyPressOutcome {
    /// Whether the caller must suppress the platform default for this press.
    pub fn consumed(&self) -> bool {
        matches!(self, KeyPressOutcome::Bound(_))
    }
}

/// Counts key captures that are currently installed.
#[derive(Debug, Clone, Default)]
pub struct KeyCaptureRegistry {
    active: Arc<AtomicUsize>,
}

impl KeyCaptureRegistry {
    /// Install a capture for `lane`; it is released when the returned guard drops.
    fn acquire(&self, lane: Lane) -> KeyCapture {
        self.active.fetch_add(1, Ordering::SeqCst);
        KeyCapture {
            lane,
            active: self.active.clone(),
        }
    }

    /// Number of captures currently installed.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Key listener owned by the `AwaitingKey` state.
#[derive(Debug)]
struct KeyCapture {
    lane: Lane,
    active: Arc<AtomicUsize>,
}

impl Drop for KeyCapture {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
enum SessionState {
    Idle,
    AwaitingKey(KeyCapture),
}

/// State machine for the "press a key for lane L" interaction.
///
/// `Idle --start_binding(L)--> AwaitingKey(L) --key press--> Idle`. Starting again while waiting
/// replaces the pending lane. The key capture lives exactly as long as the `AwaitingKey` state.
#[derive(Debug)]
pub struct BindingSession {
    state: SessionState,
    captures: KeyCaptureRegistry,
}

impl Default for BindingSession {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            captures: KeyCaptureRegistry::default(),
        }
    }
}

impl BindingSession {
    /// Create a session in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> BindingPhase {
        match &self.state {
            SessionState::Idle => BindingPhase::Idle,
            SessionState::AwaitingKey(capture) => BindingPhase::AwaitingKey(capture.lane),
        }
    }

    /// Lane waiting for a key, if any.
    pub fn pending_lane(&self) -> Option<Lane> {
        match self.phase() {
            BindingPhase::AwaitingKey(lane) => Some(lane),
            BindingPhase::Idle => None,
        }
    }

    /// Registry tracking installed key captures.
    pub fn captures(&self) -> &KeyCaptureRegistry {
        &self.captures
    }

    /// Wait for the next key press to bind it to `lane`.
    pub fn start_binding(
        &mut self,
        lane: Lane,
        activity: Activity,
    ) -> Result<BindingStarted, BindingRejected> {
        if activity == Activity::Busy {
            return Err(BindingRejected::Busy);
        }

        // Release the previous capture before installing the next one.
        let abandoned = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::AwaitingKey(previous) => Some(previous.lane),
            SessionState::Idle => None,
        };
        self.state = SessionState::AwaitingKey(self.captures.acquire(lane));

        Ok(BindingStarted { lane, abandoned })
    }

    /// Feed a key press; binds it when a lane is waiting and returns to idle.
    pub fn observe_key_press(
        &mut self,
        table: &mut KeyBindingTable,
        press: &KeyPress,
    ) -> KeyPressOutcome {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => KeyPressOutcome::Ignored,
            SessionState::AwaitingKey(capture) => {
                let lane = capture.lane;
                drop(capture);
                KeyPressOutcome::Bound(table.rebind(lane, press.key, press.display_name()))
            }
        }
    }
}
