//! SpaceFN classification state machine
//!
//! Decides, per key event, whether space is being used as a modifier or as a
//! literal space, and rewrites the event stream accordingly.
//!
//! ## States
//!
//! ```text
//!               space press
//!  ┌──────┐ ───────────────────────► ┌──────────┐
//!  │ IDLE │                          │ DECIDING │──┐ other key press:
//!  └──────┘ ◄─────────────────────── └────┬─────┘◄─┘ buffer it
//!     ▲        space release:             │
//!     │        tap space, replay          │ buffered key release,
//!     │        buffered presses           │ or window expired:
//!     │                                   │ commit buffered keys
//!     │        space release:             ▼
//!     │        release held keys     ┌─────────┐
//!     └───────────────────────────── │ SHIFTED │──┐ mapped key:
//!                                    └─────────┘◄─┘ translate
//! ```
//!
//! ## Balanced release
//!
//! Every key that the machine presses on the output while space is engaged is
//! tracked in a [`PendingKeys`] set and released exactly once: either when its
//! physical key is released in Shifted, or when space is released. The set
//! only exists inside Deciding and Shifted, so it is empty by construction
//! whenever the machine is Idle.
//!
//! Keys pressed during the deciding window are held back until the window
//! resolves, including keys with no translation. This delay is intended: the
//! machine cannot know whether the key will be shifted until it does.

use std::fmt;
use std::time::Duration;

use evdev::Key;
use tokio::time::Instant;

use crate::event::{KeyEvent, Transition};
use crate::keymap::{lookup, translate, translate_or_self, Lookup, MODIFIER_KEY};
use crate::pending::PendingKeys;

/// Default length of the deciding window.
pub const DEFAULT_DECIDE_WINDOW: Duration = Duration::from_millis(200);

/// The state of the classification machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Space is not engaged; everything passes through.
    Idle,
    /// Space was just pressed; waiting to learn whether it is a tap or a prefix.
    Deciding {
        /// When the window closes and buffered keys are committed as shifted
        deadline: Instant,
        /// Original identifiers of keys pressed during the window
        pending: PendingKeys,
    },
    /// Space is held as a prefix; mapped keys are translated.
    Shifted {
        /// Translated identifiers currently pressed on the output
        pending: PendingKeys,
    },
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Deciding { .. } => "deciding",
            State::Shifted { .. } => "shifted",
        }
    }

    /// The keys held under the modifier, if the modifier is engaged.
    pub fn pending(&self) -> Option<&PendingKeys> {
        match self {
            State::Idle => None,
            State::Deciding { pending, .. } | State::Shifted { pending } => Some(pending),
        }
    }

    /// Whether `key` is tracked as held under the modifier.
    pub fn is_held(&self, key: Key) -> bool {
        self.pending().is_some_and(|pending| pending.contains(key))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the caller should do after an event has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Write the produced events and keep reading.
    Continue,
    /// The escape key was seen. Nothing was produced; terminate now.
    Escape,
}

/// The SpaceFN state machine.
///
/// Feed it input with [`SpaceFn::handle`] and, once [`SpaceFn::deadline`] has
/// passed without input, [`SpaceFn::timeout`]. Both append the events to
/// write to the output, in order, to `out`.
#[derive(Debug)]
pub struct SpaceFn {
    state: State,
    window: Duration,
}

impl Default for SpaceFn {
    fn default() -> Self {
        Self::new(DEFAULT_DECIDE_WINDOW)
    }
}

impl SpaceFn {
    /// Create a machine in Idle with the given deciding window.
    pub fn new(window: Duration) -> Self {
        Self {
            state: State::Idle,
            window,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// When the current deciding window closes, if one is open.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Deciding { deadline, .. } => Some(*deadline),
            State::Idle | State::Shifted { .. } => None,
        }
    }

    /// Handle one input event received at `now`.
    pub fn handle(&mut self, event: KeyEvent, now: Instant, out: &mut Vec<KeyEvent>) -> Outcome {
        if lookup(event.key) == Lookup::Escape {
            tracing::info!("Escape key {:?} pressed", event.key);
            return Outcome::Escape;
        }

        let state = std::mem::replace(&mut self.state, State::Idle);
        let from = state.name();
        let next = match state {
            State::Idle => self.idle(event, now, out),
            State::Deciding { deadline, pending } => deciding(deadline, pending, event, out),
            State::Shifted { pending } => shifted(pending, event, out),
        };
        self.transition(from, next);

        Outcome::Continue
    }

    /// Close the deciding window: commit every buffered key as shifted.
    ///
    /// Does nothing outside Deciding.
    pub fn timeout(&mut self, out: &mut Vec<KeyEvent>) {
        let state = std::mem::replace(&mut self.state, State::Idle);
        let from = state.name();
        let next = match state {
            State::Deciding { pending, .. } => {
                tracing::debug!("Deciding window expired with {} key(s) held", pending.len());
                commit(pending, out)
            }
            other => other,
        };
        self.transition(from, next);
    }

    fn idle(&self, event: KeyEvent, now: Instant, out: &mut Vec<KeyEvent>) -> State {
        if event.key == MODIFIER_KEY && event.transition == Transition::Press {
            return State::Deciding {
                deadline: now + self.window,
                pending: PendingKeys::new(),
            };
        }

        out.push(event);
        State::Idle
    }

    fn transition(&mut self, from: &'static str, next: State) {
        if from != next.name() {
            tracing::debug!("{} -> {}", from, next);
        }
        self.state = next;
    }
}

fn deciding(
    deadline: Instant,
    mut pending: PendingKeys,
    event: KeyEvent,
    out: &mut Vec<KeyEvent>,
) -> State {
    let KeyEvent { key, transition } = event;

    match transition {
        Transition::Press => {
            if key != MODIFIER_KEY {
                pending.append(key);
            }
        }
        Transition::Release if key == MODIFIER_KEY => {
            // Tapped: it was a space after all. Replay what was held back.
            out.push(KeyEvent::press(MODIFIER_KEY));
            out.push(KeyEvent::release(MODIFIER_KEY));
            out.extend(pending.drain().map(KeyEvent::press));
            return State::Idle;
        }
        Transition::Release => {
            if pending.remove(key) {
                let to = translate_or_self(key);
                out.push(KeyEvent::press(to));
                out.push(KeyEvent::release(to));
                return commit(pending, out);
            }
            out.push(event);
        }
        Transition::Repeat => {
            if key != MODIFIER_KEY && !pending.contains(key) {
                out.push(event);
            }
        }
    }

    State::Deciding { deadline, pending }
}

/// Press the translation of every buffered key and enter Shifted holding them.
fn commit(pending: PendingKeys, out: &mut Vec<KeyEvent>) -> State {
    let mut held = PendingKeys::new();
    for key in pending.iter() {
        let to = translate_or_self(key);
        // Two buffered keys may share an output key; press it once.
        if held.append(to) {
            out.push(KeyEvent::press(to));
        }
    }
    State::Shifted { pending: held }
}

fn shifted(mut pending: PendingKeys, event: KeyEvent, out: &mut Vec<KeyEvent>) -> State {
    let KeyEvent { key, transition } = event;

    if key == MODIFIER_KEY {
        if transition == Transition::Release {
            out.extend(pending.drain().map(KeyEvent::release));
            return State::Idle;
        }
        return State::Shifted { pending };
    }

    match (translate(key), transition) {
        (Some(to), Transition::Press) => {
            if pending.contains(to) || pending.append(to) {
                out.push(KeyEvent::press(to));
            } else {
                out.push(event);
            }
        }
        (Some(to), Transition::Release) => {
            // Keys pressed before space went down were never translated.
            if pending.remove(to) {
                out.push(KeyEvent::release(to));
            } else {
                out.push(event);
            }
        }
        (Some(to), Transition::Repeat) => {
            if pending.contains(to) {
                out.push(KeyEvent::repeat(to));
            } else {
                out.push(event);
            }
        }
        (None, Transition::Release) => {
            // May have been committed from the deciding window.
            pending.remove(key);
            out.push(event);
        }
        (None, Transition::Press | Transition::Repeat) => {
            out.push(event);
        }
    }

    State::Shifted { pending }
}
