//! Key events as seen by the state machine

use std::fmt;

use evdev::{EventType, InputEvent, Key};

/// Raw evdev key event values
pub mod event_value {
    /// Key release event value
    pub const RELEASE: i32 = 0;
    /// Key press event value
    pub const PRESS: i32 = 1;
    /// Key repeat (autorepeat) event value
    pub const REPEAT: i32 = 2;
}

/// The transition a key went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Press,
    Release,
    Repeat,
}

impl Transition {
    /// Map an evdev key event value to a transition.
    ///
    /// Returns `None` for values the kernel does not define for `EV_KEY`.
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            event_value::PRESS => Some(Transition::Press),
            event_value::RELEASE => Some(Transition::Release),
            event_value::REPEAT => Some(Transition::Repeat),
            _ => None,
        }
    }

    /// The evdev event value for this transition.
    pub fn value(self) -> i32 {
        match self {
            Transition::Press => event_value::PRESS,
            Transition::Release => event_value::RELEASE,
            Transition::Repeat => event_value::REPEAT,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Press => write!(f, "press"),
            Transition::Release => write!(f, "release"),
            Transition::Repeat => write!(f, "repeat"),
        }
    }
}

/// A single key transition, the unit of I/O between source, machine and sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub transition: Transition,
}

impl KeyEvent {
    pub fn new(key: Key, transition: Transition) -> Self {
        Self { key, transition }
    }

    pub fn press(key: Key) -> Self {
        Self::new(key, Transition::Press)
    }

    pub fn release(key: Key) -> Self {
        Self::new(key, Transition::Release)
    }

    pub fn repeat(key: Key) -> Self {
        Self::new(key, Transition::Repeat)
    }

    /// Convert a raw evdev event.
    ///
    /// Non-key events (synchronization markers, MSC_SCAN and so on) and
    /// unknown key values yield `None`.
    pub fn from_input_event(event: &InputEvent) -> Option<Self> {
        if event.event_type() != EventType::KEY {
            return None;
        }
        let transition = Transition::from_value(event.value())?;
        Some(Self::new(Key::new(event.code()), transition))
    }

    /// Build the raw evdev event for this transition.
    pub fn to_input_event(self) -> InputEvent {
        InputEvent::new(EventType::KEY, self.key.code(), self.transition.value())
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_name = format!("{:?}", self.key);
        let display_name = key_name.strip_prefix("KEY_").unwrap_or(&key_name);
        write!(f, "{} {}", display_name, self.transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_values() {
        assert_eq!(Transition::from_value(0), Some(Transition::Release));
        assert_eq!(Transition::from_value(1), Some(Transition::Press));
        assert_eq!(Transition::from_value(2), Some(Transition::Repeat));
        assert_eq!(Transition::from_value(3), None);
        assert_eq!(Transition::from_value(-1), None);
    }

    #[test]
    fn test_from_input_event_filters_non_key_events() {
        let syn = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        assert_eq!(KeyEvent::from_input_event(&syn), None, "SYN_REPORT is not a key event");

        let msc = InputEvent::new(EventType::MISC, 4, 0x70004);
        assert_eq!(KeyEvent::from_input_event(&msc), None, "MSC_SCAN is not a key event");
    }

    #[test]
    fn test_from_input_event_key() {
        let raw = InputEvent::new(EventType::KEY, Key::KEY_J.code(), 1);
        assert_eq!(KeyEvent::from_input_event(&raw), Some(KeyEvent::press(Key::KEY_J)));

        let bogus = InputEvent::new(EventType::KEY, Key::KEY_J.code(), 7);
        assert_eq!(KeyEvent::from_input_event(&bogus), None, "Unknown key values are dropped");
    }

    #[test]
    fn test_to_input_event_preserves_code_and_value() {
        let raw = KeyEvent::repeat(Key::KEY_LEFT).to_input_event();
        assert_eq!(raw.event_type(), EventType::KEY);
        assert_eq!(raw.code(), Key::KEY_LEFT.code());
        assert_eq!(raw.value(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyEvent::press(Key::KEY_SPACE).to_string(), "SPACE press");
        assert_eq!(KeyEvent::release(Key::KEY_PAGEUP).to_string(), "PAGEUP release");
    }
}
