//! SpaceFN translation table
//!
//! While space is held as a modifier, the keys in this table are replaced by
//! navigation keys laid out around the home row:
//!
//! ```text
//!   U I O      HOME  UP  END
//! H J K L   PGUP LEFT DOWN RIGHT
//!   B   N        SPACE   PGDN
//! ```

use evdev::Key;

/// The key overloaded as the SpaceFN modifier.
pub const MODIFIER_KEY: Key = Key::KEY_SPACE;

/// The key that unconditionally terminates the daemon.
pub const ESCAPE_KEY: Key = Key::KEY_BRIGHTNESSDOWN;

/// Result of looking a key up in the translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The key has a shifted replacement.
    Mapped(Key),
    /// The key is not part of the shifted layer.
    Unmapped,
    /// The key is the escape hatch.
    Escape,
}

/// Look a key up in the translation table.
pub fn lookup(key: Key) -> Lookup {
    match key {
        ESCAPE_KEY => Lookup::Escape,

        Key::KEY_J => Lookup::Mapped(Key::KEY_LEFT),
        Key::KEY_K => Lookup::Mapped(Key::KEY_DOWN),
        Key::KEY_L => Lookup::Mapped(Key::KEY_RIGHT),
        Key::KEY_I => Lookup::Mapped(Key::KEY_UP),

        Key::KEY_U => Lookup::Mapped(Key::KEY_HOME),
        Key::KEY_O => Lookup::Mapped(Key::KEY_END),

        Key::KEY_H => Lookup::Mapped(Key::KEY_PAGEUP),
        Key::KEY_N => Lookup::Mapped(Key::KEY_PAGEDOWN),

        Key::KEY_B => Lookup::Mapped(Key::KEY_SPACE),

        _ => Lookup::Unmapped,
    }
}

/// The shifted replacement for `key`, if it has one.
pub fn translate(key: Key) -> Option<Key> {
    match lookup(key) {
        Lookup::Mapped(to) => Some(to),
        Lookup::Unmapped | Lookup::Escape => None,
    }
}

/// The shifted replacement for `key`, or `key` itself when unmapped.
pub fn translate_or_self(key: Key) -> Key {
    translate(key).unwrap_or(key)
}

/// Every key the table can produce, plus the modifier itself.
///
/// The virtual device must be able to emit all of these even if the physical
/// keyboard does not advertise them.
pub fn output_keys() -> impl Iterator<Item = Key> {
    [
        MODIFIER_KEY,
        Key::KEY_LEFT,
        Key::KEY_DOWN,
        Key::KEY_RIGHT,
        Key::KEY_UP,
        Key::KEY_HOME,
        Key::KEY_END,
        Key::KEY_PAGEUP,
        Key::KEY_PAGEDOWN,
    ]
    .into_iter()
}
