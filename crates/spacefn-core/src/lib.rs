//! SpaceFN for evdev keyboards
//!
//! Turns the space bar into a momentary layer key: tapped it is space, held
//! together with another key it turns that key into a navigation key. This
//! crate holds the device-independent part: the translation table, the
//! classification state machine and the session loop driving it through the
//! [`EventSource`] and [`EventSink`] traits.

mod error;
mod event;
mod keymap;
mod machine;
mod pending;
mod session;

pub use error::{SessionError, SinkError, SourceError};
pub use event::{event_value, KeyEvent, Transition};
pub use keymap::{lookup, output_keys, translate, translate_or_self, Lookup, ESCAPE_KEY, MODIFIER_KEY};
pub use machine::{Outcome, SpaceFn, State, DEFAULT_DECIDE_WINDOW};
pub use pending::{PendingKeys, PENDING_CAPACITY};
pub use session::{ChannelSource, EventSink, EventSource, Polled, Session};
