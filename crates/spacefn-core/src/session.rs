//! The event loop tying a source and a sink to the state machine
//!
//! The [`Session`] owns the [`SpaceFn`] machine and processes exactly one
//! input event at a time. Everything the machine produces for that event is
//! written to the sink before the next event is read.
//!
//! The only await point is [`EventSource::next_event`]. While the machine is
//! deciding, the source is asked to give up at the machine's deadline; that
//! deadline is fixed when space goes down, so repeated polls within one
//! window never extend it.

use std::future::Future;
use std::io;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{SessionError, SinkError, SourceError};
use crate::event::KeyEvent;
use crate::machine::{Outcome, SpaceFn};

/// Result of waiting for the next input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polled {
    Event(KeyEvent),
    /// The deadline passed before a key event arrived.
    Timeout,
}

/// Where key events come from.
pub trait EventSource {
    /// Wait for the next key event.
    ///
    /// With `deadline: None` this waits indefinitely. Otherwise it returns
    /// [`Polled::Timeout`] once `deadline` has passed without a key event.
    /// Non-key events must be filtered out here.
    fn next_event(
        &mut self,
        deadline: Option<Instant>,
    ) -> impl Future<Output = Result<Polled, SourceError>>;
}

/// Where synthesized key events go.
pub trait EventSink {
    /// Emit one key transition, followed by a synchronization marker.
    fn emit(&mut self, event: KeyEvent) -> Result<(), SinkError>;
}

/// Collects events in memory.
impl EventSink for Vec<KeyEvent> {
    fn emit(&mut self, event: KeyEvent) -> Result<(), SinkError> {
        self.push(event);
        Ok(())
    }
}

/// An [`EventSource`] fed through an ordered channel.
///
/// This is the adapter for multi-task setups: producers on other tasks send
/// key events in arrival order, while the machine and its pending keys stay
/// confined to the single task running the [`Session`]. A closed channel is
/// reported as a read failure.
///
/// ```no_run
/// use spacefn_core::{ChannelSource, KeyEvent, Session, SpaceFn};
///
/// # async fn example() -> Result<(), spacefn_core::SessionError> {
/// let (tx, source) = ChannelSource::channel(64);
/// tokio::spawn(async move {
///     let _ = tx.send(KeyEvent::press(evdev::Key::KEY_SPACE)).await;
/// });
///
/// let mut session = Session::new(SpaceFn::default(), source, Vec::<KeyEvent>::new());
/// session.run().await
/// # }
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<KeyEvent>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<KeyEvent>) -> Self {
        Self { rx }
    }

    /// Create a source and the sender that feeds it.
    pub fn channel(buffer: usize) -> (mpsc::Sender<KeyEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelSource {
    async fn next_event(&mut self, deadline: Option<Instant>) -> Result<Polled, SourceError> {
        let received = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(Polled::Timeout),
            },
            None => self.rx.recv().await,
        };

        received.map(Polled::Event).ok_or_else(|| {
            SourceError(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "event channel closed",
            ))
        })
    }
}

/// A running SpaceFN session.
#[derive(Debug)]
pub struct Session<S, K> {
    machine: SpaceFn,
    source: S,
    sink: K,
    out: Vec<KeyEvent>,
}

impl<S: EventSource, K: EventSink> Session<S, K> {
    pub fn new(machine: SpaceFn, source: S, sink: K) -> Self {
        Self {
            machine,
            source,
            sink,
            out: Vec::new(),
        }
    }

    pub fn machine(&self) -> &SpaceFn {
        &self.machine
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Read one input event (or one timeout) and write what it produces.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SourceReadFailure`] if the source fails and
    /// [`SessionError::SinkWriteFailure`] if an output event cannot be written.
    /// Either leaves the machine out of step with the physical keyboard, so
    /// callers should not continue the session.
    pub async fn step(&mut self) -> Result<Outcome, SessionError> {
        let deadline = self.machine.deadline();

        match self.source.next_event(deadline).await? {
            Polled::Event(event) => {
                tracing::trace!("in: {}", event);
                let outcome = self.machine.handle(event, Instant::now(), &mut self.out);
                if outcome == Outcome::Escape {
                    return Ok(Outcome::Escape);
                }
            }
            Polled::Timeout => self.machine.timeout(&mut self.out),
        }

        for event in self.out.drain(..) {
            tracing::trace!("out: {}", event);
            self.sink.emit(event)?;
        }

        Ok(Outcome::Continue)
    }

    /// Process events until the escape key is seen.
    ///
    /// # Errors
    ///
    /// Returns the first source or sink failure.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        tracing::info!(
            "SpaceFN session running (deciding window {:?})",
            self.machine.window()
        );

        loop {
            if self.step().await? == Outcome::Escape {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use evdev::Key;

    use super::*;
    use crate::keymap::{ESCAPE_KEY, MODIFIER_KEY};
    use crate::machine::DEFAULT_DECIDE_WINDOW;

    const SPACE: Key = MODIFIER_KEY;

    fn session() -> (mpsc::Sender<KeyEvent>, Session<ChannelSource, Vec<KeyEvent>>) {
        let (tx, source) = ChannelSource::channel(64);
        (tx, Session::new(SpaceFn::default(), source, Vec::new()))
    }

    /// Sink that fails every write.
    struct BrokenSink;

    impl EventSink for BrokenSink {
        fn emit(&mut self, _event: KeyEvent) -> Result<(), SinkError> {
            Err(SinkError(io::Error::from(io::ErrorKind::NotFound)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_to_space() {
        let (tx, mut session) = session();
        tx.send(KeyEvent::press(SPACE)).await.unwrap();
        tx.send(KeyEvent::release(SPACE)).await.unwrap();
        tx.send(KeyEvent::press(ESCAPE_KEY)).await.unwrap();

        session.run().await.unwrap();

        assert_eq!(
            session.sink(),
            &vec![KeyEvent::press(SPACE), KeyEvent::release(SPACE)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_commit() {
        let (tx, mut session) = session();
        let start = Instant::now();

        tx.send(KeyEvent::press(SPACE)).await.unwrap();
        tx.send(KeyEvent::press(Key::KEY_K)).await.unwrap();

        assert_eq!(session.step().await.unwrap(), Outcome::Continue);
        assert_eq!(session.step().await.unwrap(), Outcome::Continue);
        assert!(session.sink().is_empty(), "Nothing is emitted while deciding");

        // No further input: the window closes
        assert_eq!(session.step().await.unwrap(), Outcome::Continue);
        assert_eq!(session.sink(), &vec![KeyEvent::press(Key::KEY_DOWN)]);
        assert_eq!(session.machine().state().name(), "shifted");
        assert!(Instant::now() - start >= DEFAULT_DECIDE_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_inside_window_wins_over_timeout() {
        let (tx, mut session) = session();

        tx.send(KeyEvent::press(SPACE)).await.unwrap();
        tx.send(KeyEvent::press(Key::KEY_J)).await.unwrap();
        session.step().await.unwrap();
        session.step().await.unwrap();

        let sender = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            sender.send(KeyEvent::release(Key::KEY_J)).await.unwrap();
        });

        session.step().await.unwrap();
        assert_eq!(
            session.sink(),
            &vec![KeyEvent::press(Key::KEY_LEFT), KeyEvent::release(Key::KEY_LEFT)]
        );
        assert_eq!(session.machine().state().name(), "shifted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_is_not_extended_by_later_events() {
        let (tx, mut session) = session();
        let start = Instant::now();

        tx.send(KeyEvent::press(SPACE)).await.unwrap();
        session.step().await.unwrap();

        let sender = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            sender.send(KeyEvent::press(Key::KEY_I)).await.unwrap();
        });

        // The press at 150ms is buffered, then the window closes at 200ms
        session.step().await.unwrap();
        session.step().await.unwrap();
        assert_eq!(session.sink(), &vec![KeyEvent::press(Key::KEY_UP)]);

        let elapsed = Instant::now() - start;
        assert!(
            elapsed < DEFAULT_DECIDE_WINDOW + Duration::from_millis(150),
            "Deadline must be measured from the space press, got {:?}",
            elapsed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_waits_without_deadline() {
        let (tx, mut session) = session();

        let sender = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            sender.send(KeyEvent::press(Key::KEY_A)).await.unwrap();
        });

        session.step().await.unwrap();
        assert_eq!(session.sink(), &vec![KeyEvent::press(Key::KEY_A)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_emits_nothing() {
        let (tx, mut session) = session();
        tx.send(KeyEvent::press(SPACE)).await.unwrap();
        tx.send(KeyEvent::press(Key::KEY_J)).await.unwrap();
        tx.send(KeyEvent::release(ESCAPE_KEY)).await.unwrap();

        session.run().await.unwrap();
        assert!(session.sink().is_empty(), "Held keys are not flushed on escape");
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_failure_is_fatal() {
        let (tx, mut session) = session();
        tx.send(KeyEvent::press(Key::KEY_A)).await.unwrap();
        drop(tx);

        let result = session.run().await;
        assert!(matches!(result, Err(SessionError::SourceReadFailure(_))));
        assert_eq!(session.sink(), &vec![KeyEvent::press(Key::KEY_A)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_is_fatal() {
        let (tx, source) = ChannelSource::channel(8);
        let mut session = Session::new(SpaceFn::default(), source, BrokenSink);
        tx.send(KeyEvent::press(Key::KEY_A)).await.unwrap();

        let result = session.run().await;
        assert!(matches!(result, Err(SessionError::SinkWriteFailure(_))));
    }
}
