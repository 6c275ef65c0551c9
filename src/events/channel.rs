//! Event channel implementation using crossbeam-channel.
//!
//! Workers on any thread push progress through an [`EventSender`]; a UI
//! layer drains the matching [`EventReceiver`].

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sends events from batch workers.
///
/// Clones go to pool threads; the receiver sees events from all of them.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event. A dropped receiver is ignored so batches run unobserved.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving end, drained by the progress display.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event arrives, or every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Iterate until every sender has been dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Sender/receiver pairs for one batch.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded, so a slow terminal never stalls the workers.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone; every event is discarded.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
