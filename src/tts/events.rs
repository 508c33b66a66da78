//! Single event queue feeding the playback controller.
//!
//! Backends never touch controller state. They post events tagged with the
//! session that produced them, and the controller drops anything that does not
//! belong to the session currently active.

use super::interface::{LocalErrorKind, TtsError};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Lifecycle callbacks of a platform utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSpeechEvent {
    Start,
    End,
    Error(LocalErrorKind),
    Pause,
    Resume,
}

/// Lifecycle callbacks of the audio output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Play,
    Ended,
    Error(String),
}

#[derive(Debug)]
pub enum ControllerEvent {
    Local {
        session: SessionId,
        event: LocalSpeechEvent,
    },
    Audio {
        session: SessionId,
        event: AudioEvent,
    },
    /// Outcome of the cloud request started for `session`.
    Remote {
        session: SessionId,
        outcome: Result<Vec<u8>, TtsError>,
    },
    /// The platform reported a new set of voices.
    VoicesChanged,
    /// Auto-hide timer for the banner message numbered `seq`.
    ClearBanner { seq: u64 },
}

/// Cloneable handle a backend uses to report events for one session.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    session: SessionId,
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl SessionEvents {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn local(&self, event: LocalSpeechEvent) {
        // A closed queue means the controller is gone; nothing left to notify.
        let _ = self.tx.send(ControllerEvent::Local {
            session: self.session,
            event,
        });
    }

    pub fn audio(&self, event: AudioEvent) {
        let _ = self.tx.send(ControllerEvent::Audio {
            session: self.session,
            event,
        });
    }

    pub fn remote(&self, outcome: Result<Vec<u8>, TtsError>) {
        let _ = self.tx.send(ControllerEvent::Remote {
            session: self.session,
            outcome,
        });
    }
}

/// Receiving end of the controller queue, owned by whoever drives the loop.
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl EventQueue {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ControllerEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event. `None` once every sender is dropped.
    pub async fn next(&mut self) -> Option<ControllerEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant used when draining.
    pub fn try_next(&mut self) -> Option<ControllerEvent> {
        self.rx.try_recv().ok()
    }
}
