//! Normalized engine event stream.
//!
//! Both engine adapters report their lifecycle through one channel of
//! [`EngineEvent`]s. The sending half is wrapped in an [`EventSender`] that
//! enforces the stream contract no matter how the native engine behaves:
//!
//! ```text
//!   Started → (Progress | Paused | Resumed)* → Stopped | Failed
//! ```
//!
//! Exactly one `Started`, exactly one terminal event, nothing after it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::PlaybackFailure;

/// Which of the two engines a session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Network neural engine driven by a markup document.
    Cloud,
    /// On-device engine driven by plain text.
    Local,
}

impl EngineKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cloud => "Cloud",
            Self::Local => "Local",
        }
    }
}

/// A word the engine is about to speak, in engine coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBoundary {
    pub word: String,
    pub offset: usize,
    pub length: usize,
}

/// One normalized lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Started,
    Progress(WordBoundary),
    Paused,
    Resumed,
    /// Normal completion or a user-requested stop.
    Stopped,
    Failed(PlaybackFailure),
}

impl EngineEvent {
    /// Whether this event ends the session.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed(_))
    }
}

/// Create a connected sender / stream pair for one session.
#[must_use]
pub fn event_channel() -> (EventSender, EngineEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventSender {
            tx,
            started: false,
            paused: false,
            finished: false,
        },
        EngineEvents { rx },
    )
}

// ── Sending half ───────────────────────────────────────────────────

/// Lifecycle guard around the sending half of a session's event channel.
///
/// - `Progress`, `Paused` or a terminal event before `Started` emits the
///   missing `Started`.
/// - A second `Started` is ignored.
/// - Anything after a terminal event is ignored.
/// - Dropping the sender without a terminal event emits `Failed`.
#[derive(Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<EngineEvent>,
    started: bool,
    paused: bool,
    finished: bool,
}

impl EventSender {
    pub fn started(&mut self) {
        if self.finished || self.started {
            return;
        }
        self.started = true;
        self.send(EngineEvent::Started);
    }

    pub fn progress(&mut self, boundary: WordBoundary) {
        if self.finished {
            return;
        }
        self.started();
        self.send(EngineEvent::Progress(boundary));
    }

    pub fn paused(&mut self) {
        if self.finished || self.paused {
            return;
        }
        self.started();
        self.paused = true;
        self.send(EngineEvent::Paused);
    }

    /// Only meaningful after [`Self::paused`]; otherwise ignored.
    pub fn resumed(&mut self) {
        if self.finished || !self.paused {
            return;
        }
        self.paused = false;
        self.send(EngineEvent::Resumed);
    }

    pub fn stopped(&mut self) {
        self.finish(EngineEvent::Stopped);
    }

    pub fn failed(&mut self, failure: PlaybackFailure) {
        self.finish(EngineEvent::Failed(failure));
    }

    /// Whether a terminal event has been sent.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Emits the missing `Started` first, so every stream opens with one.
    fn finish(&mut self, terminal: EngineEvent) {
        if self.finished {
            return;
        }
        self.started();
        self.finished = true;
        self.send(terminal);
    }

    fn send(&self, event: EngineEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Engine event receiver dropped");
        }
    }
}

impl Drop for EventSender {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Engine event stream closed without a terminal event");
            self.failed(PlaybackFailure::synthesis("engine event stream closed"));
        }
    }
}

// ── Receiving half ─────────────────────────────────────────────────

/// Receiving half of a session's event channel.
#[derive(Debug)]
pub struct EngineEvents {
    rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineEvents {
    /// Next event, or `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<EngineEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_next(&mut self) -> Option<EngineEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain events until the terminal one, returning it.
    ///
    /// Yields a synthesis failure if the stream ends without one, which
    /// the [`EventSender`] drop guard makes unreachable in practice.
    pub async fn until_terminal(&mut self) -> EngineEvent {
        while let Some(event) = self.next().await {
            if event.is_terminal() {
                return event;
            }
        }
        EngineEvent::Failed(PlaybackFailure::synthesis("engine event stream closed"))
    }
}
