//! Playback session. The state of one play request.
//!
//! A session is owned by the controller actor and replaced wholesale by the
//! next play request. Highlight fields are always in full-text coordinates.

use serde::{Deserialize, Serialize};
use speakline_core::{
    EngineKind, HighlightRange, OffsetCorrector, Segment, VoiceConfig, WordBoundary, full_text,
};
use uuid::Uuid;

/// Controller state machine.
///
/// ```text
///   Idle → Starting → Playing ⇄ Paused
///    ▲                   │
///    └── Stopped/Failed ─┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Engine asked to start, no `Started` event yet.
    Starting,
    Playing,
    /// Native pause (local engine only).
    Paused,
}

impl PlaybackState {
    /// Whether a session is in flight.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Tri-state "is playing" flag shown to views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayStatus {
    #[default]
    NotStarted,
    /// Waiting for first audio, or a cloud session stopped by a pause.
    Loading,
    Playing,
}

/// Read-only view of the controller, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub engine: Option<EngineKind>,
    pub status: PlayStatus,
    pub text_offset: usize,
    pub matched_word_length: usize,
    pub last_spoken_word: String,
    /// The text the offsets index into.
    pub full_text: String,
}

impl PlaybackSnapshot {
    #[must_use]
    pub const fn highlight(&self) -> HighlightRange {
        HighlightRange::new(self.text_offset, self.matched_word_length)
    }
}

/// One play request and its live highlight position.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: Uuid,
    pub segments: Vec<Segment>,
    pub engine: EngineKind,
    /// Call-level default voice used for this request.
    pub voice: VoiceConfig,
    pub full_text: String,
    pub status: PlayStatus,
    pub text_offset: usize,
    pub matched_word_length: usize,
    pub last_spoken_word: String,
    /// Running highlight cursor for the local engine.
    local_cursor: usize,
    /// A cloud session stopped by `pause`; `continue` restarts it.
    pub suspended: bool,
}

impl PlaybackSession {
    pub fn new(engine: EngineKind, voice: VoiceConfig, segments: Vec<Segment>) -> Self {
        let full_text = full_text(&segments);
        Self {
            id: Uuid::new_v4(),
            segments,
            engine,
            voice,
            full_text,
            status: match engine {
                EngineKind::Cloud => PlayStatus::Loading,
                EngineKind::Local => PlayStatus::NotStarted,
            },
            text_offset: 0,
            matched_word_length: 0,
            last_spoken_word: String::new(),
            local_cursor: 0,
            suspended: false,
        }
    }

    /// Engine reported `Started`.
    pub fn mark_started(&mut self) {
        self.status = PlayStatus::Playing;
        self.reset_highlight();
    }

    /// Apply a progress event and return the new highlight.
    pub fn apply_progress(&mut self, boundary: &WordBoundary) -> HighlightRange {
        let range = match self.engine {
            EngineKind::Cloud => {
                OffsetCorrector::cloud().correct(&self.full_text, boundary.offset, boundary.length)
            }
            EngineKind::Local => {
                let range = OffsetCorrector::passthrough().correct(
                    &self.full_text,
                    self.local_cursor,
                    boundary.length,
                );
                self.local_cursor += boundary.length;
                range
            }
        };
        self.text_offset = range.offset;
        self.matched_word_length = range.length;
        self.last_spoken_word.clone_from(&boundary.word);
        range
    }

    /// Session ended; clear the highlight.
    pub fn mark_finished(&mut self) {
        self.reset_highlight();
        if !self.suspended {
            self.status = PlayStatus::NotStarted;
        }
    }

    fn reset_highlight(&mut self) {
        self.text_offset = 0;
        self.matched_word_length = 0;
        self.last_spoken_word.clear();
        self.local_cursor = 0;
    }

    #[must_use]
    pub fn snapshot(&self, state: PlaybackState) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state,
            engine: Some(self.engine),
            status: self.status,
            text_offset: self.text_offset,
            matched_word_length: self.matched_word_length,
            last_spoken_word: self.last_spoken_word.clone(),
            full_text: self.full_text.clone(),
        }
    }
}
