//! Content model: what to say, as an ordered list of segments.
//!
//! A playback request is a `&[Segment]`: spoken text runs, each with its own
//! voice attributes, interleaved with named pauses. Two views of that list
//! matter to the rest of the crate:
//!
//! - [`full_text`]: the canonical coordinate space. Every offset reported to
//!   a view is a character offset into this string.
//! - [`merge_pauses`]: the list the markup assembler consumes, where each
//!   pause has been folded into the text run before it as a `<break/>`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::voice::VoiceConfig;

/// Separator placed between text segments in [`full_text`].
pub const SEGMENT_SEPARATOR: char = '\n';

// ── Pause levels ───────────────────────────────────────────────────

/// Discrete pause strengths, weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseLevel {
    XWeak,
    Weak,
    Medium,
    Strong,
    XStrong,
}

impl PauseLevel {
    /// All levels in increasing duration order.
    pub const ALL: [Self; 5] = [
        Self::XWeak,
        Self::Weak,
        Self::Medium,
        Self::Strong,
        Self::XStrong,
    ];

    /// Pause duration in milliseconds.
    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            Self::XWeak => 250,
            Self::Weak => 500,
            Self::Medium => 750,
            Self::Strong => 1000,
            Self::XStrong => 1250,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::XWeak => "Extra weak pause",
            Self::Weak => "Weak pause",
            Self::Medium => "Medium pause",
            Self::Strong => "Strong pause",
            Self::XStrong => "Extra strong pause",
        }
    }

    /// Inline markup directive for this pause, e.g. `<break time="750ms"/>`.
    #[must_use]
    pub fn directive(self) -> String {
        format!(r#"<break time="{}ms"/>"#, self.millis())
    }
}

// ── Segments ───────────────────────────────────────────────────────

/// Whether a segment is spoken text or a pause marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "level", rename_all = "snake_case")]
pub enum SegmentKind {
    Text,
    Pause(PauseLevel),
}

/// One unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Uuid,
    pub kind: SegmentKind,
    /// Spoken text. Always empty for pauses.
    pub text: String,
    /// Inherit the call-level default voice instead of [`Self::voice`].
    pub use_default_voice: bool,
    pub voice: VoiceConfig,
}

impl Segment {
    /// A text segment spoken with the call-level default voice.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: SegmentKind::Text,
            text: text.into(),
            use_default_voice: true,
            voice: VoiceConfig::default(),
        }
    }

    /// A text segment with its own voice configuration.
    pub fn with_voice(text: impl Into<String>, voice: VoiceConfig) -> Self {
        Self {
            use_default_voice: false,
            voice,
            ..Self::text(text)
        }
    }

    /// A pause marker.
    #[must_use]
    pub fn pause(level: PauseLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: SegmentKind::Pause(level),
            text: String::new(),
            use_default_voice: true,
            voice: VoiceConfig::default(),
        }
    }

    #[must_use]
    pub const fn is_pause(&self) -> bool {
        matches!(self.kind, SegmentKind::Pause(_))
    }

    /// The voice this segment is spoken with, given the call-level default.
    #[must_use]
    pub const fn effective_voice<'a>(&'a self, default: &'a VoiceConfig) -> &'a VoiceConfig {
        if self.use_default_voice {
            default
        } else {
            &self.voice
        }
    }

    /// Drop the segment's style (used when the speaker changes).
    pub fn clear_style(&mut self) {
        self.voice.style = None;
    }

    /// Drop the segment's role (used when the speaker changes).
    pub fn clear_role(&mut self) {
        self.voice.role = None;
    }

    /// Reset the segment's own voice to the default configuration.
    pub fn reset_voice(&mut self) {
        self.voice = VoiceConfig::default();
    }
}

// ── Views over a segment list ──────────────────────────────────────

/// Text segments joined by `\n`; pauses contribute nothing.
#[must_use]
pub fn full_text(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().filter(|s| !s.is_pause()).enumerate() {
        if i > 0 {
            out.push(SEGMENT_SEPARATOR);
        }
        out.push_str(&segment.text);
    }
    out
}

/// Fold every pause into the text segment before it.
///
/// Each pause's directive is appended to the most recent kept segment and
/// the pause itself is removed. Pauses with nothing before them are dropped.
#[must_use]
pub fn merge_pauses(segments: &[Segment]) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment.kind {
            SegmentKind::Text => merged.push(segment.clone()),
            SegmentKind::Pause(level) => match merged.last_mut() {
                Some(previous) => previous.text.push_str(&level.directive()),
                None => tracing::debug!(?level, "Dropping leading pause"),
            },
        }
    }
    merged
}

/// Count of characters in `text`, the unit of every offset in this crate.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
