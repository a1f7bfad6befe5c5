//! Speech error types and the user-facing failure record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::events::EngineKind;
use crate::ports::CloudClientError;
use crate::settings::SettingsError;

/// Errors that can occur while starting, driving, or exporting speech.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The engine cannot be used right now (no credentials, no voice).
    #[error("{} engine unavailable: {reason}", .engine.title())]
    EngineUnavailable { engine: EngineKind, reason: String },

    /// Synthesis could not be started or failed mid-way.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// The request was cancelled before it completed.
    #[error("Speech request cancelled: {0}")]
    Cancelled(String),

    /// Export finished but produced no audio.
    #[error("Synthesized file at {} is empty", .0.display())]
    EmptyOutput(PathBuf),

    /// Export could not write or verify the output file.
    #[error("Failed to write audio to {}: {reason}", .path.display())]
    OutputFailed { path: PathBuf, reason: String },

    /// The playback controller has shut down.
    #[error("Playback controller is no longer running")]
    ControllerClosed,

    /// `continue` was requested with nothing paused.
    #[error("Nothing is paused")]
    NothingToResume,

    /// A voice or settings value is out of range.
    #[error("Invalid voice configuration: {0}")]
    InvalidConfig(#[from] SettingsError),

    /// The cloud client rejected or failed a call.
    #[error(transparent)]
    Client(#[from] CloudClientError),

    /// IO error (audio directory, output files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad category of a [`PlaybackFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing credentials or an unusable voice.
    Configuration,
    Synthesis,
    /// The engine reported cancellation (including user stops on the cloud).
    Cancelled,
    Output,
}

/// A failure as shown to a user: a short title plus detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackFailure {
    pub kind: FailureKind,
    pub title: String,
    pub message: String,
}

impl PlaybackFailure {
    pub fn new(kind: FailureKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Synthesis, "Synthesis failed", message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Cancelled, "Synthesis cancelled", message)
    }

    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self.kind, FailureKind::Cancelled)
    }
}

impl From<&SpeechError> for PlaybackFailure {
    fn from(err: &SpeechError) -> Self {
        let kind = match err {
            SpeechError::EngineUnavailable { .. } | SpeechError::InvalidConfig(_) => {
                FailureKind::Configuration
            }
            SpeechError::Cancelled(_) => FailureKind::Cancelled,
            SpeechError::EmptyOutput(_) | SpeechError::OutputFailed { .. } | SpeechError::Io(_) => {
                FailureKind::Output
            }
            SpeechError::Synthesis(_)
            | SpeechError::ControllerClosed
            | SpeechError::NothingToResume
            | SpeechError::Client(_) => FailureKind::Synthesis,
        };
        let title = match kind {
            FailureKind::Configuration => "Speech engine unavailable",
            FailureKind::Synthesis => "Synthesis failed",
            FailureKind::Cancelled => "Synthesis cancelled",
            FailureKind::Output => "Audio export failed",
        };
        Self::new(kind, title, err.to_string())
    }
}
