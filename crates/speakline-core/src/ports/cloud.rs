//! Cloud synthesis client port.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Audio format requested from the cloud engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioOutputFormat {
    #[default]
    Audio24Khz48KBitRateMonoMp3,
    Audio16Khz32KBitRateMonoMp3,
    Riff24Khz16BitMonoPcm,
    Ogg24Khz16BitMonoOpus,
}

impl AudioOutputFormat {
    /// File extension for audio written in this format.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Audio24Khz48KBitRateMonoMp3 | Self::Audio16Khz32KBitRateMonoMp3 => "mp3",
            Self::Riff24Khz16BitMonoPcm => "wav",
            Self::Ogg24Khz16BitMonoOpus => "ogg",
        }
    }
}

/// Where synthesized audio goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudAudioTarget {
    /// Default output device.
    Speaker,
    /// Write the audio to this file.
    File(PathBuf),
}

/// One synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSpeechRequest {
    pub request_id: Uuid,
    /// Complete markup document.
    pub markup: String,
    pub format: AudioOutputFormat,
    pub target: CloudAudioTarget,
}

/// Callbacks from the cloud client, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudClientEvent {
    SynthesisStarted,
    /// Word boundary in the client's text coordinates.
    WordBoundary {
        text: String,
        text_offset: usize,
        word_length: usize,
    },
    /// Audio chunk produced.
    Synthesizing,
    Completed,
    Canceled {
        error_code: String,
        error_details: String,
    },
}

/// Client call failures.
#[derive(Debug, Clone, Error)]
pub enum CloudClientError {
    #[error("Cloud transport error: {0}")]
    Transport(String),

    #[error("Cloud service rejected the request: {0}")]
    Rejected(String),

    #[error("No in-flight request {0}")]
    UnknownRequest(Uuid),
}

/// A cloud speech client.
///
/// `begin` submits the request and returns the callback stream for it; the
/// stream ends after `Completed` or `Canceled`. `cancel` asks the client to
/// abandon an in-flight request, which then reports `Canceled`.
#[async_trait]
pub trait CloudSpeechClient: Send + Sync {
    async fn begin(
        &self,
        request: CloudSpeechRequest,
    ) -> Result<mpsc::UnboundedReceiver<CloudClientEvent>, CloudClientError>;

    fn cancel(&self, request_id: Uuid) -> Result<(), CloudClientError>;
}
