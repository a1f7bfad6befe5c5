//! Local (on-device) synthesizer port.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::SpeechError;

/// Pause after each utterance.
pub const POST_UTTERANCE_DELAY: Duration = Duration::from_millis(500);

/// Plain-text utterance for the local engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Native speed, `0.0..=1.0`.
    pub rate: f32,
    pub volume: f32,
    pub post_utterance_delay: Duration,
    /// Voice language; `None` keeps the system voice.
    pub language: Option<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>, rate: f32) -> Self {
        Self {
            text: text.into(),
            rate: rate.clamp(0.0, 1.0),
            volume: 1.0,
            post_utterance_delay: POST_UTTERANCE_DELAY,
            language: None,
        }
    }
}

/// Synthesizer delegate callbacks. Ranges are character indices into
/// [`Utterance::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSynthEvent {
    DidStart,
    WillSpeakRange { location: usize, length: usize },
    DidPause,
    DidContinue,
    DidCancel,
    DidFinish,
}

/// The platform speech synthesizer.
pub trait LocalSynthesizer: Send + Sync {
    /// Queue an utterance and return its callback stream.
    fn speak(&self, utterance: Utterance)
    -> Result<mpsc::UnboundedReceiver<LocalSynthEvent>, SpeechError>;

    /// Stop immediately. `false` if the synthesizer refused.
    fn stop(&self) -> bool;

    fn pause(&self) -> bool;

    fn resume(&self) -> bool;

    fn is_speaking(&self) -> bool;

    fn is_paused(&self) -> bool;
}
