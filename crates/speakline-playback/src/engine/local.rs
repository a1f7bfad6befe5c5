//! Local engine adapter.
//!
//! Speaks the plain full text through the platform synthesizer. Progress
//! ranges are character indices into that text, so no correction applies.

use std::sync::Arc;

use async_trait::async_trait;
use speakline_core::{
    EngineKind, EventSender, LanguageDetector, LocalSynthEvent, LocalSynthesizer, Segment,
    SpeechError, Utterance, VoiceConfig, WhatlangDetector, WordBoundary, event_channel, full_text,
};
use tokio::sync::mpsc;

use super::{SpeechEngine, StartOutcome};

/// Longest word reported with a progress event, in characters.
pub const MAX_PROGRESS_WORD_CHARS: usize = 8;

/// The local (on-device) engine.
pub struct LocalEngine {
    synth: Arc<dyn LocalSynthesizer>,
    detector: Arc<dyn LanguageDetector>,
}

impl LocalEngine {
    pub fn new(synth: Arc<dyn LocalSynthesizer>) -> Self {
        Self {
            synth,
            detector: Arc::new(WhatlangDetector),
        }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    fn utterance(&self, segments: &[Segment], default: &VoiceConfig) -> Utterance {
        let text = full_text(segments);
        let mut utterance = Utterance::new(text, default.local_speed());
        // Only English gets a dedicated voice; everything else uses the system one.
        utterance.language = self
            .detector
            .detect(&utterance.text)
            .filter(|code| code.starts_with("en"));
        utterance
    }
}

#[async_trait]
impl SpeechEngine for LocalEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_speaking(&self) -> bool {
        self.synth.is_speaking()
    }

    fn is_paused(&self) -> bool {
        self.synth.is_paused()
    }

    async fn start(
        &self,
        segments: &[Segment],
        default: &VoiceConfig,
    ) -> Result<StartOutcome, SpeechError> {
        if self.synth.is_speaking() {
            tracing::debug!("Local engine already speaking, toggling to stop");
            self.synth.stop();
            return Ok(StartOutcome::Toggled);
        }

        let utterance = self.utterance(segments, default);
        tracing::info!(
            chars = utterance.text.chars().count(),
            rate = utterance.rate,
            language = utterance.language.as_deref().unwrap_or("system"),
            "Local synthesis started"
        );
        let text: Vec<char> = utterance.text.chars().collect();
        let native = self.synth.speak(utterance)?;

        let (tx, events) = event_channel();
        tokio::spawn(translate(text, native, tx));
        Ok(StartOutcome::Started(events))
    }

    fn stop(&self) -> bool {
        let stopped = self.synth.stop();
        if !stopped {
            tracing::debug!("Local synthesizer had nothing to stop");
        }
        stopped
    }

    fn pause(&self) -> bool {
        self.synth.pause()
    }

    fn resume(&self) -> bool {
        self.synth.resume()
    }
}

async fn translate(
    text: Vec<char>,
    mut native: mpsc::UnboundedReceiver<LocalSynthEvent>,
    mut tx: EventSender,
) {
    while let Some(event) = native.recv().await {
        match event {
            LocalSynthEvent::DidStart => tx.started(),
            LocalSynthEvent::WillSpeakRange { location, length } => {
                tx.progress(WordBoundary {
                    word: progress_word(&text, location, length),
                    offset: location,
                    length,
                });
            }
            LocalSynthEvent::DidPause => tx.paused(),
            LocalSynthEvent::DidContinue => tx.resumed(),
            LocalSynthEvent::DidCancel | LocalSynthEvent::DidFinish => {
                tx.stopped();
                return;
            }
        }
    }
}

/// The spoken range, cut to [`MAX_PROGRESS_WORD_CHARS`].
fn progress_word(text: &[char], location: usize, length: usize) -> String {
    let start = location.min(text.len());
    let end = location.saturating_add(length).min(text.len());
    text[start..end]
        .iter()
        .take(MAX_PROGRESS_WORD_CHARS)
        .collect()
}
