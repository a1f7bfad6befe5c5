//! Cloud engine adapter.
//!
//! Builds a markup document for each request, submits it to the
//! [`CloudSpeechClient`], and translates the client's callbacks into the
//! normalized event stream on a per-request task.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use speakline_core::{
    AudioOutputFormat, CloudAudioTarget, CloudClientEvent, CloudSpeechClient, CloudSpeechRequest, EngineEvents,
    EngineKind, EventSender, InMemoryUsageLedger, LanguageDetector, PlaybackFailure, Segment,
    SpeechError, SpeechSettings, UsageLedger, VoiceConfig, WhatlangDetector, WordBoundary,
    build_speech_document, event_channel, full_text,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{SpeechEngine, StartOutcome};

/// The cloud (network, markup-driven) engine.
pub struct CloudEngine {
    client: Arc<dyn CloudSpeechClient>,
    detector: Arc<dyn LanguageDetector>,
    ledger: Arc<dyn UsageLedger>,
    available: bool,
    format: AudioOutputFormat,
    fallback_locale: String,
    log_markup: bool,
    /// Live request, if any. Export requests are not tracked here.
    current: Arc<Mutex<Option<Uuid>>>,
}

impl CloudEngine {
    /// Create the adapter. Without cloud credentials in `settings` the
    /// engine reports itself unavailable and every start fails fast.
    pub fn new(client: Arc<dyn CloudSpeechClient>, settings: &SpeechSettings) -> Self {
        let available = settings.cloud_credentials().is_some();
        if !available {
            tracing::info!("Cloud engine disabled: no subscription key or region configured");
        }
        Self {
            client,
            detector: Arc::new(WhatlangDetector),
            ledger: Arc::new(InMemoryUsageLedger::new()),
            available,
            format: settings.effective_output_format(),
            fallback_locale: settings.effective_default_locale(),
            log_markup: settings.effective_log_markup(),
            current: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn UsageLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Characters spoken to completion so far.
    pub fn usage_total(&self) -> u64 {
        self.ledger.total()
    }

    #[must_use]
    pub const fn output_format(&self) -> AudioOutputFormat {
        self.format
    }

    /// Synthesize into `path` instead of the speaker.
    ///
    /// Never toggles and does not count as speaking, so it can run next to
    /// live playback.
    pub async fn synthesize_to_file(
        &self,
        segments: &[Segment],
        default: &VoiceConfig,
        path: PathBuf,
    ) -> Result<EngineEvents, SpeechError> {
        self.ensure_available()?;
        tracing::info!(path = %path.display(), "Synthesizing to file");
        self.launch(segments, default, CloudAudioTarget::File(path), false)
            .await
    }

    fn ensure_available(&self) -> Result<(), SpeechError> {
        if self.available {
            Ok(())
        } else {
            Err(SpeechError::EngineUnavailable {
                engine: EngineKind::Cloud,
                reason: "no cloud subscription key or region configured".to_string(),
            })
        }
    }

    fn current_request(&self) -> Option<Uuid> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn launch(
        &self,
        segments: &[Segment],
        default: &VoiceConfig,
        target: CloudAudioTarget,
        live: bool,
    ) -> Result<EngineEvents, SpeechError> {
        let document = build_speech_document(
            segments,
            default,
            self.detector.as_ref(),
            &self.fallback_locale,
        );
        if self.log_markup {
            tracing::debug!(markup = %document.markup, "Cloud speech document");
        }

        let request_id = Uuid::new_v4();
        if live {
            *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(request_id);
        }

        let request = CloudSpeechRequest {
            request_id,
            markup: document.markup,
            format: self.format,
            target,
        };
        let native = match self.client.begin(request).await {
            Ok(rx) => rx,
            Err(e) => {
                if live {
                    clear_if_current(&self.current, request_id);
                }
                tracing::warn!(%request_id, error = %e, "Cloud client refused request");
                return Err(e.into());
            }
        };

        let (tx, events) = event_channel();
        let translator = Translator {
            request_id,
            spoken_chars: u64::try_from(full_text(segments).chars().count()).unwrap_or(u64::MAX),
            ledger: Arc::clone(&self.ledger),
            current: live.then(|| Arc::clone(&self.current)),
        };
        tokio::spawn(translator.run(native, tx));

        tracing::info!(%request_id, live, "Cloud synthesis started");
        Ok(events)
    }
}

#[async_trait]
impl SpeechEngine for CloudEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Cloud
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn is_speaking(&self) -> bool {
        self.current_request().is_some()
    }

    async fn start(
        &self,
        segments: &[Segment],
        default: &VoiceConfig,
    ) -> Result<StartOutcome, SpeechError> {
        self.ensure_available()?;
        if self.is_speaking() {
            tracing::debug!("Cloud engine already speaking, toggling to stop");
            self.stop();
            return Ok(StartOutcome::Toggled);
        }
        self.launch(segments, default, CloudAudioTarget::Speaker, true)
            .await
            .map(StartOutcome::Started)
    }

    fn stop(&self) -> bool {
        let Some(request_id) = self.current_request() else {
            return false;
        };
        match self.client.cancel(request_id) {
            Ok(()) => {
                tracing::debug!(%request_id, "Cloud stop requested");
                true
            }
            Err(e) => {
                tracing::warn!(%request_id, error = %e, "Cloud stop failed");
                false
            }
        }
    }
}

fn clear_if_current(current: &Mutex<Option<Uuid>>, request_id: Uuid) {
    let mut guard = current.lock().unwrap_or_else(PoisonError::into_inner);
    if *guard == Some(request_id) {
        *guard = None;
    }
}

/// Maps one request's client callbacks onto the normalized stream.
struct Translator {
    request_id: Uuid,
    spoken_chars: u64,
    ledger: Arc<dyn UsageLedger>,
    current: Option<Arc<Mutex<Option<Uuid>>>>,
}

impl Translator {
    async fn run(self, mut native: mpsc::UnboundedReceiver<CloudClientEvent>, mut tx: EventSender) {
        while let Some(event) = native.recv().await {
            match event {
                CloudClientEvent::SynthesisStarted => tx.started(),
                CloudClientEvent::WordBoundary {
                    text,
                    text_offset,
                    word_length,
                } => tx.progress(WordBoundary {
                    word: text,
                    offset: text_offset,
                    length: word_length,
                }),
                CloudClientEvent::Synthesizing => {
                    tracing::trace!(request_id = %self.request_id, "Audio chunk");
                }
                CloudClientEvent::Completed => {
                    self.ledger.record(self.spoken_chars);
                    tracing::info!(request_id = %self.request_id, "Cloud synthesis completed");
                    self.finish();
                    tx.stopped();
                    return;
                }
                CloudClientEvent::Canceled {
                    error_code,
                    error_details,
                } => {
                    tracing::info!(
                        request_id = %self.request_id,
                        %error_code,
                        "Cloud synthesis cancelled"
                    );
                    self.finish();
                    tx.failed(PlaybackFailure::cancelled(format!(
                        "{error_code}: {error_details}"
                    )));
                    return;
                }
            }
        }
        self.finish();
        // Dropping `tx` without a terminal event reports the failure.
        tracing::warn!(request_id = %self.request_id, "Cloud client closed the callback stream early");
    }

    fn finish(&self) {
        if let Some(current) = &self.current {
            clear_if_current(current, self.request_id);
        }
    }
}
