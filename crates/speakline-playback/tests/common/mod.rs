//! Shared test doubles for the playback integration tests.
//!
//! - [`ScriptedCloudClient`] plays back canned callbacks, or lets the test
//!   push them one at a time.
//! - [`FakeLocalSynth`] behaves like a platform synthesizer with pause
//!   support.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use speakline_core::language::FixedLanguage;
use speakline_core::{
    AudioOutputFormat, CloudAudioTarget, CloudClientError, CloudClientEvent, CloudSpeechClient,
    CloudSpeechRequest, LocalSynthEvent, LocalSynthesizer, SpeechError, SpeechSettings, Utterance,
};
use speakline_playback::{CloudEngine, ControllerEvent, LocalEngine};
use tokio::sync::mpsc;
use uuid::Uuid;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn cloud_settings(audio_dir: Option<PathBuf>) -> SpeechSettings {
    SpeechSettings {
        cloud_key: Some("test-key".to_string()),
        cloud_region: Some("westus".to_string()),
        audio_dir,
        output_format: Some(AudioOutputFormat::Audio24Khz48KBitRateMonoMp3),
        default_locale: Some("en-US".to_string()),
        log_markup: Some(true),
    }
}

pub fn cloud_engine(client: &Arc<ScriptedCloudClient>) -> CloudEngine {
    CloudEngine::new(
        Arc::clone(client) as Arc<dyn CloudSpeechClient>,
        &cloud_settings(None),
    )
    .with_detector(Arc::new(FixedLanguage::new("en")))
}

pub fn local_engine(synth: &Arc<FakeLocalSynth>) -> LocalEngine {
    LocalEngine::new(Arc::clone(synth) as Arc<dyn LocalSynthesizer>)
        .with_detector(Arc::new(FixedLanguage::new("en")))
}

/// Receive controller events until one matches, failing after [`WAIT`].
pub async fn wait_for(
    events: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    mut predicate: impl FnMut(&ControllerEvent) -> bool,
) -> ControllerEvent {
    let found = tokio::time::timeout(WAIT, async {
        while let Some(event) = events.recv().await {
            if predicate(&event) {
                return Some(event);
            }
        }
        None
    })
    .await;
    match found {
        Ok(Some(event)) => event,
        Ok(None) => panic!("controller event stream closed"),
        Err(_) => panic!("timed out waiting for controller event"),
    }
}

/// Everything currently queued on the event stream.
pub fn drain(events: &mut mpsc::UnboundedReceiver<ControllerEvent>) -> Vec<ControllerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

// ── Cloud client ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum CloudScript {
    /// Send these callbacks as soon as the request begins.
    Auto(Vec<CloudClientEvent>),
    /// Wait for [`ScriptedCloudClient::push`].
    Manual,
    /// Refuse every request.
    Refuse,
}

pub struct ScriptedCloudClient {
    script: CloudScript,
    /// Bytes written to the file for `File` targets.
    file_bytes: Vec<u8>,
    requests: Mutex<Vec<CloudSpeechRequest>>,
    live: Mutex<HashMap<Uuid, mpsc::UnboundedSender<CloudClientEvent>>>,
    last: Mutex<Option<Uuid>>,
    cancels: AtomicUsize,
}

impl ScriptedCloudClient {
    pub fn new(script: CloudScript) -> Self {
        Self {
            script,
            file_bytes: b"ID3\x04audio".to_vec(),
            requests: Mutex::new(Vec::new()),
            live: Mutex::new(HashMap::new()),
            last: Mutex::new(None),
            cancels: AtomicUsize::new(0),
        }
    }

    /// A client that speaks every request to completion.
    pub fn completing() -> Self {
        Self::new(CloudScript::Auto(vec![
            CloudClientEvent::SynthesisStarted,
            CloudClientEvent::Synthesizing,
            CloudClientEvent::Completed,
        ]))
    }

    #[must_use]
    pub fn with_file_bytes(mut self, bytes: &[u8]) -> Self {
        self.file_bytes = bytes.to_vec();
        self
    }

    pub fn begins(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CloudSpeechRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Send a callback on the most recent request.
    pub fn push(&self, event: CloudClientEvent) {
        let Some(id) = *self.last.lock().unwrap_or_else(PoisonError::into_inner) else {
            panic!("no request to push to");
        };
        self.send(id, event);
    }

    fn send(&self, id: Uuid, event: CloudClientEvent) {
        let terminal = matches!(
            event,
            CloudClientEvent::Completed | CloudClientEvent::Canceled { .. }
        );
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = live.get(&id) {
            let _ = tx.send(event);
        }
        if terminal {
            live.remove(&id);
        }
    }
}

#[async_trait]
impl CloudSpeechClient for ScriptedCloudClient {
    async fn begin(
        &self,
        request: CloudSpeechRequest,
    ) -> Result<mpsc::UnboundedReceiver<CloudClientEvent>, CloudClientError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        if matches!(self.script, CloudScript::Refuse) {
            return Err(CloudClientError::Transport("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request.request_id, tx);
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(request.request_id);

        if let CloudScript::Auto(events) = &self.script {
            if let CloudAudioTarget::File(path) = &request.target {
                std::fs::write(path, &self.file_bytes)
                    .map_err(|e| CloudClientError::Transport(e.to_string()))?;
            }
            for event in events {
                self.send(request.request_id, event.clone());
            }
        }
        Ok(rx)
    }

    fn cancel(&self, request_id: Uuid) -> Result<(), CloudClientError> {
        if !self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&request_id)
        {
            return Err(CloudClientError::UnknownRequest(request_id));
        }
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.send(
            request_id,
            CloudClientEvent::Canceled {
                error_code: "0".to_string(),
                error_details: "cancelled by caller".to_string(),
            },
        );
        Ok(())
    }
}

// ── Local synthesizer ──────────────────────────────────────────────

#[derive(Default)]
struct SynthState {
    tx: Option<mpsc::UnboundedSender<LocalSynthEvent>>,
    speaking: bool,
    paused: bool,
    utterances: Vec<Utterance>,
}

/// Announces `DidStart` on every `speak`; the test drives the rest.
#[derive(Default)]
pub struct FakeLocalSynth {
    state: Mutex<SynthState>,
}

impl FakeLocalSynth {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SynthState) -> T) -> T {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_speaking_now(&self) -> bool {
        self.with_state(|s| s.speaking)
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.with_state(|s| s.utterances.clone())
    }

    pub fn speak_range(&self, location: usize, length: usize) {
        self.with_state(|s| {
            if let Some(tx) = &s.tx {
                let _ = tx.send(LocalSynthEvent::WillSpeakRange { location, length });
            }
        });
    }

    pub fn finish(&self) {
        self.with_state(|s| {
            if let Some(tx) = s.tx.take() {
                let _ = tx.send(LocalSynthEvent::DidFinish);
            }
            s.speaking = false;
            s.paused = false;
        });
    }
}

impl LocalSynthesizer for FakeLocalSynth {
    fn speak(
        &self,
        utterance: Utterance,
    ) -> Result<mpsc::UnboundedReceiver<LocalSynthEvent>, SpeechError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(LocalSynthEvent::DidStart);
        self.with_state(|s| {
            s.tx = Some(tx);
            s.speaking = true;
            s.paused = false;
            s.utterances.push(utterance);
        });
        Ok(rx)
    }

    fn stop(&self) -> bool {
        self.with_state(|s| {
            if !s.speaking {
                return false;
            }
            if let Some(tx) = s.tx.take() {
                let _ = tx.send(LocalSynthEvent::DidCancel);
            }
            s.speaking = false;
            s.paused = false;
            true
        })
    }

    fn pause(&self) -> bool {
        self.with_state(|s| {
            if !s.speaking || s.paused {
                return false;
            }
            s.paused = true;
            if let Some(tx) = &s.tx {
                let _ = tx.send(LocalSynthEvent::DidPause);
            }
            true
        })
    }

    fn resume(&self) -> bool {
        self.with_state(|s| {
            if !s.paused {
                return false;
            }
            s.paused = false;
            if let Some(tx) = &s.tx {
                let _ = tx.send(LocalSynthEvent::DidContinue);
            }
            true
        })
    }

    fn is_speaking(&self) -> bool {
        self.with_state(|s| s.speaking)
    }

    fn is_paused(&self) -> bool {
        self.with_state(|s| s.paused)
    }
}
