//! Playback controller. The single owner of "what is being spoken now".
//!
//! The controller runs as an actor task. [`PlaybackController`] handles
//! send commands over a channel and get replies on a oneshot, while the
//! actor also drains the current session's [`EngineEvents`]. Every state
//! change is pushed to two places:
//!
//! - the [`ControllerEvent`] stream returned by [`PlaybackController::spawn`]
//! - a [`watch`] channel holding the latest [`PlaybackSnapshot`]
//!
//! ```text
//!   Idle ──play──▶ Starting ──Started──▶ Playing ──pause (local)──▶ Paused
//!    ▲                │                    │  ▲                        │
//!    │                │                    │  └──────continue──────────┘
//!    └────────────────┴──Stopped/Failed────┘
//! ```
//!
//! At most one session is live. Playing on the engine that is already
//! speaking stops it (toggle). Playing on the other engine stops the old
//! session and replaces it immediately.

use std::path::PathBuf;
use std::sync::Arc;

use speakline_core::{
    EngineEvent, EngineEvents, EngineKind, HighlightRange, PlaybackFailure, Segment, Speaker,
    SpeechError, VoiceConfig, WordBoundary,
};
use tokio::sync::{mpsc, oneshot, watch};

use crate::engine::{CloudEngine, LocalEngine, SpeechEngine, StartOutcome};
use crate::export::AudioExporter;
use crate::session::{PlayStatus, PlaybackSession, PlaybackSnapshot, PlaybackState};
use crate::store::AudioFileStore;

/// Notifications for views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    StateChanged(PlaybackState),
    /// The highlighted range in the session's full text moved.
    HighlightMoved { range: HighlightRange, word: String },
    /// A session ended with an error or a cancellation.
    Failed(PlaybackFailure),
}

/// What a play-like command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A new session was started.
    Started,
    /// The engine was already speaking and has been asked to stop.
    Toggled,
    /// The request runs once the current session reports its end.
    Queued,
    /// A natively paused session continued.
    Resumed,
    /// Nothing to do; the current session is still running.
    Unchanged,
}

// ── Commands ───────────────────────────────────────────────────────

/// A play request that has not reached an engine yet.
#[derive(Debug, Clone)]
struct PendingPlay {
    engine: EngineKind,
    voice: VoiceConfig,
    segments: Vec<Segment>,
}

enum Command {
    Play {
        request: PendingPlay,
        reply: oneshot::Sender<Result<PlayOutcome, SpeechError>>,
    },
    TestSpeaker {
        speaker: Speaker,
        style: Option<String>,
        role: Option<String>,
        reply: oneshot::Sender<Result<PlayOutcome, SpeechError>>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Continue {
        reply: oneshot::Sender<Result<PlayOutcome, SpeechError>>,
    },
    Stop {
        reply: oneshot::Sender<bool>,
    },
    DefaultVoice {
        reply: oneshot::Sender<VoiceConfig>,
    },
    SetDefaultVoice {
        voice: VoiceConfig,
    },
}

// ── Handle ─────────────────────────────────────────────────────────

/// Cloneable handle to the controller actor.
///
/// The actor shuts down and stops any live speech once every handle is
/// dropped.
#[derive(Clone)]
pub struct PlaybackController {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    cloud: Arc<CloudEngine>,
    local: Arc<LocalEngine>,
    exporter: Arc<AudioExporter>,
}

impl PlaybackController {
    /// Spawn the actor on the current Tokio runtime.
    pub fn spawn(
        cloud: Arc<CloudEngine>,
        local: Arc<LocalEngine>,
        store: AudioFileStore,
        default_voice: VoiceConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::default());

        let actor = ControllerActor {
            cloud: Arc::clone(&cloud),
            local: Arc::clone(&local),
            default_voice,
            state: PlaybackState::Idle,
            session: None,
            events: None,
            queued: None,
            event_tx,
            snapshot_tx,
        };
        tokio::spawn(actor.run(command_rx));

        let exporter = Arc::new(AudioExporter::new(Arc::clone(&cloud), store));
        (
            Self {
                commands: command_tx,
                snapshot: snapshot_rx,
                cloud,
                local,
                exporter,
            },
            event_rx,
        )
    }

    /// Speak `segments` on `engine`.
    ///
    /// `voice` overrides the controller default for this call only.
    pub async fn play_contents(
        &self,
        engine: EngineKind,
        voice: Option<VoiceConfig>,
        segments: Vec<Segment>,
    ) -> Result<PlayOutcome, SpeechError> {
        let voice = match voice {
            Some(voice) => voice,
            None => self.default_voice().await?,
        };
        validate_voices(&voice, &segments)?;
        let request = PendingPlay {
            engine,
            voice,
            segments,
        };
        self.request(|reply| Command::Play { request, reply })
            .await?
    }

    /// Speak the speaker's sample phrase with the given expression,
    /// replacing whatever is playing.
    pub async fn test_speaker(
        &self,
        speaker: Speaker,
        style: Option<String>,
        role: Option<String>,
    ) -> Result<PlayOutcome, SpeechError> {
        self.request(|reply| Command::TestSpeaker {
            speaker,
            style,
            role,
            reply,
        })
        .await?
    }

    /// Pause the current session. Cloud sessions are stopped and can only
    /// be restarted from the beginning.
    pub async fn pause_speech(&self) -> Result<bool, SpeechError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Resume a native pause, or replay the last session from the start.
    pub async fn continue_speech(&self) -> Result<PlayOutcome, SpeechError> {
        self.request(|reply| Command::Continue { reply }).await?
    }

    /// Stop whatever is speaking and drop any queued request.
    pub async fn stop_speech(&self) -> Result<bool, SpeechError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.cloud.is_speaking() || self.local.is_speaking()
    }

    #[must_use]
    pub fn is_available(&self, engine: EngineKind) -> bool {
        match engine {
            EngineKind::Cloud => self.cloud.is_available(),
            EngineKind::Local => self.local.is_available(),
        }
    }

    pub async fn default_voice(&self) -> Result<VoiceConfig, SpeechError> {
        self.request(|reply| Command::DefaultVoice { reply }).await
    }

    pub fn set_default_voice(&self, voice: VoiceConfig) -> Result<(), SpeechError> {
        voice.validate()?;
        self.commands
            .send(Command::SetDefaultVoice { voice })
            .map_err(|_| SpeechError::ControllerClosed)
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    /// Render `segments` to the audio file for `name` on the cloud engine.
    ///
    /// Runs beside live playback and does not touch controller state.
    pub async fn output_contents(
        &self,
        segments: Vec<Segment>,
        voice: Option<VoiceConfig>,
        name: &str,
    ) -> Result<PathBuf, SpeechError> {
        let voice = match voice {
            Some(voice) => voice,
            None => self.default_voice().await?,
        };
        validate_voices(&voice, &segments)?;
        self.exporter.export(&segments, &voice, name).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SpeechError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .map_err(|_| SpeechError::ControllerClosed)?;
        rx.await.map_err(|_| SpeechError::ControllerClosed)
    }
}

// ── Actor ──────────────────────────────────────────────────────────

struct ControllerActor {
    cloud: Arc<CloudEngine>,
    local: Arc<LocalEngine>,
    default_voice: VoiceConfig,
    state: PlaybackState,
    /// Last session; kept after it ends so `continue` can replay it.
    session: Option<PlaybackSession>,
    /// Event stream of the live session.
    events: Option<EngineEvents>,
    /// Starts when the live session reports its terminal event.
    queued: Option<PendingPlay>,
    event_tx: mpsc::UnboundedSender<ControllerEvent>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl ControllerActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("Playback controller started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some(event) = next_event(&mut self.events) => {
                    self.on_engine_event(event).await;
                }
            }
        }

        if self.state.is_active() {
            if let Some(session) = &self.session {
                self.engine(session.engine).stop();
            }
        }
        tracing::debug!("Playback controller shut down");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Play { request, reply } => {
                let result = self.play(request).await;
                let _ = reply.send(result);
            }
            Command::TestSpeaker {
                speaker,
                style,
                role,
                reply,
            } => {
                let result = self.test_speaker(speaker, style, role).await;
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            Command::Continue { reply } => {
                let result = self.resume().await;
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                let _ = reply.send(self.stop());
            }
            Command::DefaultVoice { reply } => {
                let _ = reply.send(self.default_voice.clone());
            }
            Command::SetDefaultVoice { voice } => {
                tracing::debug!(speaker = %voice.speaker.voice_name, "Default voice changed");
                self.default_voice = voice;
            }
        }
    }

    fn engine(&self, kind: EngineKind) -> &dyn SpeechEngine {
        match kind {
            EngineKind::Cloud => self.cloud.as_ref(),
            EngineKind::Local => self.local.as_ref(),
        }
    }

    async fn play(&mut self, request: PendingPlay) -> Result<PlayOutcome, SpeechError> {
        self.queued = None;
        let PendingPlay {
            engine,
            voice,
            segments,
        } = request;

        let superseded = self
            .session
            .as_ref()
            .map(|s| s.engine)
            .filter(|current| self.state.is_active() && *current != engine);
        if let Some(current) = superseded {
            tracing::info!(
                old = current.title(),
                new = engine.title(),
                "Superseding active session"
            );
            self.engine(current).stop();
            self.events = None;
            if let Some(session) = self.session.as_mut() {
                session.suspended = false;
                session.mark_finished();
            }
            self.set_state(PlaybackState::Idle);
        }

        let started = self.engine(engine).start(&segments, &voice).await;
        match started {
            Ok(StartOutcome::Toggled) => {
                if let Some(session) = self.session.as_mut() {
                    session.suspended = false;
                }
                Ok(PlayOutcome::Toggled)
            }
            Ok(StartOutcome::Started(events)) => {
                let session = PlaybackSession::new(engine, voice, segments);
                tracing::info!(
                    session = %session.id,
                    engine = engine.title(),
                    chars = session.full_text.chars().count(),
                    "Playback requested"
                );
                self.session = Some(session);
                self.events = Some(events);
                self.set_state(PlaybackState::Starting);
                self.publish();
                Ok(PlayOutcome::Started)
            }
            Err(e) => {
                tracing::warn!(engine = engine.title(), error = %e, "Playback failed to start");
                self.emit(ControllerEvent::Failed(PlaybackFailure::from(&e)));
                self.set_state(PlaybackState::Idle);
                self.publish();
                Err(e)
            }
        }
    }

    async fn test_speaker(
        &mut self,
        speaker: Speaker,
        style: Option<String>,
        role: Option<String>,
    ) -> Result<PlayOutcome, SpeechError> {
        let engine = speaker.engine();
        let phrase = speaker.language.test_phrase(&speaker.display_name);
        let mut voice = VoiceConfig::for_speaker(speaker);
        if let Some(style) = style {
            voice = voice.with_style(style);
        }
        if let Some(role) = role {
            voice = voice.with_role(role);
        }
        let request = PendingPlay {
            engine,
            segments: vec![Segment::with_voice(phrase, voice.clone())],
            voice,
        };

        match self.session.as_ref().map(|s| s.engine) {
            Some(current) if self.state.is_active() => {
                self.engine(current).stop();
                if let Some(session) = self.session.as_mut() {
                    session.suspended = false;
                }
                self.queued = Some(request);
                Ok(PlayOutcome::Queued)
            }
            _ => self.play(request).await,
        }
    }

    fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing && self.state != PlaybackState::Starting {
            return false;
        }
        let Some(engine) = self.session.as_ref().map(|s| s.engine) else {
            return false;
        };
        match engine {
            // The Paused event moves the state.
            EngineKind::Local => self.local.pause(),
            EngineKind::Cloud => {
                let stopped = self.cloud.stop();
                if let Some(session) = self.session.as_mut() {
                    session.suspended = true;
                    session.status = PlayStatus::Loading;
                }
                self.publish();
                stopped
            }
        }
    }

    async fn resume(&mut self) -> Result<PlayOutcome, SpeechError> {
        if self.state == PlaybackState::Paused && self.local.resume() {
            return Ok(PlayOutcome::Resumed);
        }
        let Some(session) = self.session.as_ref() else {
            return Err(SpeechError::NothingToResume);
        };
        let request = PendingPlay {
            engine: session.engine,
            voice: session.voice.clone(),
            segments: session.segments.clone(),
        };

        if self.state.is_active() {
            if session.suspended {
                tracing::debug!("Replay queued until the stopped session ends");
                self.queued = Some(request);
                return Ok(PlayOutcome::Queued);
            }
            return Ok(PlayOutcome::Unchanged);
        }
        self.play(request).await
    }

    fn stop(&mut self) -> bool {
        self.queued = None;
        let Some(engine) = self.session.as_ref().map(|s| s.engine) else {
            return false;
        };
        if let Some(session) = self.session.as_mut() {
            session.suspended = false;
        }
        if !self.state.is_active() {
            return false;
        }
        self.engine(engine).stop()
    }

    async fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Started => {
                if let Some(session) = self.session.as_mut() {
                    session.mark_started();
                }
                self.set_state(PlaybackState::Playing);
                self.publish();
            }
            EngineEvent::Progress(boundary) => self.on_progress(&boundary),
            EngineEvent::Paused => {
                self.set_state(PlaybackState::Paused);
                self.publish();
            }
            EngineEvent::Resumed => {
                self.set_state(PlaybackState::Playing);
                self.publish();
            }
            EngineEvent::Stopped => self.finish(None).await,
            EngineEvent::Failed(failure) => self.finish(Some(failure)).await,
        }
    }

    fn on_progress(&mut self, boundary: &WordBoundary) {
        if self.state != PlaybackState::Playing {
            tracing::trace!(state = ?self.state, "Progress outside playing state ignored");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let range = session.apply_progress(boundary);
        let word = session.last_spoken_word.clone();
        self.emit(ControllerEvent::HighlightMoved { range, word });
        self.publish();
    }

    async fn finish(&mut self, failure: Option<PlaybackFailure>) {
        self.events = None;
        if let Some(session) = self.session.as_mut() {
            session.mark_finished();
        }
        self.set_state(PlaybackState::Idle);
        self.publish();
        if let Some(failure) = failure {
            tracing::info!(kind = ?failure.kind, message = %failure.message, "Session ended with failure");
            self.emit(ControllerEvent::Failed(failure));
        }

        if let Some(request) = self.queued.take() {
            tracing::debug!(engine = request.engine.title(), "Starting queued request");
            if let Err(e) = self.play(request).await {
                tracing::warn!(error = %e, "Queued request failed to start");
            }
        }
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        if self.state != new_state {
            tracing::debug!(old = ?self.state, new = ?new_state, "Playback state transition");
            self.state = new_state;
            self.emit(ControllerEvent::StateChanged(new_state));
        }
    }

    fn publish(&self) {
        let snapshot = self.session.as_ref().map_or_else(
            || PlaybackSnapshot {
                state: self.state,
                ..PlaybackSnapshot::default()
            },
            |session| session.snapshot(self.state),
        );
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Best-effort; a dropped receiver only loses notifications.
    fn emit(&self, event: ControllerEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Controller event receiver dropped");
        }
    }
}

/// Check the call-level voice and every segment that brings its own.
fn validate_voices(default: &VoiceConfig, segments: &[Segment]) -> Result<(), SpeechError> {
    default.validate()?;
    for segment in segments.iter().filter(|s| !s.use_default_voice && !s.is_pause()) {
        segment.voice.validate()?;
    }
    Ok(())
}

async fn next_event(events: &mut Option<EngineEvents>) -> Option<EngineEvent> {
    match events {
        Some(events) => events.next().await,
        None => std::future::pending().await,
    }
}
