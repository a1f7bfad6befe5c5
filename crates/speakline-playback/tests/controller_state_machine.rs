//! Integration tests for the `PlaybackController` state machine.
//!
//! Both engines run against in-process doubles from `common`, so no audio
//! device or network is needed.
//!
//! # What is tested
//!
//! - Start, progress and completion on each engine
//! - Toggle on the same engine and supersede across engines
//! - Cloud offset correction and the local running cursor
//! - Native pause on the local engine, stop-and-replay on the cloud engine
//! - Speaker auditions queued behind a running session
//! - Usage accounting on completion only
//! - Failure reporting for an unavailable engine and invalid voices

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    CloudScript, FakeLocalSynth, ScriptedCloudClient, cloud_engine, drain, init_tracing,
    local_engine, wait_for,
};
use mockall::mock;
use speakline_core::language::FixedLanguage;
use speakline_core::{
    AudioOutputFormat, CloudClientEvent, CloudSpeechClient, EngineKind, FailureKind,
    HighlightRange, Segment, Speaker, SpeechError, SpeechSettings, UsageLedger, VoiceConfig,
};
use speakline_playback::{
    AudioFileStore, CloudEngine, ControllerEvent, PlayOutcome, PlayStatus, PlaybackController,
    PlaybackState,
};
use tokio::sync::mpsc;

mock! {
    Ledger {}
    impl UsageLedger for Ledger {
        fn record(&self, chars: u64);
        fn total(&self) -> u64;
    }
}

struct Harness {
    controller: PlaybackController,
    events: mpsc::UnboundedReceiver<ControllerEvent>,
    client: Arc<ScriptedCloudClient>,
    synth: Arc<FakeLocalSynth>,
}

fn harness_with(client: ScriptedCloudClient, cloud: impl FnOnce(CloudEngine) -> CloudEngine) -> Harness {
    init_tracing();
    let client = Arc::new(client);
    let synth = Arc::new(FakeLocalSynth::new());
    let (controller, events) = PlaybackController::spawn(
        Arc::new(cloud(cloud_engine(&client))),
        Arc::new(local_engine(&synth)),
        AudioFileStore::new(std::env::temp_dir(), AudioOutputFormat::default()),
        VoiceConfig::default(),
    );
    Harness {
        controller,
        events,
        client,
        synth,
    }
}

fn harness(script: CloudScript) -> Harness {
    harness_with(ScriptedCloudClient::new(script), |engine| engine)
}

fn state(target: PlaybackState) -> impl FnMut(&ControllerEvent) -> bool {
    move |event| matches!(event, ControllerEvent::StateChanged(s) if *s == target)
}

fn is_highlight(event: &ControllerEvent) -> bool {
    matches!(event, ControllerEvent::HighlightMoved { .. })
}

fn is_failure(event: &ControllerEvent) -> bool {
    matches!(event, ControllerEvent::Failed(_))
}

// ── Lifecycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn starts_idle() {
    let h = harness(CloudScript::Manual);
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Idle);
    assert_eq!(snapshot.status, PlayStatus::NotStarted);
    assert!(snapshot.engine.is_none());
    assert!(!h.controller.is_speaking());
}

#[tokio::test]
async fn cloud_session_runs_to_completion_and_records_usage() {
    let mut ledger = MockLedger::new();
    ledger.expect_record().withf(|chars| *chars == 11).times(1).return_const(());
    ledger.expect_total().return_const(11_u64);
    let mut h = harness_with(ScriptedCloudClient::completing(), |engine| {
        engine.with_ledger(Arc::new(ledger))
    });

    let outcome = h
        .controller
        .play_contents(EngineKind::Cloud, None, vec![Segment::text("Hello world")])
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::Started);

    wait_for(&mut h.events, state(PlaybackState::Playing)).await;
    wait_for(&mut h.events, state(PlaybackState::Idle)).await;
    assert!(!drain(&mut h.events).iter().any(is_failure));

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Idle);
    assert_eq!(snapshot.status, PlayStatus::NotStarted);
    assert_eq!(snapshot.full_text, "Hello world");
    assert_eq!(h.client.begins(), 1);
}

#[tokio::test]
async fn cloud_request_carries_assembled_markup() {
    let mut h = harness(CloudScript::Manual);
    let voice = VoiceConfig::for_speaker(Speaker::xiaoxiao()).with_style("cheerful");
    h.controller
        .play_contents(EngineKind::Cloud, Some(voice), vec![Segment::text("Fish & chips")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Starting)).await;

    let request = h.client.last_request().unwrap();
    assert!(request.markup.contains("zh-CN-XiaoxiaoNeural"));
    assert!(request.markup.contains(r#"style="cheerful""#));
    assert!(request.markup.contains("Fish &amp; chips"));
}

#[tokio::test]
async fn local_session_speaks_full_text() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(
            EngineKind::Local,
            None,
            vec![Segment::text("first"), Segment::text("second")],
        )
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    let utterances = h.synth.utterances();
    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].text, "first\nsecond");
    assert_eq!(utterances[0].language.as_deref(), Some("en"));

    h.synth.finish();
    wait_for(&mut h.events, state(PlaybackState::Idle)).await;
    assert_eq!(h.controller.snapshot().status, PlayStatus::NotStarted);
}

// ── Highlights ─────────────────────────────────────────────────────

#[tokio::test]
async fn cloud_word_offsets_are_corrected_into_full_text() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(
            EngineKind::Cloud,
            None,
            vec![Segment::text("good morning"), Segment::text("dear friend")],
        )
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Starting)).await;

    h.client.push(CloudClientEvent::SynthesisStarted);
    h.client.push(CloudClientEvent::WordBoundary {
        text: "friend".to_string(),
        text_offset: 15,
        word_length: 6,
    });

    let event = wait_for(&mut h.events, is_highlight).await;
    assert_eq!(
        event,
        ControllerEvent::HighlightMoved {
            range: HighlightRange::new(18, 6),
            word: "friend".to_string(),
        }
    );
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.text_offset, 18);
    assert_eq!(snapshot.matched_word_length, 6);
    assert_eq!(snapshot.last_spoken_word, "friend");
    assert_eq!(snapshot.status, PlayStatus::Playing);
}

#[tokio::test]
async fn local_highlight_follows_running_cursor() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(EngineKind::Local, None, vec![Segment::text("one two")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    h.synth.speak_range(0, 3);
    h.synth.speak_range(4, 3);

    let first = wait_for(&mut h.events, is_highlight).await;
    let second = wait_for(&mut h.events, is_highlight).await;
    assert_eq!(
        first,
        ControllerEvent::HighlightMoved {
            range: HighlightRange::new(0, 3),
            word: "one".to_string(),
        }
    );
    assert_eq!(
        second,
        ControllerEvent::HighlightMoved {
            range: HighlightRange::new(3, 3),
            word: "two".to_string(),
        }
    );
}

// ── Toggle and supersede ───────────────────────────────────────────

#[tokio::test]
async fn playing_same_engine_again_stops_it() {
    let mut h = harness(CloudScript::Manual);
    let segments = vec![Segment::text("hello")];
    h.controller
        .play_contents(EngineKind::Local, None, segments.clone())
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    let outcome = h
        .controller
        .play_contents(EngineKind::Local, None, segments)
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::Toggled);

    wait_for(&mut h.events, state(PlaybackState::Idle)).await;
    assert!(!h.synth.is_speaking_now());
    assert_eq!(h.synth.utterances().len(), 1);
}

#[tokio::test]
async fn playing_cloud_again_cancels_the_running_request() {
    let mut h = harness(CloudScript::Manual);
    let segments = vec![Segment::text("hello cloud")];
    h.controller
        .play_contents(EngineKind::Cloud, None, segments.clone())
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Starting)).await;
    h.client.push(CloudClientEvent::SynthesisStarted);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    let outcome = h
        .controller
        .play_contents(EngineKind::Cloud, None, segments)
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::Toggled);
    assert_eq!(h.client.begins(), 1);
    assert_eq!(h.client.cancels(), 1);

    wait_for(&mut h.events, state(PlaybackState::Idle)).await;
    let ControllerEvent::Failed(failure) = wait_for(&mut h.events, is_failure).await else {
        unreachable!();
    };
    assert!(failure.is_cancellation());
    assert!(!h.controller.is_speaking());
}

#[tokio::test]
async fn playing_other_engine_supersedes_the_session() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(EngineKind::Local, None, vec![Segment::text("local")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    let outcome = h
        .controller
        .play_contents(EngineKind::Cloud, None, vec![Segment::text("cloud")])
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::Started);
    assert!(!h.synth.is_speaking_now());

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.engine, Some(EngineKind::Cloud));
    assert_eq!(snapshot.state, PlaybackState::Starting);
    assert_eq!(snapshot.status, PlayStatus::Loading);
    assert_eq!(snapshot.full_text, "cloud");

    h.client.push(CloudClientEvent::SynthesisStarted);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;
    assert_eq!(h.controller.snapshot().engine, Some(EngineKind::Cloud));
}

// ── Stop and cancellation ──────────────────────────────────────────

#[tokio::test]
async fn stopping_cloud_reports_cancellation_without_usage() {
    let mut ledger = MockLedger::new();
    ledger.expect_record().times(0);
    let mut h = harness_with(ScriptedCloudClient::new(CloudScript::Manual), |engine| {
        engine.with_ledger(Arc::new(ledger))
    });
    h.controller
        .play_contents(EngineKind::Cloud, None, vec![Segment::text("hello")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Starting)).await;
    h.client.push(CloudClientEvent::SynthesisStarted);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    assert!(h.controller.stop_speech().await.unwrap());

    let ControllerEvent::Failed(failure) = wait_for(&mut h.events, is_failure).await else {
        unreachable!();
    };
    assert!(failure.is_cancellation());
    assert_eq!(h.client.cancels(), 1);
    assert_eq!(h.controller.snapshot().state, PlaybackState::Idle);
    assert!(!h.controller.is_speaking());
}

#[tokio::test]
async fn stop_when_idle_does_nothing() {
    let h = harness(CloudScript::Manual);
    assert!(!h.controller.stop_speech().await.unwrap());
    assert_eq!(h.client.cancels(), 0);
}

#[tokio::test]
async fn unavailable_cloud_engine_fails_fast() {
    init_tracing();
    let client = Arc::new(ScriptedCloudClient::completing());
    let synth = Arc::new(FakeLocalSynth::new());
    let cloud = CloudEngine::new(
        Arc::clone(&client) as Arc<dyn CloudSpeechClient>,
        &SpeechSettings::default(),
    )
    .with_detector(Arc::new(FixedLanguage::new("en")));
    let (controller, mut events) = PlaybackController::spawn(
        Arc::new(cloud),
        Arc::new(local_engine(&synth)),
        AudioFileStore::new(std::env::temp_dir(), AudioOutputFormat::default()),
        VoiceConfig::default(),
    );
    assert!(!controller.is_available(EngineKind::Cloud));
    assert!(controller.is_available(EngineKind::Local));

    let err = controller
        .play_contents(EngineKind::Cloud, None, vec![Segment::text("hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::EngineUnavailable { engine: EngineKind::Cloud, .. }));

    let ControllerEvent::Failed(failure) = wait_for(&mut events, is_failure).await else {
        unreachable!();
    };
    assert_eq!(failure.kind, FailureKind::Configuration);
    assert_eq!(controller.snapshot().state, PlaybackState::Idle);
    assert_eq!(client.begins(), 0);
}

#[tokio::test]
async fn refused_cloud_request_returns_to_idle() {
    let mut h = harness(CloudScript::Refuse);
    let err = h
        .controller
        .play_contents(EngineKind::Cloud, None, vec![Segment::text("hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::Client(_)));
    wait_for(&mut h.events, is_failure).await;
    assert_eq!(h.controller.snapshot().state, PlaybackState::Idle);
    assert!(!h.controller.is_speaking());
}

#[tokio::test]
async fn invalid_voice_is_rejected_before_any_engine_call() {
    let h = harness(CloudScript::Manual);
    let mut voice = VoiceConfig::default();
    voice.rate = 900.0;
    let err = h
        .controller
        .play_contents(EngineKind::Cloud, Some(voice.clone()), vec![Segment::text("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::InvalidConfig(_)));
    assert!(h.controller.set_default_voice(voice).is_err());
    assert_eq!(h.client.begins(), 0);
}

#[tokio::test]
async fn invalid_segment_voice_is_rejected() {
    let h = harness(CloudScript::Manual);
    let mut voice = VoiceConfig::for_speaker(Speaker::xiaoxiao());
    voice.style_degree = 5.0;
    let segments = vec![
        Segment::text("fine"),
        Segment::with_voice("too expressive", voice),
    ];
    let err = h
        .controller
        .play_contents(EngineKind::Cloud, None, segments)
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::InvalidConfig(_)));
    assert_eq!(h.client.begins(), 0);
    assert_eq!(h.controller.snapshot().state, PlaybackState::Idle);
}

// ── Pause and continue ─────────────────────────────────────────────

#[tokio::test]
async fn local_pause_and_continue_are_native() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(EngineKind::Local, None, vec![Segment::text("long text")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    assert!(h.controller.pause_speech().await.unwrap());
    wait_for(&mut h.events, state(PlaybackState::Paused)).await;
    assert_eq!(h.controller.snapshot().state, PlaybackState::Paused);

    let outcome = h.controller.continue_speech().await.unwrap();
    assert_eq!(outcome, PlayOutcome::Resumed);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;
    assert_eq!(h.synth.utterances().len(), 1);
}

#[tokio::test]
async fn cloud_pause_stops_and_continue_replays_from_start() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(EngineKind::Cloud, None, vec![Segment::text("story time")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Starting)).await;
    h.client.push(CloudClientEvent::SynthesisStarted);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    assert!(h.controller.pause_speech().await.unwrap());
    assert_eq!(h.controller.snapshot().status, PlayStatus::Loading);
    assert_eq!(h.client.cancels(), 1);

    // The replay starts now or once the cancelled session has ended.
    let outcome = h.controller.continue_speech().await.unwrap();
    assert!(matches!(outcome, PlayOutcome::Queued | PlayOutcome::Started));

    wait_for(&mut h.events, state(PlaybackState::Starting)).await;
    assert_eq!(h.client.begins(), 2);
    h.client.push(CloudClientEvent::SynthesisStarted);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.full_text, "story time");
    assert_eq!(snapshot.status, PlayStatus::Playing);
    assert_eq!(snapshot.text_offset, 0);
}

#[tokio::test]
async fn continue_without_a_session_fails() {
    let h = harness(CloudScript::Manual);
    let err = h.controller.continue_speech().await.unwrap_err();
    assert!(matches!(err, SpeechError::NothingToResume));
}

#[tokio::test]
async fn continue_after_finish_replays_last_session() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(EngineKind::Local, None, vec![Segment::text("again")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;
    h.synth.finish();
    wait_for(&mut h.events, state(PlaybackState::Idle)).await;

    let outcome = h.controller.continue_speech().await.unwrap();
    assert_eq!(outcome, PlayOutcome::Started);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;
    assert_eq!(h.synth.utterances().len(), 2);
}

// ── Speaker audition ───────────────────────────────────────────────

#[tokio::test]
async fn test_speaker_queues_behind_running_session() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(EngineKind::Local, None, vec![Segment::text("reading")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    let outcome = h
        .controller
        .test_speaker(Speaker::xiaoxiao(), Some("cheerful".to_string()), None)
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::Queued);

    wait_for(&mut h.events, state(PlaybackState::Idle)).await;
    wait_for(&mut h.events, state(PlaybackState::Starting)).await;

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.engine, Some(EngineKind::Cloud));
    assert!(snapshot.full_text.contains("Xiaoxiao"));
    let request = h.client.last_request().unwrap();
    assert!(request.markup.contains(r#"style="cheerful""#));
}

#[tokio::test]
async fn test_speaker_for_local_engine_speaks_immediately() {
    let mut h = harness(CloudScript::Manual);
    let outcome = h
        .controller
        .test_speaker(Speaker::local_engine(), None, None)
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::Started);
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;
    assert_eq!(h.controller.snapshot().engine, Some(EngineKind::Local));
    assert_eq!(h.client.begins(), 0);
}

// ── Defaults and shutdown ──────────────────────────────────────────

#[tokio::test]
async fn default_voice_round_trips_through_the_actor() {
    let h = harness(CloudScript::Manual);
    let voice = VoiceConfig::for_speaker(Speaker::xiaoxiao()).with_rate(50.0);
    h.controller.set_default_voice(voice.clone()).unwrap();
    assert_eq!(h.controller.default_voice().await.unwrap(), voice);
}

#[tokio::test]
async fn dropping_the_controller_stops_speech() {
    let mut h = harness(CloudScript::Manual);
    h.controller
        .play_contents(EngineKind::Local, None, vec![Segment::text("bye")])
        .await
        .unwrap();
    wait_for(&mut h.events, state(PlaybackState::Playing)).await;

    let synth = Arc::clone(&h.synth);
    drop(h.controller);

    tokio::time::timeout(Duration::from_secs(2), async {
        while synth.is_speaking_now() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}
