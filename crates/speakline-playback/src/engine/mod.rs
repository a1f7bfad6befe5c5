//! Speech engine adapters. One contract over the cloud and local engines.
//!
//! The [`PlaybackController`](crate::controller::PlaybackController) holds
//! both adapters and talks to them only through [`SpeechEngine`], so the
//! state machine never sees SDK handles or native callbacks.
//!
//! ## Adapters
//!
//! | Module     | Engine | Input         | Pause |
//! |------------|--------|---------------|-------|
//! | [`cloud`]  | Cloud  | markup        |       |
//! | [`local`]  | Local  | plain text    |  ✓    |

pub mod cloud;
pub mod local;

use async_trait::async_trait;
use speakline_core::{EngineEvents, EngineKind, Segment, SpeechError, VoiceConfig};

pub use cloud::CloudEngine;
pub use local::LocalEngine;

/// What a call to [`SpeechEngine::start`] did.
#[derive(Debug)]
pub enum StartOutcome {
    /// A new session began; its events arrive on the stream.
    Started(EngineEvents),
    /// The engine was already speaking, so the call stopped it instead.
    /// The running session's own stream reports the terminal event.
    Toggled,
}

/// Engine-agnostic speech adapter.
///
/// Every stream returned by `start` carries exactly one `Started` and
/// exactly one terminal event (`Stopped` or `Failed`).
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Whether the engine can be used at all (credentials, device).
    fn is_available(&self) -> bool;

    fn is_speaking(&self) -> bool;

    fn is_paused(&self) -> bool {
        false
    }

    /// Begin speaking `segments`, or stop if already speaking.
    async fn start(
        &self,
        segments: &[Segment],
        default: &VoiceConfig,
    ) -> Result<StartOutcome, SpeechError>;

    /// Request an immediate stop. `false` if nothing was stopped.
    fn stop(&self) -> bool;

    /// Native pause. Engines without one return `false`.
    fn pause(&self) -> bool {
        false
    }

    fn resume(&self) -> bool {
        false
    }
}
