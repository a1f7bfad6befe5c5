#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod controller;
pub mod engine;
pub mod export;
pub mod session;
pub mod store;

// Only the integration tests use these.
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tracing_subscriber as _;

// Re-export key types for convenience
pub use controller::{ControllerEvent, PlayOutcome, PlaybackController};
pub use engine::{CloudEngine, LocalEngine, SpeechEngine, StartOutcome};
pub use export::AudioExporter;
pub use session::{PlayStatus, PlaybackSession, PlaybackSnapshot, PlaybackState};
pub use store::AudioFileStore;
