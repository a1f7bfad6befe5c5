//! Port definitions (trait abstractions) for the external speech engines.
//!
//! Ports describe what the engine adapters need from the outside world:
//! a cloud synthesis client, a local utterance synthesizer, and a usage
//! ledger. They use only domain types; SDK handles and callback
//! registration stay on the implementation side.
//!
//! # Design Rules
//!
//! - Native callbacks surface as channels of port-level events
//! - No SDK error types in any signature
//! - Ports are `Send + Sync` so adapters can hold them behind `Arc`

pub mod cloud;
pub mod local;
pub mod usage;

pub use cloud::{
    AudioOutputFormat, CloudAudioTarget, CloudClientError, CloudClientEvent, CloudSpeechClient,
    CloudSpeechRequest,
};
pub use local::{LocalSynthEvent, LocalSynthesizer, Utterance};
pub use usage::{InMemoryUsageLedger, UsageLedger};
