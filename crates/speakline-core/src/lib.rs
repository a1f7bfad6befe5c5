#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod catalog;
pub mod content;
pub mod error;
pub mod events;
pub mod language;
pub mod markup;
pub mod offset;
pub mod ports;
pub mod request;
pub mod settings;
pub mod speaker;
pub mod voice;

// Re-export commonly used types for convenience
pub use catalog::{SpeakerCatalog, SpeakerGroup};
pub use content::{PauseLevel, Segment, SegmentKind, full_text, merge_pauses};
pub use error::{FailureKind, PlaybackFailure, SpeechError};
pub use events::{EngineEvent, EngineEvents, EngineKind, EventSender, WordBoundary, event_channel};
pub use language::{LanguageDetector, WhatlangDetector, resolve_language_tag};
pub use markup::{SpeechDocument, assemble_markup, build_speech_document, escape_xml};
pub use offset::{HighlightRange, OffsetCorrector, split_highlight};
pub use ports::{
    AudioOutputFormat, CloudAudioTarget, CloudClientError, CloudClientEvent, CloudSpeechClient,
    CloudSpeechRequest, InMemoryUsageLedger, LocalSynthEvent, LocalSynthesizer, UsageLedger,
    Utterance,
};
pub use request::{AudioEncoding, CloudRequestDocument, RequestOperation};
pub use settings::{CloudCredentials, SettingsError, SettingsUpdate, SpeechSettings, validate_settings};
pub use speaker::{Gender, Speaker, SpeakerLanguage};
pub use voice::{RateLevel, VoiceConfig};

