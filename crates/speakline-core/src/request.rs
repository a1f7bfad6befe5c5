//! Cloud request document handed to the external cloud client.
//!
//! The core only fills in `text`; everything else carries the service's
//! defaults until the client overrides it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::SettingsError;

/// Default business cluster.
pub const DEFAULT_CLUSTER: &str = "volcano_tts";
/// Allowed speed ratio range.
pub const SPEED_RATIO_RANGE: (f32, f32) = (0.8, 2.0);
/// Upper bound on UTF-8 bytes of `request.text`.
pub const MAX_TEXT_BYTES: usize = 1024;

/// Audio encodings the service accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    Wav,
    Pcm,
    OggOpus,
    #[default]
    Mp3,
}

/// `query` is one-shot, `submit` streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOperation {
    #[default]
    Query,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    pub appid: String,
    pub token: String,
    pub cluster: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSection {
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSection {
    pub voice_type: String,
    pub encoding: AudioEncoding,
    pub speed_ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSection {
    pub reqid: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_type: Option<String>,
    /// `1` asks for timestamps against the original text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_timestamp: Option<u8>,
    pub operation: RequestOperation,
}

/// The full JSON body for one cloud synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudRequestDocument {
    pub app: AppSection,
    pub user: UserSection,
    pub audio: AudioSection,
    pub request: RequestSection,
}

impl CloudRequestDocument {
    /// Request with service defaults and fresh `uid` / `reqid`.
    pub fn new(
        appid: impl Into<String>,
        token: impl Into<String>,
        voice_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            app: AppSection {
                appid: appid.into(),
                token: token.into(),
                cluster: DEFAULT_CLUSTER.to_string(),
            },
            user: UserSection {
                uid: Uuid::new_v4().to_string(),
            },
            audio: AudioSection {
                voice_type: voice_type.into(),
                encoding: AudioEncoding::default(),
                speed_ratio: 1.0,
            },
            request: RequestSection {
                reqid: Uuid::new_v4().to_string(),
                text: text.into(),
                text_type: None,
                with_timestamp: None,
                operation: RequestOperation::default(),
            },
        }
    }

    /// Mark `text` as markup.
    #[must_use]
    pub fn markup(mut self) -> Self {
        self.request.text_type = Some("ssml".to_string());
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.request.with_timestamp = Some(1);
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.audio.encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_speed_ratio(mut self, speed_ratio: f32) -> Self {
        self.audio.speed_ratio = speed_ratio;
        self
    }

    #[must_use]
    pub fn streaming(mut self) -> Self {
        self.request.operation = RequestOperation::Submit;
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let ratio = self.audio.speed_ratio;
        if !(SPEED_RATIO_RANGE.0..=SPEED_RATIO_RANGE.1).contains(&ratio) {
            return Err(SettingsError::InvalidSpeedRatio(ratio));
        }
        if self.request.text.len() > MAX_TEXT_BYTES {
            return Err(SettingsError::RequestTextTooLong(self.request.text.len()));
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
