//! Settings domain types and validation.
//!
//! Engine credentials, export location, and document defaults. All fields
//! are optional; the `effective_*` getters apply defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ports::AudioOutputFormat;

/// Locale used when neither settings nor the environment provide one.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Application directory name under the platform data directory.
const APP_DIR_NAME: &str = "speakline";

/// Speech settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpeechSettings {
    /// Cloud engine subscription key.
    pub cloud_key: Option<String>,

    /// Cloud engine service region.
    pub cloud_region: Option<String>,

    /// Directory exported audio files are written to.
    pub audio_dir: Option<PathBuf>,

    /// Cloud engine output format.
    pub output_format: Option<AudioOutputFormat>,

    /// Fallback `xml:lang` when language detection fails.
    pub default_locale: Option<String>,

    /// Log every assembled markup document at debug level.
    pub log_markup: Option<bool>,
}

/// Credentials for the cloud engine.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudCredentials {
    pub key: String,
    pub region: String,
}

impl std::fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl SpeechSettings {
    /// Load a `.env` file if present, then read `SPEAKLINE_*` variables.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an environment-style lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            cloud_key: non_empty("SPEAKLINE_CLOUD_KEY"),
            cloud_region: non_empty("SPEAKLINE_CLOUD_REGION"),
            audio_dir: non_empty("SPEAKLINE_AUDIO_DIR").map(PathBuf::from),
            output_format: None,
            default_locale: non_empty("SPEAKLINE_LOCALE"),
            log_markup: non_empty("SPEAKLINE_LOG_MARKUP")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")),
        }
    }

    /// Credentials when both key and region are set.
    #[must_use]
    pub fn cloud_credentials(&self) -> Option<CloudCredentials> {
        let key = self.cloud_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let region = self.cloud_region.as_deref().map(str::trim).filter(|r| !r.is_empty())?;
        Some(CloudCredentials {
            key: key.to_string(),
            region: region.to_string(),
        })
    }

    /// Export directory, defaulting to `<data dir>/speakline/audio`.
    #[must_use]
    pub fn effective_audio_dir(&self) -> PathBuf {
        self.audio_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR_NAME)
                .join("audio")
        })
    }

    #[must_use]
    pub fn effective_output_format(&self) -> AudioOutputFormat {
        self.output_format.unwrap_or_default()
    }

    /// Fallback locale: settings, then `LANG`, then [`DEFAULT_LOCALE`].
    #[must_use]
    pub fn effective_default_locale(&self) -> String {
        self.default_locale
            .clone()
            .or_else(|| std::env::var("LANG").ok().as_deref().and_then(locale_from_posix))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
    }

    #[must_use]
    pub fn effective_log_markup(&self) -> bool {
        self.log_markup.unwrap_or(false)
    }

    /// Merge an update into these settings, only touching fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref key) = other.cloud_key {
            self.cloud_key.clone_from(key);
        }
        if let Some(ref region) = other.cloud_region {
            self.cloud_region.clone_from(region);
        }
        if let Some(ref dir) = other.audio_dir {
            self.audio_dir.clone_from(dir);
        }
        if let Some(format) = other.output_format {
            self.output_format = format;
        }
        if let Some(ref locale) = other.default_locale {
            self.default_locale.clone_from(locale);
        }
        if let Some(log) = other.log_markup {
            self.log_markup = log;
        }
    }
}

/// `en_US.UTF-8` → `en-US`. `C` and `POSIX` carry no locale.
fn locale_from_posix(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = clear the field
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub cloud_key: Option<Option<String>>,
    pub cloud_region: Option<Option<String>>,
    pub audio_dir: Option<Option<PathBuf>>,
    pub output_format: Option<Option<AudioOutputFormat>>,
    pub default_locale: Option<Option<String>>,
    pub log_markup: Option<Option<bool>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Rate must be between -50 and 200, got {0}")]
    InvalidRate(f64),

    #[error("Pitch must be between -50 and 50, got {0}")]
    InvalidPitch(f64),

    #[error("Volume must be between 0 and 100, got {0}")]
    InvalidVolume(f64),

    #[error("Style degree must be between 0.01 and 2, got {0}")]
    InvalidStyleDegree(f64),

    #[error("Speed ratio must be between 0.8 and 2.0, got {0}")]
    InvalidSpeedRatio(f32),

    #[error("Request text is {0} bytes, the limit is 1024")]
    RequestTextTooLong(usize),

    #[error("A cloud key is set but the region is empty")]
    MissingRegion,

    #[error("Audio directory cannot be empty")]
    EmptyAudioDir,
}

/// Validate settings values.
pub fn validate_settings(settings: &SpeechSettings) -> Result<(), SettingsError> {
    let has_key = settings
        .cloud_key
        .as_ref()
        .is_some_and(|k| !k.trim().is_empty());
    let has_region = settings
        .cloud_region
        .as_ref()
        .is_some_and(|r| !r.trim().is_empty());
    if has_key && !has_region {
        return Err(SettingsError::MissingRegion);
    }

    if settings
        .audio_dir
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(SettingsError::EmptyAudioDir);
    }

    Ok(())
}
