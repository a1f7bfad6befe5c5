//! Voice configuration. Speaker plus prosody and expression knobs.

use serde::{Deserialize, Serialize};

use crate::settings::SettingsError;
use crate::speaker::Speaker;

/// Valid rate adjustment range, in percent of the engine's normal rate.
pub const RATE_RANGE: (f64, f64) = (-50.0, 200.0);
/// Valid pitch adjustment range, in percent.
pub const PITCH_RANGE: (f64, f64) = (-50.0, 50.0);
/// Valid volume range.
pub const VOLUME_RANGE: (f64, f64) = (0.0, 100.0);
/// Valid style intensity range.
pub const STYLE_DEGREE_RANGE: (f64, f64) = (0.01, 2.0);

/// The "no selection" marker a UI may store for role and style.
const NONE_MARKER: &str = "none";

/// How a text segment should be voiced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub speaker: Speaker,
    /// Role-play role; only emitted when the speaker supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expressive style; only emitted when the speaker supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub style_degree: f64,
    /// Rate adjustment in percent, `0` is the engine default.
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            speaker: Speaker::xiaomo(),
            role: None,
            style: None,
            style_degree: 1.0,
            rate: 0.0,
            pitch: 0.0,
            volume: 100.0,
        }
    }
}

impl VoiceConfig {
    #[must_use]
    pub fn for_speaker(speaker: Speaker) -> Self {
        Self {
            speaker,
            ..Self::default()
        }
    }

    /// Set the rate, clamped into [`RATE_RANGE`].
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate.clamp(RATE_RANGE.0, RATE_RANGE.1);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Switch speaker, dropping a style or role the new speaker lacks.
    pub fn set_speaker(&mut self, speaker: Speaker) {
        self.speaker = speaker;
        if self.effective_style().is_none() {
            self.style = None;
        }
        if self.effective_role().is_none() {
            self.role = None;
        }
    }

    /// Role to emit, if set and supported by the speaker.
    #[must_use]
    pub fn effective_role(&self) -> Option<&str> {
        self.role
            .as_deref()
            .filter(|role| *role != NONE_MARKER && self.speaker.supports_role(role))
    }

    /// Style to emit, if set and supported by the speaker.
    #[must_use]
    pub fn effective_style(&self) -> Option<&str> {
        self.style
            .as_deref()
            .filter(|style| *style != NONE_MARKER && self.speaker.supports_style(style))
    }

    /// Rate as a normalized speed for the local engine, in `0.0..=1.0`.
    ///
    /// Rate `0` maps to `0.55`, `200` to `1.0` and `-50` to `0.0`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn local_speed(&self) -> f32 {
        let rate = self.rate.clamp(RATE_RANGE.0, RATE_RANGE.1);
        let speed = if rate > 0.0 {
            1.0 - (200.0 - rate) / 200.0 * 0.45
        } else {
            (rate + 50.0) / 50.0 * 0.55
        };
        speed as f32
    }

    /// Check every numeric knob against its range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !in_range(self.rate, RATE_RANGE) {
            return Err(SettingsError::InvalidRate(self.rate));
        }
        if !in_range(self.pitch, PITCH_RANGE) {
            return Err(SettingsError::InvalidPitch(self.pitch));
        }
        if !in_range(self.volume, VOLUME_RANGE) {
            return Err(SettingsError::InvalidVolume(self.volume));
        }
        if !in_range(self.style_degree, STYLE_DEGREE_RANGE) {
            return Err(SettingsError::InvalidStyleDegree(self.style_degree));
        }
        Ok(())
    }
}

fn in_range(value: f64, (min, max): (f64, f64)) -> bool {
    value.is_finite() && (min..=max).contains(&value)
}

// ── Rate presets ───────────────────────────────────────────────────

/// Named rate presets offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLevel {
    Slow,
    Normal,
    Fast,
    SuperFast,
}

impl RateLevel {
    /// The rate this preset sets.
    #[must_use]
    pub const fn rate(self) -> f64 {
        match self {
            Self::Slow => -25.0,
            Self::Normal => 0.0,
            Self::Fast => 30.0,
            Self::SuperFast => 60.0,
        }
    }

    /// The preset a raw rate falls under.
    #[must_use]
    pub fn level(rate: f64) -> Self {
        if rate < 0.0 {
            Self::Slow
        } else if rate < 10.0 {
            Self::Normal
        } else if rate < 40.0 {
            Self::Fast
        } else {
            Self::SuperFast
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::SuperFast => "Super fast",
        }
    }
}
