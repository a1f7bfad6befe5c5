//! Speaker catalog. The voices an application offers, grouped by language.

use serde::{Deserialize, Serialize};

use crate::events::EngineKind;
use crate::speaker::{Speaker, SpeakerLanguage};
use crate::voice::VoiceConfig;

/// All speakers of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerGroup {
    pub language: SpeakerLanguage,
    pub speakers: Vec<Speaker>,
}

/// Speaker lookup over a list of [`SpeakerGroup`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerCatalog {
    groups: Vec<SpeakerGroup>,
}

impl SpeakerCatalog {
    #[must_use]
    pub const fn new(groups: Vec<SpeakerGroup>) -> Self {
        Self { groups }
    }

    /// Parse a catalog from `[{"language": …, "speakers": […]}, …]`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let groups: Vec<SpeakerGroup> = serde_json::from_str(json)?;
        tracing::debug!(
            groups = groups.len(),
            speakers = groups.iter().map(|g| g.speakers.len()).sum::<usize>(),
            "Loaded speaker catalog"
        );
        Ok(Self { groups })
    }

    /// The built-in voices: the local engine and two Mandarin voices.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            SpeakerGroup {
                language: SpeakerLanguage::System,
                speakers: vec![Speaker::local_engine()],
            },
            SpeakerGroup {
                language: SpeakerLanguage::Chinese,
                speakers: vec![Speaker::xiaomo(), Speaker::xiaoxiao()],
            },
        ])
    }

    #[must_use]
    pub fn groups(&self) -> &[SpeakerGroup] {
        &self.groups
    }

    pub fn speakers(&self) -> impl Iterator<Item = &Speaker> {
        self.groups.iter().flat_map(|g| g.speakers.iter())
    }

    /// Find a speaker by voice name.
    #[must_use]
    pub fn find(&self, voice_name: &str) -> Option<&Speaker> {
        self.speakers().find(|s| s.voice_name == voice_name)
    }

    /// Groups served by the cloud engine.
    pub fn cloud_groups(&self) -> impl Iterator<Item = &SpeakerGroup> {
        self.groups
            .iter()
            .filter(|g| g.language.engine() == EngineKind::Cloud)
    }

    /// Default voice for `voice_name`, falling back to the local engine.
    #[must_use]
    pub fn config_for(&self, voice_name: &str) -> VoiceConfig {
        self.find(voice_name).map_or_else(
            || {
                tracing::debug!(voice_name, "Unknown voice, using the local engine");
                VoiceConfig::for_speaker(Speaker::local_engine())
            },
            |speaker| VoiceConfig::for_speaker(speaker.clone()),
        )
    }
}
