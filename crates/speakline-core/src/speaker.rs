//! Speakers. The voices a [`VoiceConfig`](crate::voice::VoiceConfig) can name.
//!
//! A speaker declares its locale, which engine can render it, and the
//! expressive styles and roles it supports. The markup assembler drops any
//! style or role a speaker does not declare.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::events::EngineKind;

/// Language family a speaker belongs to.
///
/// `System` is the local engine's pseudo-language; every other variant is
/// rendered by the cloud engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerLanguage {
    #[serde(rename = "system", alias = "系统")]
    System,
    #[serde(rename = "cn", alias = "中文")]
    Chinese,
    #[serde(rename = "jp", alias = "日语")]
    Japanese,
    #[serde(rename = "en", alias = "英语")]
    English,
    #[serde(rename = "ko", alias = "韩语")]
    Korean,
    #[serde(rename = "multi", alias = "多语言")]
    Multilingual,
}

impl SpeakerLanguage {
    /// The engine that renders speakers of this language.
    #[must_use]
    pub const fn engine(self) -> EngineKind {
        match self {
            Self::System => EngineKind::Local,
            Self::Chinese | Self::Japanese | Self::English | Self::Korean | Self::Multilingual => {
                EngineKind::Cloud
            }
        }
    }

    /// Sample sentence used to audition a speaker.
    #[must_use]
    pub fn test_phrase(self, speaker_name: &str) -> String {
        match self {
            Self::System => "你好，我是系统语音合成引擎，很高兴为你服务。".to_string(),
            Self::Chinese | Self::Multilingual => {
                format!("你好，我的名字叫{speaker_name}，很高兴为你服务。")
            }
            Self::Japanese => format!(
                "こんにちは、私の名前は{speaker_name}です。あなたのお役に立てることをうれしく思います。"
            ),
            Self::English => {
                format!("Hello, my name is {speaker_name}, and I am glad to serve you.")
            }
            Self::Korean => {
                format!("안녕하세요, 저의 이름은 {speaker_name}입니다. 당신을 도와드릴 수 있어 기쁩니다.")
            }
        }
    }
}

/// Speaker gender. Encoded as a number in catalog JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    Female = 1,
    Male = 2,
    Girl = 3,
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Female),
            2 => Ok(Self::Male),
            3 => Ok(Self::Girl),
            other => Err(format!("unknown gender code {other}")),
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender as Self
    }
}

/// A voice offered by one of the engines.
///
/// Field names on the wire match the speaker catalog JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    /// Locale, e.g. `"zh-CN"`.
    #[serde(rename = "region")]
    pub locale: String,
    pub language: SpeakerLanguage,
    /// Dialect / script description.
    pub sublanguage: String,
    pub gender: Gender,
    /// Engine voice name, e.g. `"zh-CN-XiaomoNeural"`. Identifies the speaker.
    #[serde(rename = "audioName")]
    pub voice_name: String,
    #[serde(rename = "speakerName")]
    pub display_name: String,
    #[serde(rename = "speakerIntro")]
    pub intro: String,
    /// Supported expressive styles (`&`-separated in JSON).
    #[serde(rename = "style", with = "ampersand_list")]
    pub styles: Vec<String>,
    /// Supported role-play roles (`&`-separated in JSON).
    #[serde(rename = "role", with = "ampersand_list")]
    pub roles: Vec<String>,
}

/// Voice name of the local engine's pseudo-speaker.
pub const LOCAL_ENGINE_VOICE: &str = "systemTTSEngine";

impl Speaker {
    /// Stable identifier (the engine voice name).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.voice_name
    }

    #[must_use]
    pub const fn engine(&self) -> EngineKind {
        self.language.engine()
    }

    #[must_use]
    pub fn supports_style(&self, style: &str) -> bool {
        self.styles.iter().any(|s| s == style)
    }

    #[must_use]
    pub fn supports_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether this is the local engine's pseudo-speaker.
    #[must_use]
    pub fn is_local_engine(&self) -> bool {
        self.voice_name == LOCAL_ENGINE_VOICE
    }

    /// Expressive Mandarin voice with the full role-play set.
    #[must_use]
    pub fn xiaomo() -> Self {
        Self {
            locale: "zh-CN".to_string(),
            language: SpeakerLanguage::Chinese,
            sublanguage: "Mandarin, Simplified".to_string(),
            gender: Gender::Female,
            voice_name: "zh-CN-XiaomoNeural".to_string(),
            display_name: "Xiaomo".to_string(),
            intro: "Clear, relaxed voice with rich role-play and emotion, suited to audiobooks."
                .to_string(),
            styles: split_list(
                "affectionate&angry&calm&cheerful&depressed&disgruntled&embarrassed&envious&fearful&gentle&sad&serious",
            ),
            roles: split_list(
                "Boy&Girl&OlderAdultFemale&OlderAdultMale&SeniorFemale&SeniorMale&YoungAdultFemale&YoungAdultMale",
            ),
        }
    }

    /// Lively Mandarin voice with many scenario styles and no roles.
    #[must_use]
    pub fn xiaoxiao() -> Self {
        Self {
            locale: "zh-CN".to_string(),
            language: SpeakerLanguage::Chinese,
            sublanguage: "Mandarin, Simplified".to_string(),
            gender: Gender::Female,
            voice_name: "zh-CN-XiaoxiaoNeural".to_string(),
            display_name: "Xiaoxiao".to_string(),
            intro: "Lively, warm voice with many scenario styles and emotions.".to_string(),
            styles: split_list(
                "affectionate&angry&assistant&calm&chat&cheerful&customerservice&disgruntled&fearful&friendly&gentle&lyrical&newscast&poetry-reading&sad&serious",
            ),
            roles: Vec::new(),
        }
    }

    /// The local (offline) engine, modelled as a speaker so it can be
    /// selected like any other voice.
    #[must_use]
    pub fn local_engine() -> Self {
        Self {
            locale: "zh-CN".to_string(),
            language: SpeakerLanguage::System,
            sublanguage: String::new(),
            gender: Gender::Female,
            voice_name: LOCAL_ENGINE_VOICE.to_string(),
            display_name: "System engine".to_string(),
            intro: "On-device synthesis: lower quality, no network required.".to_string(),
            styles: Vec::new(),
            roles: Vec::new(),
        }
    }
}

impl PartialEq for Speaker {
    fn eq(&self, other: &Self) -> bool {
        self.voice_name == other.voice_name
    }
}

impl Eq for Speaker {}

fn split_list(raw: &str) -> Vec<String> {
    raw.split('&')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"a&b&c"` on the wire, `Vec<String>` in memory.
mod ampersand_list {
    use super::{Deserialize, Deserializer, Serializer, split_list};

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&items.join("&"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(split_list(&raw))
    }
}
