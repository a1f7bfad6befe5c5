//! Language detection for the markup document's `xml:lang`.

/// Canonical locale for every Chinese-family detection result.
pub const CHINESE_LOCALE: &str = "zh-CN";

/// Detects the dominant language of a text.
///
/// Returns a BCP-47 style code (`"en"`, `"zh-Hans"`, `"ja"`, …) or `None`
/// when the text gives no usable signal.
#[cfg_attr(test, mockall::automock)]
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<String>;
}

/// [`LanguageDetector`] backed by the `whatlang` trigram models.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        Some(short_code(info.lang().code()).to_string())
    }
}

/// ISO 639-1 code for an ISO 639-3 code, or the 639-3 code itself when
/// no two-letter code exists.
#[must_use]
pub fn short_code(iso639_3: &str) -> &str {
    match iso639_3 {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        other => other,
    }
}

/// Always reports the same answer. Pins the document language.
#[derive(Debug, Clone, Default)]
pub struct FixedLanguage(pub Option<String>);

impl FixedLanguage {
    pub fn new(code: impl Into<String>) -> Self {
        Self(Some(code.into()))
    }
}

impl LanguageDetector for FixedLanguage {
    fn detect(&self, _text: &str) -> Option<String> {
        self.0.clone()
    }
}

/// Language tag for `text`.
///
/// Any Chinese-family code collapses to [`CHINESE_LOCALE`]; a failed
/// detection falls back to `fallback`.
pub fn resolve_language_tag(detector: &dyn LanguageDetector, text: &str, fallback: &str) -> String {
    match detector.detect(text) {
        Some(code) if code.starts_with("zh") => CHINESE_LOCALE.to_string(),
        Some(code) if !code.is_empty() => code,
        _ => fallback.to_string(),
    }
}
