//! Markup assembler. Segments to one synthesis-markup document.
//!
//! Each text segment becomes a nested fragment:
//!
//! ```text
//! <voice name="…"><prosody rate="N%">[<mstts:express-as …>]text[</mstts:express-as>]</prosody></voice>
//! ```
//!
//! and the fragments are wrapped in a `<speak>` envelope. The `mstts`
//! namespace is declared only when at least one fragment uses
//! `express-as`; some parsers reject undeclared or unused prefixes.

use std::fmt::Write as _;

use crate::content::{Segment, SegmentKind, full_text, merge_pauses};
use crate::language::{LanguageDetector, resolve_language_tag};
use crate::voice::VoiceConfig;

/// Base synthesis markup namespace.
pub const SYNTHESIS_NAMESPACE: &str = "http://www.w3.org/2001/10/synthesis";
/// Namespace of the expressive-performance extension.
pub const EXPRESSIVE_NAMESPACE: &str = "https://www.w3.org/2001/mstts";

/// An assembled markup document, ready for the cloud engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechDocument {
    pub markup: String,
    /// Value of the envelope's `xml:lang`.
    pub language: String,
    /// Whether any fragment carries an `express-as` tag.
    pub expressive: bool,
}

impl SpeechDocument {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.markup
    }
}

/// Escape the five XML special characters.
#[must_use]
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Assemble a document from an already merged segment list.
///
/// `merged` must be the output of [`merge_pauses`]: text is emitted
/// verbatim, so it may carry `<break/>` directives and must already be
/// escaped. A pause that slipped through is rendered as a bare directive.
#[must_use]
pub fn assemble_markup(merged: &[Segment], default: &VoiceConfig, language: &str) -> SpeechDocument {
    let mut body = String::new();
    let mut expressive = false;

    for segment in merged {
        if let SegmentKind::Pause(level) = segment.kind {
            body.push_str(&level.directive());
            continue;
        }
        let voice = segment.effective_voice(default);
        expressive |= write_fragment(&mut body, voice, &segment.text);
    }

    let mut markup = String::with_capacity(body.len() + 160);
    let _ = write!(markup, r#"<speak version="1.0" xmlns="{SYNTHESIS_NAMESPACE}""#);
    if expressive {
        let _ = write!(markup, r#" xmlns:mstts="{EXPRESSIVE_NAMESPACE}""#);
    }
    let _ = write!(markup, r#" xml:lang="{}">"#, escape_xml(language));
    markup.push_str(&body);
    markup.push_str("</speak>");

    SpeechDocument {
        markup,
        language: language.to_string(),
        expressive,
    }
}

/// Write one voice fragment. Returns whether it opened `express-as`.
fn write_fragment(out: &mut String, voice: &VoiceConfig, text: &str) -> bool {
    let _ = write!(
        out,
        r#"<voice name="{}"><prosody rate="{}%">"#,
        escape_xml(&voice.speaker.voice_name),
        voice.rate
    );

    let expression = match (voice.effective_role(), voice.effective_style()) {
        (Some(role), Some(style)) => Some(format!(
            r#"<mstts:express-as role="{}" style="{}">"#,
            escape_xml(role),
            escape_xml(style)
        )),
        (Some(role), None) => Some(format!(r#"<mstts:express-as role="{}">"#, escape_xml(role))),
        (None, Some(style)) => Some(format!(r#"<mstts:express-as style="{}">"#, escape_xml(style))),
        (None, None) => None,
    };

    let expressive = expression.is_some();
    if let Some(open) = expression {
        out.push_str(&open);
    }
    out.push_str(text);
    if expressive {
        out.push_str("</mstts:express-as>");
    }
    out.push_str("</prosody></voice>");
    expressive
}

/// Build the full document for a raw segment list.
///
/// Escapes text, folds pauses into the preceding text, resolves the
/// language from the unescaped full text, then assembles.
pub fn build_speech_document(
    segments: &[Segment],
    default: &VoiceConfig,
    detector: &dyn LanguageDetector,
    fallback_language: &str,
) -> SpeechDocument {
    let language = resolve_language_tag(detector, &full_text(segments), fallback_language);

    let escaped: Vec<Segment> = segments
        .iter()
        .map(|segment| {
            let mut segment = segment.clone();
            if !segment.is_pause() {
                segment.text = escape_xml(&segment.text);
            }
            segment
        })
        .collect();

    let document = assemble_markup(&merge_pauses(&escaped), default, &language);
    tracing::debug!(
        language = %document.language,
        expressive = document.expressive,
        chars = document.markup.len(),
        "Assembled speech document"
    );
    document
}
