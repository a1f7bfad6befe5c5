//! Offset corrector. Engine positions to full-text highlight ranges.
//!
//! The cloud engine reports word positions in its own coordinates, which
//! do not count the newlines joining segments nor the spaces between
//! words. The corrector walks the canonical full text and maps the n-th
//! counted character back to its real index, so the result can slice
//! [`full_text`](crate::content::full_text) directly.

use serde::{Deserialize, Serialize};

use crate::content::char_len;

/// A character range into the full text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightRange {
    pub offset: usize,
    pub length: usize,
}

impl HighlightRange {
    #[must_use]
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Which separator characters an engine leaves out of its offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCorrector {
    pub newlines_counted: bool,
    pub spaces_counted: bool,
}

impl OffsetCorrector {
    /// The cloud engine counts neither segment newlines nor spaces.
    #[must_use]
    pub const fn cloud() -> Self {
        Self {
            newlines_counted: false,
            spaces_counted: false,
        }
    }

    /// Offsets already index the full text; only clamping applies.
    #[must_use]
    pub const fn passthrough() -> Self {
        Self {
            newlines_counted: true,
            spaces_counted: true,
        }
    }

    const fn skips(&self, c: char) -> bool {
        match c {
            '\n' => !self.newlines_counted,
            ' ' => !self.spaces_counted,
            _ => false,
        }
    }

    /// Map an engine `(offset, length)` onto `full_text`.
    ///
    /// The result always satisfies `end() <= char_len(full_text)`.
    #[must_use]
    pub fn correct(&self, full_text: &str, offset: usize, length: usize) -> HighlightRange {
        let chars: Vec<char> = full_text.chars().collect();
        let total = chars.len();

        // Index of the `offset`-th counted character.
        let mut start = total;
        let mut counted = 0;
        for (i, &c) in chars.iter().enumerate() {
            if self.skips(c) {
                continue;
            }
            if counted == offset {
                start = i;
                break;
            }
            counted += 1;
        }

        // Extend over `length` counted characters, swallowing skipped ones inside.
        let mut end = start;
        let mut remaining = length;
        while remaining > 0 && end < total {
            if !self.skips(chars[end]) {
                remaining -= 1;
            }
            end += 1;
        }

        HighlightRange::new(start, end - start)
    }
}

/// Split `full_text` into the text before, inside and after `range`.
///
/// Out-of-range values are clamped.
#[must_use]
pub fn split_highlight(full_text: &str, range: HighlightRange) -> (&str, &str, &str) {
    let total = char_len(full_text);
    let start = range.offset.min(total);
    let end = range.end().min(total);

    let byte_at = |char_index: usize| {
        full_text
            .char_indices()
            .nth(char_index)
            .map_or(full_text.len(), |(byte, _)| byte)
    };
    let (start_byte, end_byte) = (byte_at(start), byte_at(end));
    (
        &full_text[..start_byte],
        &full_text[start_byte..end_byte],
        &full_text[end_byte..],
    )
}
