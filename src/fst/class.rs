use serde::{Deserialize, Serialize};

/// ASCII `0-9`.
pub const DIGIT: u8 = 1 << 0;
/// ASCII `A-Z`.
pub const UPPER: u8 = 1 << 1;
/// ASCII `a-z`.
pub const LOWER: u8 = 1 << 2;
/// Any Unicode whitespace.
pub const SPACE: u8 = 1 << 3;
/// Members of [`PUNCTUATION`].
pub const PUNCT: u8 = 1 << 4;
/// Everything else (non-ASCII letters, symbols, currency signs, ...).
pub const OTHER: u8 = 1 << 5;

const ALL: u8 = DIGIT | UPPER | LOWER | SPACE | PUNCT | OTHER;

/// Characters treated as punctuation by the tokenizer.
pub const PUNCTUATION: &[char] = &[
    '!', '"', '#', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', ':', ';', '<', '=',
    '>', '?', '@', '[', '\\', ']', '^', '_', '`', '{', '|', '}', '~', '¡', '¿', '«', '»',
    '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}', '…', '–', '—',
];

/// Map a character to exactly one of the disjoint categories.
pub fn category(ch: char) -> u8 {
    if ch.is_ascii_digit() {
        DIGIT
    } else if ch.is_ascii_uppercase() {
        UPPER
    } else if ch.is_ascii_lowercase() {
        LOWER
    } else if ch.is_whitespace() {
        SPACE
    } else if PUNCTUATION.contains(&ch) {
        PUNCT
    } else {
        OTHER
    }
}

/// A set of characters: a union of categories minus a few excluded characters.
///
/// Categories partition the character space, so intersecting two classes is
/// a mask AND plus a union of exclusions. Composition relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharClass {
    mask: u8,
    except: Vec<char>,
}

impl CharClass {
    pub fn of(mask: u8) -> Self {
        Self {
            mask: mask & ALL,
            except: Vec::new(),
        }
    }

    /// Sigma: every character.
    pub fn any() -> Self {
        Self::of(ALL)
    }

    pub fn digit() -> Self {
        Self::of(DIGIT)
    }

    pub fn upper() -> Self {
        Self::of(UPPER)
    }

    pub fn lower() -> Self {
        Self::of(LOWER)
    }

    pub fn alpha() -> Self {
        Self::of(UPPER | LOWER)
    }

    pub fn space() -> Self {
        Self::of(SPACE)
    }

    pub fn punct() -> Self {
        Self::of(PUNCT)
    }

    pub fn not_space() -> Self {
        Self::of(ALL & !SPACE)
    }

    /// Remove individual characters from the class.
    pub fn without(mut self, chars: &[char]) -> Self {
        self.except.extend_from_slice(chars);
        self.except.sort_unstable();
        self.except.dedup();
        self
    }

    pub fn contains(&self, ch: char) -> bool {
        self.mask & category(ch) != 0 && self.except.binary_search(&ch).is_err()
    }

    /// `None` when the two classes share no category.
    pub fn intersect(&self, other: &CharClass) -> Option<CharClass> {
        let mask = self.mask & other.mask;
        if mask == 0 {
            return None;
        }
        Some(Self {
            mask,
            except: Vec::new(),
        }
        .without(&self.except)
        .without(&other.except))
    }
}
