//! Zero-width assertions.
//!
//! Every assertion can be decided from two facts about a position: what came before it
//! (summarized as a [`Context`]) and the byte directly after it (`None` at the end of input).
//! This is what lets the DFA resolve them with a single byte of delay.

use crate::parse_tree::AnchorKind;

/// Whether `b` is an ASCII word byte (`[0-9A-Za-z_]`), as used by `\b` and `\B`.
#[inline]
pub const fn is_word_byte(b: u8) -> bool {
    return b.is_ascii_alphanumeric() || b == b'_';
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Look {
    StartText,
    EndText,
    StartLine,
    EndLine,
    WordBoundary,
    NotWordBoundary,
}
impl Look {
    pub const fn from_anchor(anchor: AnchorKind) -> Look {
        return match anchor {
            AnchorKind::StartText => Look::StartText,
            AnchorKind::EndText => Look::EndText,
            AnchorKind::StartLine => Look::StartLine,
            AnchorKind::EndLine => Look::EndLine,
            AnchorKind::WordBoundary => Look::WordBoundary,
            AnchorKind::NotWordBoundary => Look::NotWordBoundary,
        };
    }

    /// The equivalent assertion when the haystack is read backwards.
    pub const fn reversed(self) -> Look {
        return match self {
            Look::StartText => Look::EndText,
            Look::EndText => Look::StartText,
            Look::StartLine => Look::EndLine,
            Look::EndLine => Look::StartLine,
            Look::WordBoundary => Look::WordBoundary,
            Look::NotWordBoundary => Look::NotWordBoundary,
        };
    }

    /// Tests the assertion at a position preceded by `prev` and followed by `next`.
    pub fn matches(self, prev: Context, next: Option<u8>) -> bool {
        return match self {
            Look::StartText => prev == Context::Text,
            Look::EndText => next.is_none(),
            Look::StartLine => matches!(prev, Context::Text | Context::Line),
            Look::EndLine => matches!(next, None | Some(b'\n')),
            Look::WordBoundary => (prev == Context::Word) != next.is_some_and(is_word_byte),
            Look::NotWordBoundary => (prev == Context::Word) == next.is_some_and(is_word_byte),
        };
    }

    /// Tests the assertion at `pos` in a haystack read forwards.
    pub fn matches_at(self, haystack: &[u8], pos: usize) -> bool {
        return self.matches(Context::before(haystack, pos), haystack.get(pos).copied());
    }

    const fn bit(self) -> u8 {
        return 1 << (self as u8);
    }
}

/// What precedes a position, reduced to the distinctions any [`Look`] can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Context {
    /// The start of the searched text.
    Text,
    /// Directly after `\n`.
    Line,
    /// Directly after a word byte.
    Word,
    /// Directly after any other byte.
    NonWord,
}
impl Context {
    pub const ALL: [Context; 4] = [Context::Text, Context::Line, Context::Word, Context::NonWord];

    #[inline]
    pub const fn of_byte(b: u8) -> Context {
        if b == b'\n' {
            return Context::Line;
        } else if is_word_byte(b) {
            return Context::Word;
        } else {
            return Context::NonWord;
        }
    }

    /// The context of position `pos` when reading `haystack` forwards.
    #[inline]
    pub fn before(haystack: &[u8], pos: usize) -> Context {
        return match pos.checked_sub(1) {
            Some(prev) => Context::of_byte(haystack[prev]),
            None => Context::Text,
        };
    }

    /// The context of position `pos` when reading `haystack` backwards,
    /// so the "previous" byte is the one at `pos`.
    #[inline]
    pub fn before_reversed(haystack: &[u8], pos: usize) -> Context {
        return match haystack.get(pos) {
            Some(b) => Context::of_byte(*b),
            None => Context::Text,
        };
    }

    /// Collapses contexts that no assertion in `looks` can tell apart,
    /// so that DFA states differing only in indistinguishable contexts are merged.
    pub fn normalize(self, looks: LookSet) -> Context {
        let signature = |context: Context| {
            return (
                looks.contains(Look::StartText) && context == Context::Text,
                looks.contains(Look::StartLine) && matches!(context, Context::Text | Context::Line),
                looks.has_word_boundary() && context == Context::Word,
            );
        };
        let target = signature(self);
        return Context::ALL
            .into_iter()
            .find(|context| signature(*context) == target)
            .unwrap_or(self);
    }
}

/// A set of [`Look`]s, used to record which assertions a pattern contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LookSet(u8);
impl LookSet {
    pub const fn empty() -> LookSet {
        return LookSet(0);
    }
    pub fn insert(&mut self, look: Look) {
        self.0 |= look.bit();
    }
    pub const fn contains(self, look: Look) -> bool {
        return self.0 & look.bit() != 0;
    }
    pub const fn is_empty(self) -> bool {
        return self.0 == 0;
    }
    pub const fn has_word_boundary(self) -> bool {
        return self.contains(Look::WordBoundary) || self.contains(Look::NotWordBoundary);
    }
    pub const fn has_line_anchor(self) -> bool {
        return self.contains(Look::StartLine) || self.contains(Look::EndLine);
    }
}
