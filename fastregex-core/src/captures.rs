//! Match results handed back to the caller.

use std::{ops::Range, sync::Arc};

/// The span of one match (or one capture group) in a haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match<'h> {
    haystack: &'h [u8],
    start: usize,
    end: usize,
}
impl<'h> Match<'h> {
    pub(crate) const fn new(haystack: &'h [u8], start: usize, end: usize) -> Match<'h> {
        return Match {
            haystack,
            start,
            end,
        };
    }
    pub const fn start(&self) -> usize {
        return self.start;
    }
    pub const fn end(&self) -> usize {
        return self.end;
    }
    pub const fn range(&self) -> Range<usize> {
        return self.start..self.end;
    }
    pub const fn len(&self) -> usize {
        return self.end - self.start;
    }
    pub const fn is_empty(&self) -> bool {
        return self.start == self.end;
    }
    pub fn as_bytes(&self) -> &'h [u8] {
        return &self.haystack[self.start..self.end];
    }
    /// The matched text, if it is valid UTF-8.
    /// Searching a `&str` from an offset inside a character can produce spans that are not.
    pub fn as_str(&self) -> Option<&'h str> {
        return std::str::from_utf8(self.as_bytes()).ok();
    }
}

/// The spans of every capture group of one match.
///
/// Group `0` is the whole match and is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures<'h> {
    haystack: &'h [u8],
    /// `2 * len()` entries, `slots[2 * i]..slots[2 * i + 1]` being group `i`.
    slots: Vec<Option<usize>>,
    names: Arc<[Option<String>]>,
}
impl<'h> Captures<'h> {
    pub(crate) fn new(
        haystack: &'h [u8],
        slots: Vec<Option<usize>>,
        names: Arc<[Option<String>]>,
    ) -> Captures<'h> {
        return Captures {
            haystack,
            slots,
            names,
        };
    }

    /// The number of groups, including group `0`.
    pub fn len(&self) -> usize {
        return self.slots.len() / 2;
    }
    /// Always false: there is at least group `0`.
    pub fn is_empty(&self) -> bool {
        return self.slots.is_empty();
    }

    /// The span of group `index`, or `None` if it did not participate in the match.
    pub fn get(&self, index: usize) -> Option<Match<'h>> {
        let start = (*self.slots.get(2 * index)?)?;
        let end = (*self.slots.get(2 * index + 1)?)?;
        return Some(Match::new(self.haystack, start, end));
    }

    /// The span of the group named `name`.
    pub fn name(&self, name: &str) -> Option<Match<'h>> {
        let index = self
            .names
            .iter()
            .position(|group| group.as_deref() == Some(name))?;
        return self.get(index);
    }

    /// The whole match.
    pub fn get_match(&self) -> Match<'h> {
        let start = self.slots.first().copied().flatten().unwrap_or(0);
        let end = self.slots.get(1).copied().flatten().unwrap_or(start);
        return Match::new(self.haystack, start, end);
    }

    /// Every group in order, `None` for those that did not participate.
    pub fn iter(&self) -> impl Iterator<Item = Option<Match<'h>>> + '_ {
        return (0..self.len()).map(|index| self.get(index));
    }

    /// Group spans as `(start, end)` byte offsets.
    pub fn spans(&self) -> Vec<Option<(usize, usize)>> {
        return self
            .iter()
            .map(|group| group.map(|m| (m.start(), m.end())))
            .collect();
    }
}
