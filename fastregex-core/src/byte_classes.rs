//! Alphabet compression for the DFAs.
//!
//! Bytes that no transition of the NFA can tell apart are put in the same class,
//! so a DFA row needs one entry per class instead of one per byte.

use std::ops::RangeInclusive;

use crate::{look::is_word_byte, nfa::NFA};

/// A partition of `0..=255` into contiguous runs of equivalent bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteClasses {
    classes: [u8; 256],
    alphabet_len: usize,
}
impl ByteClasses {
    /// Every byte in its own class.
    #[cfg(test)]
    pub fn singletons() -> ByteClasses {
        let mut classes = [0; 256];
        for (b, class) in classes.iter_mut().enumerate() {
            *class = b as u8;
        }
        return ByteClasses {
            classes,
            alphabet_len: 256,
        };
    }

    pub fn from_nfa(nfa: &NFA) -> ByteClasses {
        // `split_after[b]` means `b` and `b + 1` are in different classes
        let mut split_after = [false; 256];
        fn split(split_after: &mut [bool; 256], range: &RangeInclusive<u8>) {
            if let Some(before) = range.start().checked_sub(1) {
                split_after[before as usize] = true;
            }
            split_after[*range.end() as usize] = true;
        }
        for state in nfa.states() {
            for t in state.transitions() {
                split(&mut split_after, t.range());
            }
        }
        if nfa.looks().has_word_boundary() {
            for b in 0..255u8 {
                if is_word_byte(b) != is_word_byte(b + 1) {
                    split_after[b as usize] = true;
                }
            }
        }
        if nfa.looks().has_line_anchor() {
            split(&mut split_after, &(b'\n'..=b'\n'));
        }

        let mut classes = [0; 256];
        let mut class = 0u8;
        for b in 0..256 {
            classes[b] = class;
            if split_after[b] && b != 255 {
                class += 1;
            }
        }
        return ByteClasses {
            classes,
            alphabet_len: class as usize + 1,
        };
    }

    #[inline(always)]
    pub fn get(&self, b: u8) -> u8 {
        return self.classes[b as usize];
    }

    /// The number of classes.
    pub const fn alphabet_len(&self) -> usize {
        return self.alphabet_len;
    }

    /// The bytes in `class`, which are always contiguous.
    pub fn range(&self, class: u8) -> RangeInclusive<u8> {
        let start = self.classes.partition_point(|c| *c < class);
        let end = self.classes.partition_point(|c| *c <= class) - 1;
        return start as u8..=end as u8;
    }

    /// The lowest byte of each class, in class order.
    pub fn representatives(&self) -> impl Iterator<Item = u8> + '_ {
        return (0..=255u8).filter(|b| *b == 0 || self.get(*b) != self.get(*b - 1));
    }
}
impl std::fmt::Display for ByteClasses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for class in 0..self.alphabet_len {
            writeln!(f, "{class}: {}", DisplayRange(self.range(class as u8)))?;
        }
        return Ok(());
    }
}

/// Newtype for displaying bytes as characters.
/// - Printable ascii characters are printed as themselves (or their escaped versions)
/// - Other characters are printed as their hex value
pub(crate) struct DisplayByteChar(pub u8);
impl std::fmt::Display for DisplayByteChar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return match self.0 {
            b if b.is_ascii_graphic() => write!(f, "{:?}", b as char),
            b'\t' => write!(f, "'\\t'"),
            b'\n' => write!(f, "'\\n'"),
            b'\r' => write!(f, "'\\r'"),
            b' ' => write!(f, "' '"),
            _ => write!(f, "0x{:02x}", self.0),
        };
    }
}

/// Newtype for displaying a byte range.
/// See [`DisplayByteChar`] for details.
pub(crate) struct DisplayRange(pub RangeInclusive<u8>);
impl std::fmt::Display for DisplayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = self.0.start();
        let end = self.0.end();
        if start == end {
            return write!(f, "{}", DisplayByteChar(*start));
        }
        return write!(f, "{}..={}", DisplayByteChar(*start), DisplayByteChar(*end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, nfa::Direction, parse_tree::parse};

    fn classes(pattern: &str) -> ByteClasses {
        let config = Config::default();
        let parsed = parse(pattern, &config).unwrap();
        let nfa = NFA::new(&parsed, Direction::Forward, &config).unwrap();
        return ByteClasses::from_nfa(&nfa);
    }

    #[test]
    fn literal_ranges() {
        let classes = classes("[a-c]x");
        // the any-byte loop of the unanchored start adds no boundaries
        assert_eq!(classes.alphabet_len(), 5);
        assert_eq!(classes.get(b'a'), classes.get(b'c'));
        assert_ne!(classes.get(b'c'), classes.get(b'd'));
        assert_ne!(classes.get(b'x'), classes.get(b'w'));
        assert_eq!(classes.get(b'\0'), classes.get(b'`'));
        assert_eq!(classes.range(classes.get(b'b')), b'a'..=b'c');
        assert_eq!(
            classes.representatives().collect::<Vec<_>>(),
            vec![0, b'a', b'd', b'x', b'y']
        );
    }

    #[test]
    fn look_splits() {
        let classes = classes(r"\b");
        assert_ne!(classes.get(b'a'), classes.get(b' '));
        assert_eq!(classes.get(b'a'), classes.get(b'z'));
        assert_eq!(classes.get(b'\n'), classes.get(b'\t'));
        assert_eq!(classes.alphabet_len(), 9);

        let classes = classes_with_multiline("^");
        assert_ne!(classes.get(b'\n'), classes.get(b'\x0B'));
        assert_eq!(classes.alphabet_len(), 3);
    }

    fn classes_with_multiline(pattern: &str) -> ByteClasses {
        let config = Config::builder().multiline(true).build();
        let parsed = parse(pattern, &config).unwrap();
        let nfa = NFA::new(&parsed, Direction::Forward, &config).unwrap();
        return ByteClasses::from_nfa(&nfa);
    }

    #[test]
    fn singletons() {
        let classes = ByteClasses::singletons();
        assert_eq!(classes.alphabet_len(), 256);
        assert_eq!(classes.range(7), 7..=7);
    }
}
