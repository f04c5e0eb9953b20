//! Fast scanning for positions where a match could begin.
//!
//! A prefilter never misses a match start, but it may report positions where no match begins.
//! The search runtime jumps to each candidate and lets the DFA confirm it.

use std::ops::RangeInclusive;

use memchr::{memchr, memchr2, memchr3, memmem};

use crate::{config::VectorWidth, nfa::NFA};

/// Literal prefixes are not extended past this length.
const MAX_LITERAL_LEN: usize = 64;
/// The range scanner is not worth it for byte sets larger than this.
const MAX_RANGE_SET_BYTES: usize = 160;
const MAX_RANGES: usize = 4;

#[derive(Debug, Clone)]
pub enum Prefilter {
    /// Every match begins with this literal.
    Literal(memmem::Finder<'static>),
    Byte(u8),
    Byte2(u8, u8),
    Byte3(u8, u8, u8),
    Ranges(RangeScanner),
}
impl Prefilter {
    /// Picks the cheapest scanner that covers every possible first byte of a match.
    ///
    /// ## Returns
    /// `None` if the pattern can match the empty string or if its first bytes are too varied to be worth scanning for.
    pub fn from_nfa(nfa: &NFA, width: VectorWidth) -> Option<Prefilter> {
        let (start_states, matches_empty) = closure(nfa, &[nfa.start_anchored()]);
        if matches_empty {
            return None;
        }

        let literal = literal_prefix(nfa, start_states.clone());
        if literal.len() >= 2 {
            log::debug!("using literal prefilter for {:?}", String::from_utf8_lossy(&literal));
            return Some(Prefilter::Literal(memmem::Finder::new(&literal).into_owned()));
        }

        let mut first_bytes = [false; 256];
        for state in &start_states {
            for t in nfa.states()[*state].transitions() {
                for b in t.range().clone() {
                    first_bytes[b as usize] = true;
                }
            }
        }
        let bytes: Vec<u8> = (0..=255u8).filter(|b| first_bytes[*b as usize]).collect();
        let prefilter = match bytes.as_slice() {
            [] => return None,
            [a] => Prefilter::Byte(*a),
            [a, b] => Prefilter::Byte2(*a, *b),
            [a, b, c] => Prefilter::Byte3(*a, *b, *c),
            _ => {
                if bytes.len() > MAX_RANGE_SET_BYTES {
                    return None;
                }
                let ranges = to_ranges(&bytes);
                if ranges.len() > MAX_RANGES {
                    return None;
                }
                Prefilter::Ranges(RangeScanner::new(&ranges, width))
            }
        };
        log::debug!("using prefilter {prefilter:?}");
        return Some(prefilter);
    }

    /// Finds the first candidate position at or after `pos`.
    #[inline]
    pub fn find(&self, haystack: &[u8], pos: usize) -> Option<usize> {
        let rest = haystack.get(pos..)?;
        let found = match self {
            Prefilter::Literal(finder) => finder.find(rest),
            Prefilter::Byte(a) => memchr(*a, rest),
            Prefilter::Byte2(a, b) => memchr2(*a, *b, rest),
            Prefilter::Byte3(a, b, c) => memchr3(*a, *b, *c, rest),
            Prefilter::Ranges(scanner) => return scanner.find(haystack, pos),
        };
        return found.map(|i| pos + i);
    }
}

/// The epsilon closure of `seeds`, with every assertion assumed to pass.
///
/// ## Returns
/// The states in the closure that have byte transitions, and whether the accept state is in it.
fn closure(nfa: &NFA, seeds: &[usize]) -> (Vec<usize>, bool) {
    let mut visited = vec![false; nfa.states().len()];
    let mut stack = seeds.to_vec();
    let mut out = Vec::new();
    let mut accepts = false;
    while let Some(state) = stack.pop() {
        if std::mem::replace(&mut visited[state], true) {
            continue;
        }
        if state == nfa.accept() {
            accepts = true;
        }
        if !nfa.states()[state].transitions().is_empty() {
            out.push(state);
        }
        stack.extend(nfa.states()[state].epsilons().iter().map(|e| e.to()));
    }
    return (out, accepts);
}

/// The bytes every match must begin with.
fn literal_prefix(nfa: &NFA, mut states: Vec<usize>) -> Vec<u8> {
    let mut literal = Vec::new();
    while literal.len() < MAX_LITERAL_LEN {
        let transitions: Vec<_> = states
            .iter()
            .flat_map(|state| nfa.states()[*state].transitions())
            .collect();
        let Some(first) = transitions.first() else {
            break;
        };
        let byte = *first.range().start();
        if transitions.iter().any(|t| *t.range() != (byte..=byte)) {
            break;
        }
        literal.push(byte);

        let targets: Vec<usize> = transitions.iter().map(|t| t.to()).collect();
        let (next, accepts) = closure(nfa, &targets);
        if accepts {
            break;
        }
        states = next;
    }
    return literal;
}

fn to_ranges(sorted: &[u8]) -> Vec<RangeInclusive<u8>> {
    let mut ranges: Vec<RangeInclusive<u8>> = Vec::new();
    for b in sorted {
        match ranges.last_mut() {
            Some(last) if last.end().checked_add(1) == Some(*b) => *last = *last.start()..=*b,
            _ => ranges.push(*b..=*b),
        }
    }
    return ranges;
}

/// Finds bytes in a union of up to four ranges, several bytes at a time.
#[derive(Debug, Clone)]
pub struct RangeScanner {
    /// Range starts, with unused entries repeating the first range.
    lows: [u8; MAX_RANGES],
    /// `end - start` of each range.
    spans: [u8; MAX_RANGES],
    table: [bool; 256],
    width: VectorWidth,
}
impl RangeScanner {
    /// ## Params
    /// - `ranges` must have between 1 and 4 entries
    /// - `width` is resolved against the running CPU, falling back to narrower vectors
    pub fn new(ranges: &[RangeInclusive<u8>], width: VectorWidth) -> RangeScanner {
        let mut lows = [0; MAX_RANGES];
        let mut spans = [0; MAX_RANGES];
        let mut table = [false; 256];
        for i in 0..MAX_RANGES {
            let range = ranges.get(i).or(ranges.first()).cloned().unwrap_or(0..=0);
            lows[i] = *range.start();
            spans[i] = range.end() - range.start();
        }
        for range in ranges {
            for b in range.clone() {
                table[b as usize] = true;
            }
        }
        return RangeScanner {
            lows,
            spans,
            table,
            width: resolve_width(width),
        };
    }

    /// The vector width actually in use.
    pub const fn width(&self) -> VectorWidth {
        return self.width;
    }

    pub fn find(&self, haystack: &[u8], pos: usize) -> Option<usize> {
        return match self.width {
            #[cfg(target_arch = "x86_64")]
            // SAFETY: `resolve_width` only picks AVX2 after detecting it
            VectorWidth::W256 => unsafe { x86::find_avx2(self, haystack, pos) },
            #[cfg(target_arch = "x86_64")]
            // SAFETY: SSE2 is part of the x86_64 baseline
            VectorWidth::W128 => unsafe { x86::find_sse2(self, haystack, pos) },
            _ => self.find_scalar(haystack, pos),
        };
    }

    fn find_scalar(&self, haystack: &[u8], pos: usize) -> Option<usize> {
        let rest = haystack.get(pos..)?;
        return rest
            .iter()
            .position(|b| self.table[*b as usize])
            .map(|i| pos + i);
    }
}

/// The width a scanner built with `width` actually uses on the running CPU.
pub fn resolve_width(width: VectorWidth) -> VectorWidth {
    #[cfg(target_arch = "x86_64")]
    {
        return match width {
            VectorWidth::Auto | VectorWidth::W256 => {
                if is_x86_feature_detected!("avx2") {
                    VectorWidth::W256
                } else {
                    VectorWidth::W128
                }
            }
            VectorWidth::W128 => VectorWidth::W128,
            VectorWidth::Scalar => VectorWidth::Scalar,
        };
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = width;
        return VectorWidth::Scalar;
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    use super::{RangeScanner, MAX_RANGES};

    /// A byte `b` is in `low..=low + span` exactly when `b - low` (wrapping) is at most `span`,
    /// and `x <= span` (unsigned) exactly when `min(x, span) == x`.
    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn find_sse2(
        scanner: &RangeScanner,
        haystack: &[u8],
        mut pos: usize,
    ) -> Option<usize> {
        let mut lows = [_mm_setzero_si128(); MAX_RANGES];
        let mut spans = [_mm_setzero_si128(); MAX_RANGES];
        for i in 0..MAX_RANGES {
            lows[i] = _mm_set1_epi8(scanner.lows[i] as i8);
            spans[i] = _mm_set1_epi8(scanner.spans[i] as i8);
        }
        while pos + 16 <= haystack.len() {
            let chunk = _mm_loadu_si128(haystack.as_ptr().add(pos) as *const __m128i);
            let mut hits = _mm_setzero_si128();
            for i in 0..MAX_RANGES {
                let shifted = _mm_sub_epi8(chunk, lows[i]);
                let inside = _mm_cmpeq_epi8(_mm_min_epu8(shifted, spans[i]), shifted);
                hits = _mm_or_si128(hits, inside);
            }
            let mask = _mm_movemask_epi8(hits) as u32;
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += 16;
        }
        return scanner.find_scalar(haystack, pos);
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn find_avx2(
        scanner: &RangeScanner,
        haystack: &[u8],
        mut pos: usize,
    ) -> Option<usize> {
        let mut lows = [_mm256_setzero_si256(); MAX_RANGES];
        let mut spans = [_mm256_setzero_si256(); MAX_RANGES];
        for i in 0..MAX_RANGES {
            lows[i] = _mm256_set1_epi8(scanner.lows[i] as i8);
            spans[i] = _mm256_set1_epi8(scanner.spans[i] as i8);
        }
        while pos + 32 <= haystack.len() {
            let chunk = _mm256_loadu_si256(haystack.as_ptr().add(pos) as *const __m256i);
            let mut hits = _mm256_setzero_si256();
            for i in 0..MAX_RANGES {
                let shifted = _mm256_sub_epi8(chunk, lows[i]);
                let inside = _mm256_cmpeq_epi8(_mm256_min_epu8(shifted, spans[i]), shifted);
                hits = _mm256_or_si256(hits, inside);
            }
            let mask = _mm256_movemask_epi8(hits) as u32;
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += 32;
        }
        return scanner.find_scalar(haystack, pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, nfa::Direction, parse_tree::parse};

    fn prefilter(pattern: &str) -> Option<Prefilter> {
        let config = Config::default();
        let parsed = parse(pattern, &config).unwrap();
        let nfa = NFA::new(&parsed, Direction::Forward, &config).unwrap();
        return Prefilter::from_nfa(&nfa, VectorWidth::Auto);
    }

    #[test]
    fn selection() {
        assert!(matches!(prefilter("hello"), Some(Prefilter::Literal(_))));
        assert!(matches!(prefilter("hel(?:lo|p)"), Some(Prefilter::Literal(_))));
        assert!(matches!(prefilter("(?i)hello"), Some(Prefilter::Byte2(b'H', b'h'))));
        assert!(matches!(prefilter("a+b"), Some(Prefilter::Byte(b'a'))));
        assert!(matches!(prefilter("[a-c]x"), Some(Prefilter::Byte3(b'a', b'b', b'c'))));
        assert!(matches!(prefilter("[0-9a-f]+z"), Some(Prefilter::Ranges(_))));
        assert!(prefilter("x*").is_none());
        assert!(prefilter("a|").is_none());
        assert!(prefilter(".").is_none());
        assert!(prefilter("[^a]").is_none());
    }

    #[test]
    fn literal_prefix_stops_at_branches() {
        let Some(Prefilter::Literal(finder)) = prefilter("hel(?:lo|p)") else {
            panic!("expected a literal prefilter");
        };
        assert_eq!(finder.needle(), b"hel");
        let Some(Prefilter::Literal(finder)) = prefilter("ab(?:c)?d") else {
            panic!("expected a literal prefilter");
        };
        assert_eq!(finder.needle(), b"ab");
    }

    #[test]
    fn candidates() {
        let prefilter = prefilter("hello").unwrap();
        assert_eq!(prefilter.find(b"say hello", 0), Some(4));
        assert_eq!(prefilter.find(b"say hello", 5), None);
        assert_eq!(prefilter.find(b"say", 10), None);
    }

    #[test]
    fn vector_widths_agree() {
        let ranges = [b'0'..=b'9', b'A'..=b'F', b'~'..=b'~'];
        // deterministic pseudo-random bytes with the occasional hit
        let mut seed = 0x2545_F491u32;
        let haystack: Vec<u8> = (0..1000)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                return if seed % 53 == 0 { b'7' } else { b'a' + (seed % 26) as u8 };
            })
            .collect();
        let scalar = RangeScanner::new(&ranges, VectorWidth::Scalar);
        for width in [VectorWidth::Auto, VectorWidth::W128, VectorWidth::W256] {
            let scanner = RangeScanner::new(&ranges, width);
            for pos in (0..haystack.len()).step_by(7) {
                assert_eq!(
                    scanner.find(&haystack, pos),
                    scalar.find(&haystack, pos),
                    "{width:?} at {pos}"
                );
            }
        }
        assert_eq!(scalar.find(b"xyz~", 0), Some(3));
        assert_eq!(scalar.find(b"xyz", 0), None);
    }
}
