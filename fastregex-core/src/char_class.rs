//! Sets of Unicode scalar values: bracket expressions, Perl classes (`\d`, `\w`, `\s`),
//! POSIX classes (`[:alpha:]`) and the `\p{..}` script table.

use std::{
    fmt::{Display, Write},
    ops::RangeInclusive,
};

/// A set of chars, as written in the pattern.
///
/// Equality is structural. Use [`ClassSet::to_ranges`] for semantic comparison:
/// ```
/// use fastregex_core::char_class::ClassSet;
/// let a = ClassSet::new(vec!['a'..='k', 'l'..='z'], false);
/// let b = ClassSet::new(vec!['a'..='z'], false);
/// assert_eq!(a.to_ranges(), b.to_ranges());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSet {
    pub(crate) ranges: Vec<RangeInclusive<char>>,
    pub(crate) negated: bool,
}
impl ClassSet {
    pub fn new(ranges: Vec<RangeInclusive<char>>, negated: bool) -> ClassSet {
        return ClassSet { ranges, negated };
    }
    pub fn from_char(c: char) -> ClassSet {
        return ClassSet::new(vec![c..=c], false);
    }
    /// Every scalar value except `\n`, or everything if `dot_matches_newline`.
    pub fn dot(dot_matches_newline: bool) -> ClassSet {
        if dot_matches_newline {
            return ClassSet::new(vec!['\0'..=char::MAX], false);
        } else {
            return ClassSet::new(vec!['\n'..='\n'], true);
        }
    }
    pub fn is_negated(&self) -> bool {
        return self.negated;
    }

    /// Adds the members of `other` (with its negation applied) to this set's listed ranges.
    pub(crate) fn union_with(&mut self, other: &ClassSet) {
        self.ranges.extend(other.to_ranges());
    }

    /// Adds the simple case variants of every member.
    ///
    /// Negation is applied afterwards, so `(?i)[^a]` excludes both `a` and `A`.
    pub(crate) fn case_fold(&mut self) {
        let mut extra = Vec::new();
        for range in &self.ranges {
            // no simple case mappings exist above the supplementary multilingual plane
            let end = std::cmp::min(*range.end(), '\u{1FFFF}');
            if *range.start() > end {
                continue;
            }
            for c in *range.start()..=end {
                for variant in simple_case_variants(c) {
                    if !range.contains(&variant) {
                        extra.push(variant..=variant);
                    }
                }
            }
        }
        self.ranges.extend(extra);
    }

    /// Produces the sorted, minimal set of ranges this class matches, with negation applied.
    ///
    /// ```
    /// use fastregex_core::char_class::ClassSet;
    /// let class = ClassSet::new(vec!['b'..='y'], true);
    /// assert_eq!(class.to_ranges(), vec!['\0'..='a', 'z'..=char::MAX]);
    /// ```
    pub fn to_ranges(&self) -> Vec<RangeInclusive<char>> {
        let ranges = reduce_ranges(self.ranges.clone());
        if self.negated {
            return complement(&ranges);
        } else {
            return ranges;
        }
    }

    /// Whether the class can match anything at all.
    pub fn is_empty(&self) -> bool {
        return self.to_ranges().is_empty();
    }
}
impl From<char> for ClassSet {
    fn from(value: char) -> Self {
        return ClassSet::from_char(value);
    }
}
impl Display for ClassSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('[')?;
        if self.negated {
            f.write_char('^')?;
        }
        for range in &self.ranges {
            write_class_char(f, *range.start())?;
            if range.start() != range.end() {
                f.write_char('-')?;
                write_class_char(f, *range.end())?;
            }
        }
        return f.write_char(']');
    }
}

fn write_class_char(f: &mut std::fmt::Formatter<'_>, c: char) -> std::fmt::Result {
    return match c {
        '\\' | ']' | '[' | '^' | '-' => write!(f, "\\{c}"),
        c if c.is_control() || c == ' ' => write!(f, "\\x{{{:X}}}", c as u32),
        c => f.write_char(c),
    };
}

fn simple_case_variants(c: char) -> impl Iterator<Item = char> {
    fn single(mut it: impl Iterator<Item = char>) -> Option<char> {
        let first = it.next()?;
        return it.next().is_none().then_some(first);
    }
    let lower = single(c.to_lowercase());
    let upper = single(c.to_uppercase());
    let upper_of_lower = lower.and_then(|l| single(l.to_uppercase()));
    return [lower, upper, upper_of_lower]
        .into_iter()
        .flatten()
        .filter(move |v| *v != c);
}

/// The scalar value directly before `c`, skipping the surrogate gap.
pub(crate) fn char_before(c: char) -> Option<char> {
    return match c {
        '\0' => None,
        '\u{E000}' => Some('\u{D7FF}'),
        c => char::from_u32(c as u32 - 1),
    };
}
/// The scalar value directly after `c`, skipping the surrogate gap.
pub(crate) fn char_after(c: char) -> Option<char> {
    return match c {
        char::MAX => None,
        '\u{D7FF}' => Some('\u{E000}'),
        c => char::from_u32(c as u32 + 1),
    };
}

/// Sorts and combines ranges
///
/// ```ignore
/// assert_eq!(
///     reduce_ranges(vec!['e'..='g', 'b'..='c', 'f'..='h', 'j'..='k']),
///     vec!['b'..='c', 'e'..='h', 'j'..='k'],
/// );
/// ```
pub(crate) fn reduce_ranges(mut ranges: Vec<RangeInclusive<char>>) -> Vec<RangeInclusive<char>> {
    ranges.retain(|range| !range.is_empty());
    ranges.sort_by_key(|range| *range.start());
    let Some((first_range, terms)) = ranges.split_first() else {
        return Vec::new();
    };
    let mut reduced_terms = Vec::new();

    let mut current_start = *first_range.start();
    let mut current_end = *first_range.end();
    for term in terms {
        let touches = *term.start() <= current_end || char_after(current_end) == Some(*term.start());
        if touches {
            // the next term either starts immediately after or is overlapping so combine them.
            current_end = std::cmp::max(current_end, *term.end());
        } else {
            reduced_terms.push(current_start..=current_end);
            current_start = *term.start();
            current_end = *term.end();
        }
    }
    reduced_terms.push(current_start..=current_end);
    return reduced_terms;
}

/// The complement of sorted, disjoint ranges over all scalar values.
pub(crate) fn complement(ranges: &[RangeInclusive<char>]) -> Vec<RangeInclusive<char>> {
    let mut out = Vec::new();
    let mut next_start = Some('\0');
    for range in ranges {
        if let (Some(start), Some(before)) = (next_start, char_before(*range.start())) {
            if start <= before {
                out.push(start..=before);
            }
        }
        next_start = char_after(*range.end());
    }
    if let Some(start) = next_start {
        out.push(start..=char::MAX);
    }
    return out;
}

/// The ASCII-only Perl classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerlClass {
    /// `\d`
    Digit,
    /// `\w`
    Word,
    /// `\s`
    Space,
}
impl PerlClass {
    pub const fn to_ranges(&self) -> &'static [RangeInclusive<char>] {
        return match self {
            PerlClass::Digit => &['0'..='9'],
            PerlClass::Word => &['0'..='9', 'A'..='Z', '_'..='_', 'a'..='z'],
            PerlClass::Space => &['\t'..='\r', ' '..=' '],
        };
    }
    pub fn to_class(&self, negated: bool) -> ClassSet {
        return ClassSet::new(self.to_ranges().to_vec(), negated);
    }
}

/// From <https://pubs.opengroup.org/onlinepubs/9799919799/basedefs/V1_chap09.html#tag_09_03_05>
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PosixClass {
    /// `[:alnum:]`
    Alphanumeric,
    /// `[:cntrl:]`
    Control,
    /// `[:lower:]`
    Lower,
    /// `[:space:]`
    Space,
    /// `[:alpha:]`
    Alphabet,
    /// `[:digit:]`
    Digit,
    /// `[:print:]`
    Print,
    /// `[:upper:]`
    Upper,
    /// `[:blank:]`
    Blank,
    /// `[:graph:]`
    Graphic,
    /// `[:punct:]`
    Punctuation,
    /// `[:xdigit:]`
    HexDigit,
    /// `[:word:]`
    Word,
    /// `[:ascii:]`
    Ascii,
}
impl PosixClass {
    pub const fn to_ranges(&self) -> &'static [RangeInclusive<char>] {
        return match self {
            PosixClass::Alphanumeric => &['0'..='9', 'A'..='Z', 'a'..='z'],
            PosixClass::Control => &['\0'..='\x1f', '\x7f'..='\x7f'],
            PosixClass::Lower => &['a'..='z'],
            PosixClass::Space => &['\t'..='\r', ' '..=' '],
            PosixClass::Alphabet => &['A'..='Z', 'a'..='z'],
            PosixClass::Digit => &['0'..='9'],
            PosixClass::Print => &['\x20'..='\x7E'],
            PosixClass::Upper => &['A'..='Z'],
            PosixClass::Blank => &['\t'..='\t', ' '..=' '],
            PosixClass::Graphic => &['\x21'..='\x7e'],
            PosixClass::Punctuation => &[
                '\x21'..='\x2f',
                '\x3a'..='\x40',
                '\x5b'..='\x60',
                '\x7b'..='\x7e',
            ],
            PosixClass::HexDigit => &['0'..='9', 'A'..='F', 'a'..='f'],
            PosixClass::Word => &['0'..='9', 'A'..='Z', '_'..='_', 'a'..='z'],
            PosixClass::Ascii => &['\0'..='\x7f'],
        };
    }
    pub fn from_name(name: &str) -> Option<PosixClass> {
        return Some(match name {
            "alnum" => PosixClass::Alphanumeric,
            "cntrl" => PosixClass::Control,
            "lower" => PosixClass::Lower,
            "space" => PosixClass::Space,
            "alpha" => PosixClass::Alphabet,
            "digit" => PosixClass::Digit,
            "print" => PosixClass::Print,
            "upper" => PosixClass::Upper,
            "blank" => PosixClass::Blank,
            "graph" => PosixClass::Graphic,
            "punct" => PosixClass::Punctuation,
            "xdigit" => PosixClass::HexDigit,
            "word" => PosixClass::Word,
            "ascii" => PosixClass::Ascii,
            _ => return None,
        });
    }
}

/// Looks up a `\p{..}` name.
///
/// Names are matched ignoring case, spaces, `-` and `_`.
/// Scripts are approximated by the Unicode blocks they primarily occupy.
pub fn unicode_class(name: &str) -> Option<&'static [RangeInclusive<char>]> {
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();
    return Some(match normalized.as_str() {
        "any" => &['\0'..=char::MAX],
        "ascii" => &['\0'..='\x7f'],
        "latin" => &[
            'A'..='Z',
            'a'..='z',
            '\u{AA}'..='\u{AA}',
            '\u{BA}'..='\u{BA}',
            '\u{C0}'..='\u{D6}',
            '\u{D8}'..='\u{F6}',
            '\u{F8}'..='\u{24F}',
            '\u{1E00}'..='\u{1EFF}',
        ],
        "greek" => &['\u{370}'..='\u{3FF}', '\u{1F00}'..='\u{1FFF}'],
        "cyrillic" => &[
            '\u{400}'..='\u{52F}',
            '\u{1C80}'..='\u{1C8F}',
            '\u{2DE0}'..='\u{2DFF}',
            '\u{A640}'..='\u{A69F}',
        ],
        "armenian" => &['\u{531}'..='\u{58F}'],
        "hebrew" => &['\u{591}'..='\u{5FF}'],
        "arabic" => &['\u{600}'..='\u{6FF}', '\u{750}'..='\u{77F}'],
        "devanagari" => &['\u{900}'..='\u{97F}'],
        "thai" => &['\u{E01}'..='\u{E5B}'],
        "georgian" => &['\u{10A0}'..='\u{10FF}'],
        "hangul" => &[
            '\u{1100}'..='\u{11FF}',
            '\u{3130}'..='\u{318F}',
            '\u{AC00}'..='\u{D7AF}',
        ],
        "hiragana" => &['\u{3041}'..='\u{309F}'],
        "katakana" => &['\u{30A0}'..='\u{30FF}', '\u{31F0}'..='\u{31FF}'],
        "han" => &[
            '\u{2E80}'..='\u{2FDF}',
            '\u{3400}'..='\u{4DBF}',
            '\u{4E00}'..='\u{9FFF}',
            '\u{F900}'..='\u{FAFF}',
            '\u{20000}'..='\u{2A6DF}',
        ],
        _ => return None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_overlapping_and_adjacent() {
        assert_eq!(reduce_ranges(vec!['0'..='4', '5'..='9']), vec!['0'..='9']);
        assert_eq!(reduce_ranges(vec!['5'..='9', '0'..='4']), vec!['0'..='9']);
        assert_eq!(
            reduce_ranges(vec!['0'..='4', '6'..='8', '9'..='9']),
            vec!['0'..='4', '6'..='9']
        );
        assert_eq!(
            reduce_ranges(vec!['\u{D000}'..='\u{D7FF}', '\u{E000}'..='\u{E0FF}']),
            vec!['\u{D000}'..='\u{E0FF}']
        );
    }

    #[test]
    fn negated_ranges() {
        let class = ClassSet::new(vec!['1'..='4', '5'..='8'], true);
        assert_eq!(class.to_ranges(), vec!['\0'..='0', '9'..=char::MAX]);

        let class = ClassSet::new(vec!['8'..='8', '6'..='7', '1'..='4'], true);
        assert_eq!(
            class.to_ranges(),
            vec!['\0'..='0', '5'..='5', '9'..=char::MAX]
        );

        let class = ClassSet::new(vec!['\0'..=char::MAX], true);
        assert!(class.is_empty());
    }

    #[test]
    fn case_folding() {
        let mut class = ClassSet::new(vec!['a'..='c'], false);
        class.case_fold();
        assert_eq!(class.to_ranges(), vec!['A'..='C', 'a'..='c']);

        let mut class = ClassSet::from_char('ж');
        class.case_fold();
        assert_eq!(class.to_ranges(), vec!['Ж'..='Ж', 'ж'..='ж']);

        let mut class = ClassSet::new(vec!['a'..='a'], true);
        class.case_fold();
        let ranges = class.to_ranges();
        assert!(!ranges.iter().any(|r| r.contains(&'a') || r.contains(&'A')));
    }

    #[test]
    fn class_names() {
        assert_eq!(PosixClass::from_name("upper"), Some(PosixClass::Upper));
        assert_eq!(PosixClass::from_name("uppercase"), None);
        assert!(unicode_class("Greek").is_some());
        assert!(unicode_class("greek").is_some());
        assert!(unicode_class("Old_Hungarian_Runes").is_none());
    }
}
