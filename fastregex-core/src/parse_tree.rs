//! Implements the pattern parser and the abstract syntax tree ([`Ast`]) it produces.
//!
//! The grammar is the familiar Perl-style one: literals, `.`, bracket classes, Perl and
//! Unicode classes, anchors, capturing/non-capturing/named groups, inline flags, alternation,
//! and greedy or lazy repetition. Constructs that are valid syntax but cannot be expressed
//! by a finite automaton (backreferences, look-around, ...) are parsed into
//! [`Ast::Unsupported`] so that the NFA builder can report them precisely.

use std::fmt::{Display, Write};

use crate::{
    char_class::{unicode_class, ClassSet, PerlClass, PosixClass},
    config::Config,
    error::{SyntaxError, SyntaxErrorKind, UnsupportedKind},
};

/// Counted repetitions above this bound are rejected.
pub const MAX_REPETITION: u32 = 1000;

/// On input string `text: &'a str` with options `{<prefix> => T, ..}`,
/// it returns `Option<(&'a str, T)>` based on which literal prefix is matched
///
/// Example:
/// ```ignore
/// let text = "asdf";
/// let test = match_prefix!(text, {
///     "fdsa" => 0,
///     "qwerty" => 1,
///     "as" => 2,
///     "asd" => 3,
/// });
/// assert_eq!(test, Some(("df", 2)));
/// ```
macro_rules! match_prefix {
    ($text:ident, { }) => (::core::option::Option::None);
    ($text:ident, {
        $x:literal => $y:expr,
        $($xs:literal => $ys:expr,)*
    }) => {
        if let ::core::option::Option::Some(rest) = str::strip_prefix($text, $x) {
            ::core::option::Option::Some((rest, $y))
        } $(else if let ::core::option::Option::Some(rest) = str::strip_prefix($text, $xs) {
            ::core::option::Option::Some((rest, $ys))
        })* else {
            ::core::option::Option::None
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    StartText,
    EndText,
    StartLine,
    EndLine,
    WordBoundary,
    NotWordBoundary,
}
impl Display for AnchorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return match self {
            AnchorKind::StartText => f.write_char('^'),
            AnchorKind::EndText => f.write_char('$'),
            AnchorKind::StartLine => f.write_str("(?m:^)"),
            AnchorKind::EndLine => f.write_str("(?m:$)"),
            AnchorKind::WordBoundary => f.write_str(r"\b"),
            AnchorKind::NotWordBoundary => f.write_str(r"\B"),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureGroup {
    /// Group `0` is the whole pattern, so explicit groups start at `1`.
    pub index: usize,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Empty,
    Literal(char),
    Class(ClassSet),
    Concat(Vec<Ast>),
    /// Branches are in priority order.
    Alternation(Vec<Ast>),
    Repetition {
        child: Box<Ast>,
        min: u32,
        /// `None` is unbounded
        max: Option<u32>,
        greedy: bool,
    },
    Group {
        child: Box<Ast>,
        capture: Option<CaptureGroup>,
    },
    Anchor(AnchorKind),
    /// Valid syntax that cannot be compiled to an automaton.
    Unsupported {
        construct: UnsupportedKind,
        position: usize,
    },
}
impl Ast {
    /// Finds the first node that cannot be compiled to an automaton, in pattern order.
    pub fn find_unsupported(&self) -> Option<(UnsupportedKind, usize)> {
        return match self {
            Ast::Unsupported {
                construct,
                position,
            } => Some((*construct, *position)),
            Ast::Concat(parts) | Ast::Alternation(parts) => {
                parts.iter().find_map(Ast::find_unsupported)
            }
            Ast::Repetition { child, .. } | Ast::Group { child, .. } => child.find_unsupported(),
            Ast::Empty | Ast::Literal(_) | Ast::Class(_) | Ast::Anchor(_) => None,
        };
    }

    /// Whether some input lets this node match without consuming a byte.
    ///
    /// Anchors count as empty, since they can be satisfied at the right position.
    pub fn can_match_empty(&self) -> bool {
        return match self {
            Ast::Empty | Ast::Anchor(_) => true,
            Ast::Literal(_) | Ast::Class(_) | Ast::Unsupported { .. } => false,
            Ast::Concat(parts) => parts.iter().all(Ast::can_match_empty),
            Ast::Alternation(parts) => parts.iter().any(Ast::can_match_empty),
            Ast::Repetition { child, min, .. } => *min == 0 || child.can_match_empty(),
            Ast::Group { child, .. } => child.can_match_empty(),
        };
    }

    fn fmt_in(&self, f: &mut std::fmt::Formatter<'_>, context: DisplayContext) -> std::fmt::Result {
        let needs_wrap = match (self, context) {
            (Ast::Alternation(_), DisplayContext::Concat | DisplayContext::Repeat) => true,
            (Ast::Concat(_) | Ast::Repetition { .. } | Ast::Empty, DisplayContext::Repeat) => true,
            _ => false,
        };
        if needs_wrap {
            f.write_str("(?:")?;
            self.fmt_in(f, DisplayContext::Top)?;
            return f.write_char(')');
        }

        return match self {
            Ast::Empty => Ok(()),
            Ast::Literal(c) if is_meta_character(*c) => write!(f, "\\{c}"),
            Ast::Literal(c) if c.is_control() => write!(f, "\\x{{{:X}}}", *c as u32),
            Ast::Literal(c) => f.write_char(*c),
            Ast::Class(class) if *class == ClassSet::dot(false) => f.write_char('.'),
            Ast::Class(class) if *class == ClassSet::dot(true) => f.write_str("(?s:.)"),
            Ast::Class(class) => class.fmt(f),
            Ast::Concat(parts) => {
                for part in parts {
                    part.fmt_in(f, DisplayContext::Concat)?;
                }
                Ok(())
            }
            Ast::Alternation(branches) => {
                let mut it = branches.iter();
                if let Some(first) = it.next() {
                    first.fmt_in(f, DisplayContext::Top)?;
                }
                for branch in it {
                    f.write_char('|')?;
                    branch.fmt_in(f, DisplayContext::Top)?;
                }
                Ok(())
            }
            Ast::Repetition {
                child,
                min,
                max,
                greedy,
            } => {
                child.fmt_in(f, DisplayContext::Repeat)?;
                match (min, max) {
                    (0, None) => f.write_char('*')?,
                    (1, None) => f.write_char('+')?,
                    (0, Some(1)) => f.write_char('?')?,
                    (n, None) => write!(f, "{{{n},}}")?,
                    (n, Some(m)) if n == m => write!(f, "{{{n}}}")?,
                    (n, Some(m)) => write!(f, "{{{n},{m}}}")?,
                }
                if !greedy {
                    f.write_char('?')?;
                }
                Ok(())
            }
            Ast::Group { child, capture } => {
                match capture {
                    Some(CaptureGroup {
                        name: Some(name), ..
                    }) => write!(f, "(?P<{name}>")?,
                    Some(CaptureGroup { name: None, .. }) => f.write_char('(')?,
                    None => f.write_str("(?:")?,
                }
                child.fmt_in(f, DisplayContext::Top)?;
                f.write_char(')')
            }
            Ast::Anchor(anchor) => anchor.fmt(f),
            Ast::Unsupported { construct, .. } => match construct {
                UnsupportedKind::Backreference(n) => write!(f, "\\{n}"),
                UnsupportedKind::NamedBackreference => f.write_str("(?P=_)"),
                UnsupportedKind::LookAhead => f.write_str("(?=)"),
                UnsupportedKind::LookBehind => f.write_str("(?<=)"),
                UnsupportedKind::AtomicGroup => f.write_str("(?>)"),
                UnsupportedKind::Recursion => f.write_str("(?R)"),
            },
        };
    }
}
/// Reconstructs an equivalent pattern.
impl Display for Ast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return self.fmt_in(f, DisplayContext::Top);
    }
}

#[derive(Debug, Clone, Copy)]
enum DisplayContext {
    Top,
    Concat,
    Repeat,
}

/// The result of [`parse`].
#[derive(Debug, Clone)]
pub struct ParsedPattern {
    pub ast: Ast,
    /// Indexed by capture group, including group `0` (which is never named).
    pub capture_names: Vec<Option<String>>,
}
impl ParsedPattern {
    /// The number of capture groups, including group `0`.
    pub fn capture_count(&self) -> usize {
        return self.capture_names.len();
    }
}

/// Parses `pattern` with the initial flags from `config`.
pub fn parse(pattern: &str, config: &Config) -> Result<ParsedPattern, SyntaxError> {
    let mut parser = Parser {
        pattern,
        capture_names: vec![None],
    };
    let mut flags = Flags::from_config(config);
    let (rest, ast) = parser.take_alternation(pattern, &mut flags)?;
    if !rest.is_empty() {
        // the top-level alternation only stops early on a stray `)`
        return Err(SyntaxError::new(
            parser.position(rest),
            SyntaxErrorKind::UnopenedGroup,
        ));
    }
    return Ok(ParsedPattern {
        ast,
        capture_names: parser.capture_names,
    });
}

/// A pattern string literal in a macro invocation, parsed with the default [`Config`].
pub struct PatternLit {
    pub value: String,
    pub span: proc_macro2::Span,
    pub parsed: ParsedPattern,
}
impl syn::parse::Parse for PatternLit {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let literal: syn::LitStr = input.parse()?;
        let value = literal.value();
        let parsed = parse(&value, &Config::default())
            .map_err(|err| syn::Error::new(literal.span(), err.to_string()))?;
        return Ok(PatternLit {
            value,
            span: literal.span(),
            parsed,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flags {
    case_insensitive: bool,
    multiline: bool,
    dot_matches_newline: bool,
    swap_greed: bool,
}
impl Flags {
    const fn from_config(config: &Config) -> Flags {
        return Flags {
            case_insensitive: config.case_insensitive(),
            multiline: config.multiline(),
            dot_matches_newline: config.dot_matches_newline(),
            swap_greed: config.swap_greed(),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quantifier {
    min: u32,
    max: Option<u32>,
    greedy: bool,
}

enum Escape {
    Char(char),
    Class(ClassSet),
    Anchor(AnchorKind),
    Unsupported(UnsupportedKind),
}

enum GroupKind {
    NonCapturing,
    Named,
    Unsupported(UnsupportedKind),
    NamedBackreference,
    Recursion,
}

struct Parser<'p> {
    pattern: &'p str,
    capture_names: Vec<Option<String>>,
}
impl<'p> Parser<'p> {
    /// Byte offset of `rest` within the pattern.
    fn position(&self, rest: &str) -> usize {
        return self.pattern.len() - rest.len();
    }

    fn take_alternation(
        &mut self,
        rest: &'p str,
        flags: &mut Flags,
    ) -> Result<(&'p str, Ast), SyntaxError> {
        let mut branches = Vec::new();
        let (mut rest, branch) = self.take_concat(rest, flags)?;
        branches.push(branch);
        while let Some(new_rest) = rest.strip_prefix('|') {
            let (new_rest, branch) = self.take_concat(new_rest, flags)?;
            rest = new_rest;
            branches.push(branch);
        }
        if branches.len() == 1 {
            return Ok((rest, branches.pop().unwrap_or(Ast::Empty)));
        }
        return Ok((rest, Ast::Alternation(branches)));
    }

    fn take_concat(
        &mut self,
        mut rest: &'p str,
        flags: &mut Flags,
    ) -> Result<(&'p str, Ast), SyntaxError> {
        let mut parts = Vec::new();
        while !rest.is_empty() && !rest.starts_with('|') && !rest.starts_with(')') {
            let (new_rest, part) = self.take_repeated(rest, flags)?;
            rest = new_rest;
            parts.extend(part);
        }
        let ast = match parts.len() {
            0 => Ast::Empty,
            1 => parts.pop().unwrap_or(Ast::Empty),
            _ => Ast::Concat(parts),
        };
        return Ok((rest, ast));
    }

    /// An atom with an optional quantifier. Returns `None` for flag groups like `(?i)`.
    fn take_repeated(
        &mut self,
        rest: &'p str,
        flags: &mut Flags,
    ) -> Result<(&'p str, Option<Ast>), SyntaxError> {
        let (rest, atom) = self.take_atom(rest, flags)?;
        let Some((after, quantifier)) = self.take_quantifier(rest, flags)? else {
            return Ok((rest, atom));
        };
        let Some(atom) = atom else {
            return Err(SyntaxError::new(
                self.position(rest),
                SyntaxErrorKind::RepetitionMissing,
            ));
        };
        if self.take_quantifier(after, flags)?.is_some() {
            return Err(SyntaxError::new(
                self.position(after),
                SyntaxErrorKind::NestedRepetition,
            ));
        }
        let Quantifier { min, max, greedy } = quantifier;
        return Ok((
            after,
            Some(Ast::Repetition {
                child: Box::new(atom),
                min,
                max,
                greedy,
            }),
        ));
    }

    fn take_quantifier(
        &self,
        rest: &'p str,
        flags: &Flags,
    ) -> Result<Option<(&'p str, Quantifier)>, SyntaxError> {
        let position = self.position(rest);
        let mut it = rest.chars();
        let (rest, min, max) = match it.next() {
            Some('*') => (it.as_str(), 0, None),
            Some('+') => (it.as_str(), 1, None),
            Some('?') => (it.as_str(), 0, Some(1)),
            Some('{') => {
                let invalid = SyntaxError::new(position, SyntaxErrorKind::InvalidRepetition);
                let Some((inside, rest)) = it.as_str().split_once('}') else {
                    return Err(invalid);
                };
                let count = |text: &str| -> Result<u32, SyntaxError> {
                    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(invalid.clone());
                    }
                    let too_large = SyntaxError::new(
                        position,
                        SyntaxErrorKind::RepetitionTooLarge {
                            limit: MAX_REPETITION,
                        },
                    );
                    let n: u32 = text.parse().map_err(|_| too_large.clone())?;
                    if n > MAX_REPETITION {
                        return Err(too_large);
                    }
                    return Ok(n);
                };
                match inside.split_once(',') {
                    None => {
                        let n = count(inside)?;
                        (rest, n, Some(n))
                    }
                    Some((min, "")) => (rest, count(min)?, None),
                    Some((min, max)) => {
                        let (min, max) = (count(min)?, count(max)?);
                        if min > max {
                            return Err(SyntaxError::new(
                                position,
                                SyntaxErrorKind::RepetitionBoundsInverted { min, max },
                            ));
                        }
                        (rest, min, Some(max))
                    }
                }
            }
            _ => return Ok(None),
        };
        let (rest, lazy) = match rest.strip_prefix('?') {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        let greedy = flags.swap_greed == lazy;
        return Ok(Some((rest, Quantifier { min, max, greedy })));
    }

    fn take_atom(
        &mut self,
        rest: &'p str,
        flags: &mut Flags,
    ) -> Result<(&'p str, Option<Ast>), SyntaxError> {
        let position = self.position(rest);
        let mut it = rest.chars();
        let Some(c) = it.next() else {
            return Ok((rest, None));
        };
        let after = it.as_str();
        return match c {
            '(' => self.take_group(after, position, flags),
            '[' => {
                let (rest, class) = self.take_bracket(after, position, flags)?;
                Ok((rest, Some(Ast::Class(class))))
            }
            '.' => Ok((
                after,
                Some(Ast::Class(ClassSet::dot(flags.dot_matches_newline))),
            )),
            '^' if flags.multiline => Ok((after, Some(Ast::Anchor(AnchorKind::StartLine)))),
            '^' => Ok((after, Some(Ast::Anchor(AnchorKind::StartText)))),
            '$' if flags.multiline => Ok((after, Some(Ast::Anchor(AnchorKind::EndLine)))),
            '$' => Ok((after, Some(Ast::Anchor(AnchorKind::EndText)))),
            '\\' => {
                let (rest, escape) = self.take_escape(after, position, false)?;
                let ast = match escape {
                    Escape::Char(c) => literal(c, flags),
                    Escape::Class(class) => class_node(class, flags),
                    Escape::Anchor(anchor) => Ast::Anchor(anchor),
                    Escape::Unsupported(construct) => Ast::Unsupported {
                        construct,
                        position,
                    },
                };
                Ok((rest, Some(ast)))
            }
            '*' | '+' | '?' | '{' => Err(SyntaxError::new(
                position,
                SyntaxErrorKind::RepetitionMissing,
            )),
            c => Ok((after, Some(literal(c, flags)))),
        };
    }

    /// `rest` starts right after the opening `(` at `open`.
    fn take_group(
        &mut self,
        rest: &'p str,
        open: usize,
        flags: &mut Flags,
    ) -> Result<(&'p str, Option<Ast>), SyntaxError> {
        let unclosed = SyntaxError::new(open, SyntaxErrorKind::UnclosedGroup);

        let special = match_prefix!(rest, {
            "?:" => GroupKind::NonCapturing,
            "?=" => GroupKind::Unsupported(UnsupportedKind::LookAhead),
            "?!" => GroupKind::Unsupported(UnsupportedKind::LookAhead),
            "?<=" => GroupKind::Unsupported(UnsupportedKind::LookBehind),
            "?<!" => GroupKind::Unsupported(UnsupportedKind::LookBehind),
            "?>" => GroupKind::Unsupported(UnsupportedKind::AtomicGroup),
            "?P<" => GroupKind::Named,
            "?<" => GroupKind::Named,
            "?P=" => GroupKind::NamedBackreference,
            "?R)" => GroupKind::Recursion,
        });

        let mut inner_flags = *flags;
        let (rest, capture, unsupported) = match special {
            Some((rest, GroupKind::NonCapturing)) => (rest, None, None),
            Some((rest, GroupKind::Unsupported(kind))) => (rest, None, Some(kind)),
            Some((rest, GroupKind::Recursion)) => {
                let node = Ast::Unsupported {
                    construct: UnsupportedKind::Recursion,
                    position: open,
                };
                return Ok((rest, Some(node)));
            }
            Some((rest, GroupKind::NamedBackreference)) => {
                let Some((_, rest)) = rest.split_once(')') else {
                    return Err(unclosed);
                };
                let node = Ast::Unsupported {
                    construct: UnsupportedKind::NamedBackreference,
                    position: open,
                };
                return Ok((rest, Some(node)));
            }
            Some((rest, GroupKind::Named)) => {
                let name_position = self.position(rest);
                let invalid_name =
                    SyntaxError::new(name_position, SyntaxErrorKind::InvalidGroupName);
                let Some((name, rest)) = rest.split_once('>') else {
                    return Err(invalid_name);
                };
                if !is_valid_group_name(name) {
                    return Err(invalid_name);
                }
                if self.capture_names.iter().flatten().any(|n| n == name) {
                    return Err(SyntaxError::new(
                        name_position,
                        SyntaxErrorKind::DuplicateGroupName(name.to_string()),
                    ));
                }
                let index = self.capture_names.len();
                self.capture_names.push(Some(name.to_string()));
                let capture = CaptureGroup {
                    index,
                    name: Some(name.to_string()),
                };
                (rest, Some(capture), None)
            }
            None => match rest.strip_prefix('?') {
                Some(after_question) => {
                    let (rest, new_flags, scoped) =
                        self.take_flags(after_question, open, flags)?;
                    if !scoped {
                        // `(?i)` changes the flags for the rest of the enclosing group
                        *flags = new_flags;
                        return Ok((rest, None));
                    }
                    inner_flags = new_flags;
                    (rest, None, None)
                }
                None => {
                    let index = self.capture_names.len();
                    self.capture_names.push(None);
                    (rest, Some(CaptureGroup { index, name: None }), None)
                }
            },
        };

        let (rest, child) = self.take_alternation(rest, &mut inner_flags)?;
        let Some(rest) = rest.strip_prefix(')') else {
            return Err(unclosed);
        };
        if let Some(construct) = unsupported {
            return Ok((
                rest,
                Some(Ast::Unsupported {
                    construct,
                    position: open,
                }),
            ));
        }
        let group = Ast::Group {
            child: Box::new(child),
            capture,
        };
        return Ok((rest, Some(group)));
    }

    /// Parses the flags of `(?flags)` or `(?flags:...)`, with `rest` right after the `?`.
    ///
    /// ## Returns
    /// `(rest, flags, scoped)` where `scoped` is `true` for the `(?flags:...)` form,
    /// in which case `rest` is the start of the group body.
    fn take_flags(
        &self,
        rest: &'p str,
        open: usize,
        flags: &Flags,
    ) -> Result<(&'p str, Flags, bool), SyntaxError> {
        let mut new_flags = *flags;
        let mut negate = false;
        let mut any = false;
        for (i, c) in rest.char_indices() {
            let position = self.position(&rest[i..]);
            match c {
                'i' => new_flags.case_insensitive = !negate,
                'm' => new_flags.multiline = !negate,
                's' => new_flags.dot_matches_newline = !negate,
                'U' => new_flags.swap_greed = !negate,
                '-' if !negate => {
                    negate = true;
                    continue;
                }
                ':' => return Ok((&rest[i + 1..], new_flags, true)),
                ')' if !any => {
                    return Err(SyntaxError::new(open, SyntaxErrorKind::EmptyFlagGroup));
                }
                ')' => return Ok((&rest[i + 1..], new_flags, false)),
                c => return Err(SyntaxError::new(position, SyntaxErrorKind::UnknownFlag(c))),
            }
            any = true;
        }
        return Err(SyntaxError::new(open, SyntaxErrorKind::UnclosedGroup));
    }

    /// `rest` starts right after the opening `[` at `open`.
    fn take_bracket(
        &self,
        rest: &'p str,
        open: usize,
        flags: &Flags,
    ) -> Result<(&'p str, ClassSet), SyntaxError> {
        let mut rest = rest;
        let negated = match rest.strip_prefix('^') {
            Some(new_rest) => {
                rest = new_rest;
                true
            }
            None => false,
        };
        let mut class = ClassSet::new(Vec::new(), negated);
        if let Some(new_rest) = rest.strip_prefix(']') {
            rest = new_rest;
            class.ranges.push(']'..=']');
        }
        loop {
            if rest.is_empty() {
                return Err(SyntaxError::new(open, SyntaxErrorKind::UnclosedClass));
            }
            if let Some(new_rest) = rest.strip_prefix(']') {
                // End of the bracket expression
                rest = new_rest;
                break;
            }
            if let Some((new_rest, posix)) = self.take_posix_class(rest)? {
                rest = new_rest;
                class.union_with(&posix);
                continue;
            }

            let item_position = self.position(rest);
            let (new_rest, item) = self.take_class_item(rest)?;
            rest = new_rest;
            let first = match item {
                Escape::Char(c) => c,
                Escape::Class(set) => {
                    class.union_with(&set);
                    continue;
                }
                Escape::Anchor(_) | Escape::Unsupported(_) => {
                    return Err(SyntaxError::new(
                        item_position,
                        SyntaxErrorKind::InvalidEscape,
                    ));
                }
            };

            if let Some(after_dash) = rest.strip_prefix('-') {
                if !after_dash.is_empty() && !after_dash.starts_with(']') {
                    // it's a range
                    let end_position = self.position(after_dash);
                    let (new_rest, end_item) = self.take_class_item(after_dash)?;
                    let Escape::Char(last) = end_item else {
                        return Err(SyntaxError::new(
                            end_position,
                            SyntaxErrorKind::InvalidEscape,
                        ));
                    };
                    if last < first {
                        return Err(SyntaxError::new(
                            item_position,
                            SyntaxErrorKind::InvalidClassRange(first, last),
                        ));
                    }
                    rest = new_rest;
                    class.ranges.push(first..=last);
                    continue;
                }
            }
            class.ranges.push(first..=first);
        }
        if flags.case_insensitive {
            class.case_fold();
        }
        return Ok((rest, class));
    }

    /// A single char or escape inside a bracket expression.
    fn take_class_item(&self, rest: &'p str) -> Result<(&'p str, Escape), SyntaxError> {
        let position = self.position(rest);
        let mut it = rest.chars();
        return match it.next() {
            Some('\\') => self.take_escape(it.as_str(), position, true),
            Some(c) => Ok((it.as_str(), Escape::Char(c))),
            None => Err(SyntaxError::new(position, SyntaxErrorKind::UnclosedClass)),
        };
    }

    /// `[:name:]` or `[:^name:]` inside a bracket expression.
    fn take_posix_class(&self, rest: &'p str) -> Result<Option<(&'p str, ClassSet)>, SyntaxError> {
        let Some(inner) = rest.strip_prefix("[:") else {
            return Ok(None);
        };
        let Some((name, after)) = inner.split_once(":]") else {
            return Ok(None);
        };
        let (name, negated) = match name.strip_prefix('^') {
            Some(name) => (name, true),
            None => (name, false),
        };
        let Some(class) = PosixClass::from_name(name) else {
            return Err(SyntaxError::new(
                self.position(rest),
                SyntaxErrorKind::UnknownPosixClass(name.to_string()),
            ));
        };
        return Ok(Some((
            after,
            ClassSet::new(class.to_ranges().to_vec(), negated),
        )));
    }

    /// `rest` starts right after the `\` at `position`.
    fn take_escape(
        &self,
        rest: &'p str,
        position: usize,
        in_class: bool,
    ) -> Result<(&'p str, Escape), SyntaxError> {
        let invalid = SyntaxError::new(position, SyntaxErrorKind::InvalidEscape);
        let mut it = rest.chars();
        let Some(c) = it.next() else {
            return Err(invalid);
        };
        let rest = it.as_str();
        let escape = match c {
            'n' => Escape::Char('\n'),
            't' => Escape::Char('\t'),
            'r' => Escape::Char('\r'),
            'f' => Escape::Char('\x0C'),
            'v' => Escape::Char('\x0B'),
            'a' => Escape::Char('\x07'),
            'e' => Escape::Char('\x1B'),
            '0' => Escape::Char('\0'),
            'x' => return self.take_hex(rest, position, 2),
            'u' => return self.take_hex(rest, position, 4),
            'd' | 'D' => Escape::Class(PerlClass::Digit.to_class(c == 'D')),
            'w' | 'W' => Escape::Class(PerlClass::Word.to_class(c == 'W')),
            's' | 'S' => Escape::Class(PerlClass::Space.to_class(c == 'S')),
            'p' | 'P' => return self.take_unicode_class(rest, position, c == 'P'),
            'A' if !in_class => Escape::Anchor(AnchorKind::StartText),
            'z' if !in_class => Escape::Anchor(AnchorKind::EndText),
            'b' if !in_class => Escape::Anchor(AnchorKind::WordBoundary),
            'B' if !in_class => Escape::Anchor(AnchorKind::NotWordBoundary),
            '1'..='9' if !in_class => {
                let digits_end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                let (more_digits, rest) = rest.split_at(digits_end);
                let group = format!("{c}{more_digits}").parse().unwrap_or(u32::MAX);
                return Ok((
                    rest,
                    Escape::Unsupported(UnsupportedKind::Backreference(group)),
                ));
            }
            'k' if !in_class => {
                let Some((_, rest)) = rest
                    .strip_prefix('<')
                    .and_then(|rest| rest.split_once('>'))
                else {
                    return Err(invalid);
                };
                return Ok((
                    rest,
                    Escape::Unsupported(UnsupportedKind::NamedBackreference),
                ));
            }
            c if c.is_ascii_punctuation() => Escape::Char(c),
            _ => return Err(invalid),
        };
        return Ok((rest, escape));
    }

    /// `\xHH`, `\uHHHH`, `\x{H..}` or `\u{H..}`, with `rest` after the `x` or `u`.
    fn take_hex(
        &self,
        rest: &'p str,
        position: usize,
        fixed_len: usize,
    ) -> Result<(&'p str, Escape), SyntaxError> {
        let invalid = SyntaxError::new(position, SyntaxErrorKind::InvalidHexEscape);
        let (digits, rest) = if let Some(braced) = rest.strip_prefix('{') {
            let Some((digits, rest)) = braced.split_once('}') else {
                return Err(invalid);
            };
            if digits.is_empty() || digits.len() > 8 {
                return Err(invalid);
            }
            (digits, rest)
        } else {
            let Some(digits) = rest.get(..fixed_len) else {
                return Err(invalid);
            };
            (digits, &rest[fixed_len..])
        };
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid);
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid.clone())?;
        let c = char::from_u32(value).ok_or(invalid)?;
        return Ok((rest, Escape::Char(c)));
    }

    /// `\p{Name}` or `\pN`, with `rest` after the `p`.
    fn take_unicode_class(
        &self,
        rest: &'p str,
        position: usize,
        negated: bool,
    ) -> Result<(&'p str, Escape), SyntaxError> {
        let (name, rest) = if let Some(braced) = rest.strip_prefix('{') {
            let Some((name, rest)) = braced.split_once('}') else {
                return Err(SyntaxError::new(position, SyntaxErrorKind::InvalidEscape));
            };
            (name, rest)
        } else {
            let mut it = rest.chars();
            if it.next().is_none() {
                return Err(SyntaxError::new(position, SyntaxErrorKind::InvalidEscape));
            }
            let rest_after = it.as_str();
            (&rest[..rest.len() - rest_after.len()], rest_after)
        };
        let Some(ranges) = unicode_class(name) else {
            return Err(SyntaxError::new(
                position,
                SyntaxErrorKind::UnknownClassName(name.to_string()),
            ));
        };
        return Ok((rest, Escape::Class(ClassSet::new(ranges.to_vec(), negated))));
    }
}

fn literal(c: char, flags: &Flags) -> Ast {
    if flags.case_insensitive {
        let mut class = ClassSet::from_char(c);
        class.case_fold();
        if class.ranges.len() > 1 {
            return Ast::Class(class);
        }
    }
    return Ast::Literal(c);
}

fn class_node(mut class: ClassSet, flags: &Flags) -> Ast {
    if flags.case_insensitive {
        class.case_fold();
    }
    return Ast::Class(class);
}

fn is_valid_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    return (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
}

/// The characters that can only occur literally if escaped
#[inline]
const fn is_meta_character(c: char) -> bool {
    return matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    );
}
