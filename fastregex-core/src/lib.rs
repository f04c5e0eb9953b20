//! This crate provides the core functionality to the `fastregex` crate:
//! the pattern parser, the automaton compilers, the matching runtime and the code generators
//! behind the `fastregex-macros` procedural macros.
//!
//! A pattern goes through these stages:
//! 1. [`parse_tree::parse`] turns the text into an [`parse_tree::Ast`]
//! 2. [`nfa::NFA::new`] builds a byte-level Thompson NFA, once forwards and once reversed
//! 3. [`engines::dense_dfa::DenseDFA`] determinizes it eagerly, unless it gets too large,
//!    in which case [`engines::lazy_dfa::LazyDFA`] determinizes it on demand
//! 4. with the `jit` feature, the dense DFA is compiled to native code
//! 5. [`prefilter::Prefilter`] picks a scanner for the bytes a match can start with
//!
//! Searches find the end of a match with the forward automaton, its start with the reverse one,
//! and finally recover capture groups by simulating the NFA over just the matched bytes.

use std::{
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use engines::{
    dense_dfa::DenseDFA,
    determinize::MatchKind,
    lazy_dfa::LazyDFA,
    pike_vm::{PikeVM, Window},
    search::{self, Meter, SearchError},
};

pub mod byte_classes;
pub mod captures;
pub mod char_class;
pub mod codegen;
pub mod config;
pub mod engines;
pub mod error;
pub mod interface;
#[cfg(feature = "jit")]
pub mod jit;
pub mod look;
pub mod nfa;
pub mod parse_tree;
pub mod prefilter;
pub mod replace;

pub use captures::{Captures, Match};
pub use config::{Config, ConfigBuilder, VectorWidth};
pub use engines::search::SearchStats;
pub use error::{Error, MatchError, SyntaxError, SyntaxErrorKind, UnsupportedKind};
pub use replace::{NoExpand, Replacer};

use nfa::{Direction, NFA};
use prefilter::Prefilter;

/// Which automaton finds the end of each match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Native code generated from the dense DFA.
    Jit,
    Dense,
    Lazy,
    /// Every search simulates the NFA.
    Nfa,
}
impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(match self {
            EngineKind::Jit => "JIT",
            EngineKind::Dense => "dense DFA",
            EngineKind::Lazy => "lazy DFA",
            EngineKind::Nfa => "NFA simulation",
        });
    }
}

#[derive(Debug)]
enum Forward {
    #[cfg(feature = "jit")]
    Jit(jit::JitDfa),
    Dense(DenseDFA),
    Lazy(LazyDFA),
}
impl Forward {
    fn find_end(
        &self,
        prefilter: Option<&Prefilter>,
        haystack: &[u8],
        start: usize,
        earliest: bool,
        meter: &mut Meter,
    ) -> Result<Option<usize>, SearchError> {
        return match self {
            #[cfg(feature = "jit")]
            Forward::Jit(dfa) => search::find_end(dfa, prefilter, haystack, start, earliest, meter),
            Forward::Dense(dfa) => search::find_end(dfa, prefilter, haystack, start, earliest, meter),
            Forward::Lazy(dfa) => search::find_end(dfa, prefilter, haystack, start, earliest, meter),
        };
    }
}

#[derive(Debug)]
enum Reverse {
    Dense(DenseDFA),
    Lazy(LazyDFA),
}
impl Reverse {
    fn find_start(
        &self,
        haystack: &[u8],
        lower: usize,
        end: usize,
        meter: &mut Meter,
    ) -> Result<Option<usize>, SearchError> {
        return match self {
            Reverse::Dense(dfa) => search::find_start(dfa, haystack, lower, end, meter),
            Reverse::Lazy(dfa) => search::find_start(dfa, haystack, lower, end, meter),
        };
    }
}

/// Everything but the NFA, which is absent when only NFA simulation is used.
#[derive(Debug)]
struct Dfas {
    forward: Forward,
    reverse: Reverse,
    prefilter: Option<Prefilter>,
}

/// A compiled regular expression.
///
/// Compiling is relatively expensive, so compile once and search many times.
/// A `Regex` is immutable and can be shared between threads.
/// The only state shared between searches is the lazy DFA's cache, which is internally locked.
///
/// Haystacks are arbitrary bytes, and every span is a byte offset.
/// Any `&str` or `&[u8]` can be searched.
pub struct Regex {
    pattern: String,
    config: Config,
    /// Kept for capture groups and as the fallback when the lazy DFA's cache fills up.
    nfa: Arc<NFA>,
    dfas: Option<Dfas>,
    capture_names: Arc<[Option<String>]>,
    compile_time: Duration,
}
impl Regex {
    /// Compiles `pattern` with the default [`Config`].
    ///
    /// ## Errors
    /// See [`Regex::with_config`].
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        return Regex::with_config(pattern, Config::default());
    }

    /// ## Errors
    /// - [`Error::Syntax`] if `pattern` is malformed
    /// - [`Error::UnsupportedConstruct`] for backreferences, look-around and other constructs
    ///   that no finite automaton can express
    /// - [`Error::PatternTooLarge`] if the NFA would need more than [`Config::nfa_size_limit`] states
    /// - [`Error::InternalInvariantViolation`] if generated native code disagrees with its DFA
    pub fn with_config(pattern: &str, config: Config) -> Result<Regex, Error> {
        let started = Instant::now();
        let parsed = parse_tree::parse(pattern, &config)?;
        let nfa = Arc::new(NFA::new(&parsed, Direction::Forward, &config)?);
        let capture_names: Arc<[Option<String>]> = parsed.capture_names.clone().into();

        let dfas = if config.nfa_only() {
            None
        } else {
            let reverse_nfa = NFA::new(&parsed, Direction::Reverse, &config)?;
            let forward =
                match DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, config.max_dfa_states()) {
                    Some(dfa) => native_or_table(dfa, &config)?,
                    None => Forward::Lazy(LazyDFA::new(
                        Arc::clone(&nfa),
                        MatchKind::LeftmostFirst,
                        false,
                        config.lazy_cache_capacity(),
                    )),
                };
            let reverse =
                match DenseDFA::new(&reverse_nfa, MatchKind::All, true, config.max_dfa_states()) {
                    Some(dfa) => Reverse::Dense(dfa),
                    None => Reverse::Lazy(LazyDFA::new(
                        Arc::new(reverse_nfa),
                        MatchKind::All,
                        true,
                        config.lazy_cache_capacity(),
                    )),
                };
            let prefilter = match config.prefilter() {
                true => Prefilter::from_nfa(&nfa, config.vector_width()),
                false => None,
            };
            Some(Dfas {
                forward,
                reverse,
                prefilter,
            })
        };

        let regex = Regex {
            pattern: pattern.to_owned(),
            config,
            nfa,
            dfas,
            capture_names,
            compile_time: started.elapsed(),
        };
        log::debug!(
            "compiled {pattern:?} using {} in {:?}",
            regex.engine(),
            regex.compile_time
        );
        return Ok(regex);
    }

    pub fn as_str(&self) -> &str {
        return &self.pattern;
    }
    pub const fn config(&self) -> &Config {
        return &self.config;
    }

    /// The automaton that finds the end of each match.
    pub fn engine(&self) -> EngineKind {
        return match &self.dfas {
            None => EngineKind::Nfa,
            #[cfg(feature = "jit")]
            Some(Dfas {
                forward: Forward::Jit(_),
                ..
            }) => EngineKind::Jit,
            Some(Dfas {
                forward: Forward::Dense(_),
                ..
            }) => EngineKind::Dense,
            Some(Dfas {
                forward: Forward::Lazy(_),
                ..
            }) => EngineKind::Lazy,
        };
    }

    /// Whether the forward automaton runs as generated native code.
    pub fn is_jit_compiled(&self) -> bool {
        return self.engine() == EngineKind::Jit;
    }

    /// How long [`Regex::with_config`] took to build every automaton.
    pub const fn compile_time(&self) -> Duration {
        return self.compile_time;
    }

    /// The vector width the prefilter scans with on this CPU.
    ///
    /// Never [`VectorWidth::Auto`]: that is resolved to the widest width the CPU supports.
    pub fn vector_width(&self) -> VectorWidth {
        let prefilter = self.dfas.as_ref().and_then(|dfas| dfas.prefilter.as_ref());
        return match prefilter {
            Some(Prefilter::Ranges(scanner)) => scanner.width(),
            _ => prefilter::resolve_width(self.config.vector_width()),
        };
    }

    /// The number of capture groups, including group `0` (the whole match).
    pub fn capture_count(&self) -> usize {
        return self.capture_names.len();
    }

    /// The name of every capture group, in order. Group `0` is never named.
    pub fn capture_names(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        return self.capture_names.iter().map(Option::as_deref);
    }

    fn meter(&self) -> Meter {
        return Meter::new(self.config.step_budget());
    }

    /// Whether there is any match in `haystack`.
    ///
    /// This stops as soon as a match is certain, so it can be much cheaper than [`Regex::find`].
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
    pub fn is_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> Result<bool, MatchError> {
        let haystack = haystack.as_ref();
        let mut meter = self.meter();
        if let Some(dfas) = &self.dfas {
            let prefilter = dfas.prefilter.as_ref();
            match dfas
                .forward
                .find_end(prefilter, haystack, 0, true, &mut meter)
            {
                Ok(end) => return Ok(end.is_some()),
                Err(SearchError::Match(err)) => return Err(err),
                Err(SearchError::CacheFull) => {
                    log::trace!("lazy DFA cache is full, simulating the NFA instead");
                }
            }
        }
        let found = self.simulate(haystack, 0, true, &mut meter)?;
        return Ok(found.is_some());
    }

    /// Whether the pattern matches all of `haystack`, from the first byte to the last.
    ///
    /// Unlike `find`, this ignores which alternative is preferred: `a|ab` fully matches `ab`.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
    pub fn is_full_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> Result<bool, MatchError> {
        let haystack = haystack.as_ref();
        let mut meter = self.meter();
        if let Some(dfas) = &self.dfas {
            // anchored at the end and reporting every match, so a start at 0 spans everything
            match dfas.reverse.find_start(haystack, 0, haystack.len(), &mut meter) {
                Ok(start) => return Ok(start == Some(0)),
                Err(SearchError::Match(err)) => return Err(err),
                Err(SearchError::CacheFull) => {
                    log::trace!("lazy DFA cache is full, simulating the NFA instead");
                }
            }
        }
        return PikeVM::new(&self.nfa).accepts(haystack, 0, haystack.len(), &mut meter);
    }

    /// Finds the leftmost-first match in `haystack`.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
    pub fn find<'h, H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &'h H,
    ) -> Result<Option<Match<'h>>, MatchError> {
        return self.find_at(haystack, 0);
    }

    /// Finds the leftmost-first match beginning at or after `start`.
    ///
    /// Assertions still see the bytes before `start`, so `\b` and `^` behave as they would
    /// in a search of the whole haystack.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
    pub fn find_at<'h, H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &'h H,
        start: usize,
    ) -> Result<Option<Match<'h>>, MatchError> {
        let haystack = haystack.as_ref();
        let mut meter = self.meter();
        let slots = self.search_slots(haystack, start, false, &mut meter)?;
        return Ok(slots.and_then(|slots| span(&slots, haystack)));
    }

    /// Like [`Regex::find_at`], also reporting the work the search did.
    pub fn find_at_with_stats<'h, H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &'h H,
        start: usize,
    ) -> (Result<Option<Match<'h>>, MatchError>, SearchStats) {
        let haystack = haystack.as_ref();
        let mut meter = self.meter();
        let found = self
            .search_slots(haystack, start, false, &mut meter)
            .map(|slots| slots.and_then(|slots| span(&slots, haystack)));
        return (found, meter.stats());
    }

    /// Finds the leftmost-first match and the spans of its capture groups.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
    pub fn captures<'h, H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &'h H,
    ) -> Result<Option<Captures<'h>>, MatchError> {
        return self.captures_at(haystack, 0);
    }

    /// Like [`Regex::captures`], for matches beginning at or after `start`.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
    pub fn captures_at<'h, H: AsRef<[u8]> + ?Sized>(
        &self,
        haystack: &'h H,
        start: usize,
    ) -> Result<Option<Captures<'h>>, MatchError> {
        let haystack = haystack.as_ref();
        let mut meter = self.meter();
        let slots = self.search_slots(haystack, start, true, &mut meter)?;
        return Ok(slots.map(|slots| Captures::new(haystack, slots, Arc::clone(&self.capture_names))));
    }

    /// Every non-overlapping match, from left to right.
    pub fn find_iter<'r, 'h, H: AsRef<[u8]> + ?Sized>(
        &'r self,
        haystack: &'h H,
    ) -> FindMatches<'r, 'h> {
        return FindMatches {
            regex: self,
            haystack: haystack.as_ref(),
            next: Some(0),
        };
    }

    /// The capture groups of every non-overlapping match, from left to right.
    pub fn captures_iter<'r, 'h, H: AsRef<[u8]> + ?Sized>(
        &'r self,
        haystack: &'h H,
    ) -> CapturesMatches<'r, 'h> {
        return CapturesMatches {
            regex: self,
            haystack: haystack.as_ref(),
            next: Some(0),
        };
    }

    /// Replaces the first match.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if a search exceeds [`Config::step_budget`].
    pub fn replace<H: AsRef<[u8]> + ?Sized, R: Replacer>(
        &self,
        haystack: &H,
        replacer: R,
    ) -> Result<Vec<u8>, MatchError> {
        return self.replacen(haystack, 1, replacer);
    }

    /// Replaces every match.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if a search exceeds [`Config::step_budget`].
    pub fn replace_all<H: AsRef<[u8]> + ?Sized, R: Replacer>(
        &self,
        haystack: &H,
        replacer: R,
    ) -> Result<Vec<u8>, MatchError> {
        return self.replacen(haystack, 0, replacer);
    }

    /// Replaces the first `limit` matches, or every match if `limit` is `0`.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if a search exceeds [`Config::step_budget`].
    pub fn replacen<H: AsRef<[u8]> + ?Sized, R: Replacer>(
        &self,
        haystack: &H,
        limit: usize,
        mut replacer: R,
    ) -> Result<Vec<u8>, MatchError> {
        let haystack = haystack.as_ref();
        let limit = match limit {
            0 => usize::MAX,
            limit => limit,
        };
        let mut out = Vec::with_capacity(haystack.len());
        let mut last = 0;
        match replacer.no_expansion().map(std::borrow::Cow::into_owned) {
            Some(fixed) => {
                for found in self.find_iter(haystack).take(limit) {
                    let found = found?;
                    out.extend_from_slice(&haystack[last..found.start()]);
                    out.extend_from_slice(&fixed);
                    last = found.end();
                }
            }
            None => {
                for caps in self.captures_iter(haystack).take(limit) {
                    let caps = caps?;
                    let found = caps.get_match();
                    out.extend_from_slice(&haystack[last..found.start()]);
                    replacer.replace_append(&caps, &mut out);
                    last = found.end();
                }
            }
        }
        out.extend_from_slice(&haystack[last..]);
        return Ok(out);
    }

    /// Runs the whole search pipeline.
    ///
    /// ## Params
    /// - `groups` resolves every capture group rather than only group `0`
    ///
    /// ## Returns
    /// The capture slots of the leftmost-first match at or after `start`.
    /// Only the first two are guaranteed to be present unless `groups` is set.
    fn search_slots(
        &self,
        haystack: &[u8],
        start: usize,
        groups: bool,
        meter: &mut Meter,
    ) -> Result<Option<Vec<Option<usize>>>, MatchError> {
        if start > haystack.len() {
            return Ok(None);
        }
        let Some(dfas) = &self.dfas else {
            return self.simulate(haystack, start, false, meter);
        };

        let (begin, end) = match self.locate(dfas, haystack, start, meter) {
            Ok(Some(span)) => span,
            Ok(None) => return Ok(None),
            Err(SearchError::Match(err)) => return Err(err),
            Err(SearchError::CacheFull) => {
                log::trace!("lazy DFA cache is full, simulating the NFA instead");
                return self.simulate(haystack, start, false, meter);
            }
        };
        if !groups || self.capture_count() == 1 {
            return Ok(Some(vec![Some(begin), Some(end)]));
        }

        let window = Window {
            start: begin,
            end,
            anchored: true,
            earliest: false,
        };
        return match PikeVM::new(&self.nfa).search(haystack, window, meter)? {
            Some(mut slots) => {
                slots[0] = Some(begin);
                slots[1] = Some(end);
                Ok(Some(slots))
            }
            None => {
                log::trace!("no NFA match inside {begin}..{end}, simulating the NFA from {start}");
                self.simulate(haystack, start, false, meter)
            }
        };
    }

    /// Finds the span of the leftmost-first match with the DFAs alone.
    fn locate(
        &self,
        dfas: &Dfas,
        haystack: &[u8],
        start: usize,
        meter: &mut Meter,
    ) -> Result<Option<(usize, usize)>, SearchError> {
        let prefilter = dfas.prefilter.as_ref();
        let Some(end) = dfas
            .forward
            .find_end(prefilter, haystack, start, false, meter)?
        else {
            return Ok(None);
        };
        return match dfas.reverse.find_start(haystack, start, end, meter)? {
            Some(begin) => Ok(Some((begin, end))),
            // never expected for a forward match, so let the NFA decide
            None => Err(SearchError::CacheFull),
        };
    }

    /// Searches with NFA simulation alone, which always resolves every capture group.
    fn simulate(
        &self,
        haystack: &[u8],
        start: usize,
        earliest: bool,
        meter: &mut Meter,
    ) -> Result<Option<Vec<Option<usize>>>, MatchError> {
        let window = Window {
            start,
            end: haystack.len(),
            anchored: false,
            earliest,
        };
        return PikeVM::new(&self.nfa).search(haystack, window, meter);
    }
}
impl std::fmt::Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(&self.pattern);
    }
}
impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f
            .debug_struct("Regex")
            .field("pattern", &self.pattern)
            .field("engine", &self.engine())
            .field("capture_count", &self.capture_count())
            .finish_non_exhaustive();
    }
}
impl std::str::FromStr for Regex {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return Regex::new(s);
    }
}

/// Picks generated code over the transition table when the JIT is available and accepts the DFA.
#[cfg(feature = "jit")]
fn native_or_table(dfa: DenseDFA, config: &Config) -> Result<Forward, Error> {
    return match jit::JitDfa::emit(&dfa, config) {
        Ok(native) => {
            native.verify()?;
            Ok(Forward::Jit(native))
        }
        Err(declined) => {
            log::debug!("{declined}");
            Ok(Forward::Dense(dfa))
        }
    };
}
#[cfg(not(feature = "jit"))]
fn native_or_table(dfa: DenseDFA, config: &Config) -> Result<Forward, Error> {
    if config.jit() {
        log::debug!(
            "{}",
            error::CodegenUnavailable::new("built without the `jit` feature")
        );
    }
    return Ok(Forward::Dense(dfa));
}

fn span<'h>(slots: &[Option<usize>], haystack: &'h [u8]) -> Option<Match<'h>> {
    return match slots {
        [Some(start), Some(end), ..] => Some(Match::new(haystack, *start, *end)),
        _ => None,
    };
}

/// Where the search after a match begins. An empty match moves one byte ahead,
/// so that iteration always makes progress.
const fn next_start(start: usize, end: usize) -> usize {
    return match start == end {
        true => end + 1,
        false => end,
    };
}

/// Iterator over every non-overlapping match. See [`Regex::find_iter`].
///
/// Iteration stops after the first error.
#[derive(Debug, Clone)]
pub struct FindMatches<'r, 'h> {
    regex: &'r Regex,
    haystack: &'h [u8],
    next: Option<usize>,
}
impl<'r, 'h> FindMatches<'r, 'h> {
    /// Starts over from the beginning of the haystack.
    pub fn restart(&mut self) {
        self.next = Some(0);
    }
}
impl<'r, 'h> Iterator for FindMatches<'r, 'h> {
    type Item = Result<Match<'h>, MatchError>;
    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        return match self.regex.find_at(self.haystack, start) {
            Ok(Some(found)) => {
                self.next = Some(next_start(found.start(), found.end()));
                Some(Ok(found))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        };
    }
}
impl<'r, 'h> std::iter::FusedIterator for FindMatches<'r, 'h> {}

/// Iterator over the capture groups of every non-overlapping match. See [`Regex::captures_iter`].
///
/// Iteration stops after the first error.
#[derive(Debug, Clone)]
pub struct CapturesMatches<'r, 'h> {
    regex: &'r Regex,
    haystack: &'h [u8],
    next: Option<usize>,
}
impl<'r, 'h> CapturesMatches<'r, 'h> {
    /// Starts over from the beginning of the haystack.
    pub fn restart(&mut self) {
        self.next = Some(0);
    }
}
impl<'r, 'h> Iterator for CapturesMatches<'r, 'h> {
    type Item = Result<Captures<'h>, MatchError>;
    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        return match self.regex.captures_at(self.haystack, start) {
            Ok(Some(caps)) => {
                let found = caps.get_match();
                self.next = Some(next_start(found.start(), found.end()));
                Some(Ok(caps))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        };
    }
}
impl<'r, 'h> std::iter::FusedIterator for CapturesMatches<'r, 'h> {}

/// Used by the `regex!` macro, after the pattern was already validated when the macro expanded.
///
/// # Panics
///
/// If `pattern` does not compile with the default [`Config`], which the macro checked at build time.
#[doc(hidden)]
pub fn __lazy_regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    return cell.get_or_init(|| match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("pattern {pattern:?} compiled at build time but not at run time: {err}"),
    });
}
