//! Drives the DFAs to find match boundaries.
//!
//! A leftmost-first match is found in two passes. The forward DFA, starting unanchored,
//! finds where the match ends. The reverse DFA then runs backwards from that end and
//! reports the leftmost position the match can start from.

use super::{Automaton, CacheFull, StateID};
use crate::{error::MatchError, look::Context, prefilter::Prefilter};

/// Counters for the work done by one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Transitions taken by the forward and reverse DFAs (or the generated code).
    pub dfa_transitions: u64,
    pub prefilter_calls: u64,
    /// Threads stepped by the NFA simulation.
    pub nfa_steps: u64,
}

/// Counts work against the step budget.
#[derive(Debug, Clone)]
pub struct Meter {
    pub(crate) stats: SearchStats,
    budget: Option<u64>,
}
impl Meter {
    pub const fn new(budget: Option<u64>) -> Meter {
        return Meter {
            stats: SearchStats {
                dfa_transitions: 0,
                prefilter_calls: 0,
                nfa_steps: 0,
            },
            budget,
        };
    }
    pub const fn stats(&self) -> SearchStats {
        return self.stats;
    }
    const fn used(&self) -> u64 {
        return self.stats.dfa_transitions + self.stats.nfa_steps;
    }
    fn check(&self) -> Result<(), MatchError> {
        return match self.budget {
            Some(budget) if self.used() > budget => {
                Err(MatchError::StepBudgetExceeded { budget })
            }
            _ => Ok(()),
        };
    }
    fn exhausted(&self) -> MatchError {
        return MatchError::StepBudgetExceeded {
            budget: self.budget.unwrap_or(self.used()),
        };
    }
    pub fn tick_nfa(&mut self) -> Result<(), MatchError> {
        self.stats.nfa_steps += 1;
        return self.check();
    }
    pub fn tick_dfa(&mut self) -> Result<(), MatchError> {
        self.stats.dfa_transitions += 1;
        return self.check();
    }
    /// The furthest a DFA may run from `pos` before the budget runs out, capped at `len`.
    fn limit(&self, pos: usize, len: usize) -> usize {
        return match self.budget {
            Some(budget) => {
                let remaining = budget.saturating_sub(self.used());
                let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
                pos.saturating_add(remaining).min(len)
            }
            None => len,
        };
    }
}

/// Why a search stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// The lazy DFA is full. The caller retries with NFA simulation.
    CacheFull,
    Match(MatchError),
}
impl From<CacheFull> for SearchError {
    fn from(_: CacheFull) -> Self {
        return SearchError::CacheFull;
    }
}
impl From<MatchError> for SearchError {
    fn from(value: MatchError) -> Self {
        return SearchError::Match(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RunStatus {
    /// Reached the end of the range.
    End = 0,
    /// Entered the dead state.
    Dead = 1,
    /// Returned to a start state before any match was seen.
    Start = 2,
    /// Entered a match state while searching for the earliest match.
    Match = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// The position after the last byte consumed.
    pub pos: usize,
    pub state: StateID,
    /// The end of the latest match seen during this run.
    pub last_match: Option<usize>,
}

/// An automaton that can execute its own inner loop.
pub trait Engine: Automaton {
    /// Feeds `haystack[pos..end]` to the automaton, starting in `state`.
    ///
    /// ## Params
    /// - `earliest` stops at the first match state
    /// - `restart` stops upon returning to a start state, as long as no match has been seen.
    ///   At least one byte is always consumed first.
    fn run(
        &self,
        haystack: &[u8],
        pos: usize,
        end: usize,
        state: StateID,
        earliest: bool,
        restart: bool,
    ) -> Result<RunOutcome, CacheFull>;
}
impl Engine for super::dense_dfa::DenseDFA {
    fn run(
        &self,
        haystack: &[u8],
        pos: usize,
        end: usize,
        state: StateID,
        earliest: bool,
        restart: bool,
    ) -> Result<RunOutcome, CacheFull> {
        return run(self, haystack, pos, end, state, earliest, restart);
    }
}
impl Engine for super::lazy_dfa::LazyDFA {
    fn run(
        &self,
        haystack: &[u8],
        pos: usize,
        end: usize,
        state: StateID,
        earliest: bool,
        restart: bool,
    ) -> Result<RunOutcome, CacheFull> {
        return run(self, haystack, pos, end, state, earliest, restart);
    }
}

/// The table-driven inner loop. See [`Engine::run`].
#[inline]
pub fn run<A: Automaton + ?Sized>(
    dfa: &A,
    haystack: &[u8],
    mut pos: usize,
    end: usize,
    mut state: StateID,
    earliest: bool,
    restart: bool,
) -> Result<RunOutcome, CacheFull> {
    let mut last_match = None;
    while pos < end {
        state = dfa.next_state(state, haystack[pos])?;
        pos += 1;
        let status = if dfa.is_match_state(state) {
            // matches are reported one byte late
            last_match = Some(pos - 1);
            if !earliest {
                continue;
            }
            RunStatus::Match
        } else if dfa.is_dead_state(state) {
            RunStatus::Dead
        } else if restart && last_match.is_none() && dfa.is_start_state(state) {
            RunStatus::Start
        } else {
            continue;
        };
        return Ok(RunOutcome {
            status,
            pos,
            state,
            last_match,
        });
    }
    return Ok(RunOutcome {
        status: RunStatus::End,
        pos,
        state,
        last_match,
    });
}

/// Finds the end of the leftmost-first match beginning at or after `start`.
///
/// ## Params
/// - `earliest` returns as soon as any match is known, which is enough to decide whether one exists
///   but may not be the end of the leftmost-first match.
pub fn find_end<E: Engine + ?Sized>(
    engine: &E,
    prefilter: Option<&Prefilter>,
    haystack: &[u8],
    start: usize,
    earliest: bool,
    meter: &mut Meter,
) -> Result<Option<usize>, SearchError> {
    let len = haystack.len();
    let mut pos = start;
    let mut state = engine.start_state(Context::before(haystack, pos))?;
    let mut last_match = None;
    loop {
        if let Some(prefilter) = prefilter {
            if last_match.is_none() && engine.is_start_state(state) {
                meter.stats.prefilter_calls += 1;
                match prefilter.find(haystack, pos) {
                    None => return Ok(None),
                    Some(candidate) if candidate > pos => {
                        pos = candidate;
                        state = engine.start_state(Context::before(haystack, pos))?;
                    }
                    Some(_) => {}
                }
            }
        }

        let end = meter.limit(pos, len);
        let restart = prefilter.is_some() && last_match.is_none();
        let outcome = engine.run(haystack, pos, end, state, earliest, restart)?;
        meter.stats.dfa_transitions += (outcome.pos - pos) as u64;
        pos = outcome.pos;
        state = outcome.state;
        if outcome.last_match.is_some() {
            last_match = outcome.last_match;
        }
        match outcome.status {
            RunStatus::Match | RunStatus::Dead => return Ok(last_match),
            RunStatus::Start => {}
            RunStatus::End if pos < len => return Err(meter.exhausted().into()),
            RunStatus::End => break,
        }
    }

    let eoi = engine.next_eoi_state(state)?;
    meter.tick_dfa()?;
    if engine.is_match_state(eoi) {
        last_match = Some(len);
    }
    return Ok(last_match);
}

/// Runs the reverse DFA backwards from `end`, down to `lower`.
///
/// ## Returns
/// The smallest `start >= lower` such that `haystack[start..end]` is a match, if any.
pub fn find_start<A: Automaton + ?Sized>(
    dfa: &A,
    haystack: &[u8],
    lower: usize,
    end: usize,
    meter: &mut Meter,
) -> Result<Option<usize>, SearchError> {
    let mut state = dfa.start_state(Context::before_reversed(haystack, end))?;
    let mut start = None;
    let mut pos = end;
    while pos > lower {
        meter.tick_dfa()?;
        pos -= 1;
        state = dfa.next_state(state, haystack[pos])?;
        if dfa.is_match_state(state) {
            start = Some(pos + 1);
        } else if dfa.is_dead_state(state) {
            return Ok(start);
        }
    }

    // Resolve the delayed match at `lower` by peeking at the byte before it
    meter.tick_dfa()?;
    let last = match lower.checked_sub(1) {
        Some(before) => dfa.next_state(state, haystack[before])?,
        None => dfa.next_eoi_state(state)?,
    };
    if dfa.is_match_state(last) {
        start = Some(lower);
    }
    return Ok(start);
}
