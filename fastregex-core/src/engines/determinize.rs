//! Subset construction shared by [`super::dense_dfa::DenseDFA`] and [`super::lazy_dfa::LazyDFA`].
//!
//! A DFA state is labelled by a [`StateKey`]: the NFA states reached by the last byte (before
//! their epsilon closure is taken), the context of that byte, and whether a match ended just
//! before it. The closure is only taken on the *next* transition, once the following byte is
//! known, which is what lets look-around assertions be resolved exactly. The price is that
//! matches are reported one byte late.
//!
//! For more information, read https://en.wikipedia.org/wiki/Powerset_construction

use std::collections::HashSet;

use crate::{
    look::Context,
    nfa::{EpsilonType, NFA},
};

/// How the closure treats the accept state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Once the accept state is reached, lower-priority threads are dropped.
    /// Used by the forward DFA so that it reports the end of the leftmost-first match.
    LeftmostFirst,
    /// Every thread keeps running. Used by the reverse DFA, which needs every possible start.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    /// In priority order, without duplicates.
    pub(crate) seeds: Vec<usize>,
    pub(crate) prev: Context,
    /// A match ended right before the byte that led to this state.
    pub(crate) is_match: bool,
}
impl StateKey {
    pub fn dead() -> StateKey {
        return StateKey {
            seeds: Vec::new(),
            prev: Context::Text,
            is_match: false,
        };
    }
    pub fn is_dead(&self) -> bool {
        return self.seeds.is_empty() && !self.is_match;
    }
}

pub struct Determinizer<'a> {
    nfa: &'a NFA,
    kind: MatchKind,
    start: usize,
}
impl<'a> Determinizer<'a> {
    /// ## Params
    /// - `anchored` picks the NFA's anchored start instead of the unanchored one
    pub fn new(nfa: &'a NFA, kind: MatchKind, anchored: bool) -> Determinizer<'a> {
        let start = if anchored {
            nfa.start_anchored()
        } else {
            nfa.start_unanchored()
        };
        return Determinizer { nfa, kind, start };
    }

    pub fn start_key(&self, context: Context) -> StateKey {
        return StateKey {
            seeds: vec![self.start],
            prev: context.normalize(self.nfa.looks()),
            is_match: false,
        };
    }

    pub fn next_key(&self, key: &StateKey, byte: u8) -> StateKey {
        let (closure, is_match) = self.closure(&key.seeds, key.prev, Some(byte));
        let mut seeds: Vec<usize> = closure
            .iter()
            .flat_map(|state| self.nfa.states()[*state].transitions())
            .filter(|t| t.check(byte))
            .map(|t| t.to())
            .collect();
        // lower priority threads in the same NFA state can never win
        seeds.dedup_by_key_all(|state| *state);

        let prev = if seeds.is_empty() {
            Context::Text
        } else {
            Context::of_byte(byte).normalize(self.nfa.looks())
        };
        return StateKey {
            seeds,
            prev,
            is_match,
        };
    }

    /// The state after the end of input. It has no seeds, so it only records whether there was a match.
    pub fn eoi_key(&self, key: &StateKey) -> StateKey {
        let (_, is_match) = self.closure(&key.seeds, key.prev, None);
        return StateKey {
            seeds: Vec::new(),
            prev: Context::Text,
            is_match,
        };
    }

    /// Takes the ordered epsilon closure of `seeds` at a position preceded by `prev` and followed by `next`.
    ///
    /// ## Returns
    /// `(states, matched)` where `states` are the closure's states that have byte transitions,
    /// in priority order, and `matched` is whether the accept state was reached.
    fn closure(&self, seeds: &[usize], prev: Context, next: Option<u8>) -> (Vec<usize>, bool) {
        let states = self.nfa.states();
        let accept = self.nfa.accept();
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        let mut matched = false;
        let mut stack = Vec::new();
        for seed in seeds {
            stack.push(*seed);
            while let Some(state) = stack.pop() {
                if !visited.insert(state) {
                    continue;
                }
                if state == accept {
                    matched = true;
                    if self.kind == MatchKind::LeftmostFirst {
                        return (out, matched);
                    }
                    continue;
                }
                if !states[state].transitions().is_empty() {
                    out.push(state);
                }
                // reversed, so the highest priority epsilon is explored first
                for e in states[state].epsilons().iter().rev() {
                    let passes = match e.special() {
                        EpsilonType::Look(look) => look.matches(prev, next),
                        EpsilonType::None
                        | EpsilonType::StartCapture(_)
                        | EpsilonType::EndCapture(_) => true,
                    };
                    if passes && !visited.contains(&e.to()) {
                        stack.push(e.to());
                    }
                }
            }
        }
        return (out, matched);
    }
}

trait VecExt<T> {
    /// Deduplicates the vector by key, keeping the first occurrence of each key.
    /// Unlike [`Vec::dedup_by_key`], this method removes all duplicates, not just adjacent ones.
    fn dedup_by_key_all<K: Eq + std::hash::Hash>(&mut self, key: impl Fn(&T) -> K);
}
impl<T> VecExt<T> for Vec<T> {
    fn dedup_by_key_all<K: Eq + std::hash::Hash>(&mut self, key: impl Fn(&T) -> K) {
        let mut seen = HashSet::new();
        self.retain(|x| seen.insert(key(x)));
    }
}
