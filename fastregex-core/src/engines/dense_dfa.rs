//! A fully built DFA stored as one flat transition table.
//!
//! Rows are indexed by state and columns by byte class, with one extra column for the end of input.
//! State `0` is always the dead state.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    ops::RangeInclusive,
};

use super::{
    determinize::{Determinizer, MatchKind, StateKey},
    Automaton, CacheFull, StateID,
};
use crate::{byte_classes::ByteClasses, look::Context, nfa::NFA};

pub const DEAD: StateID = 0;

#[derive(Debug, Clone)]
pub struct DenseDFA {
    pub(crate) classes: ByteClasses,
    /// Number of columns: one per class plus the end-of-input column.
    pub(crate) stride: usize,
    pub(crate) table: Vec<StateID>,
    pub(crate) is_match: Vec<bool>,
    pub(crate) is_start: Vec<bool>,
    /// Indexed by [`Context`].
    pub(crate) starts: [StateID; 4],
}
impl DenseDFA {
    /// Runs the subset construction to completion.
    ///
    /// ## Params
    /// - `anchored` builds from the NFA's anchored start instead of the unanchored one
    /// - `max_states` caps the number of states (including the dead state)
    ///
    /// ## Returns
    /// `None` if the DFA would need more than `max_states` states.
    pub fn new(nfa: &NFA, kind: MatchKind, anchored: bool, max_states: usize) -> Option<DenseDFA> {
        let determinizer = Determinizer::new(nfa, kind, anchored);
        let classes = ByteClasses::from_nfa(nfa);
        let representatives: Vec<u8> = classes.representatives().collect();
        let stride = classes.alphabet_len() + 1;

        let mut builder = TableBuilder {
            keys: Vec::new(),
            ids: HashMap::new(),
            table: Vec::new(),
            stride,
            max_states,
        };
        builder.insert(StateKey::dead())?;

        let mut starts = [DEAD; 4];
        for context in Context::ALL {
            starts[context as usize] = builder.insert(determinizer.start_key(context))?;
        }

        // The dead state keeps its all-zero row
        let mut queue: VecDeque<usize> = (1..builder.keys.len()).collect();
        while let Some(state) = queue.pop_front() {
            let key = builder.keys[state].clone();
            for (class, byte) in representatives.iter().enumerate() {
                let before = builder.keys.len();
                let next = builder.insert(determinizer.next_key(&key, *byte))?;
                if builder.keys.len() > before {
                    queue.push_back(next as usize);
                }
                builder.table[state * stride + class] = next;
            }
            let before = builder.keys.len();
            let eoi = builder.insert(determinizer.eoi_key(&key))?;
            if builder.keys.len() > before {
                queue.push_back(eoi as usize);
            }
            builder.table[state * stride + stride - 1] = eoi;
        }

        let is_match = builder.keys.iter().map(|key| key.is_match).collect();
        let mut is_start = vec![false; builder.keys.len()];
        for start in starts {
            is_start[start as usize] = true;
        }
        let dfa = DenseDFA {
            classes,
            stride,
            table: builder.table,
            is_match,
            is_start,
            starts,
        };
        let before = dfa.state_count();
        let dfa = dfa.minimize();
        log::debug!(
            "built dense DFA with {before} states ({} after minimization, {} byte classes)",
            dfa.state_count(),
            dfa.classes.alphabet_len()
        );
        return Some(dfa);
    }

    pub fn state_count(&self) -> usize {
        return self.is_match.len();
    }
    pub const fn classes(&self) -> &ByteClasses {
        return &self.classes;
    }
    pub const fn stride(&self) -> usize {
        return self.stride;
    }
    pub fn start(&self, context: Context) -> StateID {
        return self.starts[context as usize];
    }
    /// The transition from `state` on byte class `class`. The last class is the end of input.
    #[inline(always)]
    pub fn next_class(&self, state: StateID, class: usize) -> StateID {
        return self.table[state as usize * self.stride + class];
    }

    /// The byte transitions of `state` as maximal runs of bytes with the same target, in ascending order.
    pub fn byte_runs(&self, state: StateID) -> Vec<(RangeInclusive<u8>, StateID)> {
        let mut runs: Vec<(RangeInclusive<u8>, StateID)> = Vec::new();
        for b in 0..=255u8 {
            let target = self.next_class(state, self.classes.get(b) as usize);
            match runs.last_mut() {
                Some((range, last)) if *last == target => *range = *range.start()..=b,
                _ => runs.push((b..=b, target)),
            }
        }
        return runs;
    }

    /// Merges indistinguishable states using Moore's partition refinement.
    ///
    /// Blocks are numbered in order of their first state, so the dead state stays `0`.
    fn minimize(self) -> DenseDFA {
        let n = self.state_count();
        let mut block: Vec<usize> = self.is_match.iter().map(|m| *m as usize).collect();
        let mut block_count = block.iter().collect::<HashSet<_>>().len();
        loop {
            let mut signatures: HashMap<(usize, Vec<usize>), usize> = HashMap::new();
            let refined: Vec<usize> = (0..n)
                .map(|state| {
                    let row = &self.table[state * self.stride..(state + 1) * self.stride];
                    let signature = (
                        block[state],
                        row.iter().map(|next| block[*next as usize]).collect(),
                    );
                    let fresh = signatures.len();
                    return *signatures.entry(signature).or_insert(fresh);
                })
                .collect();
            block = refined;
            if signatures.len() == block_count {
                break;
            }
            block_count = signatures.len();
        }

        let mut representative = vec![usize::MAX; block_count];
        for (state, b) in block.iter().enumerate() {
            if representative[*b] == usize::MAX {
                representative[*b] = state;
            }
        }
        let mut table = Vec::with_capacity(block_count * self.stride);
        for state in &representative {
            let row = &self.table[state * self.stride..(state + 1) * self.stride];
            table.extend(row.iter().map(|next| block[*next as usize] as StateID));
        }
        let is_match = representative.iter().map(|s| self.is_match[*s]).collect();
        let mut is_start = vec![false; block_count];
        for (state, start) in self.is_start.iter().enumerate() {
            if *start {
                is_start[block[state]] = true;
            }
        }
        let starts = self.starts.map(|s| block[s as usize] as StateID);

        return DenseDFA {
            classes: self.classes,
            stride: self.stride,
            table,
            is_match,
            is_start,
            starts,
        };
    }
}
impl Automaton for DenseDFA {
    #[inline]
    fn start_state(&self, context: Context) -> Result<StateID, CacheFull> {
        return Ok(self.start(context));
    }
    #[inline(always)]
    fn next_state(&self, state: StateID, byte: u8) -> Result<StateID, CacheFull> {
        return Ok(self.next_class(state, self.classes.get(byte) as usize));
    }
    #[inline]
    fn next_eoi_state(&self, state: StateID) -> Result<StateID, CacheFull> {
        return Ok(self.next_class(state, self.stride - 1));
    }
    #[inline(always)]
    fn is_match_state(&self, state: StateID) -> bool {
        return self.is_match[state as usize];
    }
    #[inline(always)]
    fn is_dead_state(&self, state: StateID) -> bool {
        return state == DEAD;
    }
    #[inline(always)]
    fn is_start_state(&self, state: StateID) -> bool {
        return self.is_start[state as usize];
    }
}
impl std::fmt::Display for DenseDFA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for state in 0..self.state_count() {
            let kind = match (self.is_match[state], self.is_start[state]) {
                (true, true) => "match, start",
                (true, false) => "match",
                (false, true) => "start",
                (false, false) => "",
            };
            writeln!(f, "{state} ({kind}):")?;
            for class in 0..self.classes.alphabet_len() {
                let next = self.next_class(state as StateID, class);
                if next != DEAD {
                    let range = crate::byte_classes::DisplayRange(self.classes.range(class as u8));
                    writeln!(f, "  {range} => {next}")?;
                }
            }
            let eoi = self.next_class(state as StateID, self.stride - 1);
            if eoi != DEAD {
                writeln!(f, "  EOI => {eoi}")?;
            }
        }
        return Ok(());
    }
}

/// The state table while it is being discovered.
struct TableBuilder {
    keys: Vec<StateKey>,
    ids: HashMap<StateKey, StateID>,
    table: Vec<StateID>,
    stride: usize,
    max_states: usize,
}
impl TableBuilder {
    /// Returns the existing state for `key`, or adds a new one with an empty row.
    fn insert(&mut self, key: StateKey) -> Option<StateID> {
        if let Some(id) = self.ids.get(&key) {
            return Some(*id);
        }
        if self.keys.len() >= self.max_states {
            return None;
        }
        let id = self.keys.len() as StateID;
        self.keys.push(key.clone());
        self.ids.insert(key, id);
        self.table.extend(std::iter::repeat(DEAD).take(self.stride));
        return Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, nfa::Direction, parse_tree::parse};

    fn build(pattern: &str) -> DenseDFA {
        let config = Config::default();
        let parsed = parse(pattern, &config).unwrap();
        let nfa = NFA::new(&parsed, Direction::Forward, &config).unwrap();
        return DenseDFA::new(&nfa, MatchKind::LeftmostFirst, true, 10_000).unwrap();
    }

    /// Whether the whole haystack is matched by an anchored DFA.
    fn full_match(dfa: &DenseDFA, haystack: &[u8]) -> bool {
        let mut state = dfa.start(Context::Text);
        let mut last_end = None;
        for (i, b) in haystack.iter().enumerate() {
            state = dfa.next_state(state, *b).unwrap();
            if dfa.is_match_state(state) {
                last_end = Some(i);
            }
            if dfa.is_dead_state(state) {
                return false;
            }
        }
        state = dfa.next_eoi_state(state).unwrap();
        if dfa.is_match_state(state) {
            last_end = Some(haystack.len());
        }
        return last_end == Some(haystack.len());
    }

    #[test]
    fn phone_number() {
        let dfa = build(r"^\d{3}-\d{4}$");
        assert!(full_match(&dfa, b"123-4567"));
        assert!(!full_match(&dfa, b"12-3456"));
        assert!(!full_match(&dfa, b"123-45678"));
        assert!(dfa.is_dead_state(0));
    }

    #[test]
    fn minimization_merges_equivalent_states() {
        // Both alternatives lead to the same suffix language, so `b` and `c` should share a state
        let dfa = build("(?:b|c)d");
        let start = dfa.start(Context::Text);
        assert_eq!(
            dfa.next_state(start, b'b').unwrap(),
            dfa.next_state(start, b'c').unwrap()
        );
        // dead, start, after [bc], after d, and the delayed match
        assert_eq!(dfa.state_count(), 5);
    }

    #[test]
    fn state_cap() {
        let config = Config::default();
        let parsed = parse("[ab]*a[ab]{8}", &config).unwrap();
        let nfa = NFA::new(&parsed, Direction::Forward, &config).unwrap();
        assert!(DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, 64).is_none());
        assert!(DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, 0).is_none());
        assert!(DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, 10_000).is_some());
    }

    #[test]
    fn unanchored_start_is_revisited() {
        let config = Config::default();
        let parsed = parse("abc", &config).unwrap();
        let nfa = NFA::new(&parsed, Direction::Forward, &config).unwrap();
        let dfa = DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, 10_000).unwrap();
        let start = dfa.start(Context::Text);
        assert!(dfa.is_start_state(start));
        assert_eq!(dfa.next_state(start, b'x').unwrap(), start);
        let after_a = dfa.next_state(start, b'a').unwrap();
        assert!(!dfa.is_start_state(after_a));
    }
}
