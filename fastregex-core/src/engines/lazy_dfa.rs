//! A DFA whose states are discovered during searches.
//!
//! Used when the fully built table would exceed [`crate::config::Config::max_dfa_states`].
//! All searches on a pattern share one cache of discovered states, guarded by a [`RwLock`].
//! Known transitions only need the read lock. On a miss, the next state is computed without
//! holding any lock and then inserted (or, if another thread got there first, looked up)
//! under the write lock, so each distinct state gets exactly one id.
//!
//! State ids carry their match and start flags in the high bits, so those checks never lock.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use super::{
    determinize::{Determinizer, MatchKind, StateKey},
    Automaton, CacheFull, StateID,
};
use crate::{byte_classes::ByteClasses, look::Context, nfa::NFA};

const MATCH_FLAG: StateID = 1 << 31;
const START_FLAG: StateID = 1 << 30;
const INDEX_MASK: StateID = START_FLAG - 1;
/// A transition that has not been computed yet.
const UNKNOWN: StateID = StateID::MAX;
const DEAD: StateID = 0;

#[derive(Debug)]
struct Cache {
    keys: Vec<StateKey>,
    ids: HashMap<StateKey, StateID>,
    /// `keys.len() * stride` entries, [`UNKNOWN`] until computed.
    table: Vec<StateID>,
}

#[derive(Debug)]
pub struct LazyDFA {
    nfa: Arc<NFA>,
    kind: MatchKind,
    anchored: bool,
    classes: ByteClasses,
    stride: usize,
    capacity: usize,
    starts: [StateID; 4],
    cache: RwLock<Cache>,
    warned: AtomicBool,
}
impl LazyDFA {
    /// Creates the DFA with only its dead and start states.
    ///
    /// ## Params
    /// - `capacity` is the most states the cache may hold.
    ///   The dead and start states are always created, even if they alone exceed it.
    pub fn new(nfa: Arc<NFA>, kind: MatchKind, anchored: bool, capacity: usize) -> LazyDFA {
        let classes = ByteClasses::from_nfa(&nfa);
        let stride = classes.alphabet_len() + 1;
        let capacity = capacity.min(INDEX_MASK as usize);
        let mut cache = Cache {
            keys: Vec::new(),
            ids: HashMap::new(),
            table: Vec::new(),
        };
        cache.insert(StateKey::dead(), false, stride);

        let determinizer = Determinizer::new(&nfa, kind, anchored);
        let mut starts = [DEAD; 4];
        for context in Context::ALL {
            let key = determinizer.start_key(context);
            starts[context as usize] = match cache.ids.get(&key) {
                Some(id) => *id,
                None => cache.insert(key, true, stride),
            };
        }

        return LazyDFA {
            nfa,
            kind,
            anchored,
            classes,
            stride,
            capacity,
            starts,
            cache: RwLock::new(cache),
            warned: AtomicBool::new(false),
        };
    }

    /// The number of states discovered so far.
    pub fn state_count(&self) -> usize {
        return self.read_cache().keys.len();
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, Cache> {
        // A panic while holding the lock cannot leave the cache inconsistent,
        // since every write is a single insert-or-get.
        return self.cache.read().unwrap_or_else(PoisonError::into_inner);
    }

    /// Looks up the transition in column `column`, computing it with `step` on a miss.
    fn transition(
        &self,
        state: StateID,
        column: usize,
        step: impl FnOnce(&Determinizer, &StateKey) -> StateKey,
    ) -> Result<StateID, CacheFull> {
        let index = (state & INDEX_MASK) as usize * self.stride + column;
        let key = {
            let cache = self.read_cache();
            let next = cache.table[index];
            if next != UNKNOWN {
                return Ok(next);
            }
            cache.keys[(state & INDEX_MASK) as usize].clone()
        };

        let determinizer = Determinizer::new(&self.nfa, self.kind, self.anchored);
        let next_key = step(&determinizer, &key);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let next = match cache.ids.get(&next_key) {
            Some(id) => *id,
            None => {
                if cache.keys.len() >= self.capacity {
                    if !self.warned.swap(true, Ordering::Relaxed) {
                        log::warn!(
                            "lazy DFA cache is full ({} states), falling back to NFA simulation",
                            self.capacity
                        );
                    }
                    return Err(CacheFull);
                }
                cache.insert(next_key, false, self.stride)
            }
        };
        cache.table[index] = next;
        return Ok(next);
    }
}
impl Cache {
    fn insert(&mut self, key: StateKey, is_start: bool, stride: usize) -> StateID {
        let mut id = self.keys.len() as StateID;
        if key.is_match {
            id |= MATCH_FLAG;
        }
        if is_start {
            id |= START_FLAG;
        }
        self.keys.push(key.clone());
        self.ids.insert(key, id);
        self.table.extend(std::iter::repeat(UNKNOWN).take(stride));
        return id;
    }
}
impl Automaton for LazyDFA {
    fn start_state(&self, context: Context) -> Result<StateID, CacheFull> {
        return Ok(self.starts[context as usize]);
    }
    fn next_state(&self, state: StateID, byte: u8) -> Result<StateID, CacheFull> {
        let class = self.classes.get(byte) as usize;
        return self.transition(state, class, |determinizer, key| determinizer.next_key(key, byte));
    }
    fn next_eoi_state(&self, state: StateID) -> Result<StateID, CacheFull> {
        return self.transition(state, self.stride - 1, |determinizer, key| {
            determinizer.eoi_key(key)
        });
    }
    #[inline(always)]
    fn is_match_state(&self, state: StateID) -> bool {
        return state & MATCH_FLAG != 0;
    }
    #[inline(always)]
    fn is_dead_state(&self, state: StateID) -> bool {
        return state == DEAD;
    }
    #[inline(always)]
    fn is_start_state(&self, state: StateID) -> bool {
        return state & START_FLAG != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, engines::dense_dfa::DenseDFA, nfa::Direction, parse_tree::parse};

    fn nfa(pattern: &str) -> Arc<NFA> {
        let config = Config::default();
        let parsed = parse(pattern, &config).unwrap();
        return Arc::new(NFA::new(&parsed, Direction::Forward, &config).unwrap());
    }

    /// The positions after which the automaton is in a match state.
    fn match_ends(dfa: &impl Automaton, haystack: &[u8]) -> Result<Vec<usize>, CacheFull> {
        let mut state = dfa.start_state(Context::Text)?;
        let mut ends = Vec::new();
        for (i, b) in haystack.iter().enumerate() {
            state = dfa.next_state(state, *b)?;
            if dfa.is_match_state(state) {
                ends.push(i);
            }
            if dfa.is_dead_state(state) {
                return Ok(ends);
            }
        }
        if dfa.is_match_state(dfa.next_eoi_state(state)?) {
            ends.push(haystack.len());
        }
        return Ok(ends);
    }

    #[test]
    fn agrees_with_dense() {
        for (pattern, haystack) in [
            ("a+b", &b"xxaaabyab"[..]),
            (r"\bfoo\b", b"foo food foo"),
            ("(?m)^x$", b"a\nx\nb"),
            ("[a-c]+?d|c", b"abcabd"),
        ] {
            let nfa = nfa(pattern);
            let dense = DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, 10_000).unwrap();
            let lazy = LazyDFA::new(nfa, MatchKind::LeftmostFirst, false, 10_000);
            assert_eq!(
                match_ends(&lazy, haystack).unwrap(),
                match_ends(&dense, haystack).unwrap(),
                "{pattern}"
            );
        }
    }

    #[test]
    fn states_are_reused() {
        let lazy = LazyDFA::new(nfa("abc"), MatchKind::LeftmostFirst, false, 10_000);
        match_ends(&lazy, b"xxabcxx").unwrap();
        let discovered = lazy.state_count();
        match_ends(&lazy, b"abcabcxabc").unwrap();
        assert_eq!(lazy.state_count(), discovered);
    }

    #[test]
    fn cache_full() {
        let lazy = LazyDFA::new(nfa("[ab]*a[ab]{6}"), MatchKind::LeftmostFirst, false, 8);
        assert_eq!(match_ends(&lazy, b"abbabaabbbaabab"), Err(CacheFull));
        assert!(lazy.state_count() <= 8);
    }

    #[test]
    fn shared_between_threads() {
        let lazy = LazyDFA::new(nfa("[a-z]+@[a-z]+"), MatchKind::LeftmostFirst, false, 10_000);
        let expected = match_ends(&lazy, b"me@example").unwrap();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(match_ends(&lazy, b"me@example").unwrap(), expected);
                    }
                });
            }
        });
    }
}
