//! Capture-aware NFA simulation.
//!
//! Threads are kept in priority order, so the first thread to reach the accept state is the
//! leftmost-first match and every thread after it can be dropped. Each NFA state holds at most
//! one thread per position, which bounds the work to `O(states * haystack)`.
//!
//! This is the reference semantics for every other engine, and the only engine that knows capture groups.
//! The DFAs find where a match is, and this recovers the groups inside it.

use super::search::Meter;
use crate::{
    error::MatchError,
    nfa::{EpsilonType, NFA},
};

/// Where and how to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    /// Bytes at or after `end` are never consumed, but assertions at `end` still see them.
    pub end: usize,
    /// Only matches beginning exactly at `start`.
    pub anchored: bool,
    /// Stop at the first match found, rather than extending it.
    pub earliest: bool,
}

/// Ordered set of NFA states, each with its own capture slots.
#[derive(Debug)]
struct Threads {
    dense: Vec<usize>,
    sparse: Vec<usize>,
    /// `slot_count` entries per NFA state.
    slots: Vec<Option<usize>>,
    slot_count: usize,
}
impl Threads {
    fn new(states: usize, slot_count: usize) -> Threads {
        return Threads {
            dense: Vec::with_capacity(states),
            sparse: vec![0; states],
            slots: vec![None; states * slot_count],
            slot_count,
        };
    }
    fn contains(&self, state: usize) -> bool {
        let idx = self.sparse[state];
        return idx < self.dense.len() && self.dense[idx] == state;
    }
    fn insert(&mut self, state: usize) {
        self.sparse[state] = self.dense.len();
        self.dense.push(state);
    }
    fn clear(&mut self) {
        self.dense.clear();
    }
    fn slots(&self, state: usize) -> &[Option<usize>] {
        return &self.slots[state * self.slot_count..(state + 1) * self.slot_count];
    }
    fn slots_mut(&mut self, state: usize) -> &mut [Option<usize>] {
        return &mut self.slots[state * self.slot_count..(state + 1) * self.slot_count];
    }
}

enum Frame {
    Explore(usize),
    /// Sets a slot to the current position, then explores.
    Capture { slot: usize, to: usize },
    Restore { slot: usize, value: Option<usize> },
}

pub struct PikeVM<'a> {
    nfa: &'a NFA,
}
impl<'a> PikeVM<'a> {
    pub fn new(nfa: &'a NFA) -> PikeVM<'a> {
        return PikeVM { nfa };
    }

    /// ## Returns
    /// The capture slots of the match, if any: `2 * capture_count` entries,
    /// where `slots[2 * i]..slots[2 * i + 1]` is the span of group `i`.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search steps more threads than `meter` allows.
    pub fn search(
        &self,
        haystack: &[u8],
        window: Window,
        meter: &mut Meter,
    ) -> Result<Option<Vec<Option<usize>>>, MatchError> {
        let slot_count = self.nfa.capture_count() * 2;
        let states = self.nfa.states().len();
        let mut clist = Threads::new(states, slot_count);
        let mut nlist = Threads::new(states, slot_count);
        let mut scratch: Vec<Option<usize>> = vec![None; slot_count];
        let mut stack = Vec::new();
        let mut matched: Option<Vec<Option<usize>>> = None;

        let mut pos = window.start;
        loop {
            if matched.is_none() && (pos == window.start || !window.anchored) {
                scratch.fill(None);
                self.add_thread(
                    &mut clist,
                    self.nfa.start_anchored(),
                    haystack,
                    pos,
                    &mut scratch,
                    &mut stack,
                );
            }
            if clist.dense.is_empty() {
                break;
            }

            for i in 0..clist.dense.len() {
                let state = clist.dense[i];
                meter.tick_nfa()?;
                if state == self.nfa.accept() {
                    matched = Some(clist.slots(state).to_vec());
                    // lower priority threads can never win
                    break;
                }
                if pos >= window.end {
                    continue;
                }
                let byte = haystack[pos];
                for t in self.nfa.states()[state].transitions() {
                    if t.check(byte) {
                        scratch.copy_from_slice(clist.slots(state));
                        self.add_thread(&mut nlist, t.to(), haystack, pos + 1, &mut scratch, &mut stack);
                    }
                }
            }
            if window.earliest && matched.is_some() {
                break;
            }
            if pos >= window.end {
                break;
            }
            std::mem::swap(&mut clist, &mut nlist);
            nlist.clear();
            pos += 1;
        }
        return Ok(matched);
    }

    /// Whether some path through the NFA consumes exactly `haystack[start..end]`.
    ///
    /// Priorities are ignored and no capture slots are tracked.
    ///
    /// ## Errors
    /// [`MatchError::StepBudgetExceeded`] if the search steps more threads than `meter` allows.
    pub fn accepts(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
        meter: &mut Meter,
    ) -> Result<bool, MatchError> {
        let states = self.nfa.states().len();
        let mut clist = Threads::new(states, 0);
        let mut nlist = Threads::new(states, 0);
        let mut scratch: Vec<Option<usize>> = Vec::new();
        let mut stack = Vec::new();

        let start_state = self.nfa.start_anchored();
        self.add_thread(&mut clist, start_state, haystack, start, &mut scratch, &mut stack);
        let mut pos = start;
        while pos < end && !clist.dense.is_empty() {
            let byte = haystack[pos];
            for i in 0..clist.dense.len() {
                let state = clist.dense[i];
                meter.tick_nfa()?;
                for t in self.nfa.states()[state].transitions() {
                    if t.check(byte) {
                        self.add_thread(&mut nlist, t.to(), haystack, pos + 1, &mut scratch, &mut stack);
                    }
                }
            }
            std::mem::swap(&mut clist, &mut nlist);
            nlist.clear();
            pos += 1;
        }
        return Ok(pos == end && clist.contains(self.nfa.accept()));
    }

    /// Adds `state` and its epsilon closure at `pos` to `list`, in priority order.
    /// `scratch` holds the slots of the thread being added and is left unchanged.
    fn add_thread(
        &self,
        list: &mut Threads,
        state: usize,
        haystack: &[u8],
        pos: usize,
        scratch: &mut [Option<usize>],
        stack: &mut Vec<Frame>,
    ) {
        stack.push(Frame::Explore(state));
        while let Some(frame) = stack.pop() {
            let state = match frame {
                Frame::Explore(state) => state,
                Frame::Capture { slot, to } => {
                    stack.push(Frame::Restore {
                        slot,
                        value: scratch[slot],
                    });
                    scratch[slot] = Some(pos);
                    to
                }
                Frame::Restore { slot, value } => {
                    scratch[slot] = value;
                    continue;
                }
            };
            if list.contains(state) {
                continue;
            }
            list.insert(state);
            list.slots_mut(state).copy_from_slice(scratch);

            for e in self.nfa.states()[state].epsilons().iter().rev() {
                let frame = match e.special() {
                    EpsilonType::None => Frame::Explore(e.to()),
                    EpsilonType::Look(look) => {
                        if !look.matches_at(haystack, pos) {
                            continue;
                        }
                        Frame::Explore(e.to())
                    }
                    EpsilonType::StartCapture(group) if 2 * group < scratch.len() => Frame::Capture {
                        slot: 2 * group,
                        to: e.to(),
                    },
                    EpsilonType::EndCapture(group) if 2 * group + 1 < scratch.len() => {
                        Frame::Capture {
                            slot: 2 * group + 1,
                            to: e.to(),
                        }
                    }
                    EpsilonType::StartCapture(_) | EpsilonType::EndCapture(_) => {
                        Frame::Explore(e.to())
                    }
                };
                stack.push(frame);
            }
        }
    }
}
