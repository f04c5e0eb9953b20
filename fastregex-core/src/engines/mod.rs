//! The automata that execute a compiled pattern.
//!
//! - [`dense_dfa`]: a fully built, minimized transition table
//! - [`lazy_dfa`]: the same automaton, materialized on demand into a shared cache
//! - [`pike_vm`]: capture-aware NFA simulation
//!
//! [`search`] drives either DFA (through [`Automaton`]) to find match boundaries.

use crate::look::Context;

pub mod dense_dfa;
pub mod determinize;
pub mod lazy_dfa;
pub mod pike_vm;
pub mod search;

pub type StateID = u32;

/// The lazy DFA ran out of room for new states. The search is retried with NFA simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("lazy DFA cache is full")]
pub struct CacheFull;

/// A DFA over bytes whose matches are delayed by one byte.
///
/// After reading the byte at `i`, the automaton is in a match state
/// if and only if a match ends at `i` (not `i + 1`).
/// The end-of-input transition reports a match ending at the haystack's end.
pub trait Automaton {
    /// The state to begin in at a position preceded by `context`.
    fn start_state(&self, context: Context) -> Result<StateID, CacheFull>;
    fn next_state(&self, state: StateID, byte: u8) -> Result<StateID, CacheFull>;
    fn next_eoi_state(&self, state: StateID) -> Result<StateID, CacheFull>;

    fn is_match_state(&self, state: StateID) -> bool;
    /// No more matches are possible from this state.
    fn is_dead_state(&self, state: StateID) -> bool;
    /// One of the start states. In the forward automaton, this means no partial match is in progress.
    fn is_start_state(&self, state: StateID) -> bool;
}
