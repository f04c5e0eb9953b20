//! The byte-level Thompson NFA every engine is derived from.
//!
//! Fragments are built bottom-up from the [`Ast`]: each has start state `0` and accept state
//! `states.len() - 1`, and composing them just splices state lists with an index offset.
//! Char ranges are lowered to UTF-8 byte sequences, so all engines work on `&[u8]`.

use std::ops::RangeInclusive;

use utf8_ranges::Utf8Sequences;

use crate::{
    config::Config,
    error::Error,
    look::{Context, Look, LookSet},
    parse_tree::{Ast, ParsedPattern},
};

/// Which way the automaton reads the haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    /// Accepts the reversed language. Used to find where a match starts once its end is known.
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EpsilonType {
    None,
    Look(Look),
    StartCapture(usize),
    EndCapture(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpsilonTransition {
    pub(crate) to: usize,
    pub(crate) special: EpsilonType,
}
impl EpsilonTransition {
    pub const fn new(to: usize) -> EpsilonTransition {
        return EpsilonTransition {
            to,
            special: EpsilonType::None,
        };
    }
    pub const fn to(&self) -> usize {
        return self.to;
    }
    pub const fn special(&self) -> EpsilonType {
        return self.special;
    }
    fn add_offset(&self, offset: usize) -> EpsilonTransition {
        return EpsilonTransition {
            to: self.to + offset,
            special: self.special,
        };
    }
}
impl std::fmt::Display for EpsilonTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return match self.special {
            EpsilonType::None => write!(f, "-> {}", self.to),
            EpsilonType::Look(look) => write!(f, "-({look:?})> {}", self.to),
            EpsilonType::StartCapture(group) => write!(f, "-({group}> {}", self.to),
            EpsilonType::EndCapture(group) => write!(f, "-){group}> {}", self.to),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteTransition {
    pub(crate) to: usize,
    pub(crate) range: RangeInclusive<u8>,
}
impl ByteTransition {
    pub const fn new(to: usize, range: RangeInclusive<u8>) -> ByteTransition {
        return ByteTransition { to, range };
    }
    pub const fn to(&self) -> usize {
        return self.to;
    }
    pub const fn range(&self) -> &RangeInclusive<u8> {
        return &self.range;
    }
    #[inline]
    pub fn check(&self, b: u8) -> bool {
        return self.range.contains(&b);
    }
    fn add_offset(&self, offset: usize) -> ByteTransition {
        return ByteTransition {
            to: self.to + offset,
            range: self.range.clone(),
        };
    }
}
impl std::fmt::Display for ByteTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.range.start() == self.range.end() {
            return write!(f, "-({})> {}", self.range.start().escape_ascii(), self.to);
        }
        return write!(
            f,
            "-([{}-{}])> {}",
            self.range.start().escape_ascii(),
            self.range.end().escape_ascii(),
            self.to
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub(crate) transitions: Vec<ByteTransition>,
    /// In priority order.
    pub(crate) epsilons: Vec<EpsilonTransition>,
}
impl State {
    pub const fn new() -> State {
        return State {
            transitions: Vec::new(),
            epsilons: Vec::new(),
        };
    }
    pub fn with_transition(mut self, to: usize, range: RangeInclusive<u8>) -> State {
        self.transitions.push(ByteTransition::new(to, range));
        return self;
    }
    pub fn with_epsilon(mut self, to: usize) -> State {
        self.epsilons.push(EpsilonTransition::new(to));
        return self;
    }
    pub fn with_epsilon_special(mut self, to: usize, special: EpsilonType) -> State {
        self.epsilons.push(EpsilonTransition { to, special });
        return self;
    }
    pub fn transitions(&self) -> &[ByteTransition] {
        return &self.transitions;
    }
    pub fn epsilons(&self) -> &[EpsilonTransition] {
        return &self.epsilons;
    }
    fn with_offset(mut self, offset: usize) -> State {
        for t in &mut self.transitions {
            t.to += offset;
        }
        for e in &mut self.epsilons {
            e.to += offset;
        }
        return self;
    }
    fn add_offset(&self, offset: usize) -> State {
        return State {
            transitions: self
                .transitions
                .iter()
                .map(|t| t.add_offset(offset))
                .collect(),
            epsilons: self.epsilons.iter().map(|e| e.add_offset(offset)).collect(),
        };
    }
}

/// A partially built automaton with start state `0` and accept state `states.len() - 1`.
#[derive(Debug, Clone)]
struct Fragment {
    states: Vec<State>,
}
impl Fragment {
    fn nfa_empty() -> Fragment {
        return Fragment {
            states: vec![State::new()],
        };
    }
    /// Matches nothing at all.
    fn nfa_never() -> Fragment {
        return Fragment {
            states: vec![State::new(), State::new()],
        };
    }
    fn nfa_look(look: Look) -> Fragment {
        let states = vec![
            State::new().with_epsilon_special(1, EpsilonType::Look(look)),
            State::new(),
        ];
        return Fragment { states };
    }
    /// Matches any one of `sequences`, where each sequence is a list of byte ranges
    /// to be matched in order. Common prefixes share states.
    fn nfa_sequences<I>(sequences: I) -> Fragment
    where
        I: IntoIterator<Item = Vec<RangeInclusive<u8>>>,
    {
        const ACCEPT: usize = usize::MAX;
        let mut states = vec![State::new()];
        for sequence in sequences {
            let mut state = 0;
            for (i, range) in sequence.iter().enumerate() {
                if i + 1 == sequence.len() {
                    states[state]
                        .transitions
                        .push(ByteTransition::new(ACCEPT, range.clone()));
                    break;
                }
                let existing = states[state]
                    .transitions
                    .iter()
                    .find(|t| t.range == *range && t.to != ACCEPT)
                    .map(|t| t.to);
                state = match existing {
                    Some(next) => next,
                    None => {
                        let next = states.len();
                        states.push(State::new());
                        states[state]
                            .transitions
                            .push(ByteTransition::new(next, range.clone()));
                        next
                    }
                };
            }
        }

        // then insert accept state, replacing the placeholders
        let accept = states.len();
        states.push(State::new());
        for state in &mut states {
            for transition in &mut state.transitions {
                if transition.to == ACCEPT {
                    transition.to = accept;
                }
            }
        }
        return Fragment { states };
    }
    fn nfa_chars(ranges: &[RangeInclusive<char>], direction: Direction) -> Fragment {
        if ranges.is_empty() {
            return Fragment::nfa_never();
        }
        let sequences = ranges
            .iter()
            .flat_map(|range| Utf8Sequences::new(*range.start(), *range.end()))
            .map(|sequence| {
                let mut sequence: Vec<RangeInclusive<u8>> = sequence
                    .as_slice()
                    .iter()
                    .map(|r| r.start..=r.end)
                    .collect();
                if direction == Direction::Reverse {
                    sequence.reverse();
                }
                return sequence;
            });
        return Fragment::nfa_sequences(sequences);
    }
    fn nfa_union(nodes: Vec<Fragment>) -> Fragment {
        let states_count = 2 + nodes.iter().map(|n| n.states.len()).sum::<usize>();
        let mut states = vec![State::new()];
        for nfa in nodes {
            let sub_nfa_start = states.len();
            states[0].epsilons.push(EpsilonTransition::new(sub_nfa_start));
            states.extend(
                nfa.states
                    .into_iter()
                    .map(|state| state.with_offset(sub_nfa_start)),
            );
            if let Some(last) = states.last_mut() {
                last.epsilons.push(EpsilonTransition::new(states_count - 1));
            }
        }
        states.push(State::new());
        debug_assert_eq!(states_count, states.len());
        return Fragment { states };
    }
    fn nfa_capture(nfa: Fragment, group: usize) -> Fragment {
        let states_count = 2 + nfa.states.len();
        let mut states: Vec<State> = std::iter::once(
            State::new().with_epsilon_special(1, EpsilonType::StartCapture(group)),
        )
        .chain(nfa.states.into_iter().map(|state| state.with_offset(1)))
        .chain(std::iter::once(State::new()))
        .collect();
        states[states_count - 2].epsilons.push(EpsilonTransition {
            to: states_count - 1,
            special: EpsilonType::EndCapture(group),
        });
        return Fragment { states };
    }
    fn nfa_concat<T: IntoIterator<Item = Fragment>>(nodes: T) -> Fragment {
        let mut states = vec![State::new().with_epsilon(1)];
        for nfa in nodes {
            let states_count = states.len();
            states.extend(
                nfa.states
                    .into_iter()
                    .map(|state| state.with_offset(states_count)),
            );
            let states_count = states.len();
            if let Some(last) = states.last_mut() {
                last.epsilons.push(EpsilonTransition::new(states_count));
            }
        }
        states.push(State::new());
        return Fragment { states };
    }
    fn nfa_repeat(nfa: &Fragment, times: usize) -> Fragment {
        return Fragment::nfa_concat(std::iter::repeat(nfa).cloned().take(times));
    }
    /// Between `0` and `times` (inclusive) copies of `nfa`.
    fn nfa_upto(nfa: &Fragment, times: usize, greedy: bool) -> Fragment {
        if times == 0 {
            return Fragment::nfa_empty();
        }
        // Each copy is followed by a junction that either continues or skips to the end.
        let end_state_idx = 1 + (nfa.states.len() + 1) * times;
        let mut start_state = State::new();
        if greedy {
            start_state = start_state.with_epsilon(1).with_epsilon(end_state_idx - 1);
        } else {
            start_state = start_state.with_epsilon(end_state_idx - 1).with_epsilon(1);
        }
        let mut states = vec![start_state];
        for i in 0..times {
            let states_count = states.len();
            states.extend(nfa.states.iter().map(|state| state.add_offset(states_count)));
            let junction_idx = states.len();
            if let Some(last) = states.last_mut() {
                last.epsilons.push(EpsilonTransition::new(junction_idx));
            }
            let mut junction = State::new();
            if i + 1 != times {
                let next_copy = junction_idx + 1;
                if greedy {
                    junction = junction
                        .with_epsilon(next_copy)
                        .with_epsilon(end_state_idx - 1);
                } else {
                    junction = junction
                        .with_epsilon(end_state_idx - 1)
                        .with_epsilon(next_copy);
                }
            }
            states.push(junction);
        }
        debug_assert_eq!(states.len(), end_state_idx);
        return Fragment { states };
    }
    /// One or more copies of `nfa`, looping back to the start of the same copy.
    fn nfa_plus(nfa: Fragment, greedy: bool) -> Fragment {
        let union_idx = nfa.states.len();
        let end_state_idx = union_idx + 1;
        let union = if greedy {
            State::new().with_epsilon(0).with_epsilon(end_state_idx)
        } else {
            State::new().with_epsilon(end_state_idx).with_epsilon(0)
        };
        let mut states = nfa.states;
        if let Some(last) = states.last_mut() {
            last.epsilons.push(EpsilonTransition::new(union_idx));
        }
        states.push(union);
        states.push(State::new());
        return Fragment { states };
    }
    fn nfa_star(nfa: Fragment, greedy: bool, body_can_be_empty: bool) -> Fragment {
        if body_can_be_empty {
            // `(?:x+)?`: an empty pass through the body never outranks the exit
            return Fragment::nfa_upto(&Fragment::nfa_plus(nfa, greedy), 1, greedy);
        }
        let end_state_idx = 1 + nfa.states.len();
        let start_state = if greedy {
            State::new().with_epsilon(1).with_epsilon(end_state_idx)
        } else {
            State::new().with_epsilon(end_state_idx).with_epsilon(1)
        };
        let mut states: Vec<State> = std::iter::once(start_state)
            .chain(nfa.states.into_iter().map(|state| state.with_offset(1)))
            .chain(std::iter::once(State::new()))
            .collect();
        states[end_state_idx - 1]
            .epsilons
            .push(EpsilonTransition::new(0));
        return Fragment { states };
    }
}

struct Builder<'a> {
    direction: Direction,
    limit: usize,
    looks: &'a mut LookSet,
}
impl Builder<'_> {
    fn check_size(&self, states: usize) -> Result<(), Error> {
        if states > self.limit {
            return Err(Error::PatternTooLarge { limit: self.limit });
        }
        return Ok(());
    }

    fn build(&mut self, ast: &Ast) -> Result<Fragment, Error> {
        let fragment = match ast {
            Ast::Empty => Fragment::nfa_empty(),
            Ast::Literal(c) => Fragment::nfa_chars(&[*c..=*c], self.direction),
            Ast::Class(class) => Fragment::nfa_chars(&class.to_ranges(), self.direction),
            Ast::Concat(parts) => {
                let mut fragments = parts
                    .iter()
                    .map(|part| self.build(part))
                    .collect::<Result<Vec<_>, Error>>()?;
                if self.direction == Direction::Reverse {
                    fragments.reverse();
                }
                Fragment::nfa_concat(fragments)
            }
            Ast::Alternation(branches) => {
                let fragments = branches
                    .iter()
                    .map(|branch| self.build(branch))
                    .collect::<Result<Vec<_>, Error>>()?;
                Fragment::nfa_union(fragments)
            }
            Ast::Repetition {
                child,
                min,
                max,
                greedy,
            } => {
                let can_be_empty = child.can_match_empty();
                let child = self.build(child)?;
                let copies = max.unwrap_or(*min).max(*min) as usize + 1;
                self.check_size(child.states.len().saturating_mul(copies))?;
                let (required, optional) = match max {
                    // `x{n,}` is `x{n-1}x+`
                    None if *min > 0 => (
                        Fragment::nfa_repeat(&child, *min as usize - 1),
                        Fragment::nfa_plus(child, *greedy),
                    ),
                    None => (
                        Fragment::nfa_empty(),
                        Fragment::nfa_star(child, *greedy, can_be_empty),
                    ),
                    Some(max) => (
                        Fragment::nfa_repeat(&child, *min as usize),
                        Fragment::nfa_upto(&child, (*max - *min) as usize, *greedy),
                    ),
                };
                Fragment::nfa_concat([required, optional])
            }
            Ast::Group { child, capture } => {
                let child = self.build(child)?;
                match (capture, self.direction) {
                    (Some(capture), Direction::Forward) => {
                        Fragment::nfa_capture(child, capture.index)
                    }
                    _ => child,
                }
            }
            Ast::Anchor(anchor) => {
                let look = match self.direction {
                    Direction::Forward => Look::from_anchor(*anchor),
                    Direction::Reverse => Look::from_anchor(*anchor).reversed(),
                };
                self.looks.insert(look);
                Fragment::nfa_look(look)
            }
            Ast::Unsupported {
                construct,
                position,
            } => {
                return Err(Error::UnsupportedConstruct {
                    construct: *construct,
                    position: *position,
                });
            }
        };
        self.check_size(fragment.states.len())?;
        return Ok(fragment);
    }
}

/// A byte-level NFA with an anchored start, an unanchored start and a single accept state.
#[derive(Debug, Clone)]
pub struct NFA {
    pub(crate) states: Vec<State>,
    pub(crate) start_anchored: usize,
    /// Has a lazy any-byte loop in front of the anchored start, so the pattern can begin anywhere.
    pub(crate) start_unanchored: usize,
    pub(crate) accept: usize,
    /// Including group `0`. Always `0` in the reverse direction, where captures are dropped.
    pub(crate) capture_count: usize,
    pub(crate) looks: LookSet,
    pub(crate) direction: Direction,
}
impl NFA {
    /// Builds the NFA for a parsed pattern.
    ///
    /// ## Errors
    /// - [`Error::UnsupportedConstruct`] if the pattern contains a construct that an automaton cannot express
    /// - [`Error::PatternTooLarge`] if it would need more than [`Config::nfa_size_limit`] states
    pub fn new(parsed: &ParsedPattern, direction: Direction, config: &Config) -> Result<NFA, Error> {
        if let Some((construct, position)) = parsed.ast.find_unsupported() {
            return Err(Error::UnsupportedConstruct {
                construct,
                position,
            });
        }

        let mut looks = LookSet::empty();
        let mut builder = Builder {
            direction,
            limit: config.nfa_size_limit(),
            looks: &mut looks,
        };
        let mut fragment = builder.build(&parsed.ast)?;
        let capture_count = match direction {
            Direction::Forward => {
                fragment = Fragment::nfa_capture(fragment, 0);
                parsed.capture_count()
            }
            Direction::Reverse => 0,
        };

        let mut states = fragment.states;
        let accept = states.len() - 1;
        let start_unanchored = states.len();
        let any_byte_loop = start_unanchored + 1;
        states.push(State::new().with_epsilon(0).with_epsilon(any_byte_loop));
        states.push(State::new().with_transition(start_unanchored, 0..=255));

        let mut nfa = NFA {
            states,
            start_anchored: 0,
            start_unanchored,
            accept,
            capture_count,
            looks,
            direction,
        };
        nfa.compress_epsilon_chains();
        nfa.remove_unreachable();
        return Ok(nfa);
    }

    pub fn states(&self) -> &[State] {
        return &self.states;
    }
    pub const fn start_anchored(&self) -> usize {
        return self.start_anchored;
    }
    pub const fn start_unanchored(&self) -> usize {
        return self.start_unanchored;
    }
    pub const fn accept(&self) -> usize {
        return self.accept;
    }
    pub const fn capture_count(&self) -> usize {
        return self.capture_count;
    }
    pub const fn looks(&self) -> LookSet {
        return self.looks;
    }
    pub const fn direction(&self) -> Direction {
        return self.direction;
    }

    /// Redirects every edge into a plain pass-through state (no byte transitions and a single
    /// unconditional epsilon) to wherever that state leads.
    fn compress_epsilon_chains(&mut self) {
        let is_pass_through = |idx: usize, state: &State| {
            return idx != self.start_anchored
                && idx != self.start_unanchored
                && idx != self.accept
                && state.transitions.is_empty()
                && state.epsilons.len() == 1
                && state.epsilons[0].special == EpsilonType::None;
        };
        let forward: Vec<Option<usize>> = self
            .states
            .iter()
            .enumerate()
            .map(|(idx, state)| is_pass_through(idx, state).then(|| state.epsilons[0].to))
            .collect();

        let resolve = |mut idx: usize| {
            // a cycle of pass-through states is left alone
            for _ in 0..forward.len() {
                match forward[idx] {
                    Some(next) => idx = next,
                    None => return idx,
                }
            }
            return idx;
        };
        let resolved: Vec<usize> = (0..self.states.len()).map(resolve).collect();

        for state in &mut self.states {
            for t in &mut state.transitions {
                t.to = resolved[t.to];
            }
            for e in &mut state.epsilons {
                e.to = resolved[e.to];
            }
        }
    }

    /// Helper function for removing a set of states.
    ///
    /// These states should have no incoming transitions.
    fn remove_dead_states<T: IntoIterator<Item = bool>>(&mut self, dead_states: T) {
        let state_map: Vec<usize> = dead_states
            .into_iter()
            .scan(0, |s, dead| {
                if dead {
                    return Some(usize::MAX);
                } else {
                    let out = *s;
                    *s += 1;
                    return Some(out);
                }
            })
            .collect();
        self.states = std::mem::take(&mut self.states)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| state_map[*i] != usize::MAX)
            .map(|(_, state)| state)
            .collect();

        for state in &mut self.states {
            for t in &mut state.transitions {
                t.to = state_map[t.to];
            }
            for e in &mut state.epsilons {
                e.to = state_map[e.to];
            }
        }
        self.start_anchored = state_map[self.start_anchored];
        self.start_unanchored = state_map[self.start_unanchored];
        self.accept = state_map[self.accept];
    }

    /// Finds the states that can be reached from either start via any path
    fn states_reachable_start(&self) -> Vec<bool> {
        let mut reachable = vec![false; self.states.len()];
        let mut stack = vec![self.start_anchored, self.start_unanchored];
        reachable[self.start_anchored] = true;
        reachable[self.start_unanchored] = true;

        while let Some(state) = stack.pop() {
            let targets = self.states[state]
                .epsilons
                .iter()
                .map(|e| e.to)
                .chain(self.states[state].transitions.iter().map(|t| t.to));
            for to in targets {
                if !reachable[to] {
                    reachable[to] = true;
                    stack.push(to);
                }
            }
        }
        return reachable;
    }

    /// Finds the states that can reach the accept state via any path
    fn states_reachable_end(&self) -> Vec<bool> {
        let mut reverse = vec![Vec::new(); self.states.len()];
        for (i, state) in self.states.iter().enumerate() {
            for e in &state.epsilons {
                reverse[e.to].push(i);
            }
            for t in &state.transitions {
                reverse[t.to].push(i);
            }
        }

        let mut reachable = vec![false; self.states.len()];
        reachable[self.accept] = true;
        let mut stack = vec![self.accept];
        while let Some(state) = stack.pop() {
            for src in &reverse[state] {
                if !reachable[*src] {
                    reachable[*src] = true;
                    stack.push(*src);
                }
            }
        }
        return reachable;
    }

    /// Removes all states that cannot be reached or cannot reach the accept state.
    /// The starts and the accept state are always kept.
    fn remove_unreachable(&mut self) {
        let reach_start = self.states_reachable_start();
        let reach_end = self.states_reachable_end();
        let keep: Vec<bool> = (0..self.states.len())
            .map(|i| {
                (reach_start[i] && reach_end[i])
                    || i == self.start_anchored
                    || i == self.start_unanchored
                    || i == self.accept
            })
            .collect();

        // Remove transitions that involve redundant states
        for state in &mut self.states {
            state.epsilons.retain(|e| keep[e.to]);
            state.transitions.retain(|t| keep[t.to]);
        }
        self.remove_dead_states(keep.into_iter().map(|keep| !keep));
    }

    /// Simple set-based simulation, for testing: whether the pattern matches anywhere in `haystack`.
    #[cfg(test)]
    pub fn test(&self, haystack: &[u8]) -> bool {
        let mut list = vec![false; self.states.len()];
        let mut next_list = vec![false; self.states.len()];
        list[self.start_unanchored] = true;

        let propagate = |list: &mut Vec<bool>, pos: usize| {
            let mut stack: Vec<usize> = list
                .iter()
                .enumerate()
                .filter_map(|(i, set)| set.then_some(i))
                .collect();
            while let Some(from) = stack.pop() {
                for EpsilonTransition { to, special } in &self.states[from].epsilons {
                    let passes = match special {
                        EpsilonType::Look(look) => match self.direction {
                            Direction::Forward => look.matches_at(haystack, pos),
                            Direction::Reverse => look.matches(
                                Context::before_reversed(haystack, pos),
                                pos.checked_sub(1).map(|p| haystack[p]),
                            ),
                        },
                        _ => true,
                    };
                    if passes && !list[*to] {
                        list[*to] = true;
                        stack.push(*to);
                    }
                }
            }
        };

        match self.direction {
            Direction::Forward => {
                for (pos, b) in haystack.iter().enumerate() {
                    propagate(&mut list, pos);
                    if list[self.accept] {
                        return true;
                    }
                    self.step(&list, &mut next_list, *b);
                    std::mem::swap(&mut list, &mut next_list);
                }
                propagate(&mut list, haystack.len());
            }
            Direction::Reverse => {
                for pos in (1..=haystack.len()).rev() {
                    propagate(&mut list, pos);
                    if list[self.accept] {
                        return true;
                    }
                    self.step(&list, &mut next_list, haystack[pos - 1]);
                    std::mem::swap(&mut list, &mut next_list);
                }
                propagate(&mut list, 0);
            }
        }
        return list[self.accept];
    }

    fn step(&self, list: &[bool], next_list: &mut [bool], b: u8) {
        next_list.fill(false);
        for (from, state) in self.states.iter().enumerate() {
            if !list[from] {
                continue;
            }
            for t in &state.transitions {
                if t.check(b) {
                    next_list[t.to] = true;
                }
            }
        }
    }
}
impl std::fmt::Display for NFA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            let mut label = String::new();
            if i == self.start_anchored {
                label.push_str(" (anchored start)");
            }
            if i == self.start_unanchored {
                label.push_str(" (unanchored start)");
            }
            if i == self.accept {
                label.push_str(" (accept)");
            }
            writeln!(f, "State {i}{label}:")?;
            for e in &state.epsilons {
                writeln!(f, "  {e}")?;
            }
            for t in &state.transitions {
                writeln!(f, "  {t}")?;
            }
        }
        return Ok(());
    }
}
