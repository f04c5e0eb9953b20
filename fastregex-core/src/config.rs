//! Compile-time and match-time options for a [`crate::Regex`].

/// Which vector width the byte-range prefilter scanner should use.
///
/// The scanner does not assume any particular width: [`VectorWidth::Auto`] picks the widest
/// one supported by the running CPU, while the others force a specific implementation
/// (falling back to [`VectorWidth::Scalar`] if the target does not have it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorWidth {
    Auto,
    Scalar,
    /// 16 lanes (SSE2 on `x86_64`)
    W128,
    /// 32 lanes (AVX2 on `x86_64`)
    W256,
}

#[derive(Debug, Clone)]
pub struct Config {
    case_insensitive: bool,
    multiline: bool,
    dot_matches_newline: bool,
    /// When set, `*`, `+`, `?` and `{..}` are lazy by default and a trailing `?` makes them greedy.
    swap_greed: bool,
    /// Ceiling on the number of states of the eagerly built DFA.
    /// Exceeding it switches to on-demand construction.
    max_dfa_states: usize,
    /// Ceiling on the number of states the lazy DFA will materialize before searches
    /// fall back to NFA simulation.
    lazy_cache_capacity: usize,
    /// Maximum number of automaton transitions per match call.
    step_budget: Option<u64>,
    jit: bool,
    jit_max_states: usize,
    prefilter: bool,
    /// Forces every search through the capture-aware NFA simulation.
    nfa_only: bool,
    nfa_size_limit: usize,
    vector_width: VectorWidth,
}
impl Config {
    pub const fn case_insensitive(&self) -> bool {
        return self.case_insensitive;
    }
    pub const fn multiline(&self) -> bool {
        return self.multiline;
    }
    pub const fn dot_matches_newline(&self) -> bool {
        return self.dot_matches_newline;
    }
    pub const fn swap_greed(&self) -> bool {
        return self.swap_greed;
    }
    pub const fn max_dfa_states(&self) -> usize {
        return self.max_dfa_states;
    }
    pub const fn lazy_cache_capacity(&self) -> usize {
        return self.lazy_cache_capacity;
    }
    pub const fn step_budget(&self) -> Option<u64> {
        return self.step_budget;
    }
    pub const fn jit(&self) -> bool {
        return self.jit;
    }
    pub const fn jit_max_states(&self) -> usize {
        return self.jit_max_states;
    }
    pub const fn prefilter(&self) -> bool {
        return self.prefilter;
    }
    pub const fn nfa_only(&self) -> bool {
        return self.nfa_only;
    }
    pub const fn nfa_size_limit(&self) -> usize {
        return self.nfa_size_limit;
    }
    pub const fn vector_width(&self) -> VectorWidth {
        return self.vector_width;
    }

    pub const fn builder() -> ConfigBuilder {
        return ConfigBuilder::new();
    }
    pub const fn const_default() -> Self {
        return Config {
            case_insensitive: false,
            multiline: false,
            dot_matches_newline: false,
            swap_greed: false,
            max_dfa_states: 10_000,
            lazy_cache_capacity: 100_000,
            step_budget: None,
            jit: true,
            jit_max_states: 2_048,
            prefilter: true,
            nfa_only: false,
            nfa_size_limit: 1_000_000,
            vector_width: VectorWidth::Auto,
        };
    }
}
impl Default for Config {
    fn default() -> Self {
        return Config::const_default();
    }
}

#[derive(Debug)]
pub struct ConfigBuilder(Config);
impl ConfigBuilder {
    pub const fn new() -> ConfigBuilder {
        return ConfigBuilder(Config::const_default());
    }
    pub const fn build(self) -> Config {
        return self.0;
    }
    pub const fn case_insensitive(mut self, yes: bool) -> ConfigBuilder {
        self.0.case_insensitive = yes;
        return self;
    }
    pub const fn multiline(mut self, yes: bool) -> ConfigBuilder {
        self.0.multiline = yes;
        return self;
    }
    pub const fn dot_matches_newline(mut self, yes: bool) -> ConfigBuilder {
        self.0.dot_matches_newline = yes;
        return self;
    }
    pub const fn swap_greed(mut self, yes: bool) -> ConfigBuilder {
        self.0.swap_greed = yes;
        return self;
    }
    /// `0` disables the eager DFA entirely, so every search goes through the lazy DFA.
    pub const fn max_dfa_states(mut self, states: usize) -> ConfigBuilder {
        self.0.max_dfa_states = states;
        return self;
    }
    pub const fn lazy_cache_capacity(mut self, states: usize) -> ConfigBuilder {
        self.0.lazy_cache_capacity = states;
        return self;
    }
    pub const fn step_budget(mut self, budget: Option<u64>) -> ConfigBuilder {
        self.0.step_budget = budget;
        return self;
    }
    /// Has no effect unless the crate is built with the `jit` feature.
    pub const fn jit(mut self, yes: bool) -> ConfigBuilder {
        self.0.jit = yes;
        return self;
    }
    pub const fn jit_max_states(mut self, states: usize) -> ConfigBuilder {
        self.0.jit_max_states = states;
        return self;
    }
    pub const fn prefilter(mut self, yes: bool) -> ConfigBuilder {
        self.0.prefilter = yes;
        return self;
    }
    pub const fn nfa_only(mut self, yes: bool) -> ConfigBuilder {
        self.0.nfa_only = yes;
        return self;
    }
    pub const fn nfa_size_limit(mut self, states: usize) -> ConfigBuilder {
        self.0.nfa_size_limit = states;
        return self;
    }
    pub const fn vector_width(mut self, width: VectorWidth) -> ConfigBuilder {
        self.0.vector_width = width;
        return self;
    }
}
