//! Ahead-of-time code generation: turns a dense DFA into a plain Rust function,
//! for use by the `static_matcher!` macro.
//!
//! The generated function is an unanchored `is_match`:
//! each DFA state becomes a variant of a local enum and each byte run becomes a match arm.

use quote::{quote, ToTokens, TokenStreamExt as _};

use crate::{
    config::Config,
    engines::{
        dense_dfa::{DenseDFA, DEAD},
        determinize::MatchKind,
        Automaton, StateID,
    },
    error::Error,
    look::Context,
    nfa::{Direction, NFA},
    parse_tree::{parse, PatternLit},
    Regex,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct VMStateLabel(StateID);
impl ToTokens for VMStateLabel {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let label = format!("State{}", self.0);
        let ident = proc_macro2::Ident::new(&label, proc_macro2::Span::call_site());
        tokens.append(ident);
    }
}

/// The arms of the transition `match` for a single state.
struct StateTransitions<'a>(&'a DenseDFA, StateID);
impl<'a> ToTokens for StateTransitions<'a> {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let &StateTransitions(dfa, state) = self;
        let from = VMStateLabel(state);
        for (range, to) in dfa.byte_runs(state) {
            let to = VMStateLabel(to);
            let start = *range.start();
            let end = *range.end();
            tokens.extend(quote! {
                (VMStates::#from, #start..=#end) => VMStates::#to,
            });
        }
    }
}

/// Compiles `pattern` all the way to the tokens of a `fn(&[u8]) -> bool` expression.
///
/// ## Errors
/// Any compile error of the pattern, or [`Error::PatternTooLarge`]
/// if the DFA would need more than [`Config::max_dfa_states`] states.
pub fn static_matcher(pattern: &str, config: &Config) -> Result<proc_macro2::TokenStream, Error> {
    let parsed = parse(pattern, config)?;
    let nfa = NFA::new(&parsed, Direction::Forward, config)?;
    let dfa = DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, config.max_dfa_states()).ok_or(
        Error::PatternTooLarge {
            limit: config.max_dfa_states(),
        },
    )?;
    return Ok(static_matcher_tokens(&dfa));
}

/// Generates an unanchored `is_match` for a forward DFA.
pub fn static_matcher_tokens(dfa: &DenseDFA) -> proc_macro2::TokenStream {
    let states: Vec<StateID> = (0..dfa.state_count() as StateID).collect();
    let labels: Vec<VMStateLabel> = states.iter().copied().map(VMStateLabel).collect();
    let start = VMStateLabel(dfa.start(Context::Text));
    let dead = VMStateLabel(DEAD);
    let transitions = states.iter().map(|state| StateTransitions(dfa, *state));
    let match_states = states
        .iter()
        .filter(|state| dfa.is_match_state(**state))
        .map(|state| VMStateLabel(*state));
    let accepts_at_end = states.iter().map(|state| {
        let eoi = dfa.next_class(*state, dfa.stride() - 1);
        return dfa.is_match_state(eoi);
    });

    return quote! {
        {
            fn is_match(haystack: &[u8]) -> bool {
                #[allow(clippy::enum_variant_names)]
                #[derive(Clone, Copy, PartialEq, Eq, Debug)]
                enum VMStates {
                    #(#labels,)*
                }

                let mut state: VMStates = VMStates::#start;
                for b in haystack.iter().copied() {
                    state = match (state, b) {
                        #(#transitions)*
                    };
                    match state {
                        #(VMStates::#match_states => return true,)*
                        VMStates::#dead => return false,
                        #[allow(unreachable_patterns)]
                        _ => {}
                    }
                }
                return match state {
                    #(VMStates::#labels => #accepts_at_end,)*
                };
            }
            is_match as fn(&[u8]) -> bool
        }
    };
}

/// Expands `regex!("pattern")`: compiles the pattern now, so that errors are reported at build
/// time, and emits a lazily initialized `&'static Regex`.
pub fn __regex_macro(input: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
    let literal: PatternLit = match syn::parse2(input) {
        Ok(literal) => literal,
        Err(err) => return err.to_compile_error(),
    };
    if let Err(err) = Regex::new(&literal.value) {
        return syn::Error::new(literal.span, err.to_string()).to_compile_error();
    }
    let pattern = &literal.value;
    return quote! {
        {
            static REGEX: ::std::sync::OnceLock<::fastregex::Regex> = ::std::sync::OnceLock::new();
            ::fastregex::__lazy_regex(&REGEX, #pattern)
        }
    };
}

/// Expands `static_matcher!("pattern")` into a `fn(&[u8]) -> bool`.
pub fn __static_matcher_macro(input: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
    let literal: PatternLit = match syn::parse2(input) {
        Ok(literal) => literal,
        Err(err) => return err.to_compile_error(),
    };
    return match static_matcher(&literal.value, &Config::default()) {
        Ok(tokens) => tokens,
        Err(err) => syn::Error::new(literal.span, err.to_string()).to_compile_error(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_variant_per_state() {
        let config = Config::default();
        let parsed = parse("ab", &config).unwrap();
        let nfa = NFA::new(&parsed, Direction::Forward, &config).unwrap();
        let dfa = DenseDFA::new(&nfa, MatchKind::LeftmostFirst, false, 100).unwrap();
        let tokens = static_matcher_tokens(&dfa).to_string();
        for state in 0..dfa.state_count() {
            assert!(tokens.contains(&format!("State{state} ,")), "{tokens}");
        }
        assert!(!tokens.contains(&format!("State{} ,", dfa.state_count())));
        assert!(tokens.contains("fn is_match"));
    }

    #[test]
    fn too_large() {
        let config = Config::builder().max_dfa_states(8).build();
        assert_eq!(
            static_matcher("[ab]*a[ab]{6}", &config).unwrap_err(),
            Error::PatternTooLarge { limit: 8 }
        );
        assert!(matches!(
            static_matcher("(", &config).unwrap_err(),
            Error::Syntax(_)
        ));
    }

    #[test]
    fn macro_errors_become_compile_errors() {
        let tokens = __regex_macro(quote! { "a(b" }).to_string();
        assert!(tokens.contains("compile_error"), "{tokens}");
        let tokens = __regex_macro(quote! { r"(a)\1" }).to_string();
        assert!(tokens.contains("compile_error"), "{tokens}");
        let tokens = __static_matcher_macro(quote! { 42 }).to_string();
        assert!(tokens.contains("compile_error"), "{tokens}");

        let tokens = __regex_macro(quote! { "a+b" }).to_string();
        assert!(tokens.contains("__lazy_regex"), "{tokens}");
    }
}
