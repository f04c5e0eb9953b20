//! A flat, function-based surface over [`Regex`], for hosts that embed the engine through a narrow
//! boundary: compile once, then call plain functions with the compiled pattern and a byte haystack.

use crate::{
    captures::Captures,
    config::{Config, VectorWidth},
    error::Error,
    error::MatchError,
    prefilter::resolve_width,
    replace::Replacer,
    CapturesMatches, Regex,
};

/// ## Errors
/// See [`Regex::with_config`].
pub fn compile(pattern: &str, config: &Config) -> Result<Regex, Error> {
    return Regex::with_config(pattern, config.clone());
}

/// ## Errors
/// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
pub fn is_match(regex: &Regex, haystack: &[u8]) -> Result<bool, MatchError> {
    return regex.is_match(haystack);
}

/// Whether the pattern matches the whole haystack.
///
/// ## Errors
/// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
pub fn full_match(regex: &Regex, haystack: &[u8]) -> Result<bool, MatchError> {
    return regex.is_full_match(haystack);
}

/// Finds the leftmost-first match beginning at or after `start`, with every capture group.
///
/// ## Errors
/// [`MatchError::StepBudgetExceeded`] if the search exceeds [`Config::step_budget`].
pub fn find<'h>(
    regex: &Regex,
    haystack: &'h [u8],
    start: usize,
) -> Result<Option<Captures<'h>>, MatchError> {
    return regex.captures_at(haystack, start);
}

/// Every non-overlapping match, lazily.
pub fn find_all<'r, 'h>(regex: &'r Regex, haystack: &'h [u8]) -> CapturesMatches<'r, 'h> {
    return regex.captures_iter(haystack);
}

/// Including group `0`.
pub fn capture_count(regex: &Regex) -> usize {
    return regex.capture_count();
}

/// ## Errors
/// [`MatchError::StepBudgetExceeded`] if a search exceeds [`Config::step_budget`].
pub fn replace_all<R: Replacer>(
    regex: &Regex,
    haystack: &[u8],
    replacer: R,
) -> Result<Vec<u8>, MatchError> {
    return regex.replace_all(haystack, replacer);
}

/// The widest vector width the running CPU supports, which is what [`VectorWidth::Auto`] picks.
pub fn simd_mode() -> VectorWidth {
    return resolve_width(VectorWidth::Auto);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let regex = compile(r"(\w+)@(\w+)\.com", &Config::default()).unwrap();
        assert_eq!(capture_count(&regex), 3);
        let haystack = b"mail a@b.com or c@d.com";
        assert_eq!(is_match(&regex, haystack), Ok(true));

        let first = find(&regex, haystack, 0).unwrap().unwrap();
        assert_eq!(first.spans(), vec![Some((5, 12)), Some((5, 6)), Some((7, 8))]);
        let second = find(&regex, haystack, 12).unwrap().unwrap();
        assert_eq!(second.get_match().range(), 16..23);
        assert_eq!(find(&regex, haystack, 17).unwrap(), None);

        let all: Vec<_> = find_all(&regex, haystack)
            .map(|caps| caps.unwrap().get(2).unwrap().range())
            .collect();
        assert_eq!(all, vec![7..8, 18..19]);

        assert_eq!(
            replace_all(&regex, haystack, "$2:$1").unwrap(),
            b"mail b:a or d:c"
        );
    }

    #[test]
    fn whole_haystack() {
        let regex = compile(r"\d{3}-\d{4}", &Config::default()).unwrap();
        assert_eq!(full_match(&regex, b"555-1234"), Ok(true));
        assert_eq!(full_match(&regex, b"tel 555-1234"), Ok(false));
        assert_eq!(full_match(&regex, b"555-12345"), Ok(false));
        assert_eq!(is_match(&regex, b"555-12345"), Ok(true));
    }

    #[test]
    fn simd_mode_is_resolved() {
        let mode = simd_mode();
        assert_ne!(mode, VectorWidth::Auto);
        let regex = compile("[0-9]", &Config::default()).unwrap();
        assert_eq!(regex.vector_width(), mode);
    }

    #[test]
    fn compile_errors() {
        assert!(matches!(
            compile("a(b", &Config::default()),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            compile(r"(a)\1", &Config::default()),
            Err(Error::UnsupportedConstruct { .. })
        ));
    }
}
