#![allow(dead_code, unused_macros)]

use fastregex::{Config, Regex, VectorWidth};

/// The pattern compiled once per engine, so that every assertion runs against all of them.
pub fn engines(pattern: &str) -> Vec<Regex> {
    return configs()
        .into_iter()
        .map(|config| {
            Regex::with_config(pattern, config)
                .unwrap_or_else(|err| panic!("failed to compile {pattern:?}: {err}"))
        })
        .collect();
}

pub fn configs() -> Vec<Config> {
    return vec![
        Config::default(),
        Config::builder().jit(false).build(),
        Config::builder()
            .jit(false)
            .prefilter(true)
            .vector_width(VectorWidth::Scalar)
            .build(),
        Config::builder().max_dfa_states(0).build(),
        Config::builder().nfa_only(true).build(),
    ];
}

/// Checks [`Regex::captures`], [`Regex::find`] and [`Regex::is_match`] together.
/// Every group is compared as text.
macro_rules! assert_match {
    ($re:expr, $text:expr, $groups:expr$(,)?) => {{
        let re: &::fastregex::Regex = &$re;
        let owned = &$text;
        let text: &str = ::core::convert::AsRef::<str>::as_ref(owned);
        let expected: &[::core::option::Option<&str>] = &$groups;
        let caps = re
            .captures(text)
            .unwrap()
            .unwrap_or_else(|| panic!("{:?} did not match {:?}", re, text));
        let groups: ::std::vec::Vec<::core::option::Option<&str>> = caps
            .iter()
            .map(|group| group.map(|m| m.as_str().unwrap()))
            .collect();
        assert_eq!(groups, expected, "{:?} on {:?}", re, text);
        assert_eq!(
            re.find(text).unwrap().map(|m| m.range()),
            ::core::option::Option::Some(caps.get_match().range()),
            "{:?} on {:?}",
            re,
            text
        );
        assert_eq!(re.is_match(text), Ok(true), "{:?} on {:?}", re, text);
    }};
}

/// Checks that none of [`Regex::captures`], [`Regex::find`] and [`Regex::is_match`] match.
macro_rules! assert_nomatch {
    ($re:expr, $text:expr$(,)?) => {{
        let re: &::fastregex::Regex = &$re;
        let owned = &$text;
        let text: &str = ::core::convert::AsRef::<str>::as_ref(owned);
        assert_eq!(re.captures(text).unwrap(), None, "{:?} on {:?}", re, text);
        assert_eq!(re.find(text).unwrap(), None, "{:?} on {:?}", re, text);
        assert_eq!(re.is_match(text), Ok(false), "{:?} on {:?}", re, text);
    }};
    ($re:expr, $text:expr, $($rest:expr),+$(,)?) => {
        assert_nomatch!($re, $text);
        assert_nomatch!($re, $($rest),+)
    };
}
