#![doc = include_str!("../README.md")]

pub use ::fastregex_core::captures;
pub use ::fastregex_core::config;
pub use ::fastregex_core::error;
pub use ::fastregex_core::interface;
pub use ::fastregex_core::parse_tree;
pub use ::fastregex_core::replace;
pub use ::fastregex_core::{
    Captures, CapturesMatches, Config, ConfigBuilder, EngineKind, Error, FindMatches, Match,
    MatchError, NoExpand, Regex, Replacer, SearchStats, SyntaxError, SyntaxErrorKind,
    UnsupportedKind, VectorWidth,
};
pub use ::fastregex_macros::*;

#[doc(hidden)]
pub use ::fastregex_core::__lazy_regex;

/// Includes the basic things you'll need.
///
/// Unless you want to tune the engines or work with the internals,
/// you will probably never need anything else.
pub mod prelude {
    pub use ::fastregex_core::{Captures, Config, Match, Regex};
    pub use ::fastregex_macros::regex;
    pub use ::fastregex_macros::static_matcher;
}
