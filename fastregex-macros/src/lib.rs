use proc_macro::TokenStream;

extern crate proc_macro;

/// Checks a pattern at build time and expands to a lazily compiled `&'static fastregex::Regex`.
///
/// ```ignore
/// let date = regex!(r"(\d{4})-(\d{2})-(\d{2})");
/// assert!(date.is_match("2024-01-31")?);
/// ```
///
/// Both the build-time check and the first use compile with the default [`Config`].
///
/// # Panics
///
/// The first evaluation panics if the pattern fails to compile at run time after passing at
/// build time. That only happens when the macro and the runtime come from different
/// versions of `fastregex-core`.
///
/// [`Config`]: https://docs.rs/fastregex/latest/fastregex/struct.Config.html
#[proc_macro]
pub fn regex(stream: TokenStream) -> TokenStream {
    return fastregex_core::codegen::__regex_macro(stream.into()).into();
}

/// Generates a plain `fn(&[u8]) -> bool` that tests whether a pattern matches anywhere in the input.
///
/// The DFA is built at build time and written out as Rust code,
/// so it is a compile error for the pattern to need more DFA states than the default limit.
#[proc_macro]
pub fn static_matcher(stream: TokenStream) -> TokenStream {
    return fastregex_core::codegen::__static_matcher_macro(stream.into()).into();
}
