use std::hash::Hasher;

#[macro_use]
mod common;

use common::engines;
use fastregex::{Config, EngineKind, Regex, VectorWidth};

#[test]
fn phone_number() {
    for regex in &engines(r"^(\+1 )?[0-9]{3}-[0-9]{3}-[0-9]{4}$") {
        assert_match!(regex, "012-345-6789", [Some("012-345-6789"), None]);
        assert_match!(regex, "987-654-3210", [Some("987-654-3210"), None]);
        assert_match!(
            regex,
            "+1 555-555-5555",
            [Some("+1 555-555-5555"), Some("+1 ")],
        );
        assert_match!(regex, "123-555-9876", [Some("123-555-9876"), None]);

        assert_nomatch!(
            regex,
            "abcd",
            "0123456789",
            "012--345-6789",
            "(555) 555-5555",
            "1 555-555-5555",
        );
    }
}

#[test]
fn short_phone_number() {
    for regex in &engines(r"^\d{3}-\d{4}$") {
        assert_match!(regex, "123-4567", [Some("123-4567")]);
        assert_nomatch!(regex, "12-3456", "1234-567", "123-4567\n", "x123-4567");
    }
}

#[test]
fn concrete_spans() {
    for regex in &engines("a+b") {
        assert_eq!(regex.find("aaab").unwrap().unwrap().range(), 0..4);
    }
    for regex in &engines("(ab)+") {
        let caps = regex.captures("ababab").unwrap().unwrap();
        assert_eq!(caps.spans(), vec![Some((0, 6)), Some((4, 6))]);
    }
}

#[test]
fn byte_value() {
    for regex in &engines(r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9])$") {
        for i in 0u8..=255u8 {
            let text = i.to_string();

            assert_match!(regex, text, [Some(text.as_str()), Some(text.as_str())]);
        }

        assert_nomatch!(regex, "abcd", "00", "256",);
    }
}

#[test]
fn ipv4() {
    let pattern = r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9])$";
    for regex in &engines(pattern) {
        for i in 0..=2000 {
            // deterministic pseudo-random numbers via hashing
            let mut hasher = std::hash::DefaultHasher::new();
            hasher.write_u32(i);
            let i = hasher.finish();
            let [_, _, a, b, c, d, _, _] = i.to_be_bytes();
            let a = a.to_string();
            let b = b.to_string();
            let c = c.to_string();
            let d = d.to_string();
            let text = format!("{a}.{b}.{c}.{d}");

            assert_match!(
                regex,
                text,
                [Some(text.as_str()), Some(&a), Some(&b), Some(&c), Some(&d)],
            );
        }
        assert_nomatch!(regex, "abcd", "1.1.1", "...", "1::", "256.0.0.0",);
    }
}

#[test]
fn needle() {
    for regex in &engines(r"nee+dle") {
        assert_match!(regex, "needle", [Some("needle")]);
        assert_match!(regex, "haystackhaysneedletackhaystack", [Some("needle")]);
        assert_match!(
            regex,
            "haystackneeeeeeeeedlehaystack",
            [Some("neeeeeeeeedle")]
        );
        assert_match!(regex, "needneedlele", [Some("needle")]);

        assert_nomatch!(
            regex,
            "haystackhaystack",
            "0123456789",
            "nothinghere",
            "npuowahpeoifjap098uq09p3ior",
            "nedle",
        );
    }
}

#[test]
fn dot() {
    for regex in &engines("^.$") {
        for c in ('\0'..=char::MAX).step_by(7).chain(['\u{7F}', '\u{80}', char::MAX]) {
            if c == '\n' {
                continue;
            }
            let text = c.to_string();

            assert_match!(regex, text, [Some(text.as_str())]);
        }

        assert_nomatch!(regex, "\n", "12", "å©", "");
    }
}

#[test]
fn duplicate_paths() {
    for regex in &engines("^(ab|bc|ab|bc)(xy|yz|yz|xy)$") {
        assert_match!(regex, "abxy", [Some("abxy"), Some("ab"), Some("xy")]);
        assert_match!(regex, "abyz", [Some("abyz"), Some("ab"), Some("yz")]);
        assert_match!(regex, "bcxy", [Some("bcxy"), Some("bc"), Some("xy")]);
        assert_match!(regex, "bcyz", [Some("bcyz"), Some("bc"), Some("yz")]);

        assert_nomatch!(regex, "acxy", "abxz", "bc", "yz");
    }
}

#[test]
fn hex_color() {
    for regex in &engines("^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$") {
        assert_match!(
            regex,
            "#abcdef",
            [Some("#abcdef"), Some("ab"), Some("cd"), Some("ef")]
        );
        assert_match!(
            regex,
            "#FfFfFf",
            [Some("#FfFfFf"), Some("Ff"), Some("Ff"), Some("Ff")]
        );
        assert_match!(
            regex,
            "#000000",
            [Some("#000000"), Some("00"), Some("00"), Some("00")]
        );

        assert_nomatch!(regex, "#qaaaaa", "#12345", "#1234567");
    }
}

#[test]
fn iso8601_date_extended() {
    for regex in &engines("^([0-9]{4})-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$") {
        assert_match!(
            regex,
            "2000-01-01",
            [Some("2000-01-01"), Some("2000"), Some("01"), Some("01")]
        );

        assert_nomatch!(regex, "a", "1999-1-1", "2000-00-00");
    }
}

#[test]
fn iso8601_time_extended() {
    for regex in &engines(r"^T?([01][0-9]|2[0-3]):([0-5][0-9]):([0-5][0-9]([.,][0-9]+)?)$") {
        assert_match!(
            regex,
            "T00:00:00",
            [Some("T00:00:00"), Some("00"), Some("00"), Some("00"), None]
        );
        assert_match!(
            regex,
            "23:59:59.9999",
            [
                Some("23:59:59.9999"),
                Some("23"),
                Some("59"),
                Some("59.9999"),
                Some(".9999")
            ]
        );

        assert_nomatch!(regex, "24:00:00", "212345", "00:60:00", "00:00:60");
    }
}

#[test]
fn line_abc() {
    for regex in &engines("(^|\n)abc(\n|$)") {
        assert_match!(regex, "abc", [Some("abc"), Some(""), Some("")]);
        assert_match!(regex, "\nabc", [Some("\nabc"), Some("\n"), Some("")]);
        assert_match!(regex, "abc\n", [Some("abc\n"), Some(""), Some("\n")]);
        assert_match!(
            regex,
            "\n\nabc\n",
            [Some("\nabc\n"), Some("\n"), Some("\n")],
        );
        assert_nomatch!(regex, "ac", "\n\n", "\nab", "bc\n");
    }
}

#[test]
fn multiline_anchors() {
    for regex in &engines("(?m)^abc$") {
        assert_match!(regex, "x\nabc\ny", [Some("abc")]);
        assert_match!(regex, "abc", [Some("abc")]);
        assert_nomatch!(regex, "xabc\n", "abcx");
    }
}

#[test]
fn word_boundaries() {
    for regex in &engines(r"\bcat\b") {
        assert_match!(regex, "a cat sat", [Some("cat")]);
        assert_match!(regex, "cat", [Some("cat")]);
        assert_nomatch!(regex, "concatenate", "cats", "bobcat_");
    }
    for regex in &engines(r"\Bcat") {
        assert_match!(regex, "bobcat", [Some("cat")]);
        assert_nomatch!(regex, "cat", "a cat");
    }
}

#[test]
fn us_state_abbreviations() {
    const STATES_STR: &str = "AL|AK|AZ|AR|CA|CO|CT|DE|FL|GA|HI|ID|IL|IN|IA|KS|KY|LA|ME|MD|MA|MI|MN|MS|MO|MT|NE|NV|NH|NJ|NM|NY|NC|ND|OH|OK|OR|PA|RI|SC|SD|TN|TX|UT|VT|VA|WA|WV|WI|WY";
    for regex in &engines(STATES_STR) {
        for first in 'A'..='Z' {
            for second in 'A'..='Z' {
                let combined = format!("{first}{second}");
                if STATES_STR.split('|').any(|state| state == combined) {
                    assert_match!(regex, combined, [Some(combined.as_str())]);
                } else {
                    assert_nomatch!(regex, combined);
                }
            }
        }

        assert_match!(regex, "ALABAMA", [Some("AL")]);
        assert_match!(regex, "REAL", [Some("AL")]);
        assert_match!(regex, "TACO", [Some("CO")]);
        assert_match!(regex, "TXT", [Some("TX")]);
        assert_match!(regex, "MEME", [Some("ME")]);
        assert_match!(regex, "ORCA", [Some("OR")]);
        assert_match!(regex, "WYVERN", [Some("WY")]);
        assert_match!(regex, "WHINE", [Some("HI")]);

        assert_nomatch!(regex, "Alabama", "ct");
    }
}

#[test]
fn find_quoted() {
    for regex in &engines(r#""((\\"|[^"])*)""#) {
        assert_match!(regex, r#""""#, [Some(r#""""#), Some(""), None]);
        assert_match!(
            regex,
            r#""a\"""#,
            [Some(r#""a\"""#), Some(r#"a\""#), Some(r#"\""#)]
        );
        assert_match!(
            regex,
            r#""a\"c""#,
            [Some(r#""a\"c""#), Some(r#"a\"c"#), Some(r#"c"#)]
        );
        assert_match!(
            regex,
            r#"before"a\"c""#,
            [Some(r#""a\"c""#), Some(r#"a\"c"#), Some(r#"c"#)]
        );
        assert_match!(
            regex,
            r#""a\" e"after"#,
            [Some(r#""a\" e""#), Some(r#"a\" e"#), Some(r#"e"#)]
        );

        assert_nomatch!(
            regex,
            "unquoted",
            r#""unended"#,
            r#"unstarted""#,
            "'single quotes'"
        );
    }
}

#[test]
fn find_discord_emoji() {
    for regex in &engines(":[[:alnum:]_]{2,}:") {
        assert_match!(regex, ":crab:", [Some(":crab:")]);
        assert_match!(regex, "this crate is fire :fire:", [Some(":fire:")]);
        assert_match!(
            regex,
            ":regional_indicator_e::regional_indicator_r::regional_indicator_e:",
            [Some(":regional_indicator_e:")],
        );
        assert_match!(regex, "writing :pencil2:", [Some(":pencil2:")],);

        assert_nomatch!(
            regex,
            "without emojis",
            "unended :emoji",
            "emoji is unstarted:",
            "turbofish::<>",
            "single char :a:",
            ":with-dash:",
            "this is a noun: apple\nthis is a verb: jump"
        );
    }
}

#[test]
fn html_comment() {
    for regex in &engines("<!--.*?-->") {
        assert_match!(regex, "<!---->", [Some("<!---->")]);
        assert_match!(regex, "<!-- comment -->", [Some("<!-- comment -->")]);
        assert_match!(
            regex,
            "<div><!-- comment --></div>",
            [Some("<!-- comment -->")]
        );
        assert_match!(
            regex,
            "<div><!-- comment -->--></div>",
            [Some("<!-- comment -->")]
        );
        assert_match!(
            regex,
            "<div><!--<!-- comment -->--></div>",
            [Some("<!--<!-- comment -->")]
        );
        assert_match!(
            regex,
            "<!--<!-- comment -->-->",
            [Some("<!--<!-- comment -->")]
        );
    }
}

#[test]
fn http_request() {
    // based on https://www.rfc-editor.org/rfc/rfc9112.pdf
    let pattern = "^([A-Z]+) ([^[:space:]]+) (HTTP/[0-9].[0-9])\r\n\
        (([!#$%&'*+-.^_`|~[:alnum:]]+:[ \t]*[^\r\n]*?[ \t]*\r\n)*)\
        \r\n\
        ([\0-\u{10FFFF}]*)$";
    for regex in &engines(pattern) {
        let text = "GET /index.html HTTP/1.1\r\n\
        header-one: header-text\r\n\
        header-two: header-text-two\r\n\
        \r\n\
        HTTP body here";
        assert_match!(
            regex,
            text,
            [
                Some(text),
                Some("GET"),
                Some("/index.html"),
                Some("HTTP/1.1"),
                Some(
                    "header-one: header-text\r\n\
                    header-two: header-text-two\r\n"
                ),
                Some("header-two: header-text-two\r\n"),
                Some("HTTP body here"),
            ],
        );

        let text = "GET / HTTP/1.1\r\n\r\n";
        assert_match!(
            regex,
            text,
            [
                Some(text),
                Some("GET"),
                Some("/"),
                Some("HTTP/1.1"),
                Some(""),
                None,
                Some(""),
            ],
        );

        assert_nomatch!(
            regex,
            "obviously not http",
            "",
            "GET / HTTP/1.1\n\nwithout carriage return",
            "first GET / HTTP/1.1\r\n\r\npreceded",
            "OPTION /invalid url HTTP/1.1\r\n\r\nbody",
        );
    }
}

#[test]
fn uri_with_authority() {
    for regex in &engines(r"^([[:alpha:]][[:alnum:]-+.]+)://([^?#]+)([?][^#]*)?(#[^#]*)?$") {
        assert_match!(
            regex,
            "https://example.com",
            [
                Some("https://example.com"),
                Some("https"),
                Some("example.com"),
                None,
                None
            ]
        );
        assert_match!(
            regex,
            "https://subdomain.example.com/category/page2?query=1234",
            [
                Some("https://subdomain.example.com/category/page2?query=1234"),
                Some("https"),
                Some("subdomain.example.com/category/page2"),
                Some("?query=1234"),
                None
            ]
        );
        assert_match!(
            regex,
            "https://subdomain.example.com/category/page2?query=1234#fragment",
            [
                Some("https://subdomain.example.com/category/page2?query=1234#fragment"),
                Some("https"),
                Some("subdomain.example.com/category/page2"),
                Some("?query=1234"),
                Some("#fragment")
            ]
        );
    }
}

#[test]
fn named_groups() {
    for regex in &engines(r"(?P<year>\d{4})-(?<month>\d{2})") {
        let caps = regex.captures("on 2024-06!").unwrap().unwrap();
        assert_eq!(caps.name("year").unwrap().as_str(), Some("2024"));
        assert_eq!(caps.name("month").unwrap().as_str(), Some("06"));
        assert_eq!(
            regex.capture_names().collect::<Vec<_>>(),
            vec![None, Some("year"), Some("month")]
        );
    }
}

#[test]
fn case_insensitive() {
    for regex in &engines("(?i)straße|ǅ") {
        assert_match!(regex, "STRAßE", [Some("STRAßE")]);
        assert_match!(regex, "ǆ", [Some("ǆ")]);
        assert_nomatch!(regex, "strasse");
    }
    for regex in &engines("a(?i:b)c") {
        assert_match!(regex, "aBc", [Some("aBc")]);
        assert_nomatch!(regex, "ABC", "abC");
    }
}

#[test]
fn unicode() {
    for regex in &engines(r"\p{Greek}+") {
        assert_match!(regex, "abc αβγ def", [Some("αβγ")]);
        assert_nomatch!(regex, "abc");
    }
    for regex in &engines(r"[^a-z]") {
        assert_match!(regex, "abc€", [Some("€")]);
    }
}

#[test]
fn greedy() {
    let cases: &[(&str, &str, &[Option<&str>])] = &[
        (r"^(a|ab)b?cd$", "abcd", &[Some("abcd"), Some("a")]),
        (r"^(ab|a)b?cd$", "abcd", &[Some("abcd"), Some("ab")]),
        (
            r"^(a*)(a*)$",
            "aaaaaaaa",
            &[Some("aaaaaaaa"), Some("aaaaaaaa"), Some("")],
        ),
        (r"a*", "aaaaaaaa", &[Some("aaaaaaaa")]),
        (r"a*", "aabaaaaaa", &[Some("aa")]),
        // with shortest
        (r"a*?", "aaaaaaaa", &[Some("")]),
        (r"a*?|a*", "aaaaaaaa", &[Some("")]),
        (r"a*?|a*", "aaaabaaaa", &[Some("")]),
        // the second alternative wins because it matches the `a` first,
        // without waiting to find the `b`
        (r"ba*?b|a*", "abaaabaaaa", &[Some("a")]),
        (r"a??", "abaaabaaaa", &[Some("")]),
        ("()^a|()c", "a", &[Some("a"), Some(""), None]),
        ("()^a|()c", "c", &[Some("c"), None, Some("")]),
        ("()^a|()c", "bc", &[Some("c"), None, Some("")]),
        ("(?U)a+", "aaa", &[Some("a")]),
        ("(?U)a+?", "aaa", &[Some("aaa")]),
    ];
    for (pattern, text, groups) in cases {
        for regex in &engines(pattern) {
            assert_match!(regex, text, **groups);
        }
    }
}

/// Once a repeated group has matched empty, another empty pass must not outrank leaving the loop.
#[test]
fn empty_repetition_bodies() {
    let cases: &[(&str, &str, &[Option<&str>])] = &[
        ("(?:a*?)+", "aa", &[Some("")]),
        ("(?:^|.)+", "c", &[Some("")]),
        ("(?:[^a]*?)+", " 11", &[Some("")]),
        ("(a*)*", "b", &[Some(""), Some("")]),
        ("(a*)+", "b", &[Some(""), Some("")]),
        ("(?:a*?){2,}", "aa", &[Some("")]),
        ("(?:a*?){0,3}", "aa", &[Some("")]),
        ("(a*){1,3}", "b", &[Some(""), Some("")]),
        ("(?:a*)+b", "aab", &[Some("aab")]),
        ("(?:a|b?)+", "ab", &[Some("ab")]),
    ];
    for (pattern, text, groups) in cases {
        for regex in &engines(pattern) {
            assert_match!(regex, text, **groups);
            let found = regex.find(text).unwrap().unwrap();
            assert_eq!(found.start(), 0, "{regex:?} on {text:?}");
        }
    }
}

#[test]
fn full_match() {
    let cases: &[(&str, &str, bool)] = &[
        ("a|ab", "ab", true),
        ("ab|a", "a", true),
        (r"\d+", "123", true),
        (r"\d+", "123a", false),
        (r"\d+", "", false),
        ("a*", "", true),
        ("a*?", "aaa", true),
        ("^abc$", "abc", true),
        ("(?m)^a$", "a\nb", false),
        (r"\bfoo\b", "foo", true),
        (r"\Bfoo", "foo", false),
        ("é+", "éé", true),
        ("(a+)(b+)?", "aab", true),
        ("(a+)(b+)?", "aabc", false),
    ];
    for (pattern, text, expected) in cases {
        for regex in &engines(pattern) {
            assert_eq!(regex.is_full_match(text), Ok(*expected), "{regex:?} on {text:?}");
        }
    }
}

#[test]
fn full_match_after_cache_fills() {
    let config = Config::builder()
        .max_dfa_states(0)
        .lazy_cache_capacity(8)
        .build();
    let regex = Regex::with_config("[ab]*a[ab]{6}", config).unwrap();
    let oracle = Regex::with_config("[ab]*a[ab]{6}", Config::builder().nfa_only(true).build()).unwrap();
    for haystack in ["abbabababbbabaabbbbaaab", "abbabababbbabaabbbbaaabb", "aabbbbbbb"] {
        assert_eq!(regex.is_full_match(haystack), oracle.is_full_match(haystack), "{haystack:?}");
    }
    assert_eq!(regex.is_full_match("abbbbbb"), Ok(true));
    assert_eq!(regex.is_full_match("bbbbbbb"), Ok(false));
}

#[test]
fn resolved_vector_width() {
    for width in [VectorWidth::Auto, VectorWidth::W256, VectorWidth::W128] {
        let config = Config::builder().vector_width(width).build();
        let regex = Regex::with_config("[0-9]+", config).unwrap();
        assert_ne!(regex.vector_width(), VectorWidth::Auto);
    }
    let scalar = Config::builder().vector_width(VectorWidth::Scalar).build();
    assert_eq!(
        Regex::with_config("[0-9]+", scalar).unwrap().vector_width(),
        VectorWidth::Scalar
    );
    #[cfg(target_arch = "x86_64")]
    {
        let sse = Config::builder().vector_width(VectorWidth::W128).build();
        assert_eq!(
            Regex::with_config("[0-9]+", sse).unwrap().vector_width(),
            VectorWidth::W128
        );
    }
}

#[test]
fn compile_diagnostics() {
    let regex = Regex::new(r"(\w+)@(\w+)\.com").unwrap();
    assert_eq!(regex.is_jit_compiled(), regex.engine() == EngineKind::Jit);
    let nfa_only = Regex::with_config("a+", Config::builder().nfa_only(true).build()).unwrap();
    assert!(!nfa_only.is_jit_compiled());
    assert!(regex.compile_time() > std::time::Duration::ZERO);
}
