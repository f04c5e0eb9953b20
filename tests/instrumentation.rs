//! Checks the cost of searches through the counters in [`SearchStats`].

use std::sync::Arc;

use fastregex::{Config, MatchError, Regex, SearchStats};

fn stats(regex: &Regex, haystack: &[u8]) -> SearchStats {
    let (found, stats) = regex.find_at_with_stats(haystack, 0);
    found.unwrap();
    return stats;
}

#[test]
fn prefilter_skips_to_the_only_occurrence() {
    let mut haystack = vec![b'x'; 1 << 20];
    haystack[700_000..700_005].copy_from_slice(b"hello");
    let regex = Regex::new("hello").unwrap();

    let (found, stats) = regex.find_at_with_stats(&haystack, 0);
    assert_eq!(found.unwrap().unwrap().range(), 700_000..700_005);
    assert!(stats.prefilter_calls >= 1 && stats.prefilter_calls <= 2, "{stats:?}");
    assert!(stats.dfa_transitions < 32, "{stats:?}");
    assert_eq!(stats.nfa_steps, 0);

    let without = Regex::with_config("hello", Config::builder().prefilter(false).build()).unwrap();
    let (found, stats) = without.find_at_with_stats(&haystack, 0);
    assert_eq!(found.unwrap().unwrap().range(), 700_000..700_005);
    assert_eq!(stats.prefilter_calls, 0);
    assert!(stats.dfa_transitions > 700_000, "{stats:?}");
}

#[test]
fn prefilter_restarts_after_false_candidates() {
    let haystack = "hx".repeat(500) + "hello";
    let regex = Regex::new("h[ae]llo").unwrap();
    let (found, stats) = regex.find_at_with_stats(&haystack, 0);
    assert_eq!(found.unwrap().unwrap().range(), 1000..1005);
    assert!(stats.prefilter_calls > 100, "{stats:?}");
}

#[test]
fn no_candidates_means_no_transitions() {
    let haystack = vec![b'x'; 1 << 16];
    let regex = Regex::new("[0-9]+").unwrap();
    let (found, stats) = regex.find_at_with_stats(&haystack, 0);
    assert_eq!(found.unwrap(), None);
    assert_eq!(stats.prefilter_calls, 1);
    assert_eq!(stats.dfa_transitions, 0);
}

/// `(a?){n}a{n}` is the classic exponential case for backtracking engines.
#[test]
fn pathological_pattern_is_linear() {
    let pattern = "(a?){30}a{30}";
    let no_match = |periods: usize| ("a".repeat(29) + "b").repeat(periods);
    let configs = [
        Config::builder().prefilter(false).build(),
        Config::builder().prefilter(false).max_dfa_states(0).build(),
        Config::builder().nfa_only(true).build(),
    ];
    for config in configs {
        let regex = Regex::with_config(pattern, config).unwrap();
        let short = stats(&regex, no_match(100).as_bytes());
        let long = stats(&regex, no_match(200).as_bytes());
        let work = |stats: SearchStats| stats.dfa_transitions + stats.nfa_steps;
        let (short, long) = (work(short), work(long));
        assert!(short > 0);
        // twice the input, twice the work (give or take the constant setup)
        let slack = short / 8;
        assert!(long <= 2 * short + slack, "{regex:?}: {short} then {long}");
        assert!(long + slack >= 2 * short, "{regex:?}: {short} then {long}");
    }

    let regex = Regex::with_config(pattern, Config::builder().prefilter(false).build()).unwrap();
    let haystack = no_match(1000);
    let stats = stats(&regex, haystack.as_bytes());
    assert!(stats.dfa_transitions <= haystack.len() as u64 + 1, "{stats:?}");

    let haystack = "a".repeat(60);
    let found = regex.find(&haystack).unwrap().unwrap();
    assert_eq!(found.range(), 0..60);
}

#[test]
fn step_budget_is_not_a_miss() {
    let haystack = "a".repeat(10_000);
    for config in [
        Config::builder().step_budget(Some(1_000)),
        Config::builder().step_budget(Some(1_000)).nfa_only(true),
        Config::builder().step_budget(Some(1_000)).max_dfa_states(0),
    ] {
        let regex = Regex::with_config("a*b", config.build()).unwrap();
        assert_eq!(
            regex.find(&haystack),
            Err(MatchError::StepBudgetExceeded { budget: 1_000 })
        );
        assert_eq!(regex.find("aab").unwrap().unwrap().range(), 0..3);
        assert_eq!(regex.find("zzz").unwrap(), None);
    }
}

#[test]
fn shared_lazy_regex() {
    let config = Config::builder().max_dfa_states(0).build();
    let regex = Arc::new(Regex::with_config(r"(\w+)@(\w+)\.(com|org)", config).unwrap());
    let oracle = Regex::with_config(
        r"(\w+)@(\w+)\.(com|org)",
        Config::builder().nfa_only(true).build(),
    )
    .unwrap();

    let haystacks: Vec<String> = (0..16)
        .map(|i| {
            (0..50)
                .map(|j| format!("user{i}x{j}@host{j}.{} ", ["com", "org", "net"][(i + j) % 3]))
                .collect()
        })
        .collect();
    let expected: Vec<Vec<_>> = haystacks
        .iter()
        .map(|haystack| {
            oracle
                .captures_iter(haystack)
                .map(|caps| caps.unwrap().spans())
                .collect()
        })
        .collect();

    std::thread::scope(|scope| {
        for (haystack, expected) in haystacks.iter().zip(&expected) {
            let regex = Arc::clone(&regex);
            scope.spawn(move || {
                for _ in 0..4 {
                    let found: Vec<_> = regex
                        .captures_iter(haystack)
                        .map(|caps| caps.unwrap().spans())
                        .collect();
                    assert_eq!(&found, expected);
                }
            });
        }
    });
}
