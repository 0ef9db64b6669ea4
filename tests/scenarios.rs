use relang::prelude::*;

fn ab() -> Alphabet {
    Alphabet::from("ab")
}

fn words(max_len: usize) -> Vec<String> {
    KleeneStar::new(ab().universe())
        .up_to(max_len)
        .map(|w| w.into_iter().collect())
        .collect()
}

/// Accepts exactly the word `word`.
fn only(word: &str) -> DFA {
    let mut transitions = vec![];
    for (i, sym) in word.chars().enumerate() {
        transitions.push((format!("p{i}"), sym, format!("p{}", i + 1)));
    }
    AutomatonBuilder::new()
        .with_states((0..=word.len()).map(|i| format!("p{i}")))
        .with_alphabet(ab())
        .with_transitions(transitions)
        .with_final_states([format!("p{}", word.len())])
        .into_dfa("p0")
        .unwrap()
}

#[test_log::test]
fn union_of_letters_from_a_pattern() {
    let re = Regex::new("a|b", ab()).unwrap();
    assert!(re.is_match("a"));
    assert!(re.is_match("b"));
    assert!(!re.is_match(""));
    assert!(!re.is_match("ab"));
}

#[test_log::test]
fn star_of_union_accepts_every_word() {
    let re = Regex::new("(a|b)*", ab()).unwrap();
    assert!(re.is_match(""));
    assert!(re.is_match("aabba"));
    for w in words(5) {
        assert!(re.is_match(&w), "rejected {w}");
    }
}

#[test_log::test]
fn equivalent_tails_are_merged() {
    let dfa = AutomatonBuilder::new()
        .with_transitions([
            ("q0", 'a', "q1"),
            ("q0", 'b', "q2"),
            ("q1", 'a', "q1"),
            ("q1", 'b', "q3"),
            ("q2", 'a', "q2"),
            ("q2", 'b', "q3"),
        ])
        .with_final_states(["q3"])
        .into_dfa("q0")
        .unwrap();
    let minimal = dfa.minimize();
    assert_eq!(minimal.size(), 3);
    for w in ["ab", "aab", "ba"] {
        assert_eq!(dfa.accepts(w), minimal.accepts(w), "{w}");
    }
    assert!(minimal.accepts("aab"));
    assert!(!minimal.accepts("ba"));
}

#[test_log::test]
fn union_of_singletons() {
    let either = operations::union(&only("a"), &only("b")).unwrap();
    assert!(either.accepts("a"));
    assert!(either.accepts("b"));
    assert!(!either.accepts(""));
    assert!(!either.accepts("ab"));
}

#[test_log::test]
fn disjoint_languages_have_empty_intersection() {
    let starts_with_a = Regex::new("a(a|b)*", ab()).unwrap().into_automaton();
    let starts_with_b = Regex::new("b(a|b)*", ab()).unwrap().into_automaton();
    let both = operations::intersection(&starts_with_a, &starts_with_b).unwrap();
    for w in words(4) {
        assert!(!both.accepts(&w), "accepted {w}");
    }
    assert!(both.to_dfa().is_empty_language());
}

#[test]
fn serialized_automata_round_trip() {
    let enfa = Regex::new("(ab|ε)*b?", ab()).unwrap().into_automaton();
    let json = enfa.to_json();
    let back = EpsilonNFA::from_json(&json).unwrap();
    assert_eq!(back, enfa);

    let any = AnyAutomaton::from_json(&enfa.to_nfa().to_json()).unwrap();
    assert_eq!(any.kind(), AutomatonKind::NFA);
    for w in words(5) {
        assert_eq!(any.accepts(&w), enfa.accepts(&w), "{w}");
    }
}

#[test]
fn invalid_input_is_rejected_early() {
    assert!(matches!(
        Regex::new("a|(b", ab()),
        Err(RegexError::Parse { position: 2, .. })
    ));
    assert!(matches!(
        AutomatonBuilder::new()
            .with_states(["p", "q"])
            .with_transitions([("p", 'a', "q")])
            .with_final_states(["r"])
            .into_dfa("p"),
        Err(InvalidAutomatonError { .. })
    ));
    let other = AutomatonBuilder::new()
        .with_alphabet("xy")
        .with_transitions([("p", 'x', "p")])
        .into_dfa("p")
        .unwrap();
    assert!(matches!(
        operations::union(&only("a"), &other),
        Err(OperationError::IncompatibleAutomata { .. })
    ));
}

#[test_log::test]
fn engine_pipeline() {
    let engine = ConversionEngine::new(EngineConfig::default().with_max_states(64));
    let enfa = engine.compile_regex("(a|b)*a(a|b)(a|b)", &ab()).unwrap();
    let minimal = engine.minimize(enfa.as_ref()).unwrap();
    assert_eq!(minimal.size(), 8);
    assert_eq!(engine.check_equivalence(enfa.as_ref(), minimal.as_ref()), None);

    let tight = ConversionEngine::new(EngineConfig::default().with_max_states(100));
    let blowup = tight
        .compile_regex("(a|b)*a(a|b)(a|b)(a|b)(a|b)(a|b)(a|b)", &ab())
        .unwrap();
    assert!(matches!(
        tight.to_dfa(blowup.as_ref()),
        Err(Error::Conversion(ConversionError::Memory { .. }))
    ));
    assert_eq!(tight.stats().memory_rejections, 1);
}
