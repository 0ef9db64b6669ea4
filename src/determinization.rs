//! Subset construction for [`NFA`]s and [`EpsilonNFA`]s.
//!
//! Every set of states that is discovered becomes one state of the resulting [`DFA`]. The
//! name of that state is the sorted list of its members, e.g. `{q0,q2}`, so running the
//! construction twice on the same input yields the same automaton.

use std::collections::VecDeque;

use tracing::debug;

use crate::{
    alphabet::{Alphabet, Symbol},
    automaton::{set_label, DeterministicTransitions, EpsilonNFA, FiniteAutomaton, State, DFA, NFA},
    budget::{unbounded, Budget, Unbounded},
    math::{Map, OrderedSet},
};

/// Memoizes epsilon closures of an [`EpsilonNFA`], keyed by the exact input set.
pub struct Closures<'a> {
    enfa: &'a EpsilonNFA,
    memo: Map<OrderedSet<State>, OrderedSet<State>>,
}

impl<'a> Closures<'a> {
    /// Creates an empty memo for `enfa`.
    pub fn new(enfa: &'a EpsilonNFA) -> Self {
        Self {
            enfa,
            memo: Map::default(),
        }
    }

    /// Returns the epsilon closure of `states`, computing it only on the first request.
    pub fn closure(&mut self, states: &OrderedSet<State>) -> OrderedSet<State> {
        if let Some(closure) = self.memo.get(states) {
            return closure.clone();
        }
        let closure = self.enfa.epsilon_closure(states);
        self.memo.insert(states.clone(), closure.clone());
        closure
    }

    /// The number of distinct sets whose closure has been computed.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Returns true if no closure has been computed yet.
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

/// Runs the worklist algorithm shared by both constructions. `step` computes the successor
/// set of a discovered set on a symbol, `accepting` decides whether a set becomes final.
fn determinize<B, S, F>(
    alphabet: &Alphabet,
    initial: OrderedSet<State>,
    accepting: F,
    mut step: S,
    budget: &mut B,
) -> Result<DFA, B::Error>
where
    B: Budget,
    S: FnMut(&OrderedSet<State>, Symbol) -> OrderedSet<State>,
    F: Fn(&OrderedSet<State>) -> bool,
{
    let mut names: Map<OrderedSet<State>, State> = Map::default();
    let mut states = OrderedSet::new();
    let mut finals = OrderedSet::new();
    let mut table = DeterministicTransitions::default();

    let initial_name = set_label(&initial);
    names.insert(initial.clone(), initial_name.clone());
    states.insert(initial_name.clone());
    budget.admit(states.len())?;
    let mut queue = VecDeque::from([initial]);

    while let Some(current) = queue.pop_front() {
        let name = names[&current].clone();
        if accepting(&current) {
            finals.insert(name.clone());
        }
        for sym in alphabet.universe() {
            budget.step()?;
            let next = step(&current, sym);
            if next.is_empty() {
                continue;
            }
            let target = match names.get(&next) {
                Some(target) => target.clone(),
                None => {
                    let target = set_label(&next);
                    names.insert(next.clone(), target.clone());
                    states.insert(target.clone());
                    budget.admit(states.len())?;
                    queue.push_back(next);
                    target
                }
            };
            table.0.entry(name.clone()).or_default().insert(sym, target);
        }
    }

    Ok(DFA::from_parts(
        states,
        alphabet.clone(),
        table,
        initial_name,
        finals,
    ))
}

/// Converts `nfa` into an equivalent [`DFA`] by the subset construction, starting from the
/// set containing only the initial state. Sets that cannot be reached are never built and
/// empty successor sets are left out, so the result is not necessarily complete.
pub fn subset_construction(nfa: &NFA) -> DFA {
    unbounded(subset_construction_bounded(nfa, &mut Unbounded))
}

/// Like [`subset_construction`], but aborts as soon as `budget` is exhausted.
pub fn subset_construction_bounded<B: Budget>(nfa: &NFA, budget: &mut B) -> Result<DFA, B::Error> {
    let dfa = determinize(
        nfa.alphabet(),
        OrderedSet::from([nfa.initial_state().clone()]),
        |set| set.iter().any(|q| nfa.is_final(q)),
        |set, sym| nfa.step(set, sym),
        budget,
    )?;
    debug!(
        "subset construction turned {} NFA states into {} DFA states",
        nfa.size(),
        dfa.size()
    );
    Ok(dfa)
}

/// Converts `enfa` into an equivalent [`DFA`], treating epsilon closures as the states of the
/// construction. This avoids building the intermediate [`NFA`].
pub fn epsilon_subset_construction(enfa: &EpsilonNFA) -> DFA {
    unbounded(epsilon_subset_construction_bounded(enfa, &mut Unbounded))
}

/// Like [`epsilon_subset_construction`], but aborts as soon as `budget` is exhausted.
pub fn epsilon_subset_construction_bounded<B: Budget>(
    enfa: &EpsilonNFA,
    budget: &mut B,
) -> Result<DFA, B::Error> {
    let mut closures = Closures::new(enfa);
    let initial = closures.closure(&OrderedSet::from([enfa.initial_state().clone()]));
    let dfa = determinize(
        enfa.alphabet(),
        initial,
        |set| set.iter().any(|q| enfa.is_final(q)),
        |set, sym| {
            let moved = enfa.step(set, sym);
            if moved.is_empty() {
                moved
            } else {
                closures.closure(&moved)
            }
        },
        budget,
    )?;
    debug!(
        "direct subset construction turned {} epsilon-NFA states into {} DFA states",
        enfa.size(),
        dfa.size()
    );
    Ok(dfa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Bounded;
    use crate::error::ConversionError;
    use crate::prelude::*;

    #[test_log::test]
    fn subset_construction() {
        let nfa = AutomatonBuilder::new()
            .with_transitions([
                ("0", 'a', "0"),
                ("0", 'a', "1"),
                ("0", 'b', "1"),
                ("1", 'b', "1"),
                ("1", 'a', "0"),
            ])
            .with_final_states(["1"])
            .into_nfa("0")
            .unwrap();

        let dfa = nfa.to_dfa();
        assert_eq!(
            dfa.states().iter().cloned().collect::<Vec<_>>(),
            vec!["{0,1}", "{0}", "{1}"]
        );
        assert_eq!(dfa.initial_state(), "{0}");
        assert_eq!(dfa.successor("{0}", 'a').map(String::as_str), Some("{0,1}"));
        assert!(dfa.is_final("{1}"));
        assert!(dfa.is_final("{0,1}"));
        assert!(!dfa.is_final("{0}"));

        for w in KleeneStar::new(['a', 'b']).up_to(5) {
            assert_eq!(nfa.accepts(&w), dfa.accepts(&w), "{}", w.as_string());
        }
        assert_eq!(dfa, nfa.to_dfa());
    }

    #[test_log::test]
    fn sets_of_separator_names_get_distinct_states() {
        let nfa = AutomatonBuilder::new()
            .with_transitions([
                ("s", 'x', "a"),
                ("s", 'x', "b"),
                ("s", 'y', "a,b"),
                ("a", 'x', "f"),
            ])
            .with_final_states(["f"])
            .into_nfa("s")
            .unwrap();
        let dfa = nfa.to_dfa();
        assert_ne!(dfa.successor("{s}", 'x'), dfa.successor("{s}", 'y'));
        assert!(dfa.states().contains(r"{a\,b}"));
        for w in KleeneStar::new(['x', 'y']).up_to(3) {
            assert_eq!(nfa.accepts(&w), dfa.accepts(&w), "{}", w.as_string());
        }
        assert!(!dfa.accepts("yx"));
        assert_eq!(dfa.minimize().size(), 4);
    }

    #[test]
    fn empty_successor_sets_are_omitted() {
        let nfa = AutomatonBuilder::new()
            .with_alphabet("ab")
            .with_transitions([("0", 'a', "1")])
            .with_final_states(["1"])
            .into_nfa("0")
            .unwrap();
        let dfa = nfa.to_dfa();
        assert_eq!(dfa.size(), 2);
        assert!(dfa.successor("{0}", 'b').is_none());
        assert!(!dfa.is_complete());
    }

    #[test]
    fn closures_are_memoized() {
        let enfa = AutomatonBuilder::new()
            .with_epsilon_transitions([("0", "1")])
            .with_transitions([("1", 'a', "0")])
            .into_epsilon_nfa("0")
            .unwrap();
        let mut closures = Closures::new(&enfa);
        let start = OrderedSet::from(["0".to_string()]);
        assert_eq!(closures.closure(&start).len(), 2);
        assert_eq!(closures.closure(&start).len(), 2);
        assert_eq!(closures.len(), 1);
    }

    #[test]
    fn bounded_construction_respects_ceiling() {
        // the classical blow-up: the n-th symbol from the end is an `a`
        let nfa = AutomatonBuilder::new()
            .with_transitions([
                ("0", 'a', "0"),
                ("0", 'b', "0"),
                ("0", 'a', "1"),
                ("1", 'a', "2"),
                ("1", 'b', "2"),
                ("2", 'a', "3"),
                ("2", 'b', "3"),
            ])
            .with_final_states(["3"])
            .into_nfa("0")
            .unwrap();
        assert_eq!(nfa.to_dfa().size(), 8);
        let mut budget = Bounded::new("to_dfa").with_max_states(4);
        assert!(matches!(
            subset_construction_bounded(&nfa, &mut budget),
            Err(ConversionError::Memory { max_states: 4, .. })
        ));
    }

    #[test]
    fn direct_construction_starts_from_closure() {
        let enfa = AutomatonBuilder::new()
            .with_transitions([("a0", 'a', "a1")])
            .with_epsilon_transitions([("s", "a0"), ("s", "f")])
            .with_final_states(["a1", "f"])
            .into_epsilon_nfa("s")
            .unwrap();
        let dfa = enfa.to_dfa_direct();
        assert_eq!(dfa.initial_state(), "{a0,f,s}");
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts("aa"));
    }
}
