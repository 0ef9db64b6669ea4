use std::borrow::Cow;

use crate::{
    alphabet::{Label, Symbol},
    automaton::{
        symbol_of, Automaton, AutomatonKind, DeterministicTransitions, Edge, EpsilonNFA,
        EpsilonTransitions, FiniteAutomaton, State, TransitionTable, DFA,
    },
    determinization,
    error::{InvalidReason, OperationError},
    math::{OrderedMap, OrderedSet},
    operations,
    word::FiniteWord,
};

/// Transition function of an [`NFA`]: every state and symbol map to a set of successors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NondeterministicTransitions(
    pub(crate) OrderedMap<State, OrderedMap<Symbol, OrderedSet<State>>>,
);

impl TransitionTable for NondeterministicTransitions {
    const KIND: AutomatonKind = AutomatonKind::NFA;

    fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.0.iter().flat_map(|(source, row)| {
            row.iter().flat_map(move |(sym, targets)| {
                targets.iter().map(move |target| Edge {
                    source,
                    label: Label::Symbol(*sym),
                    target,
                })
            })
        })
    }

    fn insert(&mut self, source: State, label: Label, target: State) -> Result<(), InvalidReason> {
        let symbol = symbol_of(label, &source)?;
        self.0
            .entry(source)
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(target);
        Ok(())
    }

    fn restrict<F: Fn(&State) -> bool>(&self, keep: F) -> Self {
        let mut out = Self::default();
        for edge in self.edges() {
            if keep(edge.source) && keep(edge.target) {
                let _ = out.insert(edge.source.clone(), edge.label, edge.target.clone());
            }
        }
        out
    }

    fn map_states<F: Fn(&str) -> State>(&self, rename: F) -> Self {
        Self(
            self.0
                .iter()
                .map(|(source, row)| {
                    let row = row
                        .iter()
                        .map(|(sym, targets)| (*sym, targets.iter().map(|q| rename(q)).collect()))
                        .collect();
                    (rename(source), row)
                })
                .collect(),
        )
    }
}

/// A nondeterministic finite automaton without epsilon transitions. A word is accepted if
/// some run on it ends in a final state.
#[allow(clippy::upper_case_acronyms)]
pub type NFA = Automaton<NondeterministicTransitions>;

impl FiniteAutomaton for NFA {
    fn kind(&self) -> AutomatonKind {
        AutomatonKind::NFA
    }

    impl_accessors!();

    fn accepts<W: FiniteWord + ?Sized>(&self, word: &W) -> bool {
        let mut frontier = OrderedSet::from([self.initial.clone()]);
        for sym in word.symbols() {
            frontier = self.step(&frontier, sym);
            if frontier.is_empty() {
                return false;
            }
        }
        frontier.iter().any(|q| self.finals.contains(q))
    }

    fn to_epsilon_nfa(&self) -> EpsilonNFA {
        let table = EpsilonTransitions(
            self.transitions
                .0
                .iter()
                .map(|(source, row)| {
                    let row = row
                        .iter()
                        .map(|(sym, targets)| (Label::Symbol(*sym), targets.clone()))
                        .collect();
                    (source.clone(), row)
                })
                .collect(),
        );
        EpsilonNFA::from_parts(
            self.states.clone(),
            self.alphabet.clone(),
            table,
            self.initial.clone(),
            self.finals.clone(),
        )
    }

    fn to_nfa(&self) -> NFA {
        self.clone()
    }

    fn to_dfa(&self) -> DFA {
        determinization::subset_construction(self)
    }

    fn as_deterministic(&self) -> Option<Cow<'_, DFA>> {
        let mut table = DeterministicTransitions::default();
        for (source, row) in &self.transitions.0 {
            for (sym, targets) in row {
                let mut it = targets.iter();
                match (it.next(), it.next()) {
                    (Some(target), None) => {
                        table
                            .0
                            .entry(source.clone())
                            .or_default()
                            .insert(*sym, target.clone());
                    }
                    (None, _) => {}
                    _ => return None,
                }
            }
        }
        Some(Cow::Owned(DFA::from_parts(
            self.states.clone(),
            self.alphabet.clone(),
            table,
            self.initial.clone(),
            self.finals.clone(),
        )))
    }
}

impl NFA {
    /// Returns the successors of `state` on `symbol`.
    pub fn successors(&self, state: &str, symbol: Symbol) -> impl Iterator<Item = &State> + '_ {
        self.transitions
            .0
            .get(state)
            .and_then(|row| row.get(&symbol))
            .into_iter()
            .flatten()
    }

    /// Returns all states that can be reached from a state in `from` by reading `symbol`.
    pub fn step(&self, from: &OrderedSet<State>, symbol: Symbol) -> OrderedSet<State> {
        from.iter()
            .flat_map(|q| self.successors(q, symbol))
            .cloned()
            .collect()
    }

    /// Builds an automaton for the union of the languages of `self` and `other`.
    pub fn union(&self, other: &NFA) -> Result<EpsilonNFA, OperationError> {
        operations::union(self, other)
    }

    /// Builds an automaton for the concatenation of the language of `self` with that of `other`.
    pub fn concatenation(&self, other: &NFA) -> Result<EpsilonNFA, OperationError> {
        operations::concatenation(self, other)
    }

    /// Builds an automaton for the Kleene star of the language of `self`.
    pub fn kleene_star(&self) -> EpsilonNFA {
        operations::kleene_star(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// Accepts the words whose second to last symbol is an `a`.
    fn second_to_last_a() -> NFA {
        AutomatonBuilder::new()
            .with_transitions([
                ("0", 'a', "0"),
                ("0", 'b', "0"),
                ("0", 'a', "1"),
                ("1", 'a', "2"),
                ("1", 'b', "2"),
            ])
            .with_final_states(["2"])
            .into_nfa("0")
            .unwrap()
    }

    #[test]
    fn frontier_simulation() {
        let nfa = second_to_last_a();
        assert!(nfa.accepts("ab"));
        assert!(nfa.accepts("baa"));
        assert!(!nfa.accepts("abb"));
        assert!(!nfa.accepts(""));
        assert!(!nfa.accepts("ac"));
    }

    #[test]
    fn determinism_check() {
        assert!(second_to_last_a().as_deterministic().is_none());
        let nfa = AutomatonBuilder::new()
            .with_transitions([("p", 'a', "q"), ("q", 'b', "p")])
            .with_final_states(["q"])
            .into_nfa("p")
            .unwrap();
        let dfa = nfa.as_deterministic().unwrap();
        assert_eq!(dfa.successor("p", 'a').map(String::as_str), Some("q"));
        assert!(dfa.accepts("aba"));
    }

    #[test]
    fn fragment_operations() {
        let nfa = second_to_last_a();
        let star = nfa.kleene_star();
        assert!(star.accepts(""));
        assert!(star.accepts("abab"));
        let concatenated = nfa.concatenation(&nfa).unwrap();
        assert!(concatenated.accepts("abab"));
        assert!(!concatenated.accepts("ab"));
        let union = nfa.union(&nfa).unwrap();
        assert!(union.states().contains("union_initial"));
        assert!(union.accepts("bab"));
    }

    #[test]
    fn epsilon_free_views_agree() {
        let nfa = second_to_last_a();
        let enfa = nfa.to_epsilon_nfa();
        for w in ["ab", "bb", "aab", "bba", "a"] {
            assert_eq!(nfa.accepts(w), enfa.accepts(w));
        }
    }
}
