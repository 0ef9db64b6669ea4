use std::borrow::Cow;
use std::collections::VecDeque;

use tracing::trace;

use crate::{
    alphabet::{Alphabet, Label, Symbol},
    automaton::{
        escape_component, fresh_state, symbol_of, Automaton, AutomatonKind, Edge, EpsilonNFA,
        EpsilonTransitions, FiniteAutomaton, NondeterministicTransitions, State, TransitionTable,
        NFA,
    },
    error::{InvalidReason, OperationError},
    math::{OrderedMap, OrderedSet, Set},
    operations::ensure_same_alphabet,
    word::FiniteWord,
};

/// Transition function of a [`DFA`]: for every state and symbol at most one successor.
/// Missing entries mean that the word is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeterministicTransitions(pub(crate) OrderedMap<State, OrderedMap<Symbol, State>>);

impl TransitionTable for DeterministicTransitions {
    const KIND: AutomatonKind = AutomatonKind::DFA;

    fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.0.iter().flat_map(|(source, row)| {
            row.iter().map(move |(sym, target)| Edge {
                source,
                label: Label::Symbol(*sym),
                target,
            })
        })
    }

    fn insert(&mut self, source: State, label: Label, target: State) -> Result<(), InvalidReason> {
        let symbol = symbol_of(label, &source)?;
        let row = self.0.entry(source.clone()).or_default();
        match row.get(&symbol) {
            Some(existing) if existing != &target => {
                Err(InvalidReason::Nondeterministic { state: source, symbol })
            }
            _ => {
                row.insert(symbol, target);
                Ok(())
            }
        }
    }

    fn restrict<F: Fn(&State) -> bool>(&self, keep: F) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(source, _)| keep(source))
                .map(|(source, row)| {
                    let row = row
                        .iter()
                        .filter(|(_, target)| keep(target))
                        .map(|(sym, target)| (*sym, target.clone()))
                        .collect();
                    (source.clone(), row)
                })
                .collect(),
        )
    }

    fn map_states<F: Fn(&str) -> State>(&self, rename: F) -> Self {
        Self(
            self.0
                .iter()
                .map(|(source, row)| {
                    let row = row
                        .iter()
                        .map(|(sym, target)| (*sym, rename(target)))
                        .collect();
                    (rename(source), row)
                })
                .collect(),
        )
    }
}

/// A deterministic finite automaton (DFA) has at most one transition for every state and
/// symbol. It accepts a finite word if reading the word from the initial state ends in a
/// final state. A missing transition means the word is rejected.
#[allow(clippy::upper_case_acronyms)]
pub type DFA = Automaton<DeterministicTransitions>;

/// Determines which pairs of states are accepting in a product of two automata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductAcceptance {
    /// Both components must accept, this gives the intersection.
    Both,
    /// At least one component must accept, this gives the union.
    Either,
    /// The left component accepts and the right one does not, this gives the difference.
    LeftOnly,
    /// Exactly one component accepts, this gives the symmetric difference.
    ExactlyOne,
}

impl ProductAcceptance {
    /// Combines the acceptance of the two components.
    pub fn combine(&self, left: bool, right: bool) -> bool {
        match self {
            ProductAcceptance::Both => left && right,
            ProductAcceptance::Either => left || right,
            ProductAcceptance::LeftOnly => left && !right,
            ProductAcceptance::ExactlyOne => left != right,
        }
    }

    /// Whether a missing transition in one component may still lead to acceptance, in
    /// which case the components have to be completed before the product is formed.
    fn needs_completion(&self) -> bool {
        !matches!(self, ProductAcceptance::Both)
    }
}

/// Name of the product state for the pair `(left, right)`.
pub(crate) fn pair_label(left: &str, right: &str) -> State {
    format!("({},{})", escape_component(left), escape_component(right))
}

impl FiniteAutomaton for DFA {
    fn kind(&self) -> AutomatonKind {
        AutomatonKind::DFA
    }

    impl_accessors!();

    fn accepts<W: FiniteWord + ?Sized>(&self, word: &W) -> bool {
        self.reached_state(word)
            .map(|q| self.finals.contains(q))
            .unwrap_or(false)
    }

    fn to_epsilon_nfa(&self) -> EpsilonNFA {
        let mut table = EpsilonTransitions::default();
        for edge in self.edges() {
            table
                .0
                .entry(edge.source.clone())
                .or_default()
                .entry(edge.label)
                .or_default()
                .insert(edge.target.clone());
        }
        EpsilonNFA::from_parts(
            self.states.clone(),
            self.alphabet.clone(),
            table,
            self.initial.clone(),
            self.finals.clone(),
        )
    }

    fn to_nfa(&self) -> NFA {
        let table = NondeterministicTransitions(
            self.transitions
                .0
                .iter()
                .map(|(source, row)| {
                    let row = row
                        .iter()
                        .map(|(sym, target)| (*sym, OrderedSet::from([target.clone()])))
                        .collect();
                    (source.clone(), row)
                })
                .collect(),
        );
        NFA::from_parts(
            self.states.clone(),
            self.alphabet.clone(),
            table,
            self.initial.clone(),
            self.finals.clone(),
        )
    }

    fn to_dfa(&self) -> DFA {
        self.clone()
    }

    fn as_deterministic(&self) -> Option<Cow<'_, DFA>> {
        Some(Cow::Borrowed(self))
    }
}

impl DFA {
    /// Returns the unique successor of `state` on `symbol`, if there is one.
    pub fn successor(&self, state: &str, symbol: Symbol) -> Option<&State> {
        self.transitions.0.get(state)?.get(&symbol)
    }

    /// Returns the state reached by reading `word` from the initial state, or `None` if the
    /// run gets stuck on a missing transition.
    pub fn reached_state<W: FiniteWord + ?Sized>(&self, word: &W) -> Option<&State> {
        let mut current = &self.initial;
        for sym in word.symbols() {
            current = self.successor(current, sym)?;
        }
        Some(current)
    }

    /// Returns true if every state has a transition on every symbol of the alphabet.
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|q| {
            self.transitions
                .0
                .get(q)
                .map(|row| self.alphabet.universe().all(|sym| row.contains_key(&sym)))
                .unwrap_or(self.alphabet.is_empty())
        })
    }

    /// Returns an equivalent DFA in which every state has a transition on every symbol. If
    /// `self` is not complete already, one non-final sink state is added and every missing
    /// transition is routed to it.
    pub fn complete(&self) -> DFA {
        if self.is_complete() {
            return self.clone();
        }
        let sink = fresh_state(&self.states, "sink");
        trace!("completing DFA with {} states using sink `{sink}`", self.size());

        let mut states = self.states.clone();
        states.insert(sink.clone());
        let mut table = self.transitions.clone();
        for q in &states {
            let row = table.0.entry(q.clone()).or_default();
            for sym in self.alphabet.universe() {
                row.entry(sym).or_insert_with(|| sink.clone());
            }
        }
        DFA::from_parts(
            states,
            self.alphabet.clone(),
            table,
            self.initial.clone(),
            self.finals.clone(),
        )
    }

    /// Returns a DFA accepting exactly the words over the alphabet that `self` rejects.
    /// The automaton is completed first, then final and non-final states are swapped.
    pub fn complement(&self) -> DFA {
        let complete = self.complete();
        let finals = complete
            .states
            .iter()
            .filter(|q| !complete.finals.contains(*q))
            .cloned()
            .collect();
        DFA::from_parts(
            complete.states,
            complete.alphabet,
            complete.transitions,
            complete.initial,
            finals,
        )
    }

    /// Builds the reachable part of the product of `self` and `other`, where a pair of
    /// states is accepting according to `acceptance`. Both automata need the same alphabet.
    pub fn product(
        &self,
        other: &DFA,
        acceptance: ProductAcceptance,
    ) -> Result<DFA, OperationError> {
        ensure_same_alphabet(self, other)?;
        let (left, right) = if acceptance.needs_completion() {
            (Cow::Owned(self.complete()), Cow::Owned(other.complete()))
        } else {
            (Cow::Borrowed(self), Cow::Borrowed(other))
        };

        let initial = (left.initial.as_str(), right.initial.as_str());
        let mut seen = Set::from_iter([initial]);
        let mut queue = VecDeque::from([initial]);
        let mut states = OrderedSet::new();
        let mut finals = OrderedSet::new();
        let mut table = DeterministicTransitions::default();

        while let Some((l, r)) = queue.pop_front() {
            let label = pair_label(l, r);
            if acceptance.combine(left.is_final(l), right.is_final(r)) {
                finals.insert(label.clone());
            }
            states.insert(label.clone());
            for sym in left.alphabet.universe() {
                let (Some(lp), Some(rp)) = (left.successor(l, sym), right.successor(r, sym))
                else {
                    continue;
                };
                let target = (lp.as_str(), rp.as_str());
                if seen.insert(target) {
                    queue.push_back(target);
                }
                table
                    .0
                    .entry(label.clone())
                    .or_default()
                    .insert(sym, pair_label(lp, rp));
            }
        }
        trace!("product construction produced {} states", states.len());

        Ok(DFA::from_parts(
            states,
            left.alphabet.clone(),
            table,
            pair_label(initial.0, initial.1),
            finals,
        ))
    }

    /// Computes the union of `self` with `other` through a product construction.
    pub fn union(&self, other: &DFA) -> Result<DFA, OperationError> {
        self.product(other, ProductAcceptance::Either)
    }

    /// Computes the intersection of `self` with `other` through a product construction.
    pub fn intersection(&self, other: &DFA) -> Result<DFA, OperationError> {
        self.product(other, ProductAcceptance::Both)
    }

    /// Computes the words accepted by `self` but not by `other` through a product construction.
    pub fn difference(&self, other: &DFA) -> Result<DFA, OperationError> {
        self.product(other, ProductAcceptance::LeftOnly)
    }

    /// Returns the length-lexicographically minimal word that is accepted, or `None` if the
    /// accepted language is empty.
    pub fn give_word(&self) -> Option<String> {
        let mut seen = Set::from_iter([self.initial.as_str()]);
        let mut queue = VecDeque::from([(String::new(), self.initial.as_str())]);
        while let Some((access, q)) = queue.pop_front() {
            if self.finals.contains(q) {
                return Some(access);
            }
            for sym in self.alphabet.universe() {
                if let Some(p) = self.successor(q, sym) {
                    if seen.insert(p.as_str()) {
                        let mut next = access.clone();
                        next.push(sym);
                        queue.push_back((next, p.as_str()));
                    }
                }
            }
        }
        None
    }

    /// Returns true if and only if the accepted language is empty.
    pub fn is_empty_language(&self) -> bool {
        self.give_word().is_none()
    }

    /// Decides whether `self` and `other` accept the same language. If the alphabets differ,
    /// both are compared over the union of their alphabets.
    pub fn equivalent(&self, other: &DFA) -> bool {
        self.separate(other).is_none()
    }

    /// Returns the minimal word that is accepted by exactly one of `self` and `other`.
    pub fn separate(&self, other: &DFA) -> Option<String> {
        let alphabet: Alphabet = self.alphabet.union(&other.alphabet);
        let left = self.with_extended_alphabet(&alphabet);
        let right = other.with_extended_alphabet(&alphabet);
        left.product(&right, ProductAcceptance::ExactlyOne)
            .ok()
            .and_then(|p| p.give_word())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    pub fn contains_aa() -> DFA {
        AutomatonBuilder::new()
            .with_transitions([
                ("q0", 'a', "q1"),
                ("q0", 'b', "q0"),
                ("q1", 'a', "q2"),
                ("q1", 'b', "q0"),
                ("q2", 'a', "q2"),
                ("q2", 'b', "q2"),
            ])
            .with_final_states(["q2"])
            .into_dfa("q0")
            .unwrap()
    }

    fn only(word: &str) -> DFA {
        let mut transitions = vec![];
        for (i, sym) in word.chars().enumerate() {
            transitions.push((format!("s{i}"), sym, format!("s{}", i + 1)));
        }
        AutomatonBuilder::new()
            .with_states((0..=word.len()).map(|i| format!("s{i}")))
            .with_alphabet("ab")
            .with_transitions(transitions)
            .with_final_states([format!("s{}", word.len())])
            .into_dfa("s0")
            .unwrap()
    }

    #[test]
    fn run_and_acceptance() {
        let dfa = contains_aa();
        assert!(dfa.accepts("baab"));
        assert!(!dfa.accepts("abab"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("aac"));
        assert_eq!(dfa.reached_state("ba").map(String::as_str), Some("q1"));
    }

    #[test]
    fn missing_transitions_reject() {
        let dfa = only("ab");
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("abb"));
        assert!(!dfa.accepts("b"));
        assert!(!dfa.is_complete());
        assert!(contains_aa().is_complete());
    }

    #[test]
    fn completion_adds_single_sink() {
        let dfa = only("ab");
        let complete = dfa.complete();
        assert!(complete.is_complete());
        assert_eq!(complete.size(), dfa.size() + 1);
        assert!(complete.states().contains("sink"));
        assert!(!complete.is_final("sink"));
        assert_eq!(contains_aa().complete(), contains_aa());
    }

    #[test_log::test]
    fn complement_flips_language() {
        let dfa = only("ab");
        let complement = dfa.complement();
        for w in ["", "a", "b", "ab", "ba", "abb", "aab"] {
            assert_eq!(dfa.accepts(w), !complement.accepts(w), "word {w}");
        }
    }

    #[test]
    fn products() {
        let a = only("a");
        let b = only("b");
        let union = a.union(&b).unwrap();
        assert!(union.accepts("a"));
        assert!(union.accepts("b"));
        assert!(!union.accepts(""));
        assert!(!union.accepts("ab"));

        let intersection = a.intersection(&b).unwrap();
        assert!(intersection.is_empty_language());

        let difference = contains_aa().difference(&only("aa")).unwrap();
        assert!(!difference.accepts("aa"));
        assert!(difference.accepts("aaa"));
        assert!(difference.states().contains("(q0,s0)"));
    }

    #[test]
    fn product_requires_equal_alphabets() {
        let other = AutomatonBuilder::new()
            .with_transitions([("p", 'c', "p")])
            .into_dfa("p")
            .unwrap();
        assert!(matches!(
            contains_aa().union(&other),
            Err(OperationError::IncompatibleAutomata { .. })
        ));
    }

    #[test]
    fn witnesses() {
        assert_eq!(contains_aa().give_word().as_deref(), Some("aa"));
        assert_eq!(only("").give_word().as_deref(), Some(""));
        assert!(contains_aa().equivalent(&contains_aa().complement().complement()));
        assert_eq!(
            contains_aa().separate(&only("aa")).as_deref(),
            Some("aaa")
        );
    }
}
