use std::borrow::Cow;

use crate::{
    alphabet::{Label, Symbol},
    automaton::{
        Automaton, AutomatonKind, Edge, FiniteAutomaton, NondeterministicTransitions, State,
        TransitionTable, DFA, NFA,
    },
    determinization::{self, Closures},
    error::InvalidReason,
    math::{OrderedMap, OrderedSet},
    word::FiniteWord,
};

/// Transition function of an [`EpsilonNFA`]: every state and label (a symbol or epsilon) map
/// to a set of successors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpsilonTransitions(pub(crate) OrderedMap<State, OrderedMap<Label, OrderedSet<State>>>);

impl TransitionTable for EpsilonTransitions {
    const KIND: AutomatonKind = AutomatonKind::EpsilonNFA;

    fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.0.iter().flat_map(|(source, row)| {
            row.iter().flat_map(move |(label, targets)| {
                targets.iter().map(move |target| Edge {
                    source,
                    label: *label,
                    target,
                })
            })
        })
    }

    fn insert(&mut self, source: State, label: Label, target: State) -> Result<(), InvalidReason> {
        self.0
            .entry(source)
            .or_default()
            .entry(label)
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
                        .map(|(label, targets)| {
                            (*label, targets.iter().map(|q| rename(q)).collect())
                        })
                        .collect();
                    (rename(source), row)
                })
                .collect(),
        )
    }
}

impl EpsilonTransitions {
    /// Adds the transition `source --label--> target`.
    pub(crate) fn add(&mut self, source: &str, label: Label, target: &str) {
        self.0
            .entry(source.to_string())
            .or_default()
            .entry(label)
            .or_default()
            .insert(target.to_string());
    }

    /// Adds all transitions of `other` to `self`.
    pub(crate) fn extend(&mut self, other: &EpsilonTransitions) {
        for edge in other.edges() {
            self.add(edge.source, edge.label, edge.target);
        }
    }
}

/// A nondeterministic finite automaton that may in addition move along epsilon transitions
/// without consuming a symbol.
pub type EpsilonNFA = Automaton<EpsilonTransitions>;

impl FiniteAutomaton for EpsilonNFA {
    fn kind(&self) -> AutomatonKind {
        AutomatonKind::EpsilonNFA
    }

    impl_accessors!();

    fn accepts<W: FiniteWord + ?Sized>(&self, word: &W) -> bool {
        let mut closures = Closures::new(self);
        let mut frontier = closures.closure(&OrderedSet::from([self.initial.clone()]));
        for sym in word.symbols() {
            let moved = self.step(&frontier, sym);
            if moved.is_empty() {
                return false;
            }
            frontier = closures.closure(&moved);
        }
        frontier.iter().any(|q| self.finals.contains(q))
    }

    fn to_epsilon_nfa(&self) -> EpsilonNFA {
        self.clone()
    }

    /// Eliminates epsilon transitions. The successors of `s` on `a` in the result are all
    /// states reachable by a single `a` step from the epsilon closure of `s`, without closing
    /// again afterwards. A state becomes final if its epsilon closure contains a final state.
    fn to_nfa(&self) -> NFA {
        let mut closures = Closures::new(self);
        let mut table = NondeterministicTransitions::default();
        let mut finals = OrderedSet::new();

        for q in &self.states {
            let closure = closures.closure(&OrderedSet::from([q.clone()]));
            if closure.iter().any(|p| self.finals.contains(p)) {
                finals.insert(q.clone());
            }
            for sym in self.alphabet.universe() {
                let targets = self.step(&closure, sym);
                if !targets.is_empty() {
                    table.0.entry(q.clone()).or_default().insert(sym, targets);
                }
            }
        }

        NFA::from_parts(
            self.states.clone(),
            self.alphabet.clone(),
            table,
            self.initial.clone(),
            finals,
        )
    }

    fn to_dfa(&self) -> DFA {
        self.to_nfa().to_dfa()
    }

    fn as_deterministic(&self) -> Option<Cow<'_, DFA>> {
        if self.has_epsilon_transitions() {
            return None;
        }
        self.to_nfa().as_deterministic().map(|dfa| Cow::Owned(dfa.into_owned()))
    }
}

impl EpsilonNFA {
    /// Returns the successors of `state` on `label`.
    pub fn successors(&self, state: &str, label: Label) -> impl Iterator<Item = &State> + '_ {
        self.transitions
            .0
            .get(state)
            .and_then(|row| row.get(&label))
            .into_iter()
            .flatten()
    }

    /// Returns all states reachable from a state in `from` by reading `symbol` once. No
    /// epsilon transitions are taken.
    pub fn step(&self, from: &OrderedSet<State>, symbol: Symbol) -> OrderedSet<State> {
        from.iter()
            .flat_map(|q| self.successors(q, Label::Symbol(symbol)))
            .cloned()
            .collect()
    }

    /// Computes the set of states that are reachable from `states` by taking zero or more
    /// epsilon transitions.
    pub fn epsilon_closure(&self, states: &OrderedSet<State>) -> OrderedSet<State> {
        let mut closure = states.clone();
        let mut stack: Vec<&State> = states.iter().collect();
        while let Some(q) = stack.pop() {
            for p in self.successors(q, Label::Epsilon) {
                if closure.insert(p.clone()) {
                    stack.push(p);
                }
            }
        }
        closure
    }

    /// Returns true if at least one epsilon transition exists.
    pub fn has_epsilon_transitions(&self) -> bool {
        self.edges().any(|edge| edge.label.is_epsilon())
    }

    /// Determinizes `self` by running the subset construction directly on epsilon closures,
    /// without building an intermediate [`NFA`]. Accepts the same language as
    /// `self.to_nfa().to_dfa()`.
    pub fn to_dfa_direct(&self) -> DFA {
        determinization::epsilon_subset_construction(self)
    }
}
