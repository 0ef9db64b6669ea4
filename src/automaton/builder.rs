use crate::{
    alphabet::{Alphabet, Label, Symbol},
    automaton::{Automaton, EpsilonNFA, State, TransitionTable, DFA, NFA},
    error::InvalidAutomatonError,
    math::OrderedSet,
};

/// Helper struct for the construction of automata. It collects states, symbols, transitions
/// and final states and validates everything once one of the `into_*` methods is called.
///
/// Unless [`AutomatonBuilder::with_states`] is used, the states are all those that are
/// mentioned by a transition, the initial state or a final state. Unless
/// [`AutomatonBuilder::with_alphabet`] is used, the alphabet consists of the symbols that
/// appear on at least one transition.
///
/// # Example
///
/// A DFA with two states `q0` and `q1` over the alphabet `['a', 'b']` that accepts the words
/// with an odd number of `b`s:
/// ```
/// use relang::prelude::*;
///
/// let dfa = AutomatonBuilder::new()
///     .with_transitions([("q0", 'a', "q0"), ("q0", 'b', "q1"), ("q1", 'a', "q1"), ("q1", 'b', "q0")])
///     .with_final_states(["q1"])
///     .into_dfa("q0") // q0 is the initial state
///     .unwrap();
/// assert!(dfa.accepts("ab"));
/// assert!(!dfa.accepts("abb"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    states: Option<OrderedSet<State>>,
    alphabet: Option<Alphabet>,
    transitions: Vec<(State, Label, State)>,
    finals: Vec<State>,
}

impl AutomatonBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the set of states explicitly. Every state used elsewhere must be among them.
    pub fn with_states<S: Into<State>, I: IntoIterator<Item = S>>(mut self, states: I) -> Self {
        self.states
            .get_or_insert_with(OrderedSet::new)
            .extend(states.into_iter().map(Into::into));
        self
    }

    /// Declares the alphabet explicitly. Every transition symbol must be part of it.
    pub fn with_alphabet<A: Into<Alphabet>>(mut self, alphabet: A) -> Self {
        self.alphabet = Some(alphabet.into());
        self
    }

    /// Adds transitions `(source, symbol, target)`.
    pub fn with_transitions<S, T, I>(mut self, transitions: I) -> Self
    where
        S: Into<State>,
        T: Into<State>,
        I: IntoIterator<Item = (S, Symbol, T)>,
    {
        self.transitions.extend(
            transitions
                .into_iter()
                .map(|(p, sym, q)| (p.into(), Label::Symbol(sym), q.into())),
        );
        self
    }

    /// Adds epsilon transitions `(source, target)`.
    pub fn with_epsilon_transitions<S, T, I>(mut self, transitions: I) -> Self
    where
        S: Into<State>,
        T: Into<State>,
        I: IntoIterator<Item = (S, T)>,
    {
        self.transitions.extend(
            transitions
                .into_iter()
                .map(|(p, q)| (p.into(), Label::Epsilon, q.into())),
        );
        self
    }

    /// Marks the given states as final.
    pub fn with_final_states<S: Into<State>, I: IntoIterator<Item = S>>(mut self, finals: I) -> Self {
        self.finals.extend(finals.into_iter().map(Into::into));
        self
    }

    fn build<T: TransitionTable>(
        self,
        initial: State,
    ) -> Result<Automaton<T>, InvalidAutomatonError> {
        let states = match self.states {
            Some(states) => states,
            None => self
                .transitions
                .iter()
                .flat_map(|(p, _, q)| [p.clone(), q.clone()])
                .chain(self.finals.iter().cloned())
                .chain(std::iter::once(initial.clone()))
                .collect(),
        };
        let alphabet = self.alphabet.unwrap_or_else(|| {
            self.transitions
                .iter()
                .filter_map(|(_, label, _)| label.symbol())
                .collect()
        });
        Automaton::new(states, alphabet, self.transitions, initial, self.finals)
    }

    /// Builds a [`DFA`] with the given initial state. Fails if some state has two different
    /// successors on one symbol or if an epsilon transition was added.
    pub fn into_dfa<S: Into<State>>(self, initial: S) -> Result<DFA, InvalidAutomatonError> {
        self.build(initial.into())
    }

    /// Builds an [`NFA`] with the given initial state. Fails if an epsilon transition was added.
    pub fn into_nfa<S: Into<State>>(self, initial: S) -> Result<NFA, InvalidAutomatonError> {
        self.build(initial.into())
    }

    /// Builds an [`EpsilonNFA`] with the given initial state.
    pub fn into_epsilon_nfa<S: Into<State>>(
        self,
        initial: S,
    ) -> Result<EpsilonNFA, InvalidAutomatonError> {
        self.build(initial.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn infers_states_and_alphabet() {
        let nfa = AutomatonBuilder::new()
            .with_transitions([("p", 'a', "q")])
            .with_final_states(["r"])
            .into_nfa("s")
            .unwrap();
        assert_eq!(nfa.size(), 4);
        assert_eq!(nfa.alphabet(), &Alphabet::from("a"));
    }

    #[test]
    fn explicit_declarations_are_checked() {
        let err = AutomatonBuilder::new()
            .with_states(["p"])
            .with_transitions([("p", 'a', "q")])
            .into_nfa("p")
            .unwrap_err();
        assert_eq!(err.reason, InvalidReason::UnknownTransitionState("q".into()));

        let err = AutomatonBuilder::new()
            .with_alphabet("b")
            .with_transitions([("p", 'a', "p")])
            .into_dfa("p")
            .unwrap_err();
        assert_eq!(err.reason, InvalidReason::UnknownSymbol('a'));
    }

    #[test]
    fn kind_specific_rejections() {
        let err = AutomatonBuilder::new()
            .with_transitions([("p", 'a', "p"), ("p", 'a', "q")])
            .into_dfa("p")
            .unwrap_err();
        assert_eq!(
            err.reason,
            InvalidReason::Nondeterministic {
                state: "p".into(),
                symbol: 'a'
            }
        );
        assert_eq!(err.kind, AutomatonKind::DFA);

        let builder = AutomatonBuilder::new().with_epsilon_transitions([("p", "q")]);
        assert_eq!(
            builder.clone().into_nfa("p").unwrap_err().reason,
            InvalidReason::UnexpectedEpsilon("p".into())
        );
        assert!(builder.clone().into_dfa("p").is_err());
        assert!(builder.into_epsilon_nfa("p").is_ok());
    }

    #[test]
    fn duplicate_transitions_are_harmless() {
        let dfa = AutomatonBuilder::new()
            .with_transitions([("p", 'a', "q"), ("p", 'a', "q")])
            .into_dfa("p")
            .unwrap();
        assert_eq!(dfa.edges().count(), 1);
    }
}
