use std::borrow::Cow;
use std::fmt::{Debug, Display};

use itertools::Itertools;

use crate::{
    alphabet::{Alphabet, Label, Symbol, EPSILON},
    error::{InvalidAutomatonError, InvalidReason},
    math::OrderedSet,
    word::FiniteWord,
};

macro_rules! impl_accessors {
    () => {
        fn states(&self) -> &$crate::math::OrderedSet<$crate::automaton::State> {
            &self.states
        }
        fn alphabet(&self) -> &$crate::alphabet::Alphabet {
            &self.alphabet
        }
        fn initial_state(&self) -> &$crate::automaton::State {
            &self.initial
        }
        fn final_states(&self) -> &$crate::math::OrderedSet<$crate::automaton::State> {
            &self.finals
        }
        fn edges(&self) -> impl Iterator<Item = $crate::automaton::Edge<'_>> + '_ {
            $crate::automaton::TransitionTable::edges(&self.transitions)
        }
    };
}

mod dfa;
pub(crate) use dfa::pair_label;
pub use dfa::{DeterministicTransitions, ProductAcceptance, DFA};

mod nfa;
pub use nfa::{NondeterministicTransitions, NFA};

mod enfa;
pub use enfa::{EpsilonNFA, EpsilonTransitions};

mod builder;
pub use builder::AutomatonBuilder;

/// Conversion from and to the dictionary representation that is used for serialization.
pub mod dict;
pub use dict::AutomatonDict;

mod display;

/// States are opaque labels. Every automaton exclusively owns the states it declares.
pub type State = String;

/// The three representations of finite automata this crate knows about.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AutomatonKind {
    /// Deterministic, at most one successor per state and symbol.
    DFA,
    /// Nondeterministic without epsilon transitions.
    NFA,
    /// Nondeterministic with epsilon transitions.
    EpsilonNFA,
}

impl Display for AutomatonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutomatonKind::DFA => write!(f, "DFA"),
            AutomatonKind::NFA => write!(f, "NFA"),
            AutomatonKind::EpsilonNFA => write!(f, "epsilon-NFA"),
        }
    }
}

/// A single transition `source --label--> target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge<'a> {
    /// The state the transition leaves.
    pub source: &'a State,
    /// The symbol read, or epsilon.
    pub label: Label,
    /// The state the transition enters.
    pub target: &'a State,
}

/// The storage of the transition function. Each automaton kind has its own table type,
/// which decides what a valid transition is for that kind.
pub trait TransitionTable: Clone + Debug + Default + PartialEq + Eq {
    /// The kind of automaton this table belongs to.
    const KIND: AutomatonKind;

    /// Iterates over all transitions, ordered by source, label and target.
    fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_;

    /// Inserts a transition, failing if the table cannot represent it.
    fn insert(&mut self, source: State, label: Label, target: State) -> Result<(), InvalidReason>;

    /// Returns a copy that only keeps transitions between states for which `keep` holds.
    fn restrict<F: Fn(&State) -> bool>(&self, keep: F) -> Self;

    /// Returns a copy in which every state is renamed through the injective `rename`.
    fn map_states<F: Fn(&str) -> State>(&self, rename: F) -> Self;
}

/// The capability set shared by every finite automaton in this crate. It is implemented by
/// exactly the three representations [`DFA`], [`NFA`] and [`EpsilonNFA`], as well as by the
/// tagged [`AnyAutomaton`] that dispatches to them.
pub trait FiniteAutomaton {
    /// Which representation `self` is.
    fn kind(&self) -> AutomatonKind;
    /// The declared states.
    fn states(&self) -> &OrderedSet<State>;
    /// The alphabet, never containing epsilon.
    fn alphabet(&self) -> &Alphabet;
    /// The designated initial state.
    fn initial_state(&self) -> &State;
    /// The accepting states.
    fn final_states(&self) -> &OrderedSet<State>;
    /// Iterates over all transitions.
    fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_;
    /// Returns whether the automaton accepts `word`. Symbols outside the alphabet simply
    /// lead to rejection.
    fn accepts<W: FiniteWord + ?Sized>(&self, word: &W) -> bool;

    /// Returns an equivalent epsilon-NFA.
    fn to_epsilon_nfa(&self) -> EpsilonNFA;
    /// Returns an equivalent NFA.
    fn to_nfa(&self) -> NFA;
    /// Returns an equivalent DFA.
    fn to_dfa(&self) -> DFA;

    /// Returns `self` viewed as a [`DFA`] if it is structurally deterministic, that is it has
    /// no epsilon transitions and at most one successor for each state and symbol.
    fn as_deterministic(&self) -> Option<Cow<'_, DFA>>;

    /// The number of states.
    fn size(&self) -> usize {
        self.states().len()
    }

    /// Returns true if `state` is accepting.
    fn is_final(&self, state: &str) -> bool {
        self.final_states().contains(state)
    }

    /// A digest of the canonical form of the automaton. Two automata that were built from
    /// the same states, alphabet, transitions, initial and final states hash equally.
    fn structural_hash(&self) -> u64 {
        let edges = self.edges().collect_vec();
        fxhash::hash64(&(
            self.kind(),
            self.states(),
            self.alphabet(),
            edges,
            self.initial_state(),
            self.final_states(),
        ))
    }
}

/// A finite automaton with states, alphabet, transitions, initial state and final states.
/// The representation is determined by the transition table `T`, see the aliases [`DFA`],
/// [`NFA`] and [`EpsilonNFA`].
///
/// Once constructed, an automaton is never modified. All algorithms produce fresh automata.
#[derive(Clone, PartialEq, Eq)]
pub struct Automaton<T> {
    states: OrderedSet<State>,
    alphabet: Alphabet,
    transitions: T,
    initial: State,
    finals: OrderedSet<State>,
}

impl<T: TransitionTable> Automaton<T> {
    /// Creates a new automaton after checking that
    /// - there is at least one state,
    /// - the alphabet does not contain epsilon,
    /// - the initial state and all final states are declared,
    /// - every transition only mentions declared states and symbols of the alphabet,
    /// - every transition is admissible for the kind of automaton.
    pub fn new<S, I, J, K>(
        states: I,
        alphabet: Alphabet,
        transitions: J,
        initial: S,
        finals: K,
    ) -> Result<Self, InvalidAutomatonError>
    where
        S: Into<State>,
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = (S, Label, S)>,
        K: IntoIterator<Item = S>,
    {
        let invalid = |reason| InvalidAutomatonError::new(T::KIND, reason);

        let states: OrderedSet<State> = states.into_iter().map(Into::into).collect();
        if states.is_empty() {
            return Err(invalid(InvalidReason::NoStates));
        }
        if alphabet.contains(EPSILON) {
            return Err(invalid(InvalidReason::EpsilonInAlphabet));
        }
        let initial = initial.into();
        if !states.contains(&initial) {
            return Err(invalid(InvalidReason::UnknownInitialState(initial)));
        }
        let mut final_states = OrderedSet::new();
        for q in finals {
            let q = q.into();
            if !states.contains(&q) {
                return Err(invalid(InvalidReason::UnknownFinalState(q)));
            }
            final_states.insert(q);
        }

        let mut table = T::default();
        for (source, label, target) in transitions {
            let (source, target) = (source.into(), target.into());
            for q in [&source, &target] {
                if !states.contains(q) {
                    return Err(invalid(InvalidReason::UnknownTransitionState(q.clone())));
                }
            }
            if let Label::Symbol(sym) = label {
                if !alphabet.contains(sym) {
                    return Err(invalid(InvalidReason::UnknownSymbol(sym)));
                }
            }
            table.insert(source, label, target).map_err(invalid)?;
        }

        Ok(Self::from_parts(
            states,
            alphabet,
            table,
            initial,
            final_states,
        ))
    }

    /// Assembles an automaton from parts that are already known to be consistent.
    pub(crate) fn from_parts(
        states: OrderedSet<State>,
        alphabet: Alphabet,
        transitions: T,
        initial: State,
        finals: OrderedSet<State>,
    ) -> Self {
        debug_assert!(states.contains(&initial));
        debug_assert!(finals.is_subset(&states));
        Self {
            states,
            alphabet,
            transitions,
            initial,
            finals,
        }
    }

    /// The transition table.
    pub fn transitions(&self) -> &T {
        &self.transitions
    }

    /// Returns a copy of `self` in which every state is renamed through `rename`. The
    /// renaming must be injective.
    pub(crate) fn rename_states<F: Fn(&str) -> State>(&self, rename: F) -> Self {
        Self::from_parts(
            self.states.iter().map(|q| rename(q)).collect(),
            self.alphabet.clone(),
            self.transitions.map_states(&rename),
            rename(&self.initial),
            self.finals.iter().map(|q| rename(q)).collect(),
        )
    }

    /// Computes the set of states that can be reached from the initial state.
    pub fn reachable_states(&self) -> OrderedSet<State> {
        let mut successors = crate::math::Map::<&State, Vec<&State>>::default();
        for edge in self.transitions.edges() {
            successors.entry(edge.source).or_default().push(edge.target);
        }
        let mut seen = OrderedSet::from([self.initial.clone()]);
        let mut stack = vec![&self.initial];
        while let Some(q) = stack.pop() {
            for p in successors.get(q).into_iter().flatten() {
                if seen.insert((*p).clone()) {
                    stack.push(p);
                }
            }
        }
        seen
    }

    /// Removes all states that cannot be reached from the initial state, together with
    /// every transition that mentions them.
    pub fn remove_unreachable_states(&self) -> Self {
        let reachable = self.reachable_states();
        if reachable.len() == self.states.len() {
            return self.clone();
        }
        tracing::trace!(
            "removing {} unreachable states",
            self.states.len() - reachable.len()
        );
        let transitions = self.transitions.restrict(|q| reachable.contains(q));
        let finals = self
            .finals
            .iter()
            .filter(|q| reachable.contains(*q))
            .cloned()
            .collect();
        Self::from_parts(
            reachable,
            self.alphabet.clone(),
            transitions,
            self.initial.clone(),
            finals,
        )
    }

    /// Returns the same automaton over a larger alphabet. Symbols that are added have no
    /// transitions, so the language does not change.
    pub fn with_extended_alphabet(&self, alphabet: &Alphabet) -> Self {
        let mut out = self.clone();
        out.alphabet = self.alphabet.union(alphabet);
        out
    }
}

/// Creates a state name that starts with `base` and is not among `taken`.
pub(crate) fn fresh_state(taken: &OrderedSet<State>, base: &str) -> State {
    let mut candidate = base.to_string();
    let mut counter = 0usize;
    while taken.contains(&candidate) {
        counter += 1;
        candidate = format!("{base}{counter}");
    }
    candidate
}

/// Escapes the separator `,` and the escape character `\` inside a component of a composite
/// state name, so that distinct tuples and sets of states never share a name.
pub(crate) fn escape_component(name: &str) -> Cow<'_, str> {
    if name.contains([',', '\\']) {
        let mut out = String::with_capacity(name.len() + 2);
        for c in name.chars() {
            if matches!(c, ',' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        Cow::Owned(out)
    } else {
        Cow::Borrowed(name)
    }
}

/// Canonical name of a state that represents the given set of states, e.g. `{q0,q1}`.
pub(crate) fn set_label<'a, I: IntoIterator<Item = &'a State>>(states: I) -> State {
    format!(
        "{{{}}}",
        states.into_iter().map(|q| escape_component(q)).join(",")
    )
}

/// Checks the (total) symbol part of a label, used where epsilon is not admissible.
pub(crate) fn symbol_of(label: Label, source: &str) -> Result<Symbol, InvalidReason> {
    label
        .symbol()
        .ok_or_else(|| InvalidReason::UnexpectedEpsilon(source.to_string()))
}

/// One of the three automaton representations, tagged by its [`AutomatonKind`]. This is what
/// functions return when the representation is only known at runtime, for instance when
/// deserializing or converting through the [`crate::engine::ConversionEngine`].
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, PartialEq, Eq)]
pub enum AnyAutomaton {
    /// A deterministic automaton.
    DFA(DFA),
    /// A nondeterministic automaton.
    NFA(NFA),
    /// A nondeterministic automaton with epsilon transitions.
    EpsilonNFA(EpsilonNFA),
}

macro_rules! dispatch {
    ($self:expr, $a:ident => $body:expr) => {
        match $self {
            AnyAutomaton::DFA($a) => $body,
            AnyAutomaton::NFA($a) => $body,
            AnyAutomaton::EpsilonNFA($a) => $body,
        }
    };
}

impl AnyAutomaton {
    /// Converts `self` into the representation `kind`, returning `self` if it already has it.
    pub fn into_kind(self, kind: AutomatonKind) -> AnyAutomaton {
        if self.kind() == kind {
            return self;
        }
        match kind {
            AutomatonKind::DFA => self.to_dfa().into(),
            AutomatonKind::NFA => self.to_nfa().into(),
            AutomatonKind::EpsilonNFA => self.to_epsilon_nfa().into(),
        }
    }

    /// Returns the contained DFA, if `self` is one.
    pub fn as_dfa(&self) -> Option<&DFA> {
        match self {
            AnyAutomaton::DFA(dfa) => Some(dfa),
            _ => None,
        }
    }

    /// Returns the contained NFA, if `self` is one.
    pub fn as_nfa(&self) -> Option<&NFA> {
        match self {
            AnyAutomaton::NFA(nfa) => Some(nfa),
            _ => None,
        }
    }

    /// Returns the contained epsilon-NFA, if `self` is one.
    pub fn as_epsilon_nfa(&self) -> Option<&EpsilonNFA> {
        match self {
            AnyAutomaton::EpsilonNFA(enfa) => Some(enfa),
            _ => None,
        }
    }

    /// Serializes the contained automaton.
    pub fn to_dict(&self) -> AutomatonDict {
        dispatch!(self, a => a.to_dict())
    }

    /// Removes unreachable states from the contained automaton.
    pub fn remove_unreachable_states(&self) -> AnyAutomaton {
        dispatch!(self, a => a.remove_unreachable_states().into())
    }
}

impl FiniteAutomaton for AnyAutomaton {
    fn kind(&self) -> AutomatonKind {
        dispatch!(self, a => a.kind())
    }
    fn states(&self) -> &OrderedSet<State> {
        dispatch!(self, a => a.states())
    }
    fn alphabet(&self) -> &Alphabet {
        dispatch!(self, a => a.alphabet())
    }
    fn initial_state(&self) -> &State {
        dispatch!(self, a => a.initial_state())
    }
    fn final_states(&self) -> &OrderedSet<State> {
        dispatch!(self, a => a.final_states())
    }
    fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        let edges: Box<dyn Iterator<Item = Edge<'_>> + '_> = match self {
            AnyAutomaton::DFA(a) => Box::new(a.edges()),
            AnyAutomaton::NFA(a) => Box::new(a.edges()),
            AnyAutomaton::EpsilonNFA(a) => Box::new(a.edges()),
        };
        edges
    }
    fn accepts<W: FiniteWord + ?Sized>(&self, word: &W) -> bool {
        dispatch!(self, a => a.accepts(word))
    }
    fn to_epsilon_nfa(&self) -> EpsilonNFA {
        dispatch!(self, a => a.to_epsilon_nfa())
    }
    fn to_nfa(&self) -> NFA {
        dispatch!(self, a => a.to_nfa())
    }
    fn to_dfa(&self) -> DFA {
        dispatch!(self, a => a.to_dfa())
    }
    fn as_deterministic(&self) -> Option<Cow<'_, DFA>> {
        dispatch!(self, a => a.as_deterministic())
    }
}

impl From<DFA> for AnyAutomaton {
    fn from(value: DFA) -> Self {
        AnyAutomaton::DFA(value)
    }
}

impl From<NFA> for AnyAutomaton {
    fn from(value: NFA) -> Self {
        AnyAutomaton::NFA(value)
    }
}

impl From<EpsilonNFA> for AnyAutomaton {
    fn from(value: EpsilonNFA) -> Self {
        AnyAutomaton::EpsilonNFA(value)
    }
}

impl Debug for AnyAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        dispatch!(self, a => Debug::fmt(a, f))
    }
}

impl Display for AnyAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        dispatch!(self, a => Display::fmt(a, f))
    }
}
