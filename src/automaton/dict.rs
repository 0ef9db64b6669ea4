//! The dictionary form of an automaton has the fields `states`, `alphabet`, `transitions`,
//! `initial_state`, `final_states` and, for epsilon-NFAs, `epsilon_symbol`. Transitions are
//! keyed by `"source,symbol"`; a DFA maps each key to one destination, the other kinds to a
//! list of destinations.
//!
//! ```
//! use relang::prelude::*;
//!
//! let dfa = AutomatonBuilder::new()
//!     .with_transitions([("q0", 'a', "q1")])
//!     .with_final_states(["q1"])
//!     .into_dfa("q0")
//!     .unwrap();
//! let json = dfa.to_json();
//! assert!(json.contains("\"q0,a\": \"q1\""));
//! assert_eq!(DFA::from_json(&json).unwrap(), dfa);
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    alphabet::{Alphabet, Label, EPSILON},
    automaton::{
        AnyAutomaton, Automaton, AutomatonKind, EpsilonNFA, State, TransitionTable, DFA, NFA,
    },
    error::{InvalidAutomatonError, InvalidReason},
    math::OrderedMap,
};

/// The destinations stored under one transition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Destinations {
    /// The unique successor in a DFA.
    Single(State),
    /// The successors in an NFA or epsilon-NFA.
    Many(Vec<State>),
}

impl Destinations {
    fn into_vec(self) -> Vec<State> {
        match self {
            Destinations::Single(q) => vec![q],
            Destinations::Many(qs) => qs,
        }
    }
}

/// Serializable representation of an automaton of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonDict {
    pub states: Vec<State>,
    pub alphabet: Vec<String>,
    pub transitions: OrderedMap<String, Destinations>,
    pub initial_state: State,
    pub final_states: Vec<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon_symbol: Option<String>,
}

impl AutomatonDict {
    /// Guesses the kind of automaton the dictionary describes: an epsilon symbol indicates an
    /// epsilon-NFA, list-valued destinations an NFA, and anything else a DFA.
    pub fn kind(&self) -> AutomatonKind {
        if self.epsilon_symbol.is_some() {
            AutomatonKind::EpsilonNFA
        } else if self
            .transitions
            .values()
            .any(|d| matches!(d, Destinations::Many(_)))
        {
            AutomatonKind::NFA
        } else {
            AutomatonKind::DFA
        }
    }
}

/// Splits a transition key `"source,symbol"` into the source state and the label.
fn split_key(key: &str, epsilon: &str) -> Option<(State, Label)> {
    if let Some(source) = key
        .strip_suffix(epsilon)
        .and_then(|rest| rest.strip_suffix(','))
    {
        return Some((source.to_string(), Label::Epsilon));
    }
    let symbol = key.chars().last()?;
    let source = key[..key.len() - symbol.len_utf8()].strip_suffix(',')?;
    Some((source.to_string(), Label::Symbol(symbol)))
}

impl<T: TransitionTable> Automaton<T> {
    /// Converts `self` into its dictionary form.
    pub fn to_dict(&self) -> AutomatonDict {
        let mut transitions: OrderedMap<String, Destinations> = OrderedMap::new();
        for edge in self.transitions.edges() {
            let key = format!("{},{}", edge.source, edge.label);
            match T::KIND {
                AutomatonKind::DFA => {
                    transitions.insert(key, Destinations::Single(edge.target.clone()));
                }
                _ => {
                    if let Destinations::Many(targets) = transitions
                        .entry(key)
                        .or_insert_with(|| Destinations::Many(vec![]))
                    {
                        targets.push(edge.target.clone());
                    }
                }
            }
        }
        AutomatonDict {
            states: self.states.iter().cloned().collect(),
            alphabet: self.alphabet.universe().map(String::from).collect(),
            transitions,
            initial_state: self.initial.clone(),
            final_states: self.finals.iter().cloned().collect(),
            epsilon_symbol: (T::KIND == AutomatonKind::EpsilonNFA).then(|| EPSILON.to_string()),
        }
    }

    /// Builds an automaton from its dictionary form, checking all invariants.
    pub fn from_dict(dict: &AutomatonDict) -> Result<Self, InvalidAutomatonError> {
        let malformed =
            |msg: String| InvalidAutomatonError::new(T::KIND, InvalidReason::Malformed(msg));

        let mut alphabet = Alphabet::default();
        for symbol in &dict.alphabet {
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (Some(sym), None) => {
                    alphabet.insert(sym);
                }
                _ => return Err(malformed(format!("`{symbol}` is not a single symbol"))),
            }
        }

        let epsilon = dict
            .epsilon_symbol
            .clone()
            .unwrap_or_else(|| EPSILON.to_string());
        let mut transitions = Vec::new();
        for (key, destinations) in &dict.transitions {
            let (source, label) = split_key(key, &epsilon)
                .ok_or_else(|| malformed(format!("`{key}` is not of the form `source,symbol`")))?;
            for target in destinations.clone().into_vec() {
                transitions.push((source.clone(), label, target));
            }
        }

        Automaton::new(
            dict.states.iter().cloned(),
            alphabet,
            transitions,
            dict.initial_state.clone(),
            dict.final_states.iter().cloned(),
        )
    }

    /// Serializes `self` to pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_dict())
            .unwrap_or_else(|e| unreachable!("dictionaries always serialize: {e}"))
    }

    /// Parses an automaton from JSON produced by [`Automaton::to_json`].
    pub fn from_json(json: &str) -> Result<Self, InvalidAutomatonError> {
        let dict: AutomatonDict = serde_json::from_str(json).map_err(|e| {
            InvalidAutomatonError::new(T::KIND, InvalidReason::Malformed(e.to_string()))
        })?;
        Self::from_dict(&dict)
    }
}

impl AnyAutomaton {
    /// Builds an automaton of the kind reported by [`AutomatonDict::kind`].
    pub fn from_dict(dict: &AutomatonDict) -> Result<AnyAutomaton, InvalidAutomatonError> {
        Ok(match dict.kind() {
            AutomatonKind::DFA => DFA::from_dict(dict)?.into(),
            AutomatonKind::NFA => NFA::from_dict(dict)?.into(),
            AutomatonKind::EpsilonNFA => EpsilonNFA::from_dict(dict)?.into(),
        })
    }

    /// Parses JSON into an automaton of the kind the data describes.
    pub fn from_json(json: &str) -> Result<AnyAutomaton, InvalidAutomatonError> {
        let dict: AutomatonDict = serde_json::from_str(json).map_err(|e| {
            InvalidAutomatonError::new(AutomatonKind::DFA, InvalidReason::Malformed(e.to_string()))
        })?;
        Self::from_dict(&dict)
    }

    /// Serializes the contained automaton to JSON.
    pub fn to_json(&self) -> String {
        match self {
            AnyAutomaton::DFA(a) => a.to_json(),
            AnyAutomaton::NFA(a) => a.to_json(),
            AnyAutomaton::EpsilonNFA(a) => a.to_json(),
        }
    }
}
