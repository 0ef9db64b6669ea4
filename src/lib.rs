//! Library for regular languages and finite automata over character alphabets.
//!
//! Patterns of a small regular expression language are parsed into an [`regex::AstNode`] and
//! compiled into an [`automaton::EpsilonNFA`] by the Thompson construction. From there the
//! three representations of finite automata can be converted into one another: epsilon
//! transitions are eliminated to obtain an [`automaton::NFA`], the subset construction yields
//! a [`automaton::DFA`] and Moore's partition refinement minimizes it.
//!
//! All automata are immutable values, every algorithm takes its operands by reference and
//! produces a fresh automaton. The module [`operations`] implements the algebra of regular
//! languages (union, intersection, concatenation, Kleene star, complement, difference and
//! homomorphisms) on top of product and closure constructions.
//!
//! For repeated or potentially expensive conversions, the [`engine::ConversionEngine`]
//! memoizes results, bounds them in time and size and checks them against their source on a
//! finite set of probe words.
//!
//! ```
//! use relang::prelude::*;
//!
//! let re = Regex::new("(a|b)*abb", "ab").unwrap();
//! let dfa = re.automaton().to_dfa().minimize();
//! assert_eq!(dfa.size(), 4);
//! assert!(dfa.accepts("babb"));
//! assert_eq!(dfa.give_word().as_deref(), Some("abb"));
//! ```
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use relang::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, Label, Symbol, EPSILON},
        automaton::{
            AnyAutomaton, Automaton, AutomatonBuilder, AutomatonDict, AutomatonKind,
            DeterministicTransitions, Edge, EpsilonNFA, EpsilonTransitions, FiniteAutomaton,
            NondeterministicTransitions, ProductAcceptance, State, TransitionTable, DFA, NFA,
        },
        budget::{Bounded, Budget, Unbounded},
        engine::{ConversionEngine, ConversionStats, EngineConfig},
        error::{
            ConversionError, Error, InvalidAutomatonError, InvalidReason, OperationError,
            RegexError,
        },
        math::{Map, OrderedMap, OrderedSet, Partition, Set},
        operations,
        regex::{AstNode, LexerConfig, Regex},
        word::{FiniteWord, KleeneStar},
    };
}

/// Sets, maps, bijections and partitions used throughout the crate.
pub mod math;

/// Symbols, transition labels and alphabets.
pub mod alphabet;

/// Finite words and their enumeration.
pub mod word;

/// Error types of the crate.
pub mod error;
pub use error::{Error, Result};

pub mod regex;

/// Deterministic, nondeterministic and epsilon automata and their common interface.
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;

/// Epsilon closures and the subset construction.
pub mod determinization;

/// Minimization of deterministic automata.
pub mod minimization;

pub mod operations;

/// Cooperative time and size budgets for long running algorithms.
pub mod budget;

pub mod engine;

/// Implements the generation of random automata.
#[cfg(feature = "random")]
pub mod random;
