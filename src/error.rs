use std::time::Duration;

use thiserror::Error;

use crate::automaton::AutomatonKind;

/// Errors raised while turning a pattern into an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegexError {
    /// The lexer met a character it cannot classify, a truncated escape, or the input was empty.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Byte offset into the pattern.
        position: usize,
        /// What went wrong.
        message: String,
    },
    /// The token stream does not follow the grammar.
    #[error("parse error at position {position}: {message}")]
    Parse {
        /// Byte offset into the pattern.
        position: usize,
        /// What went wrong.
        message: String,
    },
    /// The syntax tree cannot be compiled into an automaton.
    #[error("could not convert syntax tree: {0}")]
    Conversion(String),
}

impl RegexError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// A construction-time invariant of an automaton is violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {reason}")]
pub struct InvalidAutomatonError {
    /// Which kind of automaton was being built.
    pub kind: AutomatonKind,
    /// The violated invariant.
    pub reason: InvalidReason,
}

impl InvalidAutomatonError {
    pub(crate) fn new(kind: AutomatonKind, reason: InvalidReason) -> Self {
        Self { kind, reason }
    }
}

/// The individual invariants checked when an automaton is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("the set of states is empty")]
    NoStates,
    #[error("initial state `{0}` is not a declared state")]
    UnknownInitialState(String),
    #[error("final state `{0}` is not a declared state")]
    UnknownFinalState(String),
    #[error("transition mentions undeclared state `{0}`")]
    UnknownTransitionState(String),
    #[error("transition symbol `{0}` is not in the alphabet")]
    UnknownSymbol(char),
    #[error("the epsilon symbol is part of the alphabet")]
    EpsilonInAlphabet,
    #[error("epsilon transition from `{0}` in an automaton without epsilon moves")]
    UnexpectedEpsilon(String),
    #[error("state `{state}` has more than one successor on `{symbol}`")]
    Nondeterministic { state: String, symbol: char },
    #[error("malformed serialized automaton: {0}")]
    Malformed(String),
}

/// Errors raised by the language operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The operands of a binary operation do not share the same alphabet.
    #[error("incompatible automata: alphabets {left} and {right} differ")]
    IncompatibleAutomata {
        /// Rendered alphabet of the left operand.
        left: String,
        /// Rendered alphabet of the right operand.
        right: String,
    },
    /// The operand is of the wrong kind, or a parameter is out of range.
    #[error("invalid operation `{operation}`: {message}")]
    Validation {
        /// The name of the attempted operation.
        operation: &'static str,
        /// What is wrong with the operands.
        message: String,
    },
}

impl OperationError {
    pub(crate) fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            message: message.into(),
        }
    }
}

/// Errors raised when a conversion exceeds its bounds or fails its post-condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The wall-clock budget was exhausted.
    #[error("conversion `{operation}` timed out after {elapsed:?} (budget {budget:?})")]
    Timeout {
        /// The conversion that was aborted.
        operation: &'static str,
        /// Time spent before aborting.
        elapsed: Duration,
        /// The configured budget.
        budget: Duration,
    },
    /// The state-count ceiling was exceeded.
    #[error("conversion `{operation}` needs {states} states, the limit is {max_states}")]
    Memory {
        /// The conversion that was aborted.
        operation: &'static str,
        /// Number of states at the time of aborting.
        states: usize,
        /// The configured ceiling.
        max_states: usize,
    },
    /// The result of a conversion disagrees with its source on a probe word.
    #[error("conversion `{operation}` changed the language, witness `{witness}`")]
    NotEquivalent {
        /// The conversion whose result was rejected.
        operation: &'static str,
        /// A word on which source and result disagree.
        witness: String,
    },
}

/// The error type of this crate, every fallible public function returns it or one of the
/// more specific error types that convert into it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Regex(#[from] RegexError),
    #[error(transparent)]
    InvalidAutomaton(#[from] InvalidAutomatonError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
