//! Regular expressions over a finite alphabet.
//!
//! Patterns consist of the symbols of the alphabet, `|` for union, juxtaposition for
//! concatenation, the postfix operators `*`, `+` and `?`, and parentheses for grouping. `ε`
//! denotes the empty word and `∅` the empty language. A backslash turns a metacharacter into a
//! literal (`\*`) or introduces an escape class (`\d`), see [`LexerConfig`].
//!
//! ```
//! use relang::prelude::*;
//!
//! let re = Regex::new("(a|b)*abb", "ab").unwrap();
//! assert!(re.is_match("aababb"));
//! assert!(!re.is_match("abba"));
//! ```

use tracing::debug;

use crate::{
    alphabet::Alphabet,
    automaton::{EpsilonNFA, FiniteAutomaton},
    error::RegexError,
    word::FiniteWord,
};

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod thompson;
pub mod token;

pub use ast::AstNode;
pub use lexer::{tokenize, Lexer, LexerConfig};
pub use parser::{parse, Parser};
pub use thompson::compile_ast;
pub use token::{Token, TokenKind};

/// A compiled pattern. Holds the syntax tree and the epsilon-NFA built from it.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: String,
    config: LexerConfig,
    ast: AstNode,
    automaton: EpsilonNFA,
}

impl Regex {
    /// Compiles `pattern` over `alphabet` with the default [`LexerConfig`].
    pub fn new<A: Into<Alphabet>>(pattern: &str, alphabet: A) -> Result<Self, RegexError> {
        Self::with_config(pattern, LexerConfig::new(alphabet))
    }

    /// Compiles `pattern` with the given configuration.
    pub fn with_config(pattern: &str, config: LexerConfig) -> Result<Self, RegexError> {
        let ast = parse(pattern, &config)?;
        let automaton = compile_ast(&ast, config.alphabet())?;
        debug!(
            "compiled `{pattern}` into an epsilon-NFA with {} states",
            automaton.size()
        );
        Ok(Self {
            pattern: pattern.to_string(),
            config,
            ast,
            automaton,
        })
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The configuration the pattern was compiled with.
    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// The syntax tree of the pattern.
    pub fn ast(&self) -> &AstNode {
        &self.ast
    }

    /// The epsilon-NFA built by the Thompson construction.
    pub fn automaton(&self) -> &EpsilonNFA {
        &self.automaton
    }

    /// Consumes `self` and returns the epsilon-NFA.
    pub fn into_automaton(self) -> EpsilonNFA {
        self.automaton
    }

    /// Returns true if the whole `word` belongs to the language of the pattern.
    pub fn is_match<W: FiniteWord + ?Sized>(&self, word: &W) -> bool {
        self.automaton.accepts(word)
    }
}

impl std::fmt::Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// Compiles `pattern` over `alphabet` straight into an epsilon-NFA.
pub fn compile(pattern: &str, alphabet: &Alphabet) -> Result<EpsilonNFA, RegexError> {
    Regex::new(pattern, alphabet.clone()).map(Regex::into_automaton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn words(alphabet: &str, max_len: usize) -> Vec<String> {
        KleeneStar::new(alphabet.chars())
            .up_to(max_len)
            .map(|w| w.into_iter().collect())
            .collect()
    }

    #[test_log::test]
    fn union_of_letters() {
        let re = Regex::new("a|b", "ab").unwrap();
        assert!(re.is_match("a"));
        assert!(re.is_match("b"));
        assert!(!re.is_match(""));
        assert!(!re.is_match("ab"));
    }

    #[test_log::test]
    fn star_of_union_accepts_everything() {
        let enfa = compile("(a|b)*", &Alphabet::from("ab")).unwrap();
        assert!(enfa.accepts(""));
        assert!(enfa.accepts("aabba"));
        for w in words("ab", 5) {
            assert!(enfa.accepts(&w), "{w}");
        }
    }

    #[test]
    fn escapes_and_classes() {
        let re = Regex::new(r"\d+(\*\d+)?", "0123456789*").unwrap();
        assert!(re.is_match("12*3"));
        assert!(re.is_match("7"));
        assert!(!re.is_match("*3"));
        assert!(!re.is_match("1*"));

        let re = Regex::new(r"a\s?b", "ab ").unwrap();
        assert!(re.is_match("a b"));
        assert!(re.is_match("ab"));
    }

    #[test]
    fn epsilon_and_empty() {
        let re = Regex::new("a(ε|b)", "ab").unwrap();
        assert!(re.is_match("a"));
        assert!(re.is_match("ab"));
        let re = Regex::new("a∅|b", "ab").unwrap();
        assert!(!re.is_match("a"));
        assert!(re.is_match("b"));
    }

    #[test]
    fn display_round_trips() {
        for pattern in ["(a|b)*abb", "a+b?|ε", r"(\*|a)+", "a∅"] {
            let re = Regex::new(pattern, "ab*").unwrap();
            let again = Regex::new(&re.ast().to_string(), "ab*").unwrap();
            assert!(
                re.automaton().to_dfa().equivalent(&again.automaton().to_dfa()),
                "{pattern}"
            );
        }
    }

    #[test]
    fn errors_propagate() {
        assert!(matches!(
            Regex::new("", "ab"),
            Err(RegexError::Syntax { .. })
        ));
        assert!(matches!(
            Regex::new("(a", "ab"),
            Err(RegexError::Parse { .. })
        ));
        assert!(matches!(
            compile("c", &Alphabet::from("ab")),
            Err(RegexError::Syntax { .. })
        ));
    }
}
