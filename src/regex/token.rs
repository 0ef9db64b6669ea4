use std::fmt::Display;

use crate::alphabet::Symbol;

/// The type of a [`Token`], together with its value where it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A symbol of the alphabet, possibly written as an escape like `\*`.
    Literal(Symbol),
    /// An escape class such as `\d`, carrying the character after the backslash.
    Class(char),
    /// `ε`, the empty word.
    Epsilon,
    /// `∅`, the empty language.
    Empty,
    /// `|`
    Union,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `?`
    Optional,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
}

impl TokenKind {
    /// Returns true if a token of this kind can begin an atom.
    pub fn starts_atom(&self) -> bool {
        matches!(
            self,
            TokenKind::Literal(_)
                | TokenKind::Class(_)
                | TokenKind::Epsilon
                | TokenKind::Empty
                | TokenKind::LeftParen
        )
    }

    /// Returns true for the postfix operators `*`, `+` and `?`.
    pub fn is_postfix(&self) -> bool {
        matches!(self, TokenKind::Star | TokenKind::Plus | TokenKind::Optional)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Literal(sym) => write!(f, "literal `{sym}`"),
            TokenKind::Class(c) => write!(f, "class `\\{c}`"),
            TokenKind::Epsilon => write!(f, "`ε`"),
            TokenKind::Empty => write!(f, "`∅`"),
            TokenKind::Union => write!(f, "`|`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Optional => write!(f, "`?`"),
            TokenKind::LeftParen => write!(f, "`(`"),
            TokenKind::RightParen => write!(f, "`)`"),
        }
    }
}

/// A lexical unit of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    /// What was recognized.
    pub kind: TokenKind,
    /// Byte offset of the first character of the token in the pattern.
    pub position: usize,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, position: usize) -> Self {
        Self { kind, position }
    }
}
