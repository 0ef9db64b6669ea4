use std::str::CharIndices;

use crate::{
    alphabet::{Alphabet, Symbol},
    error::RegexError,
    math::OrderedMap,
    regex::token::{Token, TokenKind},
};

/// Default bound on the nesting of parentheses.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Characters with a meaning of their own. Written after a backslash they stand for themselves.
const METACHARACTERS: &[char] = &['|', '*', '+', '?', '(', ')', '\\'];

/// Configures which characters a pattern may use: the alphabet, the escape classes and the
/// maximal nesting depth of groups.
///
/// By default the classes `\d` (digits), `\w` (ASCII letters, digits and `_`) and `\s` (ASCII
/// whitespace) are known. A class only ever matches the members that are also in the
/// alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerConfig {
    alphabet: Alphabet,
    classes: OrderedMap<char, Alphabet>,
    max_depth: usize,
}

impl LexerConfig {
    /// Creates a configuration over `alphabet` with the default classes.
    pub fn new<A: Into<Alphabet>>(alphabet: A) -> Self {
        let classes = OrderedMap::from([
            ('d', ('0'..='9').collect()),
            (
                'w',
                ('a'..='z')
                    .chain('A'..='Z')
                    .chain('0'..='9')
                    .chain(['_'])
                    .collect(),
            ),
            ('s', Alphabet::new([' ', '\t', '\n', '\r', '\u{0b}', '\u{0c}'])),
        ]);
        Self {
            alphabet: alphabet.into(),
            classes,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Adds (or replaces) the class `\name`. Names that are metacharacters are ignored by the
    /// lexer, since `\|` and friends always denote the character itself.
    pub fn with_class<I: IntoIterator<Item = Symbol>>(mut self, name: char, symbols: I) -> Self {
        self.classes.insert(name, symbols.into_iter().collect());
        self
    }

    /// Removes all escape classes.
    pub fn without_classes(mut self) -> Self {
        self.classes.clear();
        self
    }

    /// Sets the maximal nesting depth of groups.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The alphabet patterns are written over.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The members of class `\name` that belong to the alphabet, if the class is known.
    pub fn class(&self, name: char) -> Option<Alphabet> {
        self.classes
            .get(&name)
            .map(|members| members.intersection(&self.alphabet))
    }

    /// The maximal nesting depth of groups.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Splits a pattern into [`Token`]s on demand. Cloning a lexer gives an independent cursor,
/// so a token stream can be restarted at any point.
///
/// Once an error has been produced the lexer is exhausted.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    config: &'a LexerConfig,
    chars: CharIndices<'a>,
    pattern: &'a str,
    failed: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `pattern`.
    pub fn new(pattern: &'a str, config: &'a LexerConfig) -> Self {
        Self {
            config,
            chars: pattern.char_indices(),
            pattern,
            failed: false,
        }
    }

    /// The pattern that is being lexed.
    pub fn pattern(&self) -> &'a str {
        self.pattern
    }

    fn escape(&mut self, position: usize) -> Result<Token, RegexError> {
        let Some((_, escaped)) = self.chars.next() else {
            return Err(RegexError::syntax(position, "truncated escape sequence"));
        };
        if METACHARACTERS.contains(&escaped) {
            if !self.config.alphabet.contains(escaped) {
                return Err(RegexError::syntax(
                    position,
                    format!("escaped `{escaped}` is not in the alphabet"),
                ));
            }
            return Ok(Token::new(TokenKind::Literal(escaped), position));
        }
        if self.config.classes.contains_key(&escaped) {
            return Ok(Token::new(TokenKind::Class(escaped), position));
        }
        Err(RegexError::syntax(
            position,
            format!("unknown escape sequence `\\{escaped}`"),
        ))
    }

    fn lex(&mut self, position: usize, c: char) -> Result<Token, RegexError> {
        let kind = match c {
            '\\' => return self.escape(position),
            '|' => TokenKind::Union,
            '*' => TokenKind::Star,
            '+' => TokenKind::Plus,
            '?' => TokenKind::Optional,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            'ε' => TokenKind::Epsilon,
            '∅' => TokenKind::Empty,
            c if self.config.alphabet.contains(c) => TokenKind::Literal(c),
            c => {
                return Err(RegexError::syntax(
                    position,
                    format!("character `{c}` is neither an operator nor in the alphabet"),
                ))
            }
        };
        Ok(Token::new(kind, position))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, RegexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (position, c) = self.chars.next()?;
        let token = self.lex(position, c);
        self.failed = token.is_err();
        Some(token)
    }
}

/// Lexes the whole pattern at once.
pub fn tokenize(pattern: &str, config: &LexerConfig) -> Result<Vec<Token>, RegexError> {
    Lexer::new(pattern, config).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::token::TokenKind::*;

    fn kinds(pattern: &str, config: &LexerConfig) -> Result<Vec<TokenKind>, RegexError> {
        tokenize(pattern, config).map(|tokens| tokens.into_iter().map(|t| t.kind).collect())
    }

    #[test]
    fn operators_and_literals() {
        let config = LexerConfig::new("ab");
        assert_eq!(
            kinds("(a|b)*a+b?", &config).unwrap(),
            vec![
                LeftParen,
                Literal('a'),
                Union,
                Literal('b'),
                RightParen,
                Star,
                Literal('a'),
                Plus,
                Literal('b'),
                Optional
            ]
        );
        assert_eq!(kinds("", &config).unwrap(), vec![]);
    }

    #[test]
    fn positions_are_byte_offsets() {
        let config = LexerConfig::new("a");
        let tokens = tokenize("εa∅", &config).unwrap();
        assert_eq!(tokens[0], Token::new(Epsilon, 0));
        assert_eq!(tokens[1], Token::new(Literal('a'), 2));
        assert_eq!(tokens[2], Token::new(Empty, 3));
    }

    #[test]
    fn escapes() {
        let config = LexerConfig::new("a*01");
        assert_eq!(
            kinds(r"\*a\d", &config).unwrap(),
            vec![Literal('*'), Literal('a'), Class('d')]
        );
        assert!(matches!(
            kinds(r"\+", &config),
            Err(RegexError::Syntax { position: 0, .. })
        ));
        assert!(matches!(
            kinds(r"a\", &config),
            Err(RegexError::Syntax { position: 1, .. })
        ));
        assert!(kinds(r"\q", &config).is_err());
        assert!(kinds(r"\d", &config.clone().without_classes()).is_err());
    }

    #[test]
    fn classes_are_restricted_to_the_alphabet() {
        let config = LexerConfig::new("ab12").with_class('v', ['a', 'e', 'i']);
        assert_eq!(config.class('d'), Some(Alphabet::from("12")));
        assert_eq!(config.class('v'), Some(Alphabet::from("a")));
        assert_eq!(config.class('s'), Some(Alphabet::default()));
        assert_eq!(config.class('x'), None);
    }

    #[test]
    fn unknown_characters_stop_the_lexer() {
        let config = LexerConfig::new("ab");
        let mut lexer = Lexer::new("ac b", &config);
        let restart = lexer.clone();
        assert_eq!(lexer.next(), Some(Ok(Token::new(Literal('a'), 0))));
        assert!(matches!(
            lexer.next(),
            Some(Err(RegexError::Syntax { position: 1, .. }))
        ));
        assert_eq!(lexer.next(), None);
        assert_eq!(restart.count(), 2);
    }
}
