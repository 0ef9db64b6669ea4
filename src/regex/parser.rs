use tracing::trace;

use crate::{
    error::RegexError,
    regex::{
        ast::AstNode,
        lexer::{Lexer, LexerConfig},
        token::{Token, TokenKind},
    },
};

/// Recursive descent parser for the grammar
/// ```text
/// expr   := term ('|' term)*
/// term   := factor+
/// factor := atom ('*' | '+' | '?')*
/// atom   := LITERAL | CLASS | 'ε' | '∅' | '(' expr ')'
/// ```
/// Tokens are pulled from the [`Lexer`] one at a time and every token is consumed exactly
/// once. Only groups recurse, and their nesting is bounded by
/// [`LexerConfig::max_depth`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    config: &'a LexerConfig,
    lookahead: Option<Token>,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser for `pattern`.
    pub fn new(pattern: &'a str, config: &'a LexerConfig) -> Self {
        Self {
            lexer: Lexer::new(pattern, config),
            config,
            lookahead: None,
            depth: 0,
        }
    }

    /// Parses the complete pattern.
    pub fn parse(mut self) -> Result<AstNode, RegexError> {
        if self.lexer.pattern().is_empty() {
            return Err(RegexError::syntax(0, "empty pattern"));
        }
        let ast = self.expr()?;
        if let Some(token) = self.peek()? {
            return Err(RegexError::parse(
                token.position,
                format!("unexpected {}, unbalanced parentheses", token.kind),
            ));
        }
        trace!("parsed `{}` into {} nodes", self.lexer.pattern(), ast.size());
        Ok(ast)
    }

    fn end(&self) -> usize {
        self.lexer.pattern().len()
    }

    fn peek(&mut self) -> Result<Option<Token>, RegexError> {
        if self.lookahead.is_none() {
            self.lookahead = self.lexer.next().transpose()?;
        }
        Ok(self.lookahead)
    }

    fn bump(&mut self) -> Result<Option<Token>, RegexError> {
        let token = self.peek()?;
        self.lookahead = None;
        Ok(token)
    }

    fn expr(&mut self) -> Result<AstNode, RegexError> {
        let mut left = self.term()?;
        while let Some(Token {
            kind: TokenKind::Union,
            ..
        }) = self.peek()?
        {
            self.bump()?;
            let right = self.term()?;
            left = AstNode::union(left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<AstNode, RegexError> {
        let mut left = self.factor()?;
        while let Some(token) = self.peek()? {
            if !token.kind.starts_atom() {
                break;
            }
            let right = self.factor()?;
            left = AstNode::concatenation(left, right);
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<AstNode, RegexError> {
        let mut node = self.atom()?;
        while let Some(token) = self.peek()? {
            node = match token.kind {
                TokenKind::Star => AstNode::star(node),
                TokenKind::Plus => AstNode::plus(node),
                TokenKind::Optional => AstNode::optional(node),
                _ => break,
            };
            self.bump()?;
        }
        Ok(node)
    }

    fn atom(&mut self) -> Result<AstNode, RegexError> {
        let Some(token) = self.bump()? else {
            return Err(RegexError::parse(self.end(), "expected an operand"));
        };
        match token.kind {
            TokenKind::Literal(sym) => Ok(AstNode::Literal(sym)),
            TokenKind::Epsilon => Ok(AstNode::Epsilon),
            TokenKind::Empty => Ok(AstNode::Empty),
            TokenKind::Class(name) => Ok(self.class(name)),
            TokenKind::LeftParen => self.group(token),
            TokenKind::Union => Err(RegexError::parse(
                token.position,
                "missing operand of `|`",
            )),
            TokenKind::RightParen => Err(RegexError::parse(
                token.position,
                "unbalanced `)` or empty group",
            )),
            kind => Err(RegexError::parse(
                token.position,
                format!("{kind} does not follow an operand"),
            )),
        }
    }

    fn group(&mut self, open: Token) -> Result<AstNode, RegexError> {
        self.depth += 1;
        if self.depth > self.config.max_depth() {
            return Err(RegexError::parse(
                open.position,
                format!(
                    "groups are nested deeper than {} levels",
                    self.config.max_depth()
                ),
            ));
        }
        if let Some(Token {
            kind: TokenKind::RightParen,
            position,
        }) = self.peek()?
        {
            return Err(RegexError::parse(position, "empty group"));
        }
        let inner = self.expr()?;
        match self.bump()? {
            Some(Token {
                kind: TokenKind::RightParen,
                ..
            }) => {
                self.depth -= 1;
                Ok(AstNode::group(inner))
            }
            _ => Err(RegexError::parse(open.position, "unbalanced `(`")),
        }
    }

    /// Expands the class `\name` into a union of its members, or the empty language if none
    /// of its members is in the alphabet.
    fn class(&self, name: char) -> AstNode {
        let members = self.config.class(name).unwrap_or_default();
        members
            .universe()
            .map(AstNode::Literal)
            .reduce(AstNode::union)
            .unwrap_or(AstNode::Empty)
    }
}

/// Parses `pattern` into a syntax tree.
pub fn parse(pattern: &str, config: &LexerConfig) -> Result<AstNode, RegexError> {
    Parser::new(pattern, config).parse()
}
