use std::fmt::Display;

use crate::alphabet::Symbol;

/// A node of the syntax tree of a pattern. Leaves are [`AstNode::Literal`],
/// [`AstNode::Epsilon`] and [`AstNode::Empty`]; unions and concatenations have exactly two
/// children, the postfix operators and groups exactly one.
///
/// Trees are torn down iteratively, so even very long chains of concatenations can be
/// dropped without exhausting the stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AstNode {
    /// A single symbol.
    Literal(Symbol),
    /// The empty word.
    Epsilon,
    /// The empty language.
    Empty,
    /// `l|r`
    Union(Box<AstNode>, Box<AstNode>),
    /// `lr`
    Concatenation(Box<AstNode>, Box<AstNode>),
    /// `x*`
    KleeneStar(Box<AstNode>),
    /// `x+`
    KleenePlus(Box<AstNode>),
    /// `x?`
    Optional(Box<AstNode>),
    /// `(x)`
    Group(Box<AstNode>),
}

impl AstNode {
    pub fn union(left: AstNode, right: AstNode) -> AstNode {
        AstNode::Union(Box::new(left), Box::new(right))
    }

    pub fn concatenation(left: AstNode, right: AstNode) -> AstNode {
        AstNode::Concatenation(Box::new(left), Box::new(right))
    }

    pub fn star(inner: AstNode) -> AstNode {
        AstNode::KleeneStar(Box::new(inner))
    }

    pub fn plus(inner: AstNode) -> AstNode {
        AstNode::KleenePlus(Box::new(inner))
    }

    pub fn optional(inner: AstNode) -> AstNode {
        AstNode::Optional(Box::new(inner))
    }

    pub fn group(inner: AstNode) -> AstNode {
        AstNode::Group(Box::new(inner))
    }

    /// Returns true for the leaves `Literal`, `Epsilon` and `Empty`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AstNode::Literal(_) | AstNode::Epsilon | AstNode::Empty)
    }

    /// The direct children, from left to right.
    pub fn children(&self) -> Vec<&AstNode> {
        match self {
            AstNode::Literal(_) | AstNode::Epsilon | AstNode::Empty => vec![],
            AstNode::Union(l, r) | AstNode::Concatenation(l, r) => vec![&**l, &**r],
            AstNode::KleeneStar(x)
            | AstNode::KleenePlus(x)
            | AstNode::Optional(x)
            | AstNode::Group(x) => vec![&**x],
        }
    }

    /// The number of nodes in the tree rooted at `self`.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }

    /// Moves the inner children of `self` onto `stack`, leaving leaves in their place.
    fn detach_children(&mut self, stack: &mut Vec<Box<AstNode>>) {
        let mut take = |child: &mut Box<AstNode>| {
            if !child.is_terminal() {
                stack.push(std::mem::replace(child, Box::new(AstNode::Empty)));
            }
        };
        match self {
            AstNode::Literal(_) | AstNode::Epsilon | AstNode::Empty => {}
            AstNode::Union(l, r) | AstNode::Concatenation(l, r) => {
                take(l);
                take(r);
            }
            AstNode::KleeneStar(x)
            | AstNode::KleenePlus(x)
            | AstNode::Optional(x)
            | AstNode::Group(x) => take(x),
        }
    }
}

impl Drop for AstNode {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.detach_children(&mut stack);
        while let Some(mut node) = stack.pop() {
            node.detach_children(&mut stack);
        }
    }
}

enum Piece<'a> {
    Node(&'a AstNode),
    Text(&'static str),
}

/// Renders the tree as a fully parenthesized pattern that parses back to the same language.
impl Display for AstNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(node) => node,
            };
            match node {
                AstNode::Literal(sym) if "|*+?()\\".contains(*sym) => write!(f, "\\{sym}")?,
                AstNode::Literal(sym) => write!(f, "{sym}")?,
                AstNode::Epsilon => f.write_str("ε")?,
                AstNode::Empty => f.write_str("∅")?,
                AstNode::Union(l, r) => stack.extend([
                    Piece::Text(")"),
                    Piece::Node(r),
                    Piece::Text("|"),
                    Piece::Node(l),
                    Piece::Text("("),
                ]),
                AstNode::Concatenation(l, r) => stack.extend([
                    Piece::Text(")"),
                    Piece::Node(r),
                    Piece::Node(l),
                    Piece::Text("("),
                ]),
                AstNode::KleeneStar(x) => stack.extend([Piece::Text("*"), Piece::Node(x)]),
                AstNode::KleenePlus(x) => stack.extend([Piece::Text("+"), Piece::Node(x)]),
                AstNode::Optional(x) => stack.extend([Piece::Text("?"), Piece::Node(x)]),
                AstNode::Group(x) => {
                    stack.extend([Piece::Text(")"), Piece::Node(x), Piece::Text("(")])
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AstNode;

    #[test]
    fn display_is_fully_parenthesized() {
        let ast = AstNode::concatenation(
            AstNode::star(AstNode::union(AstNode::Literal('a'), AstNode::Literal('b'))),
            AstNode::optional(AstNode::group(AstNode::Literal('*'))),
        );
        assert_eq!(ast.to_string(), r"((a|b)*(\*)?)");
        assert_eq!(AstNode::plus(AstNode::Epsilon).to_string(), "ε+");
        assert_eq!(AstNode::Empty.to_string(), "∅");
    }

    #[test]
    fn shape() {
        let ast = AstNode::union(AstNode::Literal('a'), AstNode::star(AstNode::Epsilon));
        assert_eq!(ast.size(), 4);
        assert_eq!(ast.children().len(), 2);
        assert!(!ast.is_terminal());
        assert!(AstNode::Literal('a').is_terminal());
    }

    #[test]
    fn deep_trees_drop_without_recursion() {
        let mut ast = AstNode::Literal('a');
        for _ in 0..200_000 {
            ast = AstNode::concatenation(ast, AstNode::Literal('a'));
        }
        assert_eq!(ast.size(), 400_001);
        drop(ast);
    }
}
