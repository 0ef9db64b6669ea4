//! Thompson construction: compiles an [`AstNode`] into an [`EpsilonNFA`].
//!
//! Every node is translated into a fragment with one initial state and a list of final
//! states. Fragments are allocated in post-order, so the states of a fragment always form a
//! contiguous range of indices, which makes it cheap to duplicate a fragment for `x+`.

use tracing::debug;

use crate::{
    alphabet::{Alphabet, Label},
    automaton::{EpsilonNFA, EpsilonTransitions, State},
    error::RegexError,
    math::OrderedSet,
    regex::ast::AstNode,
};

#[derive(Debug, Clone)]
struct Fragment {
    /// First state index belonging to the fragment.
    lo: usize,
    start: usize,
    finals: Vec<usize>,
}

/// The states and transitions allocated so far, indexed by state.
#[derive(Debug, Default)]
struct Arena {
    transitions: Vec<Vec<(Label, usize)>>,
}

impl Arena {
    fn len(&self) -> usize {
        self.transitions.len()
    }

    fn state(&mut self) -> usize {
        self.transitions.push(vec![]);
        self.transitions.len() - 1
    }

    fn link(&mut self, source: usize, label: Label, target: usize) {
        self.transitions[source].push((label, target));
    }

    fn epsilon(&mut self, source: usize, target: usize) {
        self.link(source, Label::Epsilon, target);
    }

    /// Copies the states `fragment.lo..` together with their transitions and returns the copy.
    fn duplicate(&mut self, fragment: &Fragment) -> Fragment {
        let hi = self.len();
        let offset = hi - fragment.lo;
        for q in fragment.lo..hi {
            let copied = self.transitions[q]
                .iter()
                .map(|(label, target)| (*label, target + offset))
                .collect();
            self.transitions.push(copied);
        }
        Fragment {
            lo: hi,
            start: fragment.start + offset,
            finals: fragment.finals.iter().map(|q| q + offset).collect(),
        }
    }

    fn concatenate(&mut self, left: Fragment, right: Fragment) -> Fragment {
        for &q in &left.finals {
            self.epsilon(q, right.start);
        }
        Fragment {
            lo: left.lo,
            start: left.start,
            finals: right.finals,
        }
    }

    fn alternate(&mut self, left: Fragment, right: Fragment) -> Fragment {
        let start = self.state();
        self.epsilon(start, left.start);
        self.epsilon(start, right.start);
        let mut finals = left.finals;
        finals.extend(right.finals);
        Fragment {
            lo: left.lo,
            start,
            finals,
        }
    }

    fn star(&mut self, inner: Fragment) -> Fragment {
        let start = self.state();
        let accept = self.state();
        self.epsilon(start, inner.start);
        self.epsilon(start, accept);
        for &q in &inner.finals {
            self.epsilon(q, inner.start);
            self.epsilon(q, accept);
        }
        Fragment {
            lo: inner.lo,
            start,
            finals: vec![accept],
        }
    }
}

enum Visit<'a> {
    Enter(&'a AstNode),
    Exit(&'a AstNode),
}

fn state_name(q: usize) -> State {
    format!("q{q}")
}

/// Compiles `ast` into an epsilon-NFA over `alphabet`. The states are named `q0`, `q1`, ... in
/// the order in which they are allocated. Fails with [`RegexError::Conversion`] if a literal
/// is not a member of `alphabet`.
pub fn compile_ast(ast: &AstNode, alphabet: &Alphabet) -> Result<EpsilonNFA, RegexError> {
    let mut arena = Arena::default();
    let mut fragments: Vec<Fragment> = vec![];
    let mut work = vec![Visit::Enter(ast)];

    let pop = |fragments: &mut Vec<Fragment>| {
        fragments
            .pop()
            .ok_or_else(|| RegexError::Conversion("operand fragment is missing".into()))
    };

    while let Some(visit) = work.pop() {
        match visit {
            Visit::Enter(node) => match node {
                AstNode::Literal(sym) => {
                    if !alphabet.contains(*sym) {
                        return Err(RegexError::Conversion(format!(
                            "literal `{sym}` is not in the alphabet {alphabet}"
                        )));
                    }
                    let lo = arena.state();
                    let accept = arena.state();
                    arena.link(lo, Label::Symbol(*sym), accept);
                    fragments.push(Fragment {
                        lo,
                        start: lo,
                        finals: vec![accept],
                    });
                }
                AstNode::Epsilon => {
                    let q = arena.state();
                    fragments.push(Fragment {
                        lo: q,
                        start: q,
                        finals: vec![q],
                    });
                }
                AstNode::Empty => {
                    let q = arena.state();
                    fragments.push(Fragment {
                        lo: q,
                        start: q,
                        finals: vec![],
                    });
                }
                AstNode::Union(l, r) | AstNode::Concatenation(l, r) => {
                    work.push(Visit::Exit(node));
                    work.push(Visit::Enter(r));
                    work.push(Visit::Enter(l));
                }
                AstNode::KleeneStar(x)
                | AstNode::KleenePlus(x)
                | AstNode::Optional(x)
                | AstNode::Group(x) => {
                    work.push(Visit::Exit(node));
                    work.push(Visit::Enter(x));
                }
            },
            Visit::Exit(node) => {
                let fragment = match node {
                    AstNode::Union(..) => {
                        let right = pop(&mut fragments)?;
                        let left = pop(&mut fragments)?;
                        arena.alternate(left, right)
                    }
                    AstNode::Concatenation(..) => {
                        let right = pop(&mut fragments)?;
                        let left = pop(&mut fragments)?;
                        arena.concatenate(left, right)
                    }
                    AstNode::KleeneStar(_) => {
                        let inner = pop(&mut fragments)?;
                        arena.star(inner)
                    }
                    AstNode::KleenePlus(_) => {
                        let inner = pop(&mut fragments)?;
                        let copy = arena.duplicate(&inner);
                        let repeated = arena.star(copy);
                        arena.concatenate(inner, repeated)
                    }
                    AstNode::Optional(_) => {
                        let inner = pop(&mut fragments)?;
                        let q = arena.state();
                        let empty = Fragment {
                            lo: q,
                            start: q,
                            finals: vec![q],
                        };
                        arena.alternate(inner, empty)
                    }
                    AstNode::Group(_) => pop(&mut fragments)?,
                    leaf => {
                        return Err(RegexError::Conversion(format!(
                            "terminal node `{leaf}` cannot be combined"
                        )))
                    }
                };
                fragments.push(fragment);
            }
        }
    }

    let root = pop(&mut fragments)?;
    if !fragments.is_empty() {
        return Err(RegexError::Conversion(
            "syntax tree left unused fragments".into(),
        ));
    }

    let mut table = EpsilonTransitions::default();
    for (source, row) in arena.transitions.iter().enumerate() {
        for (label, target) in row {
            table.add(&state_name(source), *label, &state_name(*target));
        }
    }
    let states: OrderedSet<State> = (0..arena.len()).map(state_name).collect();
    let finals = root.finals.iter().copied().map(state_name).collect();
    debug!(
        "Thompson construction built {} states for {} syntax nodes",
        states.len(),
        ast.size()
    );

    Ok(EpsilonNFA::from_parts(
        states,
        alphabet.clone(),
        table,
        state_name(root.start),
        finals,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn ab() -> Alphabet {
        Alphabet::from("ab")
    }

    #[test]
    fn literal_fragment() {
        let enfa = compile_ast(&AstNode::Literal('a'), &ab()).unwrap();
        assert_eq!(enfa.size(), 2);
        assert_eq!(enfa.initial_state(), "q0");
        assert!(enfa.is_final("q1"));
        assert!(enfa.accepts("a"));
        assert!(!enfa.accepts("b"));
        assert_eq!(enfa.alphabet(), &ab());
    }

    #[test]
    fn leaves() {
        let epsilon = compile_ast(&AstNode::Epsilon, &ab()).unwrap();
        assert_eq!(epsilon.size(), 1);
        assert!(epsilon.accepts(""));
        assert!(!epsilon.accepts("a"));

        let empty = compile_ast(&AstNode::Empty, &ab()).unwrap();
        assert_eq!(empty.size(), 1);
        assert!(!empty.accepts(""));
    }

    #[test]
    fn plus_duplicates_its_operand() {
        let ast = AstNode::plus(AstNode::concatenation(
            AstNode::Literal('a'),
            AstNode::Literal('b'),
        ));
        let enfa = compile_ast(&ast, &ab()).unwrap();
        // four states per copy of `ab`, two for the star
        assert_eq!(enfa.size(), 10);
        assert!(enfa.accepts("ab"));
        assert!(enfa.accepts("ababab"));
        assert!(!enfa.accepts(""));
        assert!(!enfa.accepts("aba"));
    }

    #[test]
    fn optional_and_star() {
        let ast = AstNode::concatenation(
            AstNode::optional(AstNode::Literal('a')),
            AstNode::star(AstNode::Literal('b')),
        );
        let enfa = compile_ast(&ast, &ab()).unwrap();
        for w in ["", "a", "b", "abbb", "bb"] {
            assert!(enfa.accepts(w), "{w}");
        }
        for w in ["aa", "ba", "abab"] {
            assert!(!enfa.accepts(w), "{w}");
        }
    }

    #[test]
    fn literals_outside_the_alphabet() {
        assert!(matches!(
            compile_ast(&AstNode::Literal('c'), &ab()),
            Err(RegexError::Conversion(_))
        ));
    }

    #[test]
    fn long_chains_compile_iteratively() {
        let mut ast = AstNode::Literal('a');
        for _ in 0..50_000 {
            ast = AstNode::concatenation(ast, AstNode::Literal('b'));
        }
        let enfa = compile_ast(&ast, &ab()).unwrap();
        assert_eq!(enfa.size(), 100_002);
    }
}
