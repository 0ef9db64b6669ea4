use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::math::OrderedSet;

/// A symbol is a single character. Words are sequences of symbols.
pub type Symbol = char;

/// The character used to render (and serialize) the empty word / epsilon label.
pub const EPSILON: char = 'ε';

/// The label of a transition in an [`crate::automaton::EpsilonNfa`]. Deterministic and
/// nondeterministic automata only ever use [`Label::Symbol`], an epsilon-NFA may in addition
/// use [`Label::Epsilon`] to move without consuming input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    /// A free transition that does not consume a symbol.
    Epsilon,
    /// A transition that consumes the given symbol.
    Symbol(Symbol),
}

impl Label {
    /// Returns the symbol of `self`, or `None` for an epsilon label.
    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            Label::Epsilon => None,
            Label::Symbol(sym) => Some(*sym),
        }
    }

    /// Returns `true` iff `self` is the epsilon label.
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }
}

impl From<Symbol> for Label {
    fn from(value: Symbol) -> Self {
        Label::Symbol(value)
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Epsilon => write!(f, "{EPSILON}"),
            Label::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

/// A finite alphabet, i.e. a finite set of [`Symbol`]s. The symbols are kept sorted, so
/// iterating over an alphabet always yields the same order.
///
/// # Example
/// ```
/// use relang::alphabet::Alphabet;
/// let alphabet = Alphabet::from("abca");
/// assert_eq!(alphabet.size(), 3);
/// assert!(alphabet.contains('c'));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alphabet(OrderedSet<Symbol>);

impl Alphabet {
    /// Creates a new alphabet from the given symbols, duplicates are collapsed.
    pub fn new<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        Self(symbols.into_iter().collect())
    }

    /// Creates an alphabet with `size` symbols, namely the first `size` letters `a`, `b`, ...
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// The number of symbols.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the alphabet has no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `symbol` is a member of the alphabet.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.0.contains(&symbol)
    }

    /// Iterates over the symbols in ascending order.
    pub fn universe(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().copied()
    }

    /// Returns the union of `self` and `other`.
    pub fn union(&self, other: &Alphabet) -> Alphabet {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// Returns the symbols of `self` that are also in `other`.
    pub fn intersection(&self, other: &Alphabet) -> Alphabet {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    /// Adds a symbol, returning whether it was not present before.
    pub(crate) fn insert(&mut self, symbol: Symbol) -> bool {
        self.0.insert(symbol)
    }
}

impl From<&str> for Alphabet {
    fn from(value: &str) -> Self {
        Self::new(value.chars())
    }
}

impl From<Vec<Symbol>> for Alphabet {
    fn from(value: Vec<Symbol>) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> From<[Symbol; N]> for Alphabet {
    fn from(value: [Symbol; N]) -> Self {
        Self::new(value)
    }
}

impl FromIterator<Symbol> for Alphabet {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a Alphabet {
    type Item = &'a Symbol;
    type IntoIter = std::collections::btree_set::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Alphabet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_is_sorted_and_deduplicated() {
        let alphabet = Alphabet::from("cabba");
        assert_eq!(alphabet.universe().collect::<String>(), "abc");
        assert_eq!(alphabet.to_string(), "{a, b, c}");
    }

    #[test]
    fn set_operations() {
        let ab = Alphabet::from("ab");
        let bc = Alphabet::from("bc");
        assert_eq!(ab.union(&bc), Alphabet::from("abc"));
        assert_eq!(ab.intersection(&bc), Alphabet::from("b"));
        assert_eq!(Alphabet::of_size(2), ab);
    }

    #[test]
    fn epsilon_sorts_first() {
        assert!(Label::Epsilon < Label::Symbol('a'));
        assert_eq!(Label::Symbol('x').symbol(), Some('x'));
        assert_eq!(Label::Epsilon.to_string(), "ε");
    }
}
