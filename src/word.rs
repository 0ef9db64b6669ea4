use crate::alphabet::Symbol;

/// A finite word is a finite sequence of [`Symbol`]s. This is implemented for the usual
/// string and `char` sequence types so that automata can be queried with whatever is at hand.
pub trait FiniteWord {
    /// Returns an iterator over the symbols of the word, in order.
    fn symbols(&self) -> impl Iterator<Item = Symbol> + '_;

    /// Collects the word into a `String`.
    fn as_string(&self) -> String {
        self.symbols().collect()
    }
}

impl FiniteWord for str {
    fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.chars()
    }
}

impl FiniteWord for &str {
    fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.chars()
    }
}

impl FiniteWord for String {
    fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.chars()
    }
}

impl FiniteWord for [Symbol] {
    fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.iter().copied()
    }
}

impl FiniteWord for Vec<Symbol> {
    fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.iter().copied()
    }
}

impl<const N: usize> FiniteWord for [Symbol; N] {
    fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.iter().copied()
    }
}

/// Enumerates all words over a list of symbols in length-lexicographic order, starting
/// with the empty word. The iterator never ends unless the symbol list is empty, in which
/// case only the empty word is produced.
pub struct KleeneStar {
    symbols: Vec<Symbol>,
    current: Option<Vec<usize>>,
}

impl Iterator for KleeneStar {
    type Item = Vec<Symbol>;
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.as_mut()?;
        let out = current.iter().map(|i| self.symbols[*i]).collect();

        if self.symbols.is_empty() {
            self.current = None;
            return Some(out);
        }

        let mut carry = true;
        let mut i = current.len();
        while carry && i > 0 {
            i -= 1;
            current[i] += 1;
            if current[i] >= self.symbols.len() {
                current[i] = 0;
                carry = true;
            } else {
                carry = false;
            }
        }

        if carry {
            *current = vec![0; current.len() + 1];
        }

        Some(out)
    }
}

impl KleeneStar {
    /// Starts the enumeration at the empty word.
    pub fn new<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
            current: Some(vec![]),
        }
    }

    /// Enumerates all words of length at most `max_len`.
    pub fn up_to(self, max_len: usize) -> impl Iterator<Item = Vec<Symbol>> {
        self.take_while(move |w| w.len() <= max_len)
    }
}

/// The number of words of length at most `max_len` over an alphabet with `size` symbols,
/// saturating at `usize::MAX`.
pub fn words_up_to(size: usize, max_len: usize) -> usize {
    let mut total: usize = 1;
    let mut layer: usize = 1;
    for _ in 0..max_len {
        layer = layer.saturating_mul(size);
        total = total.saturating_add(layer);
    }
    total
}
