use std::{any::Any, sync::Arc};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::automaton::{AutomatonKind, FiniteAutomaton};

/// The conversions whose results are memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ToNfa,
    ToDfa,
    ToDfaDirect,
    Minimize,
    RemoveUnreachable,
    Complement,
    CompileRegex,
    Convert(AutomatonKind),
}

impl Operation {
    /// Name used in log messages and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ToNfa => "to_nfa",
            Operation::ToDfa => "to_dfa",
            Operation::ToDfaDirect => "to_dfa_direct",
            Operation::Minimize => "minimize",
            Operation::RemoveUnreachable => "remove_unreachable",
            Operation::Complement => "complement",
            Operation::CompileRegex => "compile_regex",
            Operation::Convert(AutomatonKind::DFA) => "convert_to_dfa",
            Operation::Convert(AutomatonKind::NFA) => "convert_to_nfa",
            Operation::Convert(AutomatonKind::EpsilonNFA) => "convert_to_epsilon_nfa",
        }
    }

    /// The kind of automaton the operation produces, `None` if it keeps the source kind.
    pub fn target_kind(&self) -> Option<AutomatonKind> {
        match self {
            Operation::ToNfa | Operation::Convert(AutomatonKind::NFA) => Some(AutomatonKind::NFA),
            Operation::ToDfa
            | Operation::ToDfaDirect
            | Operation::Minimize
            | Operation::Complement
            | Operation::Convert(AutomatonKind::DFA) => Some(AutomatonKind::DFA),
            Operation::CompileRegex | Operation::Convert(AutomatonKind::EpsilonNFA) => {
                Some(AutomatonKind::EpsilonNFA)
            }
            Operation::RemoveUnreachable => None,
        }
    }
}

/// Identifies one cached result: the operation, what it was applied to and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: Operation,
    pub source_kind: Option<AutomatonKind>,
    pub source_hash: u64,
    pub params: Option<u64>,
}

impl CacheKey {
    /// The key of applying `operation` to `source`.
    pub fn of<A: FiniteAutomaton + ?Sized>(operation: Operation, source: &A) -> Self {
        Self {
            operation,
            source_kind: Some(source.kind()),
            source_hash: source.structural_hash(),
            params: None,
        }
    }

    /// The key of an operation that has no source automaton, only parameters.
    pub fn of_params(operation: Operation, params: u64) -> Self {
        Self {
            operation,
            source_kind: None,
            source_hash: 0,
            params: Some(params),
        }
    }
}

/// Bounded cache of conversion results. When full, the entry that was inserted first is
/// evicted.
pub struct ConversionCache {
    capacity: usize,
    entries: IndexMap<CacheKey, Arc<dyn Any + Send + Sync>, FxBuildHasher>,
}

impl ConversionCache {
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Looks up `key`. Returns `None` on a miss or if the stored value is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let entry = Arc::clone(self.entries.get(key)?);
        entry.downcast::<T>().ok()
    }

    /// Stores `value` under `key` and returns how many entries were evicted to make room.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: CacheKey, value: Arc<T>) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        let mut evicted = 0;
        while self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.entries.shift_remove_index(0);
            evicted += 1;
        }
        self.entries.insert(key, value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for ConversionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionCache")
            .field("capacity", &self.capacity)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
