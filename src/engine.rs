//! Memoizing, bounded and self-checking wrapper around the conversion algorithms.
//!
//! A [`ConversionEngine`] caches every result under the structural hash of its source, aborts
//! conversions that exceed the state ceiling or the time budget of its [`EngineConfig`], and
//! checks every fresh result against its source on a finite set of probe words.
//!
//! ```
//! use relang::prelude::*;
//!
//! let engine = ConversionEngine::default();
//! let enfa = engine.compile_regex("(a|b)*abb", &Alphabet::from("ab")).unwrap();
//! let first = engine.minimize(enfa.as_ref()).unwrap();
//! let second = engine.minimize(enfa.as_ref()).unwrap();
//! assert_eq!(first.size(), 4);
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! assert_eq!(engine.stats().cache_hits, 1);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    alphabet::{Alphabet, Symbol},
    automaton::{
        AnyAutomaton, Automaton, AutomatonKind, EpsilonNFA, FiniteAutomaton, TransitionTable, DFA,
        NFA,
    },
    budget::{Budget, Bounded},
    determinization::{epsilon_subset_construction_bounded, subset_construction_bounded},
    error::{ConversionError, Error, Result},
    operations, regex,
    word::{words_up_to, KleeneStar},
};

pub mod cache;
pub mod config;
pub mod stats;

pub use cache::{CacheKey, ConversionCache, Operation};
pub use config::EngineConfig;
pub use stats::ConversionStats;

/// Owns a cache of conversion results and statistics about its use.
///
/// The engine can be shared between threads. The cache stays locked while a result is
/// computed, so concurrent requests for the same conversion compute it once.
#[derive(Debug)]
pub struct ConversionEngine {
    config: EngineConfig,
    cache: Mutex<ConversionCache>,
    stats: Mutex<ConversionStats>,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ConversionEngine {
    /// Creates an engine with an empty cache.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: Mutex::new(ConversionCache::new(config.cache_capacity)),
            stats: Mutex::new(ConversionStats::default()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A snapshot of the statistics.
    pub fn stats(&self) -> ConversionStats {
        self.lock_stats().clone()
    }

    /// Drops every cached result. Statistics are kept.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    pub fn reset_stats(&self) {
        *self.lock_stats() = ConversionStats::default();
    }

    fn lock_cache(&self) -> MutexGuard<'_, ConversionCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_stats(&self) -> MutexGuard<'_, ConversionStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached result for `key` or computes, records and caches it. The closure
    /// must not call back into the engine.
    fn cached<T, F>(&self, key: CacheKey, compute: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&mut Bounded) -> Result<T>,
    {
        let operation = key.operation;
        let mut cache = self.lock_cache();
        if let Some(hit) = cache.get::<T>(&key) {
            trace!("cache hit for `{}`", operation.name());
            self.lock_stats().cache_hits += 1;
            return Ok(hit);
        }

        let mut budget = Bounded::new(operation.name())
            .with_timeout(self.config.timeout)
            .with_max_states(self.config.max_states);
        let result = compute(&mut budget);
        let elapsed = budget.elapsed();

        let mut stats = self.lock_stats();
        stats.cache_misses += 1;
        stats.conversions += 1;
        stats.total_time += elapsed;
        match result {
            Ok(value) => {
                debug!("computed `{}` in {elapsed:?}", operation.name());
                let value = Arc::new(value);
                stats.evictions += cache.insert(key, Arc::clone(&value)) as u64;
                Ok(value)
            }
            Err(err) => {
                match &err {
                    Error::Conversion(ConversionError::Timeout { .. }) => stats.timeouts += 1,
                    Error::Conversion(ConversionError::Memory { .. }) => {
                        stats.memory_rejections += 1
                    }
                    _ => {}
                }
                debug!("`{}` failed after {elapsed:?}: {err}", operation.name());
                Err(err)
            }
        }
    }

    /// Removes the epsilon transitions of `source`.
    pub fn to_nfa<A: FiniteAutomaton>(&self, source: &A) -> Result<Arc<NFA>> {
        let operation = Operation::ToNfa;
        self.cached(CacheKey::of(operation, source), |budget| {
            budget.admit(source.size())?;
            let nfa = source.to_nfa();
            budget.admit(nfa.size())?;
            self.validate(operation, source, &nfa, false)?;
            Ok(nfa)
        })
    }

    /// Determinizes `source` by the subset construction on its epsilon-free form.
    pub fn to_dfa<A: FiniteAutomaton>(&self, source: &A) -> Result<Arc<DFA>> {
        let operation = Operation::ToDfa;
        self.cached(CacheKey::of(operation, source), |budget| {
            budget.admit(source.size())?;
            let dfa = determinize(source, budget)?;
            self.validate(operation, source, &dfa, false)?;
            Ok(dfa)
        })
    }

    /// Determinizes `source` by the subset construction over epsilon closures.
    pub fn to_dfa_direct<A: FiniteAutomaton>(&self, source: &A) -> Result<Arc<DFA>> {
        let operation = Operation::ToDfaDirect;
        self.cached(CacheKey::of(operation, source), |budget| {
            budget.admit(source.size())?;
            let dfa = epsilon_subset_construction_bounded(&source.to_epsilon_nfa(), budget)?;
            self.validate(operation, source, &dfa, false)?;
            Ok(dfa)
        })
    }

    /// Determinizes `source` if needed and minimizes the result.
    pub fn minimize<A: FiniteAutomaton>(&self, source: &A) -> Result<Arc<DFA>> {
        let operation = Operation::Minimize;
        self.cached(CacheKey::of(operation, source), |budget| {
            budget.admit(source.size())?;
            let minimal = determinize(source, budget)?.minimize_bounded(budget)?;
            self.validate(operation, source, &minimal, false)?;
            Ok(minimal)
        })
    }

    /// Removes the states of `source` that cannot be reached from its initial state.
    pub fn remove_unreachable<T>(&self, source: &Automaton<T>) -> Result<Arc<Automaton<T>>>
    where
        T: TransitionTable + Send + Sync + 'static,
        Automaton<T>: FiniteAutomaton,
    {
        let operation = Operation::RemoveUnreachable;
        self.cached(CacheKey::of(operation, source), |budget| {
            budget.admit(source.size())?;
            let trimmed = source.remove_unreachable_states();
            self.validate(operation, source, &trimmed, false)?;
            Ok(trimmed)
        })
    }

    /// The complement of a deterministic `source`, see [`operations::complement`].
    pub fn complement<A: FiniteAutomaton>(&self, source: &A) -> Result<Arc<DFA>> {
        let operation = Operation::Complement;
        self.cached(CacheKey::of(operation, source), |budget| {
            budget.admit(source.size())?;
            let complement = operations::complement(source)?;
            budget.admit(complement.size())?;
            self.validate(operation, source, &complement, true)?;
            Ok(complement)
        })
    }

    /// Compiles `pattern` over `alphabet` with the Thompson construction.
    pub fn compile_regex(&self, pattern: &str, alphabet: &Alphabet) -> Result<Arc<EpsilonNFA>> {
        let key = CacheKey::of_params(Operation::CompileRegex, fxhash::hash64(&(pattern, alphabet)));
        self.cached(key, |budget| {
            let enfa = regex::compile(pattern, alphabet)?;
            budget.admit(enfa.size())?;
            Ok(enfa)
        })
    }

    /// Converts `source` into the representation `kind`.
    pub fn convert<A: FiniteAutomaton>(
        &self,
        source: &A,
        kind: AutomatonKind,
    ) -> Result<Arc<AnyAutomaton>> {
        let operation = Operation::Convert(kind);
        self.cached(CacheKey::of(operation, source), |budget| {
            budget.admit(source.size())?;
            let target: AnyAutomaton = match kind {
                AutomatonKind::DFA => determinize(source, budget)?.into(),
                AutomatonKind::NFA => source.to_nfa().into(),
                AutomatonKind::EpsilonNFA => source.to_epsilon_nfa().into(),
            };
            budget.admit(target.size())?;
            self.validate(operation, source, &target, false)?;
            Ok(target)
        })
    }

    /// Looks for a probe word on which `a` and `b` disagree. `None` means the two automata
    /// agree on every probe, which does not prove that they are equivalent.
    pub fn check_equivalence<A: FiniteAutomaton, B: FiniteAutomaton>(
        &self,
        a: &A,
        b: &B,
    ) -> Option<String> {
        let alphabet = a.alphabet().union(b.alphabet());
        self.probes(&alphabet)
            .into_iter()
            .find(|w| a.accepts(w) != b.accepts(w))
            .map(|w| w.into_iter().collect())
    }

    /// Checks that `target` accepts the same probe words as `source`, or exactly the other
    /// ones if `negated`.
    fn validate<A, B>(
        &self,
        operation: Operation,
        source: &A,
        target: &B,
        negated: bool,
    ) -> Result<(), ConversionError>
    where
        A: FiniteAutomaton + ?Sized,
        B: FiniteAutomaton + ?Sized,
    {
        if !self.config.validate {
            return Ok(());
        }
        let probes = self.probes(source.alphabet());
        trace!(
            "validating `{}` on {} probe words",
            operation.name(),
            probes.len()
        );
        match probes
            .into_iter()
            .find(|w| (source.accepts(w) != target.accepts(w)) != negated)
        {
            Some(witness) => Err(ConversionError::NotEquivalent {
                operation: operation.name(),
                witness: witness.into_iter().collect(),
            }),
            None => Ok(()),
        }
    }

    /// All words over `alphabet` up to the probe length, or a sample of them if there are
    /// more than `max_probes`.
    fn probes(&self, alphabet: &Alphabet) -> Vec<Vec<Symbol>> {
        let symbols = alphabet.universe().collect_vec();
        let length = self.config.probe_length;
        if words_up_to(symbols.len(), length) <= self.config.max_probes {
            KleeneStar::new(symbols).up_to(length).collect()
        } else {
            self.sample_probes(symbols)
        }
    }

    #[cfg(feature = "random")]
    fn sample_probes(&self, symbols: Vec<Symbol>) -> Vec<Vec<Symbol>> {
        let mut probes = vec![vec![]];
        if symbols.is_empty() {
            return probes;
        }
        let mut rng = fastrand::Rng::with_seed(self.config.probe_seed);
        while probes.len() < self.config.max_probes {
            let len = rng.usize(..=self.config.probe_length);
            probes.push(
                (0..len)
                    .map(|_| symbols[rng.usize(..symbols.len())])
                    .collect(),
            );
        }
        probes
    }

    #[cfg(not(feature = "random"))]
    fn sample_probes(&self, symbols: Vec<Symbol>) -> Vec<Vec<Symbol>> {
        KleeneStar::new(symbols)
            .take(self.config.max_probes.max(1))
            .collect()
    }
}

/// Views `source` as a DFA if it already is deterministic and runs the bounded subset
/// construction otherwise.
fn determinize<A: FiniteAutomaton + ?Sized>(source: &A, budget: &mut Bounded) -> Result<DFA> {
    if let Some(dfa) = source.as_deterministic() {
        return Ok(dfa.into_owned());
    }
    Ok(subset_construction_bounded(&source.to_nfa(), budget)?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::prelude::*;

    /// Accepts the words whose `n`-th symbol from the end is an `a`. Its minimal DFA has
    /// `2^n` states.
    fn nth_from_last(n: usize) -> NFA {
        let mut transitions = vec![("q0".to_string(), 'a', "q0".to_string())];
        transitions.push(("q0".into(), 'b', "q0".into()));
        transitions.push(("q0".into(), 'a', "q1".into()));
        for i in 1..n {
            for sym in ['a', 'b'] {
                transitions.push((format!("q{i}"), sym, format!("q{}", i + 1)));
            }
        }
        AutomatonBuilder::new()
            .with_alphabet("ab")
            .with_transitions(transitions)
            .with_final_states([format!("q{n}")])
            .into_nfa("q0")
            .unwrap()
    }

    fn even_as() -> DFA {
        AutomatonBuilder::new()
            .with_transitions([
                ("e", 'a', "o"),
                ("e", 'b', "e"),
                ("o", 'a', "e"),
                ("o", 'b', "o"),
            ])
            .with_final_states(["e"])
            .into_dfa("e")
            .unwrap()
    }

    #[test_log::test]
    fn repeated_conversions_hit_the_cache() {
        let engine = ConversionEngine::default();
        let nfa = nth_from_last(3);
        let first = engine.to_dfa(&nfa).unwrap();
        let second = engine.to_dfa(&nfa).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.size(), 8);

        let stats = engine.stats();
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.hit_rate(), 0.5);

        // a different operation on the same source is a separate entry
        let minimal = engine.minimize(&nfa).unwrap();
        assert_eq!(minimal.size(), 8);
        assert_eq!(engine.stats().cache_misses, 2);

        engine.clear_cache();
        let third = engine.to_dfa(&nfa).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        engine.reset_stats();
        assert_eq!(engine.stats(), ConversionStats::default());
    }

    #[test]
    fn full_cache_evicts() {
        let engine = ConversionEngine::new(EngineConfig::default().with_cache_capacity(1));
        let a = nth_from_last(2);
        let b = nth_from_last(3);
        engine.to_dfa(&a).unwrap();
        engine.to_dfa(&b).unwrap();
        engine.to_dfa(&a).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.conversions, 3);
    }

    #[test_log::test]
    fn state_ceiling_rejects_blowup() {
        let engine = ConversionEngine::new(EngineConfig::default().with_max_states(5));
        let nfa = nth_from_last(3);
        assert!(matches!(
            engine.to_dfa(&nfa),
            Err(Error::Conversion(ConversionError::Memory { max_states: 5, .. }))
        ));
        // the source itself is too large
        assert!(matches!(
            engine.to_nfa(&nth_from_last(6)),
            Err(Error::Conversion(ConversionError::Memory { states: 7, .. }))
        ));
        assert_eq!(engine.stats().memory_rejections, 2);
        // failures are not cached
        assert!(engine.to_dfa(&nfa).is_err());
        assert_eq!(engine.stats().cache_hits, 0);
    }

    #[test_log::test]
    fn time_budget_aborts_long_conversions() {
        let engine = ConversionEngine::new(EngineConfig::default().with_timeout(Duration::ZERO));
        let nfa = nth_from_last(9);
        assert!(matches!(
            engine.to_dfa(&nfa),
            Err(Error::Conversion(ConversionError::Timeout { .. }))
        ));
        assert_eq!(engine.stats().timeouts, 1);
    }

    #[test]
    fn valid_conversions_pass_validation() {
        let engine = ConversionEngine::new(EngineConfig::default().with_probes(8, 100));
        let enfa = engine
            .compile_regex("(a|b)*a(a|b)", &Alphabet::from("ab"))
            .unwrap();
        let nfa = engine.to_nfa(enfa.as_ref()).unwrap();
        let dfa = engine.to_dfa(nfa.as_ref()).unwrap();
        let direct = engine.to_dfa_direct(enfa.as_ref()).unwrap();
        let minimal = engine.minimize(dfa.as_ref()).unwrap();
        assert_eq!(minimal.size(), 4);
        assert!(direct.equivalent(&minimal));

        let complement = engine.complement(minimal.as_ref()).unwrap();
        assert!(complement.accepts("ba"));
        assert!(!complement.accepts("ab"));
        assert_eq!(engine.check_equivalence(enfa.as_ref(), minimal.as_ref()), None);
        assert_eq!(
            engine.check_equivalence(minimal.as_ref(), complement.as_ref()),
            Some(String::new())
        );
    }

    #[test]
    fn conversions_between_kinds() {
        let engine = ConversionEngine::default();
        let dfa = even_as();
        let enfa = engine.convert(&dfa, AutomatonKind::EpsilonNFA).unwrap();
        assert_eq!(enfa.kind(), AutomatonKind::EpsilonNFA);
        let back = engine.convert(enfa.as_ref(), AutomatonKind::DFA).unwrap();
        assert_eq!(back.as_dfa(), Some(&dfa));

        let with_junk = AutomatonBuilder::new()
            .with_transitions([("p", 'a', "p"), ("junk", 'a', "p")])
            .with_final_states(["p"])
            .into_dfa("p")
            .unwrap();
        let trimmed = engine.remove_unreachable(&with_junk).unwrap();
        assert_eq!(trimmed.size(), 1);
    }

    #[test]
    fn complement_requires_determinism() {
        let engine = ConversionEngine::default();
        assert!(matches!(
            engine.complement(&nth_from_last(2)),
            Err(Error::Operation(_))
        ));
        assert!(matches!(
            engine.compile_regex("a|", &Alphabet::from("ab")),
            Err(Error::Regex(_))
        ));
    }

    #[test]
    fn sampled_probes_include_the_empty_word() {
        let engine = ConversionEngine::new(EngineConfig::default().with_probes(10, 50));
        let probes = engine.probes(&Alphabet::from("abc"));
        assert_eq!(probes.len(), 50);
        assert!(probes[0].is_empty());
        assert!(probes.iter().all(|w| w.len() <= 10));
        assert_eq!(probes, engine.probes(&Alphabet::from("abc")));

        let exhaustive = ConversionEngine::new(EngineConfig::default().with_probes(2, 100));
        assert_eq!(exhaustive.probes(&Alphabet::from("ab")).len(), 7);
        assert_eq!(exhaustive.probes(&Alphabet::new([])).len(), 1);
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConversionEngine>();

        let engine = ConversionEngine::default();
        let nfa = nth_from_last(5);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| engine.to_dfa(&nfa).unwrap());
            }
        });
        let stats = engine.stats();
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.cache_hits, 3);
    }
}
