use fastrand::Rng;
use tracing::debug;

use crate::{
    alphabet::{Alphabet, Label},
    automaton::{
        DeterministicTransitions, EpsilonNFA, EpsilonTransitions, FiniteAutomaton,
        NondeterministicTransitions, State, DFA, NFA,
    },
    math::OrderedSet,
};

fn state_name(i: usize) -> State {
    format!("q{i}")
}

fn random_finals(size: usize, rng: &mut Rng) -> OrderedSet<State> {
    (0..size).filter(|_| rng.bool()).map(state_name).collect()
}

/// Uses a sprout-like algorithm to generate a random DFA. `symbols` determines the number of
/// distinct symbols of the [`Alphabet`], `probability` the probability of a back edge to some
/// existing state being inserted. The algorithm is as follows:
/// 1. Start with a single state `q0`.
/// 2. For each symbol, go through the existing states in order and with probability
///    `probability` add an edge to that state.
/// 3. If no edge was added, insert an edge to a new state, unless there are `max_size`
///    states already, in which case the target is drawn uniformly.
/// 4. Repeat until all states and symbols have been treated.
///
/// Every state is reachable and the result is complete. Each state is final with
/// probability one half.
pub fn generate_random_dfa(
    symbols: usize,
    probability: f64,
    max_size: usize,
    rng: &mut Rng,
) -> DFA {
    let alphabet = Alphabet::of_size(symbols);
    let max_size = max_size.max(1);
    let mut table = DeterministicTransitions::default();
    let mut size = 1;
    let mut current = 0;

    while current < size {
        'symbols: for sym in alphabet.universe() {
            for target in 0..=current {
                if rng.f64() < probability {
                    table
                        .0
                        .entry(state_name(current))
                        .or_default()
                        .insert(sym, state_name(target));
                    continue 'symbols;
                }
            }
            let target = if size < max_size {
                size += 1;
                size - 1
            } else {
                rng.usize(..size)
            };
            table
                .0
                .entry(state_name(current))
                .or_default()
                .insert(sym, state_name(target));
        }
        current += 1;
    }

    debug!("generated random DFA with {size} states over {symbols} symbols");
    DFA::from_parts(
        (0..size).map(state_name).collect(),
        alphabet,
        table,
        state_name(0),
        random_finals(size, rng),
    )
}

/// Generates an NFA with `size` states `q0` to `q{size-1}` where each of the possible
/// transitions is present with probability `density`. The initial state is `q0`, states may
/// be unreachable.
pub fn generate_random_nfa(symbols: usize, size: usize, density: f64, rng: &mut Rng) -> NFA {
    let alphabet = Alphabet::of_size(symbols);
    let size = size.max(1);
    let mut table = NondeterministicTransitions::default();
    for source in 0..size {
        for sym in alphabet.universe() {
            for target in 0..size {
                if rng.f64() < density {
                    table
                        .0
                        .entry(state_name(source))
                        .or_default()
                        .entry(sym)
                        .or_default()
                        .insert(state_name(target));
                }
            }
        }
    }
    NFA::from_parts(
        (0..size).map(state_name).collect(),
        alphabet,
        table,
        state_name(0),
        random_finals(size, rng),
    )
}

/// Like [`generate_random_nfa`], but additionally inserts each possible epsilon transition
/// between two distinct states with probability `epsilon_density`.
pub fn generate_random_epsilon_nfa(
    symbols: usize,
    size: usize,
    density: f64,
    epsilon_density: f64,
    rng: &mut Rng,
) -> EpsilonNFA {
    let nfa = generate_random_nfa(symbols, size, density, rng);
    let mut table = EpsilonTransitions::default();
    for edge in nfa.edges() {
        table
            .0
            .entry(edge.source.clone())
            .or_default()
            .entry(edge.label)
            .or_default()
            .insert(edge.target.clone());
    }
    for source in nfa.states() {
        for target in nfa.states() {
            if source != target && rng.f64() < epsilon_density {
                table
                    .0
                    .entry(source.clone())
                    .or_default()
                    .entry(Label::Epsilon)
                    .or_default()
                    .insert(target.clone());
            }
        }
    }
    EpsilonNFA::from_parts(
        nfa.states().clone(),
        nfa.alphabet().clone(),
        table,
        nfa.initial_state().clone(),
        nfa.final_states().clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn random_dfas_are_complete_and_trim() {
        let mut rng = Rng::with_seed(7);
        for _ in 0..20 {
            let dfa = generate_random_dfa(2, 0.4, 12, &mut rng);
            assert!(dfa.size() <= 12);
            assert!(dfa.is_complete());
            assert_eq!(dfa.reachable_states().len(), dfa.size());
        }
    }

    #[test]
    fn generation_is_reproducible() {
        let a = generate_random_nfa(3, 5, 0.3, &mut Rng::with_seed(1));
        let b = generate_random_nfa(3, 5, 0.3, &mut Rng::with_seed(1));
        assert_eq!(a, b);
        assert_eq!(a.size(), 5);
        assert_eq!(a.alphabet(), &Alphabet::from("abc"));
    }

    #[test]
    fn epsilon_nfas_keep_symbol_transitions() {
        let mut rng = Rng::with_seed(3);
        let enfa = generate_random_epsilon_nfa(2, 4, 0.3, 1.0, &mut rng);
        assert!(enfa.has_epsilon_transitions());
        let none = generate_random_epsilon_nfa(2, 4, 0.0, 0.0, &mut rng);
        assert_eq!(none.edges().count(), 0);
    }
}
