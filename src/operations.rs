//! Constructions of the algebra of regular languages.
//!
//! Every function takes its operands by reference and builds a fresh automaton. Operands can
//! be of any kind; they are converted internally to whatever representation the construction
//! works on. The closure constructions ([`union`], [`concatenation`], [`kleene_star`]) keep the
//! operands apart by prefixing their states with `1_` and `2_`, and add synthetic states such
//! as `union_initial` that are linked with epsilon transitions.
//!
//! ```
//! use relang::prelude::*;
//!
//! let a = AutomatonBuilder::new()
//!     .with_alphabet("ab")
//!     .with_transitions([("p", 'a', "q")])
//!     .with_final_states(["q"])
//!     .into_dfa("p")
//!     .unwrap();
//! let b = AutomatonBuilder::new()
//!     .with_alphabet("ab")
//!     .with_transitions([("p", 'b', "q")])
//!     .with_final_states(["q"])
//!     .into_dfa("p")
//!     .unwrap();
//! let union = operations::union(&a, &b).unwrap();
//! assert!(union.accepts("a") && union.accepts("b"));
//! assert!(!union.accepts("ab"));
//! ```

use std::collections::VecDeque;

use tracing::debug;

use crate::{
    alphabet::{Alphabet, Label, Symbol, EPSILON},
    automaton::{
        fresh_state, pair_label, EpsilonNFA, EpsilonTransitions, FiniteAutomaton,
        NondeterministicTransitions, ProductAcceptance, State, DFA, NFA,
    },
    error::OperationError,
    math::{Map, OrderedSet, Set},
};

/// Fails with [`OperationError::IncompatibleAutomata`] unless both automata have the same
/// alphabet.
pub fn ensure_same_alphabet<A: FiniteAutomaton, B: FiniteAutomaton>(
    left: &A,
    right: &B,
) -> Result<(), OperationError> {
    if left.alphabet() == right.alphabet() {
        Ok(())
    } else {
        Err(OperationError::IncompatibleAutomata {
            left: left.alphabet().to_string(),
            right: right.alphabet().to_string(),
        })
    }
}

/// Copy of `automaton` as an epsilon-NFA whose states all start with `prefix`.
fn prefixed<A: FiniteAutomaton>(automaton: &A, prefix: &str) -> EpsilonNFA {
    automaton
        .to_epsilon_nfa()
        .rename_states(|q| format!("{prefix}{q}"))
}

/// Builds an automaton for `L(left) ∪ L(right)`. A new initial state `union_initial` has
/// epsilon transitions to the initial states of both operands.
pub fn union<A: FiniteAutomaton, B: FiniteAutomaton>(
    left: &A,
    right: &B,
) -> Result<EpsilonNFA, OperationError> {
    ensure_same_alphabet(left, right)?;
    let (l, r) = (prefixed(left, "1_"), prefixed(right, "2_"));

    let initial: State = "union_initial".into();
    let mut table = l.transitions().clone();
    table.extend(r.transitions());
    table.add(&initial, Label::Epsilon, l.initial_state());
    table.add(&initial, Label::Epsilon, r.initial_state());

    let mut states: OrderedSet<State> = l.states().union(r.states()).cloned().collect();
    states.insert(initial.clone());
    let finals = l.final_states().union(r.final_states()).cloned().collect();

    let out = EpsilonNFA::from_parts(
        states,
        l.alphabet().union(r.alphabet()),
        table,
        initial,
        finals,
    );
    debug!("union has {} states", out.size());
    Ok(out)
}

/// Builds an automaton for the words `uv` with `u` in `L(left)` and `v` in `L(right)`. The
/// alphabet of the result is the union of both alphabets, so unlike the other binary
/// operations this never fails on differing alphabets.
pub fn concatenation<A: FiniteAutomaton, B: FiniteAutomaton>(
    left: &A,
    right: &B,
) -> Result<EpsilonNFA, OperationError> {
    let (l, r) = (prefixed(left, "1_"), prefixed(right, "2_"));

    let initial: State = "concat_initial".into();
    let mut table = l.transitions().clone();
    table.extend(r.transitions());
    table.add(&initial, Label::Epsilon, l.initial_state());
    for q in l.final_states() {
        table.add(q, Label::Epsilon, r.initial_state());
    }

    let mut states: OrderedSet<State> = l.states().union(r.states()).cloned().collect();
    states.insert(initial.clone());

    let out = EpsilonNFA::from_parts(
        states,
        l.alphabet().union(r.alphabet()),
        table,
        initial,
        r.final_states().clone(),
    );
    debug!("concatenation has {} states", out.size());
    Ok(out)
}

/// Builds an automaton for `L(automaton)*` with the Thompson pattern: a new initial state
/// `kleene_initial` and a new final state `kleene_final` that is reachable from the initial
/// state directly and from every old final state; the old final states loop back to the old
/// initial state.
pub fn kleene_star<A: FiniteAutomaton>(automaton: &A) -> EpsilonNFA {
    let inner = automaton.to_epsilon_nfa();
    let mut states = inner.states().clone();
    let initial = fresh_state(&states, "kleene_initial");
    states.insert(initial.clone());
    let fin = fresh_state(&states, "kleene_final");
    states.insert(fin.clone());

    let mut table = inner.transitions().clone();
    table.add(&initial, Label::Epsilon, inner.initial_state());
    table.add(&initial, Label::Epsilon, &fin);
    for q in inner.final_states() {
        table.add(q, Label::Epsilon, inner.initial_state());
        table.add(q, Label::Epsilon, &fin);
    }

    EpsilonNFA::from_parts(
        states,
        inner.alphabet().clone(),
        table,
        initial,
        OrderedSet::from([fin]),
    )
}

/// Builds the reachable part of the product of two NFAs, accepting a pair according to
/// `acceptance`. Only [`ProductAcceptance::Both`] is sound for nondeterministic operands.
fn nfa_product(left: &NFA, right: &NFA, acceptance: ProductAcceptance) -> NFA {
    let initial = (left.initial_state().as_str(), right.initial_state().as_str());
    let mut seen = Set::from_iter([initial]);
    let mut queue = VecDeque::from([initial]);
    let mut states = OrderedSet::new();
    let mut finals = OrderedSet::new();
    let mut table = NondeterministicTransitions::default();

    while let Some((l, r)) = queue.pop_front() {
        let label = pair_label(l, r);
        if acceptance.combine(left.is_final(l), right.is_final(r)) {
            finals.insert(label.clone());
        }
        states.insert(label.clone());
        for sym in left.alphabet().universe() {
            for lp in left.successors(l, sym) {
                for rp in right.successors(r, sym) {
                    let target = (lp.as_str(), rp.as_str());
                    if seen.insert(target) {
                        queue.push_back(target);
                    }
                    table
                        .0
                        .entry(label.clone())
                        .or_default()
                        .entry(sym)
                        .or_default()
                        .insert(pair_label(lp, rp));
                }
            }
        }
    }

    NFA::from_parts(
        states,
        left.alphabet().clone(),
        table,
        pair_label(initial.0, initial.1),
        finals,
    )
}

/// Builds the product automaton on pairs of states `(a,b)`. There is a transition on a symbol
/// if both components have one, and a pair is final if `acceptance` combines the finality of
/// the components to true. Both operands need the same alphabet.
///
/// For [`ProductAcceptance::Both`] the product is formed directly on the (epsilon-free)
/// operands. The other acceptance conditions depend on the absence of accepting runs, so the
/// operands are determinized and completed first.
pub fn cartesian_product<A: FiniteAutomaton, B: FiniteAutomaton>(
    left: &A,
    right: &B,
    acceptance: ProductAcceptance,
) -> Result<NFA, OperationError> {
    ensure_same_alphabet(left, right)?;
    let out = match acceptance {
        ProductAcceptance::Both => nfa_product(&left.to_nfa(), &right.to_nfa(), acceptance),
        _ => left.to_dfa().product(&right.to_dfa(), acceptance)?.to_nfa(),
    };
    debug!("{acceptance:?} product has {} states", out.size());
    Ok(out)
}

/// Builds an automaton for `L(left) ∩ L(right)` as the product of both operands.
pub fn intersection<A: FiniteAutomaton, B: FiniteAutomaton>(
    left: &A,
    right: &B,
) -> Result<NFA, OperationError> {
    cartesian_product(left, right, ProductAcceptance::Both)
}

/// Builds a DFA for the complement of `L(automaton)` with respect to its alphabet. Only
/// defined for automata that are structurally deterministic.
pub fn complement<A: FiniteAutomaton>(automaton: &A) -> Result<DFA, OperationError> {
    let dfa = automaton.as_deterministic().ok_or_else(|| {
        OperationError::validation(
            "complement",
            format!("the {} operand is not deterministic", automaton.kind()),
        )
    })?;
    Ok(dfa.complement())
}

/// Builds an automaton for `L(left) \ L(right)` as the intersection of `left` with the
/// complement of `right`, which must therefore be deterministic.
pub fn difference<A: FiniteAutomaton, B: FiniteAutomaton>(
    left: &A,
    right: &B,
) -> Result<NFA, OperationError> {
    ensure_same_alphabet(left, right)?;
    intersection(left, &complement(right)?)
}

/// Builds an automaton for the words in exactly one of `L(left)` and `L(right)`, as the union
/// of both differences. Both operands must be deterministic.
pub fn symmetric_difference<A: FiniteAutomaton, B: FiniteAutomaton>(
    left: &A,
    right: &B,
) -> Result<EpsilonNFA, OperationError> {
    union(&difference(left, right)?, &difference(right, left)?)
}

/// Relabels every transition symbol through `mapping`, which must be defined on every symbol
/// of the alphabet. The alphabet of the result is the image of the alphabet.
pub fn homomorphism<A: FiniteAutomaton>(
    automaton: &A,
    mapping: &Map<Symbol, Symbol>,
) -> Result<NFA, OperationError> {
    if let Some(sym) = automaton
        .alphabet()
        .universe()
        .find(|sym| !mapping.contains_key(sym))
    {
        return Err(OperationError::validation(
            "homomorphism",
            format!("symbol `{sym}` has no image"),
        ));
    }
    if let Some(sym) = automaton
        .alphabet()
        .universe()
        .find(|sym| mapping[sym] == EPSILON)
    {
        return Err(OperationError::validation(
            "homomorphism",
            format!("symbol `{sym}` is mapped to `{EPSILON}`"),
        ));
    }
    let nfa = automaton.to_nfa();
    let mut table = NondeterministicTransitions::default();
    for edge in nfa.edges() {
        if let Some(sym) = edge.label.symbol() {
            table
                .0
                .entry(edge.source.clone())
                .or_default()
                .entry(mapping[&sym])
                .or_default()
                .insert(edge.target.clone());
        }
    }
    let alphabet: Alphabet = nfa.alphabet().universe().map(|sym| mapping[&sym]).collect();
    Ok(NFA::from_parts(
        nfa.states().clone(),
        alphabet,
        table,
        nfa.initial_state().clone(),
        nfa.final_states().clone(),
    ))
}

/// Builds an automaton for the words `w` over the domain of `mapping` such that the image of
/// `w` under `mapping` is in `L(automaton)`. Reading a symbol `s` moves along the transitions
/// of `automaton` on `mapping[s]`.
pub fn inverse_homomorphism<A: FiniteAutomaton>(
    automaton: &A,
    mapping: &Map<Symbol, Symbol>,
) -> Result<NFA, OperationError> {
    if mapping.contains_key(&EPSILON) {
        return Err(OperationError::validation(
            "inverse_homomorphism",
            format!("`{EPSILON}` cannot be used as a symbol"),
        ));
    }
    let nfa = automaton.to_nfa();
    let alphabet: Alphabet = mapping.keys().copied().collect();
    let mut table = NondeterministicTransitions::default();
    for q in nfa.states() {
        for sym in alphabet.universe() {
            let targets: OrderedSet<State> = nfa.successors(q, mapping[&sym]).cloned().collect();
            if !targets.is_empty() {
                table.0.entry(q.clone()).or_default().insert(sym, targets);
            }
        }
    }
    Ok(NFA::from_parts(
        nfa.states().clone(),
        alphabet,
        table,
        nfa.initial_state().clone(),
        nfa.final_states().clone(),
    ))
}

/// Builds an automaton for `L(automaton)^n`. For `n = 0` this accepts only the empty word,
/// for `n = 1` it is the operand itself, otherwise the operand is concatenated `n - 1` times.
pub fn power<A: FiniteAutomaton>(automaton: &A, n: i64) -> Result<EpsilonNFA, OperationError> {
    match n {
        n if n < 0 => Err(OperationError::validation(
            "power",
            format!("exponent {n} is negative"),
        )),
        0 => {
            let q: State = "power_initial".into();
            Ok(EpsilonNFA::from_parts(
                OrderedSet::from([q.clone()]),
                automaton.alphabet().clone(),
                EpsilonTransitions::default(),
                q.clone(),
                OrderedSet::from([q]),
            ))
        }
        _ => {
            let mut out = automaton.to_epsilon_nfa();
            for _ in 1..n {
                out = concatenation(&out, automaton)?;
            }
            Ok(out)
        }
    }
}
