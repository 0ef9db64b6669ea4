use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    automaton::{set_label, DeterministicTransitions, FiniteAutomaton, State, DFA},
    budget::Budget,
    math::{Bijection, Map, OrderedSet, Partition},
};

/// Computes the coarsest partition of the states of `dfa` into classes of states that accept
/// the same language, using Moore's algorithm.
///
/// We start from the partition into final and non-final states. In each round, every state
/// gets a signature consisting of its current class together with the classes of its
/// successors on every symbol (a missing transition is its own "class"). States with equal
/// signatures stay together, the others are split. The refinement stops once a round does not
/// increase the number of classes.
pub(crate) fn moore_partition_refinement<B: Budget>(
    dfa: &DFA,
    budget: &mut B,
) -> Result<Partition<State>, B::Error> {
    let index: Bijection<usize, &State> = dfa.states().iter().enumerate().collect();
    let symbols = dfa.alphabet().universe().collect_vec();

    // successor indices per state and symbol, `None` for a missing transition
    let successors: Vec<Vec<Option<usize>>> = index
        .iter()
        .map(|(_, q)| {
            symbols
                .iter()
                .map(|sym| {
                    dfa.successor(q, *sym)
                        .and_then(|p| index.get_by_right(&p).copied())
                })
                .collect()
        })
        .collect();

    let mut class: Vec<usize> = index
        .iter()
        .map(|(_, q)| usize::from(dfa.is_final(q)))
        .collect();
    let mut classes = class.iter().unique().count();
    let mut round = 0usize;

    loop {
        round += 1;
        let mut signatures: Map<(usize, Vec<Option<usize>>), usize> = Map::default();
        let mut refined = Vec::with_capacity(class.len());
        for (i, row) in successors.iter().enumerate() {
            budget.step()?;
            let signature = (class[i], row.iter().map(|p| p.map(|p| class[p])).collect());
            let next = signatures.len();
            refined.push(*signatures.entry(signature).or_insert(next));
        }
        let refined_classes = signatures.len();
        trace!("round {round} of partition refinement yields {refined_classes} classes");
        class = refined;
        if refined_classes == classes {
            break;
        }
        classes = refined_classes;
    }

    debug!(
        "partition refinement merged {} states into {classes} classes after {round} rounds",
        index.len()
    );

    let mut groups: Vec<Vec<State>> = vec![Vec::new(); classes];
    for (i, c) in class.iter().enumerate() {
        if let Some(q) = index.get_by_left(&i) {
            groups[*c].push((*q).clone());
        }
    }
    Ok(Partition::new(groups))
}

/// Merges the states of `dfa` along `partition`, which must be a congruence, i.e. states in
/// one class have successors in a common class on every symbol. Each class becomes one state
/// named after its members.
pub(crate) fn quotient(dfa: &DFA, partition: &Partition<State>) -> DFA {
    let mut names: Map<&str, State> = Map::default();
    let mut states = OrderedSet::new();
    for class in partition {
        let name = set_label(class);
        for q in class {
            names.insert(q.as_str(), name.clone());
        }
        states.insert(name);
    }

    let mut table = DeterministicTransitions::default();
    for class in partition {
        let Some(representative) = class.first() else {
            continue;
        };
        let source = &names[representative.as_str()];
        for sym in dfa.alphabet().universe() {
            if let Some(target) = dfa.successor(representative, sym) {
                table
                    .0
                    .entry(source.clone())
                    .or_default()
                    .insert(sym, names[target.as_str()].clone());
            }
        }
    }

    let finals = dfa
        .final_states()
        .iter()
        .map(|q| names[q.as_str()].clone())
        .collect();

    DFA::from_parts(
        states,
        dfa.alphabet().clone(),
        table,
        names[dfa.initial_state().as_str()].clone(),
        finals,
    )
}
