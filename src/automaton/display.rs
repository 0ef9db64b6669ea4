use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;

use crate::{
    alphabet::Label,
    automaton::{Automaton, TransitionTable},
    math::{Map, OrderedSet},
};

impl<T: TransitionTable> Automaton<T> {
    /// Returns a string representation of the transition table. The initial state is marked
    /// with `→`, final states with `*`, a missing transition is shown as `-`.
    pub fn build_transition_table(&self) -> String {
        let mut labels: Vec<Label> = self.alphabet.universe().map(Label::Symbol).collect();
        let mut cells: Map<(&str, Label), OrderedSet<&str>> = Map::default();
        for edge in self.transitions.edges() {
            if edge.label.is_epsilon() && !labels.contains(&Label::Epsilon) {
                labels.insert(0, Label::Epsilon);
            }
            cells
                .entry((edge.source.as_str(), edge.label))
                .or_default()
                .insert(edge.target.as_str());
        }

        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once(format!("{}", T::KIND))
                .chain(labels.iter().map(|label| label.to_string())),
        );
        for q in &self.states {
            let mut marker = String::new();
            if q == &self.initial {
                marker.push('→');
            }
            if self.finals.contains(q) {
                marker.push('*');
            }
            let mut row = vec![format!("{marker}{q}")];
            for label in &labels {
                match cells.get(&(q.as_str(), *label)) {
                    Some(targets) => row.push(targets.iter().join(",")),
                    None => row.push("-".to_string()),
                }
            }
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl<T: TransitionTable> Display for Automaton<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.build_transition_table())
    }
}

impl<T: TransitionTable> Debug for Automaton<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(&T::KIND.to_string())
            .field("states", &self.states)
            .field("alphabet", &self.alphabet)
            .field("initial", &self.initial)
            .field("finals", &self.finals)
            .field(
                "transitions",
                &self
                    .transitions
                    .edges()
                    .map(|e| format!("{} -{}-> {}", e.source, e.label, e.target))
                    .collect_vec(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn transition_table_marks_initial_and_final_states() {
        let enfa = AutomatonBuilder::new()
            .with_transitions([("p", 'a', "q"), ("p", 'a', "r")])
            .with_epsilon_transitions([("q", "r")])
            .with_final_states(["r"])
            .into_epsilon_nfa("p")
            .unwrap();
        let table = enfa.to_string();
        assert!(table.contains("→p"));
        assert!(table.contains("*r"));
        assert!(table.contains("q,r"));
        assert!(table.contains("ε"));

        let dfa = enfa.to_dfa();
        assert!(!dfa.to_string().contains("ε"));
        assert!(format!("{dfa:?}").starts_with("DFA"));
    }
}
