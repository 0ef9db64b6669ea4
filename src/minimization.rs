pub(crate) mod partition_refinement;

use crate::{
    automaton::DFA,
    budget::{unbounded, Budget, Unbounded},
    math::Partition,
};

impl DFA {
    /// Returns an equivalent DFA in which no two states are indistinguishable. Unreachable
    /// states are removed first, then indistinguishable states are merged using Moore's
    /// partition refinement. The states of the result are named after the merged states, e.g.
    /// `{q1,q2}`.
    ///
    /// A missing transition counts as its own class and dead states are kept, so the result is
    /// the minimal DFA only for complete input. Minimizing [`DFA::complete`] yields the minimal
    /// complete DFA.
    pub fn minimize(&self) -> DFA {
        unbounded(self.minimize_bounded(&mut Unbounded))
    }

    /// Like [`DFA::minimize`], but aborts as soon as `budget` is exhausted.
    pub fn minimize_bounded<B: Budget>(&self, budget: &mut B) -> Result<DFA, B::Error> {
        let reachable = self.remove_unreachable_states();
        let partition = partition_refinement::moore_partition_refinement(&reachable, budget)?;
        Ok(partition_refinement::quotient(&reachable, &partition))
    }

    /// Groups the states of `self` into classes of states that accept the same language.
    pub fn equivalence_classes(&self) -> Partition<String> {
        unbounded(partition_refinement::moore_partition_refinement(
            self,
            &mut Unbounded,
        ))
    }
}
