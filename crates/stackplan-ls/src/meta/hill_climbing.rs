// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Hill Climbing metaheuristic.
//!
//! Strict descent without memory. Operators are tried in the order of the
//! variable neighborhood; the first feasible, strictly improving neighbor is
//! returned. An operator that fails `attempts_per_operator` times in a row is
//! marked exhausted and skipped for the rest of the run. Once all three are
//! exhausted the search reports `None`. `on_start` revives every operator.

use crate::{
    meta::{
        neighborhood_search::NeighborhoodSearch,
        variable::{OperatorKind, VariableNeighborhood},
    },
    operator::Candidate,
};
use rand::Rng;
use stackplan_model::instance::Instance;
use stackplan_search::{num::SolverNumeric, solution::Solution};

#[derive(Debug, Clone)]
pub struct HillClimbing<T> {
    neighborhood: VariableNeighborhood<T>,
    attempts_per_operator: usize,
    exhausted: [bool; 3],
}

impl<T> Default for HillClimbing<T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::new(
            VariableNeighborhood::default(),
            Self::DEFAULT_ATTEMPTS_PER_OPERATOR,
        )
    }
}

impl<T> HillClimbing<T>
where
    T: SolverNumeric,
{
    pub const DEFAULT_ATTEMPTS_PER_OPERATOR: usize = 30;

    /// Creates a hill climber over `neighborhood`.
    ///
    /// # Panics
    ///
    /// Panics if `attempts_per_operator` is zero.
    pub fn new(neighborhood: VariableNeighborhood<T>, attempts_per_operator: usize) -> Self {
        assert!(
            attempts_per_operator > 0,
            "called `HillClimbing::new` with zero attempts_per_operator"
        );
        Self {
            neighborhood,
            attempts_per_operator,
            exhausted: [false; 3],
        }
    }

    #[inline]
    pub fn attempts_per_operator(&self) -> usize {
        self.attempts_per_operator
    }

    /// Returns `true` if `kind` is exhausted for the current run.
    #[inline]
    pub fn is_exhausted(&self, kind: OperatorKind) -> bool {
        self.exhausted[kind.index()]
    }
}

impl<T> NeighborhoodSearch<T> for HillClimbing<T>
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        "HillClimbing"
    }

    fn on_start(&mut self, _instance: &Instance<T>, _initial: &Solution<T>) {
        self.exhausted = [false; 3];
    }

    fn get_neighbor<R>(
        &mut self,
        instance: &Instance<T>,
        current: &Solution<T>,
        _best: &Solution<T>,
        rng: &mut R,
    ) -> Option<Candidate<T>>
    where
        R: Rng + ?Sized,
    {
        for kind in OperatorKind::ALL {
            if self.exhausted[kind.index()] {
                continue;
            }
            for _ in 0..self.attempts_per_operator {
                let outcome =
                    self.neighborhood
                        .apply_operator(kind, instance, current.assignment(), rng);
                if let Some(candidate) = outcome.into_candidate()
                    && candidate.cost() < current.objective_value()
                    && candidate.is_feasible(instance)
                {
                    return Some(candidate);
                }
            }
            self.exhausted[kind.index()] = true;
            tracing::debug!(operator = %kind, "operator exhausted");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{
        ExplorationMode, ejection_chain::EjectionChainOperator, shift::ShiftOperator,
        swap::SwapOperator,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use stackplan_model::{assignment::Assignment, index::ItemIndex, instance::InstanceBuilder};

    type IntegerType = i64;

    fn ii(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn climber() -> HillClimbing<IntegerType> {
        HillClimbing::new(
            VariableNeighborhood::new(
                ShiftOperator::best_improvement(),
                SwapOperator::new(ExplorationMode::BestImprovement, 1),
                EjectionChainOperator::new(),
            ),
            1,
        )
    }

    #[test]
    fn test_swap_after_exhausted_shift() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(ii(0), &[6, 1])
            .set_item_costs(ii(1), &[2, 7]);
        let inst = b.build().unwrap();
        let sol = Solution::from_assignment(
            &inst,
            Assignment::from_columns(2, 1, &[vec![ii(0)], vec![ii(1)]]),
        );

        let mut hc = climber();
        hc.on_start(&inst, &sol);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let candidate = hc.get_neighbor(&inst, &sol, &sol, &mut rng).unwrap();
        assert_eq!(candidate.cost(), 3);
        assert!(hc.is_exhausted(OperatorKind::Shift));
        assert!(!hc.is_exhausted(OperatorKind::Swap));

        // At the optimum every remaining operator gives up.
        let next = candidate.into_solution();
        assert!(hc.get_neighbor(&inst, &next, &next, &mut rng).is_none());
        assert!(OperatorKind::ALL.iter().all(|&k| hc.is_exhausted(k)));

        // A new run revives them.
        hc.on_start(&inst, &next);
        assert!(!hc.is_exhausted(OperatorKind::Shift));
    }

    #[test]
    fn test_never_returns_a_worse_neighbor() {
        let mut b = InstanceBuilder::<IntegerType>::new(3, 3, 2);
        b.allow_all_stacking()
            .set_item_costs(ii(0), &[1, 9, 9])
            .set_item_costs(ii(1), &[9, 1, 9])
            .set_item_costs(ii(2), &[9, 9, 1]);
        let inst = b.build().unwrap();
        let sol = Solution::from_assignment(
            &inst,
            Assignment::from_columns(3, 2, &[vec![ii(0)], vec![ii(1)], vec![ii(2)]]),
        );

        let mut hc = HillClimbing::default();
        hc.on_start(&inst, &sol);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert!(hc.get_neighbor(&inst, &sol, &sol, &mut rng).is_none());
    }

    #[test]
    #[should_panic(expected = "zero attempts_per_operator")]
    fn test_zero_attempts_panics() {
        let _ = HillClimbing::<IntegerType>::new(VariableNeighborhood::default(), 0);
    }
}
