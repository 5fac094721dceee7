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

//! Column-to-stack reassignment.
//!
//! A column keeps its items and their order but may move to another stack.
//! The cost of moving column `s` to stack `t` is the sum of the costs of its
//! items on `t`, capped at the instance sentinel when any of them is not
//! eligible there. A minimum-cost perfect matching over this `M x M` matrix
//! gives the best relabeling of the current stacks in one shot.

use stackplan_core::algorithm::hungarian::HungarianSolver;
use stackplan_model::{index::StackIndex, instance::Instance};
use stackplan_search::{num::SolverNumeric, solution::Solution};

/// Reusable buffers for the column matching.
#[derive(Debug, Clone)]
pub struct StackMatching<T>
where
    T: SolverNumeric,
{
    hungarian: HungarianSolver<T>,
    weights: Vec<T>,
    targets: Vec<StackIndex>,
}

impl<T> Default for StackMatching<T>
where
    T: SolverNumeric,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StackMatching<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            hungarian: HungarianSolver::new(),
            weights: Vec::new(),
            targets: Vec::new(),
        }
    }

    #[inline]
    pub fn preallocated(num_stacks: usize) -> Self {
        Self {
            hungarian: HungarianSolver::preallocated(num_stacks),
            weights: Vec::with_capacity(num_stacks * num_stacks),
            targets: Vec::with_capacity(num_stacks),
        }
    }

    fn fill_weights(&mut self, instance: &Instance<T>, solution: &Solution<T>) {
        let m = instance.num_stacks();
        let sentinel = instance.sentinel();
        let assignment = solution.assignment();

        self.weights.clear();
        self.weights.reserve(m * m);
        for source in instance.stacks() {
            let column = assignment.column(source);
            for target in instance.stacks() {
                let weight = column
                    .iter()
                    .flatten()
                    .try_fold(T::zero(), |acc, &item| {
                        if instance.is_eligible(item, target) {
                            Some(acc.saturating_add(instance.cost(item, target)))
                        } else {
                            None
                        }
                    })
                    .map_or(sentinel, |w| w.min(sentinel));
                self.weights.push(weight);
            }
        }
    }

    /// Moves whole columns between stacks along a minimum-cost matching.
    ///
    /// Returns the relabeled solution if it differs from `solution`, is
    /// feasible and costs no more; `None` otherwise.
    pub fn reassign_columns(
        &mut self,
        instance: &Instance<T>,
        solution: &Solution<T>,
    ) -> Option<Solution<T>> {
        let m = instance.num_stacks();
        if m < 2 {
            return None;
        }

        self.fill_weights(instance, solution);
        let matching = self.hungarian.solve(&self.weights, m);

        self.targets.clear();
        self.targets
            .extend(matching.row_to_col().iter().map(|&t| StackIndex::new(t)));
        if self
            .targets
            .iter()
            .enumerate()
            .all(|(source, target)| source == target.get())
        {
            return None;
        }

        let permuted = solution.assignment().with_permuted_columns(&self.targets);
        if !permuted.is_feasible(instance) {
            tracing::trace!(weight = %matching.weight(), "column matching rejected: infeasible");
            return None;
        }

        let cost = permuted.cost(instance);
        if cost > solution.objective_value() {
            return None;
        }

        tracing::debug!(
            from = %solution.objective_value(),
            to = %cost,
            "columns reassigned"
        );
        Some(Solution::new(cost, permuted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_model::{assignment::Assignment, index::ItemIndex, instance::InstanceBuilder};

    type IntegerType = i64;

    fn item(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn stack(s: usize) -> StackIndex {
        StackIndex::new(s)
    }

    fn solution(instance: &Instance<IntegerType>, columns: &[Vec<ItemIndex>]) -> Solution<IntegerType> {
        let assignment = Assignment::from_columns(instance.num_items(), instance.capacity(), columns);
        Solution::from_assignment(instance, assignment)
    }

    #[test]
    fn test_swaps_columns_when_cheaper() {
        // Items 0 and 1 prefer stack 1, item 2 prefers stack 0.
        let mut b = InstanceBuilder::<IntegerType>::new(3, 2, 2);
        b.set_item_costs(item(0), &[5, 1])
            .set_item_costs(item(1), &[5, 1])
            .set_item_costs(item(2), &[1, 5])
            .allow_all_stacking();
        let instance = b.build().unwrap();

        let start = solution(&instance, &[vec![item(0), item(1)], vec![item(2)]]);
        assert_eq!(start.objective_value(), 15);

        let mut matching = StackMatching::new();
        let improved = matching.reassign_columns(&instance, &start).unwrap();
        assert_eq!(improved.objective_value(), 3);
        assert_eq!(improved.assignment().stack_of(item(0)), Some(stack(1)));
        assert_eq!(improved.assignment().stack_of(item(2)), Some(stack(0)));
        assert_eq!(improved.assignment().level_of(item(1)), Some(1));
    }

    #[test]
    fn test_identity_matching_returns_none() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(item(0), &[1, 5]).set_item_costs(item(1), &[5, 1]);
        let instance = b.build().unwrap();

        let start = solution(&instance, &[vec![item(0)], vec![item(1)]]);
        let mut matching = StackMatching::new();
        assert!(matching.reassign_columns(&instance, &start).is_none());
    }

    #[test]
    fn test_never_moves_column_onto_ineligible_stack() {
        // Moving both columns would be cheaper for item 0, but item 1 may not
        // leave stack 1.
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(item(0), &[9, 1])
            .set_item_costs(item(1), &[1, 2])
            .forbid(item(1), stack(0));
        let instance = b.build().unwrap();

        let start = solution(&instance, &[vec![item(0)], vec![item(1)]]);
        let mut matching = StackMatching::new();
        assert!(matching.reassign_columns(&instance, &start).is_none());
    }

    #[test]
    fn test_single_stack_returns_none() {
        let mut b = InstanceBuilder::<IntegerType>::new(1, 1, 1);
        b.set_item_costs(item(0), &[3]);
        let instance = b.build().unwrap();
        let start = solution(&instance, &[vec![item(0)]]);
        assert!(StackMatching::new().reassign_columns(&instance, &start).is_none());
    }
}
