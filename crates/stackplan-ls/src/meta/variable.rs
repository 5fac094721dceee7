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

//! The variable neighborhood: Shift, then Swap, then EjectionChain.
//!
//! `generate` tries the operators in that order and returns the first
//! candidate that is feasible and not worse than the current solution. If none
//! qualifies, the last candidate any operator produced is returned (the
//! caller decides what to do with it), or `NoMove` if none produced anything.

use crate::operator::{
    NeighborOutcome, NeighborhoodOperator, ejection_chain::EjectionChainOperator,
    shift::ShiftOperator, swap::SwapOperator,
};
use rand::Rng;
use stackplan_model::{assignment::Assignment, instance::Instance};
use stackplan_search::{num::SolverNumeric, solution::Solution};

/// The operators of the variable neighborhood, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Shift,
    Swap,
    EjectionChain,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 3] = [
        OperatorKind::Shift,
        OperatorKind::Swap,
        OperatorKind::EjectionChain,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            OperatorKind::Shift => 0,
            OperatorKind::Swap => 1,
            OperatorKind::EjectionChain => 2,
        }
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatorKind::Shift => write!(f, "Shift"),
            OperatorKind::Swap => write!(f, "Swap"),
            OperatorKind::EjectionChain => write!(f, "EjectionChain"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableNeighborhood<T> {
    shift: ShiftOperator,
    swap: SwapOperator,
    ejection_chain: EjectionChainOperator<T>,
}

impl<T> Default for VariableNeighborhood<T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::new(
            ShiftOperator::default(),
            SwapOperator::default(),
            EjectionChainOperator::new(),
        )
    }
}

impl<T> VariableNeighborhood<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new(
        shift: ShiftOperator,
        swap: SwapOperator,
        ejection_chain: EjectionChainOperator<T>,
    ) -> Self {
        Self {
            shift,
            swap,
            ejection_chain,
        }
    }

    /// Creates the default neighborhood with the ejection chain buffers sized
    /// for the given problem.
    #[inline]
    pub fn preallocated(num_items: usize, num_stacks: usize) -> Self {
        Self::new(
            ShiftOperator::default(),
            SwapOperator::default(),
            EjectionChainOperator::preallocated(num_items, num_stacks),
        )
    }

    #[inline]
    pub fn shift(&self) -> &ShiftOperator {
        &self.shift
    }

    #[inline]
    pub fn swap(&self) -> &SwapOperator {
        &self.swap
    }

    /// Applies a single operator.
    pub fn apply_operator<R>(
        &mut self,
        kind: OperatorKind,
        instance: &Instance<T>,
        current: &Assignment,
        rng: &mut R,
    ) -> NeighborOutcome<T>
    where
        R: Rng + ?Sized,
    {
        match kind {
            OperatorKind::Shift => self.shift.apply(instance, current, rng),
            OperatorKind::Swap => self.swap.apply(instance, current, rng),
            OperatorKind::EjectionChain => self.ejection_chain.apply(instance, current, rng),
        }
    }

    /// Runs the operators in order until one yields a feasible candidate that
    /// is not worse than `current`.
    pub fn generate<R>(
        &mut self,
        instance: &Instance<T>,
        current: &Solution<T>,
        rng: &mut R,
    ) -> NeighborOutcome<T>
    where
        R: Rng + ?Sized,
    {
        let mut last = NeighborOutcome::NoMove;
        for kind in OperatorKind::ALL {
            let outcome = self.apply_operator(kind, instance, current.assignment(), rng);
            if let Some(candidate) = outcome.candidate() {
                if candidate.cost() <= current.objective_value() && candidate.is_feasible(instance) {
                    return outcome;
                }
                last = outcome;
            }
        }
        last
    }
}

impl<T> std::fmt::Display for VariableNeighborhood<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "VariableNeighborhood({}, {}, EjectionChainOperator)",
            self.shift, self.swap
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::ExplorationMode;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use stackplan_model::{
        index::{ItemIndex, StackIndex},
        instance::InstanceBuilder,
        moves::Move,
    };

    type IntegerType = i64;

    fn ii(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn si(s: usize) -> StackIndex {
        StackIndex::new(s)
    }

    fn best_improvement() -> VariableNeighborhood<IntegerType> {
        VariableNeighborhood::new(
            ShiftOperator::best_improvement(),
            SwapOperator::new(ExplorationMode::BestImprovement, 1),
            EjectionChainOperator::new(),
        )
    }

    #[test]
    fn test_shift_wins_when_it_improves() {
        let mut b = InstanceBuilder::<IntegerType>::new(1, 2, 1);
        b.set_item_costs(ii(0), &[4, 1]);
        let inst = b.build().unwrap();
        let current = Solution::from_assignment(
            &inst,
            Assignment::from_columns(1, 1, &[vec![ii(0)], vec![]]),
        );

        let mut nh = best_improvement();
        let candidate = nh
            .generate(&inst, &current, &mut ChaCha8Rng::seed_from_u64(0))
            .into_candidate()
            .unwrap();
        assert_eq!(candidate.moves(), &[Move::new(ii(0), si(1))]);
        assert_eq!(candidate.cost(), 1);
    }

    #[test]
    fn test_falls_through_to_swap_when_shift_has_nothing() {
        // Both stacks are full, so only swapping helps.
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(ii(0), &[6, 1])
            .set_item_costs(ii(1), &[2, 7]);
        let inst = b.build().unwrap();
        let current = Solution::from_assignment(
            &inst,
            Assignment::from_columns(2, 1, &[vec![ii(0)], vec![ii(1)]]),
        );

        let mut nh = best_improvement();
        let candidate = nh
            .generate(&inst, &current, &mut ChaCha8Rng::seed_from_u64(0))
            .into_candidate()
            .unwrap();
        assert_eq!(candidate.moves().len(), 2);
        assert_eq!(candidate.cost(), 3);
    }

    #[test]
    fn test_no_move_at_local_optimum_with_best_improvement() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(ii(0), &[1, 6])
            .set_item_costs(ii(1), &[7, 2]);
        let inst = b.build().unwrap();
        let current = Solution::from_assignment(
            &inst,
            Assignment::from_columns(2, 1, &[vec![ii(0)], vec![ii(1)]]),
        );

        let mut nh = best_improvement();
        let outcome = nh.generate(&inst, &current, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(outcome, NeighborOutcome::NoMove);
    }

    #[test]
    fn test_operator_kind_order_and_index() {
        for (i, kind) in OperatorKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(format!("{}", OperatorKind::EjectionChain), "EjectionChain");
    }
}
