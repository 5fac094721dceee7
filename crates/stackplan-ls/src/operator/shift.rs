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

//! The Shift Operator.
//!
//! Relocates a single item into a free slot of a different stack. The
//! relocation is admissible if the item is eligible on the target stack, the
//! target has room, and the item is compatible with every occupant of the
//! target column (`CompatibilityOracle::can_place`).
//!
//! In `Random` mode, unassigned items take precedence: as long as some item is
//! unplaced, the sampled item is drawn from the unplaced ones, so a shift on a
//! partial assignment is an insertion.

use crate::operator::{ExplorationMode, MoveList, NeighborOutcome, NeighborhoodOperator};
use rand::Rng;
use smallvec::{SmallVec, smallvec};
use stackplan_model::{
    assignment::Assignment,
    index::{ItemIndex, StackIndex},
    instance::Instance,
    moves::Move,
    oracle::CompatibilityOracle,
};
use stackplan_search::num::SolverNumeric;

/// Moves one item to another stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftOperator {
    mode: ExplorationMode,
}

impl ShiftOperator {
    #[inline]
    pub fn new(mode: ExplorationMode) -> Self {
        Self { mode }
    }

    /// Creates a sampling shift operator.
    ///
    /// # Panics
    ///
    /// Panics if `retries` is zero.
    #[inline]
    pub fn random(retries: usize) -> Self {
        assert!(retries > 0, "called `ShiftOperator::random` with zero retries");
        Self::new(ExplorationMode::Random { retries })
    }

    #[inline]
    pub fn best_improvement() -> Self {
        Self::new(ExplorationMode::BestImprovement)
    }

    #[inline]
    pub fn mode(&self) -> ExplorationMode {
        self.mode
    }

    fn shift<T>(
        instance: &Instance<T>,
        current: &Assignment,
        item: ItemIndex,
        target: StackIndex,
    ) -> NeighborOutcome<T>
    where
        T: SolverNumeric,
    {
        let mut next = current.clone();
        next.remove(item);
        next.place(item, target);
        let moves: MoveList = smallvec![Move::new(item, target)];
        NeighborOutcome::finish(instance, next, moves)
    }

    fn sample<T, R>(
        instance: &Instance<T>,
        current: &Assignment,
        retries: usize,
        rng: &mut R,
    ) -> NeighborOutcome<T>
    where
        T: SolverNumeric,
        R: Rng + ?Sized,
    {
        let num_stacks = instance.num_stacks();
        let mut pool: SmallVec<[ItemIndex; 16]> = current.unassigned_items().collect();
        if pool.is_empty() {
            pool.extend(current.assigned_items());
        }
        if pool.is_empty() || num_stacks == 0 {
            return NeighborOutcome::NoMove;
        }

        let oracle = CompatibilityOracle::new(instance);
        for _ in 0..retries {
            let item = pool[rng.random_range(0..pool.len())];
            let target = StackIndex::new(rng.random_range(0..num_stacks));
            if current.stack_of(item) == Some(target) {
                continue;
            }
            if oracle.can_place(item, current, target) {
                return Self::shift(instance, current, item, target);
            }
        }
        NeighborOutcome::NoMove
    }

    fn best<T>(instance: &Instance<T>, current: &Assignment) -> NeighborOutcome<T>
    where
        T: SolverNumeric,
    {
        let oracle = CompatibilityOracle::new(instance);
        let mut best: Option<(T, ItemIndex, StackIndex)> = None;

        for item in current.assigned_items() {
            let Some(source) = current.stack_of(item) else {
                continue;
            };
            let base = instance.cost(item, source);
            for target in instance.stacks() {
                if target == source || !oracle.can_place(item, current, target) {
                    continue;
                }
                let delta = instance.cost(item, target) - base;
                if delta < T::zero() && best.is_none_or(|(best_delta, _, _)| delta < best_delta) {
                    best = Some((delta, item, target));
                }
            }
        }

        match best {
            Some((_, item, target)) => Self::shift(instance, current, item, target),
            None => NeighborOutcome::NoMove,
        }
    }
}

impl<T> NeighborhoodOperator<T> for ShiftOperator
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        "ShiftOperator"
    }

    fn apply<R>(
        &mut self,
        instance: &Instance<T>,
        current: &Assignment,
        rng: &mut R,
    ) -> NeighborOutcome<T>
    where
        R: Rng + ?Sized,
    {
        match self.mode {
            ExplorationMode::Random { retries } => Self::sample(instance, current, retries, rng),
            ExplorationMode::BestImprovement => Self::best(instance, current),
        }
    }
}

impl std::fmt::Display for ShiftOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShiftOperator({})", self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use stackplan_model::instance::InstanceBuilder;

    type IntegerType = i64;

    fn ii(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn si(s: usize) -> StackIndex {
        StackIndex::new(s)
    }

    fn three_stacks() -> Instance<IntegerType> {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 3, 2);
        b.allow_all_stacking()
            .set_item_costs(ii(0), &[5, 1, 3])
            .set_item_costs(ii(1), &[2, 4, 4]);
        b.build().unwrap()
    }

    #[test]
    fn test_best_improvement_picks_strictly_best_move() {
        let inst = three_stacks();
        let a = Assignment::from_columns(2, 2, &[vec![ii(0), ii(1)], vec![], vec![]]);

        let outcome = ShiftOperator::best_improvement().apply(
            &inst,
            &a,
            &mut ChaCha8Rng::seed_from_u64(0),
        );
        let candidate = outcome.into_candidate().unwrap();
        assert_eq!(candidate.moves(), &[Move::new(ii(0), si(1))]);
        assert_eq!(candidate.cost(), 3);
        assert!(candidate.is_feasible(&inst));
        // The source column was compacted.
        assert_eq!(candidate.assignment().level_of(ii(1)), Some(0));
    }

    #[test]
    fn test_best_improvement_reports_no_move_at_local_optimum() {
        let inst = three_stacks();
        let a = Assignment::from_columns(2, 2, &[vec![ii(1)], vec![ii(0)], vec![]]);
        let outcome: NeighborOutcome<IntegerType> = ShiftOperator::best_improvement().apply(
            &inst,
            &a,
            &mut ChaCha8Rng::seed_from_u64(0),
        );
        assert_eq!(outcome, NeighborOutcome::NoMove);
    }

    #[test]
    fn test_best_improvement_respects_stacking_relation() {
        // Item 2 sits alone on the cheap stack 1 and refuses company.
        let mut b = InstanceBuilder::<IntegerType>::new(3, 2, 3);
        b.allow_stacking(ii(1), ii(0))
            .allow_stacking(ii(0), ii(1))
            .set_item_costs(ii(0), &[5, 1])
            .set_item_costs(ii(1), &[5, 1])
            .set_item_costs(ii(2), &[9, 0]);
        let inst = b.build().unwrap();
        let a = Assignment::from_columns(3, 3, &[vec![ii(0), ii(1)], vec![ii(2)]]);

        let outcome: NeighborOutcome<IntegerType> = ShiftOperator::best_improvement().apply(
            &inst,
            &a,
            &mut ChaCha8Rng::seed_from_u64(0),
        );
        assert_eq!(outcome, NeighborOutcome::NoMove);
    }

    #[test]
    fn test_random_shift_moves_one_item_to_another_stack() {
        let inst = three_stacks();
        let a = Assignment::from_columns(2, 2, &[vec![ii(0), ii(1)], vec![], vec![]]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut op = ShiftOperator::random(50);

        for _ in 0..20 {
            let candidate = op.apply(&inst, &a, &mut rng).into_candidate().unwrap();
            let [mv] = candidate.moves() else {
                panic!("expected exactly one move");
            };
            assert_ne!(mv.target(), si(0));
            assert_eq!(candidate.assignment().stack_of(mv.item()), Some(mv.target()));
            assert_eq!(candidate.assignment().num_assigned(), 2);
            assert!(candidate.is_feasible(&inst));
            assert_eq!(candidate.cost(), candidate.assignment().cost(&inst));
        }
    }

    #[test]
    fn test_random_shift_places_unassigned_items_first() {
        let inst = three_stacks();
        let a = Assignment::from_columns(2, 2, &[vec![ii(0)], vec![], vec![]]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let candidate = ShiftOperator::random(50)
            .apply(&inst, &a, &mut rng)
            .into_candidate()
            .unwrap();
        assert_eq!(candidate.moves()[0].item(), ii(1));
        assert!(candidate.assignment().is_complete());
    }

    #[test]
    fn test_random_shift_on_single_stack_is_no_move() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 1, 2);
        b.allow_all_stacking();
        let inst = b.build().unwrap();
        let a = Assignment::from_columns(2, 2, &[vec![ii(0), ii(1)]]);
        let outcome: NeighborOutcome<IntegerType> =
            ShiftOperator::random(10).apply(&inst, &a, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(outcome, NeighborOutcome::NoMove);
    }

    #[test]
    #[should_panic(expected = "zero retries")]
    fn test_random_rejects_zero_retries() {
        let _ = ShiftOperator::random(0);
    }
}
