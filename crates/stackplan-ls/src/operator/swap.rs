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

//! The Swap Operator.
//!
//! Exchanges two items that sit in different stacks; each takes over the
//! other's cell. The exchange is admissible in both directions only: `a` must
//! be eligible on `b`'s stack and compatible with `b`'s column once `b` is
//! gone, and vice versa. Each swap is recorded as `Move(a, stack_b)` followed
//! by `Move(b, stack_a)`.
//!
//! In `Random` mode one call composes between one and `max_swaps` independent
//! swaps, the count drawn uniformly. An item takes part in at most one swap
//! per call, so later swaps can never undo earlier ones. Every swap gets its
//! own `retries` budget; composition stops at the first swap that cannot be
//! found.

use crate::operator::{ExplorationMode, MoveList, NeighborOutcome, NeighborhoodOperator};
use rand::Rng;
use stackplan_model::{
    assignment::Assignment,
    index::{ItemIndex, StackIndex},
    instance::Instance,
    moves::Swap,
    oracle::CompatibilityOracle,
};
use stackplan_search::num::SolverNumeric;

/// Exchanges items between stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOperator {
    mode: ExplorationMode,
    max_swaps: usize,
}

impl Default for SwapOperator {
    fn default() -> Self {
        Self::new(ExplorationMode::default(), Self::DEFAULT_MAX_SWAPS)
    }
}

impl SwapOperator {
    pub const DEFAULT_MAX_SWAPS: usize = 4;

    /// Creates a swap operator.
    ///
    /// # Panics
    ///
    /// Panics if `max_swaps` is zero.
    #[inline]
    pub fn new(mode: ExplorationMode, max_swaps: usize) -> Self {
        assert!(max_swaps > 0, "called `SwapOperator::new` with zero max_swaps");
        Self { mode, max_swaps }
    }

    /// Creates a sampling swap operator composing up to `max_swaps` swaps.
    ///
    /// # Panics
    ///
    /// Panics if `retries` or `max_swaps` is zero.
    #[inline]
    pub fn random(retries: usize, max_swaps: usize) -> Self {
        assert!(retries > 0, "called `SwapOperator::random` with zero retries");
        Self::new(ExplorationMode::Random { retries }, max_swaps)
    }

    #[inline]
    pub fn best_improvement() -> Self {
        Self::new(ExplorationMode::BestImprovement, 1)
    }

    #[inline]
    pub fn mode(&self) -> ExplorationMode {
        self.mode
    }

    #[inline]
    pub fn max_swaps(&self) -> usize {
        self.max_swaps
    }

    /// Returns the stacks of `a` and `b` if exchanging them is admissible.
    fn admissible<T>(
        oracle: &CompatibilityOracle<'_, T>,
        assignment: &Assignment,
        a: ItemIndex,
        b: ItemIndex,
    ) -> Option<(StackIndex, StackIndex)>
    where
        T: SolverNumeric,
    {
        let stack_a = assignment.stack_of(a)?;
        let stack_b = assignment.stack_of(b)?;
        let ok = stack_a != stack_b
            && oracle.stack_eligible(a, stack_b)
            && oracle.stack_eligible(b, stack_a)
            && oracle.column_compatible(a, assignment.column(stack_b), Some(b))
            && oracle.column_compatible(b, assignment.column(stack_a), Some(a));
        ok.then_some((stack_a, stack_b))
    }

    /// Exchanges the cells of `a` and `b`.
    fn exchange(assignment: &mut Assignment, a: ItemIndex, b: ItemIndex) -> Option<Swap> {
        let pos_a = assignment.remove(a)?;
        let Some(pos_b) = assignment.remove(b) else {
            assignment.place_at(a, pos_a.stack(), pos_a.level());
            return None;
        };
        assignment.place_at(a, pos_b.stack(), pos_b.level());
        assignment.place_at(b, pos_a.stack(), pos_a.level());
        Some(Swap::new(a, pos_a.stack(), b, pos_b.stack()))
    }

    fn sample<T, R>(
        &self,
        instance: &Instance<T>,
        current: &Assignment,
        retries: usize,
        rng: &mut R,
    ) -> NeighborOutcome<T>
    where
        T: SolverNumeric,
        R: Rng + ?Sized,
    {
        // Items not yet swapped in this call.
        let mut untouched: Vec<ItemIndex> = current.assigned_items().collect();
        if untouched.len() < 2 || instance.num_stacks() < 2 {
            return NeighborOutcome::NoMove;
        }

        let oracle = CompatibilityOracle::new(instance);
        let mut next = current.clone();
        let mut moves = MoveList::new();
        let count = rng.random_range(1..=self.max_swaps);

        for _ in 0..count {
            if untouched.len() < 2 {
                break;
            }
            let mut swapped = None;
            for _ in 0..retries {
                let a = untouched[rng.random_range(0..untouched.len())];
                let b = untouched[rng.random_range(0..untouched.len())];
                if Self::admissible(&oracle, &next, a, b).is_none() {
                    continue;
                }
                if let Some(swap) = Self::exchange(&mut next, a, b) {
                    moves.extend(swap.moves());
                    swapped = Some((a, b));
                    break;
                }
            }
            let Some((a, b)) = swapped else {
                break;
            };
            untouched.retain(|&item| item != a && item != b);
        }

        if moves.is_empty() {
            return NeighborOutcome::NoMove;
        }
        NeighborOutcome::finish(instance, next, moves)
    }

    fn best<T>(instance: &Instance<T>, current: &Assignment) -> NeighborOutcome<T>
    where
        T: SolverNumeric,
    {
        let oracle = CompatibilityOracle::new(instance);
        let assigned: Vec<ItemIndex> = current.assigned_items().collect();
        let mut best: Option<(T, ItemIndex, ItemIndex)> = None;

        for (pos, &a) in assigned.iter().enumerate() {
            for &b in &assigned[pos + 1..] {
                let Some((stack_a, stack_b)) = Self::admissible(&oracle, current, a, b) else {
                    continue;
                };
                let delta = instance.cost(a, stack_b) + instance.cost(b, stack_a)
                    - instance.cost(a, stack_a)
                    - instance.cost(b, stack_b);
                if delta < T::zero() && best.is_none_or(|(best_delta, _, _)| delta < best_delta) {
                    best = Some((delta, a, b));
                }
            }
        }

        let Some((_, a, b)) = best else {
            return NeighborOutcome::NoMove;
        };
        let mut next = current.clone();
        match Self::exchange(&mut next, a, b) {
            Some(swap) => NeighborOutcome::finish(instance, next, MoveList::from_slice(&swap.moves())),
            None => NeighborOutcome::NoMove,
        }
    }
}

impl<T> NeighborhoodOperator<T> for SwapOperator
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        "SwapOperator"
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
            ExplorationMode::Random { retries } => self.sample(instance, current, retries, rng),
            ExplorationMode::BestImprovement => Self::best(instance, current),
        }
    }
}

impl std::fmt::Display for SwapOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SwapOperator({}, max_swaps: {})",
            self.mode, self.max_swaps
        )
    }
}
