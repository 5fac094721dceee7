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

//! # Start Solution Suppliers
//!
//! Local search starts from a feasible assignment produced elsewhere. The
//! engines only see the `FeasibleAssignmentSupplier` trait; this module also
//! ships `FirstFitConstructor`, a randomized first-fit construction with
//! restarts.

use crate::err::SupplyError;
use num_traits::{PrimInt, Signed};
use rand::{Rng, seq::SliceRandom};
use stackplan_model::{
    assignment::Assignment, index::ItemIndex, instance::Instance, oracle::CompatibilityOracle,
};

/// Produces a complete, feasible assignment for an instance.
pub trait FeasibleAssignmentSupplier<T>
where
    T: PrimInt + Signed,
{
    /// Returns the name of the supplier.
    fn name(&self) -> &str;

    /// Supplies a feasible assignment, drawing randomness from `rng`.
    fn supply<R>(&mut self, instance: &Instance<T>, rng: &mut R) -> Result<Assignment, SupplyError>
    where
        R: Rng + ?Sized;
}

/// Randomized first fit.
///
/// Each attempt shuffles the items, places every item into the first stack
/// that passes `CompatibilityOracle::can_place`, then repairs gravity and
/// reorders the columns by the stacking relation. Attempts that get stuck or
/// end infeasible are restarted, up to `max_restarts` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFitConstructor {
    max_restarts: usize,
}

impl Default for FirstFitConstructor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RESTARTS)
    }
}

impl FirstFitConstructor {
    pub const DEFAULT_MAX_RESTARTS: usize = 1000;

    #[inline]
    pub fn new(max_restarts: usize) -> Self {
        Self { max_restarts }
    }

    #[inline]
    pub fn max_restarts(&self) -> usize {
        self.max_restarts
    }

    fn attempt<T>(instance: &Instance<T>, order: &[ItemIndex]) -> Option<Assignment>
    where
        T: PrimInt + Signed,
    {
        let oracle = CompatibilityOracle::new(instance);
        let mut assignment = Assignment::for_instance(instance);
        for &item in order {
            let stack = instance
                .stacks()
                .find(|&stack| oracle.can_place(item, &assignment, stack))?;
            assignment.place(item, stack);
        }
        assignment.repair_gravity();
        assignment.reorder_by_constraints(instance);
        assignment.is_feasible(instance).then_some(assignment)
    }
}

impl<T> FeasibleAssignmentSupplier<T> for FirstFitConstructor
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "FirstFitConstructor"
    }

    fn supply<R>(&mut self, instance: &Instance<T>, rng: &mut R) -> Result<Assignment, SupplyError>
    where
        R: Rng + ?Sized,
    {
        if let Some(item) = instance
            .items()
            .find(|&item| instance.eligible_stacks(item).next().is_none())
        {
            return Err(SupplyError::UnplaceableItem(item));
        }

        let mut order: Vec<ItemIndex> = instance.items().collect();
        for attempt in 0..=self.max_restarts {
            order.shuffle(rng);
            if let Some(assignment) = Self::attempt(instance, &order) {
                tracing::debug!(attempt, "first fit produced a feasible assignment");
                return Ok(assignment);
            }
            tracing::trace!(attempt, "first fit attempt failed, restarting");
        }

        tracing::warn!(
            restarts = self.max_restarts,
            "first fit exhausted its restarts"
        );
        Err(SupplyError::RestartsExhausted {
            restarts: self.max_restarts,
        })
    }
}
