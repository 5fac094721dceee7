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

//! Immutable problem data.
//!
//! An `Instance` holds the item count `N`, the stack count `M`, the common
//! stack capacity `K`, the `N x M` cost matrix and the `N x N` stacking
//! relation. It is built once through `InstanceBuilder` (or
//! `Instance::from_matrices`) and shared by reference with every solver.
//!
//! Ineligibility is encoded in the cost matrix: any cost at or above
//! `Instance::sentinel()` means the item can never be placed on that stack.
//! The sentinel is `T::max_value() / (4 * (N + 1))`, which keeps sums of `N`
//! eligible costs and the dual potentials of the matching bound well inside
//! the range of `T`. Ineligible entries are normalized to the sentinel itself.

use crate::{
    err::{CostOutOfRangeError, DimensionMismatchError, InstanceBuildError},
    index::{ItemIndex, StackIndex},
};
use fixedbitset::FixedBitSet;
use num_traits::{NumCast, PrimInt, Signed};

/// Returns the ineligibility sentinel for an instance with `num_items` items,
/// or `None` if `T` is too narrow to hold a useful one.
#[inline]
pub fn ineligibility_sentinel<T>(num_items: usize) -> Option<T>
where
    T: PrimInt + Signed,
{
    let divisor = num_items.checked_add(1)?.checked_mul(4)?;
    let divisor: T = <T as NumCast>::from(divisor)?;
    let sentinel = T::max_value() / divisor;
    (sentinel > T::one()).then_some(sentinel)
}

/// The immutable stacking problem.
///
/// - `costs[item * num_stacks + stack]`: placement cost, normalized to the
///   sentinel when ineligible.
/// - `eligible`: bit `item * num_stacks + stack` is set iff the item may be
///   placed on the stack.
/// - `stacking`: bit `upper * num_items + lower` is set iff `upper` may be
///   placed above `lower` in the same column (directly or transitively).
#[derive(Clone)]
pub struct Instance<T>
where
    T: PrimInt + Signed,
{
    num_items: usize,
    num_stacks: usize,
    capacity: usize,
    costs: Vec<T>,        // len = num_items * num_stacks
    eligible: FixedBitSet, // len = num_items * num_stacks
    stacking: FixedBitSet, // len = num_items * num_items
    sentinel: T,
}

impl<T> Instance<T>
where
    T: PrimInt + Signed,
{
    /// Builds an instance from nested matrices.
    ///
    /// `costs` has one row per item and `num_stacks` columns; `stacking` is
    /// square over the items, `stacking[a][b]` allowing `a` above `b`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stackplan_model::instance::Instance;
    /// let costs = vec![vec![1_i64, 4], vec![3, 2]];
    /// let stacking = vec![vec![false, true], vec![false, false]];
    /// let instance = Instance::from_matrices(2, 2, &costs, &stacking).unwrap();
    /// assert_eq!(instance.num_items(), 2);
    /// assert_eq!(instance.num_slots(), 4);
    /// ```
    pub fn from_matrices(
        num_stacks: usize,
        capacity: usize,
        costs: &[Vec<T>],
        stacking: &[Vec<bool>],
    ) -> Result<Self, InstanceBuildError> {
        let num_items = costs.len();
        if stacking.len() != num_items {
            return Err(
                DimensionMismatchError::new("stacking matrix rows", num_items, stacking.len())
                    .into(),
            );
        }

        let mut builder = InstanceBuilder::new(num_items, num_stacks, capacity);
        for (item, row) in costs.iter().enumerate() {
            if row.len() != num_stacks {
                return Err(
                    DimensionMismatchError::new("cost matrix row", num_stacks, row.len()).into(),
                );
            }
            for (stack, &cost) in row.iter().enumerate() {
                builder.costs[item * num_stacks + stack] = cost;
            }
        }
        for (upper, row) in stacking.iter().enumerate() {
            if row.len() != num_items {
                return Err(
                    DimensionMismatchError::new("stacking matrix row", num_items, row.len())
                        .into(),
                );
            }
            for (lower, &allowed) in row.iter().enumerate() {
                builder
                    .stacking
                    .set(upper * num_items + lower, allowed && upper != lower);
            }
        }
        builder.build()
    }

    /// Returns the number of items.
    #[inline]
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Returns the number of stacks.
    #[inline]
    pub fn num_stacks(&self) -> usize {
        self.num_stacks
    }

    /// Returns the number of slots per stack.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the total number of slots over all stacks.
    #[inline]
    pub fn num_slots(&self) -> usize {
        self.num_stacks * self.capacity
    }

    /// Returns the ineligibility sentinel of this instance.
    #[inline]
    pub fn sentinel(&self) -> T {
        self.sentinel
    }

    #[inline(always)]
    fn flat(&self, item: ItemIndex, stack: StackIndex) -> usize {
        debug_assert!(
            item.get() < self.num_items,
            "called `Instance::flat` with item index out of bounds: the len is {} but the index is {}",
            self.num_items,
            item.get()
        );
        debug_assert!(
            stack.get() < self.num_stacks,
            "called `Instance::flat` with stack index out of bounds: the len is {} but the index is {}",
            self.num_stacks,
            stack.get()
        );
        item.get() * self.num_stacks + stack.get()
    }

    /// Returns the cost of placing `item` on `stack`. Ineligible pairs report
    /// the sentinel.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if either index is out of bounds.
    #[inline]
    pub fn cost(&self, item: ItemIndex, stack: StackIndex) -> T {
        self.costs[self.flat(item, stack)]
    }

    /// Returns the cost row of `item`, indexed by stack.
    #[inline]
    pub fn item_costs(&self, item: ItemIndex) -> &[T] {
        let start = item.get() * self.num_stacks;
        &self.costs[start..start + self.num_stacks]
    }

    /// Returns `true` if `item` may ever be placed on `stack`.
    #[inline]
    pub fn is_eligible(&self, item: ItemIndex, stack: StackIndex) -> bool {
        self.eligible.contains(self.flat(item, stack))
    }

    /// Returns `true` if `upper` may sit above `lower` in the same column.
    #[inline]
    pub fn allows_above(&self, upper: ItemIndex, lower: ItemIndex) -> bool {
        debug_assert!(
            upper.get() < self.num_items && lower.get() < self.num_items,
            "called `Instance::allows_above` with item index out of bounds: the len is {} but the indices are {} and {}",
            self.num_items,
            upper.get(),
            lower.get()
        );
        self.stacking
            .contains(upper.get() * self.num_items + lower.get())
    }

    /// Returns `true` if `a` and `b` can share a column in some order.
    #[inline]
    pub fn compatible(&self, a: ItemIndex, b: ItemIndex) -> bool {
        self.allows_above(a, b) || self.allows_above(b, a)
    }

    /// Iterates over all items.
    #[inline]
    pub fn items(&self) -> impl DoubleEndedIterator<Item = ItemIndex> + ExactSizeIterator {
        ItemIndex::range(self.num_items)
    }

    /// Iterates over all stacks.
    #[inline]
    pub fn stacks(&self) -> impl DoubleEndedIterator<Item = StackIndex> + ExactSizeIterator {
        StackIndex::range(self.num_stacks)
    }

    /// Iterates over the stacks `item` is eligible for.
    #[inline]
    pub fn eligible_stacks(&self, item: ItemIndex) -> impl Iterator<Item = StackIndex> + '_ {
        self.stacks().filter(move |&s| self.is_eligible(item, s))
    }
}

impl<T> std::fmt::Debug for Instance<T>
where
    T: PrimInt + Signed + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("num_items", &self.num_items)
            .field("num_stacks", &self.num_stacks)
            .field("capacity", &self.capacity)
            .field("costs", &self.costs)
            .field("sentinel", &self.sentinel)
            .finish()
    }
}

impl<T> std::fmt::Display for Instance<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instance(num_items: {}, num_stacks: {}, capacity: {})",
            self.num_items, self.num_stacks, self.capacity
        )
    }
}

/// Mutable staging area for an `Instance`.
///
/// # Defaults
///
/// | Field | Default | Semantics |
/// | :--- | :--- | :--- |
/// | `costs` | `0` | Every item is eligible everywhere, for free. |
/// | `stacking` | empty | **No two items may share a column** until stacking is allowed explicitly. |
///
/// Nothing is assumed about the stacking relation: pairs have to be allowed
/// with `allow_stacking` or `allow_all_stacking`, so a forgotten constraint
/// shows up as infeasibility instead of as a silently permissive model.
#[derive(Clone)]
pub struct InstanceBuilder<T>
where
    T: PrimInt + Signed,
{
    num_items: usize,
    num_stacks: usize,
    capacity: usize,
    costs: Vec<T>,
    stacking: FixedBitSet,
}

impl<T> InstanceBuilder<T>
where
    T: PrimInt + Signed,
{
    /// Creates a builder for `num_items` items on `num_stacks` stacks of
    /// `capacity` slots each.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stackplan_model::instance::InstanceBuilder;
    /// # use stackplan_model::index::{ItemIndex, StackIndex};
    /// let mut builder = InstanceBuilder::<i64>::new(3, 2, 2);
    /// builder
    ///     .set_cost(ItemIndex::new(0), StackIndex::new(1), 7)
    ///     .forbid(ItemIndex::new(2), StackIndex::new(0))
    ///     .allow_all_stacking();
    /// let instance = builder.build().unwrap();
    /// assert_eq!(instance.cost(ItemIndex::new(0), StackIndex::new(1)), 7);
    /// assert!(!instance.is_eligible(ItemIndex::new(2), StackIndex::new(0)));
    /// ```
    pub fn new(num_items: usize, num_stacks: usize, capacity: usize) -> Self {
        Self {
            num_items,
            num_stacks,
            capacity,
            costs: vec![T::zero(); num_items * num_stacks],
            stacking: FixedBitSet::with_capacity(num_items * num_items),
        }
    }

    /// Returns the number of items.
    #[inline]
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Returns the number of stacks.
    #[inline]
    pub fn num_stacks(&self) -> usize {
        self.num_stacks
    }

    /// Sets the cost of placing `item` on `stack`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn set_cost(&mut self, item: ItemIndex, stack: StackIndex, cost: T) -> &mut Self {
        assert!(
            item.get() < self.num_items,
            "called `InstanceBuilder::set_cost` with item index out of bounds: the len is {} but the index is {}",
            self.num_items,
            item.get()
        );
        assert!(
            stack.get() < self.num_stacks,
            "called `InstanceBuilder::set_cost` with stack index out of bounds: the len is {} but the index is {}",
            self.num_stacks,
            stack.get()
        );
        self.costs[item.get() * self.num_stacks + stack.get()] = cost;
        self
    }

    /// Sets the whole cost row of `item`.
    ///
    /// # Panics
    ///
    /// Panics if `item` is out of bounds or `costs.len() != num_stacks`.
    pub fn set_item_costs(&mut self, item: ItemIndex, costs: &[T]) -> &mut Self {
        assert_eq!(
            costs.len(),
            self.num_stacks,
            "called `InstanceBuilder::set_item_costs` with {} costs for {} stacks",
            costs.len(),
            self.num_stacks
        );
        for (stack, &cost) in costs.iter().enumerate() {
            self.set_cost(item, StackIndex::new(stack), cost);
        }
        self
    }

    /// Marks `item` as never placeable on `stack`.
    pub fn forbid(&mut self, item: ItemIndex, stack: StackIndex) -> &mut Self {
        self.set_cost(item, stack, T::max_value())
    }

    /// Allows `upper` to be placed above `lower` in the same column.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn allow_stacking(&mut self, upper: ItemIndex, lower: ItemIndex) -> &mut Self {
        assert!(
            upper.get() < self.num_items && lower.get() < self.num_items,
            "called `InstanceBuilder::allow_stacking` with item index out of bounds: the len is {} but the indices are {} and {}",
            self.num_items,
            upper.get(),
            lower.get()
        );
        if upper != lower {
            self.stacking
                .insert(upper.get() * self.num_items + lower.get());
        }
        self
    }

    /// Allows every ordered pair of distinct items to share a column.
    pub fn allow_all_stacking(&mut self) -> &mut Self {
        for upper in 0..self.num_items {
            for lower in 0..self.num_items {
                if upper != lower {
                    self.stacking.insert(upper * self.num_items + lower);
                }
            }
        }
        self
    }

    /// Validates the staged data and produces the immutable `Instance`.
    ///
    /// # Errors
    ///
    /// - `NoStacks` if there are no stacks,
    /// - `ZeroCapacity` if stacks have no slots,
    /// - `InsufficientCapacity` if there are more items than slots,
    /// - `CostTypeTooNarrow` if `T` cannot encode the sentinel for this many items,
    /// - `CostOutOfRange` if a cost is at or below the negated sentinel.
    pub fn build(self) -> Result<Instance<T>, InstanceBuildError> {
        if self.num_stacks == 0 {
            return Err(InstanceBuildError::NoStacks);
        }
        if self.capacity == 0 {
            return Err(InstanceBuildError::ZeroCapacity);
        }
        let slots = self.num_stacks.saturating_mul(self.capacity);
        if self.num_items > slots {
            return Err(InstanceBuildError::InsufficientCapacity {
                items: self.num_items,
                slots,
            });
        }
        let sentinel = ineligibility_sentinel::<T>(self.num_items)
            .ok_or(InstanceBuildError::CostTypeTooNarrow(self.num_items))?;

        let mut costs = self.costs;
        let mut eligible = FixedBitSet::with_capacity(costs.len());
        for (flat, cost) in costs.iter_mut().enumerate() {
            if *cost >= sentinel {
                *cost = sentinel;
            } else if *cost <= -sentinel {
                let item = ItemIndex::new(flat / self.num_stacks);
                let stack = StackIndex::new(flat % self.num_stacks);
                return Err(CostOutOfRangeError::new(item, stack).into());
            } else {
                eligible.insert(flat);
            }
        }

        Ok(Instance {
            num_items: self.num_items,
            num_stacks: self.num_stacks,
            capacity: self.capacity,
            costs,
            eligible,
            stacking: self.stacking,
            sentinel,
        })
    }
}

impl<T> std::fmt::Debug for InstanceBuilder<T>
where
    T: PrimInt + Signed + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceBuilder")
            .field("num_items", &self.num_items)
            .field("num_stacks", &self.num_stacks)
            .field("capacity", &self.capacity)
            .field("costs", &self.costs)
            .finish()
    }
}

impl<T> std::fmt::Display for InstanceBuilder<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "InstanceBuilder(num_items: {}, num_stacks: {}, capacity: {})",
            self.num_items, self.num_stacks, self.capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type IntegerType = i64;

    fn ii(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn si(s: usize) -> StackIndex {
        StackIndex::new(s)
    }

    #[test]
    fn test_builder_defaults_are_free_and_unstackable() {
        let instance = InstanceBuilder::<IntegerType>::new(2, 3, 2).build().unwrap();
        assert_eq!(instance.num_items(), 2);
        assert_eq!(instance.num_stacks(), 3);
        assert_eq!(instance.capacity(), 2);
        assert_eq!(instance.num_slots(), 6);
        for item in instance.items() {
            for stack in instance.stacks() {
                assert_eq!(instance.cost(item, stack), 0);
                assert!(instance.is_eligible(item, stack));
            }
        }
        assert!(!instance.compatible(ii(0), ii(1)));
    }

    #[test]
    fn test_forbid_normalizes_to_sentinel() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.forbid(ii(1), si(0));
        let instance = b.build().unwrap();
        assert!(!instance.is_eligible(ii(1), si(0)));
        assert_eq!(instance.cost(ii(1), si(0)), instance.sentinel());
        assert_eq!(instance.eligible_stacks(ii(1)).collect::<Vec<_>>(), vec![si(1)]);
    }

    #[test]
    fn test_large_cost_counts_as_ineligible() {
        let mut b = InstanceBuilder::<IntegerType>::new(1, 2, 1);
        let sentinel = ineligibility_sentinel::<IntegerType>(1).unwrap();
        b.set_cost(ii(0), si(0), sentinel);
        b.set_cost(ii(0), si(1), sentinel - 1);
        let instance = b.build().unwrap();
        assert!(!instance.is_eligible(ii(0), si(0)));
        assert!(instance.is_eligible(ii(0), si(1)));
    }

    #[test]
    fn test_stacking_relation_is_directed() {
        let mut b = InstanceBuilder::<IntegerType>::new(3, 1, 3);
        b.allow_stacking(ii(0), ii(1));
        let instance = b.build().unwrap();
        assert!(instance.allows_above(ii(0), ii(1)));
        assert!(!instance.allows_above(ii(1), ii(0)));
        assert!(instance.compatible(ii(1), ii(0)));
        assert!(!instance.compatible(ii(0), ii(2)));
    }

    #[test]
    fn test_allow_all_stacking_skips_diagonal() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 1, 2);
        b.allow_all_stacking();
        let instance = b.build().unwrap();
        assert!(instance.allows_above(ii(0), ii(1)));
        assert!(instance.allows_above(ii(1), ii(0)));
        assert!(!instance.allows_above(ii(0), ii(0)));
    }

    #[test]
    fn test_build_rejects_zero_stacks_and_capacity() {
        assert_eq!(
            InstanceBuilder::<IntegerType>::new(1, 0, 1).build().err(),
            Some(InstanceBuildError::NoStacks)
        );
        assert_eq!(
            InstanceBuilder::<IntegerType>::new(1, 1, 0).build().err(),
            Some(InstanceBuildError::ZeroCapacity)
        );
    }

    #[test]
    fn test_build_rejects_more_items_than_slots() {
        assert_eq!(
            InstanceBuilder::<IntegerType>::new(5, 2, 2).build().err(),
            Some(InstanceBuildError::InsufficientCapacity { items: 5, slots: 4 })
        );
    }

    #[test]
    fn test_build_rejects_hugely_negative_cost() {
        let mut b = InstanceBuilder::<IntegerType>::new(1, 1, 1);
        b.set_cost(ii(0), si(0), IntegerType::MIN + 1);
        assert!(matches!(
            b.build(),
            Err(InstanceBuildError::CostOutOfRange(_))
        ));
    }

    #[test]
    fn test_narrow_cost_type_is_rejected() {
        let b = InstanceBuilder::<i8>::new(40, 1, 40);
        assert_eq!(b.build().err(), Some(InstanceBuildError::CostTypeTooNarrow(40)));
    }

    #[test]
    fn test_from_matrices_round_trip() {
        let costs = vec![vec![1, 4], vec![3, 2], vec![5, IntegerType::MAX]];
        let stacking = vec![
            vec![false, true, false],
            vec![false, false, false],
            vec![true, true, true],
        ];
        let instance = Instance::from_matrices(2, 2, &costs, &stacking).unwrap();
        assert_eq!(instance.item_costs(ii(1)), &[3, 2]);
        assert!(!instance.is_eligible(ii(2), si(1)));
        assert!(instance.allows_above(ii(0), ii(1)));
        assert!(instance.allows_above(ii(2), ii(0)));
        assert!(!instance.allows_above(ii(2), ii(2)));
    }

    #[test]
    fn test_from_matrices_dimension_mismatch() {
        let costs = vec![vec![1, 4], vec![3]];
        let stacking = vec![vec![false, false], vec![false, false]];
        let err = Instance::from_matrices(2, 1, &costs, &stacking).unwrap_err();
        assert_eq!(
            err,
            InstanceBuildError::DimensionMismatch(DimensionMismatchError::new(
                "cost matrix row",
                2,
                1
            ))
        );

        let short_stacking = vec![vec![false, false]];
        let err = Instance::from_matrices(2, 1, &[vec![1, 1], vec![1, 1]], &short_stacking)
            .unwrap_err();
        assert!(matches!(err, InstanceBuildError::DimensionMismatch(_)));
    }

    #[test]
    #[should_panic(expected = "called `InstanceBuilder::set_cost` with item index out of bounds")]
    fn test_set_cost_out_of_bounds_panics() {
        let mut b = InstanceBuilder::<IntegerType>::new(1, 1, 1);
        b.set_cost(ii(5), si(0), 1);
    }

    #[test]
    fn test_display() {
        let instance = InstanceBuilder::<IntegerType>::new(4, 2, 3).build().unwrap();
        assert_eq!(
            format!("{}", instance),
            "Instance(num_items: 4, num_stacks: 2, capacity: 3)"
        );
    }
}
