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

//! The mutable stack assignment.
//!
//! An `Assignment` is the `M x K` slot matrix every solver works on: one
//! column per stack, level `0` at the bottom, each cell empty or holding one
//! item. It is cloned per search node and per local-search candidate, so it
//! stays a plain value type. The instance is not embedded; operations that
//! need costs or the stacking relation take `&Instance<T>`.
//!
//! Next to the slots, a per-item location index mirrors where each item sits.
//! Every mutation goes through `place_at` and `remove`, which keep both views
//! in sync. Placing an item twice, or into an occupied cell, is a logic bug
//! and panics.
//!
//! Cost, feasibility and the unassigned list are derived on demand.

use crate::{
    index::{ItemIndex, StackIndex},
    instance::Instance,
    oracle::CompatibilityOracle,
};
use num_traits::{PrimInt, Signed};

/// A cell of the slot matrix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SlotPosition {
    stack: StackIndex,
    level: usize,
}

impl SlotPosition {
    #[inline]
    pub const fn new(stack: StackIndex, level: usize) -> Self {
        Self { stack, level }
    }

    #[inline]
    pub const fn stack(&self) -> StackIndex {
        self.stack
    }

    #[inline]
    pub const fn level(&self) -> usize {
        self.level
    }
}

impl std::fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, level {})", self.stack, self.level)
    }
}

/// Items placed into stacks.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Assignment {
    num_stacks: usize,
    capacity: usize,
    slots: Vec<Option<ItemIndex>>,          // len = num_stacks * capacity
    locations: Vec<Option<SlotPosition>>, // len = num_items
}

impl Assignment {
    /// Creates an empty assignment.
    pub fn new(num_items: usize, num_stacks: usize, capacity: usize) -> Self {
        Self {
            num_stacks,
            capacity,
            slots: vec![None; num_stacks * capacity],
            locations: vec![None; num_items],
        }
    }

    /// Creates an empty assignment shaped after `instance`.
    #[inline]
    pub fn for_instance<T>(instance: &Instance<T>) -> Self
    where
        T: PrimInt + Signed,
    {
        Self::new(
            instance.num_items(),
            instance.num_stacks(),
            instance.capacity(),
        )
    }

    /// Creates an assignment from explicit columns, each listed bottom to top.
    ///
    /// # Panics
    ///
    /// Panics if a column is longer than `capacity` or an item appears twice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stackplan_model::assignment::Assignment;
    /// # use stackplan_model::index::{ItemIndex, StackIndex};
    /// let a = Assignment::from_columns(3, 2, &[vec![ItemIndex::new(2)], vec![ItemIndex::new(0)]]);
    /// assert_eq!(a.stack_of(ItemIndex::new(0)), Some(StackIndex::new(1)));
    /// assert_eq!(a.num_assigned(), 2);
    /// ```
    pub fn from_columns(num_items: usize, capacity: usize, columns: &[Vec<ItemIndex>]) -> Self {
        let mut assignment = Self::new(num_items, columns.len(), capacity);
        for (stack, column) in columns.iter().enumerate() {
            assert!(
                column.len() <= capacity,
                "called `Assignment::from_columns` with a column of {} items but capacity {}",
                column.len(),
                capacity
            );
            for (level, &item) in column.iter().enumerate() {
                assignment.place_at(item, StackIndex::new(stack), level);
            }
        }
        assignment
    }

    /// Returns the number of items this assignment tracks.
    #[inline]
    pub fn num_items(&self) -> usize {
        self.locations.len()
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

    #[inline(always)]
    fn column_range(&self, stack: StackIndex) -> std::ops::Range<usize> {
        debug_assert!(
            stack.get() < self.num_stacks,
            "called `Assignment::column_range` with stack index out of bounds: the len is {} but the index is {}",
            self.num_stacks,
            stack.get()
        );
        let start = stack.get() * self.capacity;
        start..start + self.capacity
    }

    /// Returns the column of `stack`, bottom first.
    #[inline]
    pub fn column(&self, stack: StackIndex) -> &[Option<ItemIndex>] {
        &self.slots[self.column_range(stack)]
    }

    /// Iterates over all columns in stack order.
    #[inline]
    pub fn columns(&self) -> impl Iterator<Item = &[Option<ItemIndex>]> {
        self.slots.chunks_exact(self.capacity.max(1))
    }

    /// Returns the item in the given cell.
    #[inline]
    pub fn slot(&self, stack: StackIndex, level: usize) -> Option<ItemIndex> {
        debug_assert!(
            level < self.capacity,
            "called `Assignment::slot` with level out of bounds: the len is {} but the index is {}",
            self.capacity,
            level
        );
        self.column(stack)[level]
    }

    /// Returns where `item` sits, if anywhere.
    #[inline]
    pub fn position_of(&self, item: ItemIndex) -> Option<SlotPosition> {
        debug_assert!(
            item.get() < self.locations.len(),
            "called `Assignment::position_of` with item index out of bounds: the len is {} but the index is {}",
            self.locations.len(),
            item.get()
        );
        self.locations[item.get()]
    }

    /// Returns the stack holding `item`, if any.
    #[inline]
    pub fn stack_of(&self, item: ItemIndex) -> Option<StackIndex> {
        self.position_of(item).map(|p| p.stack)
    }

    /// Returns the level of `item`, if placed.
    #[inline]
    pub fn level_of(&self, item: ItemIndex) -> Option<usize> {
        self.position_of(item).map(|p| p.level)
    }

    #[inline]
    pub fn is_assigned(&self, item: ItemIndex) -> bool {
        self.position_of(item).is_some()
    }

    /// Returns the number of placed items.
    #[inline]
    pub fn num_assigned(&self) -> usize {
        self.locations.iter().filter(|l| l.is_some()).count()
    }

    /// Returns `true` if every item is placed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.locations.iter().all(Option::is_some)
    }

    /// Returns the number of occupied cells in `stack`.
    #[inline]
    pub fn occupancy(&self, stack: StackIndex) -> usize {
        self.column(stack).iter().filter(|c| c.is_some()).count()
    }

    /// Returns the lowest empty level of `stack`, if any.
    #[inline]
    pub fn lowest_free_level(&self, stack: StackIndex) -> Option<usize> {
        self.column(stack).iter().position(Option::is_none)
    }

    /// Returns `true` if `stack` has at least one empty cell.
    #[inline]
    pub fn has_free_slot(&self, stack: StackIndex) -> bool {
        self.lowest_free_level(stack).is_some()
    }

    /// Returns the number of empty cells over all stacks.
    #[inline]
    pub fn num_free_slots(&self) -> usize {
        self.slots.iter().filter(|c| c.is_none()).count()
    }

    /// Iterates over every empty cell, in stack then level order.
    pub fn free_slots(&self) -> impl Iterator<Item = SlotPosition> + '_ {
        let capacity = self.capacity;
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(move |(flat, _)| SlotPosition::new(StackIndex::new(flat / capacity), flat % capacity))
    }

    /// Iterates over the items not placed anywhere, ascending.
    pub fn unassigned_items(&self) -> impl Iterator<Item = ItemIndex> + '_ {
        self.locations
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_none())
            .map(|(i, _)| ItemIndex::new(i))
    }

    /// Iterates over the placed items, ascending.
    pub fn assigned_items(&self) -> impl Iterator<Item = ItemIndex> + '_ {
        self.locations
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_some())
            .map(|(i, _)| ItemIndex::new(i))
    }

    /// Places `item` into a specific cell.
    ///
    /// # Panics
    ///
    /// Panics if `item` is already placed or the cell is occupied.
    pub fn place_at(&mut self, item: ItemIndex, stack: StackIndex, level: usize) {
        assert!(
            item.get() < self.locations.len(),
            "called `Assignment::place_at` with item index out of bounds: the len is {} but the index is {}",
            self.locations.len(),
            item.get()
        );
        assert!(
            level < self.capacity,
            "called `Assignment::place_at` with level out of bounds: the len is {} but the index is {}",
            self.capacity,
            level
        );
        if let Some(existing) = self.locations[item.get()] {
            panic!(
                "called `Assignment::place_at` with {} already placed at {}",
                item, existing
            );
        }
        let flat = self.column_range(stack).start + level;
        if let Some(occupant) = self.slots[flat] {
            panic!(
                "called `Assignment::place_at` with occupied slot ({}, level {}) holding {}",
                stack, level, occupant
            );
        }
        self.slots[flat] = Some(item);
        self.locations[item.get()] = Some(SlotPosition::new(stack, level));
    }

    /// Places `item` at the lowest free level of `stack` and returns that level.
    ///
    /// # Panics
    ///
    /// Panics if `item` is already placed or `stack` is full.
    pub fn place(&mut self, item: ItemIndex, stack: StackIndex) -> usize {
        let Some(level) = self.lowest_free_level(stack) else {
            panic!(
                "called `Assignment::place` with full {} for {}",
                stack, item
            );
        };
        self.place_at(item, stack, level);
        level
    }

    /// Removes `item` and returns the cell it occupied.
    pub fn remove(&mut self, item: ItemIndex) -> Option<SlotPosition> {
        let position = self.locations[item.get()].take()?;
        let flat = self.column_range(position.stack).start + position.level;
        debug_assert_eq!(
            self.slots[flat],
            Some(item),
            "called `Assignment::remove` with inconsistent location index for {}",
            item
        );
        self.slots[flat] = None;
        Some(position)
    }

    /// Removes every item from `stack` and returns them bottom to top.
    pub fn clear_stack(&mut self, stack: StackIndex) -> Vec<ItemIndex> {
        let range = self.column_range(stack);
        let mut removed = Vec::with_capacity(self.capacity);
        for flat in range {
            if let Some(item) = self.slots[flat].take() {
                self.locations[item.get()] = None;
                removed.push(item);
            }
        }
        removed
    }

    /// Rewrites `stack` with `items` from level 0 upwards.
    fn rewrite_column(&mut self, stack: StackIndex, items: &[ItemIndex]) {
        let range = self.column_range(stack);
        for (offset, flat) in range.enumerate() {
            let cell = items.get(offset).copied();
            self.slots[flat] = cell;
            if let Some(item) = cell {
                self.locations[item.get()] = Some(SlotPosition::new(stack, offset));
            }
        }
    }

    /// Sum of `cost[item][stack]` over occupied cells.
    pub fn cost<T>(&self, instance: &Instance<T>) -> T
    where
        T: PrimInt + Signed,
    {
        self.locations
            .iter()
            .enumerate()
            .filter_map(|(item, l)| l.map(|p| instance.cost(ItemIndex::new(item), p.stack)))
            .fold(T::zero(), |acc, c| acc.saturating_add(c))
    }

    /// Checks capacity, eligibility, gravity and pairwise stacking order
    /// without requiring every item to be placed.
    pub fn is_consistent<T>(&self, instance: &Instance<T>) -> bool
    where
        T: PrimInt + Signed,
    {
        if self.num_stacks != instance.num_stacks()
            || self.capacity != instance.capacity()
            || self.num_items() != instance.num_items()
        {
            return false;
        }

        let oracle = CompatibilityOracle::new(instance);
        instance.stacks().all(|stack| {
            let column = self.column(stack);
            let gravity = column
                .windows(2)
                .all(|w| !(w[0].is_none() && w[1].is_some()));
            let eligible = column
                .iter()
                .flatten()
                .all(|&item| instance.is_eligible(item, stack));
            gravity && eligible && oracle.column_ordered(column)
        })
    }

    /// Returns `true` if the assignment is consistent and every item is placed.
    #[inline]
    pub fn is_feasible<T>(&self, instance: &Instance<T>) -> bool
    where
        T: PrimInt + Signed,
    {
        self.is_complete() && self.is_consistent(instance)
    }

    /// Compacts every column downward, keeping the relative order of its items.
    /// Idempotent.
    pub fn repair_gravity(&mut self) {
        let mut buffer = Vec::with_capacity(self.capacity);
        for stack in StackIndex::range(self.num_stacks) {
            buffer.clear();
            buffer.extend(self.column(stack).iter().flatten().copied());
            self.rewrite_column(stack, &buffer);
        }
    }

    /// Reorders every column into a sequence consistent with the stacking
    /// relation.
    ///
    /// Bottom-up, the next level receives the first remaining item that every
    /// other remaining item may sit above. If no such item exists the column
    /// cannot be ordered and the rest keeps its current order. Items never
    /// change stacks, and the result obeys gravity.
    pub fn reorder_by_constraints<T>(&mut self, instance: &Instance<T>)
    where
        T: PrimInt + Signed,
    {
        let mut remaining = Vec::with_capacity(self.capacity);
        let mut ordered = Vec::with_capacity(self.capacity);
        for stack in StackIndex::range(self.num_stacks) {
            remaining.clear();
            ordered.clear();
            remaining.extend(self.column(stack).iter().flatten().copied());

            while !remaining.is_empty() {
                let bottom = remaining.iter().position(|&candidate| {
                    remaining
                        .iter()
                        .all(|&other| other == candidate || instance.allows_above(other, candidate))
                });
                match bottom {
                    Some(pos) => ordered.push(remaining.remove(pos)),
                    None => {
                        ordered.append(&mut remaining);
                    }
                }
            }
            self.rewrite_column(stack, &ordered);
        }
    }

    /// Returns the sorted list of `(item, stack)` pairs.
    pub fn assignment_pairs(&self) -> Vec<(ItemIndex, StackIndex)> {
        self.locations
            .iter()
            .enumerate()
            .filter_map(|(item, l)| l.map(|p| (ItemIndex::new(item), p.stack)))
            .collect()
    }

    /// Returns a copy where the column of stack `s` moves to `target_of[s]`.
    ///
    /// # Panics
    ///
    /// Panics if `target_of` is not a permutation of the stacks.
    pub fn with_permuted_columns(&self, target_of: &[StackIndex]) -> Self {
        assert_eq!(
            target_of.len(),
            self.num_stacks,
            "called `Assignment::with_permuted_columns` with {} targets for {} stacks",
            target_of.len(),
            self.num_stacks
        );
        let mut permuted = Self::new(self.num_items(), self.num_stacks, self.capacity);
        let mut seen = vec![false; self.num_stacks];
        for (source, &target) in target_of.iter().enumerate() {
            assert!(
                !std::mem::replace(&mut seen[target.get()], true),
                "called `Assignment::with_permuted_columns` with {} targeted twice",
                target
            );
            for (level, cell) in self.column(StackIndex::new(source)).iter().enumerate() {
                if let Some(item) = *cell {
                    permuted.place_at(item, target, level);
                }
            }
        }
        permuted
    }
}

impl std::fmt::Debug for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assignment")
            .field("num_stacks", &self.num_stacks)
            .field("capacity", &self.capacity)
            .field("slots", &self.slots)
            .finish()
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (stack, column) in self.columns().enumerate() {
            write!(f, "stack {}: [", stack)?;
            for (level, cell) in column.iter().enumerate() {
                if level > 0 {
                    write!(f, ", ")?;
                }
                match cell {
                    Some(item) => write!(f, "{}", item.get())?,
                    None => write!(f, "-")?,
                }
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
