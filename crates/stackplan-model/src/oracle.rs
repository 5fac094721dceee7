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

//! Compatibility predicates.
//!
//! `CompatibilityOracle` answers the questions every solver asks before
//! touching a column: may this item go on this stack at all, does it get along
//! with everything already in the column, and is there room. Nothing is
//! cached; columns mutate continuously, so each call re-reads the slots it is
//! given.

use crate::{
    assignment::Assignment,
    index::{ItemIndex, StackIndex},
    instance::Instance,
};
use num_traits::{PrimInt, Signed};

/// Pure predicates over an `Instance` and column contents.
#[derive(Clone, Copy)]
pub struct CompatibilityOracle<'a, T>
where
    T: PrimInt + Signed,
{
    instance: &'a Instance<T>,
}

impl<'a, T> CompatibilityOracle<'a, T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new(instance: &'a Instance<T>) -> Self {
        Self { instance }
    }

    #[inline]
    pub fn instance(&self) -> &'a Instance<T> {
        self.instance
    }

    /// Returns `false` iff the cost of `item` on `stack` is at or above the
    /// ineligibility sentinel.
    #[inline]
    pub fn stack_eligible(&self, item: ItemIndex, stack: StackIndex) -> bool {
        self.instance.is_eligible(item, stack)
    }

    /// Returns `true` if `item` can share a column with every occupant of
    /// `column`, ignoring `except` (a hypothetical replacement) and `item`
    /// itself.
    #[inline]
    pub fn column_compatible(
        &self,
        item: ItemIndex,
        column: &[Option<ItemIndex>],
        except: Option<ItemIndex>,
    ) -> bool {
        column
            .iter()
            .flatten()
            .filter(|&&other| other != item && Some(other) != except)
            .all(|&other| self.instance.compatible(item, other))
    }

    /// Returns `true` if `column` has at least one empty slot.
    #[inline]
    pub fn has_free_slot(&self, column: &[Option<ItemIndex>]) -> bool {
        column.iter().any(Option::is_none)
    }

    /// Returns `true` if every slot of `column` is occupied.
    #[inline]
    pub fn is_full(&self, column: &[Option<ItemIndex>]) -> bool {
        column.iter().all(Option::is_some)
    }

    /// Returns `true` if `item` may be added to `stack` in `assignment` right
    /// now: eligible, room left, compatible with all occupants.
    #[inline]
    pub fn can_place(&self, item: ItemIndex, assignment: &Assignment, stack: StackIndex) -> bool {
        let column = assignment.column(stack);
        self.stack_eligible(item, stack)
            && self.has_free_slot(column)
            && self.column_compatible(item, column, None)
    }

    /// Returns `true` if the occupied cells of `column`, read bottom to top,
    /// respect the stacking relation for every pair.
    pub fn column_ordered(&self, column: &[Option<ItemIndex>]) -> bool {
        let occupied: Vec<ItemIndex> = column.iter().flatten().copied().collect();
        occupied.iter().enumerate().all(|(lower_pos, &lower)| {
            occupied[lower_pos + 1..]
                .iter()
                .all(|&upper| self.instance.allows_above(upper, lower))
        })
    }
}

impl<'a, T> std::fmt::Debug for CompatibilityOracle<'a, T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompatibilityOracle({})", self.instance)
    }
}
