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

//! Stacking violation counts.
//!
//! For every column and every pair `(lower, upper)` where `upper` may not sit
//! above `lower`, both items receive one conflict. Bound repair uses the
//! counts to decide which item to evict first, and branch-and-bound branches
//! on the most conflicted unassigned item.

use crate::{assignment::Assignment, index::ItemIndex, instance::Instance};
use num_traits::{PrimInt, Signed};

/// Per-item conflict counts for one assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictReport {
    counts: Vec<usize>,
    total_pairs: usize,
}

impl ConflictReport {
    /// Counts the violated pairs of every column in `assignment`.
    pub fn compute<T>(instance: &Instance<T>, assignment: &Assignment) -> Self
    where
        T: PrimInt + Signed,
    {
        let mut counts = vec![0usize; assignment.num_items()];
        let mut total_pairs = 0usize;
        let mut occupied = Vec::with_capacity(assignment.capacity());

        for column in assignment.columns() {
            occupied.clear();
            occupied.extend(column.iter().flatten().copied());
            for (pos, &lower) in occupied.iter().enumerate() {
                for &upper in &occupied[pos + 1..] {
                    if !instance.allows_above(upper, lower) {
                        counts[lower.get()] += 1;
                        counts[upper.get()] += 1;
                        total_pairs += 1;
                    }
                }
            }
        }

        Self {
            counts,
            total_pairs,
        }
    }

    /// Returns the conflict count of `item`.
    #[inline]
    pub fn conflicts_of(&self, item: ItemIndex) -> usize {
        debug_assert!(
            item.get() < self.counts.len(),
            "called `ConflictReport::conflicts_of` with item index out of bounds: the len is {} but the index is {}",
            self.counts.len(),
            item.get()
        );
        self.counts[item.get()]
    }

    /// Returns the number of violated pairs.
    #[inline]
    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    /// Returns `true` if no pair is violated.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.total_pairs == 0
    }

    /// Returns the conflicting items ordered by count descending, ties by
    /// ascending index.
    pub fn ranked(&self) -> Vec<(ItemIndex, usize)> {
        let mut ranked: Vec<(ItemIndex, usize)> = self
            .counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(i, &c)| (ItemIndex::new(i), c))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Returns the item with the highest count among those accepted by
    /// `filter`, lowest index on ties. Items without conflicts take part,
    /// so the result is only `None` when `filter` rejects everything.
    pub fn most_conflicted<F>(&self, mut filter: F) -> Option<ItemIndex>
    where
        F: FnMut(ItemIndex) -> bool,
    {
        let mut best: Option<(ItemIndex, usize)> = None;
        for (i, &count) in self.counts.iter().enumerate() {
            let item = ItemIndex::new(i);
            if !filter(item) {
                continue;
            }
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((item, count));
            }
        }
        best.map(|(item, _)| item)
    }
}

impl std::fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConflictReport(violated pairs: {}, conflicting items: {})",
            self.total_pairs,
            self.counts.iter().filter(|c| **c > 0).count()
        )
    }
}
