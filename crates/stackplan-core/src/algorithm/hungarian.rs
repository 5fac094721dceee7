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

//! Minimum-cost perfect matching on dense square matrices.
//!
//! `HungarianSolver` implements the Kuhn-Munkres algorithm with dual
//! potentials, augmenting one row at a time along shortest alternating paths.
//! Each augmentation is `O(n^2)`, the full solve `O(n^3)`. The solver owns its
//! scratch buffers so repeated solves (one per branch-and-bound node) do not
//! reallocate once the largest matrix size has been seen.
//!
//! Callers that need a rectangular or sparse matching pad the matrix
//! themselves: dummy rows or columns with zero cost, forbidden pairs with a
//! large finite sentinel. Costs must stay far enough from `T::max_value()` that
//! sums of `n` entries cannot overflow; the arithmetic saturates rather than
//! wraps, but a saturated potential no longer certifies optimality.

use num_traits::{PrimInt, Signed};

/// The result of a perfect matching: one column per row, plus the total cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfectMatching<T> {
    row_to_col: Vec<usize>,
    weight: T,
}

impl<T> PerfectMatching<T>
where
    T: Copy,
{
    /// Returns the matched column for every row, indexed by row.
    #[inline]
    pub fn row_to_col(&self) -> &[usize] {
        &self.row_to_col
    }

    /// Returns the column matched to `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[inline]
    pub fn col_of(&self, row: usize) -> usize {
        debug_assert!(
            row < self.row_to_col.len(),
            "called `PerfectMatching::col_of` with row out of bounds: the len is {} but the index is {}",
            self.row_to_col.len(),
            row
        );
        self.row_to_col[row]
    }

    /// Returns the total cost of the matching.
    #[inline]
    pub fn weight(&self) -> T {
        self.weight
    }

    /// Returns the number of matched rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.row_to_col.len()
    }

    /// Returns `true` if the matching is over an empty matrix.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.row_to_col.is_empty()
    }

    /// Iterates over `(row, col)` pairs in row order.
    #[inline]
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_to_col.iter().copied().enumerate()
    }
}

/// Reusable Kuhn-Munkres solver.
#[derive(Debug, Clone)]
pub struct HungarianSolver<T> {
    row_potential: Vec<T>,
    col_potential: Vec<T>,
    col_owner: Vec<usize>,
    way: Vec<usize>,
    min_slack: Vec<T>,
    visited: Vec<bool>,
}

impl<T> Default for HungarianSolver<T>
where
    T: PrimInt + Signed,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HungarianSolver<T>
where
    T: PrimInt + Signed,
{
    /// Creates a solver with empty scratch buffers.
    #[inline]
    pub fn new() -> Self {
        Self {
            row_potential: Vec::new(),
            col_potential: Vec::new(),
            col_owner: Vec::new(),
            way: Vec::new(),
            min_slack: Vec::new(),
            visited: Vec::new(),
        }
    }

    /// Creates a solver whose buffers already fit an `n x n` matrix.
    #[inline]
    pub fn preallocated(n: usize) -> Self {
        Self {
            row_potential: Vec::with_capacity(n + 1),
            col_potential: Vec::with_capacity(n + 1),
            col_owner: Vec::with_capacity(n + 1),
            way: Vec::with_capacity(n + 1),
            min_slack: Vec::with_capacity(n + 1),
            visited: Vec::with_capacity(n + 1),
        }
    }

    fn reset(&mut self, n: usize) {
        // Index 0 is the virtual root column/row of the augmenting search.
        self.row_potential.clear();
        self.row_potential.resize(n + 1, T::zero());
        self.col_potential.clear();
        self.col_potential.resize(n + 1, T::zero());
        self.col_owner.clear();
        self.col_owner.resize(n + 1, 0);
        self.way.clear();
        self.way.resize(n + 1, 0);
    }

    /// Solves the minimum-cost perfect matching for the row-major `n x n`
    /// matrix `costs`.
    ///
    /// # Panics
    ///
    /// Panics if `costs.len() != n * n`.
    pub fn solve(&mut self, costs: &[T], n: usize) -> PerfectMatching<T> {
        assert_eq!(
            costs.len(),
            n * n,
            "called `HungarianSolver::solve` with a non-square matrix: expected {} entries but got {}",
            n * n,
            costs.len()
        );

        if n == 0 {
            return PerfectMatching {
                row_to_col: Vec::new(),
                weight: T::zero(),
            };
        }

        self.reset(n);
        let cost = |row: usize, col: usize| costs[(row - 1) * n + (col - 1)];

        for row in 1..=n {
            self.col_owner[0] = row;
            let mut current_col = 0usize;
            self.min_slack.clear();
            self.min_slack.resize(n + 1, T::max_value());
            self.visited.clear();
            self.visited.resize(n + 1, false);

            loop {
                self.visited[current_col] = true;
                let owner = self.col_owner[current_col];
                let mut delta = T::max_value();
                let mut next_col = 0usize;

                for col in 1..=n {
                    if self.visited[col] {
                        continue;
                    }
                    let reduced = cost(owner, col)
                        .saturating_sub(self.row_potential[owner])
                        .saturating_sub(self.col_potential[col]);
                    if reduced < self.min_slack[col] {
                        self.min_slack[col] = reduced;
                        self.way[col] = current_col;
                    }
                    if self.min_slack[col] < delta {
                        delta = self.min_slack[col];
                        next_col = col;
                    }
                }

                for col in 0..=n {
                    if self.visited[col] {
                        let r = self.col_owner[col];
                        self.row_potential[r] = self.row_potential[r].saturating_add(delta);
                        self.col_potential[col] = self.col_potential[col].saturating_sub(delta);
                    } else {
                        self.min_slack[col] = self.min_slack[col].saturating_sub(delta);
                    }
                }

                current_col = next_col;
                if self.col_owner[current_col] == 0 {
                    break;
                }
            }

            // Flip the alternating path back to the root.
            loop {
                let prev = self.way[current_col];
                self.col_owner[current_col] = self.col_owner[prev];
                current_col = prev;
                if current_col == 0 {
                    break;
                }
            }
        }

        let mut row_to_col = vec![0usize; n];
        for col in 1..=n {
            let row = self.col_owner[col];
            row_to_col[row - 1] = col - 1;
        }

        let weight = row_to_col
            .iter()
            .enumerate()
            .fold(T::zero(), |acc, (row, &col)| {
                acc.saturating_add(costs[row * n + col])
            });

        PerfectMatching { row_to_col, weight }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type IntegerType = i64;

    fn brute_force(costs: &[IntegerType], n: usize) -> IntegerType {
        fn rec(
            costs: &[IntegerType],
            n: usize,
            row: usize,
            used: &mut Vec<bool>,
            acc: IntegerType,
            best: &mut IntegerType,
        ) {
            if row == n {
                *best = (*best).min(acc);
                return;
            }
            for col in 0..n {
                if !used[col] {
                    used[col] = true;
                    rec(costs, n, row + 1, used, acc + costs[row * n + col], best);
                    used[col] = false;
                }
            }
        }
        let mut best = IntegerType::MAX;
        rec(costs, n, 0, &mut vec![false; n], 0, &mut best);
        best
    }

    #[test]
    fn test_empty_matrix_has_zero_weight() {
        let mut solver = HungarianSolver::<IntegerType>::new();
        let m = solver.solve(&[], 0);
        assert!(m.is_empty());
        assert_eq!(m.weight(), 0);
    }

    #[test]
    fn test_known_three_by_three() {
        let costs = [4, 1, 3, 2, 0, 5, 3, 2, 2];
        let mut solver = HungarianSolver::<IntegerType>::new();
        let m = solver.solve(&costs, 3);
        assert_eq!(m.weight(), 5);
        assert_eq!(m.row_to_col(), &[1, 0, 2]);
    }

    #[test]
    fn test_result_is_a_permutation() {
        let costs = [7, 3, 9, 1, 4, 8, 2, 6, 5, 3, 1, 2, 9, 9, 0, 4];
        let mut solver = HungarianSolver::<IntegerType>::preallocated(4);
        let m = solver.solve(&costs, 4);
        let mut cols: Vec<usize> = m.row_to_col().to_vec();
        cols.sort_unstable();
        assert_eq!(cols, vec![0, 1, 2, 3]);
        let recomputed: IntegerType = m.pairs().map(|(r, c)| costs[r * 4 + c]).sum();
        assert_eq!(recomputed, m.weight());
    }

    #[test]
    fn test_sentinel_entries_are_avoided_when_possible() {
        let big = 1_000_000;
        let costs = [big, 5, 1, big];
        let mut solver = HungarianSolver::<IntegerType>::new();
        let m = solver.solve(&costs, 2);
        assert_eq!(m.weight(), 6);
        assert_eq!(m.col_of(0), 1);
        assert_eq!(m.col_of(1), 0);
    }

    #[test]
    fn test_solver_reuse_across_sizes() {
        let mut solver = HungarianSolver::<IntegerType>::new();
        let big = [4, 1, 3, 2, 0, 5, 3, 2, 2];
        assert_eq!(solver.solve(&big, 3).weight(), 5);
        assert_eq!(solver.solve(&[9], 1).weight(), 9);
        assert_eq!(solver.solve(&big, 3).weight(), 5);
    }

    #[test]
    #[should_panic(expected = "called `HungarianSolver::solve` with a non-square matrix")]
    fn test_non_square_panics() {
        let mut solver = HungarianSolver::<IntegerType>::new();
        let _ = solver.solve(&[1, 2, 3], 2);
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force(
            (n, costs) in (1usize..=5).prop_flat_map(|n| {
                (Just(n), proptest::collection::vec(-20i64..50, n * n))
            })
        ) {
            let mut solver = HungarianSolver::<IntegerType>::new();
            let m = solver.solve(&costs, n);
            prop_assert_eq!(m.weight(), brute_force(&costs, n));
        }
    }
}
