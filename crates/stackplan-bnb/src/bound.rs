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

//! Matching-based lower bound.
//!
//! For a partial assignment, every unassigned item is matched to a distinct
//! free slot at minimum total cost. An edge costs `cost[item][stack]` when the
//! item is eligible for the stack and compatible with the items already in its
//! column; every other edge carries the instance sentinel. Because the slot
//! weight ignores the level, any feasible completion induces a matching, so
//! `fixed cost + matching weight` never overestimates. Whether the free items
//! fit at all is decided by a separate cardinality check over usable edges,
//! since a cheap sentinel edge can undercut a feasible but expensive matching.
//!
//! The matching is then materialized into a copy of the assignment. If the
//! copy is feasible it is a completion whose cost equals the bound (tight).
//! Otherwise a bounded repair loop evicts the most conflicted free items and
//! rematches them against the copy's current columns, until the copy becomes
//! feasible, nothing changes, or `max_repair_passes` is reached.

use fixedbitset::FixedBitSet;
use num_traits::{PrimInt, Signed};
use stackplan_core::algorithm::hungarian::HungarianSolver;
use stackplan_model::{
    assignment::{Assignment, SlotPosition},
    conflict::ConflictReport,
    index::ItemIndex,
    instance::Instance,
    oracle::CompatibilityOracle,
};

/// Configuration of the `MatchingBound`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchingBoundConfig {
    /// Upper limit on repair iterations per bound computation.
    pub max_repair_passes: usize,
}

impl MatchingBoundConfig {
    pub const DEFAULT_MAX_REPAIR_PASSES: usize = 16;

    #[inline]
    pub fn new(max_repair_passes: usize) -> Self {
        Self { max_repair_passes }
    }
}

impl Default for MatchingBoundConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_REPAIR_PASSES)
    }
}

impl std::fmt::Display for MatchingBoundConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MatchingBoundConfig(max_repair_passes: {})",
            self.max_repair_passes
        )
    }
}

/// The result of one bound computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bound<T> {
    value: T,
    relaxation_feasible: bool,
    completion: Option<Assignment>,
    conflicts: ConflictReport,
    tight: bool,
    repair_passes: usize,
}

impl<T> Bound<T>
where
    T: Copy,
{
    /// The lower bound on the cost of any completion.
    #[inline]
    pub fn value(&self) -> T {
        self.value
    }

    /// Returns `false` if the unassigned items cannot all be matched to
    /// distinct free slots over usable edges. No feasible completion exists
    /// in that case.
    #[inline]
    pub fn is_relaxation_feasible(&self) -> bool {
        self.relaxation_feasible
    }

    /// A feasible, complete assignment extending the partial one, if found.
    #[inline]
    pub fn completion(&self) -> Option<&Assignment> {
        self.completion.as_ref()
    }

    /// Conflicts of the materialized matching after repair.
    #[inline]
    pub fn conflicts(&self) -> &ConflictReport {
        &self.conflicts
    }

    /// Returns `true` if the completion costs exactly `value`.
    #[inline]
    pub fn is_tight(&self) -> bool {
        self.tight
    }

    #[inline]
    pub fn repair_passes(&self) -> usize {
        self.repair_passes
    }

    /// Splits the bound into its completion and conflict report.
    #[inline]
    pub fn into_parts(self) -> (Option<Assignment>, ConflictReport) {
        (self.completion, self.conflicts)
    }
}

/// A matched edge between an item and a free slot.
#[derive(Clone, Copy, Debug)]
struct MatchedEdge {
    item: ItemIndex,
    slot: SlotPosition,
}

/// Computes matching bounds, reusing its buffers across calls.
#[derive(Clone, Debug)]
pub struct MatchingBound<T>
where
    T: PrimInt + Signed,
{
    config: MatchingBoundConfig,
    hungarian: HungarianSolver<T>,
    weights: Vec<T>,
    rows: Vec<ItemIndex>,
    cols: Vec<SlotPosition>,
    edges: Vec<MatchedEdge>,
}

impl<T> Default for MatchingBound<T>
where
    T: PrimInt + Signed,
{
    fn default() -> Self {
        Self::new(MatchingBoundConfig::default())
    }
}

impl<T> MatchingBound<T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new(config: MatchingBoundConfig) -> Self {
        Self {
            config,
            hungarian: HungarianSolver::new(),
            weights: Vec::new(),
            rows: Vec::new(),
            cols: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Creates a bound with buffers sized for an instance with `num_slots`
    /// slots in total.
    #[inline]
    pub fn preallocated(num_slots: usize, config: MatchingBoundConfig) -> Self {
        Self {
            config,
            hungarian: HungarianSolver::preallocated(num_slots),
            weights: Vec::with_capacity(num_slots * num_slots),
            rows: Vec::with_capacity(num_slots),
            cols: Vec::with_capacity(num_slots),
            edges: Vec::with_capacity(num_slots),
        }
    }

    #[inline]
    pub fn config(&self) -> &MatchingBoundConfig {
        &self.config
    }

    /// Computes the bound of `partial`.
    pub fn compute(&mut self, instance: &Instance<T>, partial: &Assignment) -> Bound<T> {
        let fixed_cost = partial.cost(instance);

        self.rows.clear();
        self.rows.extend(partial.unassigned_items());
        if self.rows.is_empty() {
            let mut done = partial.clone();
            done.repair_gravity();
            done.reorder_by_constraints(instance);
            let feasible = done.is_feasible(instance);
            return Bound {
                value: fixed_cost,
                relaxation_feasible: feasible,
                conflicts: ConflictReport::compute(instance, &done),
                completion: feasible.then_some(done),
                tight: feasible,
                repair_passes: 0,
            };
        }

        self.cols.clear();
        self.cols.extend(partial.free_slots());
        let (weight, relaxation_feasible) = self.solve_matching(instance, partial);
        let value = fixed_cost.saturating_add(weight);

        if !relaxation_feasible {
            return Bound {
                value,
                relaxation_feasible,
                completion: None,
                conflicts: ConflictReport::compute(instance, partial),
                tight: false,
                repair_passes: 0,
            };
        }

        let mut copy = partial.clone();
        for edge in &self.edges {
            copy.place_at(edge.item, edge.slot.stack(), edge.slot.level());
        }
        let repair_passes = self.repair(instance, partial, &mut copy);

        let conflicts = ConflictReport::compute(instance, &copy);
        let completion = copy.is_feasible(instance).then_some(copy);
        let tight = completion
            .as_ref()
            .is_some_and(|c| c.cost(instance) == value);

        Bound {
            value,
            relaxation_feasible,
            completion,
            conflicts,
            tight,
            repair_passes,
        }
    }

    /// Matches `self.rows` against `self.cols` with edges weighted against
    /// the columns of `basis`. Fills `self.edges` with the usable real pairs
    /// and returns the matching weight and whether every row got a usable slot.
    fn solve_matching(&mut self, instance: &Instance<T>, basis: &Assignment) -> (T, bool) {
        let oracle = CompatibilityOracle::new(instance);
        let sentinel = instance.sentinel();
        let n = self.rows.len().max(self.cols.len());

        self.weights.clear();
        self.weights.resize(n * n, T::zero());
        for (r, &item) in self.rows.iter().enumerate() {
            for (c, slot) in self.cols.iter().enumerate() {
                let stack = slot.stack();
                let usable = oracle.stack_eligible(item, stack)
                    && oracle.column_compatible(item, basis.column(stack), None);
                self.weights[r * n + c] = if usable {
                    instance.cost(item, stack)
                } else {
                    sentinel
                };
            }
        }

        let matching = self.hungarian.solve(&self.weights, n);

        self.edges.clear();
        let mut all_usable = true;
        for (r, &item) in self.rows.iter().enumerate() {
            let c = matching.col_of(r);
            let Some(&slot) = self.cols.get(c) else {
                all_usable = false;
                continue;
            };
            let usable = self.weights[r * n + c] < sentinel;
            all_usable &= usable;
            if usable {
                self.edges.push(MatchedEdge { item, slot });
            }
        }
        let weight = matching.weight();
        if all_usable {
            return (weight, true);
        }
        (weight, self.covers_rows_with_usable_edges(sentinel, n))
    }

    /// Decides whether every row can be matched over usable edges alone.
    ///
    /// A minimum-weight matching may prefer one sentinel edge over several
    /// expensive usable ones, so its use of a sentinel edge does not prove
    /// that a usable matching is missing. Rewrites `self.weights` into a 0/1
    /// matrix (1 marks an unusable real pair) and checks that the minimum
    /// matching has weight zero.
    fn covers_rows_with_usable_edges(&mut self, sentinel: T, n: usize) -> bool {
        let rows = self.rows.len();
        let cols = self.cols.len();
        if rows > cols {
            return false;
        }
        for r in 0..n {
            for c in 0..n {
                let w = &mut self.weights[r * n + c];
                *w = if r < rows && c < cols && *w >= sentinel {
                    T::one()
                } else {
                    T::zero()
                };
            }
        }
        self.hungarian.solve(&self.weights, n).weight() == T::zero()
    }

    /// Repairs `copy` in place. Items assigned in `fixed` never move between
    /// stacks. Returns the number of passes run.
    fn repair(&mut self, instance: &Instance<T>, fixed: &Assignment, copy: &mut Assignment) -> usize {
        let oracle = CompatibilityOracle::new(instance);
        let num_stacks = instance.num_stacks();
        let mut applied = FixedBitSet::with_capacity(instance.num_items() * num_stacks);
        let mut origins = Vec::new();
        let mut passes = 0;

        loop {
            copy.repair_gravity();
            copy.reorder_by_constraints(instance);
            if copy.is_feasible(instance) || passes >= self.config.max_repair_passes {
                break;
            }

            let report = ConflictReport::compute(instance, copy);
            let budget = copy.num_free_slots();
            self.rows.clear();
            self.rows.extend(copy.unassigned_items());
            self.rows.extend(
                report
                    .ranked()
                    .into_iter()
                    .map(|(item, _)| item)
                    .filter(|&item| !fixed.is_assigned(item))
                    .take(budget),
            );
            if self.rows.is_empty() {
                break;
            }

            origins.clear();
            origins.extend(self.rows.iter().map(|&item| copy.remove(item).map(|p| p.stack())));
            copy.repair_gravity();

            self.cols.clear();
            self.cols.extend(copy.free_slots());
            self.solve_matching(instance, copy);

            let mut changed = false;
            for edge in &self.edges {
                let key = edge.item.get() * num_stacks + edge.slot.stack().get();
                if !applied.contains(key)
                    && oracle.can_place(edge.item, copy, edge.slot.stack())
                {
                    applied.insert(key);
                    copy.place(edge.item, edge.slot.stack());
                    changed = true;
                }
            }

            // Evicted items that found no new slot go back where they were.
            for (&item, origin) in self.rows.iter().zip(&origins) {
                if copy.is_assigned(item) {
                    continue;
                }
                if let Some(stack) = *origin
                    && oracle.can_place(item, copy, stack)
                {
                    copy.place(item, stack);
                }
            }

            passes += 1;
            if !changed {
                break;
            }
        }

        copy.repair_gravity();
        copy.reorder_by_constraints(instance);
        tracing::trace!(passes, complete = copy.is_complete(), "bound repair finished");
        passes
    }
}
