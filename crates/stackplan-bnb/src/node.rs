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

//! Search nodes and the best-first frontier.

use num_traits::{PrimInt, Signed};
use stackplan_model::{assignment::Assignment, conflict::ConflictReport};
use std::collections::BinaryHeap;

/// The order in which open nodes are expanded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeOrdering {
    /// Deepest node first, then the lowest bound.
    #[default]
    Combined,
    /// Lowest bound first.
    BestFirst,
    /// Shallowest node first, then the lowest bound.
    BreadthFirst,
}

impl std::fmt::Display for NodeOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeOrdering::Combined => write!(f, "Combined"),
            NodeOrdering::BestFirst => write!(f, "BestFirst"),
            NodeOrdering::BreadthFirst => write!(f, "BreadthFirst"),
        }
    }
}

/// An open node: a partial assignment with its cached bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchNode<T> {
    assignment: Assignment,
    bound: T,
    conflicts: ConflictReport,
    depth: usize,
}

impl<T> SearchNode<T>
where
    T: Copy,
{
    #[inline]
    pub fn new(assignment: Assignment, bound: T, conflicts: ConflictReport, depth: usize) -> Self {
        Self {
            assignment,
            bound,
            conflicts,
            depth,
        }
    }

    #[inline]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// The bound computed when the node was created.
    #[inline]
    pub fn bound(&self) -> T {
        self.bound
    }

    /// Conflicts of the bound's materialized matching; drives branching.
    #[inline]
    pub fn conflicts(&self) -> &ConflictReport {
        &self.conflicts
    }

    /// Number of branching decisions from the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<T> std::fmt::Display for SearchNode<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchNode(depth: {}, bound: {}, assigned: {})",
            self.depth,
            self.bound,
            self.assignment.num_assigned()
        )
    }
}

struct FrontierEntry<T> {
    rank: usize,
    bound: T,
    sequence: u64,
    node: SearchNode<T>,
}

impl<T: Ord> PartialEq for FrontierEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl<T: Ord> Eq for FrontierEntry<T> {}

impl<T: Ord> PartialOrd for FrontierEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// Max-heap: higher rank first, then lower bound, then older entry.
impl<T: Ord> Ord for FrontierEntry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| other.bound.cmp(&self.bound))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Priority queue of open nodes. Ties are broken by insertion order, so the
/// exploration order is deterministic.
pub(crate) struct Frontier<T> {
    ordering: NodeOrdering,
    heap: BinaryHeap<FrontierEntry<T>>,
    next_sequence: u64,
}

impl<T> Frontier<T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub(crate) fn new(ordering: NodeOrdering) -> Self {
        Self {
            ordering,
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    #[inline]
    fn rank(&self, depth: usize) -> usize {
        match self.ordering {
            NodeOrdering::Combined => depth,
            NodeOrdering::BestFirst => 0,
            NodeOrdering::BreadthFirst => usize::MAX - depth,
        }
    }

    pub(crate) fn push(&mut self, node: SearchNode<T>) {
        let entry = FrontierEntry {
            rank: self.rank(node.depth),
            bound: node.bound,
            sequence: self.next_sequence,
            node,
        };
        self.next_sequence += 1;
        self.heap.push(entry);
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<SearchNode<T>> {
        self.heap.pop().map(|entry| entry.node)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_model::instance::InstanceBuilder;

    type IntegerType = i64;

    fn node(bound: IntegerType, depth: usize) -> SearchNode<IntegerType> {
        let inst = InstanceBuilder::<IntegerType>::new(0, 1, 1).build().unwrap();
        let a = Assignment::for_instance(&inst);
        let conflicts = ConflictReport::compute(&inst, &a);
        SearchNode::new(a, bound, conflicts, depth)
    }

    fn drain(frontier: &mut Frontier<IntegerType>) -> Vec<(IntegerType, usize)> {
        std::iter::from_fn(|| frontier.pop())
            .map(|n| (n.bound(), n.depth()))
            .collect()
    }

    fn fill(ordering: NodeOrdering) -> Frontier<IntegerType> {
        let mut f = Frontier::new(ordering);
        for (bound, depth) in [(5, 1), (3, 1), (9, 2), (3, 2), (1, 0)] {
            f.push(node(bound, depth));
        }
        f
    }

    #[test]
    fn test_combined_prefers_depth_then_bound() {
        let mut f = fill(NodeOrdering::Combined);
        assert_eq!(f.len(), 5);
        assert_eq!(drain(&mut f), vec![(3, 2), (9, 2), (3, 1), (5, 1), (1, 0)]);
    }

    #[test]
    fn test_best_first_prefers_bound() {
        let mut f = fill(NodeOrdering::BestFirst);
        assert_eq!(drain(&mut f), vec![(1, 0), (3, 1), (3, 2), (5, 1), (9, 2)]);
    }

    #[test]
    fn test_breadth_first_prefers_shallow() {
        let mut f = fill(NodeOrdering::BreadthFirst);
        assert_eq!(drain(&mut f), vec![(1, 0), (3, 1), (5, 1), (3, 2), (9, 2)]);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut f = Frontier::new(NodeOrdering::BestFirst);
        f.push(node(4, 7));
        f.push(node(4, 3));
        f.push(node(4, 5));
        assert_eq!(drain(&mut f), vec![(4, 7), (4, 3), (4, 5)]);
    }
}
