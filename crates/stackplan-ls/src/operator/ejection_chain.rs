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

//! The Ejection Chain Operator.
//!
//! Each call draws a random order of the stacks and builds a weighted DAG on
//! top of it:
//!
//! * `Source`, then for every stack in drawn order its items bottom to top,
//!   followed by a `Stack` vertex if the stack has a free slot. Edges only run
//!   from earlier to later vertices, so this order is topological.
//! * `Source -> Item(i)`: evict `i`, weight `-cost[i][s_i]`.
//! * `Item(i) -> Item(j)`, `j` in a later stack: `i` takes the cell of `j`,
//!   which is evicted, weight `cost[i][s_j] - cost[j][s_j]`. Requires `i` to
//!   be eligible on `s_j` and compatible with the column of `s_j` minus `j`.
//! * `Item(i) -> Stack(s)`, `s` later than the stack of `i`: `i` lands in the
//!   free slot, weight `cost[i][s]`. Requires eligibility and compatibility.
//! * `Stack(s) -> Item(j)`, `j` in a later stack: the chain continues by
//!   evicting `j`, weight `-cost[j][s_j]`.
//!
//! A path from `Source` to a `Stack` vertex is a chain of relocations that
//! keeps every item placed; its weight is the net cost change. One relaxation
//! pass in topological order finds the cheapest such path, which is applied
//! only if its weight is strictly negative. Past the first eviction, the
//! stack rank strictly increases along a path, so every column is touched at
//! most once and the compatibility checks made on the original columns still
//! hold when the chain is applied.

use crate::operator::{MoveList, NeighborOutcome, NeighborhoodOperator};
use rand::{Rng, seq::SliceRandom};
use smallvec::SmallVec;
use stackplan_model::{
    assignment::Assignment,
    index::{ItemIndex, StackIndex},
    instance::Instance,
    moves::Move,
    oracle::CompatibilityOracle,
};
use stackplan_search::num::SolverNumeric;

/// A vertex of the ejection chain graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertex {
    Source,
    Item(ItemIndex),
    Stack(StackIndex),
}

impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vertex::Source => write!(f, "Source"),
            Vertex::Item(item) => write!(f, "Item({})", item.get()),
            Vertex::Stack(stack) => write!(f, "Stack({})", stack.get()),
        }
    }
}

/// Searches for the cheapest improving chain of linked relocations.
///
/// The graph buffers are kept between calls.
#[derive(Debug, Clone)]
pub struct EjectionChainOperator<T> {
    stack_order: Vec<StackIndex>,
    vertices: Vec<Vertex>,
    vertex_rank: Vec<usize>,
    dist: Vec<Option<T>>,
    pred: Vec<usize>,
    path: Vec<usize>,
}

impl<T> Default for EjectionChainOperator<T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EjectionChainOperator<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            stack_order: Vec::new(),
            vertices: Vec::new(),
            vertex_rank: Vec::new(),
            dist: Vec::new(),
            pred: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Creates an operator with buffers sized for `num_items` items and
    /// `num_stacks` stacks.
    #[inline]
    pub fn preallocated(num_items: usize, num_stacks: usize) -> Self {
        let num_vertices = 1 + num_items + num_stacks;
        Self {
            stack_order: Vec::with_capacity(num_stacks),
            vertices: Vec::with_capacity(num_vertices),
            vertex_rank: Vec::with_capacity(num_vertices),
            dist: Vec::with_capacity(num_vertices),
            pred: Vec::with_capacity(num_vertices),
            path: Vec::with_capacity(num_vertices),
        }
    }

    /// Returns the stack a non-source vertex belongs to.
    #[inline]
    fn stack_of_vertex(&self, v: usize) -> StackIndex {
        self.stack_order[self.vertex_rank[v]]
    }

    fn build_vertices(&mut self, current: &Assignment) {
        self.vertices.clear();
        self.vertex_rank.clear();
        self.vertices.push(Vertex::Source);
        self.vertex_rank.push(0);

        for (rank, &stack) in self.stack_order.iter().enumerate() {
            for &item in current.column(stack).iter().flatten() {
                self.vertices.push(Vertex::Item(item));
                self.vertex_rank.push(rank);
            }
            if current.has_free_slot(stack) {
                self.vertices.push(Vertex::Stack(stack));
                self.vertex_rank.push(rank);
            }
        }
    }

    /// Returns the weight of the edge `u -> v`, or `None` if there is none.
    fn edge_weight(
        &self,
        oracle: &CompatibilityOracle<'_, T>,
        current: &Assignment,
        u: usize,
        v: usize,
    ) -> Option<T> {
        let instance = oracle.instance();
        let later = self.vertex_rank[v] > self.vertex_rank[u];
        match (self.vertices[u], self.vertices[v]) {
            (Vertex::Source, Vertex::Item(j)) => Some(-instance.cost(j, self.stack_of_vertex(v))),
            (Vertex::Item(i), Vertex::Item(j)) if later => {
                let stack = self.stack_of_vertex(v);
                (oracle.stack_eligible(i, stack)
                    && oracle.column_compatible(i, current.column(stack), Some(j)))
                .then(|| instance.cost(i, stack) - instance.cost(j, stack))
            }
            (Vertex::Item(i), Vertex::Stack(stack)) if later => {
                (oracle.stack_eligible(i, stack)
                    && oracle.column_compatible(i, current.column(stack), None))
                .then(|| instance.cost(i, stack))
            }
            (Vertex::Stack(_), Vertex::Item(j)) if later => {
                Some(-instance.cost(j, self.stack_of_vertex(v)))
            }
            _ => None,
        }
    }

    /// Relaxes every edge once in topological order and returns the cheapest
    /// stack vertex reached with a strictly negative distance.
    fn shortest_chain(&mut self, instance: &Instance<T>, current: &Assignment) -> Option<(usize, T)> {
        let oracle = CompatibilityOracle::new(instance);
        let n = self.vertices.len();
        self.dist.clear();
        self.dist.resize(n, None);
        self.pred.clear();
        self.pred.resize(n, 0);
        self.dist[0] = Some(T::zero());

        for u in 0..n {
            let Some(du) = self.dist[u] else {
                continue;
            };
            for v in (u + 1)..n {
                let Some(weight) = self.edge_weight(&oracle, current, u, v) else {
                    continue;
                };
                let candidate = du + weight;
                if self.dist[v].is_none_or(|dv| candidate < dv) {
                    self.dist[v] = Some(candidate);
                    self.pred[v] = u;
                }
            }
        }

        let mut best: Option<(usize, T)> = None;
        for (v, vertex) in self.vertices.iter().enumerate() {
            if let (Vertex::Stack(_), Some(d)) = (vertex, self.dist[v])
                && d < T::zero()
                && best.is_none_or(|(_, bd)| d < bd)
            {
                best = Some((v, d));
            }
        }
        best
    }

    fn trace_path(&mut self, target: usize) {
        self.path.clear();
        let mut v = target;
        while v != 0 {
            self.path.push(v);
            v = self.pred[v];
        }
        self.path.push(0);
        self.path.reverse();
    }

    /// Applies the traced path to a clone of `current`. Returns `None` if an
    /// item cannot be put down, leaving `current` untouched.
    fn apply_chain(&self, current: &Assignment) -> Option<(Assignment, MoveList)> {
        let mut next = current.clone();
        let mut moves = MoveList::new();
        let mut pending: SmallVec<[(ItemIndex, StackIndex); 2]> = SmallVec::new();

        for edge in self.path.windows(2) {
            match (self.vertices[edge[0]], self.vertices[edge[1]]) {
                (Vertex::Source, Vertex::Item(first)) => {
                    next.remove(first)?;
                }
                (Vertex::Item(i), Vertex::Item(j)) => {
                    let cell = next.remove(j)?;
                    next.place_at(i, cell.stack(), cell.level());
                    moves.push(Move::new(i, cell.stack()));
                }
                (Vertex::Item(i), Vertex::Stack(stack)) => {
                    if next.has_free_slot(stack) {
                        next.place(i, stack);
                    } else {
                        pending.push((i, stack));
                    }
                    moves.push(Move::new(i, stack));
                }
                (Vertex::Stack(stack), Vertex::Item(j)) => {
                    next.remove(j)?;
                    if let Some(pos) = pending.iter().position(|&(_, s)| s == stack)
                        && next.has_free_slot(stack)
                    {
                        let (item, stack) = pending.remove(pos);
                        next.place(item, stack);
                    }
                }
                _ => return None,
            }
        }

        for (item, stack) in pending {
            if !next.has_free_slot(stack) {
                return None;
            }
            next.place(item, stack);
        }
        Some((next, moves))
    }

    /// Runs one search over the stack order currently stored.
    fn search(&mut self, instance: &Instance<T>, current: &Assignment) -> NeighborOutcome<T> {
        self.build_vertices(current);
        let Some((target, delta)) = self.shortest_chain(instance, current) else {
            return NeighborOutcome::NoMove;
        };
        self.trace_path(target);

        let Some((next, moves)) = self.apply_chain(current) else {
            tracing::warn!(
                chain_len = self.path.len(),
                "ejection chain could not be applied, discarding it"
            );
            return NeighborOutcome::NoMove;
        };
        debug_assert_eq!(
            next.num_assigned(),
            current.num_assigned(),
            "called `EjectionChainOperator::search` with a chain that changed the number of placed items"
        );
        tracing::trace!(
            delta = %delta,
            moves = moves.len(),
            "ejection chain found"
        );
        NeighborOutcome::finish(instance, next, moves)
    }
}

impl<T> NeighborhoodOperator<T> for EjectionChainOperator<T>
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        "EjectionChainOperator"
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
        self.stack_order.clear();
        self.stack_order.extend(instance.stacks());
        self.stack_order.shuffle(rng);
        self.search(instance, current)
    }
}
