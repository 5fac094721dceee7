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

//! stackplan-bnb: exact branch-and-bound for the stacking problem
//!
//! Core flow
//! - Build a `stackplan_model::instance::Instance<T>`.
//! - Optionally pick a `node::NodeOrdering` and a repair cap via `bnb::BnbConfig`.
//! - Attach a `monitor::tree_search_monitor::TreeSearchMonitor` (no-op, log,
//!   time limit, or a composite of those).
//! - Run `bnb::BranchAndBoundSolver::solve`, optionally seeded with a heuristic
//!   incumbent.
//!
//! Guarantees
//! - The matching bound never overestimates, so pruning is exact.
//! - A completion is only used to close a subtree when its cost equals the
//!   bound.
//! - Deterministic: frontier ties are broken by insertion order.
//!
//! Module map
//! - `bnb`: the solver engine and session orchestration.
//! - `bound`: the matching lower bound with repair.
//! - `node`: search nodes and frontier ordering.
//! - `monitor`: tree-search monitors.
//! - `result`: solver outcomes with termination reasons.
//! - `stats`: lightweight counters and timing.

pub mod bnb;
pub mod bound;
pub mod monitor;
pub mod node;
pub mod result;
pub mod stats;

#[cfg(test)]
mod test_support;
