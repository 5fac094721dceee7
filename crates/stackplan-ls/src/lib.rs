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

//! stackplan-ls: local search for the stacking problem
//!
//! Core flow
//! - Draw a feasible start from a `stackplan_search::supplier::FeasibleAssignmentSupplier`.
//! - Pick a metaheuristic: `meta::tabu_search::TabuSearch` or
//!   `meta::hill_climbing::HillClimbing`, both driving the Shift, Swap and
//!   EjectionChain operators through `meta::variable::VariableNeighborhood`.
//! - Run `engine::LocalSearchEngine::run` with a `LocalSearchConfig`
//!   (stopping criterion, time limit, known optimum, stack matching).
//! - For several independent starts use `multistart::MultiStart`.
//!
//! Guarantees
//! - Every adopted neighbor is feasible.
//! - The reported best is never worse than the start.
//! - Runs are reproducible for a fixed RNG seed.
//!
//! Module map
//! - `operator`: neighborhood operators and their candidates.
//! - `tabu`: the bounded FIFO tabu list.
//! - `meta`: metaheuristics and the variable neighborhood.
//! - `engine`: the outer driver and stopping criteria.
//! - `stack_matching`: column relabeling by minimum-cost matching.
//! - `multistart`: parallel independent runs.
//! - `monitor`: local search monitors.
//! - `result`, `stats`: outcomes and counters.

pub mod engine;
pub mod meta;
pub mod monitor;
pub mod multistart;
pub mod operator;
pub mod result;
pub mod stack_matching;
pub mod stats;
pub mod tabu;

#[cfg(test)]
mod test_support;
