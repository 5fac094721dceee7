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

//! Tree search monitoring interface
//!
//! Declares the `TreeSearchMonitor` trait and `PruneReason`. Callbacks track
//! the solver lifecycle, and a monitor can stop the run through
//! `SearchCommand` (default: Continue).
//!
//! Lifecycle
//! - enter → {command → step → (bound | prune | promotion | solution)* → children} → exit
//! - `BnbSolverStatistics` is provided to every callback for telemetry.

use crate::{bound::Bound, node::SearchNode, stats::BnbSolverStatistics};
use num_traits::{PrimInt, Signed};
use stackplan_model::{assignment::Assignment, instance::Instance};
use stackplan_search::{monitor::search_command::SearchCommand, solution::Solution};

/// Reasons for discarding a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PruneReason {
    /// No feasible completion exists.
    Infeasible,
    /// The bound is not below the incumbent.
    BoundDominated,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::Infeasible => write!(f, "Infeasible"),
            PruneReason::BoundDominated => write!(f, "BoundDominated"),
        }
    }
}

/// Trait for monitoring and controlling the branch-and-bound search.
pub trait TreeSearchMonitor<T>
where
    T: PrimInt + Signed,
{
    /// Returns the name of the monitor.
    fn name(&self) -> &str;
    /// Called when the search starts.
    fn on_enter_search(&mut self, instance: &Instance<T>, statistics: &BnbSolverStatistics<T>);
    /// Called when the search ends.
    fn on_exit_search(&mut self, statistics: &BnbSolverStatistics<T>);
    /// Called before every node is taken from the frontier.
    fn search_command(&mut self, _statistics: &BnbSolverStatistics<T>) -> SearchCommand {
        SearchCommand::Continue
    }
    /// Called for every node taken from the frontier.
    fn on_step(&mut self, node: &SearchNode<T>, statistics: &BnbSolverStatistics<T>);
    /// Called when a bound is computed for a partial assignment.
    fn on_lower_bound_computed(
        &mut self,
        assignment: &Assignment,
        bound: &Bound<T>,
        statistics: &BnbSolverStatistics<T>,
    );
    /// Called when a partial assignment is discarded.
    fn on_prune(
        &mut self,
        assignment: &Assignment,
        reason: PruneReason,
        statistics: &BnbSolverStatistics<T>,
    );
    /// Called after a node has been expanded.
    fn on_children_enqueued(
        &mut self,
        node: &SearchNode<T>,
        count: usize,
        statistics: &BnbSolverStatistics<T>,
    );
    /// Called when a bound reports a feasible completion.
    fn on_promotion(&mut self, completion: &Assignment, tight: bool, statistics: &BnbSolverStatistics<T>);
    /// Called when a new incumbent is installed.
    fn on_solution_found(&mut self, solution: &Solution<T>, statistics: &BnbSolverStatistics<T>);
}

impl<T> std::fmt::Debug for dyn TreeSearchMonitor<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeSearchMonitor({})", self.name())
    }
}

impl<T> std::fmt::Display for dyn TreeSearchMonitor<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeSearchMonitor({})", self.name())
    }
}
