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

use crate::{
    bound::Bound,
    monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor},
    node::SearchNode,
    stats::BnbSolverStatistics,
};
use num_traits::{PrimInt, Signed};
use stackplan_model::{assignment::Assignment, instance::Instance};
use stackplan_search::solution::Solution;
use std::time::{Duration, Instant};

/// Emits a progress line through `tracing` at most once per `log_interval`.
/// The clock is read only when `nodes_explored & clock_check_mask == 0`.
#[derive(Debug, Clone)]
pub struct LogTreeSearchMonitor<T>
where
    T: std::fmt::Display + std::fmt::Debug + PrimInt + Signed,
{
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    best_objective: Option<T>,
}

impl<T> LogTreeSearchMonitor<T>
where
    T: std::fmt::Display + std::fmt::Debug + PrimInt + Signed,
{
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
            best_objective: None,
        }
    }

    fn log_line(&mut self, node: &SearchNode<T>, stats: &BnbSolverStatistics<T>) {
        let now = Instant::now();
        tracing::info!(
            elapsed_secs = now.duration_since(self.start_time).as_secs_f32(),
            nodes = stats.nodes_explored,
            depth = node.depth(),
            node_bound = %node.bound(),
            best = ?self.best_objective,
            pruned_bound = stats.prunings_bound,
            pruned_infeasible = stats.prunings_infeasible,
            "branch-and-bound progress"
        );
        self.last_log_time = now;
    }
}

impl<T> Default for LogTreeSearchMonitor<T>
where
    T: std::fmt::Display + std::fmt::Debug + PrimInt + Signed,
{
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 1023)
    }
}

impl<T> std::fmt::Display for LogTreeSearchMonitor<T>
where
    T: std::fmt::Display + std::fmt::Debug + PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogTreeSearchMonitor(log_interval: {}s, clock_check_mask: {})",
            self.log_interval.as_secs(),
            self.clock_check_mask
        )
    }
}

impl<T> TreeSearchMonitor<T> for LogTreeSearchMonitor<T>
where
    T: std::fmt::Display + std::fmt::Debug + PrimInt + Signed,
{
    fn name(&self) -> &str {
        "LogTreeSearchMonitor"
    }

    fn on_enter_search(&mut self, instance: &Instance<T>, _stats: &BnbSolverStatistics<T>) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.best_objective = None;
        tracing::info!(
            items = instance.num_items(),
            stacks = instance.num_stacks(),
            capacity = instance.capacity(),
            "branch-and-bound started"
        );
    }

    fn on_exit_search(&mut self, stats: &BnbSolverStatistics<T>) {
        tracing::info!(
            nodes = stats.nodes_explored,
            solutions = stats.solutions_found,
            best = ?self.best_objective,
            elapsed = ?stats.time_total,
            "branch-and-bound finished"
        );
    }

    fn on_step(&mut self, node: &SearchNode<T>, stats: &BnbSolverStatistics<T>) {
        if (stats.nodes_explored & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            self.log_line(node, stats);
        }
    }

    fn on_lower_bound_computed(
        &mut self,
        _assignment: &Assignment,
        _bound: &Bound<T>,
        _stats: &BnbSolverStatistics<T>,
    ) {
    }

    fn on_prune(
        &mut self,
        _assignment: &Assignment,
        _reason: PruneReason,
        _stats: &BnbSolverStatistics<T>,
    ) {
    }

    fn on_children_enqueued(
        &mut self,
        _node: &SearchNode<T>,
        _count: usize,
        _stats: &BnbSolverStatistics<T>,
    ) {
    }

    fn on_promotion(&mut self, _completion: &Assignment, _tight: bool, _stats: &BnbSolverStatistics<T>) {}

    fn on_solution_found(&mut self, solution: &Solution<T>, stats: &BnbSolverStatistics<T>) {
        let objective = solution.objective_value();
        self.best_objective = Some(objective);
        tracing::debug!(
            %objective,
            nodes = stats.nodes_explored,
            "new incumbent"
        );
    }
}
