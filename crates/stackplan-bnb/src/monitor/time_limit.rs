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
use stackplan_search::{monitor::search_command::SearchCommand, solution::Solution};
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Terminates the search after a wall-clock duration.
///
/// Checks the clock only every `check_interval` commands.
#[derive(Debug, Clone)]
pub struct TimeLimitMonitor<T>
where
    T: PrimInt + Signed,
{
    time_limit: Duration,
    start_time: Option<Instant>,
    check_interval: u64,
    ops_since_last_check: u64,
    _marker: PhantomData<T>,
}

impl<T> TimeLimitMonitor<T>
where
    T: PrimInt + Signed,
{
    pub fn new(time_limit: Duration, check_interval: u64) -> Self {
        Self {
            time_limit,
            start_time: None,
            check_interval: check_interval.max(1),
            ops_since_last_check: 0,
            _marker: PhantomData,
        }
    }

    pub fn with_default_check_interval(time_limit: Duration) -> Self {
        Self::new(time_limit, 256)
    }
}

impl<T> TreeSearchMonitor<T> for TimeLimitMonitor<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_enter_search(&mut self, _instance: &Instance<T>, _stats: &BnbSolverStatistics<T>) {
        self.start_time = Some(Instant::now());
        self.ops_since_last_check = 0;
    }

    fn on_exit_search(&mut self, _stats: &BnbSolverStatistics<T>) {
        self.start_time = None;
    }

    fn search_command(&mut self, _stats: &BnbSolverStatistics<T>) -> SearchCommand {
        self.ops_since_last_check = self.ops_since_last_check.saturating_add(1);
        if self.ops_since_last_check >= self.check_interval {
            self.ops_since_last_check = 0;
            if let Some(start) = self.start_time
                && start.elapsed() > self.time_limit
            {
                return SearchCommand::Terminate(format!(
                    "Time limit of {:.3} seconds exceeded",
                    self.time_limit.as_secs_f64()
                ));
            }
        }
        SearchCommand::Continue
    }

    fn on_step(&mut self, _node: &SearchNode<T>, _stats: &BnbSolverStatistics<T>) {}

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

    fn on_solution_found(&mut self, _solution: &Solution<T>, _stats: &BnbSolverStatistics<T>) {}
}
