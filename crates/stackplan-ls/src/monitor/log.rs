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

use crate::{monitor::local_search_monitor::LocalSearchMonitor, stats::LocalSearchStatistics};
use stackplan_search::{num::SolverNumeric, solution::Solution};
use std::time::{Duration, Instant};

/// Emits a progress line through `tracing` at most once per `log_interval`.
/// The clock is read only when `iterations & clock_check_mask == 0`.
#[derive(Debug, Clone)]
pub struct LogSearchMonitor<T>
where
    T: SolverNumeric,
{
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    best_objective: Option<T>,
}

impl<T> LogSearchMonitor<T>
where
    T: SolverNumeric,
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

    #[inline]
    pub fn best_objective(&self) -> Option<T> {
        self.best_objective
    }
}

impl<T> Default for LogSearchMonitor<T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 255)
    }
}

impl<T> std::fmt::Display for LogSearchMonitor<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogSearchMonitor(log_interval: {}s, clock_check_mask: {})",
            self.log_interval.as_secs(),
            self.clock_check_mask
        )
    }
}

impl<T> LocalSearchMonitor<T> for LogSearchMonitor<T>
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        "LogSearchMonitor"
    }

    fn on_start(&mut self, initial: &Solution<T>) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.best_objective = Some(initial.objective_value());
        tracing::info!(
            initial = %initial.objective_value(),
            "local search started"
        );
    }

    fn on_end(&mut self, best: &Solution<T>, statistics: &LocalSearchStatistics) {
        tracing::info!(
            best = %best.objective_value(),
            iterations = statistics.iterations,
            iteration_of_best = statistics.iteration_of_best,
            tabu_list_clears = statistics.tabu_list_clears,
            elapsed = ?statistics.time_total,
            "local search finished"
        );
    }

    fn on_step(&mut self, current: &Solution<T>, statistics: &LocalSearchStatistics) {
        if (statistics.iterations & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            let now = Instant::now();
            tracing::info!(
                elapsed_secs = now.duration_since(self.start_time).as_secs_f32(),
                iterations = statistics.iterations,
                current = %current.objective_value(),
                best = ?self.best_objective,
                "local search progress"
            );
            self.last_log_time = now;
        }
    }

    fn on_new_best(&mut self, best: &Solution<T>, statistics: &LocalSearchStatistics) {
        let objective = best.objective_value();
        self.best_objective = Some(objective);
        tracing::debug!(
            %objective,
            iteration = statistics.iterations,
            "new best solution"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_model::assignment::Assignment;
    use stackplan_search::monitor::search_command::SearchCommand;

    #[test]
    fn test_tracks_best_objective() {
        let mut monitor = LogSearchMonitor::<i64>::default();
        let stats = LocalSearchStatistics::default();
        monitor.on_start(&Solution::new(10, Assignment::new(0, 1, 1)));
        assert_eq!(monitor.best_objective(), Some(10));
        monitor.on_new_best(&Solution::new(4, Assignment::new(0, 1, 1)), &stats);
        assert_eq!(monitor.best_objective(), Some(4));
        monitor.on_step(&Solution::new(6, Assignment::new(0, 1, 1)), &stats);
        assert_eq!(
            LocalSearchMonitor::<i64>::search_command(&mut monitor, &stats),
            SearchCommand::Continue
        );
    }
}
