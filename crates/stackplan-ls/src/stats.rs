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

//! Statistics reporting for local search runs.
//!
//! Counters are updated once per outer iteration with saturating arithmetic.
//! Besides the raw counts the engine records when the best solution was found,
//! both as an iteration number and as elapsed time, which is what experiment
//! reports compare across runs.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LocalSearchStatistics {
    /// Number of outer iterations performed.
    pub iterations: u64,

    /// Number of neighbors adopted as the current solution.
    pub accepted_solutions: u64,

    /// Number of times the best solution improved.
    pub improvements: u64,

    /// Iteration in which the best solution was last improved.
    pub iteration_of_best: u64,

    /// Elapsed time when the best solution was last improved.
    pub time_to_best: Duration,

    /// Number of tabu list clears reported by the metaheuristic.
    pub tabu_list_clears: u64,

    /// Total time taken by the local search.
    pub time_total: Duration,
}

impl LocalSearchStatistics {
    #[inline]
    pub fn on_iteration(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }

    #[inline]
    pub fn on_accepted_solution(&mut self) {
        self.accepted_solutions = self.accepted_solutions.saturating_add(1);
    }

    /// Records an improvement of the best solution at the current iteration.
    #[inline]
    pub fn on_improvement(&mut self, elapsed: Duration) {
        self.improvements = self.improvements.saturating_add(1);
        self.iteration_of_best = self.iterations;
        self.time_to_best = elapsed;
    }

    #[inline]
    pub fn set_tabu_list_clears(&mut self, clears: u64) {
        self.tabu_list_clears = clears;
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    /// Iterations since the best solution last improved.
    #[inline]
    pub fn non_improving_iterations(&self) -> u64 {
        self.iterations.saturating_sub(self.iteration_of_best)
    }
}

impl std::fmt::Display for LocalSearchStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Stackplan-LS Statistics:")?;
        writeln!(f, "   Iterations:           {}", self.iterations)?;
        writeln!(f, "   Accepted Solutions:   {}", self.accepted_solutions)?;
        writeln!(f, "   Improvements:         {}", self.improvements)?;
        writeln!(f, "   Iteration of Best:    {}", self.iteration_of_best)?;
        writeln!(f, "   Time to Best:         {:?}", self.time_to_best)?;
        writeln!(f, "   Tabu List Clears:     {}", self.tabu_list_clears)?;
        writeln!(f, "   Total Time:           {:?}", self.time_total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_tracks_iteration_and_time() {
        let mut stats = LocalSearchStatistics::default();
        for _ in 0..5 {
            stats.on_iteration();
        }
        stats.on_improvement(Duration::from_millis(7));
        stats.on_iteration();
        stats.on_iteration();

        assert_eq!(stats.improvements, 1);
        assert_eq!(stats.iteration_of_best, 5);
        assert_eq!(stats.time_to_best, Duration::from_millis(7));
        assert_eq!(stats.non_improving_iterations(), 2);
    }

    #[test]
    fn test_counters_saturate() {
        let mut stats = LocalSearchStatistics {
            iterations: u64::MAX,
            ..Default::default()
        };
        stats.on_iteration();
        assert_eq!(stats.iterations, u64::MAX);
    }

    #[test]
    fn test_display_lists_fields() {
        let text = format!("{}", LocalSearchStatistics::default());
        assert!(text.contains("Iterations:"));
        assert!(text.contains("Tabu List Clears:"));
    }
}
