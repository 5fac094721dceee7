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

//! Engine-independent effort summary attached to every `SolverOutcome`.

use std::time::Duration;

/// How much work a solve took, whichever engine ran it.
///
/// `iterations` counts explored nodes for branch-and-bound and outer
/// iterations (summed over tasks) for local search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverStatistics {
    pub solutions_found: u64,
    pub used_threads: usize,
    pub iterations: u64,
    pub solve_duration: Duration,
}

impl SolverStatistics {
    /// Statistics of a run on the calling thread.
    #[inline]
    pub fn sequential(solutions_found: u64, iterations: u64, solve_duration: Duration) -> Self {
        Self::parallel(1, solutions_found, iterations, solve_duration)
    }

    /// Statistics of `used_threads` tasks run side by side.
    ///
    /// # Panics
    ///
    /// Panics if `used_threads` is zero.
    #[inline]
    pub fn parallel(
        used_threads: usize,
        solutions_found: u64,
        iterations: u64,
        solve_duration: Duration,
    ) -> Self {
        assert!(
            used_threads > 0,
            "called `SolverStatistics::parallel` with zero threads"
        );
        Self {
            solutions_found,
            used_threads,
            iterations,
            solve_duration,
        }
    }

    /// A run that stopped before doing any search.
    #[inline]
    pub fn idle(solve_duration: Duration) -> Self {
        Self::sequential(0, 0, solve_duration)
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} solution(s), {} iteration(s) on {} thread(s) in {:.3}s",
            self.solutions_found,
            self.iterations,
            self.used_threads,
            self.solve_duration.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_uses_one_thread() {
        let stats = SolverStatistics::sequential(3, 500, Duration::from_millis(1500));
        assert_eq!(stats.used_threads, 1);
        assert_eq!(stats.solutions_found, 3);
        assert_eq!(stats.iterations, 500);
    }

    #[test]
    fn test_idle_is_empty() {
        let stats = SolverStatistics::idle(Duration::ZERO);
        assert_eq!(stats.solutions_found, 0);
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    #[should_panic(expected = "zero threads")]
    fn test_parallel_rejects_zero_threads() {
        let _ = SolverStatistics::parallel(0, 0, 0, Duration::ZERO);
    }

    #[test]
    fn test_display_is_one_line() {
        let stats = SolverStatistics::parallel(4, 2, 7, Duration::from_millis(250));
        assert_eq!(
            stats.to_string(),
            "2 solution(s), 7 iteration(s) on 4 thread(s) in 0.250s"
        );
    }
}
