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

//! Local search outcome and termination reporting.
//!
//! `LocalSearchEngineOutcome` carries the best solution of a run, the run
//! statistics, the reason the run stopped, and whether a supplied known
//! optimum was matched. It converts into the facade's `SolverOutcome`; local
//! search never proves anything, so the result is always `Feasible`.

use crate::{engine::StoppingCriterion, stats::LocalSearchStatistics};
use stackplan_search::{
    num::SolverNumeric,
    result::{SolverOutcome, SolverResult, TerminationReason},
    solution::Solution,
    stats::SolverStatistics,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalSearchTerminationReason {
    /// The metaheuristic could not produce another neighbor.
    LocalOptimum,

    /// The configured stopping criterion was met.
    StoppingCriterion(StoppingCriterion),

    /// The best solution reached the supplied known optimum.
    KnownOptimumReached,

    /// The run was cut short by the time limit or a monitor.
    Aborted(String),
}

impl std::fmt::Display for LocalSearchTerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalSearchTerminationReason::LocalOptimum => write!(f, "Local Optimum Reached"),
            LocalSearchTerminationReason::StoppingCriterion(criterion) => {
                write!(f, "Stopping Criterion Met: {}", criterion)
            }
            LocalSearchTerminationReason::KnownOptimumReached => {
                write!(f, "Known Optimum Reached")
            }
            LocalSearchTerminationReason::Aborted(msg) => write!(f, "Aborted: {}", msg),
        }
    }
}

/// Result of a local search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSearchEngineOutcome<T> {
    termination_reason: LocalSearchTerminationReason,
    solution: Solution<T>,
    initial_objective: T,
    statistics: LocalSearchStatistics,
    known_optimum_matched: bool,
}

impl<T> LocalSearchEngineOutcome<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new(
        termination_reason: LocalSearchTerminationReason,
        solution: Solution<T>,
        initial_objective: T,
        statistics: LocalSearchStatistics,
        known_optimum_matched: bool,
    ) -> Self {
        Self {
            termination_reason,
            solution,
            initial_objective,
            statistics,
            known_optimum_matched,
        }
    }

    #[inline]
    pub fn termination_reason(&self) -> &LocalSearchTerminationReason {
        &self.termination_reason
    }

    /// Returns the best solution of the run.
    #[inline]
    pub fn solution(&self) -> &Solution<T> {
        &self.solution
    }

    #[inline]
    pub fn into_solution(self) -> Solution<T> {
        self.solution
    }

    #[inline]
    pub fn objective_value(&self) -> T {
        self.solution.objective_value()
    }

    /// Returns the objective of the assignment the run started from.
    #[inline]
    pub fn initial_objective(&self) -> T {
        self.initial_objective
    }

    #[inline]
    pub fn statistics(&self) -> &LocalSearchStatistics {
        &self.statistics
    }

    #[inline]
    pub fn known_optimum_matched(&self) -> bool {
        self.known_optimum_matched
    }
}

impl<T> std::fmt::Display for LocalSearchEngineOutcome<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Local search: {} -> {} ({})",
            self.initial_objective,
            self.solution.objective_value(),
            self.termination_reason
        )?;
        if self.known_optimum_matched {
            writeln!(f, "Known optimum matched")?;
        }
        write!(f, "{}", self.statistics)
    }
}

impl<T> From<LocalSearchEngineOutcome<T>> for SolverOutcome<T>
where
    T: SolverNumeric,
{
    fn from(outcome: LocalSearchEngineOutcome<T>) -> Self {
        let stats = SolverStatistics::sequential(
            outcome.statistics.improvements.saturating_add(1),
            outcome.statistics.iterations,
            outcome.statistics.time_total,
        );
        let reason = TerminationReason::Aborted(outcome.termination_reason.to_string());
        SolverOutcome::new(SolverResult::Feasible(outcome.solution), reason, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_model::assignment::Assignment;
    use std::time::Duration;

    type IntegerType = i64;

    fn outcome(reason: LocalSearchTerminationReason) -> LocalSearchEngineOutcome<IntegerType> {
        let stats = LocalSearchStatistics {
            iterations: 12,
            improvements: 2,
            time_total: Duration::from_millis(5),
            ..Default::default()
        };
        LocalSearchEngineOutcome::new(
            reason,
            Solution::new(7, Assignment::new(0, 1, 1)),
            10,
            stats,
            false,
        )
    }

    #[test]
    fn test_accessors() {
        let o = outcome(LocalSearchTerminationReason::LocalOptimum);
        assert_eq!(o.objective_value(), 7);
        assert_eq!(o.initial_objective(), 10);
        assert_eq!(o.statistics().iterations, 12);
        assert!(!o.known_optimum_matched());
    }

    #[test]
    fn test_into_solver_outcome_is_feasible() {
        let o = outcome(LocalSearchTerminationReason::StoppingCriterion(
            StoppingCriterion::Iterations(12),
        ));
        let solver: SolverOutcome<IntegerType> = o.into();
        assert!(solver.is_feasible());
        assert_eq!(solver.objective_value(), Some(7));
        assert_eq!(solver.statistics.iterations, 12);
        assert_eq!(solver.statistics.solutions_found, 3);
        assert_eq!(
            solver.reason,
            TerminationReason::Aborted("Stopping Criterion Met: Iterations(12)".to_string())
        );
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(
            format!("{}", LocalSearchTerminationReason::Aborted("time limit".into())),
            "Aborted: time limit"
        );
        assert_eq!(
            format!("{}", LocalSearchTerminationReason::KnownOptimumReached),
            "Known Optimum Reached"
        );
    }
}
