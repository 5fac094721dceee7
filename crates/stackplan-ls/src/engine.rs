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

//! Iterative local search driver.
//!
//! The engine owns the current and best solutions of a run. Each outer
//! iteration it checks the termination conditions, asks the metaheuristic for
//! one neighbor, adopts it as the current solution and updates the best. The
//! metaheuristic decides what "neighbor" means; the engine only enforces the
//! stopping criterion, the optional wall-clock limit and the optional known
//! optimum, and keeps the statistics.
//!
//! Before the first and after the last iteration the engine may relabel the
//! columns of the solution with `StackMatching`. Both passes only ever keep a
//! feasible result that is not worse.

use crate::{
    meta::neighborhood_search::NeighborhoodSearch,
    monitor::local_search_monitor::LocalSearchMonitor,
    result::{LocalSearchEngineOutcome, LocalSearchTerminationReason},
    stack_matching::StackMatching,
    stats::LocalSearchStatistics,
};
use rand::Rng;
use stackplan_model::{assignment::Assignment, instance::Instance};
use stackplan_search::{monitor::search_command::SearchCommand, num::SolverNumeric, solution::Solution};
use std::time::{Duration, Instant};

/// When a local search run stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoppingCriterion {
    /// Stop after this many outer iterations.
    Iterations(u64),

    /// Stop once the metaheuristic cleared its tabu list this often.
    TabuListClears(u64),

    /// Stop after this many iterations without improving the best solution.
    NonImprovingIterations(u64),
}

impl StoppingCriterion {
    pub const DEFAULT_ITERATIONS: u64 = 500;
    pub const DEFAULT_TABU_LIST_CLEARS: u64 = 10;
    pub const DEFAULT_NON_IMPROVING_ITERATIONS: u64 = 500;

    #[inline]
    pub fn is_met(&self, statistics: &LocalSearchStatistics) -> bool {
        match *self {
            StoppingCriterion::Iterations(n) => statistics.iterations >= n,
            StoppingCriterion::TabuListClears(n) => statistics.tabu_list_clears >= n,
            StoppingCriterion::NonImprovingIterations(n) => {
                statistics.non_improving_iterations() >= n
            }
        }
    }
}

impl Default for StoppingCriterion {
    #[inline]
    fn default() -> Self {
        StoppingCriterion::NonImprovingIterations(Self::DEFAULT_NON_IMPROVING_ITERATIONS)
    }
}

impl std::fmt::Display for StoppingCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoppingCriterion::Iterations(n) => write!(f, "Iterations({})", n),
            StoppingCriterion::TabuListClears(n) => write!(f, "TabuListClears({})", n),
            StoppingCriterion::NonImprovingIterations(n) => {
                write!(f, "NonImprovingIterations({})", n)
            }
        }
    }
}

/// Run parameters of the local search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSearchConfig<T> {
    pub stopping_criterion: StoppingCriterion,
    pub time_limit: Option<Duration>,
    pub known_optimum: Option<T>,
    pub stack_matching: bool,
}

impl<T> Default for LocalSearchConfig<T> {
    #[inline]
    fn default() -> Self {
        Self {
            stopping_criterion: StoppingCriterion::default(),
            time_limit: None,
            known_optimum: None,
            stack_matching: true,
        }
    }
}

impl<T> LocalSearchConfig<T> {
    #[inline]
    pub fn with_stopping_criterion(mut self, stopping_criterion: StoppingCriterion) -> Self {
        self.stopping_criterion = stopping_criterion;
        self
    }

    #[inline]
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    /// Stops the run as soon as the best objective reaches `known_optimum`.
    #[inline]
    pub fn with_known_optimum(mut self, known_optimum: T) -> Self {
        self.known_optimum = Some(known_optimum);
        self
    }

    #[inline]
    pub fn with_stack_matching(mut self, stack_matching: bool) -> Self {
        self.stack_matching = stack_matching;
        self
    }
}

impl<T> std::fmt::Display for LocalSearchConfig<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LocalSearchConfig(stop: {}, time_limit: {:?}, known_optimum: {:?}, stack_matching: {})",
            self.stopping_criterion, self.time_limit, self.known_optimum, self.stack_matching
        )
    }
}

/// Local search engine for the stacking problem.
///
/// Keeps the column matching buffers between runs; everything else lives in
/// the metaheuristic passed to `run`.
#[derive(Debug, Clone)]
pub struct LocalSearchEngine<T>
where
    T: SolverNumeric,
{
    config: LocalSearchConfig<T>,
    matching: StackMatching<T>,
}

impl<T> Default for LocalSearchEngine<T>
where
    T: SolverNumeric,
{
    #[inline]
    fn default() -> Self {
        Self::new(LocalSearchConfig::default())
    }
}

impl<T> LocalSearchEngine<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new(config: LocalSearchConfig<T>) -> Self {
        Self {
            config,
            matching: StackMatching::new(),
        }
    }

    /// Creates an engine whose matching buffers already fit `num_stacks`.
    #[inline]
    pub fn preallocated(config: LocalSearchConfig<T>, num_stacks: usize) -> Self {
        Self {
            config,
            matching: StackMatching::preallocated(num_stacks),
        }
    }

    #[inline]
    pub fn config(&self) -> &LocalSearchConfig<T> {
        &self.config
    }

    fn check_termination<M>(
        &self,
        best: &Solution<T>,
        statistics: &LocalSearchStatistics,
        start_time: Instant,
        monitor: &mut M,
    ) -> Option<LocalSearchTerminationReason>
    where
        M: LocalSearchMonitor<T>,
    {
        if let Some(optimum) = self.config.known_optimum
            && best.objective_value() <= optimum
        {
            return Some(LocalSearchTerminationReason::KnownOptimumReached);
        }

        if self.config.stopping_criterion.is_met(statistics) {
            return Some(LocalSearchTerminationReason::StoppingCriterion(
                self.config.stopping_criterion,
            ));
        }

        if let Some(limit) = self.config.time_limit
            && start_time.elapsed() >= limit
        {
            return Some(LocalSearchTerminationReason::Aborted(
                "time limit exceeded".to_string(),
            ));
        }

        if let SearchCommand::Terminate(reason) = monitor.search_command(statistics) {
            return Some(LocalSearchTerminationReason::Aborted(reason));
        }

        None
    }

    /// Improves `initial` with the metaheuristic `search`.
    ///
    /// The returned outcome holds the best solution of the run, which is
    /// never worse than `initial`.
    ///
    /// # Panics
    ///
    /// Panics if `initial` is not a feasible assignment of `instance`.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            items = instance.num_items(),
            stacks = instance.num_stacks(),
            search = search.name()
        )
    )]
    pub fn run<S, M, R>(
        &mut self,
        instance: &Instance<T>,
        initial: Assignment,
        search: &mut S,
        monitor: &mut M,
        rng: &mut R,
    ) -> LocalSearchEngineOutcome<T>
    where
        S: NeighborhoodSearch<T>,
        M: LocalSearchMonitor<T>,
        R: Rng + ?Sized,
    {
        assert!(
            initial.is_feasible(instance),
            "called `LocalSearchEngine::run` with an infeasible initial assignment"
        );

        let start_time = Instant::now();
        let mut stats = LocalSearchStatistics::default();

        let initial = Solution::from_assignment(instance, initial);
        let initial_objective = initial.objective_value();

        let mut current = if self.config.stack_matching {
            self.matching
                .reassign_columns(instance, &initial)
                .unwrap_or(initial)
        } else {
            initial
        };
        if current.objective_value() < initial_objective {
            stats.on_improvement(start_time.elapsed());
        }
        let mut best = current.clone();

        monitor.on_start(&current);
        search.on_start(instance, &current);

        let termination_reason = loop {
            if let Some(reason) = self.check_termination(&best, &stats, start_time, monitor) {
                break reason;
            }

            stats.on_iteration();

            let neighbor = search.get_neighbor(instance, &current, &best, rng);
            stats.set_tabu_list_clears(search.tabu_list_clears());

            let Some(candidate) = neighbor else {
                break LocalSearchTerminationReason::LocalOptimum;
            };

            debug_assert!(
                candidate.is_feasible(instance),
                "called `LocalSearchEngine::run` with a metaheuristic that returned an infeasible neighbor"
            );

            current = candidate.into_solution();
            stats.on_accepted_solution();

            if current.objective_value() < best.objective_value() {
                best = current.clone();
                stats.on_improvement(start_time.elapsed());
                monitor.on_new_best(&best, &stats);
            }

            monitor.on_step(&current, &stats);
        };

        if self.config.stack_matching
            && let Some(matched) = self.matching.reassign_columns(instance, &best)
        {
            if matched.objective_value() < best.objective_value() {
                stats.on_improvement(start_time.elapsed());
                monitor.on_new_best(&matched, &stats);
            }
            best = matched;
        }

        let known_optimum_matched = self
            .config
            .known_optimum
            .is_some_and(|optimum| best.objective_value() <= optimum);

        stats.set_total_time(start_time.elapsed());
        monitor.on_end(&best, &stats);

        tracing::debug!(
            initial = %initial_objective,
            best = %best.objective_value(),
            iterations = stats.iterations,
            reason = %termination_reason,
            "local search run finished"
        );

        LocalSearchEngineOutcome::new(
            termination_reason,
            best,
            initial_objective,
            stats,
            known_optimum_matched,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        meta::{
            hill_climbing::HillClimbing,
            tabu_search::{TabuSearch, TabuSearchConfig},
            variable::VariableNeighborhood,
        },
        monitor::no_op::NoOperationMonitor,
        test_support::{IntegerType, init_tracing, permissive_instance},
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use stackplan_model::{index::ItemIndex, instance::InstanceBuilder};
    use stackplan_search::supplier::{FeasibleAssignmentSupplier, FirstFitConstructor};

    fn item(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn random_instance(seed: u64) -> Instance<IntegerType> {
        permissive_instance(seed, 3, 2, 2, 20)
    }

    fn tabu() -> TabuSearch<IntegerType> {
        TabuSearch::new(TabuSearchConfig::default(), VariableNeighborhood::default())
    }

    /// Items 0 and 1 prefer stack 1, item 2 prefers stack 0; starts with the
    /// columns on the wrong stacks.
    fn mislabeled() -> (Instance<IntegerType>, Assignment) {
        let mut b = InstanceBuilder::<IntegerType>::new(3, 2, 2);
        b.set_item_costs(item(0), &[5, 1])
            .set_item_costs(item(1), &[5, 1])
            .set_item_costs(item(2), &[1, 5])
            .allow_all_stacking();
        let instance = b.build().unwrap();
        let assignment = Assignment::from_columns(3, 2, &[vec![item(0), item(1)], vec![item(2)]]);
        (instance, assignment)
    }

    #[test]
    fn test_tabu_search_from_supplier_never_regresses() {
        init_tracing();
        for seed in 0..8 {
            let instance = random_instance(seed);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let initial = FirstFitConstructor::default()
                .supply(&instance, &mut rng)
                .unwrap();
            assert!(initial.is_feasible(&instance));

            let config = LocalSearchConfig::default()
                .with_stopping_criterion(StoppingCriterion::Iterations(100));
            let mut engine = LocalSearchEngine::new(config);
            let outcome = engine.run(
                &instance,
                initial,
                &mut tabu(),
                &mut NoOperationMonitor::new(),
                &mut rng,
            );

            assert!(outcome.objective_value() <= outcome.initial_objective());
            assert!(outcome.solution().assignment().is_feasible(&instance));
            assert_eq!(
                outcome.objective_value(),
                outcome.solution().assignment().cost(&instance)
            );
            assert!(outcome.statistics().iterations <= 100);
        }
    }

    #[test]
    fn test_iteration_criterion_stops_run() {
        let instance = random_instance(3);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let initial = FirstFitConstructor::default()
            .supply(&instance, &mut rng)
            .unwrap();

        let config = LocalSearchConfig::default()
            .with_stopping_criterion(StoppingCriterion::Iterations(5))
            .with_stack_matching(false);
        let outcome = LocalSearchEngine::new(config).run(
            &instance,
            initial,
            &mut tabu(),
            &mut NoOperationMonitor::new(),
            &mut rng,
        );

        assert_eq!(
            outcome.termination_reason(),
            &LocalSearchTerminationReason::StoppingCriterion(StoppingCriterion::Iterations(5))
        );
        assert_eq!(outcome.statistics().iterations, 5);
        assert_eq!(outcome.statistics().accepted_solutions, 5);
    }

    #[test]
    fn test_known_optimum_ends_run_immediately() {
        let (instance, assignment) = mislabeled();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        // Stack matching already reaches the optimum of 3.
        let config = LocalSearchConfig::default().with_known_optimum(3);
        let outcome = LocalSearchEngine::new(config).run(
            &instance,
            assignment,
            &mut tabu(),
            &mut NoOperationMonitor::new(),
            &mut rng,
        );

        assert_eq!(
            outcome.termination_reason(),
            &LocalSearchTerminationReason::KnownOptimumReached
        );
        assert!(outcome.known_optimum_matched());
        assert_eq!(outcome.objective_value(), 3);
        assert_eq!(outcome.initial_objective(), 15);
        assert_eq!(outcome.statistics().iterations, 0);
        assert_eq!(outcome.statistics().improvements, 1);
    }

    #[test]
    fn test_stack_matching_can_be_disabled() {
        let (instance, assignment) = mislabeled();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let config = LocalSearchConfig::default()
            .with_stopping_criterion(StoppingCriterion::Iterations(0))
            .with_stack_matching(false);
        let outcome = LocalSearchEngine::new(config).run(
            &instance,
            assignment,
            &mut tabu(),
            &mut NoOperationMonitor::new(),
            &mut rng,
        );

        assert_eq!(outcome.objective_value(), 15);
        assert!(!outcome.known_optimum_matched());
    }

    #[test]
    fn test_zero_time_limit_aborts() {
        let (instance, assignment) = mislabeled();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let config = LocalSearchConfig::default()
            .with_time_limit(Duration::ZERO)
            .with_stack_matching(false);
        let outcome = LocalSearchEngine::new(config).run(
            &instance,
            assignment,
            &mut tabu(),
            &mut NoOperationMonitor::new(),
            &mut rng,
        );

        assert_eq!(
            outcome.termination_reason(),
            &LocalSearchTerminationReason::Aborted("time limit exceeded".to_string())
        );
        assert_eq!(outcome.statistics().iterations, 0);
    }

    #[test]
    fn test_hill_climbing_ends_in_local_optimum() {
        let (instance, assignment) = mislabeled();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let config = LocalSearchConfig::default().with_stack_matching(false);
        let outcome = LocalSearchEngine::new(config).run(
            &instance,
            assignment,
            &mut HillClimbing::default(),
            &mut NoOperationMonitor::new(),
            &mut rng,
        );

        assert_eq!(
            outcome.termination_reason(),
            &LocalSearchTerminationReason::LocalOptimum
        );
        assert!(outcome.objective_value() < 15);
        assert!(outcome.solution().assignment().is_feasible(&instance));
    }

    struct TerminateAt(u64);

    impl LocalSearchMonitor<IntegerType> for TerminateAt {
        fn name(&self) -> &str {
            "TerminateAt"
        }

        fn search_command(&mut self, statistics: &LocalSearchStatistics) -> SearchCommand {
            if statistics.iterations >= self.0 {
                SearchCommand::Terminate("enough".to_string())
            } else {
                SearchCommand::Continue
            }
        }
    }

    #[test]
    fn test_monitor_can_abort() {
        let instance = random_instance(11);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let initial = FirstFitConstructor::default()
            .supply(&instance, &mut rng)
            .unwrap();

        let outcome = LocalSearchEngine::default().run(
            &instance,
            initial,
            &mut tabu(),
            &mut TerminateAt(2),
            &mut rng,
        );
        assert_eq!(
            outcome.termination_reason(),
            &LocalSearchTerminationReason::Aborted("enough".to_string())
        );
        assert_eq!(outcome.statistics().iterations, 2);
    }

    #[test]
    fn test_criterion_checks() {
        let stats = LocalSearchStatistics {
            iterations: 10,
            iteration_of_best: 4,
            tabu_list_clears: 2,
            ..Default::default()
        };
        assert!(StoppingCriterion::Iterations(10).is_met(&stats));
        assert!(!StoppingCriterion::Iterations(11).is_met(&stats));
        assert!(StoppingCriterion::TabuListClears(2).is_met(&stats));
        assert!(StoppingCriterion::NonImprovingIterations(6).is_met(&stats));
        assert!(!StoppingCriterion::NonImprovingIterations(7).is_met(&stats));
        assert_eq!(
            StoppingCriterion::default(),
            StoppingCriterion::NonImprovingIterations(500)
        );
    }

    #[test]
    #[should_panic(expected = "infeasible initial assignment")]
    fn test_rejects_infeasible_initial() {
        let (instance, _) = mislabeled();
        let partial = Assignment::from_columns(3, 2, &[vec![item(0)], vec![]]);
        LocalSearchEngine::default().run(
            &instance,
            partial,
            &mut tabu(),
            &mut NoOperationMonitor::new(),
            &mut ChaCha8Rng::seed_from_u64(0),
        );
    }
}
