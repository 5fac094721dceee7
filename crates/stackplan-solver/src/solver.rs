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

//! # Stacking Solver Facade
//!
//! Bundles the configuration of both engines and exposes three ways to
//! solve an instance:
//!
//! - `solve_exact`: branch-and-bound with the matching bound. With
//!   `warm_start` enabled, a seeded local search run supplies the first
//!   incumbent so pruning starts early.
//! - `solve_heuristic`: first-fit start plus one local search run.
//! - `solve_multistart`: `num_tasks` seeded local search runs on scoped
//!   threads; the best task wins.
//!
//! A time limit applies to every engine run. Heuristic results are always
//! `Feasible`; only branch-and-bound reports `Optimal` or `Infeasible`.
//!
//! ## Usage
//!
//! ```rust
//! use stackplan_model::{index::ItemIndex, instance::InstanceBuilder};
//! use stackplan_solver::solver::SolverBuilder;
//!
//! let mut b = InstanceBuilder::<i64>::new(2, 2, 1);
//! b.set_item_costs(ItemIndex::new(0), &[1, 4])
//!     .set_item_costs(ItemIndex::new(1), &[3, 2]);
//! let instance = b.build().unwrap();
//!
//! let solver = SolverBuilder::<i64>::new().with_seed(7).build();
//! let outcome = solver.solve_exact(&instance);
//! assert!(outcome.is_optimal());
//! assert_eq!(outcome.objective_value(), Some(3));
//! ```

use crate::strategy::{Metaheuristic, SearchStrategy};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stackplan_bnb::{
    bnb::{BnbConfig, BranchAndBoundSolver},
    monitor::{
        composite::CompositeTreeSearchMonitor, log::LogTreeSearchMonitor,
        time_limit::TimeLimitMonitor,
    },
};
use stackplan_ls::{
    engine::{LocalSearchConfig, LocalSearchEngine},
    meta::tabu_search::TabuSearchConfig,
    monitor::{composite::CompositeLocalSearchMonitor, log::LogSearchMonitor, no_op::NoOperationMonitor},
    multistart::{MultiStart, MultiStartConfig},
};
use stackplan_model::{assignment::Assignment, instance::Instance};
use stackplan_search::{
    num::SolverNumeric,
    result::{SolverOutcome, SolverResult, TerminationReason},
    stats::SolverStatistics,
    supplier::{FeasibleAssignmentSupplier, FirstFitConstructor},
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Solver<T>
where
    T: SolverNumeric,
{
    bnb_config: BnbConfig,
    local_search: LocalSearchConfig<T>,
    tabu_config: TabuSearchConfig,
    metaheuristic: Metaheuristic,
    max_restarts: usize,
    seed: u64,
    time_limit: Option<Duration>,
    warm_start: bool,
    logging: bool,
}

impl<T> Solver<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn bnb_config(&self) -> &BnbConfig {
        &self.bnb_config
    }

    #[inline]
    pub fn local_search_config(&self) -> &LocalSearchConfig<T> {
        &self.local_search
    }

    #[inline]
    pub fn tabu_config(&self) -> &TabuSearchConfig {
        &self.tabu_config
    }

    #[inline]
    pub fn metaheuristic(&self) -> Metaheuristic {
        self.metaheuristic
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    fn engine_config(&self) -> LocalSearchConfig<T> {
        let mut config = self.local_search.clone();
        if let Some(limit) = self.time_limit {
            config.time_limit = Some(config.time_limit.map_or(limit, |own| own.min(limit)));
        }
        config
    }

    fn strategy(&self, instance: &Instance<T>) -> SearchStrategy<T> {
        SearchStrategy::build(
            self.metaheuristic,
            self.tabu_config,
            instance.num_items(),
            instance.num_stacks(),
        )
    }

    fn unknown(reason: String, started: Instant) -> SolverOutcome<T> {
        SolverOutcome::new(
            SolverResult::Unknown,
            TerminationReason::Aborted(reason),
            SolverStatistics::idle(started.elapsed()),
        )
    }

    /// Runs one local search from a first-fit start and returns its best
    /// assignment, or `None` if no start could be built.
    fn heuristic_incumbent(&self, instance: &Instance<T>) -> Option<Assignment> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let initial = match FirstFitConstructor::new(self.max_restarts).supply(instance, &mut rng) {
            Ok(initial) => initial,
            Err(err) => {
                tracing::debug!(%err, "no warm start available");
                return None;
            }
        };
        let mut engine = LocalSearchEngine::preallocated(self.engine_config(), instance.num_stacks());
        let mut search = self.strategy(instance);
        let outcome = engine.run(
            instance,
            initial,
            &mut search,
            &mut NoOperationMonitor::new(),
            &mut rng,
        );
        Some(outcome.into_solution().into_assignment())
    }

    /// Solves `instance` exactly.
    ///
    /// The result is `Optimal` or `Infeasible` unless the time limit stops
    /// the search first, in which case it is `Feasible` with the best
    /// solution found or `Unknown`.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(items = instance.num_items(), stacks = instance.num_stacks())
    )]
    pub fn solve_exact(&self, instance: &Instance<T>) -> SolverOutcome<T> {
        let incumbent = if self.warm_start {
            self.heuristic_incumbent(instance)
        } else {
            None
        };

        let mut monitor = CompositeTreeSearchMonitor::with_capacity(2);
        if let Some(limit) = self.time_limit {
            monitor.add_monitor(TimeLimitMonitor::with_default_check_interval(limit));
        }
        if self.logging {
            monitor.add_monitor(LogTreeSearchMonitor::default());
        }

        let mut bnb = BranchAndBoundSolver::preallocated(instance.num_slots(), self.bnb_config);
        let outcome: SolverOutcome<T> = bnb.solve_with_incumbent(instance, incumbent, monitor).into();
        tracing::info!(
            result = %outcome.result,
            reason = %outcome.reason,
            "exact solve finished"
        );
        outcome
    }

    /// Improves a first-fit start with the configured metaheuristic.
    ///
    /// Reports `Unknown` if the first-fit supplier finds no start.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(
            items = instance.num_items(),
            stacks = instance.num_stacks(),
            metaheuristic = %self.metaheuristic
        )
    )]
    pub fn solve_heuristic(&self, instance: &Instance<T>) -> SolverOutcome<T> {
        let started = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let initial = match FirstFitConstructor::new(self.max_restarts).supply(instance, &mut rng) {
            Ok(initial) => initial,
            Err(err) => {
                tracing::warn!(%err, "first fit found no start");
                return Self::unknown(err.to_string(), started);
            }
        };

        let mut monitor = CompositeLocalSearchMonitor::with_capacity(1);
        if self.logging {
            monitor.add_monitor(LogSearchMonitor::default());
        }

        let mut engine = LocalSearchEngine::preallocated(self.engine_config(), instance.num_stacks());
        let mut search = self.strategy(instance);
        let outcome = engine.run(instance, initial, &mut search, &mut monitor, &mut rng);
        tracing::info!(
            initial = %outcome.initial_objective(),
            best = %outcome.objective_value(),
            reason = %outcome.termination_reason(),
            "heuristic solve finished"
        );
        outcome.into()
    }

    /// Runs `num_tasks` independent local searches in parallel, seeded with
    /// `seed`, `seed + 1`, and so on.
    ///
    /// # Panics
    ///
    /// Panics if `num_tasks` is zero.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(items = instance.num_items(), stacks = instance.num_stacks(), num_tasks = num_tasks)
    )]
    pub fn solve_multistart(&self, instance: &Instance<T>, num_tasks: usize) -> SolverOutcome<T> {
        let started = Instant::now();
        let multistart = MultiStart::new(
            MultiStartConfig::new(num_tasks, self.seed),
            self.engine_config(),
        );
        let outcome = multistart.run(
            instance,
            |_| FirstFitConstructor::new(self.max_restarts),
            |_| self.strategy(instance),
        );

        let iterations = outcome.total_iterations();
        let solved = num_tasks.saturating_sub(outcome.num_failed()) as u64;
        let reason = outcome
            .first_error()
            .map(|err| err.to_string())
            .unwrap_or_else(|| "all supply attempts failed".to_string());
        let Some(best) = outcome.into_best() else {
            tracing::warn!(%reason, "no multi-start task produced a solution");
            return Self::unknown(reason, started);
        };

        let stats = SolverStatistics::parallel(num_tasks, solved, iterations, started.elapsed());
        let reason = TerminationReason::Aborted(best.termination_reason().to_string());
        SolverOutcome::new(SolverResult::Feasible(best.into_solution()), reason, stats)
    }
}

#[derive(Debug, Clone)]
pub struct SolverBuilder<T>
where
    T: SolverNumeric,
{
    bnb_config: BnbConfig,
    local_search: LocalSearchConfig<T>,
    tabu_config: TabuSearchConfig,
    metaheuristic: Metaheuristic,
    max_restarts: usize,
    seed: u64,
    time_limit: Option<Duration>,
    warm_start: bool,
    logging: bool,
}

impl<T> Default for SolverBuilder<T>
where
    T: SolverNumeric,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SolverBuilder<T>
where
    T: SolverNumeric,
{
    pub const DEFAULT_MAX_RESTARTS: usize = 1000;

    #[inline]
    pub fn new() -> Self {
        Self {
            bnb_config: BnbConfig::default(),
            local_search: LocalSearchConfig::default(),
            tabu_config: TabuSearchConfig::default(),
            metaheuristic: Metaheuristic::default(),
            max_restarts: Self::DEFAULT_MAX_RESTARTS,
            seed: 0,
            time_limit: None,
            warm_start: true,
            logging: false,
        }
    }

    #[inline]
    pub fn with_bnb_config(mut self, config: BnbConfig) -> Self {
        self.bnb_config = config;
        self
    }

    #[inline]
    pub fn with_local_search_config(mut self, config: LocalSearchConfig<T>) -> Self {
        self.local_search = config;
        self
    }

    #[inline]
    pub fn with_tabu_config(mut self, config: TabuSearchConfig) -> Self {
        self.tabu_config = config;
        self
    }

    #[inline]
    pub fn with_metaheuristic(mut self, metaheuristic: Metaheuristic) -> Self {
        self.metaheuristic = metaheuristic;
        self
    }

    /// Restart budget of the first-fit supplier.
    #[inline]
    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Seeds branch-and-bound with a local search incumbent.
    #[inline]
    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self
    }

    /// Attaches the `tracing` progress monitors to every run.
    #[inline]
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    #[inline]
    pub fn build(self) -> Solver<T> {
        Solver {
            bnb_config: self.bnb_config,
            local_search: self.local_search,
            tabu_config: self.tabu_config,
            metaheuristic: self.metaheuristic,
            max_restarts: self.max_restarts,
            seed: self.seed,
            time_limit: self.time_limit,
            warm_start: self.warm_start,
            logging: self.logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_ls::engine::StoppingCriterion;
    use stackplan_model::{index::ItemIndex, instance::InstanceBuilder};
    use tracing_subscriber::EnvFilter;

    type IntegerType = i64;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    fn ii(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    /// 4 items, 2 stacks of height 2, no stacking restrictions. The optimum
    /// puts items 0 and 1 on stack 0 and items 2 and 3 on stack 1 for 3 + 2 +
    /// 1 + 4 = 10.
    fn four_items() -> Instance<IntegerType> {
        let mut b = InstanceBuilder::<IntegerType>::new(4, 2, 2);
        b.allow_all_stacking()
            .set_item_costs(ii(0), &[3, 8])
            .set_item_costs(ii(1), &[2, 6])
            .set_item_costs(ii(2), &[7, 1])
            .set_item_costs(ii(3), &[4, 4]);
        b.build().unwrap()
    }

    fn quick() -> SolverBuilder<IntegerType> {
        SolverBuilder::new().with_seed(3).with_local_search_config(
            LocalSearchConfig::default().with_stopping_criterion(StoppingCriterion::Iterations(50)),
        )
    }

    #[test]
    fn test_exact_finds_optimum() {
        init_tracing();
        let instance = four_items();
        for warm_start in [false, true] {
            let outcome = quick().with_warm_start(warm_start).build().solve_exact(&instance);
            assert!(outcome.is_optimal());
            assert_eq!(outcome.reason, TerminationReason::OptimalityProven);
            assert_eq!(outcome.objective_value(), Some(10));
        }
    }

    #[test]
    fn test_exact_reports_infeasible() {
        // Neither item may sit on the other and there is only one stack.
        let mut b = InstanceBuilder::<IntegerType>::new(2, 1, 2);
        b.set_item_costs(ii(0), &[1]).set_item_costs(ii(1), &[1]);
        let instance = b.build().unwrap();

        let outcome = quick().build().solve_exact(&instance);
        assert!(outcome.is_infeasible());
        assert_eq!(outcome.objective_value(), None);
    }

    #[test]
    fn test_heuristic_is_feasible_and_not_below_optimum() {
        let instance = four_items();
        for metaheuristic in [Metaheuristic::TabuSearch, Metaheuristic::HillClimbing] {
            let outcome = quick()
                .with_metaheuristic(metaheuristic)
                .build()
                .solve_heuristic(&instance);
            assert!(outcome.is_feasible());
            let solution = outcome.result.solution().unwrap();
            assert!(solution.assignment().is_feasible(&instance));
            assert!(solution.objective_value() >= 10);
        }
    }

    #[test]
    fn test_heuristic_without_start_is_unknown() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 1, 2);
        b.set_item_costs(ii(0), &[1]).set_item_costs(ii(1), &[1]);
        let instance = b.build().unwrap();

        let outcome = quick().with_max_restarts(3).build().solve_heuristic(&instance);
        assert_eq!(outcome.result, SolverResult::Unknown);
        assert!(matches!(outcome.reason, TerminationReason::Aborted(_)));
    }

    #[test]
    fn test_multistart_reports_best_task() {
        let instance = four_items();
        let outcome = quick().build().solve_multistart(&instance, 3);
        assert!(outcome.is_feasible());
        assert_eq!(outcome.statistics.used_threads, 3);
        let solution = outcome.result.solution().unwrap();
        assert!(solution.assignment().is_feasible(&instance));
        assert_eq!(solution.objective_value(), solution.assignment().cost(&instance));
    }

    #[test]
    fn test_time_limit_is_forwarded() {
        let solver = quick().with_time_limit(Duration::from_secs(5)).build();
        assert_eq!(solver.time_limit(), Some(Duration::from_secs(5)));
        assert_eq!(solver.engine_config().time_limit, Some(Duration::from_secs(5)));

        let solver = SolverBuilder::<IntegerType>::new()
            .with_local_search_config(
                LocalSearchConfig::default().with_time_limit(Duration::from_secs(1)),
            )
            .with_time_limit(Duration::from_secs(5))
            .build();
        assert_eq!(solver.engine_config().time_limit, Some(Duration::from_secs(1)));
    }
}
