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

//! Independent multi-start local search.
//!
//! Every task builds its own supplier and metaheuristic from the given
//! factories, draws an initial assignment, and improves it with its own
//! engine. Tasks share nothing but the read-only instance, so they run on
//! scoped threads without synchronization. Task `i` uses a `ChaCha8Rng`
//! seeded with `base_seed + i`, which makes every task reproducible on its
//! own regardless of scheduling.

use crate::{
    engine::{LocalSearchConfig, LocalSearchEngine},
    meta::neighborhood_search::NeighborhoodSearch,
    monitor::no_op::NoOperationMonitor,
    result::LocalSearchEngineOutcome,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stackplan_model::instance::Instance;
use stackplan_search::{
    err::SupplyError, num::SolverNumeric, supplier::FeasibleAssignmentSupplier,
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultiStartConfig {
    pub num_tasks: usize,
    pub base_seed: u64,
}

impl MultiStartConfig {
    pub const DEFAULT_NUM_TASKS: usize = 4;

    /// # Panics
    ///
    /// Panics if `num_tasks` is zero.
    #[inline]
    pub fn new(num_tasks: usize, base_seed: u64) -> Self {
        assert!(
            num_tasks > 0,
            "called `MultiStartConfig::new` with zero tasks"
        );
        Self {
            num_tasks,
            base_seed,
        }
    }

    /// Returns the seed of task `task`.
    #[inline]
    pub fn seed_of(&self, task: usize) -> u64 {
        self.base_seed.wrapping_add(task as u64)
    }
}

impl Default for MultiStartConfig {
    #[inline]
    fn default() -> Self {
        Self::new(Self::DEFAULT_NUM_TASKS, 0)
    }
}

impl std::fmt::Display for MultiStartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MultiStartConfig(num_tasks: {}, base_seed: {})",
            self.num_tasks, self.base_seed
        )
    }
}

/// Per-task results of a multi-start run.
#[derive(Debug, Clone)]
pub struct MultiStartOutcome<T>
where
    T: SolverNumeric,
{
    tasks: Vec<Result<LocalSearchEngineOutcome<T>, SupplyError>>,
    best_task: Option<usize>,
    time_total: Duration,
}

impl<T> MultiStartOutcome<T>
where
    T: SolverNumeric,
{
    fn new(tasks: Vec<Result<LocalSearchEngineOutcome<T>, SupplyError>>, time_total: Duration) -> Self {
        let mut best_task: Option<usize> = None;
        for (task, result) in tasks.iter().enumerate() {
            let Ok(outcome) = result else { continue };
            let better = best_task
                .and_then(|b| tasks[b].as_ref().ok())
                .is_none_or(|best| outcome.objective_value() < best.objective_value());
            if better {
                best_task = Some(task);
            }
        }
        Self {
            tasks,
            best_task,
            time_total,
        }
    }

    #[inline]
    pub fn tasks(&self) -> &[Result<LocalSearchEngineOutcome<T>, SupplyError>] {
        &self.tasks
    }

    /// Index of the task with the lowest objective; ties go to the lowest
    /// index. `None` if every supplier failed.
    #[inline]
    pub fn best_task(&self) -> Option<usize> {
        self.best_task
    }

    #[inline]
    pub fn best(&self) -> Option<&LocalSearchEngineOutcome<T>> {
        self.best_task.and_then(|task| self.tasks[task].as_ref().ok())
    }

    #[inline]
    pub fn into_best(self) -> Option<LocalSearchEngineOutcome<T>> {
        let task = self.best_task?;
        self.tasks.into_iter().nth(task).and_then(Result::ok)
    }

    #[inline]
    pub fn num_failed(&self) -> usize {
        self.tasks.iter().filter(|r| r.is_err()).count()
    }

    /// Returns the first supplier error, if any task failed.
    #[inline]
    pub fn first_error(&self) -> Option<&SupplyError> {
        self.tasks.iter().find_map(|r| r.as_ref().err())
    }

    /// Sum of iterations over all successful tasks.
    #[inline]
    pub fn total_iterations(&self) -> u64 {
        self.tasks
            .iter()
            .flatten()
            .fold(0u64, |acc, o| acc.saturating_add(o.statistics().iterations))
    }

    #[inline]
    pub fn time_total(&self) -> Duration {
        self.time_total
    }
}

impl<T> std::fmt::Display for MultiStartOutcome<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (task, result) in self.tasks.iter().enumerate() {
            match result {
                Ok(outcome) => writeln!(
                    f,
                    "task {}: {} -> {} ({})",
                    task,
                    outcome.initial_objective(),
                    outcome.objective_value(),
                    outcome.termination_reason()
                )?,
                Err(err) => writeln!(f, "task {}: {}", task, err)?,
            }
        }
        match self.best() {
            Some(best) => write!(f, "best: {} in {:?}", best.objective_value(), self.time_total),
            None => write!(f, "best: none in {:?}", self.time_total),
        }
    }
}

/// Runs one local search per task on scoped threads.
#[derive(Debug, Clone)]
pub struct MultiStart<T>
where
    T: SolverNumeric,
{
    config: MultiStartConfig,
    engine_config: LocalSearchConfig<T>,
}

impl<T> MultiStart<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new(config: MultiStartConfig, engine_config: LocalSearchConfig<T>) -> Self {
        Self {
            config,
            engine_config,
        }
    }

    #[inline]
    pub fn config(&self) -> &MultiStartConfig {
        &self.config
    }

    #[inline]
    pub fn engine_config(&self) -> &LocalSearchConfig<T> {
        &self.engine_config
    }

    fn run_task<P, S>(
        &self,
        instance: &Instance<T>,
        task: usize,
        supplier: &mut P,
        search: &mut S,
    ) -> Result<LocalSearchEngineOutcome<T>, SupplyError>
    where
        P: FeasibleAssignmentSupplier<T>,
        S: NeighborhoodSearch<T>,
    {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed_of(task));
        let initial = supplier.supply(instance, &mut rng)?;
        let mut engine =
            LocalSearchEngine::preallocated(self.engine_config.clone(), instance.num_stacks());
        let outcome = engine.run(
            instance,
            initial,
            search,
            &mut NoOperationMonitor::new(),
            &mut rng,
        );
        tracing::debug!(
            task,
            initial = %outcome.initial_objective(),
            best = %outcome.objective_value(),
            "multi-start task finished"
        );
        Ok(outcome)
    }

    /// Runs `num_tasks` independent searches.
    ///
    /// `make_supplier(i)` and `make_search(i)` build the supplier and
    /// metaheuristic of task `i` on its own thread. A panic inside a task is
    /// propagated to the caller.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(tasks = self.config.num_tasks, seed = self.config.base_seed)
    )]
    pub fn run<FP, P, FS, S>(
        &self,
        instance: &Instance<T>,
        make_supplier: FP,
        make_search: FS,
    ) -> MultiStartOutcome<T>
    where
        FP: Fn(usize) -> P + Sync,
        P: FeasibleAssignmentSupplier<T>,
        FS: Fn(usize) -> S + Sync,
        S: NeighborhoodSearch<T>,
    {
        let start_time = Instant::now();
        let make_supplier = &make_supplier;
        let make_search = &make_search;

        let tasks = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.config.num_tasks)
                .map(|task| {
                    scope.spawn(move || {
                        let mut supplier = make_supplier(task);
                        let mut search = make_search(task);
                        self.run_task(instance, task, &mut supplier, &mut search)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect::<Vec<_>>()
        });

        let outcome = MultiStartOutcome::new(tasks, start_time.elapsed());
        tracing::info!(
            best_task = ?outcome.best_task(),
            failed = outcome.num_failed(),
            elapsed = ?outcome.time_total(),
            "multi-start finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::StoppingCriterion,
        meta::{
            tabu_search::{TabuSearch, TabuSearchConfig},
            variable::VariableNeighborhood,
        },
    };
    use crate::test_support::{IntegerType, permissive_instance};
    use rand::Rng;
    use stackplan_model::assignment::Assignment;
    use stackplan_search::supplier::FirstFitConstructor;

    fn random_instance(seed: u64) -> Instance<IntegerType> {
        permissive_instance(seed, 6, 3, 3, 30)
    }

    fn multistart(num_tasks: usize) -> MultiStart<IntegerType> {
        MultiStart::new(
            MultiStartConfig::new(num_tasks, 42),
            LocalSearchConfig::default()
                .with_stopping_criterion(StoppingCriterion::Iterations(50)),
        )
    }

    fn tabu(_: usize) -> TabuSearch<IntegerType> {
        TabuSearch::new(TabuSearchConfig::default(), VariableNeighborhood::default())
    }

    #[test]
    fn test_best_task_has_lowest_objective() {
        let instance = random_instance(5);
        let outcome = multistart(4).run(&instance, |_| FirstFitConstructor::default(), tabu);

        assert_eq!(outcome.tasks().len(), 4);
        assert_eq!(outcome.num_failed(), 0);
        let best = outcome.best().unwrap();
        for result in outcome.tasks() {
            let task = result.as_ref().unwrap();
            assert!(best.objective_value() <= task.objective_value());
            assert!(task.solution().assignment().is_feasible(&instance));
        }
        let best_task = outcome.best_task().unwrap();
        let first_with_best = outcome
            .tasks()
            .iter()
            .position(|r| r.as_ref().unwrap().objective_value() == best.objective_value())
            .unwrap();
        assert_eq!(best_task, first_with_best);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let instance = random_instance(8);
        let a = multistart(3).run(&instance, |_| FirstFitConstructor::default(), tabu);
        let b = multistart(3).run(&instance, |_| FirstFitConstructor::default(), tabu);

        for (x, y) in a.tasks().iter().zip(b.tasks()) {
            let (x, y) = (x.as_ref().unwrap(), y.as_ref().unwrap());
            assert_eq!(x.objective_value(), y.objective_value());
            assert_eq!(x.solution().assignment(), y.solution().assignment());
        }
    }

    /// Fails on odd tasks.
    struct OddFails {
        task: usize,
        inner: FirstFitConstructor,
    }

    impl FeasibleAssignmentSupplier<IntegerType> for OddFails {
        fn name(&self) -> &str {
            "OddFails"
        }

        fn supply<R>(
            &mut self,
            instance: &Instance<IntegerType>,
            rng: &mut R,
        ) -> Result<Assignment, SupplyError>
        where
            R: Rng + ?Sized,
        {
            if self.task % 2 == 1 {
                return Err(SupplyError::RestartsExhausted { restarts: 0 });
            }
            self.inner.supply(instance, rng)
        }
    }

    #[test]
    fn test_failed_tasks_are_reported() {
        let instance = random_instance(2);
        let outcome = multistart(4).run(
            &instance,
            |task| OddFails {
                task,
                inner: FirstFitConstructor::default(),
            },
            tabu,
        );

        assert_eq!(outcome.num_failed(), 2);
        assert_eq!(
            outcome.first_error(),
            Some(&SupplyError::RestartsExhausted { restarts: 0 })
        );
        assert_eq!(outcome.best_task().map(|t| t % 2), Some(0));
    }

    #[test]
    fn test_all_failed_has_no_best() {
        let instance = random_instance(2);
        let outcome = multistart(1).run(
            &instance,
            |_| OddFails {
                task: 1,
                inner: FirstFitConstructor::default(),
            },
            tabu,
        );
        assert!(outcome.best().is_none());
        assert!(outcome.into_best().is_none());
    }

    #[test]
    #[should_panic(expected = "zero tasks")]
    fn test_zero_tasks_panics() {
        let _ = MultiStartConfig::new(0, 0);
    }
}
