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

//! Branch-and-bound solver for the stacking problem.
//!
//! Nodes are partial assignments kept in a priority frontier. Each node
//! branches on its most conflicted unassigned item, one child per stack that
//! can take it. Every partial child is priced with the `MatchingBound`; a
//! feasible completion reported by the bound is offered to the incumbent, and
//! a tight completion closes the child's subtree outright. Nodes are
//! re-checked against the incumbent when popped. When the frontier runs dry
//! the incumbent is optimal, or the instance is infeasible if there is none.
//!
//! The solver owns the reusable bound buffers; a search session object holds
//! the per-run state, statistics and timing.

use crate::{
    bound::{Bound, MatchingBound, MatchingBoundConfig},
    monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor},
    node::{Frontier, NodeOrdering, SearchNode},
    result::BnbSolverOutcome,
    stats::BnbSolverStatistics,
};
use stackplan_model::{assignment::Assignment, instance::Instance, oracle::CompatibilityOracle};
use stackplan_search::{
    monitor::search_command::SearchCommand, num::SolverNumeric, result::TerminationReason,
    solution::Solution,
};

/// Configuration of the `BranchAndBoundSolver`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BnbConfig {
    pub node_ordering: NodeOrdering,
    pub bound: MatchingBoundConfig,
}

impl BnbConfig {
    #[inline]
    pub fn with_node_ordering(mut self, node_ordering: NodeOrdering) -> Self {
        self.node_ordering = node_ordering;
        self
    }

    #[inline]
    pub fn with_max_repair_passes(mut self, max_repair_passes: usize) -> Self {
        self.bound.max_repair_passes = max_repair_passes;
        self
    }
}

impl std::fmt::Display for BnbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BnbConfig(node_ordering: {}, max_repair_passes: {})",
            self.node_ordering, self.bound.max_repair_passes
        )
    }
}

/// An exact solver for the stacking problem.
#[derive(Clone, Debug)]
pub struct BranchAndBoundSolver<T>
where
    T: SolverNumeric,
{
    config: BnbConfig,
    bound: MatchingBound<T>,
}

impl<T> Default for BranchAndBoundSolver<T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BranchAndBoundSolver<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new() -> Self {
        Self::with_config(BnbConfig::default())
    }

    #[inline]
    pub fn with_config(config: BnbConfig) -> Self {
        Self {
            config,
            bound: MatchingBound::new(config.bound),
        }
    }

    /// Creates a solver whose bound buffers are sized for `num_slots` slots.
    #[inline]
    pub fn preallocated(num_slots: usize, config: BnbConfig) -> Self {
        Self {
            config,
            bound: MatchingBound::preallocated(num_slots, config.bound),
        }
    }

    #[inline]
    pub fn config(&self) -> &BnbConfig {
        &self.config
    }

    /// Solves `instance` to optimality unless `monitor` stops the run.
    pub fn solve<S>(&mut self, instance: &Instance<T>, monitor: S) -> BnbSolverOutcome<T>
    where
        S: TreeSearchMonitor<T>,
    {
        self.solve_with_incumbent(instance, None, monitor)
    }

    /// Solves `instance`, starting from `incumbent` as the best known
    /// solution. An infeasible incumbent is ignored.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            items = instance.num_items(),
            stacks = instance.num_stacks(),
            ordering = %self.config.node_ordering
        )
    )]
    pub fn solve_with_incumbent<S>(
        &mut self,
        instance: &Instance<T>,
        incumbent: Option<Assignment>,
        mut monitor: S,
    ) -> BnbSolverOutcome<T>
    where
        S: TreeSearchMonitor<T>,
    {
        let session = BnbSolverSearchSession::new(self, instance, &mut monitor);
        session.run(incumbent)
    }
}

/// A single search run.
struct BnbSolverSearchSession<'a, T, S>
where
    T: SolverNumeric,
{
    instance: &'a Instance<T>,
    bound: &'a mut MatchingBound<T>,
    monitor: &'a mut S,
    frontier: Frontier<T>,
    best_solution: Option<Solution<T>>,
    stats: BnbSolverStatistics<T>,
    start_time: std::time::Instant,
}

impl<'a, T, S> BnbSolverSearchSession<'a, T, S>
where
    T: SolverNumeric,
    S: TreeSearchMonitor<T>,
{
    fn new(solver: &'a mut BranchAndBoundSolver<T>, instance: &'a Instance<T>, monitor: &'a mut S) -> Self {
        Self {
            instance,
            frontier: Frontier::new(solver.config.node_ordering),
            bound: &mut solver.bound,
            monitor,
            best_solution: None,
            stats: BnbSolverStatistics::default(),
            start_time: std::time::Instant::now(),
        }
    }

    fn run(mut self, incumbent: Option<Assignment>) -> BnbSolverOutcome<T> {
        self.monitor.on_enter_search(self.instance, &self.stats);

        if let Some(assignment) = incumbent {
            if assignment.is_feasible(self.instance) {
                self.offer_solution(assignment);
            } else {
                tracing::warn!("ignoring infeasible initial incumbent");
            }
        }

        self.initialize();

        let termination_reason = loop {
            if let SearchCommand::Terminate(msg) = self.monitor.search_command(&self.stats) {
                break TerminationReason::Aborted(msg);
            }

            let Some(node) = self.frontier.pop() else {
                break if self.best_solution.is_some() {
                    TerminationReason::OptimalityProven
                } else {
                    TerminationReason::InfeasibilityProven
                };
            };

            self.stats.on_node_explored();
            self.monitor.on_step(&node, &self.stats);

            if self.is_dominated(node.bound()) {
                self.stats.on_pruning_bound();
                self.monitor
                    .on_prune(node.assignment(), PruneReason::BoundDominated, &self.stats);
                continue;
            }

            self.expand(&node);
        };

        self.stats.set_total_time(self.start_time.elapsed());
        self.monitor.on_exit_search(&self.stats);
        tracing::debug!(
            reason = %termination_reason,
            nodes = self.stats.nodes_explored,
            best = ?self.best_solution.as_ref().map(Solution::objective_value),
            "branch-and-bound terminated"
        );
        self.finalize_result(termination_reason)
    }

    fn finalize_result(self, reason: TerminationReason) -> BnbSolverOutcome<T> {
        match (reason, self.best_solution) {
            (TerminationReason::OptimalityProven, Some(solution)) => {
                BnbSolverOutcome::optimal(solution, self.stats)
            }
            (TerminationReason::Aborted(msg), best) => {
                BnbSolverOutcome::aborted(best, msg, self.stats)
            }
            (_, _) => BnbSolverOutcome::infeasible(self.stats),
        }
    }

    /// Prices the root and seeds the frontier.
    fn initialize(&mut self) {
        let root = Assignment::for_instance(self.instance);
        if root.is_complete() {
            // No items at all.
            self.offer_solution(root);
            return;
        }

        let bound = self.bound.compute(self.instance, &root);
        self.stats.set_root_lower_bound(bound.value());
        self.monitor
            .on_lower_bound_computed(&root, &bound, &self.stats);
        self.admit(root, bound, 0);
    }

    /// Branches on the most conflicted unassigned item of `node`.
    fn expand(&mut self, node: &SearchNode<T>) {
        let parent = node.assignment();
        let Some(item) = node
            .conflicts()
            .most_conflicted(|item| !parent.is_assigned(item))
        else {
            return;
        };

        let oracle = CompatibilityOracle::new(self.instance);
        let depth = node.depth() + 1;
        let mut enqueued = 0;

        for stack in self.instance.stacks() {
            if !oracle.can_place(item, parent, stack) {
                continue;
            }

            let mut child = parent.clone();
            child.place(item, stack);
            self.stats.on_child_generated();
            self.stats.on_depth_update(depth as u64);

            if child.is_complete() {
                child.reorder_by_constraints(self.instance);
                if child.is_feasible(self.instance) {
                    self.offer_solution(child);
                } else {
                    self.stats.on_pruning_infeasible();
                    self.monitor
                        .on_prune(&child, PruneReason::Infeasible, &self.stats);
                }
                continue;
            }

            let bound = self.bound.compute(self.instance, &child);
            self.monitor
                .on_lower_bound_computed(&child, &bound, &self.stats);
            if self.admit(child, bound, depth) {
                enqueued += 1;
            }
        }

        self.stats.on_frontier_size(self.frontier.len() as u64);
        self.monitor
            .on_children_enqueued(node, enqueued, &self.stats);
    }

    /// Applies the bound of a partial assignment: prune, promote, or push.
    /// Returns `true` if the node was pushed onto the frontier.
    fn admit(&mut self, assignment: Assignment, bound: Bound<T>, depth: usize) -> bool {
        if !bound.is_relaxation_feasible() {
            self.stats.on_pruning_infeasible();
            self.monitor
                .on_prune(&assignment, PruneReason::Infeasible, &self.stats);
            return false;
        }

        let value = bound.value();
        let tight = bound.is_tight();
        let (completion, conflicts) = bound.into_parts();

        if let Some(completion) = completion {
            self.stats.on_promotion();
            self.monitor.on_promotion(&completion, tight, &self.stats);
            self.offer_solution(completion);
        }

        if tight {
            self.stats.on_tight_closure();
            return false;
        }

        if self.is_dominated(value) {
            self.stats.on_pruning_bound();
            self.monitor
                .on_prune(&assignment, PruneReason::BoundDominated, &self.stats);
            return false;
        }

        self.frontier
            .push(SearchNode::new(assignment, value, conflicts, depth));
        true
    }

    #[inline]
    fn is_dominated(&self, bound: T) -> bool {
        self.best_solution
            .as_ref()
            .is_some_and(|best| bound >= best.objective_value())
    }

    /// Installs `assignment` as the incumbent if it is strictly cheaper.
    fn offer_solution(&mut self, assignment: Assignment) {
        let cost = assignment.cost(self.instance);
        if self
            .best_solution
            .as_ref()
            .is_some_and(|best| cost >= best.objective_value())
        {
            return;
        }

        let solution = Solution::new(cost, assignment);
        self.stats.on_solution_found();
        self.monitor.on_solution_found(&solution, &self.stats);
        tracing::trace!(objective = %cost, "incumbent improved");
        self.best_solution = Some(solution);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        monitor::{no_op::NoOperationMonitor, time_limit::TimeLimitMonitor},
        test_support::{IntegerType, brute_force_completion, init_tracing, random_instance},
    };
    use proptest::prelude::*;
    use stackplan_model::{
        index::{ItemIndex, StackIndex},
        instance::{InstanceBuilder, ineligibility_sentinel},
    };
    use stackplan_search::result::SolverResult;

    fn ii(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn si(s: usize) -> StackIndex {
        StackIndex::new(s)
    }

    fn optimal_objective(outcome: &BnbSolverOutcome<IntegerType>) -> IntegerType {
        match outcome.result() {
            SolverResult::Optimal(solution) => solution.objective_value(),
            other => panic!("expected an optimal result, got {}", other),
        }
    }

    #[test]
    fn test_four_items_two_stacks_matches_brute_force() {
        init_tracing();
        let mut b = InstanceBuilder::<IntegerType>::new(4, 2, 2);
        b.allow_all_stacking()
            .set_item_costs(ii(0), &[3, 8])
            .set_item_costs(ii(1), &[2, 6])
            .set_item_costs(ii(2), &[7, 1])
            .set_item_costs(ii(3), &[4, 4]);
        let inst = b.build().unwrap();

        let outcome = BranchAndBoundSolver::new().solve(&inst, NoOperationMonitor::new());
        let expected =
            brute_force_completion(&inst, &Assignment::for_instance(&inst)).unwrap();
        assert_eq!(optimal_objective(&outcome), expected);
        assert_eq!(expected, 3 + 2 + 1 + 4);
        assert_eq!(
            outcome.termination_reason(),
            &TerminationReason::OptimalityProven
        );
        let solution = outcome.result().solution().unwrap();
        assert!(solution.assignment().is_feasible(&inst));
    }

    #[test]
    fn test_stacking_order_forces_expensive_stack() {
        // Item 1 may only sit above item 0, never below; item 2 shares nothing.
        let mut b = InstanceBuilder::<IntegerType>::new(3, 2, 2);
        b.allow_stacking(ii(1), ii(0))
            .set_item_costs(ii(0), &[0, 5])
            .set_item_costs(ii(1), &[0, 5])
            .set_item_costs(ii(2), &[0, 5]);
        let inst = b.build().unwrap();

        let outcome = BranchAndBoundSolver::new().solve(&inst, NoOperationMonitor::new());
        assert_eq!(optimal_objective(&outcome), 5);
        let a = outcome.result().solution().unwrap().assignment();
        assert_eq!(a.stack_of(ii(2)), Some(si(1)));
        assert_eq!(a.column(si(0)), &[Some(ii(0)), Some(ii(1))]);
    }

    #[test]
    fn test_infeasible_instance_is_proven() {
        // Three mutually incompatible items, two stacks.
        let inst = InstanceBuilder::<IntegerType>::new(3, 2, 2).build().unwrap();
        let outcome = BranchAndBoundSolver::new().solve(&inst, NoOperationMonitor::new());
        assert_eq!(outcome.result(), &SolverResult::Infeasible);
        assert_eq!(
            outcome.termination_reason(),
            &TerminationReason::InfeasibilityProven
        );
    }

    #[test]
    fn test_costs_near_sentinel_still_solve_to_optimality() {
        let s = ineligibility_sentinel::<IntegerType>(2).unwrap();
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(ii(0), &[s - 1, 0])
            .forbid(ii(0), si(1))
            .set_item_costs(ii(1), &[0, s - 1]);
        let inst = b.build().unwrap();

        let outcome = BranchAndBoundSolver::new().solve(&inst, NoOperationMonitor::new());
        assert_eq!(optimal_objective(&outcome), 2 * s - 2);
        let a = outcome.result().solution().unwrap().assignment();
        assert_eq!(a.stack_of(ii(0)), Some(si(0)));
        assert_eq!(a.stack_of(ii(1)), Some(si(1)));
    }

    #[test]
    fn test_empty_instance_is_trivially_optimal() {
        let inst = InstanceBuilder::<IntegerType>::new(0, 2, 2).build().unwrap();
        let outcome = BranchAndBoundSolver::new().solve(&inst, NoOperationMonitor::new());
        assert_eq!(optimal_objective(&outcome), 0);
    }

    #[test]
    fn test_initial_incumbent_is_kept_when_optimal() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(ii(0), &[1, 9]).set_item_costs(ii(1), &[9, 1]);
        let inst = b.build().unwrap();
        let seed = Assignment::from_columns(2, 1, &[vec![ii(0)], vec![ii(1)]]);

        let outcome = BranchAndBoundSolver::new().solve_with_incumbent(
            &inst,
            Some(seed.clone()),
            NoOperationMonitor::new(),
        );
        assert_eq!(optimal_objective(&outcome), 2);
        assert_eq!(outcome.statistics().solutions_found, 1);
        assert_eq!(outcome.result().solution().unwrap().assignment(), &seed);
    }

    #[test]
    fn test_infeasible_incumbent_is_ignored() {
        let mut b = InstanceBuilder::<IntegerType>::new(2, 2, 1);
        b.set_item_costs(ii(0), &[1, 9]).set_item_costs(ii(1), &[9, 1]);
        let inst = b.build().unwrap();
        let partial = Assignment::from_columns(2, 1, &[vec![ii(0)], vec![]]);
        let outcome = BranchAndBoundSolver::new().solve_with_incumbent(
            &inst,
            Some(partial),
            NoOperationMonitor::new(),
        );
        assert_eq!(optimal_objective(&outcome), 2);
    }

    #[test]
    fn test_monitor_can_abort() {
        let inst = random_instance(11, 6, 3, 2);
        let outcome = BranchAndBoundSolver::new().solve(
            &inst,
            TimeLimitMonitor::new(std::time::Duration::ZERO, 1),
        );
        // Either the root already closed the search, or the limit fired.
        match outcome.termination_reason() {
            TerminationReason::Aborted(msg) => assert!(msg.contains("Time limit")),
            TerminationReason::OptimalityProven | TerminationReason::InfeasibilityProven => {}
        }
    }

    #[test]
    fn test_orderings_agree() {
        let inst = random_instance(3, 5, 3, 2);
        let expected = brute_force_completion(&inst, &Assignment::for_instance(&inst));
        for ordering in [
            NodeOrdering::Combined,
            NodeOrdering::BestFirst,
            NodeOrdering::BreadthFirst,
        ] {
            let config = BnbConfig::default().with_node_ordering(ordering);
            let outcome = BranchAndBoundSolver::with_config(config)
                .solve(&inst, NoOperationMonitor::new());
            assert_eq!(
                outcome.result().solution().map(Solution::objective_value),
                expected,
                "ordering {}",
                ordering
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_matches_brute_force(seed in any::<u64>(), passes in 0usize..3) {
            let inst = random_instance(seed, 5, 2, 3);
            let expected = brute_force_completion(&inst, &Assignment::for_instance(&inst));
            let config = BnbConfig::default().with_max_repair_passes(passes);
            let outcome = BranchAndBoundSolver::with_config(config)
                .solve(&inst, NoOperationMonitor::new());
            match expected {
                Some(best) => {
                    prop_assert!(matches!(outcome.result(), SolverResult::Optimal(_)));
                    prop_assert_eq!(outcome.result().solution().map(Solution::objective_value), Some(best));
                }
                None => prop_assert_eq!(outcome.result(), &SolverResult::Infeasible),
            }
        }
    }
}
