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

//! Tabu Search metaheuristic.
//!
//! Candidates come from the variable neighborhood. Short-term memory is a
//! `TabuList` of moves: a candidate is tabu if any of the moves that produced
//! it is in the list.
//!
//! # Mechanisms
//!
//! 1.  **Batch:** Feasible non-tabu candidates of any cost are collected until
//!     `number_of_neighbors` are in the batch; the cheapest wins and its moves
//!     become tabu. Under `FirstFit`, a strictly improving non-tabu candidate
//!     is returned immediately.
//! 2.  **Aspiration:** A tabu candidate strictly better than the best solution
//!     is admissible anyway.
//! 3.  **Clears:** After `unsuccessful_attempts` consecutive tabu-blocked
//!     attempts, an empty batch clears the tabu list, a non-empty batch is
//!     returned as is.
//!
//! Infeasible candidates and `NoMove` results are skipped. Every attempt counts
//! toward `max_attempts_per_call`; reaching it ends the call with the batch's
//! best, or `None` for an empty batch.

use crate::{
    meta::{neighborhood_search::NeighborhoodSearch, variable::VariableNeighborhood},
    operator::Candidate,
    tabu::TabuList,
};
use rand::Rng;
use stackplan_model::instance::Instance;
use stackplan_search::{num::SolverNumeric, solution::Solution};

/// How a batch of candidates is turned into the next solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NeighborSelection {
    /// Return the first admissible, strictly improving candidate.
    FirstFit,
    /// Collect `number_of_neighbors` admissible candidates, return the best.
    #[default]
    BestFit,
}

impl std::fmt::Display for NeighborSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborSelection::FirstFit => write!(f, "FirstFit"),
            NeighborSelection::BestFit => write!(f, "BestFit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabuSearchConfig {
    pub selection: NeighborSelection,
    pub number_of_neighbors: usize,
    pub max_tabu_list_length: usize,
    pub unsuccessful_attempts: usize,
    pub max_attempts_per_call: usize,
}

impl Default for TabuSearchConfig {
    fn default() -> Self {
        Self {
            selection: NeighborSelection::default(),
            number_of_neighbors: Self::DEFAULT_NUMBER_OF_NEIGHBORS,
            max_tabu_list_length: Self::DEFAULT_NUMBER_OF_NEIGHBORS
                * Self::DEFAULT_TABU_LIST_LENGTH_FACTOR,
            unsuccessful_attempts: Self::DEFAULT_UNSUCCESSFUL_ATTEMPTS,
            max_attempts_per_call: Self::DEFAULT_MAX_ATTEMPTS_PER_CALL,
        }
    }
}

impl TabuSearchConfig {
    pub const DEFAULT_NUMBER_OF_NEIGHBORS: usize = 1;
    pub const DEFAULT_TABU_LIST_LENGTH_FACTOR: usize = 1000;
    pub const DEFAULT_UNSUCCESSFUL_ATTEMPTS: usize = 300;
    pub const DEFAULT_MAX_ATTEMPTS_PER_CALL: usize = 3000;

    #[inline]
    pub fn with_selection(mut self, selection: NeighborSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the batch size and scales the tabu list length with it.
    #[inline]
    pub fn with_number_of_neighbors(mut self, number_of_neighbors: usize) -> Self {
        self.number_of_neighbors = number_of_neighbors;
        self.max_tabu_list_length =
            number_of_neighbors.saturating_mul(Self::DEFAULT_TABU_LIST_LENGTH_FACTOR);
        self
    }

    #[inline]
    pub fn with_max_tabu_list_length(mut self, max_tabu_list_length: usize) -> Self {
        self.max_tabu_list_length = max_tabu_list_length;
        self
    }

    #[inline]
    pub fn with_unsuccessful_attempts(mut self, unsuccessful_attempts: usize) -> Self {
        self.unsuccessful_attempts = unsuccessful_attempts;
        self
    }

    #[inline]
    pub fn with_max_attempts_per_call(mut self, max_attempts_per_call: usize) -> Self {
        self.max_attempts_per_call = max_attempts_per_call;
        self
    }
}

impl std::fmt::Display for TabuSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TabuSearchConfig(selection: {}, neighbors: {}, tabu length: {}, unsuccessful attempts: {}, max attempts: {})",
            self.selection,
            self.number_of_neighbors,
            self.max_tabu_list_length,
            self.unsuccessful_attempts,
            self.max_attempts_per_call
        )
    }
}

#[derive(Debug, Clone)]
pub struct TabuSearch<T> {
    config: TabuSearchConfig,
    neighborhood: VariableNeighborhood<T>,
    tabu_list: TabuList,
    tabu_list_clears: u64,
    batch: Vec<Candidate<T>>,
}

impl<T> TabuSearch<T>
where
    T: SolverNumeric,
{
    /// Creates a tabu search over `neighborhood`.
    ///
    /// # Panics
    ///
    /// Panics if the batch size, the tabu list length, the unsuccessful
    /// attempt threshold or the attempt cap is zero.
    pub fn new(config: TabuSearchConfig, neighborhood: VariableNeighborhood<T>) -> Self {
        assert!(
            config.number_of_neighbors > 0,
            "called `TabuSearch::new` with zero number_of_neighbors"
        );
        assert!(
            config.unsuccessful_attempts > 0,
            "called `TabuSearch::new` with zero unsuccessful_attempts"
        );
        assert!(
            config.max_attempts_per_call > 0,
            "called `TabuSearch::new` with zero max_attempts_per_call"
        );
        Self {
            tabu_list: TabuList::new(config.max_tabu_list_length),
            batch: Vec::with_capacity(config.number_of_neighbors),
            config,
            neighborhood,
            tabu_list_clears: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &TabuSearchConfig {
        &self.config
    }

    #[inline]
    pub fn tabu_list(&self) -> &TabuList {
        &self.tabu_list
    }

    /// Removes and returns the cheapest batch entry; ties go to the earliest.
    fn take_best(&mut self) -> Option<Candidate<T>> {
        let (pos, _) = self
            .batch
            .iter()
            .enumerate()
            .min_by_key(|(_, candidate)| candidate.cost())?;
        Some(self.batch.swap_remove(pos))
    }

    fn clear_tabu_list(&mut self) {
        self.tabu_list.clear();
        self.tabu_list_clears = self.tabu_list_clears.saturating_add(1);
        tracing::debug!(clears = self.tabu_list_clears, "tabu list cleared");
    }
}

impl<T> NeighborhoodSearch<T> for TabuSearch<T>
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        "TabuSearch"
    }

    fn on_start(&mut self, _instance: &Instance<T>, _initial: &Solution<T>) {
        self.tabu_list.clear();
        self.tabu_list_clears = 0;
        self.batch.clear();
    }

    fn get_neighbor<R>(
        &mut self,
        instance: &Instance<T>,
        current: &Solution<T>,
        best: &Solution<T>,
        rng: &mut R,
    ) -> Option<Candidate<T>>
    where
        R: Rng + ?Sized,
    {
        let first_fit = self.config.selection == NeighborSelection::FirstFit;
        let current_cost = current.objective_value();
        let best_cost = best.objective_value();
        self.batch.clear();
        let mut failed = 0usize;
        let mut attempts = 0usize;

        while self.batch.len() < self.config.number_of_neighbors {
            if attempts >= self.config.max_attempts_per_call {
                tracing::debug!(
                    attempts,
                    batch = self.batch.len(),
                    "tabu search reached its attempt cap"
                );
                break;
            }
            attempts += 1;

            let Some(candidate) = self
                .neighborhood
                .generate(instance, current, rng)
                .into_candidate()
            else {
                continue;
            };
            if !candidate.is_feasible(instance) {
                continue;
            }

            if !self.tabu_list.contains_any(candidate.moves()) {
                if first_fit && candidate.cost() < current_cost {
                    self.tabu_list.forbid(candidate.moves());
                    return Some(candidate);
                }
                self.batch.push(candidate);
                failed = 0;
                continue;
            }

            if candidate.cost() < best_cost {
                tracing::trace!(cost = %candidate.cost(), "aspiration overrides tabu status");
                if first_fit {
                    // Aspiration hits are forbidden like any accepted move.
                    self.tabu_list.forbid(candidate.moves());
                    return Some(candidate);
                }
                self.batch.push(candidate);
                failed = 0;
                continue;
            }

            failed += 1;
            if failed >= self.config.unsuccessful_attempts {
                failed = 0;
                if self.batch.is_empty() {
                    self.clear_tabu_list();
                } else {
                    return self.take_best();
                }
            }
        }

        let chosen = self.take_best()?;
        self.tabu_list.forbid(chosen.moves());
        Some(chosen)
    }

    fn tabu_list_clears(&self) -> u64 {
        self.tabu_list_clears
    }
}
