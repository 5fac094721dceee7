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

//! Runtime choice between the local search metaheuristics.

use rand::Rng;
use stackplan_ls::{
    meta::{
        hill_climbing::HillClimbing,
        neighborhood_search::NeighborhoodSearch,
        tabu_search::{TabuSearch, TabuSearchConfig},
        variable::VariableNeighborhood,
    },
    operator::Candidate,
};
use stackplan_model::instance::Instance;
use stackplan_search::{num::SolverNumeric, solution::Solution};

/// Which metaheuristic the heuristic entry points use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metaheuristic {
    #[default]
    TabuSearch,
    HillClimbing,
}

impl std::fmt::Display for Metaheuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metaheuristic::TabuSearch => write!(f, "TabuSearch"),
            Metaheuristic::HillClimbing => write!(f, "HillClimbing"),
        }
    }
}

/// A metaheuristic chosen at runtime.
#[derive(Debug, Clone)]
pub enum SearchStrategy<T>
where
    T: SolverNumeric,
{
    TabuSearch(TabuSearch<T>),
    HillClimbing(HillClimbing<T>),
}

impl<T> SearchStrategy<T>
where
    T: SolverNumeric,
{
    /// Builds the strategy with operator buffers sized for the instance.
    pub fn build(
        kind: Metaheuristic,
        tabu_config: TabuSearchConfig,
        num_items: usize,
        num_stacks: usize,
    ) -> Self {
        let neighborhood = VariableNeighborhood::preallocated(num_items, num_stacks);
        match kind {
            Metaheuristic::TabuSearch => {
                SearchStrategy::TabuSearch(TabuSearch::new(tabu_config, neighborhood))
            }
            Metaheuristic::HillClimbing => SearchStrategy::HillClimbing(HillClimbing::new(
                neighborhood,
                HillClimbing::<T>::DEFAULT_ATTEMPTS_PER_OPERATOR,
            )),
        }
    }

    #[inline]
    pub fn kind(&self) -> Metaheuristic {
        match self {
            SearchStrategy::TabuSearch(_) => Metaheuristic::TabuSearch,
            SearchStrategy::HillClimbing(_) => Metaheuristic::HillClimbing,
        }
    }
}

impl<T> NeighborhoodSearch<T> for SearchStrategy<T>
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        match self {
            SearchStrategy::TabuSearch(s) => s.name(),
            SearchStrategy::HillClimbing(s) => s.name(),
        }
    }

    fn on_start(&mut self, instance: &Instance<T>, initial: &Solution<T>) {
        match self {
            SearchStrategy::TabuSearch(s) => s.on_start(instance, initial),
            SearchStrategy::HillClimbing(s) => s.on_start(instance, initial),
        }
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
        match self {
            SearchStrategy::TabuSearch(s) => s.get_neighbor(instance, current, best, rng),
            SearchStrategy::HillClimbing(s) => s.get_neighbor(instance, current, best, rng),
        }
    }

    fn tabu_list_clears(&self) -> u64 {
        match self {
            SearchStrategy::TabuSearch(s) => s.tabu_list_clears(),
            SearchStrategy::HillClimbing(s) => s.tabu_list_clears(),
        }
    }
}
