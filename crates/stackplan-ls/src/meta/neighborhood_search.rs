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

//! The contract between the local search engine and a metaheuristic.
//!
//! The engine owns the current and best solutions; the metaheuristic owns its
//! operators and whatever memory it needs. Each iteration the engine asks for
//! one neighbor and adopts it unconditionally. `None` means the metaheuristic
//! has nothing left to offer and ends the run.

use crate::operator::Candidate;
use rand::Rng;
use stackplan_model::instance::Instance;
use stackplan_search::{num::SolverNumeric, solution::Solution};

pub trait NeighborhoodSearch<T>
where
    T: SolverNumeric,
{
    /// Returns the name of the metaheuristic for logging and identification purposes.
    fn name(&self) -> &str;

    /// Resets all run state. Called once before the first `get_neighbor`.
    fn on_start(&mut self, instance: &Instance<T>, initial: &Solution<T>);

    /// Returns the next current solution, or `None` if no neighbor could be
    /// produced.
    fn get_neighbor<R>(
        &mut self,
        instance: &Instance<T>,
        current: &Solution<T>,
        best: &Solution<T>,
        rng: &mut R,
    ) -> Option<Candidate<T>>
    where
        R: Rng + ?Sized;

    /// Returns how often the short-term memory was cleared since `on_start`.
    fn tabu_list_clears(&self) -> u64 {
        0
    }
}
