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

//! Observer hooks for `LocalSearchEngine::run`.
//!
//! Every event hook has an empty default, so a monitor implements only what
//! it watches. `search_command` is polled once per outer iteration; returning
//! `SearchCommand::Terminate` ends the run with an `Aborted` reason.

use crate::stats::LocalSearchStatistics;
use stackplan_search::{monitor::search_command::SearchCommand, num::SolverNumeric, solution::Solution};

pub trait LocalSearchMonitor<T>
where
    T: SolverNumeric,
{
    fn name(&self) -> &str;

    /// Called once with the start solution, after the initial stack matching.
    fn on_start(&mut self, _initial: &Solution<T>) {}

    /// Called after every outer iteration with the solution the search moved to.
    fn on_step(&mut self, _current: &Solution<T>, _statistics: &LocalSearchStatistics) {}

    /// Called whenever the best solution strictly improves, including
    /// improvements found by the final stack matching.
    fn on_new_best(&mut self, _best: &Solution<T>, _statistics: &LocalSearchStatistics) {}

    fn on_end(&mut self, _best: &Solution<T>, _statistics: &LocalSearchStatistics) {}

    fn search_command(&mut self, _statistics: &LocalSearchStatistics) -> SearchCommand {
        SearchCommand::Continue
    }
}
