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

use crate::{monitor::local_search_monitor::LocalSearchMonitor, stats::LocalSearchStatistics};
use stackplan_search::{monitor::search_command::SearchCommand, num::SolverNumeric, solution::Solution};

/// Forwards every event to its monitors in insertion order. The first monitor
/// asking to terminate decides the command.
pub struct CompositeLocalSearchMonitor<'a, T>
where
    T: SolverNumeric,
{
    monitors: Vec<Box<dyn LocalSearchMonitor<T> + 'a>>,
}

impl<'a, T> Default for CompositeLocalSearchMonitor<'a, T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<'a, T> CompositeLocalSearchMonitor<'a, T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            monitors: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: LocalSearchMonitor<T> + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl<'a, T> std::fmt::Debug for CompositeLocalSearchMonitor<'a, T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.monitors.iter().map(|m| m.name()))
            .finish()
    }
}

impl<'a, T> LocalSearchMonitor<T> for CompositeLocalSearchMonitor<'a, T>
where
    T: SolverNumeric,
{
    fn name(&self) -> &str {
        "CompositeLocalSearchMonitor"
    }

    fn on_start(&mut self, initial: &Solution<T>) {
        self.monitors.iter_mut().for_each(|m| m.on_start(initial));
    }

    fn on_step(&mut self, current: &Solution<T>, statistics: &LocalSearchStatistics) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_step(current, statistics));
    }

    fn on_new_best(&mut self, best: &Solution<T>, statistics: &LocalSearchStatistics) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_new_best(best, statistics));
    }

    fn on_end(&mut self, best: &Solution<T>, statistics: &LocalSearchStatistics) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_end(best, statistics));
    }

    fn search_command(&mut self, statistics: &LocalSearchStatistics) -> SearchCommand {
        self.monitors
            .iter_mut()
            .map(|m| m.search_command(statistics))
            .find(|command| matches!(command, SearchCommand::Terminate(_)))
            .unwrap_or(SearchCommand::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::no_op::NoOperationMonitor;
    use stackplan_model::assignment::Assignment;

    type IntegerType = i64;

    struct StopAfter(u64);

    impl LocalSearchMonitor<IntegerType> for StopAfter {
        fn name(&self) -> &str {
            "StopAfter"
        }

        fn search_command(&mut self, statistics: &LocalSearchStatistics) -> SearchCommand {
            if statistics.iterations >= self.0 {
                SearchCommand::Terminate(format!("stop after {}", self.0))
            } else {
                SearchCommand::Continue
            }
        }
    }

    #[derive(Default)]
    struct CountSteps(usize);

    impl LocalSearchMonitor<IntegerType> for &mut CountSteps {
        fn name(&self) -> &str {
            "CountSteps"
        }

        fn on_step(&mut self, _: &Solution<IntegerType>, _: &LocalSearchStatistics) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_first_terminate_wins() {
        let mut composite = CompositeLocalSearchMonitor::<IntegerType>::default();
        composite.add_monitor(NoOperationMonitor::new());
        composite.add_monitor(StopAfter(5));
        composite.add_monitor(StopAfter(3));
        assert_eq!(composite.len(), 3);

        let mut stats = LocalSearchStatistics {
            iterations: 3,
            ..Default::default()
        };
        assert_eq!(
            composite.search_command(&stats),
            SearchCommand::Terminate("stop after 3".to_string())
        );
        stats.iterations = 7;
        assert_eq!(
            composite.search_command(&stats),
            SearchCommand::Terminate("stop after 5".to_string())
        );
        stats.iterations = 1;
        assert_eq!(composite.search_command(&stats), SearchCommand::Continue);
    }

    #[test]
    fn test_forwards_steps_to_borrowed_monitor() {
        let mut counter = CountSteps::default();
        {
            let mut composite = CompositeLocalSearchMonitor::<IntegerType>::with_capacity(1);
            composite.add_monitor(&mut counter);
            let current = Solution::new(3, Assignment::new(0, 1, 1));
            let stats = LocalSearchStatistics::default();
            composite.on_step(&current, &stats);
            composite.on_step(&current, &stats);
            assert_eq!(format!("{:?}", composite), "[\"CountSteps\"]");
        }
        assert_eq!(counter.0, 2);
    }
}
