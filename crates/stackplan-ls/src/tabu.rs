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

//! Short-term memory of recent moves.
//!
//! `TabuList` is a bounded FIFO of `Move`s with constant-time membership. A
//! move already in the list is not queued twice, so the queue and the set
//! always hold the same moves.

use rustc_hash::FxHashSet;
use stackplan_model::moves::Move;
use std::collections::VecDeque;

/// A bounded FIFO of forbidden moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabuList {
    max_len: usize,
    queue: VecDeque<Move>,
    set: FxHashSet<Move>,
}

impl TabuList {
    /// Creates an empty tabu list holding at most `max_len` moves.
    ///
    /// # Panics
    ///
    /// Panics if `max_len` is 0.
    pub fn new(max_len: usize) -> Self {
        assert!(max_len > 0, "called `TabuList::new` with zero max_len");
        Self {
            max_len,
            queue: VecDeque::new(),
            set: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn is_tabu(&self, mv: &Move) -> bool {
        self.set.contains(mv)
    }

    /// Returns `true` if any of `moves` is tabu.
    #[inline]
    pub fn contains_any(&self, moves: &[Move]) -> bool {
        moves.iter().any(|mv| self.set.contains(mv))
    }

    /// Appends `moves`, then drops the oldest entries until the list fits.
    pub fn forbid(&mut self, moves: &[Move]) {
        for &mv in moves {
            if self.set.insert(mv) {
                self.queue.push_back(mv);
            }
        }
        while self.queue.len() > self.max_len
            && let Some(oldest) = self.queue.pop_front()
        {
            self.set.remove(&oldest);
        }
        debug_assert_eq!(
            self.queue.len(),
            self.set.len(),
            "called `TabuList::forbid` and the queue and set diverged"
        );
    }

    #[inline]
    pub fn clear(&mut self) {
        self.queue.clear();
        self.set.clear();
    }

    /// Returns the moves from oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.queue.iter()
    }
}

impl std::fmt::Display for TabuList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TabuList(len: {}, max_len: {})", self.len(), self.max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_model::index::{ItemIndex, StackIndex};

    fn mv(item: usize, stack: usize) -> Move {
        Move::new(ItemIndex::new(item), StackIndex::new(stack))
    }

    #[test]
    fn test_forbid_and_lookup() {
        let mut list = TabuList::new(4);
        assert!(list.is_empty());
        list.forbid(&[mv(0, 1), mv(2, 0)]);
        assert_eq!(list.len(), 2);
        assert!(list.is_tabu(&mv(0, 1)));
        assert!(!list.is_tabu(&mv(0, 0)));
        assert!(list.contains_any(&[mv(5, 5), mv(2, 0)]));
        assert!(!list.contains_any(&[mv(5, 5)]));
    }

    #[test]
    fn test_oldest_entries_expire() {
        let mut list = TabuList::new(3);
        list.forbid(&[mv(0, 0), mv(1, 0)]);
        list.forbid(&[mv(2, 0), mv(3, 0)]);
        assert_eq!(list.len(), 3);
        assert!(!list.is_tabu(&mv(0, 0)));
        let order: Vec<Move> = list.iter().copied().collect();
        assert_eq!(order, vec![mv(1, 0), mv(2, 0), mv(3, 0)]);
    }

    #[test]
    fn test_duplicates_are_not_queued_twice() {
        let mut list = TabuList::new(2);
        list.forbid(&[mv(0, 0)]);
        list.forbid(&[mv(0, 0)]);
        assert_eq!(list.len(), 1);
        list.forbid(&[mv(1, 0), mv(2, 0)]);
        assert_eq!(list.len(), 2);
        assert!(!list.is_tabu(&mv(0, 0)));
    }

    #[test]
    fn test_clear() {
        let mut list = TabuList::new(2);
        list.forbid(&[mv(0, 0)]);
        list.clear();
        assert!(list.is_empty());
        assert!(!list.is_tabu(&mv(0, 0)));
    }

    #[test]
    #[should_panic(expected = "zero max_len")]
    fn test_zero_length_panics() {
        let _ = TabuList::new(0);
    }
}
