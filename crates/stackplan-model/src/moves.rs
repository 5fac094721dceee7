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

//! Relocation descriptors.
//!
//! A `Move` says "item `i` went to stack `s`". Operators report the moves they
//! performed, and tabu search keys its short-term memory on them; equality and
//! hashing are by value. A `Swap` is the ordered pair of moves produced by
//! exchanging two items between stacks.

use crate::index::{ItemIndex, StackIndex};

/// An atomic relocation of one item to a target stack.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Move {
    item: ItemIndex,
    target: StackIndex,
}

impl Move {
    #[inline]
    pub const fn new(item: ItemIndex, target: StackIndex) -> Self {
        Self { item, target }
    }

    #[inline]
    pub const fn item(&self) -> ItemIndex {
        self.item
    }

    #[inline]
    pub const fn target(&self) -> StackIndex {
        self.target
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Move({} -> {})", self.item, self.target)
    }
}

/// Two items exchanging their stacks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Swap {
    first: Move,
    second: Move,
}

impl Swap {
    /// Creates the swap of `a` (currently on `stack_a`) with `b` (currently on
    /// `stack_b`), recorded as `Move(a, stack_b)` followed by `Move(b, stack_a)`.
    #[inline]
    pub const fn new(a: ItemIndex, stack_a: StackIndex, b: ItemIndex, stack_b: StackIndex) -> Self {
        Self {
            first: Move::new(a, stack_b),
            second: Move::new(b, stack_a),
        }
    }

    #[inline]
    pub const fn first(&self) -> Move {
        self.first
    }

    #[inline]
    pub const fn second(&self) -> Move {
        self.second
    }

    /// Returns both moves in recording order.
    #[inline]
    pub const fn moves(&self) -> [Move; 2] {
        [self.first, self.second]
    }
}

impl std::fmt::Display for Swap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Swap({}, {})", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_move_value_semantics() {
        let a = Move::new(ItemIndex::new(1), StackIndex::new(2));
        let b = Move::new(ItemIndex::new(1), StackIndex::new(2));
        let c = Move::new(ItemIndex::new(1), StackIndex::new(3));
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Move> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_swap_records_cross_moves() {
        let swap = Swap::new(
            ItemIndex::new(0),
            StackIndex::new(4),
            ItemIndex::new(7),
            StackIndex::new(1),
        );
        assert_eq!(swap.first(), Move::new(ItemIndex::new(0), StackIndex::new(1)));
        assert_eq!(swap.second(), Move::new(ItemIndex::new(7), StackIndex::new(4)));
        assert_eq!(swap.moves().len(), 2);
    }

    #[test]
    fn test_display() {
        let m = Move::new(ItemIndex::new(3), StackIndex::new(0));
        assert_eq!(m.to_string(), "Move(ItemIndex(3) -> StackIndex(0))");
    }
}
