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

//! Errors raised while validating an instance.

use crate::index::{ItemIndex, StackIndex};

/// A matrix handed to the instance builder has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionMismatchError {
    what: &'static str,
    expected: usize,
    found: usize,
}

impl DimensionMismatchError {
    pub fn new(what: &'static str, expected: usize, found: usize) -> Self {
        Self {
            what,
            expected,
            found,
        }
    }

    pub fn what(&self) -> &'static str {
        self.what
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn found(&self) -> usize {
        self.found
    }
}

impl std::fmt::Display for DimensionMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has dimension {} but {} was expected",
            self.what, self.found, self.expected
        )
    }
}

impl std::error::Error for DimensionMismatchError {}

/// A finite cost is too negative to be summed safely with the other costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostOutOfRangeError {
    item: ItemIndex,
    stack: StackIndex,
}

impl CostOutOfRangeError {
    pub fn new(item: ItemIndex, stack: StackIndex) -> Self {
        Self { item, stack }
    }

    pub fn item(&self) -> ItemIndex {
        self.item
    }

    pub fn stack(&self) -> StackIndex {
        self.stack
    }
}

impl std::fmt::Display for CostOutOfRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cost of {} on {} is below the negated ineligibility sentinel",
            self.item, self.stack
        )
    }
}

impl std::error::Error for CostOutOfRangeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceBuildError {
    /// The instance has no stacks.
    NoStacks,
    /// The stacks have no slots.
    ZeroCapacity,
    /// The cost type cannot represent the ineligibility sentinel for this
    /// many items.
    CostTypeTooNarrow(usize),
    /// More items than slots; no complete assignment can exist.
    InsufficientCapacity { items: usize, slots: usize },
    DimensionMismatch(DimensionMismatchError),
    CostOutOfRange(CostOutOfRangeError),
}

impl std::fmt::Display for InstanceBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceBuildError::NoStacks => write!(f, "Instance has no stacks"),
            InstanceBuildError::ZeroCapacity => write!(f, "Stack capacity must be positive"),
            InstanceBuildError::CostTypeTooNarrow(items) => write!(
                f,
                "Cost type is too narrow to encode ineligibility for {} items",
                items
            ),
            InstanceBuildError::InsufficientCapacity { items, slots } => write!(
                f,
                "{} items do not fit into {} slots",
                items, slots
            ),
            InstanceBuildError::DimensionMismatch(err) => write!(f, "{}", err),
            InstanceBuildError::CostOutOfRange(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for InstanceBuildError {}

impl From<DimensionMismatchError> for InstanceBuildError {
    fn from(err: DimensionMismatchError) -> Self {
        InstanceBuildError::DimensionMismatch(err)
    }
}

impl From<CostOutOfRangeError> for InstanceBuildError {
    fn from(err: CostOutOfRangeError) -> Self {
        InstanceBuildError::CostOutOfRange(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let dim = DimensionMismatchError::new("cost matrix rows", 3, 2);
        assert_eq!(
            dim.to_string(),
            "cost matrix rows has dimension 2 but 3 was expected"
        );
        let wrapped: InstanceBuildError = dim.into();
        assert!(matches!(wrapped, InstanceBuildError::DimensionMismatch(_)));
        assert_eq!(
            InstanceBuildError::NoStacks.to_string(),
            "Instance has no stacks"
        );
        assert_eq!(
            InstanceBuildError::InsufficientCapacity { items: 5, slots: 4 }.to_string(),
            "5 items do not fit into 4 slots"
        );
    }

    #[test]
    fn test_cost_out_of_range_reports_indices() {
        let err = CostOutOfRangeError::new(ItemIndex::new(1), StackIndex::new(2));
        assert_eq!(err.item(), ItemIndex::new(1));
        assert_eq!(err.stack(), StackIndex::new(2));
        assert!(err.to_string().contains("ItemIndex(1)"));
    }
}
