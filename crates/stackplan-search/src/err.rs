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

use stackplan_model::index::ItemIndex;

/// Errors produced by a `FeasibleAssignmentSupplier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplyError {
    /// Every construction attempt produced an infeasible assignment.
    RestartsExhausted { restarts: usize },
    /// The item is ineligible for every stack.
    UnplaceableItem(ItemIndex),
}

impl std::fmt::Display for SupplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplyError::RestartsExhausted { restarts } => write!(
                f,
                "No feasible assignment found after {} restarts",
                restarts
            ),
            SupplyError::UnplaceableItem(item) => {
                write!(f, "{} is not eligible for any stack", item)
            }
        }
    }
}

impl std::error::Error for SupplyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            SupplyError::RestartsExhausted { restarts: 5 }.to_string(),
            "No feasible assignment found after 5 restarts"
        );
        assert_eq!(
            SupplyError::UnplaceableItem(ItemIndex::new(2)).to_string(),
            "ItemIndex(2) is not eligible for any stack"
        );
    }
}
