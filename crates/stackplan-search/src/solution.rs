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

use num_traits::{PrimInt, Signed};
use stackplan_model::{assignment::Assignment, instance::Instance};

/// A complete, feasible assignment together with its objective value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Solution<T> {
    objective_value: T,
    assignment: Assignment,
}

impl<T> Solution<T>
where
    T: PrimInt + Signed,
{
    /// Creates a solution with a precomputed objective.
    #[inline]
    pub fn new(objective_value: T, assignment: Assignment) -> Self {
        Self {
            objective_value,
            assignment,
        }
    }

    /// Creates a solution, computing the objective from `instance`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `assignment` is not feasible for `instance`.
    #[inline]
    pub fn from_assignment(instance: &Instance<T>, assignment: Assignment) -> Self {
        debug_assert!(
            assignment.is_feasible(instance),
            "called `Solution::from_assignment` with an infeasible assignment"
        );
        Self {
            objective_value: assignment.cost(instance),
            assignment,
        }
    }

    #[inline]
    pub fn objective_value(&self) -> T {
        self.objective_value
    }

    #[inline]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[inline]
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }
}

impl<T> std::fmt::Display for Solution<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution(objective: {})", self.objective_value)?;
        write!(f, "{}", self.assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_model::{
        index::{ItemIndex, StackIndex},
        instance::InstanceBuilder,
    };

    #[test]
    fn test_from_assignment_computes_objective() {
        let mut b = InstanceBuilder::<i64>::new(2, 2, 1);
        b.set_item_costs(ItemIndex::new(0), &[3, 5])
            .set_item_costs(ItemIndex::new(1), &[4, 1]);
        let inst = b.build().unwrap();
        let a = Assignment::from_columns(2, 1, &[vec![ItemIndex::new(0)], vec![ItemIndex::new(1)]]);
        let s = Solution::from_assignment(&inst, a);
        assert_eq!(s.objective_value(), 4);
        assert_eq!(s.assignment().stack_of(ItemIndex::new(1)), Some(StackIndex::new(1)));
        assert!(s.to_string().starts_with("Solution(objective: 4)"));
    }
}
