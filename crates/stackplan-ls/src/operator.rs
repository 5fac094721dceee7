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

//! Neighborhood operators.
//!
//! An operator takes the current assignment and produces one neighbor, or
//! reports `NeighborOutcome::NoMove` when it found nothing to do (no retry hit
//! an admissible target, no strictly improving move exists, no improving chain
//! reaches a free stack). Operators never touch the current assignment; they
//! clone it, mutate the clone, repair gravity and reorder the columns by the
//! stacking relation before returning it together with the moves performed.
//!
//! Acceptance is not the operator's business. A produced neighbor may be worse
//! than the current one, and on instances whose stacking relation is not
//! transitive it may even be infeasible; the metaheuristics in `crate::meta`
//! check both.

pub mod ejection_chain;
pub mod shift;
pub mod swap;

use rand::Rng;
use smallvec::SmallVec;
use stackplan_model::{assignment::Assignment, instance::Instance, moves::Move};
use stackplan_search::{num::SolverNumeric, solution::Solution};

/// The moves recorded while producing one neighbor.
pub type MoveList = SmallVec<[Move; 4]>;

/// How an operator explores its neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplorationMode {
    /// Sample up to `retries` random moves; the first admissible one wins.
    Random { retries: usize },
    /// Enumerate the whole neighborhood and keep the strictly best improving
    /// admissible move.
    BestImprovement,
}

impl Default for ExplorationMode {
    fn default() -> Self {
        ExplorationMode::Random {
            retries: Self::DEFAULT_RETRIES,
        }
    }
}

impl ExplorationMode {
    pub const DEFAULT_RETRIES: usize = 300;
}

impl std::fmt::Display for ExplorationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorationMode::Random { retries } => write!(f, "Random(retries: {})", retries),
            ExplorationMode::BestImprovement => write!(f, "BestImprovement"),
        }
    }
}

/// A neighbor produced by an operator: the new assignment, its cost and the
/// moves that led there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T> {
    assignment: Assignment,
    moves: MoveList,
    cost: T,
}

impl<T> Candidate<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new(assignment: Assignment, moves: MoveList, cost: T) -> Self {
        Self {
            assignment,
            moves,
            cost,
        }
    }

    #[inline]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[inline]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    #[inline]
    pub fn cost(&self) -> T {
        self.cost
    }

    /// Returns `true` if the candidate assignment is feasible for `instance`.
    #[inline]
    pub fn is_feasible(&self, instance: &Instance<T>) -> bool {
        self.assignment.is_feasible(instance)
    }

    #[inline]
    pub fn into_solution(self) -> Solution<T> {
        Solution::new(self.cost, self.assignment)
    }

    #[inline]
    pub fn into_parts(self) -> (Assignment, MoveList, T) {
        (self.assignment, self.moves, self.cost)
    }
}

impl<T> std::fmt::Display for Candidate<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Candidate(cost: {}, moves: [", self.cost)?;
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", mv)?;
        }
        write!(f, "])")
    }
}

/// The result of one operator application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeighborOutcome<T> {
    /// The operator produced a neighbor.
    Moved(Candidate<T>),
    /// The operator found nothing to do.
    NoMove,
}

impl<T> NeighborOutcome<T>
where
    T: SolverNumeric,
{
    /// Finishes a mutated clone: repairs gravity, reorders the columns and
    /// prices the result.
    pub(crate) fn finish(instance: &Instance<T>, mut assignment: Assignment, moves: MoveList) -> Self {
        assignment.repair_gravity();
        assignment.reorder_by_constraints(instance);
        let cost = assignment.cost(instance);
        NeighborOutcome::Moved(Candidate::new(assignment, moves, cost))
    }

    #[inline]
    pub fn is_move(&self) -> bool {
        matches!(self, NeighborOutcome::Moved(_))
    }

    #[inline]
    pub fn candidate(&self) -> Option<&Candidate<T>> {
        match self {
            NeighborOutcome::Moved(candidate) => Some(candidate),
            NeighborOutcome::NoMove => None,
        }
    }

    #[inline]
    pub fn into_candidate(self) -> Option<Candidate<T>> {
        match self {
            NeighborOutcome::Moved(candidate) => Some(candidate),
            NeighborOutcome::NoMove => None,
        }
    }
}

impl<T> std::fmt::Display for NeighborOutcome<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborOutcome::Moved(candidate) => write!(f, "Moved({})", candidate),
            NeighborOutcome::NoMove => write!(f, "NoMove"),
        }
    }
}

/// A stateful generator of neighbors.
///
/// Implementations may keep scratch buffers between calls but must not carry
/// search state across calls: the same input and random stream yield the same
/// neighbor.
pub trait NeighborhoodOperator<T>
where
    T: SolverNumeric,
{
    /// Returns the name of the operator for logging and identification purposes.
    fn name(&self) -> &str;

    /// Produces one neighbor of `current`.
    fn apply<R>(
        &mut self,
        instance: &Instance<T>,
        current: &Assignment,
        rng: &mut R,
    ) -> NeighborOutcome<T>
    where
        R: Rng + ?Sized;
}
