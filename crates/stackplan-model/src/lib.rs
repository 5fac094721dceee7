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

//! # Stackplan Model
//!
//! **The domain model for capacity-limited stacking problems.**
//!
//! A fixed set of items is placed into a fixed set of stacks. Every stack is a
//! column of `capacity` slots, bottom-indexed. Placing an item on a stack has a
//! cost; some item/stack pairs are forbidden outright, and a pairwise stacking
//! relation decides which items may share a column and in which order.
//!
//! ## Architecture
//!
//! * **`index`**: Strongly typed `ItemIndex` and `StackIndex`.
//! * **`instance`**: The immutable `Instance` and its validating
//!   `InstanceBuilder`.
//! * **`oracle`**: Pure compatibility predicates over an instance and the
//!   current contents of a column.
//! * **`assignment`**: The mutable slot matrix searched by every solver, with
//!   cost and feasibility evaluation, gravity repair and constraint-based
//!   column reordering.
//! * **`moves`**: `Move` and `Swap` descriptors used for tabu bookkeeping.
//! * **`conflict`**: Per-item stacking violation counts.
//! * **`err`**: Instance validation errors.
//!
//! ## Design Philosophy
//!
//! 1.  **Type Safety**: Items and stacks live in different index spaces.
//! 2.  **Flat Storage**: Cost and relation matrices are flattened row-major
//!     vectors and bit sets.
//! 3.  **Fail-Fast**: Invalid instances are rejected at build time; corrupted
//!     assignments (an item placed twice) panic immediately.

pub mod assignment;
pub mod conflict;
pub mod err;
pub mod index;
pub mod instance;
pub mod moves;
pub mod oracle;
