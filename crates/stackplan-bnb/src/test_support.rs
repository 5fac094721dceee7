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

//! Seeded instance generators and a brute-force oracle for tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;
use stackplan_model::{
    assignment::Assignment,
    index::{ItemIndex, StackIndex},
    instance::{Instance, InstanceBuilder},
    oracle::CompatibilityOracle,
};

pub(crate) type IntegerType = i64;

/// Routes `tracing` output of a test through the test harness. Honors
/// `RUST_LOG`; repeated calls are no-ops.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Random costs in `0..20`, about one pair in ten forbidden and about six
/// stacking pairs in ten allowed.
pub(crate) fn random_instance(
    seed: u64,
    num_items: usize,
    num_stacks: usize,
    capacity: usize,
) -> Instance<IntegerType> {
    random_instance_with_max_cost(seed, num_items, num_stacks, capacity, 20)
}

/// Like `random_instance`, with costs drawn from `0..max_cost`.
pub(crate) fn random_instance_with_max_cost(
    seed: u64,
    num_items: usize,
    num_stacks: usize,
    capacity: usize,
    max_cost: IntegerType,
) -> Instance<IntegerType> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = InstanceBuilder::<IntegerType>::new(num_items, num_stacks, capacity);
    for item in 0..num_items {
        for stack in 0..num_stacks {
            let (item, stack) = (ItemIndex::new(item), StackIndex::new(stack));
            if rng.random_bool(0.1) {
                b.forbid(item, stack);
            } else {
                b.set_cost(item, stack, rng.random_range(0..max_cost));
            }
        }
    }
    for upper in 0..num_items {
        for lower in 0..num_items {
            if upper != lower && rng.random_bool(0.6) {
                b.allow_stacking(ItemIndex::new(upper), ItemIndex::new(lower));
            }
        }
    }
    b.build().unwrap()
}

/// Places up to `depth` random items into random admissible stacks.
pub(crate) fn random_partial(instance: &Instance<IntegerType>, seed: u64, depth: usize) -> Assignment {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let oracle = CompatibilityOracle::new(instance);
    let mut a = Assignment::for_instance(instance);
    for item in instance.items().take(depth) {
        let stack = StackIndex::new(rng.random_range(0..instance.num_stacks()));
        if oracle.can_place(item, &a, stack) {
            a.place(item, stack);
        }
    }
    a
}

/// Cheapest feasible completion of `partial`, by enumerating every stack
/// choice for every unassigned item.
pub(crate) fn brute_force_completion(
    instance: &Instance<IntegerType>,
    partial: &Assignment,
) -> Option<IntegerType> {
    let free: Vec<ItemIndex> = partial.unassigned_items().collect();
    let m = instance.num_stacks();
    let combinations = m.checked_pow(free.len() as u32)?;

    let mut best: Option<IntegerType> = None;
    'outer: for mut code in 0..combinations {
        let mut candidate = partial.clone();
        for &item in &free {
            let stack = StackIndex::new(code % m);
            code /= m;
            if !candidate.has_free_slot(stack) {
                continue 'outer;
            }
            candidate.place(item, stack);
        }
        candidate.reorder_by_constraints(instance);
        if candidate.is_feasible(instance) {
            let cost = candidate.cost(instance);
            if best.is_none_or(|b| cost < b) {
                best = Some(cost);
            }
        }
    }
    best
}
