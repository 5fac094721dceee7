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

//! Shared helpers for tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stackplan_model::{
    index::ItemIndex,
    instance::{Instance, InstanceBuilder},
};
use tracing_subscriber::EnvFilter;

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

/// Random costs in `1..=max_cost`, every item eligible everywhere and every
/// stacking pair allowed.
pub(crate) fn permissive_instance(
    seed: u64,
    num_items: usize,
    num_stacks: usize,
    capacity: usize,
    max_cost: IntegerType,
) -> Instance<IntegerType> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = InstanceBuilder::<IntegerType>::new(num_items, num_stacks, capacity);
    for item in 0..num_items {
        let costs: Vec<IntegerType> = (0..num_stacks)
            .map(|_| rng.random_range(1..=max_cost))
            .collect();
        b.set_item_costs(ItemIndex::new(item), &costs);
    }
    b.allow_all_stacking();
    b.build().unwrap()
}
