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

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stackplan_bnb::{
    bnb::{BnbConfig, BranchAndBoundSolver},
    bound::MatchingBound,
    monitor::no_op::NoOperationMonitor,
    node::NodeOrdering,
};
use stackplan_model::{
    assignment::Assignment,
    index::{ItemIndex, StackIndex},
    instance::{Instance, InstanceBuilder},
};
use std::hint::black_box;

/// Seeded instance with costs in `0..100`, one forbidden pair in twenty and a
/// transitive stacking relation derived from random item heights.
fn generate_instance(seed: u64, num_items: usize, num_stacks: usize, capacity: usize) -> Instance<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = InstanceBuilder::<i64>::new(num_items, num_stacks, capacity);
    let heights: Vec<u32> = (0..num_items).map(|_| rng.random_range(0..4)).collect();
    for item in 0..num_items {
        for stack in 0..num_stacks {
            let (i, s) = (ItemIndex::new(item), StackIndex::new(stack));
            if rng.random_bool(0.05) {
                b.forbid(i, s);
            } else {
                b.set_cost(i, s, rng.random_range(0..100));
            }
        }
    }
    for upper in 0..num_items {
        for lower in 0..num_items {
            if upper != lower && heights[upper] <= heights[lower] {
                b.allow_stacking(ItemIndex::new(upper), ItemIndex::new(lower));
            }
        }
    }
    b.build().expect("benchmark instance must be valid")
}

fn bench_root_bound(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_bound_root");
    for &(n, m, k) in &[(8usize, 4usize, 3usize), (16, 6, 3), (32, 10, 4)] {
        let inst = generate_instance(42, n, m, k);
        let root = Assignment::for_instance(&inst);
        let mut bound = MatchingBound::preallocated(inst.num_slots(), Default::default());
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}x{}", n, m, k)),
            &root,
            |b, root| b.iter(|| black_box(bound.compute(&inst, black_box(root)))),
        );
    }
    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("bnb_solve");
    group.sample_size(10);
    for &(n, m, k) in &[(6usize, 3usize, 3usize), (9, 3, 4), (10, 4, 3)] {
        let inst = generate_instance(7, n, m, k);
        for ordering in [NodeOrdering::Combined, NodeOrdering::BestFirst] {
            let config = BnbConfig::default().with_node_ordering(ordering);
            group.bench_with_input(
                BenchmarkId::new(ordering.to_string(), format!("{}x{}x{}", n, m, k)),
                &inst,
                |b, inst| {
                    b.iter(|| {
                        let mut solver = BranchAndBoundSolver::preallocated(inst.num_slots(), config);
                        black_box(solver.solve(inst, NoOperationMonitor::new()))
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_root_bound, bench_solve);
criterion_main!(benches);
