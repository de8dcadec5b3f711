//! Combinator benchmarks for Weft.
//!
//! Both benchmarks wait for `n` children one settlement at a time, which
//! is the shape of a connection set or a job queue:
//! - `fixed`: every round builds a new `race` over the children left,
//! - `dynamic`: the children are pushed once into a `Dynamic` set, and
//!   every round re-arms its parent future and pops the winner.
//!
//! Rebuilding costs O(n) per round, the dynamic set O(1) plus a constant
//! overhead per push. Expect the curves to cross around fifty children.

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use weft::combinator::{self, Dynamic, Policy};
use weft::{Manager, Promise};

const SIZES: [usize; 6] = [4, 16, 32, 64, 128, 256];

fn drain_fixed(manager: &Manager, n: usize) -> usize {
    let mut left = n;
    let mut total = 0;

    while left > 0 {
        let (children, mut promises): (Vec<_>, Vec<Promise<usize>>) =
            (0..left).map(|_| manager.make_future::<usize>()).unzip();

        let mut winner = combinator::race(manager, children);

        let last = promises.swap_remove(left - 1);
        last.resolve(left);

        if let Some(Ok(winner)) = winner.try_take() {
            total += winner.index;
        }

        // Losers are released for the next round.
        drop(promises);
        left -= 1;
    }

    total
}

fn drain_dynamic(manager: &Manager, n: usize) -> usize {
    let set = Dynamic::new(manager, Policy::Race);

    let promises: Vec<Promise<usize>> = (0..n)
        .map(|_| {
            let (future, promise) = manager.make_future::<usize>();
            set.push(future);
            promise
        })
        .collect();

    let mut total = 0;

    for (value, promise) in promises.into_iter().enumerate().rev() {
        let parent = set.get_future();
        promise.resolve(value);

        if parent.is_settled() {
            while let Some((index, _)) = set.finished_out() {
                total += index;
            }
        }
    }

    total
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("combinators/drain");
    let manager = Manager::new();

    for n in SIZES {
        group.bench_with_input(BenchmarkId::new("fixed", n), &n, |b, &n| {
            b.iter(|| black_box(drain_fixed(&manager, n)));
        });

        group.bench_with_input(BenchmarkId::new("dynamic", n), &n, |b, &n| {
            b.iter(|| black_box(drain_dynamic(&manager, n)));
        });
    }

    group.finish();
}

fn bench_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("combinators/all");
    let manager = Manager::new();

    for n in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let (children, promises): (Vec<_>, Vec<Promise<usize>>) =
                    (0..n).map(|_| manager.make_future::<usize>()).unzip();

                let mut joined = combinator::all(&manager, children);

                for (value, promise) in promises.into_iter().enumerate() {
                    promise.resolve(value);
                }

                black_box(joined.try_take())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_drain, bench_all);
criterion_main!(benches);
