use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mimalloc::MiMalloc;
use tarray::{ElementKind, Numeric, TypedArray, compare_default};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const SIZES: [usize; 3] = [64, 4096, 262144];

/// Deterministic pseudo-random fill so every run sorts the same input.
fn scrambled(kind: ElementKind, len: usize) -> TypedArray {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let view = TypedArray::new(kind, len);
    for k in 0..len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let value = match kind {
            ElementKind::BigInt64 | ElementKind::BigUint64 => Numeric::BigInt(state as i64 as i128),
            _ if kind.is_float() => Numeric::Number((state as i32) as f64 / 1024.0),
            _ => Numeric::Number(state as i32 as f64),
        };
        let _ = view.set(k, value);
    }
    view
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    for kind in [
        ElementKind::Uint8,
        ElementKind::Int16,
        ElementKind::Int32,
        ElementKind::Float32,
        ElementKind::Float64,
    ] {
        for len in SIZES {
            group.throughput(Throughput::Elements(len as u64));
            let input = scrambled(kind, len).to_vec().unwrap_or_default();
            group.bench_with_input(BenchmarkId::new(kind.name(), len), &input, |b, input| {
                b.iter(|| {
                    let view = TypedArray::of(kind, input.iter().copied()).unwrap();
                    view.sort().unwrap();
                    black_box(view)
                })
            });
        }
    }
    group.finish();

    let mut group = c.benchmark_group("sort_by");
    for len in SIZES {
        group.throughput(Throughput::Elements(len as u64));
        let input = scrambled(ElementKind::Int32, len).to_vec().unwrap_or_default();
        group.bench_with_input(BenchmarkId::new("Int32Array", len), &input, |b, input| {
            b.iter(|| {
                let view = TypedArray::of(ElementKind::Int32, input.iter().copied()).unwrap();
                view.sort_by(|x, y| Ok(compare_default(x, y))).unwrap();
                black_box(view)
            })
        });
    }
    group.finish();
}

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");
    for len in SIZES {
        group.throughput(Throughput::Bytes((len * 4) as u64));
        let target = TypedArray::new(ElementKind::Float32, len * 2);
        let same_kind = scrambled(ElementKind::Float32, len);
        let other_kind = scrambled(ElementKind::Int32, len);
        let overlapping = TypedArray::with_buffer(
            ElementKind::Int32,
            target.buffer().clone(),
            0,
            Some(len),
        )
        .unwrap();

        group.bench_function(BenchmarkId::new("same_kind", len), |b| {
            b.iter(|| target.set_typed(black_box(&same_kind), 0).unwrap())
        });
        group.bench_function(BenchmarkId::new("disjoint", len), |b| {
            b.iter(|| target.set_typed(black_box(&other_kind), 0).unwrap())
        });
        group.bench_function(BenchmarkId::new("overlapping", len), |b| {
            b.iter(|| target.set_typed(black_box(&overlapping), 1).unwrap())
        });
    }
    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse");
    for len in SIZES {
        group.throughput(Throughput::Elements(len as u64));
        let view = scrambled(ElementKind::Float64, len);
        group.bench_function(BenchmarkId::new("reduce", len), |b| {
            b.iter(|| {
                view.reduce(
                    |acc: Numeric, x, _, _| Ok(Numeric::Number(acc.as_f64() + x.as_f64())),
                    None,
                )
                .unwrap()
            })
        });
        group.bench_function(BenchmarkId::new("includes_nan", len), |b| {
            b.iter(|| view.includes(black_box(Numeric::Number(f64::NAN)), None).unwrap())
        });
        group.bench_function(BenchmarkId::new("copy_within", len), |b| {
            b.iter(|| view.copy_within(1, 0, None).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sort, bench_set, bench_traverse);
criterion_main!(benches);
