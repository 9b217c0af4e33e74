use criterion::{Criterion, black_box, criterion_group, criterion_main};
use markup::{markup_to_units, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 10_000;

fn make_blocks(count: usize) -> String {
    let mut input = String::with_capacity(count * 64);
    for i in 0..count {
        input.push_str("Hi, <strong class='t'>Bob! <em>Goodbye &amp; ");
        input.push_str(&i.to_string());
        input.push_str("</em></strong><br>");
    }
    input
}

fn bench_tokenize(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&input));
            black_box(tokens.len());
        });
    });
}

fn bench_units_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_units_small", |b| {
        b.iter(|| {
            let units = markup_to_units(black_box(&input));
            black_box(units.len());
        });
    });
}

fn bench_units_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_units_large", |b| {
        b.iter(|| {
            let units = markup_to_units(black_box(&input));
            black_box(units.len());
        });
    });
}

criterion_group!(benches, bench_tokenize, bench_units_small, bench_units_large);
criterion_main!(benches);
