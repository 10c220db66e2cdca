use criterion::{black_box, criterion_group, criterion_main, Criterion};
use envmacros::{Evaluator, Lookup, Resolver};

fn make_lookup(depth: usize) -> Lookup {
    let mut lookup = Lookup::empty().with_env(false);
    lookup.add("L0", "leaf");
    for i in 1..depth {
        lookup.add(format!("L{i}"), format!("${{L{}}}/{i}", i - 1));
    }
    lookup.add("child", "Zack");
    lookup.add("parent_Zack", "duane");
    lookup.add("one", 1);
    lookup.add("two", "(1+${one})");
    lookup
}

fn make_text(repeats: usize) -> String {
    "The ${child} of ${parent_${child}} says hi. ".repeat(repeats)
}

fn bench_resolve(c: &mut Criterion) {
    let res = Resolver::with_lookup(make_lookup(40));
    let plain = "no macros at all here ".repeat(100);
    let small = make_text(1);
    let med = make_text(10);

    let mut g = c.benchmark_group("resolve");

    g.bench_function("plain_text", |b| b.iter(|| res.resolve(black_box(&plain))));
    g.bench_function("nested_small", |b| b.iter(|| res.resolve(black_box(&small))));
    g.bench_function("nested_med", |b| b.iter(|| res.resolve(black_box(&med))));
    g.bench_function("chain_40", |b| b.iter(|| res.resolve(black_box("${L39}"))));

    g.finish();
}

fn bench_eval(c: &mut Criterion) {
    let ev = Evaluator::with_lookup(make_lookup(1));

    let mut g = c.benchmark_group("eval");

    g.bench_function("arith", |b| {
        b.iter(|| ev.eval(black_box("${one}<<(2*(2*${two}))")))
    });
    g.bench_function("math", |b| {
        b.iter(|| ev.eval(black_box("sqrt(${two} ** 2 + 9) * cos(0)")))
    });
    g.bench_function("rejected", |b| {
        b.iter(|| ev.eval(black_box("${two} + __import__('os')")))
    });

    g.finish();
}

criterion_group!(benches, bench_resolve, bench_eval);
criterion_main!(benches);
