use criterion::Criterion;
use rand::{rng, Rng};
use speciate::innovation::{InnovationRegistry, Origin};

fn bench(bench: &mut Criterion) {
    let mut rng = rng();
    let registry = InnovationRegistry::new();
    bench.bench_function("innogen", |b| {
        b.iter(|| {
            registry.lookup_or_insert(
                Origin::AddConnection,
                rng.random_range(0..=10_000),
                rng.random_range(0..=10_000),
            )
        })
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(2000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use std::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
