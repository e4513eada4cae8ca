use criterion::Criterion;
use speciate::config::GenomeConfig;
use speciate::crossover::{crossover, CrossoverDisableRule};
use speciate::innovation::InnovationRegistry;
use speciate::random::default_rng;
use speciate::Genome;

fn drifted_pair() -> (Genome, Genome, InnovationRegistry) {
    let registry = InnovationRegistry::new();
    let mut rng = default_rng();
    let cfg = GenomeConfig {
        n_sensors: 4,
        n_outputs: 3,
        uses_bias: true,
        ..GenomeConfig::default()
    };
    let base = Genome::seed(&cfg, &mut rng, &registry);

    let mut l = base.clone();
    for _ in 0..40 {
        let _ = l.mutate(&mut rng, &registry);
    }
    let mut r = base;
    for _ in 0..40 {
        let _ = r.mutate(&mut rng, &registry);
    }
    (l, r, registry)
}

fn bench_crossover(bench: &mut Criterion) {
    let (l, r, _registry) = drifted_pair();
    let mut rng = default_rng();

    bench.bench_function("crossover-unequal-fitness", |b| {
        b.iter(|| crossover(&l, &r, 1.0, 0.2, CrossoverDisableRule::AndOr, &mut rng))
    });

    bench.bench_function("crossover-equal-fitness", |b| {
        b.iter(|| crossover(&l, &r, 1.0, 1.0, CrossoverDisableRule::AndOr, &mut rng))
    });

    bench.bench_function("crossover-probabilistic-rule", |b| {
        b.iter(|| crossover(&l, &r, 1.0, 0.2, CrossoverDisableRule::Probabilistic, &mut rng))
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(1000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_crossover(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
