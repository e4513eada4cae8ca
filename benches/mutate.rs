use criterion::Criterion;
use speciate::config::GenomeConfig;
use speciate::innovation::InnovationRegistry;
use speciate::random::default_rng;
use speciate::Genome;

fn seeded_genome() -> (Genome, InnovationRegistry) {
    let registry = InnovationRegistry::new();
    let mut rng = default_rng();
    let cfg = GenomeConfig {
        n_sensors: 3,
        n_outputs: 2,
        uses_bias: true,
        ..GenomeConfig::default()
    };
    let mut genome = Genome::seed(&cfg, &mut rng, &registry);
    for _ in 0..100 {
        let _ = genome.mutate(&mut rng, &registry);
    }
    (genome, registry)
}

fn bench_mutate(bench: &mut Criterion) {
    let (genome, registry) = seeded_genome();
    let mut rng = default_rng();

    bench.bench_function("mutate-connection", |b| {
        b.iter(|| genome.clone().mutate(&mut rng, &registry).unwrap())
    });

    bench.bench_function("mutate-weights", |b| {
        b.iter(|| {
            let mut child = genome.clone();
            // Force the weight-mutation branch regardless of roulette odds
            // by drawing until it lands, matching the teacher's one-kind-
            // per-bench split.
            loop {
                let before = child.connections.clone();
                child.mutate(&mut rng, &registry).unwrap();
                if child.connections.len() == before.len() {
                    break;
                }
            }
        })
    });

    bench.bench_function("random-neighbor", |b| {
        b.iter(|| genome.random_neighbor(&mut rng, &registry))
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(2000)
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
    bench_mutate(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
