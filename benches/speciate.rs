use criterion::Criterion;
use speciate::config::{GenomeConfig, PopulationConfig};
use speciate::innovation::InnovationRegistry;
use speciate::random::default_rng;
use speciate::{Genome, Population};

fn bench(bench: &mut Criterion) {
    let genome_cfg = GenomeConfig {
        n_sensors: 3,
        n_outputs: 2,
        uses_bias: true,
        ..GenomeConfig::default()
    };
    let population_cfg = PopulationConfig {
        size: 100,
        ..PopulationConfig::default()
    };
    let fitness = |g: &Genome| g.connections.iter().map(|c| c.weight.abs()).sum();

    bench.bench_function("generate-and-speciate-100", |b| {
        b.iter(|| {
            let registry = InnovationRegistry::new();
            let mut rng = default_rng();
            Population::generate(
                &genome_cfg,
                population_cfg.clone(),
                &mut rng,
                &registry,
                &fitness,
            )
        })
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(1000)
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
