#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

use approx::relative_eq;

use speciate::config::{GenomeConfig, PopulationConfig};
use speciate::random::default_rng;
use speciate::{Genome, Network, Population};

const POPULATION: usize = 150;
const TARGET_FITNESS: f64 = 3.8;

fn eval_pair(network: &mut Network, pair: [f64; 2], want: f64, fit: &mut f64) {
    let out = network.activate(&pair).unwrap_or_else(|_| vec![0.0]);
    let v = out[0];
    if relative_eq!(v, want, epsilon = 0.05) {
        *fit += 1.0;
    } else if (-1.0..=2.0).contains(&v) {
        *fit -= (want - v).abs();
    } else {
        *fit -= v.abs() * v.abs();
    }
}

fn fitness(genome: &Genome) -> f64 {
    let mut network = Network::compile(genome);
    let mut fit = 0.0;
    eval_pair(&mut network, [0.0, 0.0], 0.0, &mut fit);
    eval_pair(&mut network, [1.0, 1.0], 0.0, &mut fit);
    eval_pair(&mut network, [1.0, 0.0], 1.0, &mut fit);
    eval_pair(&mut network, [0.0, 1.0], 1.0, &mut fit);
    fit
}

fn main() {
    env_logger::init();

    let genome_config = GenomeConfig {
        n_sensors: 2,
        n_outputs: 1,
        uses_bias: true,
        ..GenomeConfig::default()
    };
    let population_config = PopulationConfig {
        size: POPULATION,
        max_epochs: 500,
        ..PopulationConfig::default()
    };

    let registry = speciate::InnovationRegistry::new();
    let mut rng = default_rng();
    let mut population = Population::generate(
        &genome_config,
        population_config,
        &mut rng,
        &registry,
        &fitness,
    );

    let champions = population
        .run(&mut rng, &registry, &fitness, |best| {
            best >= TARGET_FITNESS
        })
        .expect("population went extinct before meeting the XOR target");

    let (best_genome, best_fitness) = champions
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .expect("run produced no champions");

    log::info!(
        "best fitness: {:.4} across {} connections",
        best_fitness,
        best_genome.connections.len()
    );

    let mut network = Network::compile(&best_genome);
    for (pair, want) in [
        ([0.0, 0.0], 0.0),
        ([1.0, 1.0], 0.0),
        ([1.0, 0.0], 1.0),
        ([0.0, 1.0], 1.0),
    ] {
        let out = network.activate(&pair).unwrap();
        println!("{pair:?} -> {:.4} (want {want})", out[0]);
    }
}
