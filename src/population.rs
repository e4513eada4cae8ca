//! The population driver: generates the initial population, separates it
//! into species, and runs epochs until a fitness target or generation cap
//! is reached.

use rand::Rng;

use crate::config::{GenomeConfig, PopulationConfig};
use crate::error::EvoError;
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::specie::Species;

/// Owns every species in a run and drives the epoch loop.
pub struct Population {
    pub species: Vec<Species>,
    pub config: PopulationConfig,
    pub threshold: f64,
}

/// One species' best genome and its fitness, reported after each epoch.
pub type Champion = (Genome, f64);

impl Population {
    /// Seed-phase: one species containing `config.size` randomized copies
    /// of the seed genome, then immediately re-speciated.
    pub fn generate<F: Fn(&Genome) -> f64>(
        genome_config: &GenomeConfig,
        population_config: PopulationConfig,
        rng: &mut impl Rng,
        registry: &InnovationRegistry,
        fitness_fn: &F,
    ) -> Self {
        let threshold = population_config.distance_threshold;
        let mut members = Vec::with_capacity(population_config.size);
        for _ in 0..population_config.size {
            let genome = Genome::seed(genome_config, rng, registry);
            let fitness = fitness_fn(&genome);
            members.push((genome, fitness));
        }

        let mut population = Self {
            species: Vec::new(),
            config: population_config,
            threshold,
        };
        // Generate's seed phase is conceptually "one species holding every
        // member"; its first member stands in as that lone representative
        // for the re-speciation pass that immediately follows.
        let seed_representative = members[0].0.clone();
        population.assign_to_representatives(members, &[(seed_representative, Vec::new())]);
        population
    }

    /// Assign every member to the first of `representatives` it falls
    /// within `threshold` of (old members, i.e. the ones the
    /// representatives were drawn from, are iterated first since `members`
    /// preserves the per-species order the caller built it in), opening a
    /// fresh species for anything that matches none of them. A freshly
    /// opened species becomes a representative "for the current round" too
    /// — later members in this same call are matched against it, just like
    /// the original representatives.
    fn assign_to_representatives(
        &mut self,
        members: Vec<(Genome, f64)>,
        representatives: &[(Genome, Vec<f64>)],
    ) {
        let sharing = self.config.sharing_constants;
        // Maps a representative's index to its slot in `new_species`, once
        // that representative has claimed at least one member.
        let mut claimed: Vec<Option<usize>> = vec![None; representatives.len()];
        let mut new_species: Vec<Species> = Vec::new();

        'member: for (genome, fitness) in members {
            for (i, (repr, history)) in representatives.iter().enumerate() {
                if genome.distance(repr, sharing) < self.threshold {
                    match claimed[i] {
                        Some(slot) => new_species[slot].members.push((genome, fitness)),
                        None => {
                            let mut s = Species::new(repr.clone(), genome, fitness);
                            s.fitness_history = history.clone();
                            claimed[i] = Some(new_species.len());
                            new_species.push(s);
                        }
                    }
                    continue 'member;
                }
            }
            // No caller-supplied representative matched: check the species
            // already opened earlier in this same pass before giving up.
            for s in new_species.iter_mut() {
                if genome.distance(&s.representative, sharing) < self.threshold {
                    s.members.push((genome, fitness));
                    continue 'member;
                }
            }
            // No match anywhere: this member becomes the representative of
            // a brand-new species, available to every member still to come.
            new_species.push(Species::new(genome.clone(), genome, fitness));
        }

        self.species = new_species;
    }

    /// Run one full epoch: local search + stagnation (phase 1), selection +
    /// recombination (phase 2), re-speciation, threshold adaptation.
    pub fn epoch<F: Fn(&Genome) -> f64 + Sync>(
        &mut self,
        rng: &mut impl Rng,
        registry: &InnovationRegistry,
        fitness_fn: &F,
    ) -> Result<Vec<Champion>, EvoError> {
        let k = self.config.local_search_generations;
        let dropoff_age = self.config.dropoff_age;

        // Phase 1: record history, local search, stagnation check. One task
        // per species under the `parallel` feature, since each species'
        // local search is independent of every other's.
        #[cfg(feature = "parallel")]
        {
            use rand::SeedableRng;
            use rayon::prelude::*;
            let seeds: Vec<u64> = (0..self.species.len()).map(|_| rng.random()).collect();
            self.species
                .par_iter_mut()
                .zip(seeds.par_iter())
                .for_each(|(species, &seed)| {
                    let mut local_rng = rand::rngs::StdRng::seed_from_u64(seed);
                    species.record_history();
                    species.local_search(k, &mut local_rng, registry, fitness_fn);
                });
        }
        #[cfg(not(feature = "parallel"))]
        {
            for species in &mut self.species {
                species.record_history();
                species.local_search(k, rng, registry, fitness_fn);
            }
        }
        let stagnated: Vec<bool> = self
            .species
            .iter()
            .map(|s| s.is_stagnant(dropoff_age))
            .collect();
        for i in (0..self.species.len()).rev() {
            if stagnated[i] {
                log::warn!("species {i} stagnated after {dropoff_age} epochs; removing");
                self.species.remove(i);
            }
        }

        if self.species.is_empty() {
            log::error!("population extinct: every species stagnated or emptied");
            return Err(EvoError::MassExtinction);
        }

        // Phase 2: selection + recombination, again one task per species.
        for species in &mut self.species {
            species.select(self.config.culling_percent);
        }
        let culled_population_count: usize = self.species.iter().map(|s| s.members.len()).sum();
        #[cfg(feature = "parallel")]
        {
            use rand::SeedableRng;
            use rayon::prelude::*;
            let seeds: Vec<u64> = (0..self.species.len()).map(|_| rng.random()).collect();
            self.species
                .par_iter_mut()
                .zip(seeds.par_iter())
                .for_each(|(species, &seed)| {
                    let mut local_rng = rand::rngs::StdRng::seed_from_u64(seed);
                    species.recombine(culled_population_count, &self.config, &mut local_rng, registry);
                });
            self.species.par_iter_mut().for_each(|species| {
                for (genome, fitness) in &mut species.members {
                    if fitness.is_nan() {
                        *fitness = fitness_fn(genome);
                    }
                }
            });
        }
        #[cfg(not(feature = "parallel"))]
        {
            for species in &mut self.species {
                species.recombine(culled_population_count, &self.config, rng, registry);
                for (genome, fitness) in &mut species.members {
                    if fitness.is_nan() {
                        *fitness = fitness_fn(genome);
                    }
                }
            }
        }

        let representatives: Vec<(Genome, Vec<f64>)> = self
            .species
            .iter()
            .map(|s| {
                let idx = rng.random_range(0..s.members.len());
                (s.members[idx].0.clone(), s.fitness_history.clone())
            })
            .collect();
        let all_members: Vec<(Genome, f64)> =
            self.species.drain(..).flat_map(|s| s.members).collect();
        self.assign_to_representatives(all_members, &representatives);

        if self.species.is_empty() {
            log::error!("population extinct: re-speciation produced no species");
            return Err(EvoError::MassExtinction);
        }

        self.species.sort_by(|a, b| {
            b.champion()
                .1
                .partial_cmp(&a.champion().1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.adapt_threshold();

        let champions: Vec<Champion> = self.species.iter().map(|s| s.champion().clone()).collect();

        log::info!(
            "epoch complete: {} species, best fitness {:.4}, threshold {:.4}",
            self.species.len(),
            champions.first().map(|c| c.1).unwrap_or(f64::NEG_INFINITY),
            self.threshold
        );

        Ok(champions)
    }

    /// Multiplicative threshold adaptation: widen the cutoff when there are
    /// too many species, tighten it when there are too few.
    fn adapt_threshold(&mut self) {
        let eps = self.config.distance_threshold_epsilon;
        if self.species.len() > self.config.target_max_species {
            self.threshold *= 1.0 + eps;
        } else if self.species.len() < self.config.target_min_species {
            self.threshold *= 1.0 - eps;
        }
    }

    /// Run epochs until `max_epochs` is reached or `stop_when` is satisfied
    /// by the best champion fitness of an epoch.
    pub fn run<F, S>(
        &mut self,
        rng: &mut impl Rng,
        registry: &InnovationRegistry,
        fitness_fn: &F,
        stop_when: S,
    ) -> Result<Vec<Champion>, EvoError>
    where
        F: Fn(&Genome) -> f64 + Sync,
        S: Fn(f64) -> bool,
    {
        let mut champions = Vec::new();
        for gen in 0..self.config.max_epochs {
            champions = self.epoch(rng, registry, fitness_fn)?;
            let best = champions.first().map(|c| c.1).unwrap_or(f64::NEG_INFINITY);
            if stop_when(best) {
                log::info!("stop condition met at generation {gen}");
                break;
            }
        }
        Ok(champions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::default_rng;

    fn genome_cfg() -> GenomeConfig {
        GenomeConfig {
            n_sensors: 2,
            n_outputs: 1,
            uses_bias: true,
            ..GenomeConfig::default()
        }
    }

    fn small_population_cfg() -> PopulationConfig {
        PopulationConfig {
            size: 20,
            target_min_species: 1,
            target_max_species: 4,
            max_epochs: 3,
            dropoff_age: 15,
            ..PopulationConfig::default()
        }
    }

    #[test]
    fn generate_produces_at_least_one_species_with_all_members() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let fitness = |_: &Genome| 0.5;
        let population = Population::generate(
            &genome_cfg(),
            small_population_cfg(),
            &mut rng,
            &registry,
            &fitness,
        );
        let total: usize = population.species.iter().map(|s| s.members.len()).sum();
        assert_eq!(total, 20);
        assert!(!population.species.is_empty());
    }

    #[test]
    fn a_few_epochs_run_without_extinction() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let fitness = |g: &Genome| g.connections.iter().map(|c| c.weight.abs()).sum();
        let mut population = Population::generate(
            &genome_cfg(),
            small_population_cfg(),
            &mut rng,
            &registry,
            &fitness,
        );
        for _ in 0..3 {
            let champions = population.epoch(&mut rng, &registry, &fitness).unwrap();
            assert!(!champions.is_empty());
        }
    }

    #[test]
    fn threshold_widens_when_too_many_species() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let fitness = |_: &Genome| 0.5;
        let mut cfg = small_population_cfg();
        cfg.target_max_species = 0;
        let mut population = Population::generate(&genome_cfg(), cfg, &mut rng, &registry, &fitness);
        let before = population.threshold;
        population.adapt_threshold();
        assert!(population.threshold > before);
    }
}
