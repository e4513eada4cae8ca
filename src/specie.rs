//! A species: a cohort of genomes close enough to share a representative,
//! with its own fitness history, local search, selection, and recombination.

use rand::Rng;

use crate::config::PopulationConfig;
use crate::crossover::{crossover, CrossoverDisableRule};
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;

const STAGNATION_EPSILON: f64 = 0.01;

/// One species. `members` is kept sorted descending by fitness after
/// [`Species::select`] runs; before that it may be in any order.
pub struct Species {
    pub representative: Genome,
    pub members: Vec<(Genome, f64)>,
    pub fitness_history: Vec<f64>,
}

impl Species {
    pub fn new(representative: Genome, first_member: Genome, fitness: f64) -> Self {
        Self {
            representative,
            members: vec![(first_member, fitness)],
            fitness_history: Vec::new(),
        }
    }

    pub fn champion(&self) -> &(Genome, f64) {
        self.members
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .expect("species has no members")
    }

    /// Append the current champion's fitness. Must run before `select`.
    pub fn record_history(&mut self) {
        let fitness = self.champion().1;
        self.fitness_history.push(fitness);
    }

    /// True once the history is at least `dropoff_age` long and no entry in
    /// the trailing window improves on its predecessor by more than epsilon.
    pub fn is_stagnant(&self, dropoff_age: usize) -> bool {
        if self.fitness_history.len() < dropoff_age {
            return false;
        }
        let window = &self.fitness_history[self.fitness_history.len() - dropoff_age..];
        let best_before_window = window[0];
        !window
            .iter()
            .any(|&f| f > best_before_window + STAGNATION_EPSILON)
    }

    /// Lamarckian hill-climb: replace each member with the best of itself
    /// and `k` random-neighbor mutants, per `fitness_fn`.
    pub fn local_search<F: Fn(&Genome) -> f64>(
        &mut self,
        k: usize,
        rng: &mut impl Rng,
        registry: &InnovationRegistry,
        fitness_fn: &F,
    ) {
        for (genome, fitness) in &mut self.members {
            let mut best = genome.clone();
            let mut best_fitness = *fitness;
            for _ in 0..k {
                let candidate = genome.random_neighbor(rng, registry);
                let candidate_fitness = fitness_fn(&candidate);
                if candidate_fitness > best_fitness {
                    best = candidate;
                    best_fitness = candidate_fitness;
                }
            }
            *genome = best;
            *fitness = best_fitness;
        }
    }

    /// Sort descending by fitness and drop the bottom `culling_percent`
    /// fraction. No-op when there's only one member.
    pub fn select(&mut self, culling_percent: f64) {
        if self.members.len() <= 1 {
            return;
        }
        self.members
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let cut = (culling_percent * self.members.len() as f64).round() as usize;
        let keep = self.members.len().saturating_sub(cut).max(1);
        self.members.truncate(keep);
    }

    /// Breed this species' share of the next generation, given the total
    /// survivor count across all species (`culled_population_count`) and the
    /// population-wide target size.
    pub fn recombine(
        &mut self,
        culled_population_count: usize,
        config: &PopulationConfig,
        rng: &mut impl Rng,
        registry: &InnovationRegistry,
    ) {
        let champion = self.champion().clone();

        let share = self.members.len() as f64 / culled_population_count.max(1) as f64;
        let target = (config.size as f64 * share).round() as usize;
        let target = target.max(1);

        let mut mated = (target as f64 * config.recombination_percent).round() as usize;
        let mut cloned = target.saturating_sub(mated);

        // Make room for the champion carry-over by shrinking whichever
        // bucket is larger.
        if mated >= cloned && mated > 0 {
            mated -= 1;
        } else if cloned > 0 {
            cloned -= 1;
        }

        let mut next_members = Vec::with_capacity(target);
        next_members.push(champion.clone());

        for _ in 0..mated {
            let child = if self.members.len() >= 2 {
                let (i, j) = distinct_pair(self.members.len(), rng);
                let (a, fa) = &self.members[i];
                let (b, fb) = &self.members[j];
                crossover(a, b, *fa, *fb, CrossoverDisableRule::AndOr, rng)
            } else {
                let (a, _) = &self.members[0];
                a.random_neighbor(rng, registry)
            };
            next_members.push((child, f64::NAN));
        }

        for _ in 0..cloned {
            let idx = rng.random_range(0..self.members.len());
            let (parent, _) = &self.members[idx];
            let child = parent.random_neighbor(rng, registry);
            next_members.push((child, f64::NAN));
        }

        self.members = next_members;
    }
}

fn distinct_pair(len: usize, rng: &mut impl Rng) -> (usize, usize) {
    let i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len);
    while j == i && len > 1 {
        j = rng.random_range(0..len);
    }
    (i, j)
}
