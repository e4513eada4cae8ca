//! Plain-data configuration surfaces. No file format is loaded here — that's
//! an external collaborator's job — but the struct shapes and their defaults
//! are part of the crate's public API.

use serde::{Deserialize, Serialize};

/// Selection weights for the four recognized mutation kinds. Should sum to
/// (approximately) 1.0; `Genome::mutate` treats them as roulette weights
/// regardless, so an unnormalized map just skews relative likelihoods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationRatios {
    pub add_connection: f64,
    pub add_node: f64,
    pub mutate_weights: f64,
    pub change_activation: f64,
}

impl Default for MutationRatios {
    fn default() -> Self {
        Self {
            add_connection: 0.1,
            add_node: 0.05,
            mutate_weights: 0.8,
            change_activation: 0.05,
        }
    }
}

/// The four coefficients of the compatibility-distance formula (§4.C):
/// excess, disjoint, weight-difference, and activation-divergence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharingConstants {
    pub c1_excess: f64,
    pub c2_disjoint: f64,
    pub c3_weight: f64,
    pub c4_activation: f64,
}

impl Default for SharingConstants {
    fn default() -> Self {
        Self {
            c1_excess: 1.0,
            c2_disjoint: 1.0,
            c3_weight: 0.4,
            c4_activation: 0.0,
        }
    }
}

/// Genome-level configuration: everything needed to randomize a seed genome
/// and to bound its weight mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeConfig {
    pub n_sensors: usize,
    pub n_outputs: usize,
    pub uses_bias: bool,
    pub min_weight: f64,
    pub max_weight: f64,
    pub mutation_ratios: MutationRatios,
    /// When true, every node keeps the default identity/NEAT-sigmoid
    /// assignment and `change-activation` is never drawn.
    pub constant_activations: bool,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            n_sensors: 2,
            n_outputs: 1,
            uses_bias: true,
            min_weight: -1.0,
            max_weight: 1.0,
            mutation_ratios: MutationRatios::default(),
            constant_activations: false,
        }
    }
}

/// Population-level configuration, matching `original_source/config/neat.go`
/// and `config/population.go`'s defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub size: usize,
    pub distance_threshold: f64,
    pub distance_threshold_epsilon: f64,
    pub target_min_species: usize,
    pub target_max_species: usize,
    pub culling_percent: f64,
    pub recombination_percent: f64,
    pub local_search_generations: usize,
    pub max_epochs: usize,
    pub dropoff_age: usize,
    pub sharing_constants: SharingConstants,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 150,
            distance_threshold: 2.0,
            distance_threshold_epsilon: 0.1,
            target_min_species: 7,
            target_max_species: 13,
            culling_percent: 0.5,
            recombination_percent: 0.8,
            local_search_generations: 8,
            max_epochs: 1000,
            dropoff_age: 15,
            sharing_constants: SharingConstants::default(),
        }
    }
}
