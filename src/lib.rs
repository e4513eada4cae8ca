#![allow(confusable_idents)]
#![allow(mixed_script_confusables)]

pub mod activation;
pub mod config;
pub mod crossover;
pub mod error;
pub mod genome;
pub mod innovation;
pub mod network;
pub mod population;
pub mod random;
pub mod specie;

pub use activation::Activation;
pub use config::{GenomeConfig, PopulationConfig};
pub use crossover::{crossover, CrossoverDisableRule};
pub use error::EvoError;
pub use genome::{Connection, Genome};
pub use innovation::InnovationRegistry;
pub use network::Network;
pub use population::{Champion, Population};
pub use specie::Species;
