//! The catalog of per-node activation functions and the deterministic
//! sampler used to assign them to freshly created nodes.
//!
//! Every function here is a plain `f64 -> f64`; the catalog is closed so that
//! a node's activation can be stored as a name (for serialization, for
//! compatibility-distance comparisons) and resolved back to a function
//! pointer on demand.

use serde::{Deserialize, Serialize};

/// One entry in the activation catalog. Stored on nodes instead of a bare
/// function pointer so genomes stay `Serialize`/`Deserialize`/`PartialEq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activation {
    Identity,
    Sine,
    DoubleSine,
    Absolute,
    Null,
    Gaussian,
    Sigmoid,
    NeatSigmoid,
    BipolarSigmoid,
    Quadratic,
    Sawtooth,
    Step,
    Negation,
    ShiftedExponential,
    AbsoluteTetration,
}

const CATALOG: [Activation; 15] = [
    Activation::Identity,
    Activation::Sine,
    Activation::DoubleSine,
    Activation::Absolute,
    Activation::Null,
    Activation::Gaussian,
    Activation::Sigmoid,
    Activation::NeatSigmoid,
    Activation::BipolarSigmoid,
    Activation::Quadratic,
    Activation::Sawtooth,
    Activation::Step,
    Activation::Negation,
    Activation::ShiftedExponential,
    Activation::AbsoluteTetration,
];

impl Activation {
    /// Evaluate this activation at `x`.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Sine => x.sin(),
            Activation::DoubleSine => (2.0 * x).sin(),
            Activation::Absolute => x.abs(),
            Activation::Null => 0.0,
            Activation::Gaussian => 2.0 * (-(2.5 * x).powi(2)).exp() - 1.0,
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::NeatSigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            Activation::BipolarSigmoid => 2.0 / (1.0 + (-4.9 * x).exp()) - 1.0,
            Activation::Quadratic => x * x,
            Activation::Sawtooth => x.rem_euclid(1.0),
            Activation::Step => (x * 10.0).floor() / 10.0,
            Activation::Negation => -x,
            // x - 1 keeps |f(x)| <= 1 on (-1, 1).
            Activation::ShiftedExponential => (x - 1.0).exp(),
            Activation::AbsoluteTetration => x.abs().powf(x),
        }
    }

    /// Stable name for serialization and for `by_name`'s inverse.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Identity => "identity",
            Activation::Sine => "sine",
            Activation::DoubleSine => "double-sine",
            Activation::Absolute => "absolute",
            Activation::Null => "null",
            Activation::Gaussian => "gaussian",
            Activation::Sigmoid => "sigmoid",
            Activation::NeatSigmoid => "neat-sigmoid",
            Activation::BipolarSigmoid => "bipolar-sigmoid",
            Activation::Quadratic => "quadratic",
            Activation::Sawtooth => "sawtooth",
            Activation::Step => "step",
            Activation::Negation => "negation",
            Activation::ShiftedExponential => "shifted-exponential",
            Activation::AbsoluteTetration => "absolute-tetration",
        }
    }

    /// Resolve a stable name back to its `Activation`. Unknown names fall
    /// back to `Identity`, mirroring the original catalog's default case.
    pub fn by_name(name: &str) -> Activation {
        CATALOG
            .iter()
            .copied()
            .find(|a| a.name() == name)
            .unwrap_or(Activation::Identity)
    }
}

/// A small linear-congruential generator, kept deliberately separate from the
/// crate's general-purpose `rand`-backed RNG (`random::default_rng`) so that
/// activation-function assignment can be replayed exactly given the same
/// seed, independent of how many other random draws a run has made.
#[derive(Debug, Clone)]
pub struct ActivationSampler {
    state: i64,
}

impl ActivationSampler {
    pub fn new(seed: i64) -> Self {
        Self { state: seed }
    }

    fn next_raw(&mut self) -> i64 {
        self.state = (1_028_597 * self.state + 488_249) % 1_737_017;
        self.state
    }

    /// Uniformly sample one of the catalog's functions.
    pub fn sample(&mut self) -> Activation {
        let p = self.next_raw().rem_euclid(CATALOG.len() as i64) as usize;
        CATALOG[p]
    }
}

impl Default for ActivationSampler {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trip() {
        for a in CATALOG {
            assert_eq!(Activation::by_name(a.name()), a);
        }
    }

    #[test]
    fn unknown_name_defaults_to_identity() {
        assert_eq!(Activation::by_name("not-a-function"), Activation::Identity);
    }

    #[test]
    fn sampler_is_deterministic_given_same_seed() {
        let mut a = ActivationSampler::new(42);
        let mut b = ActivationSampler::new(42);
        for _ in 0..50 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn sampler_visits_more_than_one_function() {
        let mut s = ActivationSampler::new(1);
        let draws: std::collections::HashSet<_> = (0..200).map(|_| s.sample()).collect();
        assert!(draws.len() > 1);
    }

    #[test]
    fn neat_sigmoid_and_bipolar_sigmoid_are_distinct() {
        assert_ne!(
            Activation::NeatSigmoid.apply(1.0),
            Activation::BipolarSigmoid.apply(1.0)
        );
    }

    #[test]
    fn gaussian_peaks_at_origin() {
        assert!((Activation::Gaussian.apply(0.0) - 1.0).abs() < 1e-9);
    }
}
