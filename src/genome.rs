//! The genome representation: a list of connection genes carrying stable
//! innovation numbers, plus the node sets and activation assignments derived
//! from them.

use std::collections::{BTreeSet, VecDeque};

use fxhash::FxHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::{Activation, ActivationSampler};
use crate::config::{GenomeConfig, SharingConstants};
use crate::error::EvoError;
use crate::innovation::{InnovationRegistry, Origin as InnoOrigin};
use crate::random::EventKind;

const RETRY_LIMIT: usize = 100;

/// Provenance tag recorded on a gene for debugging and for crossover's
/// activation-inheritance rule. Unlike [`InnoOrigin`], this does not
/// participate in the innovation key: weight and activation mutations never
/// mint a new innovation number, they just touch an existing gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneOrigin {
    Seed,
    AddConnection,
    AddNode,
    MutateWeight,
    ChangeActivation,
}

/// A single directed, weighted edge in a potential network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub in_node: usize,
    pub out_node: usize,
    pub weight: f64,
    pub enabled: bool,
    pub origin: GeneOrigin,
    pub innovation: usize,
}

/// Which of the three disjoint sets a node id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sensor,
    Hidden,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationKind {
    AddConnection,
    AddNode,
    MutateWeights,
    ChangeActivation,
}

impl EventKind for MutationKind {
    const COUNT: usize = 4;

    fn variants() -> [Self; Self::COUNT] {
        [
            MutationKind::AddConnection,
            MutationKind::AddNode,
            MutationKind::MutateWeights,
            MutationKind::ChangeActivation,
        ]
    }

    fn idx(&self) -> usize {
        *self as usize
    }
}

/// A NEAT genome: an ordered connection-gene list plus the node partition
/// and activation assignments it implies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub connections: Vec<Connection>,
    pub sensors: BTreeSet<usize>,
    pub hidden: BTreeSet<usize>,
    pub outputs: BTreeSet<usize>,
    pub activations: FxHashMap<usize, Activation>,
    pub uses_bias: bool,
    pub min_weight: f64,
    pub max_weight: f64,
    #[serde(skip)]
    pub config: GenomeConfig,
}

impl Genome {
    /// Build a minimal genome: one connection per sensor-output pair so
    /// every input and output is referenced at least once.
    pub fn seed(config: &GenomeConfig, rng: &mut impl Rng, registry: &InnovationRegistry) -> Self {
        let bias_id = if config.uses_bias { Some(0) } else { None };
        let sensor_base = if config.uses_bias { 1 } else { 0 };
        let sensor_ids: Vec<usize> = (sensor_base..sensor_base + config.n_sensors).collect();
        let output_ids: Vec<usize> = (sensor_base + config.n_sensors
            ..sensor_base + config.n_sensors + config.n_outputs)
            .collect();

        let mut connections = Vec::new();
        for &s in bias_id.iter().chain(sensor_ids.iter()) {
            for &o in &output_ids {
                let innovation = registry.lookup_or_insert(InnoOrigin::AddConnection, s, o);
                connections.push(Connection {
                    in_node: s,
                    out_node: o,
                    weight: rng.random_range(config.min_weight..=config.max_weight),
                    enabled: true,
                    origin: GeneOrigin::Seed,
                    innovation,
                });
            }
        }

        let mut activations = FxHashMap::default();
        for &s in bias_id.iter().chain(sensor_ids.iter()) {
            activations.insert(s, Activation::Identity);
        }
        for &o in &output_ids {
            activations.insert(o, Activation::NeatSigmoid);
        }

        let mut genome = Self {
            connections,
            sensors: BTreeSet::new(),
            hidden: BTreeSet::new(),
            outputs: BTreeSet::new(),
            activations,
            uses_bias: config.uses_bias,
            min_weight: config.min_weight,
            max_weight: config.max_weight,
            config: config.clone(),
        };
        genome.repopulate_node_sets();
        genome
    }

    /// Inspect every gene and classify each referenced node id by whether it
    /// appears only as a source, only as a sink, or both.
    pub fn repopulate_node_sets(&mut self) {
        self.sensors.clear();
        self.hidden.clear();
        self.outputs.clear();

        let mut as_source: BTreeSet<usize> = BTreeSet::new();
        let mut as_sink: BTreeSet<usize> = BTreeSet::new();
        for c in &self.connections {
            as_source.insert(c.in_node);
            as_sink.insert(c.out_node);
        }

        for &id in as_source.union(&as_sink) {
            let is_source = as_source.contains(&id);
            let is_sink = as_sink.contains(&id);
            match (is_source, is_sink) {
                (true, false) => {
                    self.sensors.insert(id);
                }
                (false, true) => {
                    self.outputs.insert(id);
                }
                (true, true) => {
                    self.hidden.insert(id);
                }
                (false, false) => unreachable!("node appears in neither direction"),
            }
        }
    }

    fn next_hidden_id(&self) -> usize {
        self.sensors.len() + self.hidden.len() + self.outputs.len()
    }

    /// The compatibility distance between this genome and `other`, per the
    /// coefficients `c`. Symmetric and non-negative.
    pub fn distance(&self, other: &Genome, c: SharingConstants) -> f64 {
        let mut a: Vec<&Connection> = self.connections.iter().collect();
        let mut b: Vec<&Connection> = other.connections.iter().collect();
        a.sort_by_key(|g| g.innovation);
        b.sort_by_key(|g| g.innovation);

        let max_inno_a = a.last().map(|g| g.innovation);
        let max_inno_b = b.last().map(|g| g.innovation);
        let shared_ceiling = match (max_inno_a, max_inno_b) {
            (Some(x), Some(y)) => x.min(y),
            _ => 0,
        };

        let (mut i, mut j) = (0, 0);
        let (mut excess, mut disjoint, mut matched, mut weight_diff_sum) =
            (0usize, 0usize, 0usize, 0.0f64);
        while i < a.len() && j < b.len() {
            match a[i].innovation.cmp(&b[j].innovation) {
                std::cmp::Ordering::Equal => {
                    matched += 1;
                    weight_diff_sum += (a[i].weight - b[j].weight).abs();
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    if a[i].innovation > shared_ceiling {
                        excess += 1;
                    } else {
                        disjoint += 1;
                    }
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    if b[j].innovation > shared_ceiling {
                        excess += 1;
                    } else {
                        disjoint += 1;
                    }
                    j += 1;
                }
            }
        }
        excess += a.len() - i;
        excess += b.len() - j;

        let n = a.len().max(b.len()).max(1) as f64;
        let w = if matched == 0 {
            0.0
        } else {
            weight_diff_sum / matched as f64
        };

        let denom = self.activations.len().max(other.activations.len());
        let act = if denom == 0 {
            0.0
        } else {
            let shared = self
                .activations
                .iter()
                .filter(|(id, f)| other.activations.get(id) == Some(*f))
                .count();
            shared as f64 / denom as f64
        };

        (c.c1_excess * excess as f64 / n
            + c.c2_disjoint * disjoint as f64 / n
            + c.c3_weight * w
            + c.c4_activation * act)
            .abs()
    }

    fn mutation_probabilities(&self) -> [u64; 4] {
        let r = self.config.mutation_ratios;
        let change_activation = if self.config.constant_activations {
            0.0
        } else {
            r.change_activation
        };
        let total = r.add_connection + r.add_node + r.mutate_weights + change_activation;
        if total <= 0.0 {
            return [0, 0, u64::MAX, 0];
        }
        let scale = |x: f64| ((x / total) * u64::MAX as f64) as u64;
        [
            scale(r.add_connection),
            scale(r.add_node),
            scale(r.mutate_weights),
            scale(change_activation),
        ]
    }

    /// Draw one mutation kind by roulette and apply it in place.
    pub fn mutate(&mut self, rng: &mut impl Rng, registry: &InnovationRegistry) -> Result<(), EvoError> {
        let prob = self.mutation_probabilities();
        let kind = MutationKind::pick(&mut RandCoreAdapter(rng), prob);

        match kind {
            Some(MutationKind::AddConnection) => match self.add_connection(rng, registry) {
                Ok(()) => Ok(()),
                Err(EvoError::AddConnectionUnsatisfiable) => {
                    if let Err(e) = self.add_node(rng, registry) {
                        log::warn!("add-node fallback after add-connection-unsatisfiable also failed: {e}; skipping mutation");
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Some(MutationKind::AddNode) => {
                if let Err(e) = self.add_node(rng, registry) {
                    log::warn!("add-node-unsatisfiable: {e}; skipping mutation");
                }
                Ok(())
            }
            Some(MutationKind::MutateWeights) => {
                self.mutate_weights(rng);
                Ok(())
            }
            Some(MutationKind::ChangeActivation) => {
                self.change_activation(rng);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// True if adding `u -> v` to the enabled-edge subgraph would create a
    /// cycle, i.e. `v` can already reach `u`.
    fn would_cycle(&self, u: usize, v: usize) -> bool {
        if u == v {
            return true;
        }
        let mut queue = VecDeque::new();
        let mut seen = BTreeSet::new();
        queue.push_back(v);
        seen.insert(v);
        while let Some(cur) = queue.pop_front() {
            if cur == u {
                return true;
            }
            for c in self.connections.iter().filter(|c| c.enabled && c.in_node == cur) {
                if seen.insert(c.out_node) {
                    queue.push_back(c.out_node);
                }
            }
        }
        false
    }

    pub(crate) fn add_connection(&mut self, rng: &mut impl Rng, registry: &InnovationRegistry) -> Result<(), EvoError> {
        let sources: Vec<usize> = self.sensors.iter().chain(self.hidden.iter()).copied().collect();
        let targets: Vec<usize> = self.hidden.iter().chain(self.outputs.iter()).copied().collect();
        if sources.is_empty() || targets.is_empty() {
            return Err(EvoError::AddConnectionUnsatisfiable);
        }

        for _ in 0..RETRY_LIMIT {
            let u = sources[rng.random_range(0..sources.len())];
            let v = targets[rng.random_range(0..targets.len())];
            if self.connections.iter().any(|c| c.in_node == u && c.out_node == v) {
                continue;
            }
            if self.would_cycle(u, v) {
                continue;
            }
            let innovation = registry.lookup_or_insert(InnoOrigin::AddConnection, u, v);
            self.connections.push(Connection {
                in_node: u,
                out_node: v,
                weight: rng.random_range(self.min_weight..=self.max_weight),
                enabled: true,
                origin: GeneOrigin::AddConnection,
                innovation,
            });
            self.repopulate_node_sets();
            return Ok(());
        }
        Err(EvoError::AddConnectionUnsatisfiable)
    }

    pub(crate) fn add_node(&mut self, rng: &mut impl Rng, registry: &InnovationRegistry) -> Result<(), EvoError> {
        let enabled_indices: Vec<usize> = self
            .connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled)
            .map(|(i, _)| i)
            .collect();
        if enabled_indices.is_empty() {
            return Err(EvoError::AddNodeUnsatisfiable);
        }
        let idx = enabled_indices[rng.random_range(0..enabled_indices.len())];

        let (in_node, out_node, weight) = {
            let gene = &mut self.connections[idx];
            gene.enabled = false;
            (gene.in_node, gene.out_node, gene.weight)
        };

        let h = self.next_hidden_id();
        let inno_first = registry.lookup_or_insert(InnoOrigin::AddNode, in_node, h);
        let inno_second = registry.lookup_or_insert(InnoOrigin::AddNode, h, out_node);

        self.connections.push(Connection {
            in_node,
            out_node: h,
            weight: 1.0,
            enabled: true,
            origin: GeneOrigin::AddNode,
            innovation: inno_first,
        });
        self.connections.push(Connection {
            in_node: h,
            out_node,
            weight,
            enabled: true,
            origin: GeneOrigin::AddNode,
            innovation: inno_second,
        });

        if !self.config.constant_activations {
            let mut sampler = ActivationSampler::new(rng.random::<i64>());
            self.activations.insert(h, sampler.sample());
        }

        self.repopulate_node_sets();
        Ok(())
    }

    /// Perturb one gene's weight by a uniform sample in `[-0.25, 0.25]`.
    /// Not clipped to `min_weight`/`max_weight` — those bounds only seed
    /// initial weights.
    fn mutate_weights(&mut self, rng: &mut impl Rng) {
        if self.connections.is_empty() {
            return;
        }
        let idx = rng.random_range(0..self.connections.len());
        let delta = rng.random_range(-0.25..=0.25);
        let gene = &mut self.connections[idx];
        gene.weight += delta;
        gene.origin = GeneOrigin::MutateWeight;
    }

    fn change_activation(&mut self, rng: &mut impl Rng) {
        if self.activations.is_empty() {
            return;
        }
        let keys: Vec<usize> = self.activations.keys().copied().collect();
        let target = keys[rng.random_range(0..keys.len())];
        let mut sampler = ActivationSampler::new(rng.random::<i64>());
        self.activations.insert(target, sampler.sample());
    }

    /// Clone and apply exactly one weighted-random mutation. Used by species
    /// local search and by asexual recombination.
    pub fn random_neighbor(&self, rng: &mut impl Rng, registry: &InnovationRegistry) -> Genome {
        let mut child = self.clone();
        let _ = child.mutate(rng, registry);
        child
    }

    /// A stable, sort-stable textual form of this genome's enabled genes,
    /// sufficient to distinguish one genome from another for convergence
    /// estimation. Not a full serialization — use [`Genome::to_string`] for
    /// that.
    pub fn entropy_string(&self) -> String {
        let mut enabled: Vec<&Connection> = self.connections.iter().filter(|c| c.enabled).collect();
        enabled.sort_by_key(|c| c.innovation);
        enabled
            .iter()
            .map(|c| format!("{}:{:.4}", c.innovation, c.weight))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Serialize this genome to a JSON string.
    #[allow(clippy::inherent_to_string)]
    pub fn to_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize a genome from a JSON string produced by [`Genome::to_string`].
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn to_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_string()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_str(&raw).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Bridges `rand::Rng` to the `rand::RngCore`-only `EventKind::pick`, since
/// generic `impl Rng` callers shouldn't need to know about `RngCore`.
struct RandCoreAdapter<'a, R: Rng>(&'a mut R);

impl<'a, R: Rng> rand::RngCore for RandCoreAdapter<'a, R> {
    fn next_u32(&mut self) -> u32 {
        self.0.random()
    }
    fn next_u64(&mut self) -> u64 {
        self.0.random()
    }
    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.0.fill(dst)
    }
}
