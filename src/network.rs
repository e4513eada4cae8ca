//! Compiles a genome into a runnable directed graph and evaluates it with a
//! bounded forward-propagation fixpoint, tolerant of the cycles an evolved
//! topology may contain.

use std::fs;
use std::path::Path;

use crate::activation::Activation;
use crate::error::EvoError;
use crate::genome::Genome;

const MAX_ROUNDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexKind {
    Bias,
    Sensor,
    Hidden,
    Output,
}

#[derive(Debug, Clone)]
struct Edge {
    source: usize,
    weight: f64,
}

#[derive(Debug, Clone)]
struct Vertex {
    kind: VertexKind,
    activation: Activation,
    value: f64,
    in_edges: Vec<Edge>,
    /// Out-edges as `(target vertex index, edge index within that target's
    /// in_edges)`, kept so forward propagation can mark delivery in O(1).
    out_edges: Vec<(usize, usize)>,
    delivered: Vec<bool>,
}

/// A compiled, runnable network. Built once from a [`Genome`] via
/// [`Network::compile`]; rebuilding is the caller's responsibility whenever
/// the source genome changes (compiling twice from an unchanged genome is
/// idempotent).
pub struct Network {
    vertices: Vec<Vertex>,
    node_id_to_index: std::collections::HashMap<usize, usize>,
    sensor_order: Vec<usize>,
    output_order: Vec<usize>,
    bias_index: Option<usize>,
}

impl Network {
    /// Build a fresh vertex per node id and a fresh edge per enabled gene.
    pub fn compile(genome: &Genome) -> Self {
        let mut node_id_to_index = std::collections::HashMap::new();
        let mut vertices = Vec::new();

        let mut push_vertex = |id: usize, kind: VertexKind, activations: &crate::genome::Genome| {
            let activation = activations
                .activations
                .get(&id)
                .copied()
                .unwrap_or(Activation::Identity);
            node_id_to_index.insert(
                id,
                vertices.len(),
            );
            vertices.push(Vertex {
                kind,
                activation,
                value: f64::NAN,
                in_edges: Vec::new(),
                out_edges: Vec::new(),
                delivered: Vec::new(),
            });
        };

        let mut bias_index = None;
        for &id in &genome.sensors {
            let kind = if genome.uses_bias && id == 0 {
                VertexKind::Bias
            } else {
                VertexKind::Sensor
            };
            if kind == VertexKind::Bias {
                bias_index = Some(vertices.len());
            }
            push_vertex(id, kind, genome);
        }
        for &id in &genome.hidden {
            push_vertex(id, VertexKind::Hidden, genome);
        }
        for &id in &genome.outputs {
            push_vertex(id, VertexKind::Output, genome);
        }

        for c in genome.connections.iter().filter(|c| c.enabled) {
            let (Some(&src), Some(&dst)) = (
                node_id_to_index.get(&c.in_node),
                node_id_to_index.get(&c.out_node),
            ) else {
                continue;
            };
            let edge_idx = vertices[dst].in_edges.len();
            vertices[dst].in_edges.push(Edge {
                source: src,
                weight: c.weight,
            });
            vertices[dst].delivered.push(false);
            vertices[src].out_edges.push((dst, edge_idx));
        }

        let sensor_order: Vec<usize> = genome
            .sensors
            .iter()
            .copied()
            .filter(|&id| !(genome.uses_bias && id == 0))
            .collect();
        let output_order: Vec<usize> = genome.outputs.iter().copied().collect();

        Self {
            vertices,
            node_id_to_index,
            sensor_order,
            output_order,
            bias_index,
        }
    }

    /// Evaluate the network for one input vector, given in the same order as
    /// `sensor_order()`. Returns the output vector in `output_order()`.
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, EvoError> {
        assert_eq!(inputs.len(), self.sensor_order.len(), "input arity mismatch");

        for v in &mut self.vertices {
            v.value = f64::NAN;
            v.delivered.iter_mut().for_each(|d| *d = false);
        }
        if let Some(bias_idx) = self.bias_index {
            self.vertices[bias_idx].value = 1.0;
        }

        for _ in 0..MAX_ROUNDS {
            for v in &mut self.vertices {
                v.delivered.iter_mut().for_each(|d| *d = false);
            }

            for (i, &id) in self.sensor_order.iter().enumerate() {
                let idx = self.node_id_to_index[&id];
                self.vertices[idx].value = inputs[i];
                self.propagate(idx);
            }

            if self
                .output_order
                .iter()
                .all(|id| !self.vertices[self.node_id_to_index[id]].value.is_nan())
            {
                let out = self
                    .output_order
                    .iter()
                    .map(|id| self.vertices[self.node_id_to_index[id]].value)
                    .collect();
                return Ok(out);
            }
        }

        Err(EvoError::ActivationNonterminating(MAX_ROUNDS))
    }

    fn propagate(&mut self, from: usize) {
        let mut stack = vec![from];
        while let Some(cur) = stack.pop() {
            let out_edges = self.vertices[cur].out_edges.clone();
            for (target, edge_idx) in out_edges {
                self.vertices[target].delivered[edge_idx] = true;
                self.recompute(target);
                stack.push(target);
            }
        }
    }

    fn recompute(&mut self, idx: usize) {
        let vertex = &self.vertices[idx];
        let mut sum = 0.0;
        let mut bias = 0.0;
        for edge in &vertex.in_edges {
            let source_value = self.vertices[edge.source].value;
            let contribution = if source_value.is_nan() {
                0.0
            } else {
                source_value * edge.weight
            };
            if self.vertices[edge.source].kind == VertexKind::Bias {
                bias += contribution;
            } else {
                sum += contribution;
            }
        }
        let activation = self.vertices[idx].activation;
        self.vertices[idx].value = activation.apply(sum) + bias;
    }

    pub fn sensor_order(&self) -> &[usize] {
        &self.sensor_order
    }

    pub fn output_order(&self) -> &[usize] {
        &self.output_order
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let flat: Vec<(usize, f64)> = self
            .output_order
            .iter()
            .map(|&id| (id, self.vertices[self.node_id_to_index[&id]].value))
            .collect();
        serde_json::to_string(&flat)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .unwrap_or_else(|_| "[]".to_string());
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenomeConfig;
    use crate::innovation::InnovationRegistry;
    use crate::random::default_rng;

    fn cfg() -> GenomeConfig {
        GenomeConfig {
            n_sensors: 2,
            n_outputs: 1,
            uses_bias: true,
            ..GenomeConfig::default()
        }
    }

    #[test]
    fn feed_forward_network_settles_in_one_round() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let genome = Genome::seed(&cfg(), &mut rng, &registry);
        let mut net = Network::compile(&genome);
        let out = net.activate(&[1.0, 0.0]).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_finite());
    }

    #[test]
    fn compiling_twice_from_unchanged_genome_gives_same_topology() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let genome = Genome::seed(&cfg(), &mut rng, &registry);
        let a = Network::compile(&genome);
        let b = Network::compile(&genome);
        assert_eq!(a.sensor_order(), b.sensor_order());
        assert_eq!(a.output_order(), b.output_order());
    }

    #[test]
    fn cyclic_network_resolves_within_round_bound() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let mut genome = Genome::seed(&cfg(), &mut rng, &registry);
        for _ in 0..5 {
            let _ = genome.add_node(&mut rng, &registry);
        }
        let mut net = Network::compile(&genome);
        let result = net.activate(&[0.3, 0.7]);
        assert!(result.is_ok());
    }
}
