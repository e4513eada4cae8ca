//! Historical-alignment crossover between two genomes of possibly differing
//! topology.

use rand::Rng;

use crate::genome::{Connection, GeneOrigin, Genome};

/// Which rule decides a matched gene's `enabled` bit in the child. The
/// deterministic AND-OR rule is this crate's default; the probabilistic
/// variant is kept only as a documented, named alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverDisableRule {
    /// Disabled in the child iff disabled in both parents.
    AndOr,
    /// 75% chance of disabled in the child if disabled in either parent.
    Probabilistic,
}

impl Default for CrossoverDisableRule {
    fn default() -> Self {
        CrossoverDisableRule::AndOr
    }
}

/// Cross `a` and `b`, given their fitnesses, producing one child genome.
///
/// Panics if `a.uses_bias != b.uses_bias` — crossing genomes that disagree
/// on whether node 0 is a constant-bias source is a programming error, not a
/// recoverable one.
pub fn crossover(
    a: &Genome,
    b: &Genome,
    fitness_a: f64,
    fitness_b: f64,
    rule: CrossoverDisableRule,
    rng: &mut impl Rng,
) -> Genome {
    assert_eq!(
        a.uses_bias, b.uses_bias,
        "cannot cross genomes that disagree on bias usage"
    );

    let (more_fit, less_fit) = pick_more_fit(a, b, fitness_a, fitness_b);

    let mut a_sorted: Vec<&Connection> = more_fit.connections.iter().collect();
    let mut b_sorted: Vec<&Connection> = less_fit.connections.iter().collect();
    a_sorted.sort_by_key(|c| c.innovation);
    b_sorted.sort_by_key(|c| c.innovation);

    let mut child_genes = Vec::new();
    let mut child_activations = more_fit.activations.clone();

    let (mut i, mut j) = (0, 0);
    while i < a_sorted.len() {
        let ga = a_sorted[i];
        match b_sorted.get(j).map(|gb| ga.innovation.cmp(&gb.innovation)) {
            Some(core::cmp::Ordering::Equal) => {
                let gb = b_sorted[j];
                let from_a = rng.random_bool(0.5);
                let mut gene = if from_a { ga.clone() } else { gb.clone() };
                gene.enabled = resolve_enabled(ga, gb, rule, rng);
                gene.origin = GeneOrigin::Seed;
                if !from_a {
                    if let Some(act) = less_fit.activations.get(&gb.in_node) {
                        child_activations.insert(gb.in_node, *act);
                    }
                    if let Some(act) = less_fit.activations.get(&gb.out_node) {
                        child_activations.insert(gb.out_node, *act);
                    }
                }
                child_genes.push(gene);
                i += 1;
                j += 1;
            }
            _ => {
                // Disjoint or excess relative to the less-fit parent:
                // inherited only because it belongs to the more-fit parent.
                child_genes.push(ga.clone());
                i += 1;
            }
        }
    }

    child_genes.sort_by_key(|c| c.innovation);

    let mut child = Genome {
        connections: child_genes,
        sensors: Default::default(),
        hidden: Default::default(),
        outputs: Default::default(),
        activations: child_activations,
        uses_bias: a.uses_bias,
        min_weight: more_fit.min_weight,
        max_weight: more_fit.max_weight,
        config: more_fit.config.clone(),
    };
    child.repopulate_node_sets();
    child
}

fn pick_more_fit<'a>(
    a: &'a Genome,
    b: &'a Genome,
    fitness_a: f64,
    fitness_b: f64,
) -> (&'a Genome, &'a Genome) {
    if fitness_a > fitness_b {
        (a, b)
    } else if fitness_b > fitness_a {
        (b, a)
    } else if a.connections.len() <= b.connections.len() {
        // Tie-break: shorter connection list wins, deterministically.
        (a, b)
    } else {
        (b, a)
    }
}

fn resolve_enabled(
    a: &Connection,
    b: &Connection,
    rule: CrossoverDisableRule,
    rng: &mut impl Rng,
) -> bool {
    match rule {
        CrossoverDisableRule::AndOr => a.enabled || b.enabled,
        CrossoverDisableRule::Probabilistic => {
            if a.enabled && b.enabled {
                true
            } else {
                !rng.random_bool(0.75)
            }
        }
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
    fn child_inherits_every_matched_gene() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let a = Genome::seed(&cfg(), &mut rng, &registry);
        let b = a.clone();
        let child = crossover(&a, &b, 1.0, 1.0, CrossoverDisableRule::AndOr, &mut rng);
        assert_eq!(child.connections.len(), a.connections.len());
    }

    #[test]
    fn and_or_rule_keeps_gene_enabled_if_either_parent_does() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let mut a = Genome::seed(&cfg(), &mut rng, &registry);
        let mut b = a.clone();
        a.connections[0].enabled = false;
        b.connections[0].enabled = true;
        let child = crossover(&a, &b, 1.0, 0.0, CrossoverDisableRule::AndOr, &mut rng);
        let inno = a.connections[0].innovation;
        let gene = child.connections.iter().find(|c| c.innovation == inno).unwrap();
        assert!(gene.enabled);
    }

    #[test]
    #[should_panic(expected = "bias usage")]
    fn bias_mismatch_panics() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let a = Genome::seed(&cfg(), &mut rng, &registry);
        let mut no_bias_cfg = cfg();
        no_bias_cfg.uses_bias = false;
        let b = Genome::seed(&no_bias_cfg, &mut rng, &registry);
        let _ = crossover(&a, &b, 1.0, 1.0, CrossoverDisableRule::AndOr, &mut rng);
    }

    #[test]
    fn disjoint_and_excess_inherited_only_from_more_fit_parent() {
        let registry = InnovationRegistry::new();
        let mut rng = default_rng();
        let mut a = Genome::seed(&cfg(), &mut rng, &registry);
        let b = a.clone();
        a.add_node(&mut rng, &registry).unwrap();
        let child = crossover(&a, &b, 10.0, 0.0, CrossoverDisableRule::AndOr, &mut rng);
        assert_eq!(child.connections.len(), a.connections.len());
    }
}
