//! Mutation operators.
//!
//! Each organism is mutated at most once per generation (the species champion
//! is exempt). Structural mutations consult the [`GenerationCache`] so that
//! organisms making the same change in the same generation share innovation
//! numbers, and every new gene goes through [`Organism::add_gene`].

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, trace};

use crate::config::NeatConfig;
use crate::error::OrganismError;
use crate::gene::{Gene, NodeId, NodeType};
use crate::innovation::{GenerationCache, InnovationRegistry};
use crate::organism::{random_weight, GeneKey, Organism};

/// Random node pairs tried before an add-connection mutation gives up.
const MAX_CONNECTION_ATTEMPTS: usize = 20;

/// What a single call to [`Organism::mutate`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// Number of perturbed weights.
    pub weights: usize,
    /// Whether a connection was added.
    pub connection_added: bool,
    /// Whether a gene was split by a new node.
    pub node_added: bool,
}

impl MutationReport {
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.connection_added || self.node_added
    }
}

impl Organism {
    /// Apply weight perturbation, then add-connection, then add-node.
    ///
    /// Candidates that would break the evaluation order or duplicate a gene are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Only contract failures such as [`OrganismError::NodeNotFound`] are
    /// returned.
    pub fn mutate<R: Rng>(
        &mut self,
        config: &NeatConfig,
        registry: &InnovationRegistry,
        cache: &mut GenerationCache,
        rng: &mut R,
    ) -> Result<MutationReport, OrganismError> {
        let weights = self.mutate_weights(config, rng);
        let connection_added = self.mutate_add_connection(config, registry, cache, rng)?;
        let node_added = self.mutate_add_node(config, registry, cache, rng)?;

        Ok(MutationReport {
            weights,
            connection_added,
            node_added,
        })
    }

    /// Perturb enabled weights by a normally distributed delta clamped to
    /// `±weight_mutation_power`. Returns the number of perturbed genes.
    pub fn mutate_weights<R: Rng>(&mut self, config: &NeatConfig, rng: &mut R) -> usize {
        let normal = match Normal::new(0.0, config.weight_mutation_std_dev) {
            Ok(normal) => normal,
            Err(err) => {
                debug!(
                    std_dev = config.weight_mutation_std_dev,
                    %err,
                    "weight mutation skipped"
                );
                return 0;
            }
        };
        let limit = config.weight_mutation_power;

        let mut perturbed = 0;
        for &key in &self.by_innovation {
            let gene = &mut self.genes[key];
            if gene.enabled && rng.random::<f64>() < config.weight_mutation_prob {
                gene.weight += normal.sample(rng).clamp(-limit, limit);
                perturbed += 1;
            }
        }
        perturbed
    }

    /// Replace every weight with a uniform draw from `±range`.
    pub fn randomize_weights<R: Rng>(&mut self, range: f64, rng: &mut R) {
        for &key in &self.by_innovation {
            self.genes[key].weight = random_weight(rng, range);
        }
    }

    /// Try to connect two unconnected nodes.
    ///
    /// Sources are any non-output node, targets any hidden or output node. When
    /// the organism is recurrent, a `recurrent_connection_prob` draw decides
    /// whether this mutation may close a cycle; otherwise pairs that would break
    /// the evaluation order are skipped.
    pub fn mutate_add_connection<R: Rng>(
        &mut self,
        config: &NeatConfig,
        registry: &InnovationRegistry,
        cache: &mut GenerationCache,
        rng: &mut R,
    ) -> Result<bool, OrganismError> {
        if rng.random::<f64>() >= config.add_connection_prob {
            return Ok(false);
        }

        let allow_recurrent =
            self.recurrent && rng.random::<f64>() < config.recurrent_connection_prob;

        let sources: Vec<NodeId> = self
            .nodes
            .iter()
            .copied()
            .filter(|&id| allow_recurrent || self.node_type(id) != Some(NodeType::Output))
            .collect();
        let targets: Vec<NodeId> = self
            .nodes
            .iter()
            .copied()
            .filter(|&id| {
                matches!(
                    self.node_type(id),
                    Some(NodeType::Hidden | NodeType::Output)
                )
            })
            .collect();

        if sources.is_empty() || targets.is_empty() {
            return Ok(false);
        }

        for _ in 0..MAX_CONNECTION_ATTEMPTS {
            let input = sources[rng.random_range(0..sources.len())];
            let output = targets[rng.random_range(0..targets.len())];

            if self.is_connected(input, output) {
                continue;
            }
            if !allow_recurrent && self.violates_order(input, output) {
                continue;
            }

            let gene = cache
                .connection_or_insert((input, output), registry, || {
                    random_weight(rng, config.initial_weight_range)
                })
                .with_activation(config.activation);

            match self.connect(gene) {
                Ok(()) => {
                    trace!(innovation = %gene.innovation, %input, %output, "connection added");
                    return Ok(true);
                }
                Err(err) if err.is_recoverable() => {
                    debug!(%err, "skipping add-connection candidate");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(false)
    }

    /// Split a random enabled gene with a new hidden node.
    ///
    /// The split gene is disabled; `input -> node` gets weight 1.0 and
    /// `node -> output` keeps the split gene's weight.
    pub fn mutate_add_node<R: Rng>(
        &mut self,
        config: &NeatConfig,
        registry: &InnovationRegistry,
        cache: &mut GenerationCache,
        rng: &mut R,
    ) -> Result<bool, OrganismError> {
        if rng.random::<f64>() >= config.add_node_prob {
            return Ok(false);
        }

        let enabled: Vec<GeneKey> = self
            .by_innovation
            .iter()
            .copied()
            .filter(|&key| self.genes[key].enabled)
            .collect();
        if enabled.is_empty() {
            return Ok(false);
        }

        let key = enabled[rng.random_range(0..enabled.len())];
        let target = self.genes[key];
        let split = cache.split_or_insert(target.pair(), registry, target.weight);

        if self.contains_node(split.node)
            || self.contains_gene(split.incoming.innovation)
            || self.contains_gene(split.outgoing.innovation)
        {
            debug!(node = %split.node, "organism already holds this split");
            return Ok(false);
        }

        let incoming = split.incoming.with_activation(config.activation);
        let outgoing = Gene {
            weight: target.weight,
            ..split.outgoing
        }
        .with_activation(config.activation);

        self.genes[key].enabled = false;
        if let Err(err) = self.add_gene(incoming) {
            self.genes[key].enabled = true;
            return Self::skip_recoverable(err);
        }
        self.add_gene(outgoing)?;

        trace!(node = %split.node, split = %target.innovation, "node added");
        Ok(true)
    }

    fn skip_recoverable(err: OrganismError) -> Result<bool, OrganismError> {
        if err.is_recoverable() {
            debug!(%err, "skipping add-node candidate");
            Ok(false)
        } else {
            Err(err)
        }
    }
}
