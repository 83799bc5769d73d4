//! Organism (genome) with an incrementally maintained evaluation order.
//!
//! Genes are stored once in a `SlotMap` arena and referenced from two ordered
//! key lists:
//!
//! - `by_innovation`: strictly ascending innovation numbers, used to align two
//!   genomes for distance and crossover
//! - `by_evaluation`: execution order, in which every gene comes after all genes
//!   that write to its input node (unless the organism is recurrent)
//!
//! [`Organism::add_gene`] places each new gene with a local search instead of
//! re-running a topological sort, so the evaluation order stays valid after
//! every structural change and [`Organism::eval`] is a single forward pass.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::config::{ConnectStrategy, NeatConfig};
use crate::error::{OrganismError, SnapshotError};
use crate::gene::{Gene, GeneId, NodeId, NodeType, BIAS_NODE};
use crate::innovation::InnovationRegistry;

new_key_type! {
    /// Arena key of a gene within one organism.
    pub struct GeneKey;
}

/// A genome: an evolvable network of scalar nodes and weighted genes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "GenomeSnapshot", try_from = "GenomeSnapshot")]
pub struct Organism {
    /// Input node ids, in input order.
    pub(crate) inputs: Vec<NodeId>,
    /// Output node ids, in output order.
    pub(crate) outputs: Vec<NodeId>,
    /// Every node, index-addressable for random selection.
    pub(crate) nodes: Vec<NodeId>,
    /// Position of each node in `nodes`.
    pub(crate) node_slots: HashMap<NodeId, usize>,
    pub(crate) genes: SlotMap<GeneKey, Gene>,
    pub(crate) by_innovation: Vec<GeneKey>,
    pub(crate) by_evaluation: Vec<GeneKey>,
    pub(crate) recurrent: bool,
    /// Fitness assigned by the last evaluation (0 until evaluated).
    pub fitness: f64,
}

impl Organism {
    /// Create an organism with the bias, input and output nodes and no genes.
    #[must_use]
    pub fn blank(inputs: Vec<NodeId>, outputs: Vec<NodeId>, recurrent: bool) -> Self {
        let mut organism = Self {
            inputs,
            outputs,
            nodes: Vec::new(),
            node_slots: HashMap::new(),
            genes: SlotMap::with_key(),
            by_innovation: Vec::new(),
            by_evaluation: Vec::new(),
            recurrent,
            fitness: 0.0,
        };

        organism.insert_node(BIAS_NODE);
        for id in organism.inputs.clone() {
            organism.insert_node(id);
        }
        for id in organism.outputs.clone() {
            organism.insert_node(id);
        }
        organism
    }

    /// Create an organism wired according to `config.connect_strategy`.
    ///
    /// Every connection allocates a fresh innovation number from `registry`.
    /// With `config.use_bias` the bias node is also connected to every output.
    ///
    /// # Errors
    ///
    /// Propagates [`Organism::add_gene`] failures, which indicate duplicated
    /// terminal ids.
    pub fn connected<R: Rng>(
        config: &NeatConfig,
        inputs: &[NodeId],
        outputs: &[NodeId],
        registry: &InnovationRegistry,
        rng: &mut R,
    ) -> Result<Self, OrganismError> {
        let mut organism = Self::blank(inputs.to_vec(), outputs.to_vec(), config.recurrent);

        let mut pairs: Vec<(NodeId, NodeId)> = match config.connect_strategy {
            ConnectStrategy::None => Vec::new(),
            ConnectStrategy::Full => inputs
                .iter()
                .flat_map(|&input| outputs.iter().map(move |&output| (input, output)))
                .collect(),
            ConnectStrategy::Flow if inputs.is_empty() || outputs.is_empty() => Vec::new(),
            ConnectStrategy::Flow => (0..inputs.len().max(outputs.len()))
                .map(|i| (inputs[i % inputs.len()], outputs[i % outputs.len()]))
                .collect(),
        };

        if config.use_bias {
            pairs.extend(outputs.iter().map(|&output| (BIAS_NODE, output)));
        }

        for (input, output) in pairs {
            let weight = random_weight(rng, config.initial_weight_range);
            let gene = Gene::new(registry.next_innovation(), input, output, weight)
                .with_activation(config.activation);
            organism.add_gene(gene)?;
        }

        Ok(organism)
    }

    /// Rebuild an organism from a gene list, inserting the genes in the given
    /// order through [`Organism::add_gene`].
    ///
    /// # Errors
    ///
    /// Fails if a gene is duplicated or, for a non-recurrent organism, if the
    /// genes contain a cycle.
    pub fn from_genes(
        inputs: Vec<NodeId>,
        outputs: Vec<NodeId>,
        recurrent: bool,
        genes: impl IntoIterator<Item = Gene>,
    ) -> Result<Self, OrganismError> {
        let mut organism = Self::blank(inputs, outputs, recurrent);
        for gene in genes {
            organism.add_gene(gene)?;
        }
        Ok(organism)
    }

    #[must_use]
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Every node, bias first, then inputs, outputs and hidden nodes in the
    /// order they appeared.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_slots.contains_key(&id)
    }

    /// The role of `id` in this organism.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        if !self.contains_node(id) {
            return None;
        }
        Some(if id == BIAS_NODE {
            NodeType::Bias
        } else if self.inputs.contains(&id) {
            NodeType::Input
        } else if self.outputs.contains(&id) {
            NodeType::Output
        } else {
            NodeType::Hidden
        })
    }

    /// Get all hidden node IDs.
    #[must_use]
    pub fn hidden_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&id| self.node_type(id) == Some(NodeType::Hidden))
            .collect()
    }

    /// Genes in ascending innovation order.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> + '_ {
        self.by_innovation.iter().map(|&key| &self.genes[key])
    }

    /// Genes in execution order.
    pub fn evaluation_order(&self) -> impl Iterator<Item = &Gene> + '_ {
        self.by_evaluation.iter().map(|&key| &self.genes[key])
    }

    #[must_use]
    pub fn gene_count(&self) -> usize {
        self.by_innovation.len()
    }

    /// Get the number of enabled genes.
    #[must_use]
    pub fn num_enabled_genes(&self) -> usize {
        self.genes.values().filter(|g| g.enabled).count()
    }

    /// Find a gene by its innovation number.
    #[must_use]
    pub fn gene(&self, innovation: GeneId) -> Option<&Gene> {
        self.innovation_index(innovation)
            .ok()
            .map(|i| &self.genes[self.by_innovation[i]])
    }

    #[must_use]
    pub fn contains_gene(&self, innovation: GeneId) -> bool {
        self.innovation_index(innovation).is_ok()
    }

    /// Whether any gene, enabled or not, connects `input` to `output`.
    #[must_use]
    pub fn is_connected(&self, input: NodeId, output: NodeId) -> bool {
        self.genes
            .values()
            .any(|g| g.input == input && g.output == output)
    }

    /// Whether a gene `input -> output` could not be placed in the current
    /// evaluation order without a cycle.
    ///
    /// This ignores the organism's recurrence flag; [`Organism::add_gene`]
    /// only rejects such genes when the organism is not recurrent.
    #[must_use]
    pub fn violates_order(&self, input: NodeId, output: NodeId) -> bool {
        if input == output {
            return true;
        }
        matches!(
            self.dependencies(input, output),
            (Some(input_dep), Some(output_dep)) if output_dep <= input_dep
        )
    }

    /// Insert a gene, materializing any endpoint node the organism lacks as a
    /// hidden node.
    ///
    /// The gene goes right after the last gene writing to its input node, or
    /// right before the first gene reading its output node, or at the front
    /// when neither exists. On error the organism is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`OrganismError::DuplicateGene`] if the innovation is already present
    /// - [`OrganismError::RecurrenceViolation`] if the organism is not recurrent
    ///   and the gene would need to run both before and after another gene
    pub fn add_gene(&mut self, gene: Gene) -> Result<(), OrganismError> {
        let Err(innovation_pos) = self.innovation_index(gene.innovation) else {
            return Err(OrganismError::DuplicateGene(gene.innovation));
        };
        let evaluation_pos = self.placement(&gene)?;

        self.insert_node(gene.input);
        self.insert_node(gene.output);

        let key = self.genes.insert(gene);
        self.by_innovation.insert(innovation_pos, key);
        self.by_evaluation.insert(evaluation_pos, key);
        Ok(())
    }

    /// Insert a gene between two nodes the organism already has.
    ///
    /// # Errors
    ///
    /// [`OrganismError::NodeNotFound`] if either endpoint is unknown, otherwise
    /// as [`Organism::add_gene`].
    pub fn connect(&mut self, gene: Gene) -> Result<(), OrganismError> {
        for id in [gene.input, gene.output] {
            if !self.contains_node(id) {
                return Err(OrganismError::NodeNotFound(id));
            }
        }
        self.add_gene(gene)
    }

    /// Run one forward pass.
    ///
    /// The bias node is 1.0, inputs take `inputs` in order and every other node
    /// starts at 0. Each enabled gene, in evaluation order, adds
    /// `activation(value[input]) * weight` to its output node.
    ///
    /// # Errors
    ///
    /// [`OrganismError::InvalidInputArity`] if `inputs` does not match the
    /// number of input nodes.
    pub fn eval(&self, inputs: &[f64]) -> Result<Vec<f64>, OrganismError> {
        if inputs.len() != self.inputs.len() {
            return Err(OrganismError::InvalidInputArity {
                expected: self.inputs.len(),
                actual: inputs.len(),
            });
        }

        let mut values = vec![0.0; self.nodes.len()];
        values[self.slot(BIAS_NODE)?] = 1.0;
        for (&id, &value) in self.inputs.iter().zip(inputs) {
            values[self.slot(id)?] = value;
        }

        for gene in self.evaluation_order() {
            if !gene.enabled {
                continue;
            }
            let signal = gene.activation.apply(values[self.slot(gene.input)?]) * gene.weight;
            values[self.slot(gene.output)?] += signal;
        }

        self.outputs
            .iter()
            .map(|&id| self.slot(id).map(|slot| values[slot]))
            .collect()
    }

    /// Check that no gene reads a node that a later gene still writes to.
    #[must_use]
    pub fn is_topologically_ordered(&self) -> bool {
        let order: Vec<&Gene> = self.evaluation_order().collect();
        order.iter().enumerate().all(|(i, gene)| {
            gene.input != gene.output && order[i + 1..].iter().all(|later| later.output != gene.input)
        })
    }

    /// Capture the organism as a plain, serializable value.
    #[must_use]
    pub fn snapshot(&self) -> GenomeSnapshot {
        GenomeSnapshot {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            nodes: self.nodes.clone(),
            recurrent: self.recurrent,
            fitness: self.fitness,
            genes: self.genes().copied().collect(),
            evaluation: self.evaluation_order().map(|g| g.innovation).collect(),
        }
    }

    /// `(highest index writing to input, lowest index reading output)` in
    /// evaluation order.
    fn dependencies(&self, input: NodeId, output: NodeId) -> (Option<usize>, Option<usize>) {
        let mut input_dep = None;
        let mut output_dep = None;
        for (i, &key) in self.by_evaluation.iter().enumerate() {
            let gene = &self.genes[key];
            if gene.output == input {
                input_dep = Some(i);
            }
            if output_dep.is_none() && gene.input == output {
                output_dep = Some(i);
            }
        }
        (input_dep, output_dep)
    }

    /// Evaluation-order index at which `gene` must be inserted.
    fn placement(&self, gene: &Gene) -> Result<usize, OrganismError> {
        if !self.recurrent && self.violates_order(gene.input, gene.output) {
            return Err(OrganismError::RecurrenceViolation {
                input: gene.input,
                output: gene.output,
            });
        }

        Ok(match self.dependencies(gene.input, gene.output) {
            (Some(input_dep), _) => input_dep + 1,
            (None, Some(output_dep)) => output_dep,
            (None, None) => 0,
        })
    }

    fn innovation_index(&self, innovation: GeneId) -> Result<usize, usize> {
        self.by_innovation
            .binary_search_by_key(&innovation, |&key| self.genes[key].innovation)
    }

    fn insert_node(&mut self, id: NodeId) {
        if !self.node_slots.contains_key(&id) {
            self.node_slots.insert(id, self.nodes.len());
            self.nodes.push(id);
        }
    }

    fn slot(&self, id: NodeId) -> Result<usize, OrganismError> {
        self.node_slots
            .get(&id)
            .copied()
            .ok_or(OrganismError::NodeNotFound(id))
    }
}

/// Uniform weight in `[-range, range]`.
pub(crate) fn random_weight<R: Rng>(rng: &mut R, range: f64) -> f64 {
    if range > 0.0 {
        rng.random_range(-range..=range)
    } else {
        0.0
    }
}

/// Serialized form of an [`Organism`].
///
/// Genes are listed in innovation order; `evaluation` records the execution
/// order by innovation number so a restored organism evaluates bit-identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeSnapshot {
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
    #[serde(default)]
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub recurrent: bool,
    /// Written as `null` when not finite and read back as negative infinity.
    #[serde(default, with = "fitness_serde")]
    pub fitness: f64,
    pub genes: Vec<Gene>,
    pub evaluation: Vec<GeneId>,
}

mod fitness_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(fitness: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        fitness.is_finite().then_some(*fitness).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
    }
}

impl From<Organism> for GenomeSnapshot {
    fn from(organism: Organism) -> Self {
        organism.snapshot()
    }
}

impl TryFrom<GenomeSnapshot> for Organism {
    type Error = SnapshotError;

    fn try_from(snapshot: GenomeSnapshot) -> Result<Self, Self::Error> {
        if snapshot.evaluation.len() != snapshot.genes.len() {
            return Err(SnapshotError::EvaluationLength {
                listed: snapshot.evaluation.len(),
                expected: snapshot.genes.len(),
            });
        }

        let mut organism = Self::blank(snapshot.inputs, snapshot.outputs, snapshot.recurrent);
        organism.fitness = snapshot.fitness;
        for id in snapshot.nodes {
            organism.insert_node(id);
        }

        let mut keys: HashMap<GeneId, GeneKey> = HashMap::with_capacity(snapshot.genes.len());
        for gene in snapshot.genes {
            if keys.contains_key(&gene.innovation) {
                return Err(OrganismError::DuplicateGene(gene.innovation).into());
            }
            organism.insert_node(gene.input);
            organism.insert_node(gene.output);
            keys.insert(gene.innovation, organism.genes.insert(gene));
        }

        organism.by_innovation = organism.genes.keys().collect();
        let genes = &organism.genes;
        organism
            .by_innovation
            .sort_by_key(|&key| genes[key].innovation);

        for innovation in &snapshot.evaluation {
            let key = keys
                .remove(innovation)
                .ok_or(SnapshotError::UnknownGene(*innovation))?;
            organism.by_evaluation.push(key);
        }

        if !organism.recurrent && !organism.is_topologically_ordered() {
            return Err(SnapshotError::InvalidOrder);
        }
        Ok(organism)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn gene(innovation: u64, input: u64, output: u64, weight: f64) -> Gene {
        Gene::new(GeneId(innovation), NodeId(input), NodeId(output), weight)
            .with_activation(Activation::Identity)
    }

    /// Inputs 1, 2; output 3.
    fn two_by_one() -> Organism {
        Organism::blank(vec![NodeId(1), NodeId(2)], vec![NodeId(3)], false)
    }

    #[test]
    fn test_blank_organism() {
        let organism = two_by_one();
        assert_eq!(organism.nodes(), &[BIAS_NODE, NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(organism.gene_count(), 0);
        assert_eq!(organism.node_type(BIAS_NODE), Some(NodeType::Bias));
        assert_eq!(organism.node_type(NodeId(2)), Some(NodeType::Input));
        assert_eq!(organism.node_type(NodeId(3)), Some(NodeType::Output));
        assert_eq!(organism.node_type(NodeId(9)), None);
    }

    #[test]
    fn test_add_gene_on_empty_organism() {
        let mut organism = two_by_one();
        organism.add_gene(gene(5, 1, 3, 0.5)).unwrap();

        let by_innovation: Vec<GeneId> = organism.genes().map(|g| g.innovation).collect();
        let by_evaluation: Vec<GeneId> = organism.evaluation_order().map(|g| g.innovation).collect();
        assert_eq!(by_innovation, vec![GeneId(5)]);
        assert_eq!(by_evaluation, by_innovation);
    }

    #[test]
    fn test_innovation_order_is_sorted() {
        let mut organism = two_by_one();
        for innovation in [7, 2, 9, 4] {
            organism
                .add_gene(gene(innovation, 1, 100 + innovation, 1.0))
                .unwrap();
        }
        let innovations: Vec<u64> = organism.genes().map(|g| g.innovation.0).collect();
        assert_eq!(innovations, vec![2, 4, 7, 9]);
        assert!(organism.gene(GeneId(7)).is_some());
        assert!(organism.gene(GeneId(8)).is_none());
    }

    #[test]
    fn test_duplicate_gene_is_rejected() {
        let mut organism = two_by_one();
        organism.add_gene(gene(1, 1, 3, 1.0)).unwrap();
        let err = organism.add_gene(gene(1, 2, 3, 1.0)).unwrap_err();
        assert_eq!(err, OrganismError::DuplicateGene(GeneId(1)));
        assert_eq!(organism.gene_count(), 1);
    }

    #[test]
    fn test_add_gene_materializes_nodes() {
        let mut organism = two_by_one();
        organism.add_gene(gene(1, 1, 10, 1.0)).unwrap();
        assert!(organism.contains_node(NodeId(10)));
        assert_eq!(organism.hidden_nodes(), vec![NodeId(10)]);
    }

    #[test]
    fn test_connect_requires_existing_nodes() {
        let mut organism = two_by_one();
        let err = organism.connect(gene(1, 1, 10, 1.0)).unwrap_err();
        assert_eq!(err, OrganismError::NodeNotFound(NodeId(10)));
        assert_eq!(organism.gene_count(), 0);
        organism.connect(gene(1, 1, 3, 1.0)).unwrap();
    }

    #[test]
    fn test_dependent_gene_is_placed_after_its_producer() {
        let mut organism = two_by_one();
        // Hidden node 10 consumed before it is produced, in insertion terms
        organism.add_gene(gene(1, 10, 3, 1.0)).unwrap();
        organism.add_gene(gene(2, 1, 10, 1.0)).unwrap();
        organism.add_gene(gene(3, 2, 10, 1.0)).unwrap();

        let order: Vec<u64> = organism.evaluation_order().map(|g| g.innovation.0).collect();
        assert_eq!(order.last(), Some(&1));
        assert!(organism.is_topologically_ordered());
    }

    #[test]
    fn test_recurrence_violation() {
        let mut organism = two_by_one();
        organism.add_gene(gene(1, 1, 10, 1.0)).unwrap();
        organism.add_gene(gene(2, 10, 11, 1.0)).unwrap();

        let err = organism.add_gene(gene(3, 11, 10, 1.0)).unwrap_err();
        assert_eq!(
            err,
            OrganismError::RecurrenceViolation {
                input: NodeId(11),
                output: NodeId(10)
            }
        );
        assert_eq!(organism.gene_count(), 2);
        assert!(organism.is_topologically_ordered());

        // Self loops are recurrent too
        assert!(organism.add_gene(gene(4, 10, 10, 1.0)).is_err());
    }

    #[test]
    fn test_recurrent_organism_accepts_cycles() {
        let mut organism = Organism::blank(vec![NodeId(1)], vec![NodeId(3)], true);
        organism.add_gene(gene(1, 1, 10, 1.0)).unwrap();
        organism.add_gene(gene(2, 10, 3, 1.0)).unwrap();
        organism.add_gene(gene(3, 3, 10, 1.0)).unwrap();
        assert_eq!(organism.gene_count(), 3);
        assert!(organism.violates_order(NodeId(3), NodeId(10)));
        assert!(organism.eval(&[1.0]).unwrap()[0].is_finite());
    }

    #[test]
    fn test_eval_forward_pass() {
        let mut organism = two_by_one();
        organism.add_gene(gene(1, 1, 10, 2.0)).unwrap();
        organism.add_gene(gene(2, 2, 10, 3.0)).unwrap();
        organism.add_gene(gene(3, 10, 3, 0.5)).unwrap();
        organism.add_gene(gene(4, 0, 3, 1.0)).unwrap();

        // (2*1 + 3*2) * 0.5 + bias
        assert_eq!(organism.eval(&[1.0, 2.0]).unwrap(), vec![5.0]);
        // eval is pure
        assert_eq!(organism.eval(&[1.0, 2.0]).unwrap(), vec![5.0]);
    }

    #[test]
    fn test_eval_input_arity() {
        let organism = two_by_one();
        let err = organism.eval(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            OrganismError::InvalidInputArity {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_disabled_gene_matches_removed_gene() {
        let genes = [gene(1, 1, 10, 2.0), gene(2, 10, 3, 0.5), gene(3, 2, 3, -1.0)];

        let mut with_disabled = two_by_one();
        for g in genes {
            let g = if g.innovation == GeneId(3) { g.disabled() } else { g };
            with_disabled.add_gene(g).unwrap();
        }

        let mut without = two_by_one();
        for g in &genes[..2] {
            without.add_gene(*g).unwrap();
        }

        for input in [[0.0, 0.0], [1.0, 0.5], [-3.0, 7.0]] {
            assert_eq!(
                with_disabled.eval(&input).unwrap(),
                without.eval(&input).unwrap()
            );
        }
    }

    #[test]
    fn test_full_connection_strategy() {
        let config = NeatConfig::minimal(2, 2);
        let registry = InnovationRegistry::new();
        let inputs = [registry.next_node_id(), registry.next_node_id()];
        let outputs = [registry.next_node_id(), registry.next_node_id()];
        let organism =
            Organism::connected(&config, &inputs, &outputs, &registry, &mut test_rng()).unwrap();

        // 2 inputs * 2 outputs = 4 connections
        assert_eq!(organism.gene_count(), 4);
        assert_eq!(registry.current_innovation(), GeneId(4));
        for gene in organism.genes() {
            assert!(gene.weight.abs() <= config.initial_weight_range);
        }
    }

    #[test]
    fn test_flow_connection_strategy_with_bias() {
        let config = NeatConfig {
            connect_strategy: ConnectStrategy::Flow,
            use_bias: true,
            ..NeatConfig::minimal(3, 2)
        };
        let registry = InnovationRegistry::new();
        let inputs: Vec<NodeId> = (0..3).map(|_| registry.next_node_id()).collect();
        let outputs: Vec<NodeId> = (0..2).map(|_| registry.next_node_id()).collect();
        let organism =
            Organism::connected(&config, &inputs, &outputs, &registry, &mut test_rng()).unwrap();

        // max(3, 2) round-robin edges + 2 bias edges
        let pairs: Vec<(NodeId, NodeId)> = organism.genes().map(Gene::pair).collect();
        assert_eq!(
            pairs,
            vec![
                (inputs[0], outputs[0]),
                (inputs[1], outputs[1]),
                (inputs[2], outputs[0]),
                (BIAS_NODE, outputs[0]),
                (BIAS_NODE, outputs[1]),
            ]
        );
    }

    #[test]
    fn test_no_connection_strategy() {
        let config = NeatConfig {
            connect_strategy: ConnectStrategy::None,
            ..NeatConfig::minimal(2, 1)
        };
        let registry = InnovationRegistry::new();
        let organism = Organism::connected(
            &config,
            &[NodeId(1), NodeId(2)],
            &[NodeId(3)],
            &registry,
            &mut test_rng(),
        )
        .unwrap();
        assert_eq!(organism.gene_count(), 0);
        assert_eq!(organism.eval(&[1.0, 1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_snapshot_roundtrip_is_bit_identical() {
        let mut organism = two_by_one();
        organism.add_gene(gene(4, 10, 3, 0.3)).unwrap();
        organism.add_gene(gene(1, 1, 10, 0.1)).unwrap();
        organism.add_gene(gene(2, 2, 10, 0.7)).unwrap();
        organism.add_gene(gene(3, 1, 3, -0.2).disabled()).unwrap();
        organism.fitness = 0.25;

        let json = serde_json::to_string(&organism).expect("Serialization failed");
        let restored: Organism = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(restored.snapshot(), organism.snapshot());
        assert_eq!(restored.fitness, 0.25);
        let input = [0.123_456_789, -9.87];
        let a = organism.eval(&input).unwrap();
        let b = restored.eval(&input).unwrap();
        assert_eq!(a[0].to_bits(), b[0].to_bits());
    }

    #[test]
    fn test_snapshot_rejects_bad_evaluation_order() {
        let mut organism = two_by_one();
        organism.add_gene(gene(1, 1, 10, 1.0)).unwrap();
        organism.add_gene(gene(2, 10, 3, 1.0)).unwrap();

        let mut snapshot = organism.snapshot();
        snapshot.evaluation.reverse();
        assert_eq!(
            Organism::try_from(snapshot.clone()).unwrap_err(),
            SnapshotError::InvalidOrder
        );

        snapshot.evaluation = vec![GeneId(1), GeneId(9)];
        assert_eq!(
            Organism::try_from(snapshot.clone()).unwrap_err(),
            SnapshotError::UnknownGene(GeneId(9))
        );

        snapshot.evaluation.pop();
        assert!(matches!(
            Organism::try_from(snapshot).unwrap_err(),
            SnapshotError::EvaluationLength { listed: 1, expected: 2 }
        ));
    }

    #[test]
    fn test_from_genes_rebuilds_equivalent_network() {
        let mut organism = two_by_one();
        organism.add_gene(gene(1, 1, 10, 0.5)).unwrap();
        organism.add_gene(gene(2, 10, 3, 2.0)).unwrap();
        organism.add_gene(gene(3, 2, 3, 1.0)).unwrap();

        let rebuilt = Organism::from_genes(
            organism.inputs().to_vec(),
            organism.outputs().to_vec(),
            false,
            organism.genes().copied(),
        )
        .unwrap();
        assert_eq!(rebuilt.eval(&[1.0, 1.0]).unwrap(), organism.eval(&[1.0, 1.0]).unwrap());
    }
}
