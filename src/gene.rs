//! Gene and node identifiers.
//!
//! - [`NodeId`]: a network node, unique across the whole run
//! - [`GeneId`]: the innovation number of a structural change
//! - [`Gene`]: a weighted connection between two nodes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::activation::Activation;

/// Unique identifier of a network node.
///
/// `NodeId(0)` is reserved for the bias node, which always evaluates to 1.0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// The constant bias source present in every organism.
pub const BIAS_NODE: NodeId = NodeId(0);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Innovation number of a gene.
///
/// Two genes with the same `GeneId` in different genomes descend from the same
/// structural mutation and are aligned during distance and crossover.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GeneId(pub u64);

impl fmt::Display for GeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The role of a node within an organism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Receives external values.
    Input,
    /// Produces network output.
    Output,
    /// Internal node added through mutation.
    Hidden,
    /// Always outputs 1.0.
    Bias,
}

/// A weighted connection between two nodes.
///
/// Genes are plain values: inheriting a gene copies it, and only the copy's
/// `weight` and `enabled` fields are ever changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// Innovation number, allocated once per structural innovation.
    pub innovation: GeneId,
    /// The source node.
    pub input: NodeId,
    /// The target node.
    pub output: NodeId,
    /// The connection weight.
    pub weight: f64,
    /// Disabled genes are skipped during evaluation but kept for alignment.
    pub enabled: bool,
    /// Applied to the source node's value before weighting.
    pub activation: Activation,
}

impl Gene {
    /// Create a new enabled gene with the default activation.
    #[must_use]
    pub fn new(innovation: GeneId, input: NodeId, output: NodeId, weight: f64) -> Self {
        Self {
            innovation,
            input,
            output,
            weight,
            enabled: true,
            activation: Activation::default(),
        }
    }

    #[must_use]
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The `(input, output)` pair identifying this gene's structure.
    #[inline]
    #[must_use]
    pub fn pair(&self) -> (NodeId, NodeId) {
        (self.input, self.output)
    }
}
