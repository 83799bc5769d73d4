//! Error types.
//!
//! [`ConfigError`] is raised once, before any generation runs. [`OrganismError`]
//! covers genome contract violations; mutation and crossover treat the
//! recoverable ones ([`OrganismError::is_recoverable`]) as "skip this candidate".

use thiserror::Error;

use crate::gene::{GeneId, NodeId};

/// Invalid configuration, detected at population construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("number of inputs must be greater than 0")]
    NoInputs,

    #[error("number of outputs must be greater than 0")]
    NoOutputs,

    #[error("unknown activation function `{0}`")]
    UnknownActivation(String),

    #[error("`{field}` must be a probability in [0, 1], got {value}")]
    InvalidProbability { field: &'static str, value: f64 },

    #[error("`{0}` must be greater than 0")]
    InvalidPopulation(&'static str),

    #[error("survival threshold must be in (0, 1], got {0}")]
    InvalidSurvivalThreshold(f64),

    #[error("`{field}` must be finite and non-negative, got {value}")]
    InvalidParameter { field: &'static str, value: f64 },
}

/// A genome operation broke one of the organism's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrganismError {
    /// Inserting the gene would require a cycle in a non-recurrent evaluation order.
    #[error("connection {input} -> {output} would introduce recurrence")]
    RecurrenceViolation { input: NodeId, output: NodeId },

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("expected {expected} inputs, got {actual}")]
    InvalidInputArity { expected: usize, actual: usize },

    #[error("gene {0} is already present")]
    DuplicateGene(GeneId),
}

impl OrganismError {
    /// Whether the error is a normal outcome of genetic search rather than
    /// corrupted state.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RecurrenceViolation { .. } | Self::DuplicateGene(_)
        )
    }
}

/// A serialized organism could not be restored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("evaluation order lists {listed} genes but the genome has {expected}")]
    EvaluationLength { listed: usize, expected: usize },

    #[error("evaluation order references unknown gene {0}")]
    UnknownGene(GeneId),

    #[error("evaluation order is not a valid topological order")]
    InvalidOrder,

    #[error(transparent)]
    Organism(#[from] OrganismError),
}

/// Errors surfaced by the population controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("organism contract failure: {0}")]
    Organism(#[from] OrganismError),
}
