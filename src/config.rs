//! Run configuration.
//!
//! [`NeatConfig`] is supplied once, when the population is built, and is not
//! changed afterwards. It is serde-serializable so it can be loaded from any
//! format the caller likes.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::ConfigError;

/// How a freshly created organism wires its inputs to its outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectStrategy {
    /// No connections; structure appears only through mutation.
    None,
    /// Every input connected to every output.
    #[default]
    Full,
    /// Round-robin: `max(inputs, outputs)` connections, input `i % n` to
    /// output `i % m`.
    Flow,
}

/// Configuration for genome creation, mutation and speciation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeatConfig {
    /// Number of input nodes (excluding bias).
    pub num_inputs: usize,
    /// Number of output nodes.
    pub num_outputs: usize,
    /// Whether initial organisms connect the bias node to every output.
    pub use_bias: bool,
    /// Initial wiring of the seed organism.
    pub connect_strategy: ConnectStrategy,
    /// Activation used by every gene.
    pub activation: Activation,
    /// Range for initial weights: [-initial_weight_range, initial_weight_range].
    pub initial_weight_range: f64,

    /// Probability that an enabled gene's weight is perturbed.
    pub weight_mutation_prob: f64,
    /// Upper bound on the magnitude of a single weight perturbation.
    pub weight_mutation_power: f64,
    /// Standard deviation of the normally distributed perturbation.
    pub weight_mutation_std_dev: f64,
    /// Probability of splitting a gene with a new node.
    pub add_node_prob: f64,
    /// Probability of adding a new connection.
    pub add_connection_prob: f64,

    /// Maximum population of a single species.
    pub population_threshold: usize,
    /// Maximum number of species kept alive.
    pub max_species: usize,
    /// Whether recurrent connections are allowed.
    pub recurrent: bool,
    /// When recurrent, the probability that an add-connection mutation may
    /// create a recurrent edge.
    pub recurrent_connection_prob: f64,

    /// Coefficient for excess genes in compatibility distance.
    pub compatibility_excess_coeff: f64,
    /// Coefficient for disjoint genes in compatibility distance.
    pub compatibility_disjoint_coeff: f64,
    /// Coefficient for the average weight difference of matching genes.
    pub compatibility_weight_coeff: f64,
    /// Genomes larger than this are normalized by their gene count.
    pub compatibility_size_threshold: usize,
    /// Base compatibility radius of a species.
    pub compatibility_threshold: f64,
    /// Radius growth per species generation.
    pub compatibility_modifier: f64,

    /// Generations without champion improvement before a species goes extinct.
    pub drop_off_age: u32,
    /// Fraction of a ranked species that is allowed to reproduce, in (0, 1].
    pub survival_threshold: f64,
    /// Number of organisms created at start-up.
    pub initial_population_size: usize,
    /// Fitness is divided by the species size only for species larger than
    /// this. `None` always normalizes.
    pub fitness_normalization_threshold: Option<usize>,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            num_inputs: 2,
            num_outputs: 1,
            use_bias: true,
            connect_strategy: ConnectStrategy::Full,
            activation: Activation::Sigmoid,
            initial_weight_range: 1.0,
            weight_mutation_prob: 0.8,
            weight_mutation_power: 2.5,
            weight_mutation_std_dev: 0.5,
            add_node_prob: 0.03,
            add_connection_prob: 0.05,
            population_threshold: 32,
            max_species: 32,
            recurrent: false,
            recurrent_connection_prob: 0.0,
            compatibility_excess_coeff: 2.0,
            compatibility_disjoint_coeff: 2.0,
            compatibility_weight_coeff: 1.0,
            compatibility_size_threshold: 20,
            compatibility_threshold: 6.0,
            compatibility_modifier: 0.3,
            drop_off_age: 15,
            survival_threshold: 0.2,
            initial_population_size: 10,
            fitness_normalization_threshold: None,
        }
    }
}

impl NeatConfig {
    /// Settings tuned for the XOR benchmark.
    #[must_use]
    pub fn xor() -> Self {
        Self {
            num_inputs: 2,
            num_outputs: 1,
            add_node_prob: 0.1,
            add_connection_prob: 0.1,
            weight_mutation_prob: 0.8,
            ..Default::default()
        }
    }

    /// A small config for testing: no bias, identity activation, low
    /// structural mutation rates.
    #[must_use]
    pub fn minimal(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            use_bias: false,
            activation: Activation::Identity,
            population_threshold: 8,
            max_species: 8,
            initial_population_size: 8,
            ..Default::default()
        }
    }

    /// Check every field that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_inputs == 0 {
            return Err(ConfigError::NoInputs);
        }
        if self.num_outputs == 0 {
            return Err(ConfigError::NoOutputs);
        }

        for (field, value) in [
            ("weight_mutation_prob", self.weight_mutation_prob),
            ("add_node_prob", self.add_node_prob),
            ("add_connection_prob", self.add_connection_prob),
            ("recurrent_connection_prob", self.recurrent_connection_prob),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { field, value });
            }
        }

        for (field, value) in [
            ("initial_weight_range", self.initial_weight_range),
            ("weight_mutation_power", self.weight_mutation_power),
            ("weight_mutation_std_dev", self.weight_mutation_std_dev),
            ("compatibility_excess_coeff", self.compatibility_excess_coeff),
            ("compatibility_disjoint_coeff", self.compatibility_disjoint_coeff),
            ("compatibility_weight_coeff", self.compatibility_weight_coeff),
            ("compatibility_threshold", self.compatibility_threshold),
            ("compatibility_modifier", self.compatibility_modifier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { field, value });
            }
        }

        if self.population_threshold == 0 {
            return Err(ConfigError::InvalidPopulation("population_threshold"));
        }
        if self.max_species == 0 {
            return Err(ConfigError::InvalidPopulation("max_species"));
        }
        if self.initial_population_size == 0 {
            return Err(ConfigError::InvalidPopulation("initial_population_size"));
        }
        if !(self.survival_threshold > 0.0 && self.survival_threshold <= 1.0) {
            return Err(ConfigError::InvalidSurvivalThreshold(
                self.survival_threshold,
            ));
        }

        Ok(())
    }
}
