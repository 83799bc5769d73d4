//! # neat-evolve
//!
//! A NeuroEvolution of Augmenting Topologies (NEAT) engine that evolves both
//! the weights and the topology of small feed-forward (optionally recurrent)
//! networks.
//!
//! ## Features
//!
//! - **Explicit Innovation Registry**: innovation numbers, node ids and species
//!   ids come from an [`InnovationRegistry`] owned by the run, with a
//!   per-generation [`GenerationCache`] so identical structural mutations share
//!   innovation numbers
//! - **Incremental Evaluation Order**: every gene insertion keeps a valid
//!   execution order, so evaluation is a single forward pass with no
//!   topological sort
//! - **Arena Storage**: genes live in a `SlotMap` referenced from an
//!   innovation-ordered list and an evaluation-ordered list
//! - **Speciation**: compatibility distance, growing species radius, fitness
//!   sharing, stagnation-based extinction and structural crossover
//!
//! ## Quick Start
//!
//! ```rust
//! use neat_evolve::{NeatConfig, Population, XorFitness, XorTrainer};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut population = Population::new(NeatConfig::xor(), &mut rng).unwrap();
//!
//! let history = population
//!     .run(
//!         &mut XorTrainer::new(),
//!         &mut XorFitness::new(),
//!         &mut rng,
//!         5,
//!         |stats| stats.best_fitness >= 1.0,
//!     )
//!     .unwrap();
//!
//! let champion = population.champion().unwrap();
//! println!("{} generations, fitness {}", history.len(), champion.fitness);
//! let output = champion.eval(&[1.0, 0.0]).unwrap();
//! assert_eq!(output.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! ### Evaluation order
//!
//! A gene `a -> b` is placed right after the last gene writing to `a`, or right
//! before the first gene reading `b`. If the last writer of `a` comes at or
//! after the first reader of `b`, no placement exists without a cycle and a
//! non-recurrent organism rejects the gene with
//! [`OrganismError::RecurrenceViolation`]. Mutation and crossover treat that
//! as "try something else".
//!
//! ### Generation cycle
//!
//! Each [`Species`] evaluates, ranks and culls its members, keeps its champion
//! unmutated, mutates the rest and refills itself by crossover. Organisms that
//! drift out of their species' radius are re-speciated by the [`Population`].

pub mod activation;
pub mod config;
pub mod error;
pub mod gene;
pub mod graph;
pub mod innovation;
pub mod mutation;
pub mod organism;
pub mod population;
pub mod species;
pub mod training;

// Re-exports for convenience
pub use activation::Activation;
pub use config::{ConnectStrategy, NeatConfig};
pub use error::{ConfigError, EvolutionError, OrganismError, SnapshotError};
pub use gene::{Gene, GeneId, NodeId, NodeType, BIAS_NODE};
pub use innovation::{GenerationCache, InnovationRegistry, SplitRecord};
pub use mutation::MutationReport;
pub use organism::{GeneKey, GenomeSnapshot, Organism};
pub use population::{GenerationStats, Population};
pub use species::{align, distance, recombinate, GeneAlignment, Species};
pub use training::{evaluate_fitness, FitnessCalculator, Trainer, XorFitness, XorTrainer};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_mutate_and_recombinate() {
        let config = NeatConfig {
            add_node_prob: 1.0,
            add_connection_prob: 1.0,
            ..NeatConfig::minimal(2, 1)
        };
        let registry = InnovationRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let inputs = [registry.next_node_id(), registry.next_node_id()];
        let outputs = [registry.next_node_id()];

        let mut a = Organism::connected(&config, &inputs, &outputs, &registry, &mut rng).unwrap();
        let mut b = a.clone();
        a.mutate(&config, &registry, &mut GenerationCache::new(), &mut rng)
            .unwrap();
        b.mutate(&config, &registry, &mut GenerationCache::new(), &mut rng)
            .unwrap();

        let child = recombinate(&a, &b).unwrap();
        assert_eq!(child.inputs(), &inputs);
        assert_eq!(child.outputs(), &outputs);
        assert!(child.is_topologically_ordered());
        assert!(child.gene_count() >= a.gene_count().min(b.gene_count()));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = NeatConfig {
            add_node_prob: 1.0,
            ..NeatConfig::minimal(3, 2)
        };
        let registry = InnovationRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let inputs: Vec<NodeId> = (0..3).map(|_| registry.next_node_id()).collect();
        let outputs: Vec<NodeId> = (0..2).map(|_| registry.next_node_id()).collect();
        let mut organism =
            Organism::connected(&config, &inputs, &outputs, &registry, &mut rng).unwrap();
        organism
            .mutate(&config, &registry, &mut GenerationCache::new(), &mut rng)
            .unwrap();

        let json = serde_json::to_string(&organism).expect("Serialization failed");
        let restored: Organism = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(organism.nodes(), restored.nodes());
        assert_eq!(organism.snapshot(), restored.snapshot());
        let input = [0.3, -0.7, 1.1];
        assert_eq!(
            organism.eval(&input).unwrap(),
            restored.eval(&input).unwrap()
        );
    }

    #[test]
    fn test_same_mutation_shares_innovation() {
        let config = NeatConfig {
            add_node_prob: 1.0,
            ..NeatConfig::minimal(1, 1)
        };
        let registry = InnovationRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let inputs = [registry.next_node_id()];
        let outputs = [registry.next_node_id()];
        let seed = Organism::connected(&config, &inputs, &outputs, &registry, &mut rng).unwrap();

        let mut cache = GenerationCache::new();
        let (mut a, mut b) = (seed.clone(), seed);
        a.mutate_add_node(&config, &registry, &mut cache, &mut rng).unwrap();
        b.mutate_add_node(&config, &registry, &mut cache, &mut rng).unwrap();

        let ids = |o: &Organism| o.genes().map(|g| g.innovation).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(distance(&a, &b, &config), 0.0);
    }
}
