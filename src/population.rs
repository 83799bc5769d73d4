//! Generation loop.
//!
//! [`Population`] owns the configuration, the [`InnovationRegistry`] and every
//! [`Species`]. Each call to [`Population::step`] runs one generation:
//!
//! 1. evaluate and select every species
//! 2. rank species by champion fitness, cap their number and drop stagnant ones
//! 3. mutate every species with one shared [`GenerationCache`]
//! 4. refill each species by crossover
//! 5. place organisms rejected during mutation into a matching or new species

use rand::Rng;
use tracing::{debug, info};

use crate::config::NeatConfig;
use crate::error::EvolutionError;
use crate::gene::NodeId;
use crate::innovation::{GenerationCache, InnovationRegistry};
use crate::organism::Organism;
use crate::species::Species;
use crate::training::{FitnessCalculator, Trainer};

/// Summary of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    /// 1 for the first call to [`Population::step`].
    pub generation: usize,
    /// Species alive after re-speciation.
    pub species: usize,
    /// Organisms alive after reproduction.
    pub population: usize,
    /// Raw fitness of this generation's best champion.
    pub best_fitness: f64,
    pub champion_genes: usize,
    pub champion_nodes: usize,
    /// Organisms that left their species after mutation.
    pub rejected: usize,
    /// Species dropped for stagnation or for exceeding `max_species`.
    pub extinct: usize,
}

/// A full NEAT run.
#[derive(Debug)]
pub struct Population {
    config: NeatConfig,
    registry: InnovationRegistry,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    species: Vec<Species>,
    generation: usize,
    champion: Option<Organism>,
}

impl Population {
    /// Build the initial population.
    ///
    /// A seed organism is wired according to `config.connect_strategy`; the
    /// population starts as `initial_population_size` copies of it with
    /// randomized weights and one round of mutation, each placed into the
    /// first species it belongs to.
    ///
    /// # Errors
    ///
    /// [`EvolutionError::Config`] if `config` is invalid.
    pub fn new<R: Rng>(config: NeatConfig, rng: &mut R) -> Result<Self, EvolutionError> {
        config.validate()?;

        let registry = InnovationRegistry::new();
        let inputs: Vec<NodeId> = (0..config.num_inputs)
            .map(|_| registry.next_node_id())
            .collect();
        let outputs: Vec<NodeId> = (0..config.num_outputs)
            .map(|_| registry.next_node_id())
            .collect();
        let seed = Organism::connected(&config, &inputs, &outputs, &registry, rng)?;

        let mut population = Self {
            config,
            registry,
            inputs,
            outputs,
            species: Vec::new(),
            generation: 0,
            champion: None,
        };

        let mut cache = GenerationCache::new();
        for _ in 0..population.config.initial_population_size {
            let mut organism = seed.clone();
            organism.randomize_weights(population.config.initial_weight_range, rng);
            organism.mutate(&population.config, &population.registry, &mut cache, rng)?;
            population.speciate(organism);
        }

        debug!(
            organisms = population.len(),
            species = population.species.len(),
            "population initialized"
        );
        Ok(population)
    }

    #[must_use]
    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }

    /// Input node ids shared by every organism.
    #[must_use]
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Output node ids shared by every organism.
    #[must_use]
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    #[must_use]
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Number of completed generations.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Fittest organism seen in any generation, with its raw fitness.
    #[must_use]
    pub fn champion(&self) -> Option<&Organism> {
        self.champion.as_ref()
    }

    /// Total number of organisms across all species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.species.iter().map(Species::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.iter().all(Species::is_empty)
    }

    /// Iterate over every organism.
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> + '_ {
        self.species.iter().flat_map(|s| s.population().iter())
    }

    /// Run one generation.
    ///
    /// # Errors
    ///
    /// [`EvolutionError::Organism`] on a contract failure, typically a trainer
    /// whose vectors do not match `num_inputs`.
    pub fn step<T, F, R>(
        &mut self,
        trainer: &mut T,
        calculator: &mut F,
        rng: &mut R,
    ) -> Result<GenerationStats, EvolutionError>
    where
        T: Trainer + ?Sized,
        F: FitnessCalculator + ?Sized,
        R: Rng,
    {
        for species in &mut self.species {
            species.evaluate(trainer, calculator)?;
        }

        self.generation += 1;
        for species in &mut self.species {
            species.select(&self.config, rng);
        }

        self.species.retain(|s| !s.is_empty());
        self.species
            .sort_by(|a, b| champion_fitness(b).total_cmp(&champion_fitness(a)));

        let before = self.species.len();
        self.species.truncate(self.config.max_species);
        let config = &self.config;
        let mut rank = 0;
        self.species.retain(|s| {
            // The top species survives stagnation
            let keep = rank == 0 || !s.is_stagnant(config);
            if !keep {
                debug!(species = s.id(), stagnant = s.stagnant_generations(), "species extinct");
            }
            rank += 1;
            keep
        });
        let extinct = before - self.species.len();

        let best = self.species.first().and_then(Species::champion).cloned();
        if let Some(best) = &best {
            if self
                .champion
                .as_ref()
                .map_or(true, |champion| best.fitness > champion.fitness)
            {
                self.champion = Some(best.clone());
            }
        }

        let mut cache = GenerationCache::new();
        let mut rejected = Vec::new();
        for species in &mut self.species {
            rejected.extend(species.mutate(&self.config, &self.registry, &mut cache, rng)?);
        }
        for species in &mut self.species {
            species.reproduce(&self.config, rng)?;
        }

        let rejected_count = rejected.len();
        for organism in rejected {
            self.speciate(organism);
        }

        let stats = GenerationStats {
            generation: self.generation,
            species: self.species.len(),
            population: self.len(),
            best_fitness: best.as_ref().map_or(f64::NEG_INFINITY, |o| o.fitness),
            champion_genes: best.as_ref().map_or(0, Organism::gene_count),
            champion_nodes: best.as_ref().map_or(0, |o| o.nodes().len()),
            rejected: rejected_count,
            extinct,
        };
        info!(
            generation = stats.generation,
            species = stats.species,
            population = stats.population,
            best_fitness = stats.best_fitness,
            champion_genes = stats.champion_genes,
            rejected = stats.rejected,
            extinct = stats.extinct,
            innovations = self.registry.current_innovation().0,
            "generation complete"
        );
        Ok(stats)
    }

    /// Step until `until` accepts a generation's stats or `max_generations`
    /// have run. Returns the stats of every generation run.
    ///
    /// # Errors
    ///
    /// Stops at the first failing [`Population::step`].
    pub fn run<T, F, R, P>(
        &mut self,
        trainer: &mut T,
        calculator: &mut F,
        rng: &mut R,
        max_generations: usize,
        mut until: P,
    ) -> Result<Vec<GenerationStats>, EvolutionError>
    where
        T: Trainer + ?Sized,
        F: FitnessCalculator + ?Sized,
        R: Rng,
        P: FnMut(&GenerationStats) -> bool,
    {
        let mut history = Vec::with_capacity(max_generations);
        for _ in 0..max_generations {
            let stats = self.step(trainer, calculator, rng)?;
            let done = until(&stats);
            history.push(stats);
            if done {
                break;
            }
        }
        Ok(history)
    }

    /// Add `organism` to the first species it belongs to, or found a new one.
    fn speciate(&mut self, organism: Organism) {
        if let Some(species) = self
            .species
            .iter_mut()
            .find(|s| s.belongs(&organism, &self.config))
        {
            species.add(organism);
            return;
        }

        let id = self.registry.next_species_id();
        debug!(species = id, genes = organism.gene_count(), "new species");
        self.species.push(Species::new(id, organism));
    }
}

fn champion_fitness(species: &Species) -> f64 {
    species
        .champion()
        .map_or(f64::NEG_INFINITY, |champion| champion.fitness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, OrganismError};
    use crate::training::{XorFitness, XorTrainer};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    /// Every organism scores the same.
    struct ConstantFitness(f64);

    impl FitnessCalculator for ConstantFitness {
        fn add_result(&mut self, _input: &[f64], _output: &[f64]) {}

        fn calculate_fitness(&self) -> f64 {
            self.0
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = NeatConfig {
            num_inputs: 0,
            ..NeatConfig::xor()
        };
        let err = Population::new(config, &mut test_rng()).unwrap_err();
        assert!(matches!(err, EvolutionError::Config(ConfigError::NoInputs)));
    }

    #[test]
    fn test_new_population() {
        let population = Population::new(NeatConfig::xor(), &mut test_rng()).unwrap();

        assert_eq!(population.inputs(), &[NodeId(1), NodeId(2)]);
        assert_eq!(population.outputs(), &[NodeId(3)]);
        assert_eq!(population.len(), 10);
        assert!(!population.species().is_empty());
        assert_eq!(population.generation(), 0);
        assert!(population.champion().is_none());

        for organism in population.organisms() {
            assert_eq!(organism.inputs(), population.inputs());
            assert!(organism.is_topologically_ordered());
        }
    }

    #[test]
    fn test_every_organism_belongs_to_its_species_after_init() {
        let population = Population::new(NeatConfig::xor(), &mut test_rng()).unwrap();
        let config = population.config();
        for species in population.species() {
            for organism in species.population() {
                assert!(species.belongs(organism, config));
            }
        }
    }

    #[test]
    fn test_step_refills_species() {
        let mut population = Population::new(NeatConfig::xor(), &mut test_rng()).unwrap();
        let mut rng = test_rng();

        let stats = population
            .step(&mut XorTrainer::new(), &mut XorFitness::new(), &mut rng)
            .unwrap();

        assert_eq!(stats.generation, 1);
        assert_eq!(stats.species, population.species().len());
        assert_eq!(stats.population, population.len());
        assert!(population.len() >= population.config().population_threshold);
        assert!(population.champion().is_some());
        assert_eq!(stats.best_fitness, population.champion().unwrap().fitness);
    }

    #[test]
    fn test_champion_fitness_never_decreases() {
        let mut population = Population::new(NeatConfig::xor(), &mut test_rng()).unwrap();
        let mut rng = test_rng();
        let mut trainer = XorTrainer::new();
        let mut calculator = XorFitness::new();

        let mut best = f64::NEG_INFINITY;
        for _ in 0..10 {
            population.step(&mut trainer, &mut calculator, &mut rng).unwrap();
            let fitness = population.champion().unwrap().fitness;
            assert!(fitness >= best);
            best = fitness;
        }
    }

    #[test]
    fn test_run_stops_when_predicate_accepts() {
        let mut population = Population::new(NeatConfig::xor(), &mut test_rng()).unwrap();
        let mut rng = test_rng();

        let history = population
            .run(
                &mut XorTrainer::new(),
                &mut XorFitness::new(),
                &mut rng,
                50,
                |stats| stats.generation == 3,
            )
            .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(population.generation(), 3);

        let history = population
            .run(
                &mut XorTrainer::new(),
                &mut XorFitness::new(),
                &mut rng,
                2,
                |_| false,
            )
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].generation, 5);
    }

    #[test]
    fn test_stagnant_species_go_extinct() {
        // A zero radius gives every initial organism its own species
        let config = NeatConfig {
            compatibility_threshold: 0.0,
            compatibility_modifier: 0.0,
            drop_off_age: 1,
            ..NeatConfig::xor()
        };
        let mut population = Population::new(config, &mut test_rng()).unwrap();
        assert_eq!(population.species().len(), 10);

        let mut rng = test_rng();
        let mut trainer = XorTrainer::new();
        let mut calculator = ConstantFitness(0.5);

        let first = population.step(&mut trainer, &mut calculator, &mut rng).unwrap();
        assert_eq!(first.extinct, 0);

        let second = population.step(&mut trainer, &mut calculator, &mut rng).unwrap();
        assert_eq!(second.extinct, 9);
    }

    #[test]
    fn test_species_count_is_capped() {
        let config = NeatConfig {
            compatibility_threshold: 0.0,
            compatibility_modifier: 0.0,
            max_species: 4,
            ..NeatConfig::xor()
        };
        let mut population = Population::new(config, &mut test_rng()).unwrap();
        assert_eq!(population.species().len(), 10);

        let stats = population
            .step(&mut XorTrainer::new(), &mut ConstantFitness(1.0), &mut test_rng())
            .unwrap();
        assert_eq!(stats.extinct, 6);
    }

    /// Yields a single vector that is one element too long for XOR.
    struct WideTrainer(bool);

    impl Trainer for WideTrainer {
        fn next(&mut self) -> Option<Vec<f64>> {
            (!std::mem::replace(&mut self.0, true)).then(|| vec![0.0; 3])
        }

        fn reset(&mut self) {
            self.0 = false;
        }
    }

    #[test]
    fn test_failed_step_leaves_population_untouched() {
        let mut population = Population::new(NeatConfig::xor(), &mut test_rng()).unwrap();
        let sizes: Vec<usize> = population.species().iter().map(Species::len).collect();

        let err = population
            .step(&mut WideTrainer(false), &mut XorFitness::new(), &mut test_rng())
            .unwrap_err();
        assert!(matches!(
            err,
            EvolutionError::Organism(OrganismError::InvalidInputArity {
                expected: 2,
                actual: 3
            })
        ));

        assert_eq!(population.generation(), 0);
        assert!(population.champion().is_none());
        for (species, size) in population.species().iter().zip(sizes) {
            assert_eq!(species.generation(), 1);
            assert!(species.champion().is_none());
            assert_eq!(species.len(), size);
        }
    }

    #[test]
    fn test_rejected_organisms_found_new_species() {
        // Every split adds two genes, which puts the child well outside a radius of 1
        let config = NeatConfig {
            add_node_prob: 1.0,
            compatibility_threshold: 1.0,
            compatibility_modifier: 0.0,
            max_species: 1000,
            drop_off_age: 100,
            ..NeatConfig::xor()
        };
        let mut population = Population::new(config, &mut test_rng()).unwrap();
        let mut rng = test_rng();
        let mut trainer = XorTrainer::new();
        let mut calculator = XorFitness::new();

        let first = population.step(&mut trainer, &mut calculator, &mut rng).unwrap();
        let known = population.species().iter().map(Species::id).max().unwrap();

        let second = population.step(&mut trainer, &mut calculator, &mut rng).unwrap();
        assert!(second.rejected > 0);
        assert_eq!(second.extinct, 0);
        assert!(second.species > first.species);
        assert_eq!(second.species, population.species().len());
        assert_eq!(second.population, population.len());

        let config = population.config();
        let founded: Vec<&Species> = population
            .species()
            .iter()
            .filter(|s| s.id() > known)
            .collect();
        assert_eq!(founded.len(), second.species - first.species);
        for species in founded {
            assert!(species.belongs(species.representative(), config));
            for organism in species.population() {
                assert!(species.belongs(organism, config));
            }
        }
    }

    #[test]
    fn test_runs_are_reproducible() {
        let run = || {
            let mut population = Population::new(NeatConfig::xor(), &mut test_rng()).unwrap();
            population
                .run(
                    &mut XorTrainer::new(),
                    &mut XorFitness::new(),
                    &mut test_rng(),
                    5,
                    |_| false,
                )
                .unwrap()
        };
        assert_eq!(run(), run());
    }
}
