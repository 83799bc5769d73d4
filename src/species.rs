//! Speciation, selection and crossover.
//!
//! Organisms are grouped by [`distance`], a weighted count of the genes two
//! genomes do not share plus the average weight difference of those they do.
//! A [`Species`] owns its organisms and runs the per-generation cycle:
//! evaluate, select, mutate, reproduce.

use std::cmp::Ordering;

use rand::Rng;
use tracing::{debug, trace};

use crate::config::NeatConfig;
use crate::error::OrganismError;
use crate::gene::Gene;
use crate::innovation::{GenerationCache, InnovationRegistry};
use crate::organism::Organism;
use crate::training::{evaluate_fitness, FitnessCalculator, Trainer};

/// Outcome of aligning two genomes by innovation number.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeneAlignment {
    /// Innovations present in both genomes.
    pub common: usize,
    /// Unmatched innovations within the range of the other genome.
    pub disjoint: usize,
    /// Unmatched innovations beyond the end of the other genome.
    pub excess: usize,
    /// Sum of `|weight_a - weight_b|` over common genes.
    pub weight_difference: f64,
}

/// Align the innovation-ordered gene lists of `a` and `b`.
#[must_use]
pub fn align(a: &Organism, b: &Organism) -> GeneAlignment {
    let a_genes: Vec<&Gene> = a.genes().collect();
    let b_genes: Vec<&Gene> = b.genes().collect();
    let mut alignment = GeneAlignment::default();

    let (mut i, mut j) = (0, 0);
    while let (Some(x), Some(y)) = (a_genes.get(i), b_genes.get(j)) {
        match x.innovation.cmp(&y.innovation) {
            Ordering::Equal => {
                alignment.common += 1;
                alignment.weight_difference += (x.weight - y.weight).abs();
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                alignment.disjoint += 1;
                i += 1;
            }
            Ordering::Greater => {
                alignment.disjoint += 1;
                j += 1;
            }
        }
    }

    alignment.excess = (a_genes.len() - i) + (b_genes.len() - j);
    alignment
}

/// Compatibility distance between two genomes.
///
/// `(c1 * excess + c2 * disjoint) / n + c3 * mean_weight_difference`, where `n`
/// is 1 unless the larger genome has more than
/// `config.compatibility_size_threshold` genes.
#[must_use]
pub fn distance(a: &Organism, b: &Organism, config: &NeatConfig) -> f64 {
    let alignment = align(a, b);

    let larger = a.gene_count().max(b.gene_count());
    let n = if larger > config.compatibility_size_threshold {
        larger as f64
    } else {
        1.0
    };
    let mean_weight_difference = if alignment.common > 0 {
        alignment.weight_difference / alignment.common as f64
    } else {
        0.0
    };

    (config.compatibility_excess_coeff * alignment.excess as f64
        + config.compatibility_disjoint_coeff * alignment.disjoint as f64)
        / n
        + config.compatibility_weight_coeff * mean_weight_difference
}

/// Cross two parents into a new organism.
///
/// The fitter parent is primary (`a` on ties) and supplies every matching
/// gene; unmatched genes come from whichever parent carries them. Genes that
/// would break the child's evaluation order or duplicate a connection already
/// in the child are left out. The result depends only on the parents.
///
/// # Errors
///
/// Only contract failures from [`Organism::add_gene`] are returned.
pub fn recombinate(a: &Organism, b: &Organism) -> Result<Organism, OrganismError> {
    let (primary, secondary) = if b.fitness > a.fitness { (b, a) } else { (a, b) };

    let mut child = Organism::blank(
        primary.inputs().to_vec(),
        primary.outputs().to_vec(),
        primary.is_recurrent(),
    );

    let primary_genes: Vec<&Gene> = primary.genes().collect();
    let secondary_genes: Vec<&Gene> = secondary.genes().collect();

    let (mut i, mut j) = (0, 0);
    loop {
        let gene = match (primary_genes.get(i), secondary_genes.get(j)) {
            (Some(&p), Some(&s)) => match p.innovation.cmp(&s.innovation) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                    p
                }
                Ordering::Less => {
                    i += 1;
                    p
                }
                Ordering::Greater => {
                    j += 1;
                    s
                }
            },
            (Some(&p), None) => {
                i += 1;
                p
            }
            (None, Some(&s)) => {
                j += 1;
                s
            }
            (None, None) => break,
        };
        inherit(&mut child, *gene)?;
    }

    Ok(child)
}

fn inherit(child: &mut Organism, gene: Gene) -> Result<(), OrganismError> {
    if child.is_connected(gene.input, gene.output) {
        trace!(innovation = %gene.innovation, "crossover skipped already connected pair");
        return Ok(());
    }
    match child.add_gene(gene) {
        Err(err) if err.is_recoverable() => {
            debug!(%err, "crossover skipped gene");
            Ok(())
        }
        other => other,
    }
}

/// A cluster of mutually compatible organisms.
#[derive(Debug, Clone)]
pub struct Species {
    id: u64,
    representative: Organism,
    champion: Option<Organism>,
    population: Vec<Organism>,
    generation: u32,
    best_fitness: f64,
    stagnant_generations: u32,
}

impl Species {
    /// Start a species with `founder` as its only member and representative.
    #[must_use]
    pub fn new(id: u64, founder: Organism) -> Self {
        Self {
            id,
            representative: founder.clone(),
            champion: None,
            population: vec![founder],
            generation: 1,
            best_fitness: f64::NEG_INFINITY,
            stagnant_generations: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn representative(&self) -> &Organism {
        &self.representative
    }

    /// The best organism of the last selection, with its raw fitness.
    #[must_use]
    pub fn champion(&self) -> Option<&Organism> {
        self.champion.as_ref()
    }

    #[must_use]
    pub fn population(&self) -> &[Organism] {
        &self.population
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.population.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    /// Starts at 1 and advances with every selection.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Best raw champion fitness seen so far.
    #[must_use]
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Selections since the champion last improved on `best_fitness`.
    #[must_use]
    pub fn stagnant_generations(&self) -> u32 {
        self.stagnant_generations
    }

    #[must_use]
    pub fn is_stagnant(&self, config: &NeatConfig) -> bool {
        self.stagnant_generations >= config.drop_off_age
    }

    /// Compatibility radius, widened by `compatibility_modifier` per
    /// generation.
    #[must_use]
    pub fn radius(&self, config: &NeatConfig) -> f64 {
        config.compatibility_threshold
            + config.compatibility_modifier * f64::from(self.generation.saturating_sub(1))
    }

    /// Whether `organism` is within this species' radius of the representative.
    #[must_use]
    pub fn belongs(&self, organism: &Organism, config: &NeatConfig) -> bool {
        distance(&self.representative, organism, config) < self.radius(config)
    }

    pub fn add(&mut self, organism: Organism) {
        self.population.push(organism);
    }

    /// Assign every member its fitness for one trainer episode.
    ///
    /// # Errors
    ///
    /// Propagates evaluation failures, which indicate a malformed trainer.
    pub fn evaluate<T, F>(
        &mut self,
        trainer: &mut T,
        calculator: &mut F,
    ) -> Result<(), OrganismError>
    where
        T: Trainer + ?Sized,
        F: FitnessCalculator + ?Sized,
    {
        for organism in &mut self.population {
            organism.fitness = evaluate_fitness(organism, trainer, calculator)?;
        }
        Ok(())
    }

    /// Rank by fitness, cull to `population_threshold`, record the champion,
    /// share fitness and pick a new representative.
    pub fn select<R: Rng>(&mut self, config: &NeatConfig, rng: &mut R) {
        if self.population.is_empty() {
            return;
        }

        // Stable, so equal fitness keeps insertion order
        self.population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        self.population.truncate(config.population_threshold);

        let champion = self.population[0].clone();
        if champion.fitness > self.best_fitness {
            self.best_fitness = champion.fitness;
            self.stagnant_generations = 0;
        } else {
            self.stagnant_generations += 1;
        }
        trace!(
            species = self.id,
            fitness = champion.fitness,
            stagnant = self.stagnant_generations,
            "selected champion"
        );
        self.champion = Some(champion);

        let size = self.population.len();
        let normalize = config
            .fitness_normalization_threshold
            .map_or(true, |threshold| size > threshold);
        if normalize {
            for organism in &mut self.population {
                organism.fitness /= size as f64;
            }
        }

        self.representative = self.population[rng.random_range(0..size)].clone();
        self.generation += 1;
    }

    /// Mutate every member except the leading champion and return those that
    /// no longer belong.
    ///
    /// # Errors
    ///
    /// Propagates contract failures from [`Organism::mutate`].
    pub fn mutate<R: Rng>(
        &mut self,
        config: &NeatConfig,
        registry: &InnovationRegistry,
        cache: &mut GenerationCache,
        rng: &mut R,
    ) -> Result<Vec<Organism>, OrganismError> {
        for organism in self.population.iter_mut().skip(1) {
            organism.mutate(config, registry, cache, rng)?;
        }

        let mut rejected = Vec::new();
        for (i, organism) in std::mem::take(&mut self.population).into_iter().enumerate() {
            if i == 0 || self.belongs(&organism, config) {
                self.population.push(organism);
            } else {
                rejected.push(organism);
            }
        }

        if !rejected.is_empty() {
            trace!(species = self.id, rejected = rejected.len(), "organisms left species");
        }
        Ok(rejected)
    }

    /// Refill to `population_threshold` with children of the top
    /// `survival_threshold` fraction. Returns the number of children.
    ///
    /// # Errors
    ///
    /// Propagates contract failures from [`recombinate`].
    pub fn reproduce<R: Rng>(
        &mut self,
        config: &NeatConfig,
        rng: &mut R,
    ) -> Result<usize, OrganismError> {
        let size = self.population.len();
        if size == 0 || size >= config.population_threshold {
            return Ok(0);
        }

        let parents = ((size as f64 * config.survival_threshold).ceil() as usize).clamp(1, size);
        let children = config.population_threshold - size;
        for _ in 0..children {
            let a = &self.population[rng.random_range(0..parents)];
            let b = &self.population[rng.random_range(0..parents)];
            let child = recombinate(a, b)?;
            self.population.push(child);
        }
        Ok(children)
    }
}
