//! Training collaborators.
//!
//! A [`Trainer`] yields the input vectors of one evaluation episode and a
//! [`FitnessCalculator`] turns the resulting `(input, output)` pairs into a
//! scalar fitness. Both are supplied by the caller; [`XorTrainer`] and
//! [`XorFitness`] implement the classic XOR benchmark.

use crate::error::OrganismError;
use crate::organism::Organism;

/// A finite, restartable sequence of input vectors.
pub trait Trainer {
    /// The next input vector, or `None` once the episode is exhausted.
    fn next(&mut self) -> Option<Vec<f64>>;

    /// Restart the sequence from the beginning.
    fn reset(&mut self);
}

/// Accumulates results of one episode into a fitness value.
pub trait FitnessCalculator {
    /// Record the organism's `output` for `input`.
    fn add_result(&mut self, input: &[f64], output: &[f64]);

    /// Fitness of the results recorded since the last reset. Higher is better.
    fn calculate_fitness(&self) -> f64;

    /// Forget all recorded results.
    fn reset(&mut self);
}

/// Run one full episode of `trainer` through `organism`.
///
/// Both collaborators are reset first. A NaN fitness is reported as negative
/// infinity so it ranks last.
///
/// # Errors
///
/// [`OrganismError::InvalidInputArity`] if the trainer's vectors do not match
/// the organism's inputs.
pub fn evaluate_fitness<T, F>(
    organism: &Organism,
    trainer: &mut T,
    calculator: &mut F,
) -> Result<f64, OrganismError>
where
    T: Trainer + ?Sized,
    F: FitnessCalculator + ?Sized,
{
    trainer.reset();
    calculator.reset();

    while let Some(input) = trainer.next() {
        let output = organism.eval(&input)?;
        calculator.add_result(&input, &output);
    }

    let fitness = calculator.calculate_fitness();
    Ok(if fitness.is_nan() {
        f64::NEG_INFINITY
    } else {
        fitness
    })
}

/// The XOR truth table.
pub const XOR_CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Yields the four XOR input vectors.
#[derive(Debug, Clone, Default)]
pub struct XorTrainer {
    position: usize,
}

impl XorTrainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Trainer for XorTrainer {
    fn next(&mut self) -> Option<Vec<f64>> {
        let (input, _) = XOR_CASES.get(self.position)?;
        self.position += 1;
        Some(input.to_vec())
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}

/// Squared-error fitness for XOR.
///
/// Reports `1.0` when every output, thresholded at 0.5, matches the truth
/// table, and `1.0 - Σ error²` otherwise.
#[derive(Debug, Clone, Default)]
pub struct XorFitness {
    squared_error: f64,
    seen: usize,
    correct: usize,
}

impl XorFitness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every recorded case was classified correctly.
    #[must_use]
    pub fn solved(&self) -> bool {
        self.seen == XOR_CASES.len() && self.correct == self.seen
    }
}

impl FitnessCalculator for XorFitness {
    fn add_result(&mut self, input: &[f64], output: &[f64]) {
        self.seen += 1;

        let (&[a, b], &[actual]) = (input, output) else {
            // Malformed pair: count it as a maximal miss
            self.squared_error += 1.0;
            return;
        };

        let expected = if (a > 0.5) != (b > 0.5) { 1.0 } else { 0.0 };
        let error = expected - actual;
        self.squared_error += error * error;

        let predicted = if actual >= 0.5 { 1.0 } else { 0.0 };
        if predicted == expected {
            self.correct += 1;
        }
    }

    fn calculate_fitness(&self) -> f64 {
        if self.solved() {
            1.0
        } else {
            1.0 - self.squared_error
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
