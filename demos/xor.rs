//! XOR example using NEAT.
//!
//! Evolves a network that solves XOR, the classic benchmark for
//! neuroevolution, and prints the champion's outputs and its DOT graph.
//!
//! Run with: `RUST_LOG=info cargo run --example xor`

use neat_evolve::{graph, FitnessCalculator, NeatConfig, Population, XorFitness, XorTrainer};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("NEAT XOR Example");
    println!("================\n");

    let config = NeatConfig {
        initial_population_size: 150,
        add_connection_prob: 0.3,
        add_node_prob: 0.1,
        ..NeatConfig::xor()
    };
    let generations = 200;
    let seed = 42;

    println!("Initial population: {}", config.initial_population_size);
    println!("Species capacity: {}", config.population_threshold);
    println!("Generations: {generations}");
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut population = Population::new(config, &mut rng)?;
    let mut trainer = XorTrainer::new();
    let mut calculator = XorFitness::new();

    let history = population.run(
        &mut trainer,
        &mut calculator,
        &mut rng,
        generations,
        |stats| {
            if stats.generation % 10 == 1 {
                println!(
                    "Gen {:3}: best={:.4}, species={}, population={}, genes={}",
                    stats.generation,
                    stats.best_fitness,
                    stats.species,
                    stats.population,
                    stats.champion_genes
                );
            }
            stats.best_fitness >= 1.0
        },
    )?;

    let Some(champion) = population.champion() else {
        println!("No champion was selected");
        return Ok(());
    };

    println!();
    println!("Evolution Complete!");
    println!("==================");
    println!("Generations run: {}", history.len());
    println!("Best fitness: {:.4}", champion.fitness);
    println!("Nodes: {}", champion.nodes().len());
    println!("Enabled genes: {}", champion.num_enabled_genes());
    println!("Hidden nodes: {}", champion.hidden_nodes().len());

    println!("\nChampion XOR outputs:");
    calculator.reset();
    for (inputs, expected) in neat_evolve::training::XOR_CASES {
        let output = champion.eval(&inputs)?[0];
        calculator.add_result(&inputs, &[output]);
        let rounded = if output >= 0.5 { 1.0 } else { 0.0 };
        let status = if rounded == expected { "✓" } else { "✗" };
        println!(
            "  {} XOR {} = {:.4} (expected {}) {}",
            inputs[0] as i32, inputs[1] as i32, output, expected as i32, status
        );
    }
    println!("Solved: {}", calculator.solved());

    println!("\nChampion graph:");
    print!("{}", graph::to_dot(champion));
    Ok(())
}
