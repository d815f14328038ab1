//! XOR example using the speciated generational loop.
//!
//! This example demonstrates evolving a neural network to solve the XOR problem,
//! a classic benchmark for neuroevolution algorithms.
//!
//! Run with: `cargo run --example xor`
//! Set `RUST_LOG=neat_engine=debug` to watch each generation.

use neat_engine::{EvolutionConfig, Generation, Genome, GenomeConfig, NetworkConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const TEST_CASES: [([f32; 2], f32); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Maximum fitness is 4.0 (perfect solution).
fn xor_fitness(genome: &Genome, network: NetworkConfig) -> f32 {
    let Ok(net) = genome.network(network) else {
        return 0.0;
    };

    let mut total_error = 0.0;
    for (inputs, expected) in &TEST_CASES {
        let Ok(output) = net.evaluate(inputs) else {
            return 0.0;
        };
        total_error += (output[0] - expected).powi(2);
    }

    // Max possible error is 4.0 (all wrong), so fitness = 4.0 - error
    (4.0 - total_error).max(0.0)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("NEAT XOR Example");
    println!("================\n");

    let config = EvolutionConfig {
        genome: GenomeConfig {
            add_connection_prob: 0.3,
            add_node_prob: 0.1,
            weight_mutation_prob: 0.8,
            weight_mutation_power: 0.5,
            ..GenomeConfig::new(2, 1)
        },
        population_size: 150,
        elitism: 1,
        ..EvolutionConfig::default()
    };
    let network = config.network;
    let generations = 100;

    println!("Population: {}", config.population_size);
    println!("Generations: {generations}");
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut generation = match Generation::new(config) {
        Ok(generation) => generation,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };

    let fitness = move |genome: &Genome| xor_fitness(genome, network);
    let mut solution_generation = None;

    for gen in 0..generations {
        if let Err(err) = generation.evolve(&mut rng) {
            eprintln!("evolution stopped: {err}");
            break;
        }
        generation.evaluate(&fitness);

        let Some(best) = generation.champion() else {
            break;
        };

        // fitness >= 3.9 is close enough
        if best.fitness >= 3.9 && solution_generation.is_none() {
            solution_generation = Some(gen);
        }

        if gen % 10 == 0 || gen == generations - 1 {
            let avg_fitness = generation.genomes().map(&fitness).sum::<f32>()
                / generation.population_size() as f32;
            println!(
                "Gen {:3}: best={:.4}, avg={:.4}, species={}, hidden={}, connections={}",
                gen,
                best.fitness,
                avg_fitness,
                generation.species().len(),
                best.genome.nodes.hidden.len(),
                best.genome.num_enabled_connections()
            );
        }
    }

    println!();

    let Some(champion) = generation.champion() else {
        return;
    };

    println!("Evolution Complete!");
    println!("==================");
    println!("Best fitness: {:.4}", champion.fitness);
    println!("Nodes: {}", champion.genome.nodes.len());
    println!("Connections: {}", champion.genome.num_enabled_connections());
    println!("Hidden nodes: {}", champion.genome.nodes.hidden.len());

    if let Some(gen) = solution_generation {
        println!("Solution found at generation: {gen}");
    }

    // Test the champion
    println!("\nChampion XOR outputs:");
    let Ok(net) = champion.genome.network(network) else {
        return;
    };

    for (inputs, expected) in &TEST_CASES {
        let Ok(output) = net.evaluate(inputs) else {
            continue;
        };
        let output = output[0];
        let rounded = if output > 0.5 { 1.0 } else { 0.0 };
        let status = if (rounded - expected).abs() < 0.1 {
            "✓"
        } else {
            "✗"
        };
        println!(
            "  {} XOR {} = {:.4} (expected {}) {}",
            inputs[0] as i32, inputs[1] as i32, output, *expected as i32, status
        );
    }
}
