//! Benchmarks for neat-engine.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use neat_engine::{
    offspring_distribution, ConnectionKey, EvolutionConfig, Generation, Genome, GenomeConfig,
    Genotype, NetworkConfig, ZeroFitnessPolicy,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn grown_genome(rng: &mut ChaCha8Rng) -> Genome {
    let config = GenomeConfig {
        add_connection_prob: 0.3,
        add_node_prob: 0.1,
        weight_mutation_prob: 0.8,
        ..GenomeConfig::new(4, 2)
    };
    let mut genome = Genome::fully_connected(config, rng);
    for _ in 0..10 {
        genome.mutate(rng, 1.0);
    }
    genome
}

fn bench_mutation(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let genome = grown_genome(&mut rng);

    c.bench_function("genome_mutation", |b| {
        let mut g = genome.clone();
        b.iter(|| {
            g.mutate(&mut rng, 1.0);
            black_box(&g);
        });
    });
}

fn bench_crossover(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let parent1 = grown_genome(&mut rng);
    let parent2 = grown_genome(&mut rng);

    c.bench_function("genome_crossover", |b| {
        b.iter(|| {
            black_box(parent1.crossover(&parent2, &mut rng));
        });
    });
}

fn bench_activation(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut genome = Genome::fully_connected(GenomeConfig::new(2, 1), &mut rng);

    // Chain a few hidden nodes
    let mut key = ConnectionKey::new(1, 3);
    for _ in 0..5 {
        match genome.add_node(key) {
            Some(hidden) => key = ConnectionKey::new(hidden, 3),
            None => break,
        }
    }

    let net = genome
        .network(NetworkConfig::default())
        .expect("split chain is acyclic");

    c.bench_function("network_evaluate", |b| {
        b.iter(|| {
            black_box(net.evaluate(&[0.5, -0.5]).ok());
        });
    });
}

fn bench_distribution(c: &mut Criterion) {
    let fitnesses: Vec<f32> = (1..=40).map(|i| i as f32 * 0.37).collect();

    c.bench_function("offspring_distribution_40_species", |b| {
        b.iter(|| {
            black_box(offspring_distribution(
                black_box(&fitnesses),
                500,
                2,
                ZeroFitnessPolicy::Error,
            ))
        });
    });
}

fn bench_compatibility_distance(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let genome1 = grown_genome(&mut rng);
    let genome2 = grown_genome(&mut rng);

    c.bench_function("compatibility_distance", |b| {
        b.iter(|| {
            black_box(genome1.compatibility_distance(&genome2));
        });
    });
}

fn bench_generation_step(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut generation =
        Generation::new(EvolutionConfig::new(2, 1, 150)).expect("default config is valid");
    generation.evolve(&mut rng).expect("bootstrap step");

    let fitness = |genome: &Genome| 1.0 + genome.num_enabled_connections() as f32;

    c.bench_function("generation_evolve_150", |b| {
        b.iter(|| {
            generation.evaluate(&fitness);
            generation.evolve(&mut rng).expect("positive fitness");
            black_box(generation.population_size());
        });
    });
}

criterion_group!(
    benches,
    bench_mutation,
    bench_crossover,
    bench_activation,
    bench_distribution,
    bench_compatibility_distance,
    bench_generation_step,
);
criterion_main!(benches);
