//! End-to-end optimization of the A + B -> C model with every algorithm.

mod common;

use approx::assert_relative_eq;
use common::*;
use spatialopt_rs::{
    AlgorithmConfig, AlgorithmKind, DiffMode, OptCost, OptCostKind, Optimization,
    OptimizationState, OptimizeOptions,
};

#[test]
fn test_minimize_species_a_increases_k1() {
    for kind in AlgorithmKind::ALL {
        let mut model = abtoc_model();
        let optimization =
            Optimization::new(&model, AbToC::default(), minimize_a_options(kind)).unwrap();
        assert_eq!(optimization.param_names(), vec!["k1".to_string()]);
        assert_eq!(optimization.iterations(), 0);

        for round in 1..=3 {
            assert_eq!(optimization.evolve(1).unwrap(), 1);
            assert_eq!(optimization.iterations(), round, "{}", kind);
        }

        let fitness = optimization.fitness();
        let params = optimization.params();
        assert_eq!(fitness.len(), 3);
        assert_eq!(params.len(), 3);
        assert_non_increasing(&fitness);

        // less A is left the faster it reacts
        for pair in params.windows(2) {
            assert!(pair[1][0] >= pair[0][0], "{}: {:?}", kind, params);
        }
        for p in &params {
            assert!((0.05..=0.21).contains(&p[0]));
        }

        // the model is only touched on request
        assert_eq!(k1(&model), 0.1);
        optimization.apply_parameters_to_model(&mut model).unwrap();
        assert_eq!(k1(&model), params.last().unwrap()[0]);
        assert_eq!(optimization.state(), OptimizationState::Idle);
    }
}

#[test]
fn test_minimize_species_c_decreases_k1() {
    for kind in AlgorithmKind::ALL {
        let mut model = abtoc_model();
        let optimization =
            Optimization::new(&model, AbToC::default(), minimize_c_options(kind)).unwrap();

        assert_eq!(optimization.evolve(2).unwrap(), 2);
        assert_eq!(optimization.evolve(1).unwrap(), 1);
        assert_eq!(optimization.iterations(), 3);

        let fitness = optimization.fitness();
        let params = optimization.params();
        assert_non_increasing(&fitness);
        for pair in params.windows(2) {
            assert!(pair[1][0] <= pair[0][0], "{}: {:?}", kind, params);
        }
        for p in &params {
            assert!((0.02..=0.88).contains(&p[0]));
        }

        // the initial model value 0.1 is in the first population
        assert!(params[0][0] <= 0.1);

        assert_eq!(k1(&model), 0.1);
        optimization.apply_parameters_to_model(&mut model).unwrap();
        assert_eq!(k1(&model), params.last().unwrap()[0]);
    }
}

#[test]
fn test_fitness_matches_weighted_cost() {
    let model = abtoc_model();
    let simulator = AbToC::default();
    let options = minimize_c_options(AlgorithmKind::ParticleSwarm);
    let optimization = Optimization::new(&model, simulator.clone(), options).unwrap();
    optimization.evolve(2).unwrap();

    let (fitness, params) = optimization.best().unwrap();
    let k = params[0];
    let produced: f64 = simulator
        .species_a(0.0, 1.0)
        .iter()
        .zip(simulator.species_a(k, 1.0))
        .map(|(a0, a)| a0 - a)
        .sum();
    assert_relative_eq!(fitness, 0.23 * produced, max_relative = 1e-12);
}

#[test]
fn test_recovers_rate_from_target_field() {
    let model = abtoc_model();
    let simulator = AbToC::default();
    let target = simulator.species_a(0.15, 5.0);
    let cost = OptCost::new(
        OptCostKind::Concentration,
        DiffMode::Relative,
        "A",
        "A",
        5.0,
        1.0,
        0,
        SPECIES_A,
        target,
    );
    let options = OptimizeOptions::new(
        vec![k1_param(0.01, 0.5)],
        vec![cost],
        AlgorithmConfig::new(AlgorithmKind::DifferentialEvolution)
            .with_islands(2)
            .with_population(8)
            .with_seed(3),
    );

    let optimization = Optimization::new(&model, simulator, options).unwrap();
    assert_eq!(optimization.evolve(40).unwrap(), 40);

    let (fitness, params) = optimization.best().unwrap();
    assert!(fitness < 5e-2, "fitness {}", fitness);
    assert_relative_eq!(params[0], 0.15, max_relative = 1e-2);
}

#[test]
fn test_rate_of_change_cost() {
    // |dA/dt| = k1 * A^2 shrinks as k1 shrinks at early times
    let model = abtoc_model();
    let cost = OptCost::new(
        OptCostKind::ConcentrationDcdt,
        DiffMode::Absolute,
        "dA/dt",
        "A",
        0.5,
        1.0,
        0,
        SPECIES_A,
        Vec::new(),
    );
    let options = OptimizeOptions::new(
        vec![k1_param(0.05, 0.21)],
        vec![cost],
        AlgorithmConfig::new(AlgorithmKind::GeneticAlgorithm)
            .with_islands(2)
            .with_population(6)
            .with_seed(5),
    );

    let optimization = Optimization::new(&model, AbToC::default(), options).unwrap();
    optimization.evolve(15).unwrap();

    let params = optimization.params();
    assert_non_increasing(&optimization.fitness());
    for pair in params.windows(2) {
        assert!(pair[1][0] <= pair[0][0]);
    }
    assert!(params.last().unwrap()[0] < 0.1);
}
