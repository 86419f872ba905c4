use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2};

use bp_rust::{
    factor_graph::factor_graph::EdgeDiagnostic, numeric::cartesian::assignments,
    BeliefPropagation, BpError, CanonicalFactor, DiscreteBP, DiscreteGraph, DiscreteVariable,
    GaussianBP, GaussianBelief, GaussianGraph, GaussianVariable, Potential, SolverOptions,
};

// Table factor over variable indices, row-major with the first variable slowest
struct TableFactor {
    name: &'static str,
    scope: Vec<usize>,
    table: Vec<f64>,
}

fn table_index(scope: &[usize], assignment: &[usize], domains: &[usize]) -> usize {
    scope
        .iter()
        .fold(0, |index, &variable| index * domains[variable] + assignment[variable])
}

// Exact marginals by enumerating every joint assignment
fn exact_marginals(
    domains: &[usize],
    factors: &[TableFactor],
    evidence: &[(usize, usize)],
) -> Vec<Vec<f64>> {
    let mut marginals: Vec<Vec<f64>> = domains.iter().map(|&k| vec![0.; k]).collect();
    for assignment in assignments(domains) {
        if evidence
            .iter()
            .any(|&(variable, value)| assignment[variable] != value)
        {
            continue;
        }
        let weight: f64 = factors
            .iter()
            .map(|factor| factor.table[table_index(&factor.scope, &assignment, domains)])
            .product();
        for (variable, &value) in assignment.iter().enumerate() {
            marginals[variable][value] += weight;
        }
    }
    for marginal in marginals.iter_mut() {
        let total: f64 = marginal.iter().sum();
        marginal.iter_mut().for_each(|p| *p /= total);
    }
    marginals
}

fn build_discrete(names: &[&str], domains: &[usize], factors: &[TableFactor]) -> DiscreteGraph {
    let mut graph = DiscreteGraph::new();
    for (name, &domain_size) in names.iter().zip(domains) {
        graph.add_variable(name, DiscreteVariable::new(domain_size));
    }
    for factor in factors {
        let scope: Vec<&str> = factor.scope.iter().map(|&variable| names[variable]).collect();
        graph.connect(factor.name, Potential::table(factor.table.clone()), &scope);
    }
    graph
}

fn assert_close(actual: &[f64], expected: &[f64], epsilon: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_abs_diff_eq!(*a, *e, epsilon = epsilon);
    }
}

fn tree_factors() -> Vec<TableFactor> {
    vec![
        TableFactor {
            name: "p_a",
            scope: vec![0],
            table: vec![0.3, 0.7],
        },
        TableFactor {
            name: "f_ab",
            scope: vec![0, 1],
            table: vec![0.5, 1.2, 0.3, 0.9, 0.2, 1.4],
        },
        TableFactor {
            name: "f_bcd",
            scope: vec![1, 2, 3],
            table: vec![
                0.8, 0.1, 0.4, 0.6, 1.1, 0.3, 0.2, 0.9, 0.5, 0.7, 1.3, 0.25,
            ],
        },
        TableFactor {
            name: "p_d",
            scope: vec![3],
            table: vec![0.45, 0.55],
        },
    ]
}

const TREE_NAMES: [&str; 4] = ["a", "b", "c", "d"];
const TREE_DOMAINS: [usize; 4] = [2, 3, 2, 2];

#[test]
fn agreement_factor_transfers_evidence() {
    let mut graph = DiscreteGraph::new();
    graph
        .add_variable("A", DiscreteVariable::new(2))
        .add_variable("B", DiscreteVariable::new(2))
        .connect("f", Potential::table(vec![0.99, 0.01, 0.01, 0.99]), &["A", "B"]);
    let mut bp = DiscreteBP::with_default_damping(graph).unwrap();

    assert!(bp.run(&SolverOptions::default()).converged());
    assert_close(&bp.get_beliefs("A").unwrap(), &[0.5, 0.5], 1e-9);
    assert_close(&bp.get_beliefs("B").unwrap(), &[0.5, 0.5], 1e-9);

    bp.set_evidence("A", 1);
    assert!(bp.run(&SolverOptions::default()).converged());
    assert_close(&bp.get_beliefs("B").unwrap(), &[0.01, 0.99], 1e-6);
}

#[test]
fn medical_posterior_matches_enumeration() {
    let mut graph = DiscreteGraph::new();
    graph
        .add_variable_with_prior("disease", vec![0.8, 0.1, 0.1])
        .add_variable("fever", DiscreteVariable::new(2))
        .add_variable("cough", DiscreteVariable::new(2))
        .connect(
            "fever_given_disease",
            Potential::table(vec![0.9, 0.1, 0.2, 0.8, 0.3, 0.7]),
            &["disease", "fever"],
        )
        .connect(
            "cough_given_disease",
            Potential::table(vec![0.95, 0.05, 0.4, 0.6, 0.1, 0.9]),
            &["disease", "cough"],
        );
    let mut bp = DiscreteBP::with_default_damping(graph).unwrap();
    assert!(bp.graph().is_acyclic());

    bp.set_evidence("fever", 1);
    bp.set_evidence("cough", 1);
    assert!(bp.run(&SolverOptions::default()).converged());

    let posterior = bp.get_beliefs("disease").unwrap();
    let unnormalized = [0.8 * 0.1 * 0.05, 0.1 * 0.8 * 0.6, 0.1 * 0.7 * 0.9];
    let total: f64 = unnormalized.iter().sum();
    let expected: Vec<f64> = unnormalized.iter().map(|p| p / total).collect();

    assert!(posterior[0] < 0.8);
    assert_close(&posterior, &expected, 1e-9);
    assert_abs_diff_eq!(posterior.iter().sum::<f64>(), 1., epsilon = 1e-9);
}

#[test]
fn tree_beliefs_are_exact() {
    let factors = tree_factors();
    let mut bp =
        DiscreteBP::with_default_damping(build_discrete(&TREE_NAMES, &TREE_DOMAINS, &factors))
            .unwrap();
    assert!(bp.graph().is_acyclic());

    let status = bp.run_iterations(50, 1e-12);
    assert!(status.converged());

    let expected = exact_marginals(&TREE_DOMAINS, &factors, &[]);
    for (name, marginal) in TREE_NAMES.iter().zip(expected.iter()) {
        assert_close(&bp.get_beliefs(name).unwrap(), marginal, 1e-9);
    }
}

#[test]
fn tree_beliefs_are_exact_given_evidence() {
    let factors = tree_factors();
    let mut bp =
        DiscreteBP::with_default_damping(build_discrete(&TREE_NAMES, &TREE_DOMAINS, &factors))
            .unwrap();
    bp.set_evidence("c", 1);
    bp.run_iterations(50, 1e-12);

    let expected = exact_marginals(&TREE_DOMAINS, &factors, &[(2, 1)]);
    for (name, marginal) in TREE_NAMES.iter().zip(expected.iter()) {
        assert_close(&bp.get_beliefs(name).unwrap(), marginal, 1e-9);
    }
    assert_eq!(bp.get_beliefs("c").unwrap(), vec![0., 1.]);
}

#[test]
fn prior_only_network_matches_enumeration() {
    let names = ["disease", "fever", "cough"];
    let domains = [3, 2, 2];
    let factors = vec![
        TableFactor {
            name: "disease_prior",
            scope: vec![0],
            table: vec![0.8, 0.1, 0.1],
        },
        TableFactor {
            name: "fever_given_disease",
            scope: vec![0, 1],
            table: vec![0.9, 0.1, 0.2, 0.8, 0.3, 0.7],
        },
        TableFactor {
            name: "cough_given_disease",
            scope: vec![0, 2],
            table: vec![0.95, 0.05, 0.4, 0.6, 0.1, 0.9],
        },
    ];
    let mut bp =
        DiscreteBP::with_default_damping(build_discrete(&names, &domains, &factors)).unwrap();

    assert!(bp.run(&SolverOptions::default()).converged());

    assert_close(&bp.get_beliefs("fever").unwrap(), &[0.77, 0.23], 1e-9);
    let expected = exact_marginals(&domains, &factors, &[]);
    for (name, marginal) in names.iter().zip(expected.iter()) {
        assert_close(&bp.get_beliefs(name).unwrap(), marginal, 1e-9);
    }
}

// a - f_ab - b - f_bc - c - f_cd - d, informative only at the `a` end
#[test]
fn chain_converges_within_diameter_sweeps() {
    let names = ["a", "b", "c", "d"];
    let domains = [2, 3, 2, 2];
    let factors = vec![
        TableFactor {
            name: "p_a",
            scope: vec![0],
            table: vec![0.25, 0.75],
        },
        TableFactor {
            name: "f_ab",
            scope: vec![0, 1],
            table: vec![0.9, 0.2, 0.4, 0.1, 0.7, 0.5],
        },
        TableFactor {
            name: "f_bc",
            scope: vec![1, 2],
            table: vec![0.6, 0.4, 0.3, 0.8, 0.5, 0.5],
        },
        TableFactor {
            name: "f_cd",
            scope: vec![2, 3],
            table: vec![0.9, 0.1, 0.2, 0.8],
        },
    ];
    let mut bp =
        DiscreteBP::with_default_damping(build_discrete(&names, &domains, &factors)).unwrap();

    // p_a to d is the longest path: 7 edges
    let diameter = 7;
    let status = bp.run(&SolverOptions::default());
    assert!(status.converged());
    assert!(status.iterations() >= diameter);
    assert!(status.iterations() <= 2 * diameter + 1);

    let expected = exact_marginals(&domains, &factors, &[]);
    for (name, marginal) in names.iter().zip(expected.iter()) {
        assert_close(&bp.get_beliefs(name).unwrap(), marginal, 1e-9);
    }
}

#[test]
fn damping_converges_to_the_same_tree_beliefs() {
    let factors = tree_factors();
    let mut damped =
        DiscreteBP::new(build_discrete(&TREE_NAMES, &TREE_DOMAINS, &factors), 0.6).unwrap();
    let status = damped.run_iterations(1000, 1e-13);
    assert!(status.converged());

    let expected = exact_marginals(&TREE_DOMAINS, &factors, &[]);
    for (name, marginal) in TREE_NAMES.iter().zip(expected.iter()) {
        assert_close(&damped.get_beliefs(name).unwrap(), marginal, 1e-8);
    }
}

#[test]
fn evidence_survives_repeated_runs() {
    let factors = tree_factors();
    let mut bp =
        DiscreteBP::with_default_damping(build_discrete(&TREE_NAMES, &TREE_DOMAINS, &factors))
            .unwrap();
    bp.set_evidence("b", 2);
    for _ in 0..3 {
        bp.run_iterations(5, 1e-12);
        assert_eq!(bp.get_beliefs("b").unwrap(), vec![0., 0., 1.]);
        let log_belief = bp.get_log_beliefs("b").unwrap();
        assert_eq!(log_belief[0], f64::NEG_INFINITY);
        assert_eq!(log_belief[2], 0.);
    }
}

#[test]
fn zero_iteration_budget_changes_nothing() {
    let factors = tree_factors();
    let mut bp =
        DiscreteBP::with_default_damping(build_discrete(&TREE_NAMES, &TREE_DOMAINS, &factors))
            .unwrap();
    let status = bp.run(SolverOptions::default().set_max_iterations(0));

    assert!(!status.converged());
    assert_eq!(status.iterations(), 0);
    assert!(status.max_change().is_infinite());
    assert_close(&bp.get_beliefs("b").unwrap(), &[1. / 3.; 3], 1e-15);
}

#[test]
fn loopy_beliefs_remain_distributions() {
    let mut graph = DiscreteGraph::new();
    graph
        .add_variable("x", DiscreteVariable::new(2))
        .add_variable("y", DiscreteVariable::new(2))
        .add_variable("z", DiscreteVariable::new(2))
        .connect("f_xy", Potential::potts(3., 1.), &["x", "y"])
        .connect("f_yz", Potential::potts(3., 1.), &["y", "z"])
        .connect("f_zx", Potential::potts(1., 3.), &["z", "x"])
        .connect("p_x", Potential::table(vec![0.2, 0.8]), &["x"]);
    let mut bp = DiscreteBP::with_default_damping(graph).unwrap();
    assert!(!bp.graph().is_acyclic());

    bp.run_iterations(200, 1e-10);
    let names: Vec<String> = bp.variable_names().map(str::to_string).collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    for name in names.iter() {
        let belief = bp.get_beliefs(name).unwrap();
        assert!(belief.iter().all(|p| p.is_finite() && *p >= 0.));
        assert_abs_diff_eq!(belief.iter().sum::<f64>(), 1., epsilon = 1e-9);
    }
}

#[test]
fn malformed_edges_are_reported_not_fatal() {
    let mut graph = DiscreteGraph::new();
    graph
        .add_variable("a", DiscreteVariable::new(2))
        .add_variable("b", DiscreteVariable::new(2))
        .connect("f", Potential::uniform(1.), &["a"])
        .add_edge("a", "b")
        .add_edge("a", "ghost");
    let mut bp = DiscreteBP::with_default_damping(graph).unwrap();

    let report = bp.report();
    assert_eq!(report.accepted_edges(), 2);
    assert!(report
        .diagnostics()
        .iter()
        .any(|diagnostic| matches!(diagnostic, EdgeDiagnostic::SameKind { .. })));
    assert!(report
        .diagnostics()
        .iter()
        .any(|diagnostic| matches!(diagnostic, EdgeDiagnostic::UnknownNode { .. })));

    assert!(bp.run(&SolverOptions::default()).converged());
    assert_close(&bp.get_beliefs("b").unwrap(), &[0.5, 0.5], 1e-12);
}

#[test]
fn unknown_names_are_errors_for_queries_only() {
    let factors = tree_factors();
    let mut bp =
        DiscreteBP::with_default_damping(build_discrete(&TREE_NAMES, &TREE_DOMAINS, &factors))
            .unwrap();
    bp.set_evidence("nope", 0);
    bp.set_evidence("f_ab", 0);
    assert_eq!(bp.evidence().num_clamped(), 0);

    assert_eq!(
        bp.get_beliefs("nope"),
        Err(BpError::UnknownNode("nope".to_string()))
    );
    assert_eq!(
        bp.get_beliefs("f_ab"),
        Err(BpError::NotAVariable("f_ab".to_string()))
    );
}

fn canonical(precision: Array2<f64>, mean: Array1<f64>) -> CanonicalFactor {
    CanonicalFactor::new(precision, mean)
}

#[test]
fn gaussian_middle_variable_matches_elimination() {
    let precision1 = array![[1.5, -0.4], [-0.4, 2.]];
    let mean1 = array![0.2, 1.];
    let precision2 = array![[1., 0.3], [0.3, 0.8]];
    let mean2 = array![-1., 0.5];
    let information1 = precision1.dot(&mean1);
    let information2 = precision2.dot(&mean2);

    let mut graph = GaussianGraph::new();
    graph
        .add_variable("x", GaussianVariable::new(0., 1.))
        .add_variable("y", GaussianVariable::new(0., 1.))
        .add_variable("z", GaussianVariable::new(0., 1.))
        .connect("f1", canonical(precision1.clone(), mean1), &["x", "y"])
        .connect("f2", canonical(precision2.clone(), mean2), &["y", "z"]);
    let mut bp = GaussianBP::with_default_damping(graph).unwrap();
    bp.set_evidence("x", GaussianBelief::observed(1.5));
    bp.set_evidence("z", GaussianBelief::observed(-0.5));

    assert!(bp.run(&SolverOptions::default()).converged());

    let conditional_precision = precision1[[1, 1]] + precision2[[0, 0]];
    let conditional_information = information1[1] - precision1[[1, 0]] * 1.5 + information2[0]
        - precision2[[0, 1]] * -0.5;
    let belief = bp.get_beliefs("y").unwrap();
    assert_abs_diff_eq!(
        belief.mean,
        conditional_information / conditional_precision,
        epsilon = 1e-8
    );
    assert_abs_diff_eq!(belief.variance, 1. / conditional_precision, epsilon = 1e-8);
}

// Canonical form of the conditional y ~ N(slope * x + offset, variance) over (x, y)
fn linear_conditional(slope: f64, offset: f64, variance: f64) -> CanonicalFactor {
    canonical(
        array![
            [slope * slope / variance, -slope / variance],
            [-slope / variance, 1. / variance]
        ],
        array![0., offset],
    )
}

#[test]
fn gaussian_chain_propagates_conditional_mean() {
    let mut graph = GaussianGraph::new();
    graph
        .add_variable("x", GaussianVariable::new(0., 1.))
        .add_variable("y", GaussianVariable::new(0., 1.))
        .add_variable("z", GaussianVariable::new(0., 1.))
        .connect("y_given_x", linear_conditional(0.5, 1., 0.25), &["x", "y"])
        .connect("z_given_y", linear_conditional(2., -1., 1.), &["y", "z"]);
    let mut bp = GaussianBP::with_default_damping(graph).unwrap();
    bp.set_evidence("x", GaussianBelief::observed(2.));

    assert!(bp.run(&SolverOptions::default()).converged());

    // E[z | x] = 2 * (0.5 * x + 1) - 1
    let belief = bp.get_beliefs("z").unwrap();
    assert_abs_diff_eq!(belief.mean, 3., epsilon = 1e-8);
    assert_abs_diff_eq!(belief.variance, 1., epsilon = 1e-8);
}

// x_prior - x - y_given_x - y - z_given_y - z, informative only at the `x` end
#[test]
fn gaussian_chain_converges_within_diameter_sweeps() {
    let mut graph = GaussianGraph::new();
    graph
        .add_variable("x", GaussianVariable::new(0., 1.))
        .add_variable("y", GaussianVariable::new(0., 1.))
        .add_variable("z", GaussianVariable::new(0., 1.))
        .connect("x_prior", CanonicalFactor::unary(2., 0.01), &["x"])
        .connect("y_given_x", linear_conditional(0.5, 1., 0.25), &["x", "y"])
        .connect("z_given_y", linear_conditional(2., -1., 1.), &["y", "z"]);
    let mut bp = GaussianBP::with_default_damping(graph).unwrap();

    let diameter = 5;
    let status = bp.run(&SolverOptions::default());
    assert!(status.converged());
    assert!(status.iterations() >= diameter);
    assert!(status.iterations() <= 2 * diameter + 1);

    // E[z] = 2 * (0.5 * E[x] + 1) - 1
    assert_abs_diff_eq!(bp.get_beliefs("z").unwrap().mean, 3., epsilon = 1e-8);
}

#[test]
fn gaussian_evidence_survives_repeated_runs() {
    let mut graph = GaussianGraph::new();
    graph
        .add_variable("x", GaussianVariable::new(0., 1.))
        .add_variable("y", GaussianVariable::new(5., 2.))
        .connect("prior_x", CanonicalFactor::unary(1., 4.), &["x"])
        .connect("f", canonical(array![[1., 0.2], [0.2, 1.]], array![0., 0.]), &["x", "y"]);
    let mut bp = GaussianBP::new(graph, 0.7).unwrap();
    bp.set_evidence("y", GaussianBelief::new(-1., 0.01));

    for _ in 0..3 {
        bp.run_iterations(50, 1e-10);
        assert_eq!(
            bp.get_beliefs("y").unwrap(),
            GaussianBelief::new(-1., 0.01)
        );
        let x = bp.get_beliefs("x").unwrap();
        assert!(x.mean.is_finite() && x.variance > 0.);
    }
    assert!(bp.is_evidenced("y"));
}

#[test]
fn gaussian_zero_iteration_budget_keeps_priors() {
    let mut graph = GaussianGraph::new();
    graph
        .add_variable("x", GaussianVariable::new(2., 3.))
        .connect("prior_x", CanonicalFactor::unary(0., 1.), &["x"]);
    let mut bp = GaussianBP::with_default_damping(graph).unwrap();

    let status = bp.run_iterations(0, 1e-6);
    assert_eq!(status.iterations(), 0);
    assert!(!status.converged());
    assert_eq!(bp.get_beliefs("x").unwrap(), GaussianBelief::new(2., 3.));
}
