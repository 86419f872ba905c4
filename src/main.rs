use std::time::Instant;

use bp_rust::{
    BeliefPropagation, BpError, DiscreteBP, DiscreteGraph, DiscreteVariable, Potential,
    SolverOptions,
};
use log::info;

const DISEASES: [&str; 3] = ["healthy", "flu", "cold"];

// Disease with a prior, two binary symptoms conditioned on it
fn medical_network() -> DiscreteGraph {
    let mut graph = DiscreteGraph::new();
    graph
        .add_variable_with_prior("disease", vec![0.8, 0.1, 0.1])
        .add_variable("fever", DiscreteVariable::new(2))
        .add_variable("cough", DiscreteVariable::new(2))
        // P(fever | disease), one row per disease
        .connect(
            "fever_given_disease",
            Potential::table(vec![0.9, 0.1, 0.2, 0.8, 0.3, 0.7]),
            &["disease", "fever"],
        )
        // P(cough | disease)
        .connect(
            "cough_given_disease",
            Potential::table(vec![0.95, 0.05, 0.4, 0.6, 0.1, 0.9]),
            &["disease", "cough"],
        );
    graph
}

fn main() -> Result<(), BpError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let time_start = Instant::now();
    let mut bp = DiscreteBP::with_default_damping(medical_network())?;
    info!(
        "Graph normalized ({} accepted edges, acyclic: {}). Elapsed time {:?}.",
        bp.report().accepted_edges(),
        bp.graph().is_acyclic(),
        time_start.elapsed()
    );

    bp.set_evidence("fever", 1);
    bp.set_evidence("cough", 1);

    let time_start = Instant::now();
    let status = bp.run(&SolverOptions::default());
    info!("Inference {}. Elapsed time {:?}.", status, time_start.elapsed());

    let posterior = bp.get_beliefs("disease")?;
    for (disease, probability) in DISEASES.iter().zip(posterior.iter()) {
        info!("P(disease = {} | fever, cough) = {:.4}", disease, probability);
    }

    Ok(())
}
