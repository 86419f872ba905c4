use std::fmt::Display;

use log::{debug, info, warn};

use crate::errors::BpError;

pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
// Blend weight of the new value; 1 means no damping
pub const DEFAULT_DAMPING_FACTOR: f64 = 1.;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    max_iterations: usize,
    tolerance: f64, // stop once the largest change of a sweep is below this value
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl SolverOptions {
    pub fn set_max_iterations(&mut self, value: usize) -> &mut Self {
        self.max_iterations = value;
        self
    }

    pub fn set_tolerance(&mut self, value: f64) -> &mut Self {
        self.tolerance = value;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

// Checks that a damping factor lies in [0, 1]
pub fn validate_damping(damping_factor: f64) -> Result<f64, BpError> {
    if (0. ..=1.).contains(&damping_factor) {
        Ok(damping_factor)
    } else {
        Err(BpError::InvalidDamping(damping_factor))
    }
}

/// Outcome of a call to `run_iterations`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunStatus {
    // The largest message or belief change dropped below the tolerance at this (1-based) iteration
    Converged { iteration: usize, max_change: f64 },
    // The iteration budget ran out; `max_change` is the change of the last sweep
    // (infinite if no sweep was run)
    Exhausted { iterations: usize, max_change: f64 },
}

impl RunStatus {
    pub fn converged(&self) -> bool {
        matches!(self, RunStatus::Converged { .. })
    }

    // Number of sweeps that were run
    pub fn iterations(&self) -> usize {
        match *self {
            RunStatus::Converged { iteration, .. } => iteration,
            RunStatus::Exhausted { iterations, .. } => iterations,
        }
    }

    pub fn max_change(&self) -> f64 {
        match *self {
            RunStatus::Converged { max_change, .. } | RunStatus::Exhausted { max_change, .. } => {
                max_change
            }
        }
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Converged {
                iteration,
                max_change,
            } => write!(
                f,
                "converged at iteration {} (max change {:e})",
                iteration, max_change
            ),
            RunStatus::Exhausted {
                iterations,
                max_change,
            } => write!(
                f,
                "did not converge within {} iterations (max change {:e})",
                iterations, max_change
            ),
        }
    }
}

// Interface shared by the discrete and the gaussian engine
pub trait BeliefPropagation {
    type Observation;
    type Belief;

    // Clamps a variable to an observed value; unknown names and factors are ignored
    fn set_evidence(&mut self, name: &str, observation: Self::Observation);

    // Returns the current belief of a variable
    fn get_beliefs(&self, name: &str) -> Result<Self::Belief, BpError>;

    // Performs one synchronous sweep (all messages, buffer exchange, beliefs)
    // and returns the largest absolute change of a message or of a non-evidenced belief
    fn sweep(&mut self) -> f64;

    // Runs sweeps until the largest change drops below `tolerance`
    // or `max_iterations` sweeps have been run
    fn run_iterations(&mut self, max_iterations: usize, tolerance: f64) -> RunStatus {
        debug!(
            "In run_iterations() with max_iterations {} and tolerance {}",
            max_iterations, tolerance
        );

        let mut max_change = f64::INFINITY;
        for iteration in 1..=max_iterations {
            max_change = self.sweep();
            debug!("Iteration {}: max change {}", iteration, max_change);
            if max_change < tolerance {
                let status = RunStatus::Converged {
                    iteration,
                    max_change,
                };
                info!("Belief propagation {}", status);
                return status;
            }
        }

        let status = RunStatus::Exhausted {
            iterations: max_iterations,
            max_change,
        };
        warn!("Belief propagation {}", status);
        status
    }

    fn run(&mut self, options: &SolverOptions) -> RunStatus {
        self.run_iterations(options.max_iterations(), options.tolerance())
    }
}
