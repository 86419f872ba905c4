use super::log_space::normalize;

// Convex blend `factor * new + (1 - factor) * prev`, renormalized to a probability vector
// factor = 1 takes the new message as is, factor = 0 keeps the previous one
pub fn damp_message(new_message: &[f64], prev_message: &[f64], damping_factor: f64) -> Vec<f64> {
    assert_eq!(
        new_message.len(),
        prev_message.len(),
        "Damped messages must have the same length."
    );
    let mut damped: Vec<f64> = new_message
        .iter()
        .zip(prev_message.iter())
        .map(|(new, prev)| damping_factor * new + (1. - damping_factor) * prev)
        .collect();
    normalize(&mut damped);
    damped
}

// Same blend applied to a (mean, precision) pair, no renormalization
// A NaN on either side is skipped: the other side is taken unchanged
pub fn gaussian_damp_message(
    new_message: (f64, f64),
    prev_message: (f64, f64),
    damping_factor: f64,
) -> (f64, f64) {
    (
        damp_component(new_message.0, prev_message.0, damping_factor),
        damp_component(new_message.1, prev_message.1, damping_factor),
    )
}

fn damp_component(new: f64, prev: f64, damping_factor: f64) -> f64 {
    if prev.is_nan() {
        new
    } else if new.is_nan() {
        prev
    } else {
        damping_factor * new + (1. - damping_factor) * prev
    }
}
