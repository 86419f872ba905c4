/// Floor used in place of `log(0)` and as the divisor floor, keeps `-inf` out of log-sum-exp.
pub const LOG_EPSILON: f64 = 1e-10;

// Computes log(sum(exp(values))) without overflow,
// falls back to `LOG_EPSILON` for an empty input or when every entry is -inf
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return LOG_EPSILON;
    }

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return LOG_EPSILON;
    }

    max + values.iter().map(|value| (value - max).exp()).sum::<f64>().ln()
}

// Divides every entry by the sum of entries
// Assumption: the sum is non-zero
pub fn normalize(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    values.iter_mut().for_each(|value| *value /= sum);
}

// Turns a vector of log scores into a probability vector
pub fn normalize_log(log_values: &[f64]) -> Vec<f64> {
    let lse = log_sum_exp(log_values);
    log_values
        .iter()
        .map(|log_value| (log_value - lse).exp())
        .collect()
}

// Elementwise natural logarithm, exact zeros map to -inf
pub fn ln_vec(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|&value| {
            if value == 0. {
                f64::NEG_INFINITY
            } else {
                value.ln()
            }
        })
        .collect()
}
