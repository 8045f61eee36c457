//! One-sided proportion test used by the detector.
//!
//! Under the null hypothesis tokens are chosen independently of any greenlist,
//! so each scored token is green with probability `gamma`.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erfc;

/// z-statistic for observing `green_count` green tokens out of `total`.
///
/// ```text
/// z = (green_count - gamma * total) / sqrt(total * gamma * (1 - gamma))
/// ```
///
/// # Example
/// ```
/// use notemark_watermark::stats::compute_z_score;
///
/// let z = compute_z_score(24, 79, 0.25);
/// assert!((z - 1.1043).abs() < 1e-3);
/// ```
pub fn compute_z_score(green_count: usize, total: usize, gamma: f64) -> f64 {
    let observed = green_count as f64;
    let t = total as f64;
    let numer = observed - gamma * t;
    let denom = (t * gamma * (1.0 - gamma)).sqrt();
    numer / denom
}

/// Upper-tail survival probability of the standard normal at `z`.
pub fn compute_p_value(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}
