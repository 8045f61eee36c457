//! Detection options and result types.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_Z_THRESHOLD;

/// Options for a detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionOptions {
    /// A sequence is predicted watermarked when its z-score exceeds this.
    pub z_threshold: f64,
    /// Discount repeated (prefix, token) bigrams. Not implemented; requesting
    /// it makes detection fail.
    pub ignore_repeated_bigrams: bool,
    /// Include the per-position green/red mask in the result.
    pub return_green_token_mask: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            ignore_repeated_bigrams: false,
            return_green_token_mask: false,
        }
    }
}

impl DetectionOptions {
    /// Default options with the given threshold.
    pub fn with_z_threshold(z_threshold: f64) -> Self {
        Self {
            z_threshold,
            ..Self::default()
        }
    }
}

/// Outcome of scoring one sequence against a watermark config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Tokens scored (sequence length minus the seeding prefix).
    pub num_tokens_scored: usize,
    /// Scored tokens that fell in their step's greenlist.
    pub num_green_tokens: usize,
    /// `num_green_tokens / num_tokens_scored`.
    pub green_fraction: f64,
    /// One-sample proportion z-statistic against the gamma null.
    pub z_score: f64,
    /// Upper-tail standard normal probability at `z_score`.
    pub p_value: f64,
    /// Whether `z_score` exceeded the threshold.
    pub prediction: bool,
    /// `1 - p_value`, present only when `prediction` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Green (true) or red (false) for each scored position, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_token_mask: Option<Vec<bool>>,
}
