//! Logits biasing during generation.
//!
//! Each row of a score batch gets `delta` added to the entries of its own
//! greenlist. Rows are independent, so the batch is processed as a parallel
//! map. Nothing here samples, normalizes, or logs.

use notemark_spec::{TokenId, WatermarkConfig, WatermarkError};
use rayon::prelude::*;

use crate::partition::{partition, Greenlist};

/// Biases a batch of score rows toward each row's greenlist.
///
/// `histories[b]` is the token history of row `b`; the greenlist for row `b`
/// is seeded from it. Returns the biased matrix. The caller samples from it
/// and appends the chosen token to `histories[b]` before the next step.
///
/// # Errors
/// * `ShapeMismatch` when the batch sizes differ or a row is not
///   `vocab_size` wide.
/// * `InsufficientPrefix` when any history is shorter than the seeding
///   scheme needs.
///
/// # Example
/// ```
/// use notemark_spec::WatermarkConfig;
/// use notemark_watermark::embed::bias;
/// use notemark_watermark::partition::partition;
///
/// let config = WatermarkConfig::default();
/// let biased = bias(vec![vec![0.0; 47]], &[vec![5u32]], &config).unwrap();
/// let greenlist = partition(&[5], &config).unwrap();
/// let green_total: f32 = biased[0].iter().sum();
/// assert_eq!(green_total, 2.0 * greenlist.len() as f32);
/// ```
pub fn bias<H>(
    mut scores: Vec<Vec<f32>>,
    histories: &[H],
    config: &WatermarkConfig,
) -> Result<Vec<Vec<f32>>, WatermarkError>
where
    H: AsRef<[TokenId]> + Sync,
{
    bias_in_place(&mut scores, histories, config)?;
    Ok(scores)
}

/// In-place form of [`bias`]. On error the scores are left untouched.
pub fn bias_in_place<H>(
    scores: &mut [Vec<f32>],
    histories: &[H],
    config: &WatermarkConfig,
) -> Result<(), WatermarkError>
where
    H: AsRef<[TokenId]> + Sync,
{
    if scores.len() != histories.len() {
        return Err(WatermarkError::ShapeMismatch {
            what: "batch size",
            expected: histories.len(),
            actual: scores.len(),
        });
    }
    let vocab_size = config.vocab_size() as usize;
    if let Some(row) = scores.iter().find(|row| row.len() != vocab_size) {
        return Err(WatermarkError::ShapeMismatch {
            what: "score row width",
            expected: vocab_size,
            actual: row.len(),
        });
    }

    let greenlists: Vec<Greenlist> = histories
        .par_iter()
        .map(|history| partition(history.as_ref(), config))
        .collect::<Result<_, _>>()?;

    let delta = config.delta();
    scores
        .par_iter_mut()
        .zip(greenlists.par_iter())
        .for_each(|(row, greenlist)| bias_row(row, greenlist, delta));

    Ok(())
}

/// Adds `delta` to every green entry of one score row.
pub fn bias_row(row: &mut [f32], greenlist: &Greenlist, delta: f32) {
    for &token in greenlist {
        if let Some(score) = row.get_mut(token as usize) {
            *score += delta;
        }
    }
}

/// A transformation applied to raw model scores before sampling.
///
/// This is the seam an external sampling loop calls once per step.
pub trait LogitsProcessor: Sync {
    /// Rewrites `scores` (one row per history) in place.
    fn process(&self, histories: &[&[TokenId]], scores: &mut [Vec<f32>]) -> Result<(), WatermarkError>;
}

/// Greenlist biasing packaged as a [`LogitsProcessor`].
#[derive(Debug, Clone)]
pub struct WatermarkLogitsProcessor {
    config: WatermarkConfig,
}

impl WatermarkLogitsProcessor {
    pub fn new(config: WatermarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }
}

impl LogitsProcessor for WatermarkLogitsProcessor {
    fn process(&self, histories: &[&[TokenId]], scores: &mut [Vec<f32>]) -> Result<(), WatermarkError> {
        bias_in_place(scores, histories, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_adds_delta_only_to_green_entries() {
        let config = WatermarkConfig::builder().delta(3.5).build().unwrap();
        let original: Vec<f32> = (0..47).map(|i| i as f32 * 0.1).collect();
        let biased = bias(vec![original.clone()], &[vec![1u32, 9]], &config).unwrap();

        let greenlist = partition(&[1, 9], &config).unwrap();
        for token in 0..47u32 {
            let expected = if greenlist.contains(token) {
                original[token as usize] + 3.5
            } else {
                original[token as usize]
            };
            assert_eq!(biased[0][token as usize], expected, "token {}", token);
        }
    }

    #[test]
    fn test_rows_use_their_own_history() {
        let config = WatermarkConfig::default();
        let histories = vec![vec![3u32], vec![8u32], vec![3u32]];
        let biased = bias(vec![vec![0.0; 47]; 3], &histories, &config).unwrap();

        assert_eq!(biased[0], biased[2]);
        for (row, history) in biased.iter().zip(&histories) {
            let greenlist = partition(history, &config).unwrap();
            let green: Vec<u32> = (0..47u32).filter(|&t| row[t as usize] > 0.0).collect();
            assert_eq!(green, greenlist.to_sorted_vec());
        }
    }

    #[test]
    fn test_insufficient_prefix_leaves_scores_untouched() {
        let config = WatermarkConfig::default();
        let mut scores = vec![vec![1.0; 47], vec![1.0; 47]];
        let histories: Vec<Vec<u32>> = vec![vec![2], vec![]];
        let err = bias_in_place(&mut scores, &histories, &config).unwrap_err();
        assert!(matches!(err, WatermarkError::InsufficientPrefix { .. }));
        assert!(scores.iter().flatten().all(|&s| s == 1.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let config = WatermarkConfig::default();
        let err = bias(vec![vec![0.0; 47]], &[vec![1u32], vec![2u32]], &config).unwrap_err();
        assert!(matches!(
            err,
            WatermarkError::ShapeMismatch {
                what: "batch size",
                expected: 2,
                actual: 1
            }
        ));

        let err = bias(vec![vec![0.0; 10]], &[vec![1u32]], &config).unwrap_err();
        assert!(matches!(
            err,
            WatermarkError::ShapeMismatch {
                expected: 47,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_processor_matches_bias() {
        let config = WatermarkConfig::default();
        let processor = WatermarkLogitsProcessor::new(config.clone());
        let history: Vec<u32> = vec![4, 4, 20];

        let mut scores = vec![vec![0.25; 47]];
        processor.process(&[history.as_slice()], &mut scores).unwrap();

        let expected = bias(vec![vec![0.25; 47]], &[history], &config).unwrap();
        assert_eq!(scores, expected);
    }

    #[test]
    fn test_empty_batch() {
        let histories: Vec<Vec<u32>> = Vec::new();
        let biased = bias(Vec::new(), &histories, &WatermarkConfig::default()).unwrap();
        assert!(biased.is_empty());
    }
}
