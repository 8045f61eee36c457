//! Watermark detection.
//!
//! The detector needs only the finished token sequence and the config. It
//! replays the partitioning left to right, counts how many tokens landed in
//! the greenlist their own prefix induces, and tests that count against the
//! `gamma` null rate.

use notemark_spec::{DetectionOptions, DetectionResult, TokenId, WatermarkConfig, WatermarkError};
use rayon::prelude::*;
use tracing::debug;

use crate::partition::partition;
use crate::stats::{compute_p_value, compute_z_score};

/// Green-token counts for one sequence, before any hypothesis test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceScore {
    /// Tokens scored (sequence length minus the seeding prefix).
    pub num_tokens_scored: usize,
    /// Scored tokens that were green.
    pub num_green_tokens: usize,
    /// Green (true) or red (false) per scored position.
    pub green_token_mask: Vec<bool>,
}

impl SequenceScore {
    pub fn green_fraction(&self) -> f64 {
        self.num_green_tokens as f64 / self.num_tokens_scored as f64
    }
}

/// Scores sequences against one config with fixed options.
#[derive(Debug, Clone)]
pub struct Detector<'a> {
    config: &'a WatermarkConfig,
    options: DetectionOptions,
}

impl<'a> Detector<'a> {
    /// Creates a detector with default options.
    pub fn new(config: &'a WatermarkConfig) -> Self {
        Self::with_options(config, DetectionOptions::default())
    }

    pub fn with_options(config: &'a WatermarkConfig, options: DetectionOptions) -> Self {
        Self { config, options }
    }

    pub fn config(&self) -> &WatermarkConfig {
        self.config
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Counts green tokens in `tokens`.
    ///
    /// Position `i` is scored against the greenlist of `tokens[..i]`, for
    /// every `i` from `min_prefix_len` to the end. The scan is a strict left to
    /// right fold.
    ///
    /// # Errors
    /// * `UnimplementedVariant` when repeated-bigram discounting is requested.
    /// * `InsufficientTokensScored` when nothing is left to score after the
    ///   seeding prefix.
    pub fn score_sequence(&self, tokens: &[TokenId]) -> Result<SequenceScore, WatermarkError> {
        if self.options.ignore_repeated_bigrams {
            return Err(WatermarkError::UnimplementedVariant("ignore_repeated_bigrams"));
        }

        let min_prefix_len = self.config.min_prefix_len();
        if tokens.len() <= min_prefix_len {
            return Err(WatermarkError::InsufficientTokensScored {
                min_prefix_len,
                sequence_len: tokens.len(),
            });
        }

        let mut green_token_mask = Vec::with_capacity(tokens.len() - min_prefix_len);
        for idx in min_prefix_len..tokens.len() {
            let greenlist = partition(&tokens[..idx], self.config)?;
            green_token_mask.push(greenlist.contains(tokens[idx]));
        }

        let num_green_tokens = green_token_mask.iter().filter(|&&green| green).count();
        Ok(SequenceScore {
            num_tokens_scored: green_token_mask.len(),
            num_green_tokens,
            green_token_mask,
        })
    }

    /// Scores `tokens` and decides whether it carries the watermark.
    ///
    /// # Example
    /// ```
    /// use notemark_spec::WatermarkConfig;
    /// use notemark_watermark::detect::Detector;
    ///
    /// let config = WatermarkConfig::default();
    /// let result = Detector::new(&config).detect(&[1, 2, 3, 4, 5]).unwrap();
    /// assert_eq!(result.num_tokens_scored, 4);
    /// assert_eq!(result.confidence.is_some(), result.prediction);
    /// ```
    pub fn detect(&self, tokens: &[TokenId]) -> Result<DetectionResult, WatermarkError> {
        let score = self.score_sequence(tokens)?;

        let z_score = compute_z_score(
            score.num_green_tokens,
            score.num_tokens_scored,
            self.config.gamma(),
        );
        let p_value = compute_p_value(z_score);
        let prediction = z_score > self.options.z_threshold;
        let confidence = prediction.then(|| 1.0 - p_value);

        debug!(
            num_tokens_scored = score.num_tokens_scored,
            num_green_tokens = score.num_green_tokens,
            z_score,
            p_value,
            prediction,
            "scored sequence"
        );

        Ok(DetectionResult {
            num_tokens_scored: score.num_tokens_scored,
            num_green_tokens: score.num_green_tokens,
            green_fraction: score.green_fraction(),
            z_score,
            p_value,
            prediction,
            confidence,
            green_token_mask: self
                .options
                .return_green_token_mask
                .then_some(score.green_token_mask),
        })
    }

    /// Runs [`Detector::detect`] over independent sequences in parallel.
    ///
    /// Results are in input order; one failing sequence does not affect the
    /// others.
    pub fn detect_batch<S>(&self, sequences: &[S]) -> Vec<Result<DetectionResult, WatermarkError>>
    where
        S: AsRef<[TokenId]> + Sync,
    {
        sequences
            .par_iter()
            .map(|sequence| self.detect(sequence.as_ref()))
            .collect()
    }
}

/// Detects the watermark in `sequence` with default options and the given
/// z-score threshold.
///
/// # Errors
/// `InsufficientTokensScored` when `sequence` is no longer than the seeding
/// prefix.
pub fn detect(
    sequence: &[TokenId],
    config: &WatermarkConfig,
    z_threshold: f64,
) -> Result<DetectionResult, WatermarkError> {
    Detector::with_options(config, DetectionOptions::with_z_threshold(z_threshold)).detect(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a sequence whose every scored token is green.
    fn all_green_sequence(config: &WatermarkConfig, start: TokenId, len: usize) -> Vec<TokenId> {
        let mut tokens = vec![start];
        while tokens.len() < len {
            let greenlist = partition(&tokens, config).unwrap();
            tokens.push(greenlist.as_slice()[0]);
        }
        tokens
    }

    /// Builds a sequence whose every scored token is red.
    fn all_red_sequence(config: &WatermarkConfig, start: TokenId, len: usize) -> Vec<TokenId> {
        let mut tokens = vec![start];
        while tokens.len() < len {
            let greenlist = partition(&tokens, config).unwrap();
            let red = (0..config.vocab_size())
                .find(|&t| !greenlist.contains(t))
                .unwrap();
            tokens.push(red);
        }
        tokens
    }

    #[test]
    fn test_length_equal_to_min_prefix_fails() {
        let config = WatermarkConfig::default();
        let err = detect(&[7], &config, 2.0).unwrap_err();
        assert_eq!(
            err,
            WatermarkError::InsufficientTokensScored {
                min_prefix_len: 1,
                sequence_len: 1
            }
        );
        assert!(detect(&[], &config, 2.0).is_err());
    }

    #[test]
    fn test_bigram_variant_fails_loudly() {
        let config = WatermarkConfig::default();
        let options = DetectionOptions {
            ignore_repeated_bigrams: true,
            ..Default::default()
        };
        let err = Detector::with_options(&config, options)
            .detect(&[1, 2, 3])
            .unwrap_err();
        assert_eq!(
            err,
            WatermarkError::UnimplementedVariant("ignore_repeated_bigrams")
        );
    }

    #[test]
    fn test_all_green_sequence_is_detected() {
        let config = WatermarkConfig::default();
        let tokens = all_green_sequence(&config, 3, 60);
        let result = detect(&tokens, &config, 4.0).unwrap();

        assert_eq!(result.num_tokens_scored, 59);
        assert_eq!(result.num_green_tokens, 59);
        assert_eq!(result.green_fraction, 1.0);
        assert!(result.prediction);
        let confidence = result.confidence.unwrap();
        assert!((confidence - (1.0 - result.p_value)).abs() < 1e-12);
    }

    #[test]
    fn test_all_red_sequence_is_not_detected() {
        let config = WatermarkConfig::default();
        let tokens = all_red_sequence(&config, 3, 60);
        let result = detect(&tokens, &config, 2.0).unwrap();

        assert_eq!(result.num_green_tokens, 0);
        assert!(result.z_score < 0.0);
        assert!(!result.prediction);
        assert!(result.confidence.is_none());
        assert!(result.p_value > 0.5);
    }

    #[test]
    fn test_mask_only_when_requested() {
        let config = WatermarkConfig::default();
        let tokens = all_green_sequence(&config, 11, 10);

        let plain = Detector::new(&config).detect(&tokens).unwrap();
        assert!(plain.green_token_mask.is_none());

        let options = DetectionOptions {
            return_green_token_mask: true,
            ..Default::default()
        };
        let masked = Detector::with_options(&config, options)
            .detect(&tokens)
            .unwrap();
        assert_eq!(masked.green_token_mask, Some(vec![true; 9]));
    }

    #[test]
    fn test_out_of_vocab_tokens_count_red() {
        let config = WatermarkConfig::default();
        let score = Detector::new(&config)
            .score_sequence(&[1, 1000, 2000])
            .unwrap();
        assert_eq!(score.num_tokens_scored, 2);
        assert_eq!(score.num_green_tokens, 0);
    }

    #[test]
    fn test_legacy_convention_detects_its_own_sequences() {
        let config = WatermarkConfig::builder()
            .vocab_size(100)
            .gamma(0.75)
            .select_green_tokens(false)
            .build()
            .unwrap();
        // Legacy greenlist holds 25 of 100 tokens; z uses gamma = 0.75.
        let tokens = all_green_sequence(&config, 0, 200);
        let result = detect(&tokens, &config, 4.0).unwrap();
        assert_eq!(result.num_green_tokens, 199);
        assert!(result.prediction);
    }

    #[test]
    fn test_detect_batch_preserves_order() {
        let config = WatermarkConfig::default();
        let green = all_green_sequence(&config, 5, 50);
        let sequences = vec![green.clone(), vec![1], green];

        let results = Detector::new(&config).detect_batch(&sequences);
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().prediction);
        assert!(matches!(
            results[1],
            Err(WatermarkError::InsufficientTokensScored { .. })
        ));
        assert_eq!(results[0], results[2]);
    }
}
