//! Autoregressive sampling loop with an optional logits processor.
//!
//! The generative model itself lives outside this crate; [`ScoreModel`] is
//! the seam it plugs into. [`RandomScoreModel`] is a seeded stand-in that
//! produces independent uniform scores, enough to exercise embedding and
//! detection end to end.

use notemark_spec::{TokenId, WatermarkError};
use rand::Rng;
use rand_pcg::Pcg32;
use thiserror::Error;
use tracing::trace;

use crate::embed::LogitsProcessor;
use crate::rng::create_rng;

/// Error type for sequence generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Sampling temperature must be finite and positive.
    #[error("Invalid temperature: {0}")]
    InvalidTemperature(f32),

    /// The model returned a score vector of the wrong width.
    #[error("Model returned {actual} scores, expected {expected}")]
    ScoreWidth { expected: usize, actual: usize },

    /// The model returned no scores at all.
    #[error("Model returned an empty score vector")]
    EmptyScores,

    /// The logits processor rejected the step.
    #[error(transparent)]
    Watermark(#[from] WatermarkError),
}

/// A next-token scoring model.
pub trait ScoreModel {
    /// Width of every score vector this model returns.
    fn vocab_size(&self) -> usize;

    /// Raw (unnormalized) scores for the token following `history`.
    fn next_scores(&mut self, history: &[TokenId]) -> Vec<f32>;
}

/// Seeded model that ignores history and scores every token uniformly in [0, 1).
#[derive(Debug, Clone)]
pub struct RandomScoreModel {
    vocab_size: usize,
    rng: Pcg32,
}

impl RandomScoreModel {
    pub fn new(vocab_size: usize, seed: u64) -> Self {
        Self {
            vocab_size,
            rng: create_rng(seed),
        }
    }
}

impl ScoreModel for RandomScoreModel {
    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn next_scores(&mut self, _history: &[TokenId]) -> Vec<f32> {
        (0..self.vocab_size).map(|_| self.rng.gen::<f32>()).collect()
    }
}

/// Token selection from a score vector.
#[derive(Debug, Clone)]
pub enum Sampler {
    /// Highest score wins; ties go to the lowest token id.
    Greedy,
    /// Softmax sampling at a temperature, from a seeded generator.
    Temperature { temperature: f32, rng: Pcg32 },
}

impl Sampler {
    pub fn greedy() -> Self {
        Sampler::Greedy
    }

    /// Creates a seeded temperature sampler.
    pub fn temperature(temperature: f32, seed: u64) -> Result<Self, GenerateError> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(GenerateError::InvalidTemperature(temperature));
        }
        Ok(Sampler::Temperature {
            temperature,
            rng: create_rng(seed),
        })
    }

    /// Picks the next token from `scores`.
    pub fn sample(&mut self, scores: &[f32]) -> Result<TokenId, GenerateError> {
        if scores.is_empty() {
            return Err(GenerateError::EmptyScores);
        }
        match self {
            Sampler::Greedy => Ok(argmax(scores)),
            Sampler::Temperature { temperature, rng } => {
                Ok(sample_softmax(scores, *temperature, rng))
            }
        }
    }
}

fn argmax(scores: &[f32]) -> TokenId {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = idx;
        }
    }
    best as TokenId
}

fn sample_softmax(scores: &[f32], temperature: f32, rng: &mut Pcg32) -> TokenId {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let weights: Vec<f64> = scores
        .iter()
        .map(|&s| (f64::from(s - max) / f64::from(temperature)).exp())
        .collect();
    let total: f64 = weights.iter().sum();

    let mut target = rng.gen::<f64>() * total;
    for (idx, weight) in weights.iter().enumerate() {
        if target < *weight {
            return idx as TokenId;
        }
        target -= weight;
    }
    // Rounding left the target past the last bucket.
    (weights.len() - 1) as TokenId
}

/// Extends `prompt` by `steps` tokens.
///
/// At each step the model scores the current history, the processor (if any)
/// rewrites the scores, the sampler picks a token, and the token is appended.
/// Returns the prompt followed by the generated tokens.
///
/// # Errors
/// * `ScoreWidth` / `EmptyScores` for a misbehaving model.
/// * `Watermark` when the processor fails, e.g. an empty prompt under a
///   seeding scheme that needs a prefix.
pub fn generate<M: ScoreModel + ?Sized>(
    model: &mut M,
    prompt: &[TokenId],
    steps: usize,
    processor: Option<&dyn LogitsProcessor>,
    sampler: &mut Sampler,
) -> Result<Vec<TokenId>, GenerateError> {
    let mut tokens = Vec::with_capacity(prompt.len() + steps);
    tokens.extend_from_slice(prompt);

    for step in 0..steps {
        let scores = model.next_scores(&tokens);
        if scores.len() != model.vocab_size() {
            return Err(GenerateError::ScoreWidth {
                expected: model.vocab_size(),
                actual: scores.len(),
            });
        }

        let mut batch = vec![scores];
        if let Some(processor) = processor {
            processor.process(&[tokens.as_slice()], &mut batch)?;
        }

        let token = sampler.sample(&batch[0])?;
        trace!(step, token, "sampled token");
        tokens.push(token);
    }

    Ok(tokens)
}
