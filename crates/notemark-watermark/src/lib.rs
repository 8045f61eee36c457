//! Notemark Watermark Engine - Greenlist Token Watermarking
//!
//! This crate embeds a statistically detectable pattern into autoregressive
//! token generation and later tests finished sequences for it, without access
//! to the generation process.
//!
//! # How it works
//!
//! - **Partitioning**: the tokens before position `i` seed a PCG32 generator,
//!   which shuffles the vocabulary; a fixed slice of that permutation is the
//!   greenlist for position `i`.
//! - **Embedding**: before sampling, `delta` is added to the scores of green
//!   tokens, so generated sequences over-represent green tokens.
//! - **Detection**: the greenlists are replayed over a finished sequence and
//!   the green count is compared with the `gamma` null rate by a one-sided
//!   z-test.
//!
//! # Determinism
//!
//! A greenlist depends only on the config and the prefix. Every partition call
//! builds its own generator from an explicit seed, so embedding and detection
//! agree bit for bit and both are safe to run across threads.
//!
//! # Example
//!
//! ```
//! use notemark_spec::{DetectionOptions, WatermarkConfig};
//! use notemark_watermark::embed::WatermarkLogitsProcessor;
//! use notemark_watermark::generate::{generate, RandomScoreModel, Sampler};
//! use notemark_watermark::detect::detect;
//!
//! let config = WatermarkConfig::default();
//! let processor = WatermarkLogitsProcessor::new(config.clone());
//! let mut model = RandomScoreModel::new(47, 7);
//!
//! let tokens = generate(&mut model, &[1], 100, Some(&processor), &mut Sampler::greedy()).unwrap();
//! let result = detect(&tokens, &config, 4.0).unwrap();
//! assert!(result.prediction);
//! ```
//!
//! # Module Structure
//!
//! - [`rng`]: Seed derivation and generator construction
//! - [`partition`]: Greenlist computation
//! - [`embed`]: Logits biasing and the logits-processor seam
//! - [`detect`]: Sequence scoring and the hypothesis test
//! - [`stats`]: z-score and p-value
//! - [`generate`]: Sampling loop over an external score model
//! - [`simulate`]: Watermarked vs unwatermarked comparison runs

pub mod detect;
pub mod embed;
pub mod generate;
pub mod partition;
pub mod rng;
pub mod simulate;
pub mod stats;

pub use detect::{detect, Detector, SequenceScore};
pub use embed::{bias, bias_in_place, LogitsProcessor, WatermarkLogitsProcessor};
pub use generate::{generate, GenerateError, RandomScoreModel, Sampler, ScoreModel};
pub use partition::{partition, vocab_permutation, Greenlist};
pub use simulate::{simulate, SimulationParams, SimulationReport, SimulationRun};
pub use stats::{compute_p_value, compute_z_score};
