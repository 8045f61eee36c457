//! Token sequence fixtures.

use notemark_spec::{TokenId, WatermarkConfig};
use notemark_watermark::partition;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Uniformly random tokens from the config's vocabulary, independent of any
/// greenlist.
pub fn random_sequence(config: &WatermarkConfig, len: usize, seed: u64) -> Vec<TokenId> {
    let mut rng = Pcg32::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.gen_range(0..config.vocab_size()))
        .collect()
}

/// A sequence whose every scored token is green: each next token is the
/// first entry of the greenlist its prefix induces.
pub fn all_green_sequence(config: &WatermarkConfig, start: TokenId, len: usize) -> Vec<TokenId> {
    let mut tokens = vec![start];
    while tokens.len() < len {
        let greenlist = partition(&tokens, config).expect("prefix is non-empty");
        tokens.push(greenlist.as_slice()[0]);
    }
    tokens
}

/// A sequence with exactly `green` green tokens among its scored positions.
/// The green tokens come first.
pub fn sequence_with_green_count(
    config: &WatermarkConfig,
    scored: usize,
    green: usize,
) -> Vec<TokenId> {
    assert!(green <= scored);
    let mut tokens = vec![0];
    for idx in 0..scored {
        let greenlist = partition(&tokens, config).expect("prefix is non-empty");
        let next = if idx < green {
            greenlist.as_slice()[0]
        } else {
            (0..config.vocab_size())
                .find(|&t| !greenlist.contains(t))
                .expect("greenlist never covers the whole vocabulary")
        };
        tokens.push(next);
    }
    tokens
}
