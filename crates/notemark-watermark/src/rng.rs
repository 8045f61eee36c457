//! Deterministic RNG using PCG32 seeded from the token history.
//!
//! Every greenlist is drawn from a generator built fresh from an explicit
//! seed. No generator is ever shared or reseeded in place, so partitioning is
//! safe to run concurrently and gives identical results in the embedder and
//! the detector.

use notemark_spec::{SeedingScheme, TokenId, WatermarkConfig, WatermarkError};
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 64-bit seed.
pub fn create_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Derives the seed for the greenlist that follows `prefix`.
///
/// For `simple_1` the seed is `hash_key * last_token` with 64-bit wrapping
/// multiplication.
///
/// # Errors
/// `InsufficientPrefix` when `prefix` is shorter than the scheme's minimum.
///
/// # Example
/// ```
/// use notemark_spec::WatermarkConfig;
/// use notemark_watermark::rng::greenlist_seed;
///
/// let config = WatermarkConfig::default();
/// assert_eq!(greenlist_seed(&[9, 3], &config).unwrap(), 15_485_863 * 3);
/// assert!(greenlist_seed(&[], &config).is_err());
/// ```
pub fn greenlist_seed(prefix: &[TokenId], config: &WatermarkConfig) -> Result<u64, WatermarkError> {
    let scheme = config.seeding_scheme();
    let required = scheme.min_prefix_len();
    if prefix.len() < required {
        return Err(WatermarkError::InsufficientPrefix {
            scheme: scheme.as_str(),
            required,
            actual: prefix.len(),
        });
    }

    match scheme {
        SeedingScheme::Simple1 => {
            let prev_token = prefix[prefix.len() - 1];
            Ok(config.hash_key().wrapping_mul(u64::from(prev_token)))
        }
    }
}

/// Derives an independent seed for a named component from a base seed.
///
/// ```text
/// component_seed = truncate_u64(BLAKE3(base_seed || key))
/// ```
pub fn derive_component_seed(base_seed: u64, key: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&base_seed.to_le_bytes());
    hasher.update(key.as_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
