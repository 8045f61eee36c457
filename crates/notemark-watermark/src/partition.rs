//! Greenlist partitioning.
//!
//! The greenlist for position `i` is a slice of a seeded permutation of the
//! vocabulary, where the seed depends only on the config and the tokens before
//! `i`. Embedding and detection both go through [`partition`], so they agree
//! on every greenlist bit for bit.

use notemark_spec::{TokenId, WatermarkConfig, WatermarkError};
use rand::Rng;

use crate::rng::{create_rng, greenlist_seed};

/// The set of tokens favored at one generation step.
///
/// Keeps the ids in permutation order and a membership mask over the whole
/// vocabulary for constant-time lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greenlist {
    ids: Vec<TokenId>,
    mask: Vec<bool>,
}

impl Greenlist {
    fn from_ids(ids: Vec<TokenId>, vocab_size: usize) -> Self {
        let mut mask = vec![false; vocab_size];
        for &id in &ids {
            mask[id as usize] = true;
        }
        Self { ids, mask }
    }

    /// Returns true if `token` is green. Tokens outside the vocabulary never are.
    pub fn contains(&self, token: TokenId) -> bool {
        self.mask.get(token as usize).copied().unwrap_or(false)
    }

    /// Number of green tokens.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Green ids in permutation order.
    pub fn as_slice(&self) -> &[TokenId] {
        &self.ids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TokenId> {
        self.ids.iter()
    }

    /// Green ids in ascending order.
    pub fn to_sorted_vec(&self) -> Vec<TokenId> {
        let mut ids = self.ids.clone();
        ids.sort_unstable();
        ids
    }

    /// Size of the vocabulary this greenlist was drawn from.
    pub fn vocab_size(&self) -> usize {
        self.mask.len()
    }
}

impl<'a> IntoIterator for &'a Greenlist {
    type Item = &'a TokenId;
    type IntoIter = std::slice::Iter<'a, TokenId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Produces a seeded permutation of `[0, vocab_size)`.
///
/// Fisher-Yates, walking from the back, with each swap index drawn as a `u32`
/// so the sequence of draws does not depend on the platform's pointer width.
///
/// # Example
/// ```
/// use notemark_watermark::partition::vocab_permutation;
///
/// let perm = vocab_permutation(1234, 47);
/// assert_eq!(perm, vocab_permutation(1234, 47));
/// let mut sorted = perm.clone();
/// sorted.sort_unstable();
/// assert_eq!(sorted, (0..47).collect::<Vec<u32>>());
/// ```
pub fn vocab_permutation(seed: u64, vocab_size: u32) -> Vec<TokenId> {
    let mut rng = create_rng(seed);
    let mut permutation: Vec<TokenId> = (0..vocab_size).collect();
    for i in (1..vocab_size).rev() {
        let j = rng.gen_range(0..=i);
        permutation.swap(i as usize, j as usize);
    }
    permutation
}

/// Computes the greenlist for the position following `prefix`.
///
/// With `select_green_tokens` the greenlist is the first
/// `floor(vocab_size * gamma)` elements of the seeded permutation; otherwise
/// it is the remaining back slice (legacy convention).
///
/// # Errors
/// `InsufficientPrefix` when `prefix` is shorter than the seeding scheme needs.
pub fn partition(prefix: &[TokenId], config: &WatermarkConfig) -> Result<Greenlist, WatermarkError> {
    let seed = greenlist_seed(prefix, config)?;
    let mut permutation = vocab_permutation(seed, config.vocab_size());

    let split = config.greenlist_size();
    let ids = if config.select_green_tokens() {
        permutation.truncate(split);
        permutation
    } else {
        permutation.split_off(split)
    };

    Ok(Greenlist::from_ids(ids, config.vocab_size() as usize))
}
