//! Determinism testing helpers.
//!
//! Greenlists must be identical wherever they are computed: in the embedder,
//! in the detector, on any thread, in any run. These helpers run a token
//! producing function several times (sequentially or across a thread pool)
//! and report the first position where two runs disagree.
//!
//! # Example
//!
//! ```rust,ignore
//! use notemark_tests::determinism::verify_determinism;
//!
//! let result = verify_determinism(|| generate_tokens(42), 3);
//! assert!(result.is_deterministic);
//! ```

use notemark_spec::{sequence_hash, TokenId};
use rayon::prelude::*;
use std::fmt;

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    /// Number of runs performed.
    pub runs: usize,
    /// Number of tokens in the reference output.
    pub output_len: usize,
    /// BLAKE3 hash of the reference output.
    pub hash: String,
    /// If non-deterministic, the first difference found.
    pub diff_info: Option<DiffInfo>,
}

/// The first position where a run disagreed with the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInfo {
    /// Token position of the difference.
    pub position: usize,
    /// Reference token (`None` past the end of the reference).
    pub expected: Option<TokenId>,
    /// Differing token (`None` past the end of the differing run).
    pub actual: Option<TokenId>,
    /// Which run (0-indexed) produced the differing output.
    pub run_index: usize,
}

impl fmt::Display for DiffInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |t: Option<TokenId>| t.map_or_else(|| "<end>".to_string(), |t| t.to_string());
        write!(
            f,
            "Difference at position {}: expected {}, got {} (run {})",
            self.position,
            show(self.expected),
            show(self.actual),
            self.run_index
        )
    }
}

impl DeterminismResult {
    fn success(runs: usize, output_len: usize, hash: String) -> Self {
        Self {
            is_deterministic: true,
            runs,
            output_len,
            hash,
            diff_info: None,
        }
    }

    fn failure(runs: usize, output_len: usize, hash: String, diff_info: DiffInfo) -> Self {
        Self {
            is_deterministic: false,
            runs,
            output_len,
            hash,
            diff_info: Some(diff_info),
        }
    }

    /// Panic with a detailed message if not deterministic.
    pub fn assert_deterministic(&self) {
        if let Some(diff) = &self.diff_info {
            panic!(
                "Non-deterministic output detected!\n\
                 Runs: {}\n\
                 Output length: {} tokens\n\
                 Hash: {}\n\
                 {}",
                self.runs, self.output_len, self.hash, diff
            );
        }
    }
}

fn find_first_difference(
    expected: &[TokenId],
    actual: &[TokenId],
    run_index: usize,
) -> Option<DiffInfo> {
    let len = expected.len().max(actual.len());
    (0..len)
        .find(|&i| expected.get(i) != actual.get(i))
        .map(|position| DiffInfo {
            position,
            expected: expected.get(position).copied(),
            actual: actual.get(position).copied(),
            run_index,
        })
}

fn compare_runs(reference: &[TokenId], outputs: &[Vec<TokenId>]) -> DeterminismResult {
    let runs = outputs.len() + 1;
    let hash = sequence_hash(reference);
    for (idx, output) in outputs.iter().enumerate() {
        if let Some(diff) = find_first_difference(reference, output, idx + 1) {
            return DeterminismResult::failure(runs, reference.len(), hash, diff);
        }
    }
    DeterminismResult::success(runs, reference.len(), hash)
}

/// Run `generate_fn` `runs` times in sequence and verify all outputs match.
pub fn verify_determinism<F>(generate_fn: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> Vec<TokenId>,
{
    assert!(runs >= 2, "Must run at least 2 times to verify determinism");

    let reference = generate_fn();
    let outputs: Vec<Vec<TokenId>> = (1..runs).map(|_| generate_fn()).collect();
    compare_runs(&reference, &outputs)
}

/// Like [`verify_determinism`], but the repeat runs execute concurrently on
/// the rayon pool.
pub fn verify_parallel_determinism<F>(generate_fn: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> Vec<TokenId> + Sync,
{
    assert!(runs >= 2, "Must run at least 2 times to verify determinism");

    let reference = generate_fn();
    let outputs: Vec<Vec<TokenId>> = (1..runs).into_par_iter().map(|_| generate_fn()).collect();
    compare_runs(&reference, &outputs)
}

/// Declares a test asserting that `$generate` yields the same tokens three
/// times in a row.
#[macro_export]
macro_rules! test_determinism {
    ($name:ident, $generate:expr) => {
        #[test]
        fn $name() {
            let result = $crate::determinism::verify_determinism(|| $generate, 3);
            result.assert_deterministic();
        }
    };
}
