//! Notemark End-to-End Test Infrastructure
//!
//! This crate holds integration tests that cross the config and watermark
//! crates:
//!
//! - Detection: biased generation is detected, unbiased sequences are not
//! - **Determinism**: greenlists and generated sequences are identical across
//!   runs and threads
//! - Validation: config errors and warnings carry stable codes
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p notemark-tests
//! ```
//!
//! ## Determinism Testing
//!
//! ```rust,ignore
//! use notemark_tests::determinism::verify_determinism;
//!
//! let result = verify_determinism(|| partition(&[3], &config).unwrap().as_slice().to_vec(), 3);
//! result.assert_deterministic();
//! ```

pub mod determinism;
pub mod fixtures;
