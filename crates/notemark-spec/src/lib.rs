//! Notemark Watermark Spec Library
//!
//! This crate provides the shared data model for greenlist token
//! watermarking: the validated parameter set used by both embedding and
//! detection, the error taxonomy, detection options and results, and
//! canonical hashing for provenance.
//!
//! # Example
//!
//! ```
//! use notemark_spec::{validate_params, WatermarkConfig, WatermarkConfigParams};
//!
//! // Build a config from defaults
//! let config = WatermarkConfig::builder()
//!     .vocab_size(47)
//!     .gamma(0.25)
//!     .delta(2.0)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.greenlist_size(), 11);
//!
//! // Validate raw parameters with coded diagnostics
//! let params = WatermarkConfigParams { vocab_size: 0, ..Default::default() };
//! let result = validate_params(&params);
//! assert!(!result.is_ok());
//! ```
//!
//! # Modules
//!
//! - [`config`]: Watermark parameters, seeding schemes, builder
//! - [`detection`]: Detection options and result types
//! - [`error`]: Error and warning types
//! - [`hash`]: Config fingerprints and sequence hashes
//! - [`validation`]: Parameter validation

pub mod config;
pub mod detection;
pub mod error;
pub mod hash;
pub mod validation;

// Re-export commonly used types at the crate root
pub use config::{
    SeedingScheme, TokenId, WatermarkConfig, WatermarkConfigBuilder, WatermarkConfigParams,
    DEFAULT_DELTA, DEFAULT_GAMMA, DEFAULT_HASH_KEY, DEFAULT_VOCAB_SIZE, DEFAULT_Z_THRESHOLD,
};
pub use detection::{DetectionOptions, DetectionResult};
pub use error::{
    ConfigLoadError, ErrorCode, ValidationError, ValidationResult, ValidationWarning,
    WarningCode, WatermarkError,
};
pub use hash::{config_hash, sequence_hash};
pub use validation::validate_params;
