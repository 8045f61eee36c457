//! Watermark config validation.
//!
//! [`validate_params`] collects every problem with a parameter set at once,
//! each tagged with a stable code and the offending field, so tools can report
//! all of them instead of stopping at the first.

use std::fmt;

use crate::config::{SeedingScheme, WatermarkConfigParams};
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};

/// Error type for single-value validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonValidationError {
    /// Human-readable error message.
    pub message: String,
}

impl CommonValidationError {
    /// Creates a new validation error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommonValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommonValidationError {}

/// Validate that a value lies strictly inside (0, 1).
///
/// # Example
/// ```
/// use notemark_spec::validation::validate_open_unit_interval;
///
/// assert!(validate_open_unit_interval("gamma", 0.25).is_ok());
/// assert!(validate_open_unit_interval("gamma", 0.0).is_err());
/// assert!(validate_open_unit_interval("gamma", 1.0).is_err());
/// ```
pub fn validate_open_unit_interval(name: &str, value: f64) -> Result<(), CommonValidationError> {
    if !value.is_finite() {
        return Err(CommonValidationError::new(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    if value <= 0.0 || value >= 1.0 {
        return Err(CommonValidationError::new(format!(
            "{} must be in (0, 1), got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate that a value is neither NaN nor infinite.
pub fn validate_finite(name: &str, value: f64) -> Result<(), CommonValidationError> {
    if !value.is_finite() {
        return Err(CommonValidationError::new(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates raw watermark parameters.
///
/// # Returns
/// * `ValidationResult` with `ok=true` if the parameters form a usable config,
///   possibly with warnings.
/// * `ValidationResult` with `ok=false` and coded errors otherwise.
///
/// # Example
/// ```
/// use notemark_spec::{validate_params, WatermarkConfigParams};
///
/// let params = WatermarkConfigParams { gamma: 1.0, ..Default::default() };
/// let result = validate_params(&params);
/// assert!(!result.is_ok());
/// assert_eq!(result.errors[0].code.code(), "E002");
/// ```
pub fn validate_params(params: &WatermarkConfigParams) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_vocab_size(params, &mut result);
    validate_gamma(params, &mut result);
    validate_delta(params, &mut result);
    validate_seeding_scheme(params, &mut result);

    if result.is_ok() {
        check_warnings(params, &mut result);
    }

    result
}

fn validate_vocab_size(params: &WatermarkConfigParams, result: &mut ValidationResult) {
    if params.vocab_size == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::EmptyVocabulary,
            "vocab_size must be positive, got 0",
            "vocab_size",
        ));
    }
}

fn validate_gamma(params: &WatermarkConfigParams, result: &mut ValidationResult) {
    if let Err(e) = validate_open_unit_interval("gamma", params.gamma) {
        result.add_error(ValidationError::with_path(
            ErrorCode::GammaOutOfRange,
            e.message,
            "gamma",
        ));
    }
}

fn validate_delta(params: &WatermarkConfigParams, result: &mut ValidationResult) {
    if let Err(e) = validate_finite("delta", f64::from(params.delta)) {
        result.add_error(ValidationError::with_path(
            ErrorCode::NonFiniteDelta,
            e.message,
            "delta",
        ));
    }
}

fn validate_seeding_scheme(params: &WatermarkConfigParams, result: &mut ValidationResult) {
    if params.seeding_scheme.parse::<SeedingScheme>().is_err() {
        let supported: Vec<&str> = SeedingScheme::all().iter().map(|s| s.as_str()).collect();
        result.add_error(ValidationError::with_path(
            ErrorCode::UnsupportedSeedingScheme,
            format!(
                "unsupported seeding_scheme '{}' (expected one of: {})",
                params.seeding_scheme,
                supported.join(", ")
            ),
            "seeding_scheme",
        ));
    }
}

/// Checks for suspicious but usable parameter combinations.
fn check_warnings(params: &WatermarkConfigParams, result: &mut ValidationResult) {
    let greenlist_size = (f64::from(params.vocab_size) * params.gamma).floor() as u64;
    if greenlist_size == 0 {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::EmptyGreenlist,
            format!(
                "floor(vocab_size * gamma) is 0 for vocab_size={} and gamma={}",
                params.vocab_size, params.gamma
            ),
            "gamma",
        ));
    }

    if params.delta <= 0.0 {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::NonPositiveDelta,
            format!(
                "delta={} does not bias generation toward green tokens",
                params.delta
            ),
            "delta",
        ));
    }

    if params.hash_key == 0 {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::ZeroHashKey,
            "hash_key=0 seeds every step identically",
            "hash_key",
        ));
    }

    if !params.select_green_tokens {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::LegacyGreenlistSelection,
            "select_green_tokens=false uses the legacy back-slice greenlist",
            "select_green_tokens",
        ));
    }
}
