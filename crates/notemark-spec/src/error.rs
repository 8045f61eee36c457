//! Error types for watermark configuration, embedding and detection.

use thiserror::Error;

/// Error codes for config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E001: Vocabulary size is zero
    EmptyVocabulary,
    /// E002: Gamma outside the open interval (0, 1)
    GammaOutOfRange,
    /// E003: Delta is NaN or infinite
    NonFiniteDelta,
    /// E004: Seeding scheme is not recognized
    UnsupportedSeedingScheme,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::EmptyVocabulary => "E001",
            ErrorCode::GammaOutOfRange => "E002",
            ErrorCode::NonFiniteDelta => "E003",
            ErrorCode::UnsupportedSeedingScheme => "E004",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: floor(vocab_size * gamma) is zero
    EmptyGreenlist,
    /// W002: Delta does not favor green tokens
    NonPositiveDelta,
    /// W003: Hash key of zero seeds every step identically
    ZeroHashKey,
    /// W004: Legacy inverse greenlist convention
    LegacyGreenlistSelection,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::EmptyGreenlist => "W001",
            WarningCode::NonPositiveDelta => "W002",
            WarningCode::ZeroHashKey => "W003",
            WarningCode::LegacyGreenlistSelection => "W004",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Config field the error refers to (e.g., "gamma").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Config field the warning refers to.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a field path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of config validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.ok {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Errors raised by the partitioner, embedder and detector.
///
/// Every variant is a deterministic input-validation failure: the same inputs
/// always produce the same error, and none of them is retryable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WatermarkError {
    /// Malformed config parameters.
    #[error("invalid watermark config: {0}")]
    InvalidConfig(String),

    /// A history is shorter than the seeding scheme requires.
    #[error("seeding scheme {scheme} requires a prefix of at least {required} token(s), got {actual}")]
    InsufficientPrefix {
        /// Seeding scheme name.
        scheme: &'static str,
        /// Minimum prefix length for the scheme.
        required: usize,
        /// Length of the prefix that was supplied.
        actual: usize,
    },

    /// A sequence leaves no tokens to score after the seeding prefix.
    #[error(
        "must have at least 1 token to score after the first min_prefix_len={min_prefix_len} \
         tokens required by the seeding scheme, got a sequence of {sequence_len}"
    )]
    InsufficientTokensScored {
        /// Minimum prefix length for the scheme.
        min_prefix_len: usize,
        /// Length of the sequence that was supplied.
        sequence_len: usize,
    },

    /// A seeding scheme other than `simple_1` was requested.
    #[error("unsupported seeding scheme: {0}")]
    UnsupportedSeedingScheme(String),

    /// A detection variant that has no implementation was requested.
    #[error("unimplemented detection variant: {0}")]
    UnimplementedVariant(&'static str),

    /// Score matrix and histories disagree on shape.
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which dimension disagreed.
        what: &'static str,
        /// Expected extent.
        expected: usize,
        /// Supplied extent.
        actual: usize,
    },
}

impl WatermarkError {
    /// Stable error code for reporting (e.g., "WM_001").
    pub fn code(&self) -> &'static str {
        match self {
            WatermarkError::InvalidConfig(_) => "WM_001",
            WatermarkError::InsufficientPrefix { .. } => "WM_002",
            WatermarkError::InsufficientTokensScored { .. } => "WM_003",
            WatermarkError::UnsupportedSeedingScheme(_) => "WM_004",
            WatermarkError::UnimplementedVariant(_) => "WM_005",
            WatermarkError::ShapeMismatch { .. } => "WM_006",
        }
    }

    /// Returns true for errors that mean the config itself must be fixed.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            WatermarkError::InvalidConfig(_) | WatermarkError::UnsupportedSeedingScheme(_)
        )
    }
}

/// Errors from loading a config file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsed, but the parameters are not a valid config.
    #[error(transparent)]
    Invalid(#[from] WatermarkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::EmptyVocabulary.code(), "E001");
        assert_eq!(ErrorCode::GammaOutOfRange.code(), "E002");
        assert_eq!(ErrorCode::UnsupportedSeedingScheme.code(), "E004");
    }

    #[test]
    fn test_warning_codes() {
        assert_eq!(WarningCode::EmptyGreenlist.code(), "W001");
        assert_eq!(WarningCode::LegacyGreenlistSelection.code(), "W004");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(ErrorCode::EmptyVocabulary, "vocab_size must be positive");
        assert_eq!(err.to_string(), "E001: vocab_size must be positive");

        let err_with_path = ValidationError::with_path(
            ErrorCode::GammaOutOfRange,
            "gamma must be in (0, 1), got 1",
            "gamma",
        );
        assert_eq!(
            err_with_path.to_string(),
            "E002: gamma must be in (0, 1), got 1 (at gamma)"
        );
    }

    #[test]
    fn test_validation_result() {
        let mut result = ValidationResult::success();
        assert!(result.is_ok());

        result.add_error(ValidationError::new(ErrorCode::NonFiniteDelta, "delta is NaN"));
        assert!(!result.is_ok());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_watermark_error_codes() {
        assert_eq!(WatermarkError::InvalidConfig("x".into()).code(), "WM_001");
        assert_eq!(
            WatermarkError::UnimplementedVariant("ignore_repeated_bigrams").code(),
            "WM_005"
        );
        assert!(WatermarkError::UnsupportedSeedingScheme("lefthash".into()).is_config_error());
        assert!(!WatermarkError::InsufficientPrefix {
            scheme: "simple_1",
            required: 1,
            actual: 0
        }
        .is_config_error());
    }

    #[test]
    fn test_insufficient_tokens_message() {
        let err = WatermarkError::InsufficientTokensScored {
            min_prefix_len: 1,
            sequence_len: 1,
        };
        assert!(err.to_string().contains("min_prefix_len=1"));
    }
}
