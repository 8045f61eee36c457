//! JSON output types for machine-readable CLI output.
//!
//! Every command that accepts `--json` prints exactly one of these envelopes
//! to stdout: `success`, the diagnostics, and a command-specific `result`.

use notemark_spec::{
    DetectionResult, TokenId, ValidationError, ValidationWarning, WatermarkConfigParams,
    WatermarkError,
};
use notemark_watermark::SimulationReport;
use serde::{Deserialize, Serialize};
use std::process::ExitCode;

use crate::input::InputError;

/// Error codes for CLI operations.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: CLI_XXX for CLI-level errors; validation and watermark errors pass
/// their own codes through (`E001`, `WM_003`, ...).
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// JSON parse error
    pub const JSON_PARSE: &str = "CLI_002";
    /// Config failed validation
    pub const INVALID_CONFIG: &str = "CLI_003";
    /// Token list could not be parsed
    pub const INVALID_TOKENS: &str = "CLI_004";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_005";
    /// Neither or both of the token inputs were given
    pub const MISSING_INPUT: &str = "CLI_006";
    /// Generation error (wraps sampler and model errors)
    pub const GENERATION_ERROR: &str = "CLI_007";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "E001", "WM_002")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// JSON path to the problematic field (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            file: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// A structured warning in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonWarning {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl JsonWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Envelope shared by every `--json` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandOutput<T> {
    /// Whether the command completed
    pub success: bool,
    pub errors: Vec<JsonError>,
    pub warnings: Vec<JsonWarning>,
    /// BLAKE3 fingerprint of the config used (absent if it never loaded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> CommandOutput<T> {
    pub fn success(result: T, warnings: Vec<JsonWarning>, config_hash: String) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            config_hash: Some(config_hash),
            result: Some(result),
        }
    }

    pub fn failure(
        errors: Vec<JsonError>,
        warnings: Vec<JsonWarning>,
        config_hash: Option<String>,
    ) -> Self {
        Self {
            success: false,
            errors,
            warnings,
            config_hash,
            result: None,
        }
    }
}

/// Result of `notemark config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigResult {
    /// Where the config came from ("defaults" or a file path)
    pub source: String,
    /// Effective parameters, defaults filled in
    pub params: WatermarkConfigParams,
    /// Number of tokens in each greenlist
    pub green_set_len: usize,
    /// Tokens of history the seeding scheme consumes
    pub min_prefix_len: usize,
}

/// Result of `notemark partition`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionResult {
    pub prefix: Vec<TokenId>,
    /// Seed the generator was built from
    pub seed: u64,
    /// Greenlist in permutation order
    pub greenlist: Vec<TokenId>,
}

/// Result of `notemark detect`.
pub type DetectOutput = CommandOutput<DetectionResult>;

/// Result of `notemark simulate`.
pub type SimulateOutput = CommandOutput<SimulationReport>;

/// Converts an InputError to a JsonError.
pub fn input_error_to_json(err: &InputError, file: Option<&str>) -> JsonError {
    let mut error = JsonError::new(err.code(), err.to_string());
    if let Some(f) = file {
        error = error.with_file(f);
    }
    error
}

/// Converts a WatermarkError to a JsonError, keeping its `WM_*` code.
pub fn watermark_error_to_json(err: &WatermarkError) -> JsonError {
    JsonError::new(err.code(), err.to_string())
}

/// Converts a ValidationError to a JsonError.
pub fn validation_error_to_json(err: &ValidationError) -> JsonError {
    let mut error = JsonError::new(err.code.to_string(), &err.message);
    if let Some(ref path) = err.path {
        error = error.with_path(path);
    }
    error
}

/// Converts a ValidationWarning to a JsonWarning.
pub fn validation_warning_to_json(warn: &ValidationWarning) -> JsonWarning {
    let mut warning = JsonWarning::new(warn.code.to_string(), &warn.message);
    if let Some(ref path) = warn.path {
        warning = warning.with_path(path);
    }
    warning
}

/// Errors and warnings for an input failure. Config validation failures
/// expand into their individual `E*` diagnostics.
pub fn input_failure_to_json(
    err: &InputError,
    file: Option<&str>,
) -> (Vec<JsonError>, Vec<JsonWarning>) {
    match err {
        InputError::InvalidConfig { validation, .. } if !validation.errors.is_empty() => (
            validation.errors.iter().map(validation_error_to_json).collect(),
            validation
                .warnings
                .iter()
                .map(validation_warning_to_json)
                .collect(),
        ),
        _ => (vec![input_error_to_json(err, file)], Vec::new()),
    }
}

/// Serializes an output envelope.
pub fn to_json_string<T: Serialize>(output: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(output).map_err(|e| {
        anyhow::anyhow!("{}: failed to serialize output: {}", error_codes::JSON_SERIALIZE, e)
    })
}

/// Prints an envelope to stdout. Exit code 1 when it reports failure.
pub fn emit<T: Serialize>(output: &CommandOutput<T>) -> anyhow::Result<ExitCode> {
    println!("{}", to_json_string(output)?);
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notemark_spec::{ErrorCode, ValidationResult, WarningCode};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_serialization_skips_empty_fields() {
        let error = JsonError::new(error_codes::FILE_READ, "missing");
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"code":"CLI_001","message":"missing"}"#);
    }

    #[test]
    fn test_validation_error_keeps_code_and_path() {
        let err = ValidationError::with_path(ErrorCode::GammaOutOfRange, "bad gamma", "gamma");
        let json = validation_error_to_json(&err);
        assert_eq!(json.code, "E002");
        assert_eq!(json.path.as_deref(), Some("gamma"));
    }

    #[test]
    fn test_watermark_error_code_passthrough() {
        let err = WatermarkError::InsufficientTokensScored {
            min_prefix_len: 1,
            sequence_len: 1,
        };
        assert_eq!(watermark_error_to_json(&err).code, "WM_003");
    }

    #[test]
    fn test_invalid_config_expands_diagnostics() {
        let mut validation = ValidationResult::success();
        validation.add_error(ValidationError::new(ErrorCode::EmptyVocabulary, "empty"));
        validation.add_warning(ValidationWarning::new(WarningCode::ZeroHashKey, "zero"));
        let err = InputError::InvalidConfig {
            source: crate::input::ConfigSource::Default,
            validation,
            error: WatermarkError::InvalidConfig("empty".to_string()),
        };

        let (errors, warnings) = input_failure_to_json(&err, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "E001");
        assert_eq!(warnings[0].code, "W003");
    }

    #[test]
    fn test_failure_envelope() {
        let output: CommandOutput<PartitionResult> =
            CommandOutput::failure(vec![JsonError::new("CLI_004", "bad")], Vec::new(), None);
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("result").is_none());
        assert!(value.get("config_hash").is_none());
    }
}
