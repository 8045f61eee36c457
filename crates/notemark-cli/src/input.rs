//! Loading configs, token sequences and score matrices from disk.
//!
//! Configs are JSON parameter files (see `WatermarkConfigParams`); when no
//! path is given the default parameter set is used. Token files hold either a
//! bare JSON array of ids or an object with a `tokens` array.

use notemark_spec::{
    config_hash, validate_params, TokenId, ValidationResult, WatermarkConfig,
    WatermarkConfigParams, WatermarkError,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::commands::json_output::error_codes;

/// Where a config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults.
    Default,
    /// A JSON config file.
    File(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "defaults"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A config plus everything learned while loading it.
#[derive(Debug)]
pub struct LoadedConfig {
    /// The validated config.
    pub config: WatermarkConfig,
    /// Where it came from.
    pub source: ConfigSource,
    /// BLAKE3 fingerprint of the canonical config.
    pub config_hash: String,
    /// Validation diagnostics (errors are always empty here).
    pub validation: ValidationResult,
}

/// Errors that can occur while loading inputs.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parsing failed.
    JsonParse { path: PathBuf, message: String },

    /// Config parameters did not validate.
    InvalidConfig {
        source: ConfigSource,
        validation: ValidationResult,
        error: WatermarkError,
    },

    /// A token list could not be parsed.
    InvalidTokens { message: String },

    /// The validated config could not be fingerprinted.
    ConfigHash { source: serde_json::Error },
}

impl InputError {
    /// Stable CLI error code for JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            InputError::FileRead { .. } => error_codes::FILE_READ,
            InputError::JsonParse { .. } => error_codes::JSON_PARSE,
            InputError::InvalidConfig { .. } => error_codes::INVALID_CONFIG,
            InputError::InvalidTokens { .. } => error_codes::INVALID_TOKENS,
            InputError::ConfigHash { .. } => error_codes::JSON_SERIALIZE,
        }
    }
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            InputError::JsonParse { path, message } => {
                write!(f, "failed to parse {}: {}", path.display(), message)
            }
            InputError::InvalidConfig { source, error, .. } => {
                write!(f, "invalid config ({}): {}", source, error)
            }
            InputError::InvalidTokens { message } => write!(f, "invalid tokens: {}", message),
            InputError::ConfigHash { source } => write!(f, "failed to hash config: {}", source),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            InputError::InvalidConfig { error, .. } => Some(error),
            InputError::ConfigHash { source } => Some(source),
            _ => None,
        }
    }
}

fn read_file(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_json<T: for<'de> Deserialize<'de>>(path: &Path, content: &str) -> Result<T, InputError> {
    serde_json::from_str(content).map_err(|e| InputError::JsonParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reads raw config parameters, falling back to defaults when `path` is None.
pub fn load_params(path: Option<&Path>) -> Result<(WatermarkConfigParams, ConfigSource), InputError> {
    match path {
        None => Ok((WatermarkConfigParams::default(), ConfigSource::Default)),
        Some(path) => {
            let content = read_file(path)?;
            let params = parse_json(path, &content)?;
            Ok((params, ConfigSource::File(path.to_path_buf())))
        }
    }
}

/// Loads and validates a config.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, InputError> {
    let (params, source) = load_params(path)?;
    let validation = validate_params(&params);

    let config = match WatermarkConfig::try_from(params) {
        Ok(config) => config,
        Err(error) => {
            return Err(InputError::InvalidConfig {
                source,
                validation,
                error,
            })
        }
    };
    let config_hash = config_hash(&config).map_err(|source| InputError::ConfigHash { source })?;

    Ok(LoadedConfig {
        config,
        source,
        config_hash,
        validation,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenFile {
    Bare(Vec<TokenId>),
    Wrapped { tokens: Vec<TokenId> },
}

/// Loads a token sequence from a JSON file.
pub fn load_tokens(path: &Path) -> Result<Vec<TokenId>, InputError> {
    let content = read_file(path)?;
    let file: TokenFile = parse_json(path, &content)?;
    Ok(match file {
        TokenFile::Bare(tokens) => tokens,
        TokenFile::Wrapped { tokens } => tokens,
    })
}

/// Parses a comma or whitespace separated token list such as `"3, 5 7"`.
pub fn parse_token_list(input: &str) -> Result<Vec<TokenId>, InputError> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<TokenId>().map_err(|e| InputError::InvalidTokens {
                message: format!("'{}' is not a token id ({})", part, e),
            })
        })
        .collect()
}

/// Loads a score matrix (`[[f32]]`) from a JSON file.
pub fn load_scores(path: &Path) -> Result<Vec<Vec<f32>>, InputError> {
    let content = read_file(path)?;
    parse_json(path, &content)
}

/// Loads a batch of token histories (`[[u32]]`) from a JSON file.
pub fn load_histories(path: &Path) -> Result<Vec<Vec<TokenId>>, InputError> {
    let content = read_file(path)?;
    parse_json(path, &content)
}
