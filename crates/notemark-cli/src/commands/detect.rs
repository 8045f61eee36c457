//! Detect command implementation
//!
//! Scores a token sequence and decides whether it carries the watermark.

use anyhow::{Context, Result};
use colored::Colorize;
use notemark_spec::{DetectionOptions, TokenId};
use notemark_watermark::Detector;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    emit, error_codes, input_error_to_json, input_failure_to_json, validation_warning_to_json,
    watermark_error_to_json, DetectOutput, JsonError,
};
use super::reporting;
use crate::input::{load_config, load_tokens, parse_token_list, InputError};

/// Where the sequence to score comes from.
#[derive(Debug, Clone, Copy)]
pub enum TokenInput<'a> {
    /// JSON token file.
    File(&'a str),
    /// Inline comma separated ids.
    Inline(&'a str),
}

impl TokenInput<'_> {
    fn load(&self) -> Result<Vec<TokenId>, InputError> {
        match self {
            TokenInput::File(path) => load_tokens(Path::new(path)),
            TokenInput::Inline(list) => parse_token_list(list),
        }
    }

    fn file(&self) -> Option<&str> {
        match self {
            TokenInput::File(path) => Some(*path),
            TokenInput::Inline(_) => None,
        }
    }
}

/// Picks the token input from the two mutually exclusive flags.
pub fn token_input<'a>(
    tokens: Option<&'a str>,
    sequence: Option<&'a str>,
) -> Result<TokenInput<'a>, JsonError> {
    match (tokens, sequence) {
        (Some(path), None) => Ok(TokenInput::File(path)),
        (None, Some(list)) => Ok(TokenInput::Inline(list)),
        _ => Err(JsonError::new(
            error_codes::MISSING_INPUT,
            "exactly one of --tokens or --sequence is required",
        )),
    }
}

/// Run the detect command
///
/// # Arguments
/// * `input` - Token file or inline sequence
/// * `config_path` - Optional config file
/// * `options` - Detection options built from the flags
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 when the sequence was scored (watermarked or not), 1 on error
pub fn run(
    input: TokenInput<'_>,
    config_path: Option<&str>,
    options: DetectionOptions,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        run_json(input, config_path, options)
    } else {
        run_human(input, config_path, options)
    }
}

fn run_human(
    input: TokenInput<'_>,
    config_path: Option<&str>,
    options: DetectionOptions,
) -> Result<ExitCode> {
    let loaded = load_config(config_path.map(Path::new)).context("Failed to load config")?;
    let tokens = input.load().context("Failed to load tokens")?;

    reporting::print_config_header(&loaded);
    reporting::print_validation(&loaded.validation);

    println!(
        "\n{} {} tokens (threshold z > {})",
        "Detecting:".cyan().bold(),
        tokens.len(),
        options.z_threshold
    );
    let result = Detector::with_options(&loaded.config, options).detect(&tokens)?;
    reporting::print_detection(&result);

    Ok(ExitCode::SUCCESS)
}

fn run_json(
    input: TokenInput<'_>,
    config_path: Option<&str>,
    options: DetectionOptions,
) -> Result<ExitCode> {
    emit(&detect_output(input, config_path, options))
}

fn detect_output(
    input: TokenInput<'_>,
    config_path: Option<&str>,
    options: DetectionOptions,
) -> DetectOutput {
    let loaded = match load_config(config_path.map(Path::new)) {
        Ok(loaded) => loaded,
        Err(e) => {
            let (errors, warnings) = input_failure_to_json(&e, config_path);
            return DetectOutput::failure(errors, warnings, None);
        }
    };
    let warnings: Vec<_> = loaded
        .validation
        .warnings
        .iter()
        .map(validation_warning_to_json)
        .collect();

    match input.load() {
        Err(e) => DetectOutput::failure(
            vec![input_error_to_json(&e, input.file())],
            warnings,
            Some(loaded.config_hash),
        ),
        Ok(tokens) => match Detector::with_options(&loaded.config, options).detect(&tokens) {
            Ok(result) => DetectOutput::success(result, warnings, loaded.config_hash),
            Err(e) => DetectOutput::failure(
                vec![watermark_error_to_json(&e)],
                warnings,
                Some(loaded.config_hash),
            ),
        },
    }
}
