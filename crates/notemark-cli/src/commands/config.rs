//! Config command implementation
//!
//! Validates a watermark config and prints its derived values.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    input_failure_to_json, to_json_string, validation_warning_to_json, CommandOutput,
    ConfigResult,
};
use super::reporting;
use crate::input::load_config;

/// Run the config command
///
/// # Arguments
/// * `config_path` - Optional config file (defaults when absent)
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(config_path)
    } else {
        run_human(config_path)
    }
}

fn run_human(config_path: Option<&str>) -> Result<ExitCode> {
    let loaded = match load_config(config_path.map(Path::new)) {
        Ok(loaded) => loaded,
        Err(e) => {
            reporting::print_input_error(&e);
            return Ok(ExitCode::from(1));
        }
    };
    let config = &loaded.config;

    reporting::print_config_header(&loaded);
    println!("\n{}", "Parameters:".cyan().bold());
    println!("  {} {}", "vocab_size:".dimmed(), config.vocab_size());
    println!("  {} {}", "gamma:".dimmed(), config.gamma());
    println!("  {} {}", "delta:".dimmed(), config.delta());
    println!("  {} {}", "hash_key:".dimmed(), config.hash_key());
    println!("  {} {}", "seeding_scheme:".dimmed(), config.seeding_scheme());
    println!(
        "  {} {}",
        "select_green_tokens:".dimmed(),
        config.select_green_tokens()
    );

    println!("\n{}", "Derived:".cyan().bold());
    println!("  {} {}", "greenlist size:".dimmed(), config.green_set_len());
    println!("  {} {}", "min prefix length:".dimmed(), config.min_prefix_len());

    reporting::print_validation(&loaded.validation);

    println!("\n{} config is valid", "OK".green().bold());
    Ok(ExitCode::SUCCESS)
}

fn run_json(config_path: Option<&str>) -> Result<ExitCode> {
    let (output, code) = match load_config(config_path.map(Path::new)) {
        Ok(loaded) => {
            let warnings = loaded
                .validation
                .warnings
                .iter()
                .map(validation_warning_to_json)
                .collect();
            let result = ConfigResult {
                source: loaded.source.to_string(),
                params: loaded.config.to_params(),
                green_set_len: loaded.config.green_set_len(),
                min_prefix_len: loaded.config.min_prefix_len(),
            };
            (
                CommandOutput::success(result, warnings, loaded.config_hash),
                ExitCode::SUCCESS,
            )
        }
        Err(e) => {
            let (errors, warnings) = input_failure_to_json(&e, config_path);
            (
                CommandOutput::<ConfigResult>::failure(errors, warnings, None),
                ExitCode::from(1),
            )
        }
    };

    println!("{}", to_json_string(&output)?);
    Ok(code)
}
