//! Simulate command implementation
//!
//! Generates a watermarked and an unwatermarked sequence from a seeded random
//! model and detects both.

use anyhow::{Context, Result};
use colored::Colorize;
use notemark_spec::DetectionOptions;
use notemark_watermark::{simulate, GenerateError, SimulationParams, SimulationRun};
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    emit, error_codes, input_error_to_json, input_failure_to_json, validation_warning_to_json,
    watermark_error_to_json, JsonError, SimulateOutput,
};
use super::reporting;
use crate::input::{load_config, parse_token_list};

/// Flags for the simulate command.
#[derive(Debug, Clone)]
pub struct SimulateArgs<'a> {
    pub config_path: Option<&'a str>,
    /// Comma separated prompt token ids
    pub prompt: &'a str,
    pub steps: usize,
    pub seed: u64,
    /// `None` samples greedily
    pub temperature: Option<f32>,
    pub z_threshold: f64,
}

/// Run the simulate command
pub fn run(args: &SimulateArgs<'_>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(args)
    } else {
        run_human(args)
    }
}

fn run_human(args: &SimulateArgs<'_>) -> Result<ExitCode> {
    let loaded = load_config(args.config_path.map(Path::new)).context("Failed to load config")?;
    let prompt = parse_token_list(args.prompt).context("Failed to parse prompt")?;

    reporting::print_config_header(&loaded);
    reporting::print_validation(&loaded.validation);

    let params = SimulationParams {
        prompt,
        steps: args.steps,
        seed: args.seed,
        temperature: args.temperature,
    };
    println!(
        "\n{} {} steps, seed {}, {}",
        "Simulating:".cyan().bold(),
        params.steps,
        params.seed,
        match params.temperature {
            Some(t) => format!("temperature {}", t),
            None => "greedy".to_string(),
        }
    );

    let report = simulate(
        &loaded.config,
        &params,
        &DetectionOptions::with_z_threshold(args.z_threshold),
    )
    .context("Simulation failed")?;

    print_run("Watermarked", &report.watermarked);
    print_run("Unwatermarked", &report.unwatermarked);

    Ok(ExitCode::SUCCESS)
}

fn print_run(label: &str, run: &SimulationRun) {
    println!("\n{}", label.bold());
    println!("  {} {:?}", "Tokens:".dimmed(), run.tokens);
    reporting::print_detection(&run.detection);
}

fn generate_error_to_json(err: &GenerateError) -> JsonError {
    match err {
        GenerateError::Watermark(e) => watermark_error_to_json(e),
        other => JsonError::new(error_codes::GENERATION_ERROR, other.to_string()),
    }
}

fn run_json(args: &SimulateArgs<'_>) -> Result<ExitCode> {
    emit(&simulate_output(args))
}

fn simulate_output(args: &SimulateArgs<'_>) -> SimulateOutput {
    let loaded = match load_config(args.config_path.map(Path::new)) {
        Ok(loaded) => loaded,
        Err(e) => {
            let (errors, warnings) = input_failure_to_json(&e, args.config_path);
            return SimulateOutput::failure(errors, warnings, None);
        }
    };
    let warnings: Vec<_> = loaded
        .validation
        .warnings
        .iter()
        .map(validation_warning_to_json)
        .collect();

    match parse_token_list(args.prompt) {
        Err(e) => SimulateOutput::failure(
            vec![input_error_to_json(&e, None)],
            warnings,
            Some(loaded.config_hash),
        ),
        Ok(prompt) => {
            let params = SimulationParams {
                prompt,
                steps: args.steps,
                seed: args.seed,
                temperature: args.temperature,
            };
            let options = DetectionOptions::with_z_threshold(args.z_threshold);
            match simulate(&loaded.config, &params, &options) {
                Ok(report) => SimulateOutput::success(report, warnings, loaded.config_hash),
                Err(e) => SimulateOutput::failure(
                    vec![generate_error_to_json(&e)],
                    warnings,
                    Some(loaded.config_hash),
                ),
            }
        }
    }
}
