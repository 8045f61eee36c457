//! Shared human-readable output helpers.

use colored::Colorize;
use notemark_spec::{DetectionResult, ValidationResult};

use crate::input::{InputError, LoadedConfig};

/// Prints the config source and fingerprint header.
pub(crate) fn print_config_header(loaded: &LoadedConfig) {
    println!("{} {}", "Config:".dimmed(), loaded.source);
    println!("{} {}", "Config hash:".dimmed(), loaded.config_hash);
}

/// Prints validation errors and warnings.
pub(crate) fn print_validation(validation: &ValidationResult) {
    if !validation.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "x".red(), error);
        }
    }
    if !validation.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }
}

/// Prints an input failure. Invalid configs list each validation error.
pub(crate) fn print_input_error(err: &InputError) {
    match err {
        InputError::InvalidConfig { validation, .. } if !validation.errors.is_empty() => {
            println!("{} {}", "Invalid config:".red().bold(), err);
            print_validation(validation);
        }
        _ => println!("{} {}", "Error:".red().bold(), err),
    }
}

/// Prints one detection result.
pub(crate) fn print_detection(result: &DetectionResult) {
    println!(
        "  {} {}/{} ({:.1}%)",
        "Green tokens:".dimmed(),
        result.num_green_tokens,
        result.num_tokens_scored,
        result.green_fraction * 100.0
    );
    println!("  {} {:.4}", "z-score:".dimmed(), result.z_score);
    println!("  {} {:.6}", "p-value:".dimmed(), result.p_value);
    match result.confidence {
        Some(confidence) => println!(
            "  {} {} (confidence {:.4})",
            "Prediction:".dimmed(),
            "watermarked".green().bold(),
            confidence
        ),
        None => println!(
            "  {} {}",
            "Prediction:".dimmed(),
            "not watermarked".yellow()
        ),
    }
    if let Some(mask) = &result.green_token_mask {
        let marks: String = mask.iter().map(|&g| if g { 'G' } else { '.' }).collect();
        println!("  {} {}", "Mask:".dimmed(), marks);
    }
}
