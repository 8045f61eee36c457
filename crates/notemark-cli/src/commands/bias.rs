//! Bias command implementation
//!
//! Applies the greenlist bias to a score matrix read from disk and prints the
//! biased matrix as JSON.

use anyhow::{Context, Result};
use notemark_watermark::bias;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::to_json_string;
use crate::input::{load_config, load_histories, load_scores};

/// Run the bias command
///
/// # Arguments
/// * `scores_path` - JSON `[[f32]]`, one row per batch entry
/// * `histories_path` - JSON `[[u32]]`, the token history of each row
/// * `config_path` - Optional config file
pub fn run(scores_path: &str, histories_path: &str, config_path: Option<&str>) -> Result<ExitCode> {
    let loaded = load_config(config_path.map(Path::new)).context("Failed to load config")?;
    let scores = load_scores(Path::new(scores_path))?;
    let histories = load_histories(Path::new(histories_path))?;

    let biased = bias(scores, &histories, &loaded.config)
        .with_context(|| format!("Failed to bias scores from {}", scores_path))?;

    println!("{}", to_json_string(&biased)?);
    Ok(ExitCode::SUCCESS)
}
