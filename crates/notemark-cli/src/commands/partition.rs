//! Partition command implementation
//!
//! Prints the greenlist a prefix induces.

use anyhow::{Context, Result};
use colored::Colorize;
use notemark_watermark::partition;
use notemark_watermark::rng::greenlist_seed;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    emit, input_error_to_json, input_failure_to_json, validation_warning_to_json,
    watermark_error_to_json, CommandOutput, PartitionResult,
};
use super::reporting;
use crate::input::{load_config, parse_token_list};

/// Run the partition command
///
/// # Arguments
/// * `prefix` - Comma separated token ids preceding the position
/// * `config_path` - Optional config file
/// * `json_output` - Whether to output machine-readable JSON
pub fn run(prefix: &str, config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(prefix, config_path)
    } else {
        run_human(prefix, config_path)
    }
}

fn run_human(prefix: &str, config_path: Option<&str>) -> Result<ExitCode> {
    let loaded = load_config(config_path.map(Path::new)).context("Failed to load config")?;
    let prefix = parse_token_list(prefix)?;
    let config = &loaded.config;

    reporting::print_config_header(&loaded);

    let seed = greenlist_seed(&prefix, config)?;
    let greenlist = partition(&prefix, config)?;

    println!("{} {:?}", "Prefix:".cyan().bold(), prefix);
    println!("{} {}", "Seed:".dimmed(), seed);
    println!(
        "{} {} of {} tokens",
        "Greenlist:".cyan().bold(),
        greenlist.len(),
        config.vocab_size()
    );
    println!("  {:?}", greenlist.as_slice());
    println!("  {} {:?}", "sorted:".dimmed(), greenlist.to_sorted_vec());

    Ok(ExitCode::SUCCESS)
}

fn run_json(prefix: &str, config_path: Option<&str>) -> Result<ExitCode> {
    emit(&partition_output(prefix, config_path))
}

fn partition_output(prefix: &str, config_path: Option<&str>) -> CommandOutput<PartitionResult> {
    let loaded = match load_config(config_path.map(Path::new)) {
        Ok(loaded) => loaded,
        Err(e) => {
            let (errors, warnings) = input_failure_to_json(&e, config_path);
            return CommandOutput::failure(errors, warnings, None);
        }
    };
    let warnings: Vec<_> = loaded
        .validation
        .warnings
        .iter()
        .map(validation_warning_to_json)
        .collect();

    match parse_token_list(prefix) {
        Err(e) => CommandOutput::failure(
            vec![input_error_to_json(&e, None)],
            warnings,
            Some(loaded.config_hash),
        ),
        Ok(prefix) => {
            let computed = greenlist_seed(&prefix, &loaded.config)
                .and_then(|seed| Ok((seed, partition(&prefix, &loaded.config)?)));
            match computed {
                Ok((seed, greenlist)) => CommandOutput::success(
                    PartitionResult {
                        prefix,
                        seed,
                        greenlist: greenlist.as_slice().to_vec(),
                    },
                    warnings,
                    loaded.config_hash,
                ),
                Err(e) => CommandOutput::failure(
                    vec![watermark_error_to_json(&e)],
                    warnings,
                    Some(loaded.config_hash),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_default_prefix() {
        assert_eq!(run("3,5", None, true).unwrap(), ExitCode::SUCCESS);
        assert_eq!(run("3,5", None, false).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_empty_prefix() {
        assert_eq!(run("", None, true).unwrap(), ExitCode::from(1));
        assert!(run("", None, false).is_err());
    }

    #[test]
    fn test_bad_token_list() {
        assert_eq!(run("3,x", None, true).unwrap(), ExitCode::from(1));
    }

    #[test]
    fn test_partition_output_envelope() {
        let output = partition_output("3,5", None);
        assert!(output.success);
        assert_eq!(output.config_hash.as_ref().map(String::len), Some(64));

        let result = output.result.unwrap();
        assert_eq!(result.prefix, vec![3, 5]);
        assert_eq!(result.seed, 15_485_863 * 5);
        assert_eq!(result.greenlist.len(), 11);
    }

    #[test]
    fn test_partition_output_empty_prefix_code() {
        let output = partition_output("", None);
        assert!(!output.success);
        assert_eq!(output.errors[0].code, "WM_002");
    }
}
