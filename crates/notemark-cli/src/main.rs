//! Notemark CLI - greenlist watermarking for token sequences
//!
//! This binary inspects watermark configs, computes greenlists, biases score
//! matrices, detects watermarks in token sequences, and runs seeded
//! watermarked vs unwatermarked simulations.

use clap::{Parser, Subcommand};
use notemark_spec::{DetectionOptions, DEFAULT_Z_THRESHOLD};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use notemark_cli::commands;
use notemark_cli::commands::json_output::{emit, DetectOutput};

/// Notemark - Greenlist Token Watermarking
#[derive(Parser)]
#[command(name = "notemark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log watermark internals to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a watermark config and print its derived values
    Config {
        /// Path to the config JSON file (defaults when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the greenlist induced by a token prefix
    Partition {
        /// Comma separated prefix token ids (e.g. 3,5)
        #[arg(short, long)]
        prefix: String,

        /// Path to the config JSON file
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Bias a JSON score matrix toward each row's greenlist
    Bias {
        /// Path to a JSON [[f32]] score matrix
        #[arg(short, long)]
        scores: String,

        /// Path to a JSON [[u32]] list of token histories, one per row
        #[arg(long)]
        histories: String,

        /// Path to the config JSON file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Detect the watermark in a token sequence
    Detect {
        /// Path to a JSON token file (array or {"tokens": [...]})
        #[arg(short, long, conflicts_with = "sequence")]
        tokens: Option<String>,

        /// Inline comma separated token ids
        #[arg(long)]
        sequence: Option<String>,

        /// Path to the config JSON file
        #[arg(short, long)]
        config: Option<String>,

        /// Predict watermarked when the z-score exceeds this
        #[arg(short, long, default_value_t = DEFAULT_Z_THRESHOLD)]
        z_threshold: f64,

        /// Include the per-position green/red mask
        #[arg(long)]
        mask: bool,

        /// Discount repeated bigrams (not supported; fails with WM_005)
        #[arg(long)]
        ignore_repeated_bigrams: bool,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Generate with and without the watermark from a seeded random model
    Simulate {
        /// Path to the config JSON file
        #[arg(short, long)]
        config: Option<String>,

        /// Comma separated prompt token ids
        #[arg(short, long, default_value = "0")]
        prompt: String,

        /// Number of tokens to generate
        #[arg(short = 'n', long, default_value_t = 200)]
        steps: usize,

        /// Base seed for the model and sampler
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Softmax temperature (greedy when omitted)
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Predict watermarked when the z-score exceeds this
        #[arg(short, long, default_value_t = DEFAULT_Z_THRESHOLD)]
        z_threshold: f64,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Config { config, json } => commands::config::run(config.as_deref(), json),
        Commands::Partition {
            prefix,
            config,
            json,
        } => commands::partition::run(&prefix, config.as_deref(), json),
        Commands::Bias {
            scores,
            histories,
            config,
        } => commands::bias::run(&scores, &histories, config.as_deref()),
        Commands::Detect {
            tokens,
            sequence,
            config,
            z_threshold,
            mask,
            ignore_repeated_bigrams,
            json,
        } => match commands::detect::token_input(tokens.as_deref(), sequence.as_deref()) {
            Ok(input) => {
                let options = DetectionOptions {
                    z_threshold,
                    ignore_repeated_bigrams,
                    return_green_token_mask: mask,
                };
                commands::detect::run(input, config.as_deref(), options, json)
            }
            Err(e) if json => emit(&DetectOutput::failure(vec![e], Vec::new(), None)),
            Err(e) => Err(anyhow::anyhow!(e.message)),
        },
        Commands::Simulate {
            config,
            prompt,
            steps,
            seed,
            temperature,
            z_threshold,
            json,
        } => commands::simulate::run(
            &commands::simulate::SimulateArgs {
                config_path: config.as_deref(),
                prompt: &prompt,
                steps,
                seed,
                temperature,
                z_threshold,
            },
            json,
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
