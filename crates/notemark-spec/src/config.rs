//! Watermark configuration types.
//!
//! [`WatermarkConfigParams`] is the raw, serde-facing parameter set (every
//! field optional in JSON, unknown fields rejected). [`WatermarkConfig`] is the
//! validated, immutable form shared by the embedder and the detector.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigLoadError, ErrorCode, WatermarkError};
use crate::validation::validate_params;

/// Default vocabulary size (rest token plus the chorale note range).
pub const DEFAULT_VOCAB_SIZE: u32 = 47;

/// Default green fraction.
pub const DEFAULT_GAMMA: f64 = 0.25;

/// Default logit bias for green tokens.
pub const DEFAULT_DELTA: f32 = 2.0;

/// Default hash key: a large prime so `hash_key * token` has a wide seed range.
pub const DEFAULT_HASH_KEY: u64 = 15_485_863;

/// Default detection threshold on the z-score.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// Token identifier within the vocabulary.
pub type TokenId = u32;

/// Rule mapping a token history to the seed for the next greenlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeedingScheme {
    /// Seed from exactly the immediately preceding token.
    #[default]
    #[serde(rename = "simple_1")]
    Simple1,
}

impl SeedingScheme {
    /// Returns the scheme name as used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedingScheme::Simple1 => "simple_1",
        }
    }

    /// Minimum number of preceding tokens needed to seed a greenlist.
    pub fn min_prefix_len(&self) -> usize {
        match self {
            SeedingScheme::Simple1 => 1,
        }
    }

    /// Returns all supported schemes.
    pub fn all() -> &'static [SeedingScheme] {
        &[SeedingScheme::Simple1]
    }
}

impl std::fmt::Display for SeedingScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeedingScheme {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple_1" => Ok(SeedingScheme::Simple1),
            other => Err(WatermarkError::UnsupportedSeedingScheme(other.to_string())),
        }
    }
}

/// Raw watermark parameters as they appear in a config file.
///
/// Omitted fields take the defaults of the original deployment. Use
/// [`crate::validation::validate_params`] to get coded errors and warnings, or
/// convert with `WatermarkConfig::try_from` to get a usable config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfigParams {
    /// Size of the token alphabet.
    pub vocab_size: u32,
    /// Target fraction of the vocabulary marked green.
    pub gamma: f64,
    /// Additive logit bias for green tokens.
    pub delta: f32,
    /// Constant mixed into every seed.
    pub hash_key: u64,
    /// Seeding scheme name (only "simple_1").
    pub seeding_scheme: String,
    /// Front-slice (true) or legacy back-slice (false) greenlist convention.
    pub select_green_tokens: bool,
}

impl Default for WatermarkConfigParams {
    fn default() -> Self {
        Self {
            vocab_size: DEFAULT_VOCAB_SIZE,
            gamma: DEFAULT_GAMMA,
            delta: DEFAULT_DELTA,
            hash_key: DEFAULT_HASH_KEY,
            seeding_scheme: SeedingScheme::default().as_str().to_string(),
            select_green_tokens: true,
        }
    }
}

/// Validated, immutable watermark parameters.
///
/// Fields are private so a constructed config is always valid. The type is
/// `Send + Sync` and meant to be shared by reference between concurrent
/// embedding and detection calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WatermarkConfigParams", into = "WatermarkConfigParams")]
pub struct WatermarkConfig {
    vocab_size: u32,
    gamma: f64,
    delta: f32,
    hash_key: u64,
    seeding_scheme: SeedingScheme,
    select_green_tokens: bool,
}

impl WatermarkConfig {
    /// Creates a validated config.
    ///
    /// # Errors
    /// `InvalidConfig` when `vocab_size` is zero, `gamma` is not strictly
    /// inside (0, 1), or `delta` is not finite. An unknown seeding scheme
    /// fails with `UnsupportedSeedingScheme` instead (see
    /// [`WatermarkError::is_config_error`]).
    ///
    /// # Example
    /// ```
    /// use notemark_spec::{SeedingScheme, WatermarkConfig};
    ///
    /// let config = WatermarkConfig::new(47, 0.25, 2.0, 15_485_863, SeedingScheme::Simple1, true)
    ///     .unwrap();
    /// assert_eq!(config.greenlist_size(), 11);
    /// assert!(WatermarkConfig::new(47, 1.0, 2.0, 1, SeedingScheme::Simple1, true).is_err());
    /// ```
    pub fn new(
        vocab_size: u32,
        gamma: f64,
        delta: f32,
        hash_key: u64,
        seeding_scheme: SeedingScheme,
        select_green_tokens: bool,
    ) -> Result<Self, WatermarkError> {
        Self::try_from(WatermarkConfigParams {
            vocab_size,
            gamma,
            delta,
            hash_key,
            seeding_scheme: seeding_scheme.as_str().to_string(),
            select_green_tokens,
        })
    }

    /// Starts a builder seeded with the default parameters.
    pub fn builder() -> WatermarkConfigBuilder {
        WatermarkConfigBuilder::new()
    }

    /// Parses and validates a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        let params: WatermarkConfigParams = serde_json::from_str(json)?;
        Ok(Self::try_from(params)?)
    }

    /// Reads, parses and validates a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Returns the raw parameter form of this config.
    pub fn to_params(&self) -> WatermarkConfigParams {
        WatermarkConfigParams {
            vocab_size: self.vocab_size,
            gamma: self.gamma,
            delta: self.delta,
            hash_key: self.hash_key,
            seeding_scheme: self.seeding_scheme.as_str().to_string(),
            select_green_tokens: self.select_green_tokens,
        }
    }

    pub fn vocab_size(&self) -> u32 {
        self.vocab_size
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn hash_key(&self) -> u64 {
        self.hash_key
    }

    pub fn seeding_scheme(&self) -> SeedingScheme {
        self.seeding_scheme
    }

    pub fn select_green_tokens(&self) -> bool {
        self.select_green_tokens
    }

    /// Minimum history length before a greenlist can be computed.
    pub fn min_prefix_len(&self) -> usize {
        self.seeding_scheme.min_prefix_len()
    }

    /// `floor(vocab_size * gamma)`: the split point of the seeded permutation.
    pub fn greenlist_size(&self) -> usize {
        (f64::from(self.vocab_size) * self.gamma).floor() as usize
    }

    /// Number of tokens that are green at each step under the configured
    /// selection convention.
    pub fn green_set_len(&self) -> usize {
        if self.select_green_tokens {
            self.greenlist_size()
        } else {
            self.vocab_size as usize - self.greenlist_size()
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            vocab_size: DEFAULT_VOCAB_SIZE,
            gamma: DEFAULT_GAMMA,
            delta: DEFAULT_DELTA,
            hash_key: DEFAULT_HASH_KEY,
            seeding_scheme: SeedingScheme::Simple1,
            select_green_tokens: true,
        }
    }
}

impl TryFrom<WatermarkConfigParams> for WatermarkConfig {
    type Error = WatermarkError;

    fn try_from(params: WatermarkConfigParams) -> Result<Self, Self::Error> {
        let errors = match validate_params(&params).into_result() {
            Ok(_warnings) => Vec::new(),
            Err(errors) => errors,
        };
        if errors
            .iter()
            .any(|e| e.code == ErrorCode::UnsupportedSeedingScheme)
        {
            return Err(WatermarkError::UnsupportedSeedingScheme(
                params.seeding_scheme,
            ));
        }
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(WatermarkError::InvalidConfig(message));
        }

        let seeding_scheme: SeedingScheme = params.seeding_scheme.parse()?;
        Ok(Self {
            vocab_size: params.vocab_size,
            gamma: params.gamma,
            delta: params.delta,
            hash_key: params.hash_key,
            seeding_scheme,
            select_green_tokens: params.select_green_tokens,
        })
    }
}

impl From<WatermarkConfig> for WatermarkConfigParams {
    fn from(config: WatermarkConfig) -> Self {
        config.to_params()
    }
}

/// Builder for [`WatermarkConfig`], starting from the defaults.
#[derive(Debug, Clone, Default)]
pub struct WatermarkConfigBuilder {
    params: WatermarkConfigParams,
}

impl WatermarkConfigBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vocab_size(mut self, vocab_size: u32) -> Self {
        self.params.vocab_size = vocab_size;
        self
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.params.gamma = gamma;
        self
    }

    pub fn delta(mut self, delta: f32) -> Self {
        self.params.delta = delta;
        self
    }

    pub fn hash_key(mut self, hash_key: u64) -> Self {
        self.params.hash_key = hash_key;
        self
    }

    pub fn seeding_scheme(mut self, scheme: SeedingScheme) -> Self {
        self.params.seeding_scheme = scheme.as_str().to_string();
        self
    }

    /// Sets the greenlist convention; `false` selects the legacy back slice.
    pub fn select_green_tokens(mut self, select: bool) -> Self {
        self.params.select_green_tokens = select;
        self
    }

    /// Validates and builds the config.
    pub fn build(self) -> Result<WatermarkConfig, WatermarkError> {
        WatermarkConfig::try_from(self.params)
    }
}
