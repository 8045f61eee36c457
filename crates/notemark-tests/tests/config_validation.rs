//! Config validation tests.
//!
//! Invalid parameter sets must be rejected with coded errors before any
//! partitioning happens; questionable ones pass with warnings.

use notemark_spec::{
    validate_params, ConfigLoadError, ErrorCode, WarningCode, WatermarkConfig,
    WatermarkConfigParams, WatermarkError,
};
use pretty_assertions::assert_eq;

fn params() -> WatermarkConfigParams {
    WatermarkConfigParams::default()
}

fn error_codes(params: &WatermarkConfigParams) -> Vec<ErrorCode> {
    validate_params(params).errors.iter().map(|e| e.code).collect()
}

fn warning_codes(params: &WatermarkConfigParams) -> Vec<WarningCode> {
    validate_params(params).warnings.iter().map(|w| w.code).collect()
}

#[test]
fn test_gamma_bounds_rejected() {
    for gamma in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
        let params = WatermarkConfigParams { gamma, ..params() };
        assert_eq!(error_codes(&params), vec![ErrorCode::GammaOutOfRange], "gamma {}", gamma);
        assert!(matches!(
            WatermarkConfig::try_from(params),
            Err(WatermarkError::InvalidConfig(_))
        ));
    }
}

#[test]
fn test_empty_vocabulary_rejected() {
    let params = WatermarkConfigParams {
        vocab_size: 0,
        ..params()
    };
    assert_eq!(error_codes(&params), vec![ErrorCode::EmptyVocabulary]);
    let err = WatermarkConfig::try_from(params).unwrap_err();
    assert!(err.is_config_error());
    assert_eq!(err.code(), "WM_001");
}

#[test]
fn test_non_finite_delta_rejected() {
    let params = WatermarkConfigParams {
        delta: f32::INFINITY,
        ..params()
    };
    assert_eq!(error_codes(&params), vec![ErrorCode::NonFiniteDelta]);
}

#[test]
fn test_unknown_seeding_scheme() {
    let params = WatermarkConfigParams {
        seeding_scheme: "algorithm-3".to_string(),
        ..params()
    };
    assert_eq!(error_codes(&params), vec![ErrorCode::UnsupportedSeedingScheme]);
    assert_eq!(
        WatermarkConfig::try_from(params).unwrap_err(),
        WatermarkError::UnsupportedSeedingScheme("algorithm-3".to_string())
    );
}

#[test]
fn test_all_errors_collected() {
    let params = WatermarkConfigParams {
        vocab_size: 0,
        gamma: 2.0,
        delta: f32::NAN,
        seeding_scheme: "x".to_string(),
        ..params()
    };
    assert_eq!(error_codes(&params).len(), 4);
}

#[test]
fn test_warnings_do_not_block() {
    let params = WatermarkConfigParams {
        vocab_size: 3,
        gamma: 0.2,
        delta: 0.0,
        hash_key: 0,
        select_green_tokens: false,
        ..params()
    };
    let result = validate_params(&params);
    assert!(result.is_ok());
    assert_eq!(
        warning_codes(&params),
        vec![
            WarningCode::EmptyGreenlist,
            WarningCode::NonPositiveDelta,
            WarningCode::ZeroHashKey,
            WarningCode::LegacyGreenlistSelection,
        ]
    );
    assert!(WatermarkConfig::try_from(params).is_ok());
}

#[test]
fn test_json_defaults_fill_omitted_fields() {
    let config = WatermarkConfig::from_json_str(r#"{"gamma": 0.5}"#).unwrap();
    assert_eq!(config.gamma(), 0.5);
    assert_eq!(config.vocab_size(), 47);
    assert_eq!(config.green_set_len(), 23);
}

#[test]
fn test_json_rejects_unknown_fields() {
    let err = WatermarkConfig::from_json_str(r#"{"gamma": 0.5, "z_threshold": 4}"#).unwrap_err();
    assert!(matches!(err, ConfigLoadError::JsonParse(_)));
}

#[test]
fn test_json_rejects_invalid_values() {
    let err = WatermarkConfig::from_json_str(r#"{"gamma": 1.0}"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::Invalid(WatermarkError::InvalidConfig(_))
    ));
}

#[test]
fn test_config_json_round_trip() {
    let config = WatermarkConfig::builder()
        .vocab_size(128)
        .gamma(0.4)
        .delta(1.5)
        .hash_key(99)
        .build()
        .unwrap();
    let json = serde_json::to_string(&config).unwrap();
    let parsed: WatermarkConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_deserializing_invalid_config_fails() {
    let result: Result<WatermarkConfig, _> = serde_json::from_str(r#"{"vocab_size": 0}"#);
    assert!(result.is_err());
}
