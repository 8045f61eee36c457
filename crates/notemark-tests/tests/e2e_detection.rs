//! End-to-end embedding and detection tests.
//!
//! These tests generate sequences through the logits processor and check that
//! detection separates them from unbiased sequences.

use notemark_spec::{DetectionOptions, WatermarkConfig};
use notemark_tests::fixtures::{all_green_sequence, random_sequence, sequence_with_green_count};
use notemark_watermark::{
    bias, detect, generate, partition, simulate, Detector, LogitsProcessor, RandomScoreModel,
    Sampler, SimulationParams, WatermarkLogitsProcessor,
};

fn watermarked_sequence(
    config: &WatermarkConfig,
    seed: u64,
    steps: usize,
    sampler: &mut Sampler,
) -> Vec<u32> {
    let processor = WatermarkLogitsProcessor::new(config.clone());
    let mut model = RandomScoreModel::new(config.vocab_size() as usize, seed);
    let prompt = [seed as u32 % config.vocab_size()];
    generate(&mut model, &prompt, steps, Some(&processor), sampler).unwrap()
}

// ============================================================================
// Reference statistics
// ============================================================================

#[test]
fn test_reference_z_score_below_threshold() {
    let config = WatermarkConfig::default();
    let tokens = sequence_with_green_count(&config, 79, 24);
    let result = detect(&tokens, &config, 3.0).unwrap();

    assert_eq!(result.num_tokens_scored, 79);
    assert_eq!(result.num_green_tokens, 24);
    assert!((result.z_score - 1.1043).abs() < 1e-3, "z = {}", result.z_score);
    assert!(!result.prediction);
    assert!(result.confidence.is_none());
}

#[test]
fn test_confidence_present_iff_predicted() {
    let config = WatermarkConfig::default();
    for green in [0, 10, 20, 30, 40, 50, 60] {
        let tokens = sequence_with_green_count(&config, 60, green);
        let result = detect(&tokens, &config, 2.0).unwrap();
        assert_eq!(result.confidence.is_some(), result.prediction, "green = {}", green);
        if let Some(confidence) = result.confidence {
            assert!((confidence - (1.0 - result.p_value)).abs() < 1e-12);
        }
        assert!((0.0..=1.0).contains(&result.p_value));
    }
}

#[test]
fn test_threshold_is_strict() {
    let config = WatermarkConfig::default();
    let tokens = sequence_with_green_count(&config, 79, 24);
    let z = detect(&tokens, &config, 0.0).unwrap().z_score;

    assert!(!detect(&tokens, &config, z).unwrap().prediction);
    assert!(detect(&tokens, &config, z - 1e-9).unwrap().prediction);
}

// ============================================================================
// Detectability
// ============================================================================

#[test]
fn test_greedy_generation_is_detected() {
    let config = WatermarkConfig::default();
    for seed in 0..5 {
        let tokens = watermarked_sequence(&config, seed, 200, &mut Sampler::greedy());
        let result = detect(&tokens, &config, 4.0).unwrap();
        // Uniform scores span less than delta, so greedy always picks green.
        assert_eq!(result.num_green_tokens, 200, "seed {}", seed);
        assert!(result.prediction, "seed {}", seed);
    }
}

#[test]
fn test_sampled_generation_is_detected() {
    let config = WatermarkConfig::default();
    for seed in 0..5 {
        let mut sampler = Sampler::temperature(1.0, seed + 100).unwrap();
        let tokens = watermarked_sequence(&config, seed, 300, &mut sampler);
        let result = detect(&tokens, &config, 4.0).unwrap();
        assert!(result.green_fraction > 0.5, "seed {}: {}", seed, result.green_fraction);
        assert!(result.prediction, "seed {}", seed);
    }
}

#[test]
fn test_legacy_convention_round_trip() {
    let config = WatermarkConfig::builder()
        .vocab_size(64)
        .gamma(0.5)
        .select_green_tokens(false)
        .build()
        .unwrap();
    let tokens = watermarked_sequence(&config, 9, 150, &mut Sampler::greedy());
    let result = detect(&tokens, &config, 4.0).unwrap();
    assert_eq!(result.num_green_tokens, 150);
    assert!(result.prediction);
}

// ============================================================================
// Null hypothesis
// ============================================================================

#[test]
fn test_unbiased_sequences_match_gamma() {
    // 100 * 0.25 is exact, so the null green rate is gamma itself.
    let config = WatermarkConfig::builder().vocab_size(100).build().unwrap();
    let detector = Detector::new(&config);

    let mut green = 0;
    let mut scored = 0;
    for seed in 0..20 {
        let tokens = random_sequence(&config, 500, seed);
        let score = detector.score_sequence(&tokens).unwrap();
        green += score.num_green_tokens;
        scored += score.num_tokens_scored;
    }

    let fraction = green as f64 / scored as f64;
    assert!((fraction - 0.25).abs() < 0.05, "pooled green fraction {}", fraction);
}

#[test]
fn test_unbiased_z_scores_roughly_standard_normal() {
    let config = WatermarkConfig::builder().vocab_size(100).build().unwrap();
    let z_scores: Vec<f64> = (0..40)
        .map(|seed| {
            let tokens = random_sequence(&config, 400, 1000 + seed);
            detect(&tokens, &config, 4.0).unwrap().z_score
        })
        .collect();

    let n = z_scores.len() as f64;
    let mean = z_scores.iter().sum::<f64>() / n;
    let variance = z_scores.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / (n - 1.0);
    assert!(mean.abs() < 0.6, "mean z {}", mean);
    assert!((0.6..1.4).contains(&variance.sqrt()), "std z {}", variance.sqrt());
}

#[test]
fn test_unbiased_sequences_rarely_predicted() {
    let config = WatermarkConfig::default();
    let detector = Detector::with_options(&config, DetectionOptions::with_z_threshold(4.0));
    let sequences: Vec<Vec<u32>> = (0..20)
        .map(|seed| random_sequence(&config, 200, seed))
        .collect();

    let flagged = detector
        .detect_batch(&sequences)
        .into_iter()
        .filter(|r| r.as_ref().unwrap().prediction)
        .count();
    assert_eq!(flagged, 0);
}

// ============================================================================
// Embedding
// ============================================================================

#[test]
fn test_bias_adds_delta_to_greenlist_only() {
    let config = WatermarkConfig::builder().delta(3.5).build().unwrap();
    let histories = vec![vec![1u32, 2], vec![40], vec![7, 7, 7]];
    let scores = vec![vec![1.0f32; 47]; 3];

    let biased = bias(scores, &histories, &config).unwrap();
    for (row, history) in biased.iter().zip(&histories) {
        let greenlist = partition(history, &config).unwrap();
        for (token, &score) in row.iter().enumerate() {
            let expected = if greenlist.contains(token as u32) { 4.5 } else { 1.0 };
            assert_eq!(score, expected);
        }
    }
}

#[test]
fn test_processor_matches_free_function() {
    let config = WatermarkConfig::default();
    let processor = WatermarkLogitsProcessor::new(config.clone());
    let histories: Vec<&[u32]> = vec![&[3], &[4, 5]];
    let rows: Vec<Vec<f32>> = (0..2)
        .map(|r| (0..47).map(|t| (t * r) as f32 * 0.01).collect())
        .collect();

    let mut processed = rows.clone();
    processor.process(&histories, &mut processed).unwrap();
    assert_eq!(processed, bias(rows, &histories, &config).unwrap());
}

// ============================================================================
// Batch detection and simulation
// ============================================================================

#[test]
fn test_batch_detection_matches_single() {
    let config = WatermarkConfig::default();
    let detector = Detector::new(&config);
    let sequences = vec![
        all_green_sequence(&config, 2, 40),
        random_sequence(&config, 40, 1),
        vec![5],
        all_green_sequence(&config, 9, 10),
    ];

    let batch = detector.detect_batch(&sequences);
    for (sequence, result) in sequences.iter().zip(batch) {
        assert_eq!(result, detector.detect(sequence));
    }
}

#[test]
fn test_simulation_reports_watermarked_detection() {
    let config = WatermarkConfig::default();
    let params = SimulationParams {
        prompt: vec![3],
        steps: 150,
        seed: 11,
        temperature: Some(0.5),
    };
    let report = simulate(&config, &params, &DetectionOptions::with_z_threshold(4.0)).unwrap();

    assert!(report.watermarked.detection.prediction);
    assert!(!report.unwatermarked.detection.prediction);
    assert_eq!(
        report.watermarked.detection,
        detect(&report.watermarked.tokens, &config, 4.0).unwrap()
    );
}
