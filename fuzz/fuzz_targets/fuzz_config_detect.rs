#![no_main]

use libfuzzer_sys::fuzz_target;
use notemark_spec::WatermarkConfig;
use notemark_watermark::{bias, detect, partition};

// First byte picks the split between config JSON and token bytes.
fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let (json, token_bytes) = rest.split_at(split);

    let config = match std::str::from_utf8(json)
        .ok()
        .and_then(|s| WatermarkConfig::from_json_str(s).ok())
    {
        Some(config) if config.vocab_size() <= 4096 => config,
        _ => WatermarkConfig::default(),
    };

    let tokens: Vec<u32> = token_bytes
        .chunks(2)
        .map(|c| u32::from(c[0]) | (u32::from(*c.get(1).unwrap_or(&0)) << 8))
        .collect();

    if let Some(first) = tokens.first() {
        let greenlist = partition(&[*first], &config).expect("non-empty prefix");
        assert_eq!(greenlist.len(), config.green_set_len());

        let row = vec![0.0f32; config.vocab_size() as usize];
        let biased = bias(vec![row], &[vec![*first]], &config).expect("shapes match");
        assert_eq!(biased[0].len(), config.vocab_size() as usize);
    }

    if let Ok(result) = detect(&tokens, &config, 4.0) {
        assert!(result.num_green_tokens <= result.num_tokens_scored);
        assert_eq!(result.confidence.is_some(), result.prediction);
    }
});
