//! Built-in fallback impulse response for [`super::reverb::Reverb`] when no
//! container-supplied impulse response is configured.
//!
//! Modeled after a small spring tank: a short burst of modulated noise-like
//! oscillation with an exponential decay envelope, rather than a true
//! measured recording. `tools normalize` bakes a trimmed, peak-normalized
//! variant of a buffer built the same way this one is, for embedding as a
//! named constant elsewhere.

use std::sync::OnceLock;

const SAMPLE_RATE: f32 = 44_100.0;
const DURATION_SECONDS: f32 = 1.5;
const DECAY_PER_SECOND_DB: f32 = -24.0;
const MODES: [(f32, f32); 4] = [
    (820.0, 1.0),
    (1_330.0, 0.6),
    (2_070.0, 0.35),
    (3_140.0, 0.2),
];

fn synthesize() -> Vec<f32> {
    let sample_count = (SAMPLE_RATE * DURATION_SECONDS) as usize;
    let mut samples = Vec::with_capacity(sample_count);
    let decay_per_sample = (10f32.powf(DECAY_PER_SECOND_DB / 20.0)).powf(1.0 / SAMPLE_RATE);

    let mut envelope = 1.0f32;
    for n in 0..sample_count {
        let t = n as f32 / SAMPLE_RATE;
        let mut value = 0.0f32;
        for (frequency, weight) in MODES {
            value += weight * (2.0 * std::f32::consts::PI * frequency * t).sin();
        }
        samples.push(value * envelope);
        envelope *= decay_per_sample;
    }

    let mut channels = vec![samples];
    crate::dsp::impulse_response::normalize_impulse_response_channels(
        &mut channels,
        Some(-60.0),
    );
    channels.pop().unwrap_or_default()
}

/// Default spring-style impulse response, generated once and cached.
pub fn spring_impulse_response() -> &'static [f32] {
    static RESPONSE: OnceLock<Vec<f32>> = OnceLock::new();
    RESPONSE.get_or_init(synthesize)
}
