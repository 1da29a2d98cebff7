//! Chainable DSP effect modules.

use serde::{Deserialize, Serialize};

use crate::container::prot::ImpulseResponseSpec;

pub mod basic_reverb;
pub mod biquad;
pub mod compressor;
pub mod convolution_reverb;
pub mod diffusion_reverb;
pub mod distortion;
pub mod gain;
pub mod high_pass;
pub mod level;
pub mod limiter;
pub mod low_pass;
pub mod multiband_eq;

pub use basic_reverb::{BasicReverbEffect, BasicReverbSettings};
pub use compressor::{CompressorEffect, CompressorSettings};
pub use convolution_reverb::{ConvolutionReverbEffect, ConvolutionReverbSettings};
pub use diffusion_reverb::{DiffusionReverbEffect, DiffusionReverbSettings};
pub use distortion::{DistortionEffect, DistortionSettings};
pub use gain::{GainEffect, GainSettings};
pub use high_pass::{HighPassFilterEffect, HighPassFilterSettings};
pub use limiter::{LimiterEffect, LimiterSettings};
pub use low_pass::{LowPassFilterEffect, LowPassFilterSettings};
pub use multiband_eq::{MultibandEqEffect, MultibandEqSettings};

/// Shared context for preparing and running DSP effects.
#[derive(Debug, Clone)]
pub struct EffectContext {
    pub sample_rate: u32,
    pub channels: usize,
    pub container_path: Option<String>,
    pub impulse_response_spec: Option<ImpulseResponseSpec>,
    pub impulse_response_tail_db: f32,
}

/// Configured audio effect that can process interleaved samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AudioEffect {
    #[serde(rename = "BasicReverbSettings")]
    BasicReverb(BasicReverbEffect),
    #[serde(rename = "DiffusionReverbSettings")]
    DiffusionReverb(DiffusionReverbEffect),
    #[serde(rename = "ConvolutionReverbSettings")]
    ConvolutionReverb(ConvolutionReverbEffect),
    #[serde(rename = "LowPassFilterSettings")]
    LowPassFilter(LowPassFilterEffect),
    #[serde(rename = "HighPassFilterSettings")]
    HighPassFilter(HighPassFilterEffect),
    #[serde(rename = "DistortionSettings")]
    Distortion(DistortionEffect),
    #[serde(rename = "GainSettings")]
    Gain(GainEffect),
    #[serde(rename = "CompressorSettings")]
    Compressor(CompressorEffect),
    #[serde(rename = "LimiterSettings")]
    Limiter(LimiterEffect),
    #[serde(rename = "MultibandEqSettings")]
    MultibandEq(MultibandEqEffect),
}

impl AudioEffect {
    /// Process the provided samples through the effect.
    ///
    /// # Arguments
    /// - `samples`: Interleaved input samples.
    /// - `context`: Environment details (sample rate, channels, etc.).
    /// - `drain`: When true, flush any buffered tail data.
    ///
    /// # Returns
    /// Processed interleaved samples.
    pub fn process(&mut self, samples: &[f32], context: &EffectContext, drain: bool) -> Vec<f32> {
        match self {
            AudioEffect::BasicReverb(effect) => effect.process(samples, context, drain),
            AudioEffect::DiffusionReverb(effect) => effect.process(samples, context, drain),
            AudioEffect::ConvolutionReverb(effect) => effect.process(samples, context, drain),
            AudioEffect::LowPassFilter(effect) => effect.process(samples, context, drain),
            AudioEffect::HighPassFilter(effect) => effect.process(samples, context, drain),
            AudioEffect::Distortion(effect) => effect.process(samples, context, drain),
            AudioEffect::Gain(effect) => effect.process(samples, context, drain),
            AudioEffect::Compressor(effect) => effect.process(samples, context, drain),
            AudioEffect::Limiter(effect) => effect.process(samples, context, drain),
            AudioEffect::MultibandEq(effect) => effect.process(samples, context, drain),
        }
    }

    /// Prepare a freshly constructed effect instance for real-time processing
    /// ahead of an inline crossfade, priming anything that would otherwise
    /// allocate or analyze lazily on the first [`Self::process`] call.
    pub fn warm_up(&mut self, context: &EffectContext) {
        let silence = vec![0.0_f32; context.channels.max(1)];
        let _ = self.process(&silence, context, false);
        self.reset_state();
    }

    /// Reset any internal state maintained by the effect.
    pub fn reset_state(&mut self) {
        match self {
            AudioEffect::BasicReverb(effect) => effect.reset_state(),
            AudioEffect::DiffusionReverb(effect) => effect.reset_state(),
            AudioEffect::ConvolutionReverb(effect) => effect.reset_state(),
            AudioEffect::LowPassFilter(effect) => effect.reset_state(),
            AudioEffect::HighPassFilter(effect) => effect.reset_state(),
            AudioEffect::Distortion(effect) => effect.reset_state(),
            AudioEffect::Gain(effect) => effect.reset_state(),
            AudioEffect::Compressor(effect) => effect.reset_state(),
            AudioEffect::Limiter(effect) => effect.reset_state(),
            AudioEffect::MultibandEq(effect) => effect.reset_state(),
        }
    }

    /// Mutable access to the convolution reverb effect, if present.
    pub fn as_convolution_reverb_mut(&mut self) -> Option<&mut ConvolutionReverbEffect> {
        match self {
            AudioEffect::ConvolutionReverb(effect) => Some(effect),
            _ => None,
        }
    }

    /// Immutable access to the convolution reverb effect, if present.
    pub fn as_convolution_reverb(&self) -> Option<&ConvolutionReverbEffect> {
        match self {
            AudioEffect::ConvolutionReverb(effect) => Some(effect),
            _ => None,
        }
    }

    /// Mutable access to the diffusion reverb effect, if present.
    pub fn as_diffusion_reverb_mut(&mut self) -> Option<&mut DiffusionReverbEffect> {
        match self {
            AudioEffect::DiffusionReverb(effect) => Some(effect),
            _ => None,
        }
    }

    /// Immutable access to the diffusion reverb effect, if present.
    pub fn as_diffusion_reverb(&self) -> Option<&DiffusionReverbEffect> {
        match self {
            AudioEffect::DiffusionReverb(effect) => Some(effect),
            _ => None,
        }
    }

    /// Mutable access to the basic reverb effect, if present.
    pub fn as_basic_reverb_mut(&mut self) -> Option<&mut BasicReverbEffect> {
        match self {
            AudioEffect::BasicReverb(effect) => Some(effect),
            _ => None,
        }
    }

    /// Immutable access to the basic reverb effect, if present.
    pub fn as_basic_reverb(&self) -> Option<&BasicReverbEffect> {
        match self {
            AudioEffect::BasicReverb(effect) => Some(effect),
            _ => None,
        }
    }
}
