use crate::decode::decode_bytes;
use crate::error::AudioError;
use crate::resample::resample;

/// A mono audio clip at a known sample rate.
///
/// Produced by [`Waveform::load`], which guarantees the samples are at the
/// requested rate and non-empty. Length is unconstrained; fixed-duration
/// alignment happens downstream in the feature pipeline.
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Decodes an audio byte buffer and resamples it to `target_rate`.
    ///
    /// `extension` is a container hint taken from the uploaded filename;
    /// the actual format is probed from the content.
    pub fn load(
        bytes: &[u8],
        extension: Option<&str>,
        target_rate: u32,
    ) -> Result<Self, AudioError> {
        let decoded = decode_bytes(bytes, extension)?;

        let samples = if decoded.sample_rate != target_rate {
            resample(&decoded.samples, decoded.sample_rate, target_rate)?
        } else {
            decoded.samples
        };

        if samples.is_empty() {
            return Err(AudioError::EmptyAudio);
        }

        Ok(Self {
            samples,
            sample_rate: target_rate,
        })
    }

    /// Wraps raw samples that are already mono at `sample_rate`.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// Root mean square amplitude.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / self.samples.len() as f64).sqrt() as f32
    }

    /// Fraction of adjacent sample pairs that change sign, in [0, 1].
    pub fn zero_crossing_rate(&self) -> f32 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let crossings = self
            .samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        crossings as f32 / (self.samples.len() - 1) as f32
    }
}
