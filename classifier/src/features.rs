//! Fixed-shape feature extraction.
//!
//! Converts an arbitrary-length [`Waveform`] into the exact tensor the
//! model was trained on. Every step must reproduce the training-time
//! pipeline; the final shape assertion turns any drift into a hard error
//! instead of silently degraded predictions.

use ndarray::Array4;

use coughcheck_audio::Waveform;

use crate::config::PipelineConfig;
use crate::error::ClassifierError;
use crate::spectrogram::{MelSpectrogram, power_to_db};

/// Guard against division by zero when normalizing silent clips.
const NORM_EPSILON: f32 = 1e-6;

/// Model input tensor: `(batch=1, mel bands, frames, channel=1)`.
pub type FeatureTensor = Array4<f32>;

/// Deterministic waveform-to-tensor pipeline.
///
/// Pure over its input: no I/O, no hidden state, identical output for
/// identical samples.
pub struct FeatureExtractor {
    target_length: usize,
    target_frames: usize,
    n_mels: usize,
    mel: MelSpectrogram,
}

impl FeatureExtractor {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            target_length: cfg.target_length(),
            target_frames: cfg.target_frames(),
            n_mels: cfg.n_mels,
            mel: MelSpectrogram::new(cfg.n_fft, cfg.hop_length, cfg.n_mels, cfg.sample_rate),
        }
    }

    /// Extracts the fixed-shape feature tensor for one clip.
    ///
    /// 1. Peak-normalize amplitude
    /// 2. Right-pad with zeros or truncate to the fixed sample count
    /// 3. Mel power spectrogram
    /// 4. Log scaling referenced to the array maximum
    /// 5. Right-pad or truncate spectrogram columns to the fixed width
    /// 6. Add batch and channel dimensions, then assert the final shape
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureTensor, ClassifierError> {
        let mut samples = waveform.samples().to_vec();
        normalize(&mut samples);
        align_length(&mut samples, self.target_length);

        let mut mel = self.mel.compute(&samples);
        power_to_db(&mut mel);
        align_frames(&mut mel, self.target_frames);

        let mut data = Vec::with_capacity(self.n_mels * self.target_frames);
        for row in &mel {
            data.extend_from_slice(row);
        }
        let tensor =
            Array4::from_shape_vec((1, self.n_mels, self.target_frames, 1), data)
                .map_err(|_| ClassifierError::ShapeMismatch {
                    expected: [1, self.n_mels, self.target_frames, 1],
                    got: [1, mel.len(), mel.first().map_or(0, |row| row.len()), 1],
                })?;

        let expected = [1, self.n_mels, self.target_frames, 1];
        let got = tensor.shape();
        if got != expected {
            return Err(ClassifierError::ShapeMismatch {
                expected,
                got: [got[0], got[1], got[2], got[3]],
            });
        }

        Ok(tensor)
    }

    pub fn expected_shape(&self) -> [usize; 4] {
        [1, self.n_mels, self.target_frames, 1]
    }
}

/// Scales samples by the peak absolute value plus [`NORM_EPSILON`].
/// A silent clip stays silent instead of dividing by zero.
fn normalize(samples: &mut [f32]) {
    if samples.is_empty() {
        return;
    }
    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    let scale = 1.0 / (peak + NORM_EPSILON);
    for s in samples.iter_mut() {
        *s *= scale;
    }
}

/// Right-pads with zeros or truncates to exactly `target` samples.
fn align_length(samples: &mut Vec<f32>, target: usize) {
    samples.resize(target, 0.0);
}

/// Right-pads or truncates every row to exactly `target` columns.
/// Padding uses 0.0, the reference level of the dB scale, matching the
/// training pipeline.
fn align_frames(mel: &mut [Vec<f32>], target: usize) {
    for row in mel.iter_mut() {
        row.resize(target, 0.0);
    }
}
