//! Mel power spectrogram computation.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

/// Smallest power considered before log scaling.
const AMIN: f32 = 1e-10;

/// Dynamic range below the reference level kept after log scaling, in dB.
const TOP_DB: f32 = 80.0;

/// Computes mel power spectrograms with a fixed window, hop, and
/// filterbank. The FFT plan, Hann window, and mel filters are built once
/// at construction and reused for every clip.
pub struct MelSpectrogram {
    n_fft: usize,
    hop_length: usize,
    n_mels: usize,
    window: Vec<f32>,
    filters: Vec<Vec<f32>>,
    fft: Arc<dyn Fft<f32>>,
}

impl MelSpectrogram {
    /// Builds the transform for the given parameters. The filterbank
    /// spans 0 Hz to Nyquist.
    pub fn new(n_fft: usize, hop_length: usize, n_mels: usize, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);
        let window = hann_window(n_fft);
        let filters = mel_filterbank(n_fft, n_mels, sample_rate, 0.0, sample_rate as f32 / 2.0);
        Self {
            n_fft,
            hop_length,
            n_mels,
            window,
            filters,
            fft,
        }
    }

    /// Computes the mel power spectrogram of `samples`.
    ///
    /// Frames are centered: frame `i` covers the window around sample
    /// `i * hop_length`, with zero padding past either edge. The result is
    /// `[n_mels][num_frames]` with `num_frames = len / hop_length + 1`.
    pub fn compute(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let num_frames = samples.len() / self.hop_length + 1;
        let half = self.n_fft / 2 + 1;
        let mut mel = vec![vec![0.0f32; num_frames]; self.n_mels];

        let mut frame = vec![Complex::new(0.0f32, 0.0f32); self.n_fft];
        let mut power = vec![0.0f32; half];

        for i in 0..num_frames {
            let center = (i * self.hop_length) as isize;
            let start = center - (self.n_fft / 2) as isize;

            for (j, slot) in frame.iter_mut().enumerate() {
                let idx = start + j as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[j], 0.0);
            }

            self.fft.process(&mut frame);

            for (k, p) in power.iter_mut().enumerate() {
                *p = frame[k].norm_sqr();
            }

            for (m, filter) in self.filters.iter().enumerate() {
                mel[m][i] = filter
                    .iter()
                    .zip(power.iter())
                    .map(|(f, p)| f * p)
                    .sum();
            }
        }

        mel
    }

    pub fn n_mels(&self) -> usize {
        self.n_mels
    }
}

/// Converts a power spectrogram to decibels in place, referenced to the
/// array maximum: the loudest cell maps to 0 dB and everything is floored
/// 80 dB below it. This is the scaling the model was trained with.
pub fn power_to_db(matrix: &mut [Vec<f32>]) {
    let reference = matrix
        .iter()
        .flat_map(|row| row.iter())
        .fold(AMIN, |acc, &v| acc.max(v));
    let ref_db = 10.0 * reference.log10();

    for row in matrix.iter_mut() {
        for v in row.iter_mut() {
            let db = 10.0 * v.max(AMIN).log10() - ref_db;
            *v = db.max(-TOP_DB);
        }
    }
}

/// Periodic Hann window of length `n`.
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos()))
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over `[fmin, fmax]`.
/// Returns `[n_mels][n_fft / 2 + 1]` weights.
fn mel_filterbank(
    n_fft: usize,
    n_mels: usize,
    sample_rate: u32,
    fmin: f32,
    fmax: f32,
) -> Vec<Vec<f32>> {
    let n_freqs = n_fft / 2 + 1;
    let freq_bins: Vec<f32> = (0..n_freqs)
        .map(|i| i as f32 * sample_rate as f32 / n_fft as f32)
        .collect();

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let mel_points: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
        .collect();

    let mut filters = vec![vec![0.0f32; n_freqs]; n_mels];
    for m in 0..n_mels {
        let left = mel_points[m];
        let center = mel_points[m + 1];
        let right = mel_points[m + 2];

        for (k, &freq) in freq_bins.iter().enumerate() {
            if freq >= left && freq <= center && center > left {
                filters[m][k] = (freq - left) / (center - left);
            } else if freq > center && freq <= right && right > center {
                filters[m][k] = (right - freq) / (right - center);
            }
        }
    }

    filters
}
