use serde::Deserialize;

use crate::error::ClassifierError;

/// Configures the audio-to-feature pipeline and upload limits.
///
/// Every value must match what the deployed model was trained with; a
/// drift here degrades predictions silently, which is why
/// [`PipelineConfig::validate`] runs once at startup and the extractor
/// asserts the final tensor shape on every clip.
///
/// Defaults match the deployed cough model: 22.05 kHz, 3 s clips,
/// 128 mel bands, 2048-point FFT with hop 512, input `(1, 128, 130, 1)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pipeline sample rate in Hz (default: 22050).
    pub sample_rate: u32,
    /// Fixed clip duration in seconds (default: 3.0).
    pub duration_secs: f32,
    /// Number of mel bands (default: 128).
    pub n_mels: usize,
    /// FFT window size in samples (default: 2048).
    pub n_fft: usize,
    /// Hop between FFT windows in samples (default: 512).
    pub hop_length: usize,
    /// Upload size limit in bytes (default: 10 MiB).
    pub max_file_size: usize,
    /// Maximum clips per batch submission (default: 10).
    pub max_batch_size: usize,
    /// Accepted upload extensions, lowercase without the dot.
    pub allowed_extensions: Vec<String>,
    /// Class label whose predictions carry a risk grade (default: "positive").
    pub positive_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            duration_secs: 3.0,
            n_mels: 128,
            n_fft: 2048,
            hop_length: 512,
            max_file_size: 10 * 1024 * 1024,
            max_batch_size: 10,
            allowed_extensions: ["wav", "mp3", "flac", "ogg", "m4a"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            positive_label: "positive".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Fixed waveform length in samples: `floor(sample_rate * duration_secs)`.
    pub fn target_length(&self) -> usize {
        (self.sample_rate as f64 * self.duration_secs as f64).floor() as usize
    }

    /// Fixed spectrogram width: `floor(target_length / hop_length) + 1`.
    pub fn target_frames(&self) -> usize {
        self.target_length() / self.hop_length + 1
    }

    /// Model input shape `(batch, mel bands, frames, channel)`.
    pub fn tensor_shape(&self) -> [usize; 4] {
        [1, self.n_mels, self.target_frames(), 1]
    }

    /// Whether `extension` (without the dot, any case) is accepted.
    pub fn extension_allowed(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|e| *e == extension)
    }

    /// Rejects degenerate values. Called once at analyzer construction.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.sample_rate == 0 {
            return Err(ClassifierError::Config("sample_rate must be positive".into()));
        }
        if !(self.duration_secs > 0.0) {
            return Err(ClassifierError::Config(
                "duration_secs must be positive".into(),
            ));
        }
        if self.n_mels == 0 {
            return Err(ClassifierError::Config("n_mels must be positive".into()));
        }
        if self.n_fft == 0 {
            return Err(ClassifierError::Config("n_fft must be positive".into()));
        }
        if self.hop_length == 0 || self.hop_length > self.n_fft {
            return Err(ClassifierError::Config(
                "hop_length must be in 1..=n_fft".into(),
            ));
        }
        if self.n_mels > self.n_fft / 2 + 1 {
            return Err(ClassifierError::Config(
                "n_mels exceeds the number of FFT bins".into(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(ClassifierError::Config(
                "max_file_size must be positive".into(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(ClassifierError::Config(
                "max_batch_size must be positive".into(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ClassifierError::Config(
                "allowed_extensions must not be empty".into(),
            ));
        }
        if self.positive_label.is_empty() {
            return Err(ClassifierError::Config(
                "positive_label must not be empty".into(),
            ));
        }
        Ok(())
    }
}
