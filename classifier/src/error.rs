use thiserror::Error;

use coughcheck_audio::AudioError;

/// Errors returned by the classification pipeline.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// A model artifact (weights or label file) is absent at startup.
    #[error("model artifact missing: {path}")]
    ArtifactMissing { path: String },

    /// The ONNX session could not be created from the weights file.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The label file could not be read or parsed.
    #[error("label file {path}: {reason}")]
    Labels { path: String, reason: String },

    /// The pipeline configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Waveform loading failed.
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// The uploaded filename has no allowed audio extension.
    #[error("unsupported file extension: {extension:?}")]
    UnsupportedExtension { extension: String },

    /// The uploaded clip exceeds the configured size limit.
    #[error("file too large: {got} bytes exceeds limit of {limit}")]
    FileTooLarge { got: usize, limit: usize },

    /// More clips were submitted than a single batch allows.
    #[error("batch too large: {got} clips exceeds limit of {limit}")]
    BatchTooLarge { got: usize, limit: usize },

    /// The assembled feature tensor does not match the model input shape.
    /// Always a configuration drift between extractor and model, never
    /// bad input.
    #[error("feature tensor shape {got:?} does not match expected {expected:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        got: [usize; 4],
    },

    /// Model execution failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model returned a probability vector of the wrong length.
    #[error("model returned {got} probabilities for {expected} labels")]
    OutputMismatch { expected: usize, got: usize },
}

impl ClassifierError {
    /// Whether the error was caused by the uploaded clip rather than the
    /// service. Client errors map to 4xx in the serving layer; everything
    /// else is a server-side fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClassifierError::Audio(AudioError::UnsupportedFormat(_))
                | ClassifierError::Audio(AudioError::EmptyAudio)
                | ClassifierError::Audio(AudioError::Decode(_))
                | ClassifierError::UnsupportedExtension { .. }
                | ClassifierError::FileTooLarge { .. }
                | ClassifierError::BatchTooLarge { .. }
        )
    }
}
