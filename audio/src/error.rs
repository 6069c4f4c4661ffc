use thiserror::Error;

/// Errors returned by waveform loading.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The byte stream could not be recognized or parsed as audio.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Decoding succeeded but produced zero samples.
    #[error("decoded audio is empty")]
    EmptyAudio,

    /// A packet-level decoder failure partway through the stream.
    #[error("audio decode failed: {0}")]
    Decode(String),

    /// Sample rate conversion failed.
    #[error("resampling failed: {0}")]
    Resample(String),
}
