//! Cough-audio classification core.
//!
//! # Architecture
//!
//! The pipeline turns an uploaded clip into a graded prediction in four
//! stages:
//!
//! 1. [`coughcheck_audio::Waveform::load`]: bytes -> mono waveform at the
//!    pipeline rate
//! 2. [`FeatureExtractor::extract`]: waveform -> fixed-shape mel tensor
//!    `(1, n_mels, frames, 1)`
//! 3. [`CoughModel::infer`]: tensor -> per-class probabilities
//!    ([`OnnxModel`] is the ONNX Runtime implementation)
//! 4. [`RiskLevel::derive`]: label + confidence -> risk grade
//!
//! [`Analyzer`] composes the stages and adds upload validation and batch
//! submission with per-clip outcomes.
//!
//! # Determinism
//!
//! Feature extraction must reproduce the training-time pipeline exactly;
//! every constant lives in [`PipelineConfig`] and is validated against
//! the loaded model once at startup. The model itself is loaded once per
//! process and is read-only afterwards.

mod analyzer;
mod config;
mod error;
pub mod features;
mod model;
mod prediction;
mod risk;
mod runtime;
pub mod spectrogram;

pub use analyzer::{Analyzer, BatchOutcome};
pub use config::PipelineConfig;
pub use error::ClassifierError;
pub use features::{FeatureExtractor, FeatureTensor};
pub use model::CoughModel;
pub use prediction::{ClassProbability, Prediction, PredictionStats};
pub use risk::RiskLevel;
pub use runtime::{OnnxModel, OnnxModelConfig};
