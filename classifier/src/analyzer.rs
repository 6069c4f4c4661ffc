//! Analysis orchestration: upload validation, loader, extractor, model.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use ndarray::Array4;

use coughcheck_audio::Waveform;

use crate::config::PipelineConfig;
use crate::error::ClassifierError;
use crate::features::FeatureExtractor;
use crate::model::CoughModel;
use crate::prediction::{ClassProbability, Prediction};
use crate::risk::RiskLevel;

/// Result of one clip inside a batch submission.
#[derive(Debug)]
pub struct BatchOutcome {
    pub filename: String,
    pub result: Result<Prediction, ClassifierError>,
}

/// Sequences the full pipeline for uploaded clips.
///
/// Holds the validated configuration, the precomputed feature extractor,
/// and shared ownership of the loaded model. Construction runs a
/// zero-valued warm-up inference so a shape drift between configuration
/// and model fails at startup instead of on the first request.
pub struct Analyzer {
    cfg: PipelineConfig,
    extractor: FeatureExtractor,
    model: Arc<dyn CoughModel>,
}

impl Analyzer {
    pub fn new(cfg: PipelineConfig, model: Arc<dyn CoughModel>) -> Result<Self, ClassifierError> {
        cfg.validate()?;
        if model.labels().is_empty() {
            return Err(ClassifierError::Config("model has no labels".into()));
        }

        let extractor = FeatureExtractor::new(&cfg);

        let [b, m, t, c] = cfg.tensor_shape();
        let warmup = Array4::zeros((b, m, t, c));
        let probabilities = model.infer(&warmup)?;
        if probabilities.len() != model.labels().len() {
            return Err(ClassifierError::OutputMismatch {
                expected: model.labels().len(),
                got: probabilities.len(),
            });
        }
        tracing::info!(
            input_shape = ?cfg.tensor_shape(),
            classes = model.labels().len(),
            "pipeline validated against model"
        );

        Ok(Self {
            cfg,
            extractor,
            model,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Analyzes one uploaded clip.
    ///
    /// `filename` supplies the container hint and is checked against the
    /// configured extension allow-list before any decoding happens.
    pub fn analyze(&self, bytes: &[u8], filename: &str) -> Result<Prediction, ClassifierError> {
        self.validate_upload(bytes, filename)?;

        let waveform = Waveform::load(bytes, extension_of(filename), self.cfg.sample_rate)?;
        tracing::debug!(
            filename,
            samples = waveform.len(),
            duration_secs = waveform.duration_secs(),
            "clip loaded"
        );

        let features = self.extractor.extract(&waveform)?;
        let probabilities = self.model.infer(&features)?;

        let labels = self.model.labels();
        if probabilities.len() != labels.len() {
            return Err(ClassifierError::OutputMismatch {
                expected: labels.len(),
                got: probabilities.len(),
            });
        }

        let (best_idx, &confidence) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .ok_or_else(|| ClassifierError::Inference("empty probability vector".into()))?;

        let label = labels[best_idx].clone();
        let risk = RiskLevel::derive(&label, confidence, &self.cfg.positive_label);
        let probabilities = labels
            .iter()
            .zip(probabilities.iter())
            .map(|(label, &probability)| ClassProbability {
                label: label.clone(),
                probability,
            })
            .collect();

        let prediction = Prediction {
            label,
            confidence,
            probabilities,
            risk,
        };
        tracing::debug!(
            filename,
            label = %prediction.label,
            confidence = prediction.confidence,
            risk = %prediction.risk,
            "clip analyzed"
        );
        Ok(prediction)
    }

    /// Analyzes several clips with independent outcomes.
    ///
    /// A failing clip is recorded and the rest of the batch continues.
    /// Only an oversized batch is rejected as a whole, before any clip
    /// is processed.
    pub fn analyze_batch<'a, I>(&self, clips: I) -> Result<Vec<BatchOutcome>, ClassifierError>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let clips: Vec<_> = clips.into_iter().collect();
        if clips.len() > self.cfg.max_batch_size {
            return Err(ClassifierError::BatchTooLarge {
                got: clips.len(),
                limit: self.cfg.max_batch_size,
            });
        }

        let outcomes = clips
            .into_iter()
            .map(|(filename, bytes)| {
                let result = self.analyze(bytes, filename);
                if let Err(e) = &result {
                    tracing::warn!(filename, error = %e, "clip failed in batch");
                }
                BatchOutcome {
                    filename: filename.to_string(),
                    result,
                }
            })
            .collect();
        Ok(outcomes)
    }

    fn validate_upload(&self, bytes: &[u8], filename: &str) -> Result<(), ClassifierError> {
        let extension = extension_of(filename).unwrap_or("");
        if !self.cfg.extension_allowed(extension) {
            return Err(ClassifierError::UnsupportedExtension {
                extension: extension.to_string(),
            });
        }
        if bytes.len() > self.cfg.max_file_size {
            return Err(ClassifierError::FileTooLarge {
                got: bytes.len(),
                limit: self.cfg.max_file_size,
            });
        }
        if bytes.is_empty() {
            return Err(ClassifierError::Audio(
                coughcheck_audio::AudioError::EmptyAudio,
            ));
        }
        Ok(())
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureTensor;
    use coughcheck_audio::AudioError;
    use std::io::Cursor;

    struct StubModel {
        labels: Vec<String>,
        probabilities: Vec<f32>,
    }

    impl CoughModel for StubModel {
        fn infer(&self, _features: &FeatureTensor) -> Result<Vec<f32>, ClassifierError> {
            Ok(self.probabilities.clone())
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    fn stub(probabilities: Vec<f32>) -> Arc<StubModel> {
        Arc::new(StubModel {
            labels: vec!["negative".to_string(), "positive".to_string()],
            probabilities,
        })
    }

    fn analyzer(probabilities: Vec<f32>) -> Analyzer {
        Analyzer::new(PipelineConfig::default(), stub(probabilities)).unwrap()
    }

    fn sine_wav(freq: f32, sample_rate: u32, seconds: f32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let n = (sample_rate as f32 * seconds) as usize;
            for i in 0..n {
                let t = i as f32 / sample_rate as f32;
                let sample = ((2.0 * std::f32::consts::PI * freq * t).sin() * 16000.0) as i16;
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn analyze_sine_clip_end_to_end() {
        let analyzer = analyzer(vec![0.25, 0.75]);
        let clip = sine_wav(440.0, 22050, 1.0);

        let prediction = analyzer.analyze(&clip, "cough.wav").unwrap();
        assert_eq!(prediction.label, "positive");
        assert!((prediction.confidence - 0.75).abs() < 1e-6);
        assert_eq!(prediction.risk, RiskLevel::Medium);
        assert_eq!(prediction.probabilities.len(), 2);

        let sum: f32 = prediction.probabilities.iter().map(|p| p.probability).sum();
        assert!((sum - 1.0).abs() < 1e-4, "probabilities sum to {sum}");
    }

    #[test]
    fn negative_prediction_has_no_risk() {
        let analyzer = analyzer(vec![0.9, 0.1]);
        let clip = sine_wav(200.0, 22050, 0.5);

        let prediction = analyzer.analyze(&clip, "cough.wav").unwrap();
        assert_eq!(prediction.label, "negative");
        assert_eq!(prediction.risk, RiskLevel::None);
    }

    #[test]
    fn disallowed_extension_rejected_before_decode() {
        let analyzer = analyzer(vec![0.5, 0.5]);
        let err = analyzer.analyze(b"anything", "payload.exe").unwrap_err();
        assert!(
            matches!(err, ClassifierError::UnsupportedExtension { ref extension } if extension == "exe")
        );
    }

    #[test]
    fn missing_extension_rejected() {
        let analyzer = analyzer(vec![0.5, 0.5]);
        let err = analyzer.analyze(b"anything", "no-extension").unwrap_err();
        assert!(matches!(err, ClassifierError::UnsupportedExtension { .. }));
    }

    #[test]
    fn oversized_upload_rejected() {
        let cfg = PipelineConfig {
            max_file_size: 64,
            ..Default::default()
        };
        let analyzer = Analyzer::new(cfg, stub(vec![0.5, 0.5])).unwrap();
        let err = analyzer.analyze(&vec![0u8; 65], "clip.wav").unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::FileTooLarge { got: 65, limit: 64 }
        ));
    }

    #[test]
    fn empty_upload_is_empty_audio() {
        let analyzer = analyzer(vec![0.5, 0.5]);
        let err = analyzer.analyze(&[], "clip.wav").unwrap_err();
        assert!(matches!(err, ClassifierError::Audio(AudioError::EmptyAudio)));
    }

    #[test]
    fn garbage_bytes_are_unsupported_format() {
        let analyzer = analyzer(vec![0.5, 0.5]);
        let err = analyzer
            .analyze(b"plain text, not audio", "clip.wav")
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::Audio(AudioError::UnsupportedFormat(_))
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn batch_keeps_going_past_a_corrupt_clip() {
        let analyzer = analyzer(vec![0.2, 0.8]);
        let good = sine_wav(440.0, 22050, 0.5);
        let corrupt = b"corrupt bytes".to_vec();

        let outcomes = analyzer
            .analyze_batch([
                ("a.wav", good.as_slice()),
                ("b.wav", corrupt.as_slice()),
                ("c.wav", good.as_slice()),
            ])
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
        assert!(outcomes[2].result.is_ok());
        assert_eq!(outcomes[1].filename, "b.wav");
    }

    #[test]
    fn oversized_batch_rejected_whole() {
        let analyzer = analyzer(vec![0.5, 0.5]);
        let clip = sine_wav(440.0, 22050, 0.1);
        let clips: Vec<(&str, &[u8])> = (0..11).map(|_| ("x.wav", clip.as_slice())).collect();

        let err = analyzer.analyze_batch(clips).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::BatchTooLarge { got: 11, limit: 10 }
        ));
    }

    #[test]
    fn warmup_catches_output_length_drift() {
        // Three probabilities for a two-label model.
        let err = Analyzer::new(PipelineConfig::default(), stub(vec![0.2, 0.3, 0.5]))
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::OutputMismatch { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let cfg = PipelineConfig {
            hop_length: 0,
            ..Default::default()
        };
        let err = Analyzer::new(cfg, stub(vec![0.5, 0.5])).unwrap_err();
        assert!(matches!(err, ClassifierError::Config(_)));
    }

    #[test]
    fn extension_of_takes_last_component() {
        assert_eq!(extension_of("cough.wav"), Some("wav"));
        assert_eq!(extension_of("archive.tar.mp3"), Some("mp3"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(""), None);
    }
}
