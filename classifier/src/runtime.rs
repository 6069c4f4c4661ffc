//! ONNX Runtime backed model.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;

use crate::error::ClassifierError;
use crate::features::FeatureTensor;
use crate::model::CoughModel;

/// Configuration for [`OnnxModel`].
pub struct OnnxModelConfig {
    /// ONNX graph input name (default: "input").
    pub input_name: String,
}

impl Default for OnnxModelConfig {
    fn default() -> Self {
        Self {
            input_name: "input".to_string(),
        }
    }
}

/// [`CoughModel`] implementation backed by ONNX Runtime.
///
/// Weights and the label-order artifact are loaded exactly once; both
/// must be present or [`OnnxModel::load`] fails before the service can
/// accept requests. State is read-only afterwards.
///
/// # Thread Safety
///
/// `Session::run` needs `&mut self`, so the session sits behind a
/// `Mutex` and concurrent `infer` calls are serialized here. Callers
/// never lock anything themselves.
pub struct OnnxModel {
    session: Mutex<Session>,
    labels: Vec<String>,
    input_name: String,
}

impl OnnxModel {
    /// Loads the model weights and label mapping from disk.
    ///
    /// The label file is a JSON array of class names in model output
    /// order, e.g. `["negative", "positive"]`.
    pub fn load(
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
        cfg: OnnxModelConfig,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        let labels_path = labels_path.as_ref();

        if !model_path.exists() {
            return Err(ClassifierError::ArtifactMissing {
                path: model_path.display().to_string(),
            });
        }
        if !labels_path.exists() {
            return Err(ClassifierError::ArtifactMissing {
                path: labels_path.display().to_string(),
            });
        }

        let labels = parse_labels(labels_path)?;

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;

        tracing::info!(
            model = %model_path.display(),
            classes = ?labels,
            "model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
            input_name: cfg.input_name,
        })
    }
}

impl CoughModel for OnnxModel {
    fn infer(&self, features: &FeatureTensor) -> Result<Vec<f32>, ClassifierError> {
        let input = Tensor::from_array(features.clone())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("model session mutex poisoned".into()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let (_, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| ClassifierError::Inference("model produced no output".into()))?;

        let (_, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        Ok(data.to_vec())
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Reads the JSON label array, rejecting empty mappings.
fn parse_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let text = std::fs::read_to_string(path).map_err(|e| ClassifierError::Labels {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let labels: Vec<String> =
        serde_json::from_str(&text).map_err(|e| ClassifierError::Labels {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    if labels.is_empty() {
        return Err(ClassifierError::Labels {
            path: path.display().to_string(),
            reason: "label list is empty".into(),
        });
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("coughcheck-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_model_is_fatal() {
        let err = OnnxModel::load(
            "/nonexistent/model.onnx",
            "/nonexistent/labels.json",
            OnnxModelConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactMissing { ref path } if path.contains("model.onnx")));
    }

    #[test]
    fn missing_labels_is_fatal() {
        let model = temp_path("weights.onnx");
        std::fs::write(&model, b"placeholder").unwrap();

        let err = OnnxModel::load(
            &model,
            "/nonexistent/labels.json",
            OnnxModelConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactMissing { ref path } if path.contains("labels.json")));

        std::fs::remove_file(&model).ok();
    }

    #[test]
    fn parse_labels_reads_class_order() {
        let path = temp_path("labels-ok.json");
        std::fs::write(&path, br#"["negative", "positive"]"#).unwrap();

        let labels = parse_labels(&path).unwrap();
        assert_eq!(labels, vec!["negative".to_string(), "positive".to_string()]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn parse_labels_rejects_empty_list() {
        let path = temp_path("labels-empty.json");
        std::fs::write(&path, b"[]").unwrap();

        let err = parse_labels(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::Labels { .. }));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn parse_labels_rejects_malformed_json() {
        let path = temp_path("labels-bad.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = parse_labels(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::Labels { .. }));

        std::fs::remove_file(&path).ok();
    }
}
