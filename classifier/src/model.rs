use crate::error::ClassifierError;
use crate::features::FeatureTensor;

/// Scores a fixed-shape feature tensor against the known classes.
///
/// The input must be exactly the shape the implementation was loaded
/// for; see [`crate::PipelineConfig::tensor_shape`]. The output is one
/// probability per class, in the order reported by
/// [`CoughModel::labels`], summing to 1 within floating tolerance.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use. Loaded state is
/// read-only after construction; an implementation whose inference
/// engine is not reentrant must serialize calls internally rather than
/// exposing that constraint to callers.
pub trait CoughModel: Send + Sync {
    /// Runs the model on one feature tensor.
    ///
    /// Pure given the loaded state: the same tensor yields the same
    /// probability vector.
    fn infer(&self, features: &FeatureTensor) -> Result<Vec<f32>, ClassifierError>;

    /// Class labels in model output order.
    fn labels(&self) -> &[String];
}
