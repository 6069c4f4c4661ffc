use serde::Serialize;

use crate::risk::RiskLevel;

/// One class and its predicted probability.
#[derive(Debug, Clone, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f32,
}

/// Outcome of analyzing one clip. Immutable once produced; the caller
/// owns it and the serving layer persists it if desired.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Argmax class label.
    pub label: String,
    /// Probability of the argmax class, in [0, 1].
    pub confidence: f32,
    /// Full probability vector in model label order.
    pub probabilities: Vec<ClassProbability>,
    /// Risk grade from the decision table.
    pub risk: RiskLevel,
}

/// Aggregate view over a set of predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionStats {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub mean_confidence: f32,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

impl PredictionStats {
    /// Summarizes `predictions`, counting `positive_label` matches as
    /// positive and everything else as negative.
    pub fn summarize(predictions: &[Prediction], positive_label: &str) -> Self {
        let total = predictions.len();
        if total == 0 {
            return Self::default();
        }

        let positive = predictions
            .iter()
            .filter(|p| p.label == positive_label)
            .count();
        let mean_confidence = predictions.iter().map(|p| p.confidence as f64).sum::<f64>()
            / total as f64;

        let count_risk = |level: RiskLevel| predictions.iter().filter(|p| p.risk == level).count();

        Self {
            total,
            positive,
            negative: total - positive,
            mean_confidence: mean_confidence as f32,
            high_risk: count_risk(RiskLevel::High),
            medium_risk: count_risk(RiskLevel::Medium),
            low_risk: count_risk(RiskLevel::Low),
        }
    }
}
