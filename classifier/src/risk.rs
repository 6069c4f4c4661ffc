use std::fmt;

use serde::Serialize;

/// Risk grade derived from a prediction. Deterministic; no model
/// involvement beyond the predicted label and its confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    None,
}

impl RiskLevel {
    /// Applies the fixed decision table.
    ///
    /// For the positive class: confidence in (0.8, 1.0] is High,
    /// (0.6, 0.8] is Medium, and everything at or below 0.6 is Low.
    /// Any other label is None regardless of confidence.
    pub fn derive(label: &str, confidence: f32, positive_label: &str) -> Self {
        if label != positive_label {
            return RiskLevel::None;
        }
        if confidence > 0.8 {
            RiskLevel::High
        } else if confidence > 0.6 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
            Self::None => write!(f, "NONE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_band_boundaries() {
        let cases = [
            (0.59, RiskLevel::Low),
            (0.6, RiskLevel::Low),
            (0.61, RiskLevel::Medium),
            (0.8, RiskLevel::Medium),
            (0.81, RiskLevel::High),
            (1.0, RiskLevel::High),
        ];
        for (confidence, expected) in cases {
            assert_eq!(
                RiskLevel::derive("positive", confidence, "positive"),
                expected,
                "confidence {confidence}"
            );
        }
    }

    #[test]
    fn negative_is_always_none() {
        for confidence in [0.0, 0.5, 0.85, 1.0] {
            assert_eq!(
                RiskLevel::derive("negative", confidence, "positive"),
                RiskLevel::None
            );
        }
    }

    #[test]
    fn unknown_label_is_none() {
        assert_eq!(
            RiskLevel::derive("inconclusive", 0.99, "positive"),
            RiskLevel::None
        );
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(RiskLevel::High.to_string(), "HIGH");
        assert_eq!(RiskLevel::Medium.to_string(), "MEDIUM");
        assert_eq!(RiskLevel::Low.to_string(), "LOW");
        assert_eq!(RiskLevel::None.to_string(), "NONE");
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"HIGH\"");
        assert_eq!(serde_json::to_string(&RiskLevel::None).unwrap(), "\"NONE\"");
    }
}
