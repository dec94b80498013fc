//! Connection quality classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality label derived from a back-end's mean load time
///
/// Thresholds are per back-end so that normal performance of a slow
/// platform is not reported as poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
}

impl QualityLabel {
    /// Classify a mean load time against ascending thresholds (ms)
    ///
    /// `mean < t[0]` is excellent, `< t[1]` good, `< t[2]` fair, `< t[3]`
    /// poor, anything else bad.
    pub fn from_mean_load_time(mean_ms: f64, thresholds_ms: &[f64; 4]) -> Self {
        if mean_ms < thresholds_ms[0] {
            QualityLabel::Excellent
        } else if mean_ms < thresholds_ms[1] {
            QualityLabel::Good
        } else if mean_ms < thresholds_ms[2] {
            QualityLabel::Fair
        } else if mean_ms < thresholds_ms[3] {
            QualityLabel::Poor
        } else {
            QualityLabel::Bad
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Excellent => "excellent",
            QualityLabel::Good => "good",
            QualityLabel::Fair => "fair",
            QualityLabel::Poor => "poor",
            QualityLabel::Bad => "bad",
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: [f64; 4] = [500.0, 1000.0, 2000.0, 4000.0];
    const SLOW: [f64; 4] = [2000.0, 4000.0, 6000.0, 10000.0];

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(QualityLabel::from_mean_load_time(0.0, &FAST), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_mean_load_time(499.9, &FAST), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_mean_load_time(500.0, &FAST), QualityLabel::Good);
        assert_eq!(QualityLabel::from_mean_load_time(1500.0, &FAST), QualityLabel::Fair);
        assert_eq!(QualityLabel::from_mean_load_time(3999.0, &FAST), QualityLabel::Poor);
        assert_eq!(QualityLabel::from_mean_load_time(4000.0, &FAST), QualityLabel::Bad);
    }

    #[test]
    fn test_slow_backend_uses_looser_bands() {
        // 3 seconds is poor on a fast back-end but good on a slow one
        assert_eq!(QualityLabel::from_mean_load_time(3000.0, &FAST), QualityLabel::Poor);
        assert_eq!(QualityLabel::from_mean_load_time(3000.0, &SLOW), QualityLabel::Good);
    }
}
