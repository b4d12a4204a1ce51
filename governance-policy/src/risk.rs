//! Risk scoring.

use governance_config::RiskScoringConfig;
use governance_primitives::{Risk, Severity};
use serde::{Deserialize, Serialize};

/// Score and bucketed level of a decision's risks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Numeric score in `[0, max_score]`.
    pub score: f64,
    /// Level bucket of the score.
    pub level: Severity,
}

/// Scores risk lists with the weights and thresholds of a [`RiskScoringConfig`].
///
/// The score is the highest single weight plus a penalty per unmitigated
/// `high`/`critical` risk, capped at the configured maximum. An empty list
/// scores `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer {
    config: RiskScoringConfig,
}

impl RiskScorer {
    /// Creates a scorer from validated configuration.
    #[must_use]
    pub const fn new(config: RiskScoringConfig) -> Self {
        Self { config }
    }

    /// Computes the score of `risks`.
    #[must_use]
    pub fn score(&self, risks: &[Risk]) -> f64 {
        let weights = &self.config.weights;
        let Some(max_weight) = risks
            .iter()
            .map(|risk| weights.weight(risk.severity))
            .reduce(f64::max)
        else {
            return 0.0;
        };
        let unmitigated = risks
            .iter()
            .filter(|risk| risk.severity.is_elevated() && !risk.is_mitigated())
            .count();
        #[allow(clippy::cast_precision_loss)]
        let penalty = self.config.unmitigated_penalty * unmitigated as f64;
        (max_weight + penalty).min(self.config.max_score)
    }

    /// Buckets a score into a level.
    #[must_use]
    pub fn level(&self, score: f64) -> Severity {
        self.config.thresholds.bucket(score)
    }

    /// Scores `risks` and buckets the result.
    ///
    /// An unmitigated critical risk always yields at least `high`, whatever
    /// the configured thresholds.
    #[must_use]
    pub fn assess(&self, risks: &[Risk]) -> RiskAssessment {
        let score = self.score(risks);
        let mut level = self.level(score);
        let unmitigated_critical = risks
            .iter()
            .any(|risk| risk.severity == Severity::Critical && !risk.is_mitigated());
        if unmitigated_critical {
            level = level.max(Severity::High);
        }
        RiskAssessment { score, level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> RiskScorer {
        RiskScorer::new(RiskScoringConfig::default())
    }

    #[test]
    fn no_risks_scores_zero() {
        let assessment = scorer().assess(&[]);
        assert!(assessment.score.abs() < f64::EPSILON);
        assert_eq!(assessment.level, Severity::Low);
    }

    #[test]
    fn unmitigated_elevated_risks_add_penalty() {
        let risks = [
            Risk::new("outage", Severity::High),
            Risk::new("churn", Severity::High).with_mitigation("retention plan"),
            Risk::new("delay", Severity::Medium),
        ];
        assert!((scorer().score(&risks) - 7.0).abs() < 1e-9);
        assert_eq!(scorer().assess(&risks).level, Severity::High);
    }

    #[test]
    fn score_is_capped() {
        let risks = vec![Risk::new("breach", Severity::Critical); 4];
        assert!((scorer().score(&risks) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn raising_any_severity_never_lowers_the_score() {
        let base = [
            Risk::new("a", Severity::Low),
            Risk::new("b", Severity::Medium).with_mitigation("hedge"),
            Risk::new("c", Severity::High),
        ];
        let scorer = scorer();
        for index in 0..base.len() {
            let mut previous = f64::MIN;
            for severity in Severity::ALL {
                let mut risks = base.clone();
                risks[index].severity = severity;
                let score = scorer.score(&risks);
                assert!(score >= previous, "score dropped at risk {index} -> {severity}");
                previous = score;
            }
        }
    }

    #[test]
    fn unmitigated_critical_is_at_least_high_with_loose_thresholds() {
        let mut config = RiskScoringConfig::default();
        config.thresholds.high = 20.0;
        config.thresholds.critical = 30.0;
        config.max_score = 30.0;
        let assessment = RiskScorer::new(config).assess(&[Risk::new("breach", Severity::Critical)]);
        assert_eq!(assessment.level, Severity::High);
    }
}
