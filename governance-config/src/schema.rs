//! Strongly typed configuration schemas.

use std::time::Duration;

use governance_primitives::Severity;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Weight assigned to each risk severity by the risk scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    /// Weight of a `low` risk.
    pub low: f64,
    /// Weight of a `medium` risk.
    pub medium: f64,
    /// Weight of a `high` risk.
    pub high: f64,
    /// Weight of a `critical` risk.
    pub critical: f64,
}

impl SeverityWeights {
    /// Returns the weight for `severity`.
    #[must_use]
    pub const fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            low: 1.0,
            medium: 3.0,
            high: 6.0,
            critical: 9.0,
        }
    }
}

/// Lower bounds of the medium, high, and critical risk levels.
///
/// A score below `medium` is `low`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Minimum score for `medium`.
    pub medium: f64,
    /// Minimum score for `high`.
    pub high: f64,
    /// Minimum score for `critical`.
    pub critical: f64,
}

impl RiskThresholds {
    /// Maps a score to its risk level.
    #[must_use]
    pub fn bucket(&self, score: f64) -> Severity {
        if score >= self.critical {
            Severity::Critical
        } else if score >= self.high {
            Severity::High
        } else if score >= self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 3.0,
            high: 6.0,
            critical: 9.0,
        }
    }
}

/// Constants used by the risk scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScoringConfig {
    /// Per-severity weights; the highest single weight seeds the score.
    pub weights: SeverityWeights,
    /// Added once for every unmitigated `high` or `critical` risk.
    pub unmitigated_penalty: f64,
    /// Upper bound of the score.
    pub max_score: f64,
    /// Score to level thresholds.
    pub thresholds: RiskThresholds,
}

impl Default for RiskScoringConfig {
    fn default() -> Self {
        Self {
            weights: SeverityWeights::default(),
            unmitigated_penalty: 1.0,
            max_score: 10.0,
            thresholds: RiskThresholds::default(),
        }
    }
}

impl RiskScoringConfig {
    /// Checks that weights and thresholds are ordered so that scoring stays monotonic.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when weights or thresholds are not
    /// strictly increasing, are negative, or when the penalty is negative.
    pub fn validate(&self) -> ConfigResult<()> {
        let weights = Severity::ALL.map(|severity| self.weights.weight(severity));
        if weights[0] < 0.0 || weights.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::invalid(
                "risk.weights",
                "weights must be non-negative and strictly increasing from low to critical",
            ));
        }
        let thresholds = [
            self.thresholds.medium,
            self.thresholds.high,
            self.thresholds.critical,
        ];
        if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::invalid(
                "risk.thresholds",
                "thresholds must be strictly increasing from medium to critical",
            ));
        }
        if self.unmitigated_penalty < 0.0 {
            return Err(ConfigError::invalid(
                "risk.unmitigated_penalty",
                "penalty cannot be negative",
            ));
        }
        if self.max_score < self.thresholds.critical {
            return Err(ConfigError::invalid(
                "risk.max_score",
                "max score must reach the critical threshold",
            ));
        }
        Ok(())
    }
}

/// Thresholds used by the flag detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    /// Budget at which `FINANCIAL_THRESHOLD_EXCEEDED` fires.
    pub financial_threshold: f64,
    /// Budget at which `MAJOR_INVESTMENT` fires.
    pub major_investment_threshold: f64,
    /// Confidence below which `LOW_CONFIDENCE` fires.
    pub low_confidence_floor: f64,
    /// Confidence below which a human review is requested.
    pub human_review_confidence: f64,
    /// More flags than this requests a human review.
    pub human_review_flag_count: usize,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            financial_threshold: 100_000.0,
            major_investment_threshold: 1_000_000.0,
            low_confidence_floor: 0.6,
            human_review_confidence: 0.7,
            human_review_flag_count: 2,
        }
    }
}

/// Budget values inferred when a decision mentions money without an amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Used when a financial keyword appears without an explicit amount.
    pub inferred_financial_budget: f64,
    /// Floor used when a strategic keyword appears without an explicit amount.
    pub inferred_strategic_budget: f64,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            inferred_financial_budget: 50_000.0,
            inferred_strategic_budget: 75_000.0,
        }
    }
}

/// Gap between deterministic confidence and the external-analysis floor.
const EXTERNAL_CONFIDENCE_MARGIN: f64 = 0.1;

/// Settings for the graph reasoner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningSettings {
    /// Confidence reported by the deterministic analysis.
    pub deterministic_confidence: f64,
    /// Default budget for the external reasoning call, in milliseconds.
    pub external_timeout_ms: u64,
    /// Minimum owner authority for `low`, `medium`, `high`, `critical` governance severity.
    pub owner_authority_by_severity: [u32; 4],
}

impl ReasoningSettings {
    /// Returns the default external-call timeout.
    #[must_use]
    pub const fn external_timeout(&self) -> Duration {
        Duration::from_millis(self.external_timeout_ms)
    }

    /// Returns the owner authority required when governance severity is `severity`.
    #[must_use]
    pub fn required_owner_authority(&self, severity: Severity) -> u32 {
        self.owner_authority_by_severity[usize::from(severity.rank() - 1)]
    }

    /// Lowest confidence an external analysis may report.
    ///
    /// Sits above [`ReasoningSettings::deterministic_confidence`] so a fallback
    /// always shows up as lowered confidence.
    #[must_use]
    pub fn external_confidence_floor(&self) -> f64 {
        (self.deterministic_confidence + EXTERNAL_CONFIDENCE_MARGIN).min(1.0)
    }
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            deterministic_confidence: 0.6,
            external_timeout_ms: 30_000,
            owner_authority_by_severity: [1, 2, 3, 4],
        }
    }
}

/// Settings for graph context retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Hops traversed from the Action node when building reasoning context.
    pub context_depth: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self { context_depth: 2 }
    }
}

/// Top-level governance configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Risk scoring constants.
    pub risk: RiskScoringConfig,
    /// Flag thresholds.
    pub flags: FlagThresholds,
    /// Derived-attribute constants.
    pub derivation: DerivationConfig,
    /// Reasoner settings.
    pub reasoning: ReasoningSettings,
    /// Graph settings.
    pub graph: GraphSettings,
}

impl GovernanceConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] encountered.
    pub fn validate(&self) -> ConfigResult<()> {
        self.risk.validate()?;
        if self.flags.financial_threshold > self.flags.major_investment_threshold {
            return Err(ConfigError::invalid(
                "flags.major_investment_threshold",
                "major investment threshold must not be below the financial threshold",
            ));
        }
        let confidence = self.reasoning.deterministic_confidence;
        if !(0.0..1.0).contains(&confidence) {
            return Err(ConfigError::invalid(
                "reasoning.deterministic_confidence",
                format!("{confidence} is outside [0, 1); external analysis must be able to exceed it"),
            ));
        }
        if self.reasoning.external_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "reasoning.external_timeout_ms",
                "timeout must be positive",
            ));
        }
        Ok(())
    }
}

/// Person in the company approval hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Stable identifier (e.g. `P003`).
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Role title (e.g. `CFO`).
    #[serde(default)]
    pub role: String,
    /// Authority level; higher outranks lower.
    #[serde(default = "default_level")]
    pub level: u32,
}

const fn default_level() -> u32 {
    1
}

impl Person {
    /// Creates a person record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        level: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            level,
        }
    }
}

/// Approver identities and authority hierarchy of one organisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyContext {
    /// Company display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Personnel eligible to approve.
    #[serde(default)]
    pub personnel: Vec<Person>,
}

impl CompanyContext {
    /// Creates a context from a personnel list.
    #[must_use]
    pub fn new(personnel: Vec<Person>) -> Self {
        Self {
            name: None,
            personnel,
        }
    }

    /// Finds a person by id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Person> {
        self.personnel.iter().find(|person| person.id == id)
    }

    /// Finds the first person holding `role`, compared case-insensitively.
    #[must_use]
    pub fn find_by_role(&self, role: &str) -> Option<&Person> {
        let role = role.trim();
        self.personnel
            .iter()
            .find(|person| person.role.trim().eq_ignore_ascii_case(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        GovernanceConfig::default().validate().unwrap();
    }

    #[test]
    fn non_monotonic_weights_are_rejected() {
        let mut config = GovernanceConfig::default();
        config.risk.weights.high = 2.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "risk.weights", .. }));
    }

    #[test]
    fn thresholds_bucket_scores() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.bucket(0.0), Severity::Low);
        assert_eq!(thresholds.bucket(3.0), Severity::Medium);
        assert_eq!(thresholds.bucket(8.99), Severity::High);
        assert_eq!(thresholds.bucket(10.0), Severity::Critical);
    }

    #[test]
    fn company_lookup_by_role_ignores_case() {
        let company = CompanyContext::new(vec![Person::new("P1", "Dana", "CFO", 4)]);
        assert_eq!(company.find_by_role("cfo").map(|p| p.id.as_str()), Some("P1"));
        assert!(company.find_by_role("CEO").is_none());
        assert!(company.find_by_id("P1").is_some());
    }

    #[test]
    fn owner_authority_follows_severity() {
        let settings = ReasoningSettings::default();
        assert_eq!(settings.required_owner_authority(Severity::Low), 1);
        assert_eq!(settings.required_owner_authority(Severity::Critical), 4);
    }

    #[test]
    fn deterministic_confidence_must_leave_room_above() {
        let mut config = GovernanceConfig::default();
        config.reasoning.deterministic_confidence = 1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "reasoning.deterministic_confidence", .. }
        ));

        config.reasoning.deterministic_confidence = 0.95;
        assert!(config.validate().is_ok());
        let floor = config.reasoning.external_confidence_floor();
        assert!(floor > 0.95 && floor <= 1.0);
    }
}
