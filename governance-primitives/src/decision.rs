//! Decision records produced by the upstream extraction collaborator.
//!
//! A [`Decision`] is read-only once built. Every collection defaults to empty
//! during deserialization so partially extracted records degrade to safe
//! defaults instead of failing.

use serde::{Deserialize, Deserializer, Serialize};

use crate::Severity;

/// Organizational outcome targeted by a decision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// What the decision is trying to achieve.
    #[serde(default)]
    pub description: String,
    /// How progress toward the goal is measured.
    #[serde(default, alias = "target_metric", skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

impl Goal {
    /// Creates a goal with the supplied description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            metric: None,
        }
    }

    /// Sets the target metric.
    #[must_use]
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }
}

/// Key performance indicator attached to a decision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    /// Indicator name.
    #[serde(default)]
    pub name: String,
    /// Target value or outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Measurement cadence.
    #[serde(
        default,
        alias = "measurement_frequency",
        skip_serializing_if = "Option::is_none"
    )]
    pub frequency: Option<String>,
}

impl Kpi {
    /// Creates a KPI with a name and target.
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: Some(target.into()),
            frequency: None,
        }
    }

    /// Sets the measurement frequency.
    #[must_use]
    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }
}

/// Potential failure vector listed on a decision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    /// Description of the risk.
    #[serde(default)]
    pub description: String,
    /// Severity; absent values default to `medium`.
    #[serde(default, deserialize_with = "severity_or_default")]
    pub severity: Severity,
    /// Planned mitigation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

impl Risk {
    /// Creates an unmitigated risk.
    #[must_use]
    pub fn new(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            description: description.into(),
            severity,
            mitigation: None,
        }
    }

    /// Attaches a mitigation plan.
    #[must_use]
    pub fn with_mitigation(mut self, mitigation: impl Into<String>) -> Self {
        self.mitigation = Some(mitigation.into());
        self
    }

    /// Returns the mitigation text when it is present and non-blank.
    #[must_use]
    pub fn mitigation(&self) -> Option<&str> {
        self.mitigation
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Returns `true` when a non-blank mitigation exists.
    #[must_use]
    pub fn is_mitigated(&self) -> bool {
        self.mitigation().is_some()
    }
}

/// Accountable person or role.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Owner name.
    #[serde(default)]
    pub name: String,
    /// Job title or functional role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Authority level in the organisation hierarchy; `0` when unknown.
    #[serde(default, alias = "level")]
    pub authority_level: u32,
    /// Specific accountability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsibility: Option<String>,
}

impl Owner {
    /// Creates an owner with a name and role.
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Some(role.into()),
            authority_level: 0,
            responsibility: None,
        }
    }

    /// Sets the owner's authority level.
    #[must_use]
    pub fn with_authority(mut self, level: u32) -> Self {
        self.authority_level = level;
        self
    }

    /// Sets the owner's responsibility statement.
    #[must_use]
    pub fn with_responsibility(mut self, responsibility: impl Into<String>) -> Self {
        self.responsibility = Some(responsibility.into());
        self
    }
}

/// Implicit belief underlying the decision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumption {
    /// Assumption text.
    #[serde(default)]
    pub description: String,
    /// How critical the assumption is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,
}

impl Assumption {
    /// Creates an assumption.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            criticality: None,
        }
    }
}

/// Structured organizational decision, the subject of governance evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default, alias = "decision_statement")]
    statement: String,
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    kpis: Vec<Kpi>,
    #[serde(default)]
    risks: Vec<Risk>,
    #[serde(default)]
    owners: Vec<Owner>,
    #[serde(default)]
    required_approvals: Vec<String>,
    #[serde(default)]
    assumptions: Vec<Assumption>,
    #[serde(default)]
    confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strategic_impact: Option<Severity>,
}

impl Decision {
    /// Starts a builder for a decision with the supplied statement.
    #[must_use]
    pub fn builder(statement: impl Into<String>) -> DecisionBuilder {
        DecisionBuilder {
            inner: Self {
                statement: statement.into(),
                confidence: 1.0,
                ..Self::default()
            },
        }
    }

    /// Returns the decision statement.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Returns `true` when the statement contains non-whitespace text.
    #[must_use]
    pub fn has_statement(&self) -> bool {
        !self.statement.trim().is_empty()
    }

    /// Returns the targeted goals.
    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Returns the KPIs.
    #[must_use]
    pub fn kpis(&self) -> &[Kpi] {
        &self.kpis
    }

    /// Returns the listed risks.
    #[must_use]
    pub fn risks(&self) -> &[Risk] {
        &self.risks
    }

    /// Returns the accountable owners.
    #[must_use]
    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    /// Returns approval roles named during extraction.
    #[must_use]
    pub fn required_approvals(&self) -> &[String] {
        &self.required_approvals
    }

    /// Returns the assumptions.
    #[must_use]
    pub fn assumptions(&self) -> &[Assumption] {
        &self.assumptions
    }

    /// Returns the extraction confidence clamped into `[0, 1]` (`NaN` reads as 0).
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        }
    }

    /// Returns the declared strategic impact, if any.
    #[must_use]
    pub fn strategic_impact(&self) -> Option<Severity> {
        self.strategic_impact
    }

    /// Lower-cased statement and goal descriptions joined by spaces.
    ///
    /// This is the text that keyword and budget detection run against.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        let mut text = self.statement.to_lowercase();
        for goal in &self.goals {
            text.push(' ');
            text.push_str(&goal.description.to_lowercase());
        }
        text
    }

    /// Iterates risks at `severity` that have no mitigation.
    pub fn unmitigated(&self, severity: Severity) -> impl Iterator<Item = &Risk> {
        self.risks
            .iter()
            .filter(move |risk| risk.severity == severity && !risk.is_mitigated())
    }
}

/// Builder used to assemble [`Decision`] values in code and tests.
#[derive(Debug)]
pub struct DecisionBuilder {
    inner: Decision,
}

impl DecisionBuilder {
    /// Adds a goal.
    #[must_use]
    pub fn goal(mut self, goal: Goal) -> Self {
        self.inner.goals.push(goal);
        self
    }

    /// Adds a KPI.
    #[must_use]
    pub fn kpi(mut self, kpi: Kpi) -> Self {
        self.inner.kpis.push(kpi);
        self
    }

    /// Adds a risk.
    #[must_use]
    pub fn risk(mut self, risk: Risk) -> Self {
        self.inner.risks.push(risk);
        self
    }

    /// Adds an owner.
    #[must_use]
    pub fn owner(mut self, owner: Owner) -> Self {
        self.inner.owners.push(owner);
        self
    }

    /// Adds a required-approval role name.
    #[must_use]
    pub fn required_approval(mut self, role: impl Into<String>) -> Self {
        self.inner.required_approvals.push(role.into());
        self
    }

    /// Adds an assumption.
    #[must_use]
    pub fn assumption(mut self, assumption: Assumption) -> Self {
        self.inner.assumptions.push(assumption);
        self
    }

    /// Sets the extraction confidence.
    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.inner.confidence = confidence;
        self
    }

    /// Sets the strategic impact.
    #[must_use]
    pub fn strategic_impact(mut self, impact: Severity) -> Self {
        self.inner.strategic_impact = Some(impact);
        self
    }

    /// Finalises the decision.
    #[must_use]
    pub fn build(self) -> Decision {
        self.inner
    }
}

fn severity_or_default<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|value| value.parse::<Severity>().ok())
        .unwrap_or_default())
}
