//! Reasoning output records.

use std::fmt::{self, Display, Formatter};

use governance_primitives::Severity;
use serde::{Deserialize, Serialize};

/// How a [`ReasoningResult`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    /// Fixed structural checks.
    Deterministic,
    /// External reasoning collaborator.
    External,
}

impl AnalysisMethod {
    /// Returns the method tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::External => "external",
        }
    }
}

impl Display for AnalysisMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the result a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// Facts in the graph disagree with each other.
    Contradiction,
    /// Ownership is missing, disconnected, or lacks authority.
    Ownership,
    /// Risks lack mitigation or assessment.
    RiskCoverage,
    /// Policies pull the same approver in different directions.
    PolicyConflict,
}

/// One issue found in a governance subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Category.
    pub category: FindingCategory,
    /// Stable machine-readable code, e.g. `ownership_missing`.
    pub code: String,
    /// Severity.
    pub severity: Severity,
    /// What was found.
    pub description: String,
    /// What to do about it.
    pub recommendation: String,
    /// Nodes involved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_ids: Vec<String>,
}

impl Finding {
    /// Creates a finding without node references.
    #[must_use]
    pub fn new(
        category: FindingCategory,
        code: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            severity,
            description: description.into(),
            recommendation: recommendation.into(),
            node_ids: Vec::new(),
        }
    }

    /// Attaches the ids of the nodes involved.
    #[must_use]
    pub fn with_nodes<I, S>(mut self, node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_ids = node_ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Ranked follow-up action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Severity of the finding that produced it.
    pub severity: Severity,
    /// Action text.
    pub action: String,
}

/// Output of one reasoning pass over a governance subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningResult {
    /// Which path produced the result.
    pub analysis_method: AnalysisMethod,
    /// Contradictions between recorded facts.
    #[serde(default)]
    pub contradictions: Vec<Finding>,
    /// Ownership issues.
    #[serde(default)]
    pub ownership_issues: Vec<Finding>,
    /// Risk-coverage gaps.
    #[serde(default)]
    pub risk_gaps: Vec<Finding>,
    /// Policy conflicts.
    #[serde(default)]
    pub policy_conflicts: Vec<Finding>,
    /// Recommendations by severity, then discovery order.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Confidence in the analysis.
    pub confidence: f64,
    /// Nodes in the analysed subgraph.
    #[serde(default)]
    pub nodes_analyzed: usize,
    /// Edges in the analysed subgraph.
    #[serde(default)]
    pub edges_analyzed: usize,
}

impl ReasoningResult {
    /// Builds a result from findings in discovery order, filing each under its
    /// category and ranking the recommendations.
    #[must_use]
    pub fn from_findings(
        analysis_method: AnalysisMethod,
        findings: Vec<Finding>,
        confidence: f64,
    ) -> Self {
        let mut result = Self {
            analysis_method,
            contradictions: Vec::new(),
            ownership_issues: Vec::new(),
            risk_gaps: Vec::new(),
            policy_conflicts: Vec::new(),
            recommendations: rank_recommendations(&findings),
            confidence,
            nodes_analyzed: 0,
            edges_analyzed: 0,
        };
        for finding in findings {
            let bucket = match finding.category {
                FindingCategory::Contradiction => &mut result.contradictions,
                FindingCategory::Ownership => &mut result.ownership_issues,
                FindingCategory::RiskCoverage => &mut result.risk_gaps,
                FindingCategory::PolicyConflict => &mut result.policy_conflicts,
            };
            bucket.push(finding);
        }
        result
    }

    /// Iterates every finding, category by category.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.contradictions
            .iter()
            .chain(&self.ownership_issues)
            .chain(&self.risk_gaps)
            .chain(&self.policy_conflicts)
    }

    /// Highest finding severity.
    #[must_use]
    pub fn highest_severity(&self) -> Option<Severity> {
        self.findings().map(|finding| finding.severity).max()
    }

    /// Returns `true` when nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings().next().is_none()
    }
}

/// Severity descending, ties in discovery order, duplicate texts dropped.
fn rank_recommendations(findings: &[Finding]) -> Vec<Recommendation> {
    let mut ranked: Vec<&Finding> = findings
        .iter()
        .filter(|finding| !finding.recommendation.trim().is_empty())
        .collect();
    ranked.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut recommendations: Vec<Recommendation> = Vec::with_capacity(ranked.len());
    for finding in ranked {
        if recommendations
            .iter()
            .all(|existing| existing.action != finding.recommendation)
        {
            recommendations.push(Recommendation {
                severity: finding.severity,
                action: finding.recommendation.clone(),
            });
        }
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_severity_then_discovery_order() {
        let findings = vec![
            Finding::new(FindingCategory::RiskCoverage, "a", Severity::Medium, "a", "Mitigate A"),
            Finding::new(FindingCategory::Ownership, "b", Severity::Critical, "b", "Assign owner"),
            Finding::new(FindingCategory::RiskCoverage, "c", Severity::Medium, "c", "Mitigate C"),
            Finding::new(FindingCategory::Ownership, "d", Severity::High, "d", "Assign owner"),
        ];
        let result = ReasoningResult::from_findings(AnalysisMethod::Deterministic, findings, 0.6);

        let actions: Vec<&str> = result
            .recommendations
            .iter()
            .map(|recommendation| recommendation.action.as_str())
            .collect();
        assert_eq!(actions, ["Assign owner", "Mitigate A", "Mitigate C"]);
        assert_eq!(result.ownership_issues.len(), 2);
        assert_eq!(result.risk_gaps.len(), 2);
        assert_eq!(result.highest_severity(), Some(Severity::Critical));
    }

    #[test]
    fn serializes_method_tag() {
        let result = ReasoningResult::from_findings(AnalysisMethod::Deterministic, Vec::new(), 0.6);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["analysis_method"], "deterministic");
        assert!(result.is_clean());
    }
}
