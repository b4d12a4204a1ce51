//! Attributes computed once per decision and exposed to rule conditions.

use std::sync::LazyLock;

use governance_config::DerivationConfig;
use governance_primitives::{Decision, Severity};
use regex::Regex;
use serde::{Deserialize, Serialize};

static CURRENCY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*(\d+(?:,\d{3})*(?:\.\d+)?)\s*(k|m|mm|b|bn|thousand|million|billion)?\b")
        .expect("currency pattern is valid")
});
static BARE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\s*(k|million|billion)\b").expect("amount pattern is valid")
});
static EU_SCOPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:eu|europe|european|gdpr|germany|france|uk)\b").expect("eu pattern is valid")
});
static PII_USAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:pii|personal data|user data|privacy|gdpr|data protection)")
        .expect("pii pattern is valid")
});
static DEPLOYMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:launch|deploy|release|go live|rollout|roll out|ship)")
        .expect("deployment pattern is valid")
});
static STRATEGIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:strategic|company-wide|major initiative|expansion|acquisition|acquire|merger|market)",
    )
    .expect("strategic pattern is valid")
});
static FINANCIAL_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:budget|cost|investment|invest|expense|spend)").expect("financial pattern is valid")
});
static STRATEGIC_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:strategic|major|initiative|expansion)").expect("strategic hint is valid")
});

/// Attributes derived deterministically from a decision's text and fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedAttributes {
    /// Budget parsed from currency-like mentions, or inferred from keywords; `0` when none.
    pub normalized_budget: f64,
    /// Mentions an EU market or EU privacy regime.
    pub has_eu_scope: bool,
    /// Mentions personal data processing.
    pub has_pii_usage: bool,
    /// Mentions a launch, release, or rollout.
    pub has_deployment: bool,
    /// Reads as a strategic initiative.
    pub is_strategic: bool,
    /// Average severity of the listed risks; absent when no risks are listed.
    pub estimated_risk_level: Option<Severity>,
    /// Fraction of {statement, goals, KPIs, risks, owners} that are present.
    pub completeness_score: f64,
}

impl DerivedAttributes {
    /// Derives the attributes of `decision`.
    #[must_use]
    pub fn derive(decision: &Decision, config: &DerivationConfig) -> Self {
        let text = decision.searchable_text();
        Self {
            normalized_budget: normalize_budget(&text, config),
            has_eu_scope: EU_SCOPE.is_match(&text),
            has_pii_usage: PII_USAGE.is_match(&text),
            has_deployment: DEPLOYMENT.is_match(&text),
            is_strategic: STRATEGIC.is_match(&text),
            estimated_risk_level: estimate_risk_level(decision),
            completeness_score: completeness_score(decision),
        }
    }
}

/// Extracts a budget from lower-cased text.
///
/// Explicit `$` amounts win over bare `600k`/`2 million` mentions. Without
/// any amount, financial and strategic keywords fall back to the inferred
/// budgets from `config`.
#[must_use]
pub fn normalize_budget(text: &str, config: &DerivationConfig) -> f64 {
    if let Some(amount) = first_amount(&CURRENCY_AMOUNT, text).or_else(|| first_amount(&BARE_AMOUNT, text)) {
        return amount;
    }

    let mut inferred = 0.0_f64;
    if FINANCIAL_HINT.is_match(text) {
        inferred = config.inferred_financial_budget;
    }
    if STRATEGIC_HINT.is_match(text) {
        inferred = inferred.max(config.inferred_strategic_budget);
    }
    inferred
}

fn first_amount(pattern: &Regex, text: &str) -> Option<f64> {
    let captures = pattern.captures(text)?;
    let digits = captures.get(1)?.as_str().replace(',', "");
    let value = digits.parse::<f64>().ok()?;
    let multiplier = match captures.get(2).map(|unit| unit.as_str()) {
        Some("k" | "thousand") => 1_000.0,
        Some("m" | "mm" | "million") => 1_000_000.0,
        Some("b" | "bn" | "billion") => 1_000_000_000.0,
        _ => 1.0,
    };
    Some(value * multiplier)
}

fn estimate_risk_level(decision: &Decision) -> Option<Severity> {
    let risks = decision.risks();
    if risks.is_empty() {
        return None;
    }
    let total: f64 = risks
        .iter()
        .map(|risk| f64::from(risk.severity.rank()))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let average = total / risks.len() as f64;
    Some(if average >= 3.5 {
        Severity::Critical
    } else if average >= 2.5 {
        Severity::High
    } else if average >= 1.5 {
        Severity::Medium
    } else {
        Severity::Low
    })
}

fn completeness_score(decision: &Decision) -> f64 {
    let present = [
        decision.has_statement(),
        !decision.goals().is_empty(),
        !decision.kpis().is_empty(),
        !decision.risks().is_empty(),
        !decision.owners().is_empty(),
    ];
    let count = present.iter().filter(|present| **present).count();
    #[allow(clippy::cast_precision_loss)]
    let score = count as f64 / present.len() as f64;
    score
}
