//! Severity scale shared by risks, flags, consequences, and findings.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Ordered four-level severity. `Low < Medium < High < Critical`.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Minor concern.
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    /// Default severity when none was recorded.
    #[default]
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    /// Needs explicit attention before execution.
    #[serde(alias = "High", alias = "HIGH")]
    High,
    /// Must be addressed before anything else.
    #[serde(alias = "Critical", alias = "CRITICAL")]
    Critical,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns a 1-based rank (`low` = 1, `critical` = 4).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Returns `true` for `high` and `critical`.
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(Error::InvalidSeverity {
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_rank() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        for pair in Severity::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" HIGH ".parse::<Severity>().unwrap(), Severity::High);
        assert!("severe".parse::<Severity>().is_err());
    }
}
