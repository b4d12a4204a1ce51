//! Decision identifier types.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Identifier of a governed decision.
///
/// The identifier doubles as the id of the decision's Action node in the
/// governance graph, and every other node derived from the decision is
/// scoped by it.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DecisionId(String);

impl DecisionId {
    /// Validates and wraps the supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDecisionId`] when the identifier is blank or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidDecisionId {
                id,
                reason: "identifier cannot be empty",
            });
        }
        if id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidDecisionId {
                id,
                reason: "identifier cannot contain whitespace",
            });
        }
        Ok(Self(id))
    }

    /// Generates a fresh identifier of the form `decision_<8 hex chars>`.
    #[must_use]
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("decision_{}", &hex[..8]))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds a node id scoped to this decision, e.g. `decision_1_owner_0`.
    #[must_use]
    pub fn scoped(&self, suffix: impl Display) -> String {
        format!("{}_{suffix}", self.0)
    }
}

impl Display for DecisionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DecisionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DecisionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for DecisionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DecisionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DecisionId> for String {
    fn from(value: DecisionId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_parse_back() {
        let id = DecisionId::generate();
        assert!(id.as_str().starts_with("decision_"));
        assert_eq!(id.as_str().len(), "decision_".len() + 8);
        let parsed = id.to_string().parse::<DecisionId>().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_blank_and_whitespace_ids() {
        assert!(DecisionId::new("  ").is_err());
        assert!(matches!(
            DecisionId::new("a b"),
            Err(Error::InvalidDecisionId { .. })
        ));
    }

    #[test]
    fn scoped_ids_carry_the_decision_prefix() {
        let id = DecisionId::new("d42").unwrap();
        assert_eq!(id.scoped("owner_0"), "d42_owner_0");
    }
}
