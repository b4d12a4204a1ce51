//! Configuration loader implementations.
//!
//! Loaders parse JSON documents and validate the result. Locating files and
//! reloading them is left to the caller.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::{CompanyContext, ConfigError, ConfigResult, GovernanceConfig};

/// Parses and validates a [`GovernanceConfig`] from JSON. Missing sections take defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed JSON and
/// [`ConfigError::Invalid`] when validation fails.
pub fn from_json_str(json: &str) -> ConfigResult<GovernanceConfig> {
    let config: GovernanceConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Reads a [`GovernanceConfig`] from a JSON file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
/// errors of [`from_json_str`].
pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<GovernanceConfig> {
    let path = path.as_ref();
    let raw = read(path)?;
    let config = from_json_str(&raw)?;
    debug!(path = %path.display(), "loaded governance configuration");
    Ok(config)
}

/// Parses a [`CompanyContext`] from JSON.
///
/// Accepts either a flat `{"personnel": [...]}` document or a company file
/// nesting personnel under `approval_hierarchy.personnel`, with the display
/// name optionally under `company.name`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed JSON or personnel entries.
pub fn company_context_from_json_str(json: &str) -> ConfigResult<CompanyContext> {
    let document: Value = serde_json::from_str(json)?;
    let personnel = document
        .pointer("/approval_hierarchy/personnel")
        .or_else(|| document.get("personnel"))
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    let name = document
        .pointer("/company/name")
        .or_else(|| document.get("name"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(CompanyContext {
        name,
        personnel: serde_json::from_value(personnel)?,
    })
}

/// Reads a [`CompanyContext`] from a JSON file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
/// errors of [`company_context_from_json_str`].
pub fn company_context_from_path(path: impl AsRef<Path>) -> ConfigResult<CompanyContext> {
    let path = path.as_ref();
    let context = company_context_from_json_str(&read(path)?)?;
    debug!(
        path = %path.display(),
        personnel = context.personnel.len(),
        "loaded company context"
    );
    Ok(context)
}

fn read(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_defaults() {
        let config = from_json_str(r#"{"flags": {"financial_threshold": 250000}}"#).unwrap();
        assert!((config.flags.financial_threshold - 250_000.0).abs() < f64::EPSILON);
        assert_eq!(config.graph.context_depth, 2);
    }

    #[test]
    fn invalid_documents_are_rejected() {
        let err = from_json_str(r#"{"reasoning": {"deterministic_confidence": 1.5}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn company_context_reads_nested_hierarchy() {
        let context = company_context_from_json_str(
            r#"{
                "company": {"name": "Nexus Dynamics"},
                "approval_hierarchy": {"personnel": [
                    {"id": "P001", "name": "Avery", "role": "CEO", "level": 5},
                    {"id": "P003", "name": "Jordan", "role": "CFO"}
                ]}
            }"#,
        )
        .unwrap();

        assert_eq!(context.name.as_deref(), Some("Nexus Dynamics"));
        assert_eq!(context.personnel.len(), 2);
        assert_eq!(context.personnel[1].level, 1);
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let err = from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
