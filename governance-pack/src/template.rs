//! Fixed string templates with `{{variable}}` substitution.

use std::fmt;

use thiserror::Error;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A referenced variable was not provided.
    #[error("missing template variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },
    /// A `{{` without a matching `}}`.
    #[error("unterminated placeholder at byte {position}")]
    Unterminated {
        /// Byte offset of the opening braces.
        position: usize,
    },
}

/// Immutable template such as `"Request approvals: {{approvers}}"`.
///
/// Rendering is a single left-to-right pass, so substituted values are never
/// themselves scanned for placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackTemplate {
    source: &'static str,
}

impl PackTemplate {
    /// Wraps a template string.
    #[must_use]
    pub const fn new(source: &'static str) -> Self {
        Self { source }
    }

    /// Returns the raw template text.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        self.source
    }

    /// Names of the referenced variables, in order of appearance.
    #[must_use]
    pub fn variables(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.source;
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                break;
            };
            names.push(after[..end].trim());
            rest = &after[end + 2..];
        }
        names
    }

    /// Renders the template, looking variables up in `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingVariable`] when a referenced variable is
    /// absent and [`TemplateError::Unterminated`] for a dangling `{{`.
    pub fn render(&self, vars: &[(&str, &str)]) -> TemplateResult<String> {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source;
        let mut offset = 0;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or(TemplateError::Unterminated {
                position: offset + start,
            })?;
            let name = after[..end].trim();
            let value = vars
                .iter()
                .find_map(|(key, value)| (*key == name).then_some(*value))
                .ok_or_else(|| TemplateError::MissingVariable {
                    name: name.to_owned(),
                })?;
            out.push_str(value);
            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl fmt::Display for PackTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_variables_in_one_pass() {
        let template = PackTemplate::new("{{ role }} - {{reason}}");
        let rendered = template
            .render(&[("role", "CFO"), ("reason", "uses {{role}} literally")])
            .unwrap();
        assert_eq!(rendered, "CFO - uses {{role}} literally");
        assert_eq!(template.variables(), ["role", "reason"]);
    }

    #[test]
    fn reports_missing_and_unterminated_placeholders() {
        let missing = PackTemplate::new("Hello {{name}}").render(&[]).unwrap_err();
        assert_eq!(
            missing,
            TemplateError::MissingVariable {
                name: "name".into()
            }
        );

        let dangling = PackTemplate::new("ok {{a}} then {{b").render(&[("a", "x")]);
        assert_eq!(dangling, Err(TemplateError::Unterminated { position: 14 }));
    }
}
