//! Decision pack assembly.
//!
//! [`DecisionPackBuilder`] turns a decision, its governance result, and an
//! optional graph-reasoning result into a fixed-shape [`DecisionPack`] using
//! only [`PackTemplate`] string templates.

#![warn(missing_docs, clippy::pedantic)]

pub mod builder;
pub mod pack;
pub mod template;

pub use builder::{DecisionPackBuilder, TITLE_MAX_CHARS};
pub use pack::{
    AuditRule, DecisionPack, GoalsAndKpis, MissingItem, PackApproval, PackAudit, PackSummary,
};
pub use template::{PackTemplate, TemplateError, TemplateResult};
