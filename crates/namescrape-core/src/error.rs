use thiserror::Error;

use crate::rules::RuleError;
use crate::source::EntityRole;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid role: {0} (expected faculty, student, phd or author)")]
    InvalidRole(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source {source_id} has no rule for role {role}")]
    NoRuleForRole { source_id: String, role: EntityRole },

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
