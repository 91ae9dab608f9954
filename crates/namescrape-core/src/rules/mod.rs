mod registry;
mod rule;

use thiserror::Error;

use crate::source::EntityRole;

pub use registry::{
    ExclusionLexicons, RoleConfig, RuleRegistry, SourceConfig, DEFAULT_CREDENTIAL_SUFFIXES,
};
pub use rule::{
    AlternateTag, AttributeMatch, CombinedFields, ExtractionRule, NodeSelector, Pick, RoleScope,
    SectionRule, StructuralMode, TableRule, TextPart,
};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid rule for {source_id}/{role}: {reason}")]
    Invalid {
        source_id: String,
        role: EntityRole,
        reason: String,
    },
    #[error("Credential suffixes must not be blank")]
    EmptyCredentialSuffix,
}
