use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::rule::ExtractionRule;
use super::RuleError;
use crate::network::FetchConfig;
use crate::source::{EntityRole, Source};
use crate::{Error, Result};

pub const DEFAULT_CREDENTIAL_SUFFIXES: &[&str] = &[", Ph.D."];

fn default_credential_suffixes() -> Vec<String> {
    DEFAULT_CREDENTIAL_SUFFIXES.iter().map(|s| (*s).to_string()).collect()
}

/// Role-level exclusion terms; authors are never excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionLexicons {
    #[serde(default)]
    pub faculty: Vec<String>,
    #[serde(default)]
    pub student: Vec<String>,
}

impl ExclusionLexicons {
    pub fn for_role(&self, role: EntityRole) -> &[String] {
        match role {
            EntityRole::Faculty => &self.faculty,
            EntityRole::Student => &self.student,
            EntityRole::Author => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub documents: Vec<String>,
    pub rule: ExtractionRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceConfig {
    pub roles: BTreeMap<EntityRole, RoleConfig>,
}

/// Static, read-only extraction configuration for every known source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRegistry {
    #[serde(default)]
    pub exclusions: ExclusionLexicons,
    #[serde(default = "default_credential_suffixes")]
    pub credential_suffixes: Vec<String>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self {
            exclusions: ExclusionLexicons::default(),
            credential_suffixes: default_credential_suffixes(),
            fetch: FetchConfig::default(),
            sources: BTreeMap::new(),
        }
    }
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a registry document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionLexicons) -> Self {
        self.exclusions = exclusions;
        self
    }

    #[must_use]
    pub fn with_source(
        mut self,
        id: impl Into<String>,
        role: EntityRole,
        documents: Vec<String>,
        rule: ExtractionRule,
    ) -> Self {
        self.sources
            .entry(id.into())
            .or_default()
            .roles
            .insert(role, RoleConfig { documents, rule });
        self
    }

    pub fn validate(&self) -> std::result::Result<(), RuleError> {
        for (id, source) in &self.sources {
            for (role, config) in &source.roles {
                config.rule.validate().map_err(|reason| RuleError::Invalid {
                    source_id: id.clone(),
                    role: *role,
                    reason,
                })?;
            }
        }
        if self.credential_suffixes.iter().any(|s| s.trim().is_empty()) {
            return Err(RuleError::EmptyCredentialSuffix);
        }
        Ok(())
    }

    pub fn source(&self, id: &str, role: EntityRole) -> Result<Source<'_>> {
        let (key, config) = self
            .sources
            .get_key_value(id)
            .ok_or_else(|| Error::UnknownSource(id.to_string()))?;

        let role_config = config.roles.get(&role).ok_or_else(|| Error::NoRuleForRole {
            source_id: id.to_string(),
            role,
        })?;

        Ok(Source {
            id: key,
            role,
            documents: &role_config.documents,
            rule: &role_config.rule,
        })
    }

    /// Every source configured for `role`, in identifier order.
    pub fn sources_for(&self, role: EntityRole) -> impl Iterator<Item = Source<'_>> {
        self.sources.iter().filter_map(move |(id, config)| {
            config.roles.get(&role).map(|rc| Source {
                id,
                role,
                documents: &rc.documents,
                rule: &rc.rule,
            })
        })
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn roles_of(&self, id: &str) -> Vec<EntityRole> {
        self.sources
            .get(id)
            .map(|s| s.roles.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The registry lexicon for `role` merged with the rule's own terms.
    pub fn lexicon(&self, role: EntityRole, rule: &ExtractionRule) -> Vec<String> {
        let mut terms: Vec<String> = self.exclusions.for_role(role).to_vec();
        for term in &rule.exclusion_terms {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        terms
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
