use tracing::warn;

use super::extractor::{CandidateBatch, CandidateName};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub kept: Vec<CandidateName>,
    pub excluded: usize,
    pub failed_open: bool,
}

// Matching is a case-sensitive substring test. When the role sequence does
// not line up with the name slots the filter keeps everything.
#[derive(Debug, Clone, Default)]
pub struct RoleFilter {
    terms: Vec<String>,
}

impl RoleFilter {
    #[must_use]
    pub fn new(terms: Vec<String>) -> Self {
        Self {
            terms: terms.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_excluded(&self, role_text: &str) -> bool {
        self.terms.iter().any(|term| role_text.contains(term.as_str()))
    }

    pub fn includes(&self, slot: usize, roles: &[String]) -> bool {
        !roles.get(slot).is_some_and(|role| self.is_excluded(role))
    }

    pub fn apply(&self, batch: CandidateBatch) -> FilterOutcome {
        let CandidateBatch {
            candidates,
            slots,
            roles,
        } = batch;

        let Some(roles) = roles else {
            return FilterOutcome {
                kept: candidates,
                ..FilterOutcome::default()
            };
        };

        if roles.len() != slots {
            warn!(
                roles = roles.len(),
                slots,
                "role sequence does not align with name nodes, keeping all candidates"
            );
            return FilterOutcome {
                kept: candidates,
                excluded: 0,
                failed_open: true,
            };
        }

        let total = candidates.len();
        let kept: Vec<CandidateName> = candidates
            .into_iter()
            .filter(|c| self.includes(c.slot, &roles))
            .collect();

        FilterOutcome {
            excluded: total - kept.len(),
            kept,
            failed_open: false,
        }
    }
}
