//! First-name gender classification for extracted rosters.

mod cache;
mod genderize;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ingest::NormalizedName;

pub use cache::ClassificationCache;
pub use genderize::{GenderizeClassifier, GENDERIZE_BATCH_SIZE, GENDERIZE_ENDPOINT};

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Classifier returned HTTP {0}")]
    Status(u16),
    #[error("Could not decode classifier response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("Classifier returned {got} results for {expected} names")]
    LengthMismatch { expected: usize, got: usize },
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a classifier label; anything unrecognized, or no label, is unknown.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::to_ascii_lowercase).as_deref() {
            Some("male") => Self::Male,
            Some("female") => Self::Female,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a batch of first names, returning one gender per input in order.
#[async_trait]
pub trait GenderClassifier: Send + Sync {
    async fn classify(&self, first_names: &[String]) -> ClassifyResult<Vec<Gender>>;
}

/// One gender per name, consulting `cache` first.
///
/// Only first names missing from the cache reach the classifier, each at most
/// once per call; answers are stored back into the cache.
pub async fn classify_names(
    classifier: &dyn GenderClassifier,
    cache: &mut ClassificationCache,
    names: &[NormalizedName],
) -> ClassifyResult<Vec<Gender>> {
    let mut misses: Vec<String> = Vec::new();
    for name in names {
        let key = ClassificationCache::key(name.first_name());
        if !cache.contains(&key) && !misses.contains(&key) {
            misses.push(key);
        }
    }

    if !misses.is_empty() {
        debug!(
            misses = misses.len(),
            cached = cache.len(),
            "classifying uncached first names"
        );
        let genders = classifier.classify(&misses).await?;
        if genders.len() != misses.len() {
            return Err(ClassifyError::LengthMismatch {
                expected: misses.len(),
                got: genders.len(),
            });
        }
        for (key, gender) in misses.into_iter().zip(genders) {
            cache.insert(key, gender);
        }
    }

    Ok(names
        .iter()
        .map(|name| cache.get(name.first_name()).unwrap_or(Gender::Unknown))
        .collect())
}
