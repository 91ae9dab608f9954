use std::collections::HashMap;

use super::Gender;

/// Answers already obtained during one run, keyed by lower-cased first name.
///
/// Owned by the caller and passed explicitly; nothing is ever evicted.
#[derive(Debug, Clone, Default)]
pub struct ClassificationCache {
    entries: HashMap<String, Gender>,
}

impl ClassificationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(first_name: &str) -> String {
        first_name.to_lowercase()
    }

    pub fn get(&self, first_name: &str) -> Option<Gender> {
        self.entries.get(&Self::key(first_name)).copied()
    }

    pub fn contains(&self, first_name: &str) -> bool {
        self.entries.contains_key(&Self::key(first_name))
    }

    pub fn insert(&mut self, first_name: impl AsRef<str>, gender: Gender) {
        self.entries.insert(Self::key(first_name.as_ref()), gender);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
