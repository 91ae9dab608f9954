use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::extractor::CandidateName;
use crate::rules::{ExtractionRule, DEFAULT_CREDENTIAL_SUFFIXES};

// Horizontal whitespace only: line breaks must survive until rejection.
static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\r\n]+").expect("inline space regex is valid"));

static REJECTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d\r\n@-]").expect("rejection regex is valid"));

static LIST_DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[&,]+").expect("list delimiter regex is valid"));

static LAST_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^,]+),\s*([^,]+)$").expect("last-first regex is valid"));

// Never empty, never padded, free of digits, line breaks, `@` and `-`, and
// never ending in a credential suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn new(text: &str) -> Option<Self> {
        Self::validated(text, DEFAULT_CREDENTIAL_SUFFIXES)
    }

    fn validated<S: AsRef<str>>(text: &str, credential_suffixes: &[S]) -> Option<Self> {
        let text = collapse_inline_space(text);
        if text.is_empty() || REJECTED.is_match(&text) {
            return None;
        }
        let carries_credential = credential_suffixes
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|suffix| !suffix.trim().is_empty())
            .any(|suffix| text.ends_with(suffix) || text == bare_credential(suffix));
        if carries_credential {
            return None;
        }
        Some(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn first_name(&self) -> &str {
        self.0.split(' ').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// `", Ph.D."` appears as `Ph.D.` once a list has been split on commas.
fn bare_credential(suffix: &str) -> &str {
    suffix
        .trim_start_matches(|c: char| c == ',' || c.is_whitespace())
        .trim_end()
}

fn collapse_inline_space(text: &str) -> String {
    INLINE_SPACE.replace_all(text.trim(), " ").into_owned()
}

fn reorder_last_first(text: &str) -> Option<String> {
    let caps = LAST_FIRST.captures(text)?;
    let last = caps.get(1)?.as_str().trim();
    let first = caps.get(2)?.as_str().trim();
    if last.is_empty() || first.is_empty() {
        return None;
    }
    Some(format!("{first} {last}"))
}

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    credential_suffixes: Vec<String>,
    reorder_comma: bool,
    split_list: bool,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIAL_SUFFIXES.iter().map(|s| (*s).to_string()).collect())
    }
}

impl NameNormalizer {
    #[must_use]
    pub fn new(credential_suffixes: Vec<String>) -> Self {
        Self {
            credential_suffixes,
            reorder_comma: false,
            split_list: false,
        }
    }

    #[must_use]
    pub fn for_rule(rule: &ExtractionRule, credential_suffixes: &[String]) -> Self {
        Self::new(credential_suffixes.to_vec())
            .with_reorder_comma(rule.reorder_comma)
            .with_split_list(rule.split_list)
    }

    #[must_use]
    pub fn with_reorder_comma(mut self, enabled: bool) -> Self {
        self.reorder_comma = enabled;
        self
    }

    #[must_use]
    pub fn with_split_list(mut self, enabled: bool) -> Self {
        self.split_list = enabled;
        self
    }

    pub fn normalize(&self, raw: &str) -> Vec<NormalizedName> {
        let text = collapse_inline_space(raw);
        if text.is_empty() || REJECTED.is_match(&text) {
            return Vec::new();
        }

        let mut text = self.strip_credentials(&text);

        if self.reorder_comma {
            if let Some(reordered) = reorder_last_first(&text) {
                text = reordered;
            }
        }

        if self.split_list {
            LIST_DELIMITERS
                .split(&text)
                .filter_map(|part| self.clean_part(part))
                .collect()
        } else {
            self.clean_part(&text).into_iter().collect()
        }
    }

    pub fn normalize_all(&self, candidates: &[CandidateName]) -> Vec<NormalizedName> {
        candidates
            .iter()
            .flat_map(|c| self.normalize(&c.text))
            .collect()
    }

    fn clean_part(&self, part: &str) -> Option<NormalizedName> {
        let part = self.strip_credentials(part.trim());
        if self
            .credential_suffixes
            .iter()
            .any(|suffix| !suffix.trim().is_empty() && part == bare_credential(suffix))
        {
            return None;
        }
        NormalizedName::validated(&part, &self.credential_suffixes)
    }

    fn strip_credentials(&self, text: &str) -> String {
        let mut text = text.trim_end();
        loop {
            let next = self
                .credential_suffixes
                .iter()
                .filter(|suffix| !suffix.trim().is_empty())
                .find_map(|suffix| text.strip_suffix(suffix.as_str()));
            match next {
                Some(stripped) => text = stripped.trim_end(),
                None => return text.to_string(),
            }
        }
    }
}
