use serde::{Deserialize, Serialize};

use crate::rules::ExtractionRule;

/// Which population of people a document list describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    Faculty,
    #[serde(alias = "phd")]
    Student,
    Author,
}

impl EntityRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faculty => "faculty",
            Self::Student => "student",
            Self::Author => "author",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Faculty, Self::Student, Self::Author]
    }
}

impl std::fmt::Display for EntityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityRole {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faculty" => Ok(Self::Faculty),
            "student" | "phd" => Ok(Self::Student),
            "author" => Ok(Self::Author),
            _ => Err(crate::Error::InvalidRole(s.to_string())),
        }
    }
}

/// A configured source resolved for one role: the documents to visit and the
/// rule that reads them.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub id: &'a str,
    pub role: EntityRole,
    pub documents: &'a [String],
    pub rule: &'a ExtractionRule,
}

impl Source<'_> {
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("faculty".parse::<EntityRole>().unwrap(), EntityRole::Faculty);
        assert_eq!("student".parse::<EntityRole>().unwrap(), EntityRole::Student);
        assert_eq!("phd".parse::<EntityRole>().unwrap(), EntityRole::Student);
        assert_eq!("author".parse::<EntityRole>().unwrap(), EntityRole::Author);
    }

    #[test]
    fn test_role_rejects_unknown() {
        let err = "postdoc".parse::<EntityRole>().unwrap_err();
        assert!(matches!(err, crate::Error::InvalidRole(ref r) if r == "postdoc"));

        assert!("Faculty".parse::<EntityRole>().is_err());
        assert!("".parse::<EntityRole>().is_err());
    }

    #[test]
    fn test_role_serde_accepts_phd_alias() {
        let role: EntityRole = serde_json::from_str("\"phd\"").unwrap();
        assert_eq!(role, EntityRole::Student);

        assert_eq!(serde_json::to_string(&EntityRole::Student).unwrap(), "\"student\"");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(EntityRole::Faculty.to_string(), "faculty");
        assert_eq!(EntityRole::all().len(), 3);
    }
}
