use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::ingest::CompiledSelector;

/// Element selector: a tag plus optional class and attribute constraints.
///
/// `class` holds whitespace-separated tokens that must all be present on the
/// element. `attribute` matches a different key (for example `data-title`);
/// with a `value` the attribute must equal it exactly, without one it only
/// has to be present, and with `absent` it must be missing. `text` picks which
/// part of a matched element's text is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelector {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributeMatch>,
    #[serde(default, skip_serializing_if = "TextPart::is_full")]
    pub text: TextPart,
}

impl NodeSelector {
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: None,
            attribute: None,
            text: TextPart::Full,
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.attribute = Some(AttributeMatch {
            name: name.into(),
            value: value.map(String::from),
            absent: false,
        });
        self
    }

    /// Matches only elements that do not carry `name` at all.
    #[must_use]
    pub fn without_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(AttributeMatch {
            name: name.into(),
            value: None,
            absent: true,
        });
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: TextPart) -> Self {
        self.text = text;
        self
    }

    #[must_use]
    pub fn retagged(&self, tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMatch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub absent: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPart {
    /// All text under the element.
    #[default]
    Full,
    /// Text before the first `<br>` or line break.
    FirstLine,
    /// The element's own text after its last child element.
    TrailingText,
}

impl TextPart {
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn is_full(&self) -> bool {
        *self == Self::Full
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralMode {
    #[default]
    Flat,
    RolePaired,
    Sectioned,
    CombinedFields,
    TableRows,
}

impl StructuralMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::RolePaired => "role_paired",
            Self::Sectioned => "sectioned",
            Self::CombinedFields => "combined_fields",
            Self::TableRows => "table_rows",
        }
    }
}

impl std::fmt::Display for StructuralMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where role labels live relative to the name nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// A parallel sequence of role nodes across the document (or section).
    #[default]
    Document,
    /// One role node nested inside each name node.
    WithinName,
}

/// Which of several matched containers to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pick {
    #[default]
    All,
    First,
    Take(usize),
    Indices(Vec<usize>),
}

impl Pick {
    #[must_use]
    pub fn first() -> Self {
        Self::First
    }

    /// Out-of-range indices are skipped rather than treated as errors.
    pub fn apply<T: Copy>(&self, items: &[T]) -> Vec<T> {
        match self {
            Self::All => items.to_vec(),
            Self::First => items.first().copied().into_iter().collect(),
            Self::Take(n) => items.iter().take(*n).copied().collect(),
            Self::Indices(indices) => indices.iter().filter_map(|&i| items.get(i).copied()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRule {
    pub container: NodeSelector,
    #[serde(default)]
    pub pick: Pick,
    /// Narrow each container to its first matching descendant before reading names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descend: Option<NodeSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_selector: Option<NodeSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_subtag: Option<NodeSelector>,
    /// Take only the first name node per container.
    #[serde(default)]
    pub first_only: bool,
}

impl SectionRule {
    #[must_use]
    pub fn new(container: NodeSelector) -> Self {
        Self {
            container,
            pick: Pick::All,
            descend: None,
            name_selector: None,
            name_subtag: None,
            first_only: false,
        }
    }

    #[must_use]
    pub fn with_pick(mut self, pick: Pick) -> Self {
        self.pick = pick;
        self
    }

    #[must_use]
    pub fn with_descend(mut self, descend: NodeSelector) -> Self {
        self.descend = Some(descend);
        self
    }

    #[must_use]
    pub fn with_name_selector(mut self, selector: NodeSelector) -> Self {
        self.name_selector = Some(selector);
        self
    }

    #[must_use]
    pub fn first_only(mut self) -> Self {
        self.first_only = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedFields {
    pub first: NodeSelector,
    pub last: NodeSelector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRule {
    #[serde(default = "Pick::first")]
    pub pick: Pick,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<NodeSelector>,
    pub entry: NodeSelector,
}

/// Replaces the name selector's tag on one specific document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateTag {
    pub url: String,
    pub tag: String,
}

/// Extraction configuration for one (source, role) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub name_selector: NodeSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_subtag: Option<NodeSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_selector: Option<NodeSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_subtag: Option<NodeSelector>,
    #[serde(default)]
    pub role_scope: RoleScope,
    /// Role nodes containing any of these are not role labels at all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_skip_terms: Vec<String>,
    /// When set, only role nodes containing one of these are role labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_keep_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusion_terms: Vec<String>,
    #[serde(default)]
    pub structural_mode: StructuralMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined: Option<CombinedFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableRule>,
    #[serde(default)]
    pub reorder_comma: bool,
    #[serde(default)]
    pub split_list: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_tags: Vec<AlternateTag>,
}

impl ExtractionRule {
    #[must_use]
    pub fn new(name_selector: NodeSelector) -> Self {
        Self {
            name_selector,
            name_subtag: None,
            role_selector: None,
            role_subtag: None,
            role_scope: RoleScope::Document,
            role_skip_terms: Vec::new(),
            role_keep_terms: Vec::new(),
            exclusion_terms: Vec::new(),
            structural_mode: StructuralMode::Flat,
            sections: Vec::new(),
            combined: None,
            table: None,
            reorder_comma: false,
            split_list: false,
            alternate_tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name_subtag(mut self, subtag: NodeSelector) -> Self {
        self.name_subtag = Some(subtag);
        self
    }

    #[must_use]
    pub fn with_roles(mut self, selector: NodeSelector, scope: RoleScope) -> Self {
        self.role_selector = Some(selector);
        self.role_scope = scope;
        if self.structural_mode == StructuralMode::Flat {
            self.structural_mode = StructuralMode::RolePaired;
        }
        self
    }

    #[must_use]
    pub fn with_role_subtag(mut self, subtag: NodeSelector) -> Self {
        self.role_subtag = Some(subtag);
        self
    }

    #[must_use]
    pub fn with_role_terms(mut self, skip: Vec<String>, keep: Vec<String>) -> Self {
        self.role_skip_terms = skip;
        self.role_keep_terms = keep;
        self
    }

    #[must_use]
    pub fn with_sections(mut self, sections: Vec<SectionRule>) -> Self {
        self.structural_mode = StructuralMode::Sectioned;
        self.sections = sections;
        self
    }

    #[must_use]
    pub fn with_combined(mut self, first: NodeSelector, last: NodeSelector) -> Self {
        self.structural_mode = StructuralMode::CombinedFields;
        self.combined = Some(CombinedFields { first, last });
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: TableRule) -> Self {
        self.structural_mode = StructuralMode::TableRows;
        self.table = Some(table);
        self
    }

    #[must_use]
    pub fn with_exclusion_terms(mut self, terms: Vec<String>) -> Self {
        self.exclusion_terms = terms;
        self
    }

    #[must_use]
    pub fn with_reorder_comma(mut self) -> Self {
        self.reorder_comma = true;
        self
    }

    #[must_use]
    pub fn with_split_list(mut self) -> Self {
        self.split_list = true;
        self
    }

    #[must_use]
    pub fn with_alternate_tag(mut self, url: impl Into<String>, tag: impl Into<String>) -> Self {
        self.alternate_tags.push(AlternateTag {
            url: url.into(),
            tag: tag.into(),
        });
        self
    }

    /// The name selector to use on `url`, honoring alternate tags.
    pub fn name_selector_for(&self, url: &str) -> Cow<'_, NodeSelector> {
        match self.alternate_tags.iter().find(|alt| alt.url == url) {
            Some(alt) => Cow::Owned(self.name_selector.retagged(&alt.tag)),
            None => Cow::Borrowed(&self.name_selector),
        }
    }

    pub fn has_role_filter(&self) -> bool {
        self.role_selector.is_some()
    }

    /// Checks mode payloads and compiles every selector once.
    pub fn validate(&self) -> Result<(), String> {
        let mode = self.structural_mode;

        match mode {
            StructuralMode::Flat if self.role_selector.is_some() => {
                return Err("flat mode cannot carry a role selector; use role_paired".into());
            }
            StructuralMode::RolePaired if self.role_selector.is_none() => {
                return Err("role_paired mode requires a role selector".into());
            }
            StructuralMode::Sectioned if self.sections.is_empty() => {
                return Err("sectioned mode requires at least one section".into());
            }
            StructuralMode::CombinedFields if self.combined.is_none() => {
                return Err("combined_fields mode requires a combined payload".into());
            }
            StructuralMode::TableRows if self.table.is_none() => {
                return Err("table_rows mode requires a table payload".into());
            }
            _ => {}
        }

        if !self.sections.is_empty() && mode != StructuralMode::Sectioned {
            return Err(format!("sections configured but mode is {mode}"));
        }
        if self.combined.is_some() && mode != StructuralMode::CombinedFields {
            return Err(format!("combined payload configured but mode is {mode}"));
        }
        if self.table.is_some() && mode != StructuralMode::TableRows {
            return Err(format!("table payload configured but mode is {mode}"));
        }
        if self.role_selector.is_none()
            && (self.role_subtag.is_some()
                || self.role_scope == RoleScope::WithinName
                || !self.role_skip_terms.is_empty()
                || !self.role_keep_terms.is_empty())
        {
            return Err("role settings configured without a role selector".into());
        }

        for selector in self.selectors() {
            CompiledSelector::compile(selector).map_err(|e| e.to_string())?;
        }
        for alt in &self.alternate_tags {
            CompiledSelector::compile(&self.name_selector.retagged(&alt.tag))
                .map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    fn selectors(&self) -> Vec<&NodeSelector> {
        let mut all = vec![&self.name_selector];
        all.extend(self.name_subtag.iter());
        all.extend(self.role_selector.iter());
        all.extend(self.role_subtag.iter());
        for section in &self.sections {
            all.push(&section.container);
            all.extend(section.descend.iter());
            all.extend(section.name_selector.iter());
            all.extend(section.name_subtag.iter());
        }
        if let Some(combined) = &self.combined {
            all.push(&combined.first);
            all.push(&combined.last);
        }
        if let Some(table) = &self.table {
            all.extend(table.table.iter());
            all.push(&table.entry);
        }
        all
    }
}
