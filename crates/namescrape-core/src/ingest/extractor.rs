use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parser::ParsedDocument;
use super::selector::{compile_optional, CompiledSelector, SelectorResult};
use crate::rules::{ExtractionRule, RoleScope, StructuralMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateName {
    pub text: String,
    pub slot: usize,
    pub source: String,
}

impl CandidateName {
    #[must_use]
    pub fn new(text: impl Into<String>, slot: usize, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            slot,
            source: source.into(),
        }
    }
}

// `slots` counts matched name nodes, including ones that produced no
// candidate. `roles`, when present, is the parallel role-label sequence the
// filter aligns against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateBatch {
    pub candidates: Vec<CandidateName>,
    pub slots: usize,
    pub roles: Option<Vec<String>>,
}

impl CandidateBatch {
    #[must_use]
    pub fn new(slots: usize) -> Self {
        Self {
            candidates: Vec::new(),
            slots,
            roles: None,
        }
    }

    #[must_use]
    pub fn from_texts<S: AsRef<str>>(source: &str, texts: &[S]) -> Self {
        Self {
            candidates: texts
                .iter()
                .enumerate()
                .map(|(slot, t)| CandidateName::new(t.as_ref(), slot, source))
                .collect(),
            slots: texts.len(),
            roles: None,
        }
    }

    #[must_use]
    pub fn with_roles<S: AsRef<str>>(mut self, roles: &[S]) -> Self {
        self.roles = Some(roles.iter().map(|r| r.as_ref().to_string()).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

struct RoleReader<'r> {
    selector: CompiledSelector,
    subtag: Option<CompiledSelector>,
    scope: RoleScope,
    skip_terms: &'r [String],
    keep_terms: &'r [String],
}

impl RoleReader<'_> {
    fn read(&self, scope: ElementRef<'_>, names: &[ElementRef<'_>]) -> Vec<String> {
        match self.scope {
            RoleScope::Document => self
                .selector
                .select(scope)
                .into_iter()
                .map(|node| self.label(node))
                .filter(|label| !self.skip_terms.iter().any(|t| label.contains(t.as_str())))
                .filter(|label| {
                    self.keep_terms.is_empty()
                        || self.keep_terms.iter().any(|t| label.contains(t.as_str()))
                })
                .collect(),
            RoleScope::WithinName => names
                .iter()
                .map(|name| {
                    self.selector
                        .first(*name)
                        .map(|node| self.label(node))
                        .unwrap_or_default()
                })
                .collect(),
        }
    }

    // A role node without the expected sub-node still occupies its position.
    fn label(&self, node: ElementRef<'_>) -> String {
        let text = match &self.subtag {
            Some(subtag) => subtag
                .first(node)
                .map(|inner| subtag.text(inner))
                .unwrap_or_default(),
            None => self.selector.text(node),
        };
        text.trim().to_string()
    }
}

pub struct CandidateExtractor<'r> {
    rule: &'r ExtractionRule,
    source_id: &'r str,
}

impl<'r> CandidateExtractor<'r> {
    #[must_use]
    pub fn new(rule: &'r ExtractionRule, source_id: &'r str) -> Self {
        Self { rule, source_id }
    }

    pub fn extract(&self, document: &ParsedDocument) -> SelectorResult<Vec<CandidateBatch>> {
        let root = document.root();
        let names = CompiledSelector::compile(&self.rule.name_selector_for(document.url()))?;
        let subtag = compile_optional(self.rule.name_subtag.as_ref())?;
        let roles = self.role_reader()?;

        let batches = match self.rule.structural_mode {
            StructuralMode::Flat | StructuralMode::RolePaired => {
                let nodes = names.select(root);
                vec![self.batch(root, &nodes, &names, subtag.as_ref(), roles.as_ref())]
            }
            StructuralMode::Sectioned => {
                self.extract_sections(root, &names, subtag.as_ref(), roles.as_ref())?
            }
            StructuralMode::CombinedFields => {
                vec![self.extract_combined(root, &names, roles.as_ref())?]
            }
            StructuralMode::TableRows => {
                self.extract_table(root, &names, subtag.as_ref(), roles.as_ref())?
            }
        };

        Ok(batches)
    }

    fn role_reader(&self) -> SelectorResult<Option<RoleReader<'r>>> {
        let Some(selector) = &self.rule.role_selector else {
            return Ok(None);
        };

        Ok(Some(RoleReader {
            selector: CompiledSelector::compile(selector)?,
            subtag: compile_optional(self.rule.role_subtag.as_ref())?,
            scope: self.rule.role_scope,
            skip_terms: &self.rule.role_skip_terms,
            keep_terms: &self.rule.role_keep_terms,
        }))
    }

    fn batch(
        &self,
        scope: ElementRef<'_>,
        nodes: &[ElementRef<'_>],
        names: &CompiledSelector,
        subtag: Option<&CompiledSelector>,
        roles: Option<&RoleReader<'_>>,
    ) -> CandidateBatch {
        self.batch_with(scope, nodes, roles, |node| match subtag {
            Some(subtag) => subtag.first(node).map(|inner| subtag.text(inner)),
            None => Some(names.text(node)),
        })
    }

    fn batch_with<F>(
        &self,
        scope: ElementRef<'_>,
        nodes: &[ElementRef<'_>],
        roles: Option<&RoleReader<'_>>,
        read: F,
    ) -> CandidateBatch
    where
        F: Fn(ElementRef<'_>) -> Option<String>,
    {
        let mut batch = CandidateBatch::new(nodes.len());

        for (slot, node) in nodes.iter().enumerate() {
            match read(*node) {
                Some(text) => batch
                    .candidates
                    .push(CandidateName::new(text, slot, self.source_id)),
                None => debug!(
                    source = self.source_id,
                    slot, "name node lacks expected substructure, skipping"
                ),
            }
        }

        batch.roles = roles.map(|reader| reader.read(scope, nodes));
        batch
    }

    fn extract_sections(
        &self,
        root: ElementRef<'_>,
        names: &CompiledSelector,
        subtag: Option<&CompiledSelector>,
        roles: Option<&RoleReader<'_>>,
    ) -> SelectorResult<Vec<CandidateBatch>> {
        let mut batches = Vec::new();

        for (index, section) in self.rule.sections.iter().enumerate() {
            let container = CompiledSelector::compile(&section.container)?;
            let descend = compile_optional(section.descend.as_ref())?;
            let section_names = compile_optional(section.name_selector.as_ref())?;
            let section_subtag = compile_optional(section.name_subtag.as_ref())?;

            let section_names = section_names.as_ref().unwrap_or(names);
            let section_subtag = section_subtag.as_ref().or(subtag);

            let containers = section.pick.apply(&container.select(root));
            if containers.is_empty() {
                debug!(source = self.source_id, section = index, "section not found");
            }

            for container in containers {
                let scope = match &descend {
                    Some(descend) => {
                        let Some(inner) = descend.first(container) else {
                            debug!(
                                source = self.source_id,
                                section = index,
                                "section container lacks descend target, skipping"
                            );
                            continue;
                        };
                        inner
                    }
                    None => container,
                };

                let mut nodes = section_names.select(scope);
                if section.first_only {
                    nodes.truncate(1);
                }
                batches.push(self.batch(scope, &nodes, section_names, section_subtag, roles));
            }
        }

        Ok(batches)
    }

    fn extract_combined(
        &self,
        root: ElementRef<'_>,
        names: &CompiledSelector,
        roles: Option<&RoleReader<'_>>,
    ) -> SelectorResult<CandidateBatch> {
        let Some(combined) = &self.rule.combined else {
            return Ok(CandidateBatch::default());
        };
        let first_field = CompiledSelector::compile(&combined.first)?;
        let last_field = CompiledSelector::compile(&combined.last)?;

        let nodes = names.select(root);
        Ok(self.batch_with(root, &nodes, roles, |node| {
            let first = first_field.text(first_field.first(node)?);
            let last = last_field.text(last_field.first(node)?);
            Some(format!("{} {}", first.trim(), last.trim()))
        }))
    }

    fn extract_table(
        &self,
        root: ElementRef<'_>,
        names: &CompiledSelector,
        subtag: Option<&CompiledSelector>,
        roles: Option<&RoleReader<'_>>,
    ) -> SelectorResult<Vec<CandidateBatch>> {
        let Some(table) = &self.rule.table else {
            return Ok(Vec::new());
        };
        let inner = compile_optional(table.table.as_ref())?;
        let entry = CompiledSelector::compile(&table.entry)?;

        let mut batches = Vec::new();
        for container in table.pick.apply(&names.select(root)) {
            let scope = match &inner {
                Some(inner) => {
                    let Some(found) = inner.first(container) else {
                        debug!(source = self.source_id, "container lacks nested table, skipping");
                        continue;
                    };
                    found
                }
                None => container,
            };

            let nodes = entry.select(scope);
            batches.push(self.batch(scope, &nodes, &entry, subtag, roles));
        }

        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{NodeSelector, Pick, SectionRule, TableRule, TextPart};

    fn texts(batches: &[CandidateBatch]) -> Vec<Vec<String>> {
        batches
            .iter()
            .map(|b| b.candidates.iter().map(|c| c.text.trim().to_string()).collect())
            .collect()
    }

    fn run(rule: &ExtractionRule, html: &str) -> Vec<CandidateBatch> {
        let doc = ParsedDocument::parse("https://example.edu/people", html);
        CandidateExtractor::new(rule, "demo").extract(&doc).unwrap()
    }

    #[test]
    fn test_flat_own_text() {
        let rule = ExtractionRule::new(NodeSelector::tag("span").with_class("name"));
        let batches = run(
            &rule,
            r#"<span class="name"> Jane Smith </span><span class="other">x</span><span class="name">John Doe</span>"#,
        );

        assert_eq!(texts(&batches), vec![vec!["Jane Smith", "John Doe"]]);
        assert_eq!(batches[0].slots, 2);
        assert_eq!(batches[0].candidates[1].slot, 1);
        assert_eq!(batches[0].candidates[1].source, "demo");
        assert!(batches[0].roles.is_none());
    }

    #[test]
    fn test_flat_subtag_missing_keeps_slot() {
        let rule = ExtractionRule::new(NodeSelector::tag("div").with_class("person"))
            .with_name_subtag(NodeSelector::tag("h3"));
        let batches = run(
            &rule,
            r#"
            <div class="person"><h3>Ann Lee</h3><p>Professor</p></div>
            <div class="person"><p>Staff listing</p></div>
            <div class="person"><h3>Raj Patel</h3></div>
            "#,
        );

        assert_eq!(texts(&batches), vec![vec!["Ann Lee", "Raj Patel"]]);
        assert_eq!(batches[0].slots, 3);
        assert_eq!(batches[0].candidates[1].slot, 2);
    }

    #[test]
    fn test_role_paired_document_scope() {
        let rule = ExtractionRule::new(NodeSelector::tag("h3").with_class("name")).with_roles(
            NodeSelector::tag("p").with_class("title"),
            RoleScope::Document,
        );
        let batches = run(
            &rule,
            r#"
            <h3 class="name">Alice A</h3><p class="title">Professor</p>
            <h3 class="name">Bob B</h3><p class="title">Professor Emeritus</p>
            "#,
        );

        assert_eq!(
            batches[0].roles.as_deref(),
            Some(&["Professor".to_string(), "Professor Emeritus".to_string()][..])
        );
    }

    #[test]
    fn test_role_skip_terms_and_subtag() {
        let mut rule = ExtractionRule::new(NodeSelector::tag("h3"))
            .with_roles(NodeSelector::tag("div").with_class("meta"), RoleScope::Document)
            .with_role_subtag(NodeSelector::tag("em"));
        rule.role_skip_terms = vec!["Research area".into()];

        let batches = run(
            &rule,
            r#"
            <h3>Alice A</h3><div class="meta"><em>Professor</em></div>
            <div class="meta"><em>Research area: Bayes</em></div>
            <h3>Bob B</h3><div class="meta"><span>no title</span></div>
            "#,
        );

        assert_eq!(
            batches[0].roles.clone().unwrap(),
            vec!["Professor".to_string(), String::new()]
        );
    }

    #[test]
    fn test_role_keep_terms_with_unclassed_role_nodes() {
        let rule = ExtractionRule::new(NodeSelector::tag("h4"))
            .with_roles(
                NodeSelector::tag("p").without_attribute("class"),
                RoleScope::Document,
            )
            .with_role_terms(Vec::new(), vec!["Student".into()]);
        let batches = run(
            &rule,
            r#"
            <h4>Ann Lee</h4><p class="email">ann@example.edu</p><p>Research interests: graphs</p>
            <p>PhD Student</p>
            <h4>Raj Patel</h4><p class="email">raj@example.edu</p><p>Visiting Student</p>
            "#,
        );

        assert_eq!(
            batches[0].roles.clone().unwrap(),
            vec!["PhD Student", "Visiting Student"]
        );
    }

    #[test]
    fn test_trailing_name_and_first_line_role() {
        let rule = ExtractionRule::new(
            NodeSelector::tag("div")
                .with_class("name")
                .with_text(TextPart::TrailingText),
        )
        .with_roles(
            NodeSelector::tag("p").with_text(TextPart::FirstLine),
            RoleScope::Document,
        );
        let batches = run(
            &rule,
            r#"
            <div class="name"><a href="/p/1"><img src="1.jpg"/></a>Jane Smith</div>
            <p>Professor Emeritus<br/>Room 101</p>
            <div class="name"><a href="/p/2"><img src="2.jpg"/></a> John Doe</div>
            <p>Lecturer</p>
            "#,
        );

        assert_eq!(texts(&batches), vec![vec!["Jane Smith", "John Doe"]]);
        assert_eq!(
            batches[0].roles.clone().unwrap(),
            vec!["Professor Emeritus", "Lecturer"]
        );
    }

    #[test]
    fn test_role_within_name() {
        let rule = ExtractionRule::new(NodeSelector::tag("li").with_class("person"))
            .with_name_subtag(NodeSelector::tag("strong"))
            .with_roles(NodeSelector::tag("span").with_class("position"), RoleScope::WithinName);
        let batches = run(
            &rule,
            r#"
            <ul>
              <li class="person"><strong>Alice A</strong><span class="position">Professor</span></li>
              <li class="person"><strong>Bob B</strong></li>
            </ul>
            "#,
        );

        assert_eq!(
            batches[0].roles.clone().unwrap(),
            vec!["Professor".to_string(), String::new()]
        );
        assert_eq!(batches[0].slots, 2);
    }

    #[test]
    fn test_sectioned_in_configured_order() {
        let rule = ExtractionRule::new(NodeSelector::tag("span").with_class("name")).with_sections(
            vec![
                SectionRule::new(NodeSelector::tag("div").with_class("core")).with_pick(Pick::First),
                SectionRule::new(NodeSelector::tag("div").with_class("affiliated")),
            ],
        );
        let batches = run(
            &rule,
            r#"
            <div class="affiliated"><span class="name">Zed Z</span></div>
            <div class="core"><span class="name">Amy A</span><span class="name">Ben B</span></div>
            <div class="core"><span class="name">Second Core</span></div>
            <div class="affiliated"><span class="name">Yan Y</span></div>
            "#,
        );

        assert_eq!(
            texts(&batches),
            vec![vec!["Amy A", "Ben B"], vec!["Zed Z"], vec!["Yan Y"]]
        );
    }

    #[test]
    fn test_sectioned_descend_first_only_and_override() {
        let rule = ExtractionRule::new(NodeSelector::tag("span").with_class("name")).with_sections(
            vec![
                SectionRule::new(NodeSelector::tag("div").with_class("group"))
                    .with_descend(NodeSelector::tag("ul")),
                SectionRule::new(NodeSelector::tag("div").with_class("card"))
                    .with_name_selector(NodeSelector::tag("a"))
                    .first_only(),
            ],
        );
        let batches = run(
            &rule,
            r#"
            <div class="group"><span class="name">Outside List</span>
              <ul><li><span class="name">In List</span></li></ul></div>
            <div class="group"><p>no list here</p></div>
            <div class="card"><a>Card One</a><a>profile</a></div>
            <div class="card"><a>Card Two</a></div>
            "#,
        );

        assert_eq!(
            texts(&batches),
            vec![vec!["In List"], vec!["Card One"], vec!["Card Two"]]
        );
    }

    #[test]
    fn test_sectioned_roles_align_per_section() {
        let rule = ExtractionRule::new(NodeSelector::tag("h4"))
            .with_sections(vec![SectionRule::new(NodeSelector::tag("section"))])
            .with_roles(NodeSelector::tag("p"), RoleScope::Document);
        let batches = run(
            &rule,
            r"
            <section><h4>Alice A</h4><p>Professor</p></section>
            <section><h4>Bob B</h4><p>Lecturer</p><h4>Cy C</h4><p>Adjunct</p></section>
            ",
        );

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].roles.clone().unwrap(), vec!["Professor"]);
        assert_eq!(batches[1].roles.clone().unwrap(), vec!["Lecturer", "Adjunct"]);
        assert_eq!(batches[1].slots, 2);
    }

    #[test]
    fn test_combined_fields() {
        let rule = ExtractionRule::new(NodeSelector::tag("div").with_class("person")).with_combined(
            NodeSelector::tag("span").with_class("first"),
            NodeSelector::tag("span").with_class("last"),
        );
        let batches = run(
            &rule,
            r#"
            <div class="person"><span class="first"> Jane </span><span class="last">Smith </span></div>
            <div class="person"><span class="first">Solo</span></div>
            <div class="person"><span class="last">Doe</span><span class="first">John</span></div>
            "#,
        );

        assert_eq!(texts(&batches), vec![vec!["Jane Smith", "John Doe"]]);
        assert_eq!(batches[0].slots, 3);
    }

    #[test]
    fn test_table_rows_first_container_only() {
        let rule = ExtractionRule::new(NodeSelector::tag("div").with_class("listing")).with_table(
            TableRule {
                pick: Pick::First,
                table: Some(NodeSelector::tag("table")),
                entry: NodeSelector::tag("li"),
            },
        );
        let batches = run(
            &rule,
            r#"
            <div class="listing"><h2>PhD</h2><table><tr><td><ul>
              <li>Ann Lee</li><li>Raj Patel</li></ul></td></tr></table></div>
            <div class="listing"><h2>Masters</h2><table><tr><td><ul>
              <li>Not Wanted</li></ul></td></tr></table></div>
            "#,
        );

        assert_eq!(texts(&batches), vec![vec!["Ann Lee", "Raj Patel"]]);
    }

    #[test]
    fn test_table_rows_indexed_tables() {
        let rule = ExtractionRule::new(NodeSelector::tag("table")).with_table(TableRule {
            pick: Pick::Indices(vec![1]),
            table: None,
            entry: NodeSelector::tag("span").with_class("name"),
        });
        let batches = run(
            &rule,
            r#"
            <table><tr><td><span class="name">Faculty One</span></td></tr></table>
            <table><tr><td><span class="name">Student One</span></td></tr>
                   <tr><td><span class="name">Student Two</span></td></tr></table>
            "#,
        );

        assert_eq!(texts(&batches), vec![vec!["Student One", "Student Two"]]);
    }

    #[test]
    fn test_alternate_tag_for_url() {
        let rule = ExtractionRule::new(NodeSelector::tag("h3"))
            .with_alternate_tag("https://example.edu/people", "h4");
        let batches = run(&rule, "<h3>Wrong Tag</h3><h4>Right Tag</h4>");

        assert_eq!(texts(&batches), vec![vec!["Right Tag"]]);
    }

    #[test]
    fn test_selector_miss_yields_empty_batch() {
        let rule = ExtractionRule::new(NodeSelector::tag("span").with_class("name"));
        let batches = run(&rule, "<p>Nobody here</p>");

        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
        assert_eq!(batches[0].slots, 0);
    }
}
