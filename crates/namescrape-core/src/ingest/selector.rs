use scraper::{ElementRef, Selector};
use thiserror::Error;

use crate::rules::{AttributeMatch, NodeSelector, TextPart};

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Selector tag is empty")]
    EmptyTag,
    #[error("Invalid selector tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },
    #[error("Blank class constraint on <{0}>")]
    BlankClass(String),
    #[error("Blank attribute name on <{0}>")]
    BlankAttribute(String),
    #[error("Attribute {0:?} cannot be both absent and valued")]
    ConflictingAttribute(String),
}

pub type SelectorResult<T> = Result<T, SelectorError>;

// The tag goes through `scraper`; class tokens and the attribute constraint
// are checked per element so configured values never need CSS escaping.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    tag: Selector,
    classes: Vec<String>,
    attribute: Option<AttributeMatch>,
    text: TextPart,
}

impl CompiledSelector {
    pub fn compile(selector: &NodeSelector) -> SelectorResult<Self> {
        let tag = selector.tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return Err(SelectorError::EmptyTag);
        }
        if tag != "*"
            && !tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SelectorError::InvalidTag {
                tag,
                reason: "expected a bare element name".into(),
            });
        }

        let parsed = Selector::parse(&tag).map_err(|e| SelectorError::InvalidTag {
            tag: tag.clone(),
            reason: format!("{e:?}"),
        })?;

        let classes: Vec<String> = match &selector.class {
            Some(class) => {
                let tokens: Vec<String> = class.split_whitespace().map(String::from).collect();
                if tokens.is_empty() {
                    return Err(SelectorError::BlankClass(tag));
                }
                tokens
            }
            None => Vec::new(),
        };

        let attribute = match &selector.attribute {
            Some(attr) if attr.name.trim().is_empty() => {
                return Err(SelectorError::BlankAttribute(tag));
            }
            Some(attr) if attr.absent && attr.value.is_some() => {
                return Err(SelectorError::ConflictingAttribute(attr.name.clone()));
            }
            Some(attr) => Some(AttributeMatch {
                name: attr.name.trim().to_string(),
                value: attr.value.clone(),
                absent: attr.absent,
            }),
            None => None,
        };

        Ok(Self {
            tag: parsed,
            classes,
            attribute,
            text: selector.text,
        })
    }

    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        let value = element.value();

        let classes_ok = self
            .classes
            .iter()
            .all(|wanted| value.classes().any(|have| have == wanted));
        if !classes_ok {
            return false;
        }

        match &self.attribute {
            Some(AttributeMatch {
                name, absent: true, ..
            }) => value.attr(name).is_none(),
            Some(AttributeMatch {
                name,
                value: Some(expected),
                ..
            }) => value.attr(name) == Some(expected.as_str()),
            Some(AttributeMatch { name, .. }) => value.attr(name).is_some(),
            None => true,
        }
    }

    pub fn text(&self, element: ElementRef<'_>) -> String {
        match self.text {
            TextPart::Full => node_text(element),
            TextPart::FirstLine => first_line(element),
            TextPart::TrailingText => trailing_text(element),
        }
    }

    /// Matching descendants of `scope` in document order, never `scope` itself.
    pub fn select<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope
            .select(&self.tag)
            .filter(|el| el.id() != scope.id() && self.matches(*el))
            .collect()
    }

    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope
            .select(&self.tag)
            .find(|el| el.id() != scope.id() && self.matches(*el))
    }
}

pub fn compile_optional(selector: Option<&NodeSelector>) -> SelectorResult<Option<CompiledSelector>> {
    selector.map(CompiledSelector::compile).transpose()
}

fn node_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn first_line(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants().skip(1) {
        if let Some(text) = node.value().as_text() {
            out.push_str(text);
        } else if node.value().as_element().is_some_and(|el| el.name() == "br") {
            break;
        }
    }
    out.trim_start().lines().next().unwrap_or_default().to_string()
}

// Direct text children after the last child element; all direct text when
// there is no child element.
fn trailing_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if child.value().is_element() {
            out.clear();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ParsedDocument;

    const PAGE: &str = r#"
        <html><body>
          <div class="people">
            <span class="name">Jane Smith</span>
            <span class="name bold">John Doe</span>
            <span class="title">Professor</span>
          </div>
          <table>
            <tr><td data-title="Name">Ann Lee</td><td data-title="Office">B12</td></tr>
            <tr><td data-title="Name">Raj Patel</td><td>none</td></tr>
          </table>
        </body></html>
    "#;

    fn texts(elements: &[ElementRef<'_>]) -> Vec<String> {
        elements.iter().map(|e| node_text(*e).trim().to_string()).collect()
    }

    #[test]
    fn test_select_by_class_in_document_order() {
        let doc = ParsedDocument::parse("mem://page", PAGE);
        let sel = CompiledSelector::compile(&NodeSelector::tag("span").with_class("name")).unwrap();

        assert_eq!(texts(&sel.select(doc.root())), vec!["Jane Smith", "John Doe"]);
    }

    #[test]
    fn test_multi_token_class_requires_all_tokens() {
        let doc = ParsedDocument::parse("mem://page", PAGE);
        let sel =
            CompiledSelector::compile(&NodeSelector::tag("span").with_class("bold  name")).unwrap();

        assert_eq!(texts(&sel.select(doc.root())), vec!["John Doe"]);
    }

    #[test]
    fn test_select_by_other_attribute() {
        let doc = ParsedDocument::parse("mem://page", PAGE);
        let sel = CompiledSelector::compile(
            &NodeSelector::tag("td").with_attribute("data-title", Some("Name")),
        )
        .unwrap();

        assert_eq!(texts(&sel.select(doc.root())), vec!["Ann Lee", "Raj Patel"]);

        let present =
            CompiledSelector::compile(&NodeSelector::tag("td").with_attribute("data-title", None))
                .unwrap();
        assert_eq!(present.select(doc.root()).len(), 3);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let doc = ParsedDocument::parse("mem://page", PAGE);
        let sel = CompiledSelector::compile(&NodeSelector::tag("h2").with_class("name")).unwrap();

        assert!(sel.select(doc.root()).is_empty());
        assert!(sel.first(doc.root()).is_none());
    }

    #[test]
    fn test_select_within_excludes_scope() {
        let doc = ParsedDocument::parse(
            "mem://nested",
            "<div class='outer'><div class='inner'>x</div></div>",
        );
        let divs = CompiledSelector::compile(&NodeSelector::tag("div")).unwrap();
        let outer = divs.first(doc.root()).unwrap();

        let inner = divs.select(outer);
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].value().attr("class"), Some("inner"));
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        let doc = ParsedDocument::parse("mem://page", PAGE);
        let sel = CompiledSelector::compile(&NodeSelector::tag("SPAN")).unwrap();

        assert_eq!(sel.select(doc.root()).len(), 3);
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            CompiledSelector::compile(&NodeSelector::tag("  ")),
            Err(SelectorError::EmptyTag)
        ));
        assert!(matches!(
            CompiledSelector::compile(&NodeSelector::tag("div.name")),
            Err(SelectorError::InvalidTag { .. })
        ));
        assert!(matches!(
            CompiledSelector::compile(&NodeSelector::tag("div").with_class(" ")),
            Err(SelectorError::BlankClass(_))
        ));
        assert!(matches!(
            CompiledSelector::compile(&NodeSelector::tag("div").with_attribute("", None)),
            Err(SelectorError::BlankAttribute(_))
        ));

        let mut conflicting = NodeSelector::tag("p").without_attribute("class");
        if let Some(attr) = conflicting.attribute.as_mut() {
            attr.value = Some("x".into());
        }
        assert!(matches!(
            CompiledSelector::compile(&conflicting),
            Err(SelectorError::ConflictingAttribute(_))
        ));
    }

    #[test]
    fn test_absent_attribute_skips_classed_elements() {
        let doc = ParsedDocument::parse(
            "mem://roles",
            "<p class='intro'>Welcome</p><p>PhD Student</p><p>Staff</p>",
        );
        let sel =
            CompiledSelector::compile(&NodeSelector::tag("p").without_attribute("class")).unwrap();

        assert_eq!(texts(&sel.select(doc.root())), vec!["PhD Student", "Staff"]);
    }

    #[test]
    fn test_first_line_stops_at_break() {
        let doc = ParsedDocument::parse(
            "mem://lines",
            "<p><b>Associate Professor</b><br/>Room 210<br/>555-0100</p><p>Lecturer</p>",
        );
        let sel = CompiledSelector::compile(
            &NodeSelector::tag("p").with_text(TextPart::FirstLine),
        )
        .unwrap();
        let found = sel.select(doc.root());

        assert_eq!(sel.text(found[0]), "Associate Professor");
        assert_eq!(sel.text(found[1]), "Lecturer");
    }

    #[test]
    fn test_trailing_text_after_last_child() {
        let doc = ParsedDocument::parse(
            "mem://trailing",
            "<li><img src='a.jpg'/><a href='#'>Profile</a> Jane Smith </li><li>John Doe</li>",
        );
        let sel = CompiledSelector::compile(
            &NodeSelector::tag("li").with_text(TextPart::TrailingText),
        )
        .unwrap();
        let found = sel.select(doc.root());

        assert_eq!(sel.text(found[0]).trim(), "Jane Smith");
        assert_eq!(sel.text(found[1]), "John Doe");
        assert_eq!(node_text(found[0]).trim(), "Profile Jane Smith");
    }
}
