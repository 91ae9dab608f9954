use scraper::{ElementRef, Html, Selector};

// The tree is not `Send`; it is built and consumed inside a synchronous
// pass and never held across an `.await`.
pub struct ParsedDocument {
    url: String,
    html: Html,
}

impl ParsedDocument {
    #[must_use]
    pub fn parse(url: impl Into<String>, markup: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(markup),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for ParsedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedDocument")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
