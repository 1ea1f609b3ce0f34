use scraper::{Html, Selector};

/// A parsed HTML page that rules are applied to.
///
/// Parsing is lenient: malformed markup is repaired the same way a browser
/// would, so constructing a `Document` never fails. The underlying tree is
/// not `Send`; parse and extract on the same task without awaiting in
/// between.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document.
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// Collect the value of `attribute` on every element matching `selector`,
    /// in document order. Elements without the attribute are skipped.
    pub fn attribute_values<'a>(
        &'a self,
        selector: &'a Selector,
        attribute: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.html
            .select(selector)
            .filter_map(move |element| element.value().attr(attribute))
    }

    /// The `href` of the first `<base>` element, if the page declares one.
    pub fn base_href(&self) -> Option<&str> {
        let selector = Selector::parse("base[href]").ok()?;
        self.html
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("href"))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("errors", &self.html.errors.len())
            .finish_non_exhaustive()
    }
}
