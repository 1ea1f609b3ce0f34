use std::sync::Arc;

use spider_rule::{Document, Rule, codec};
use tracing::{debug, info};
use url::Url;

use crate::error::RegistryError;
use crate::fetch::{Fetcher, Page};

/// Previews what a candidate rule would extract from its live start page.
///
/// Test runs never read or write the rule store, so a rule can be tried
/// before it is saved. Each run performs exactly one fetch; nothing is
/// retried or cached.
pub struct TestRunner {
    fetcher: Arc<dyn Fetcher>,
}

impl TestRunner {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Decode `document`, fetch its start page, and return the links the rule
    /// extracts, exactly as the rule engine produced them.
    ///
    /// `start` overrides the document's own `start` field when given.
    pub async fn run_test(
        &self,
        document: &[u8],
        start: Option<&str>,
    ) -> Result<Vec<Url>, RegistryError> {
        let rule = codec::decode(document).map_err(RegistryError::InvalidDocument)?;
        let start = parse_start(start.unwrap_or(&rule.start))?;

        debug!(start = %start, "running rule test");
        let page = self.fetcher.fetch(&start).await?;

        let links = extract(&rule, &page)?;
        info!(start = %start, links = links.len(), "rule test completed");
        Ok(links)
    }
}

fn parse_start(raw: &str) -> Result<Url, RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidUrl {
        url: raw.to_owned(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Parse the page and apply the rule. Links resolve against the page's final
/// URL so redirects are honored.
fn extract(rule: &Rule, page: &Page) -> Result<Vec<Url>, RegistryError> {
    let document = Document::parse(&page.body);
    rule.extract_links(&document, &page.url)
        .map_err(RegistryError::ExtractionFailed)
}
