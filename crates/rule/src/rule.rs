use std::collections::HashSet;

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::document::Document;
use crate::error::RuleError;

/// Selector used when a rule does not name any link selectors.
pub const DEFAULT_LINK_SELECTOR: &str = "a[href]";

/// Attribute read from matched elements when a rule does not name one.
pub const DEFAULT_ATTRIBUTE: &str = "href";

/// A crawl rule: where to start and which links on a page to follow.
///
/// The serialized form is the canonical payload persisted by the rule store.
/// Empty optional fields are omitted when encoding, and unknown fields are
/// ignored when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Absolute URL the crawl starts from.
    pub start: String,
    /// CSS selectors for link elements. Empty means [`DEFAULT_LINK_SELECTOR`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    /// Attribute holding the link target. `None` means [`DEFAULT_ATTRIBUTE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// When non-empty, a link must match at least one of these patterns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
    /// Links matching any of these patterns are dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reject: Vec<String>,
    /// Drop links that leave the host of the page being extracted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub same_host: bool,
}

impl Rule {
    /// Create a rule with only a start URL; every other field takes its default.
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            links: Vec::new(),
            attribute: None,
            accept: Vec::new(),
            reject: Vec::new(),
            same_host: false,
        }
    }

    /// Parse the `start` field as an absolute http(s) URL.
    pub fn start_url(&self) -> Result<Url, RuleError> {
        let invalid = |reason: String| RuleError::InvalidStart {
            url: self.start.clone(),
            reason,
        };

        let url = Url::parse(self.start.trim()).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    /// Check that the rule is usable: the start URL is absolute and every
    /// selector and pattern compiles.
    pub fn validate(&self) -> Result<(), RuleError> {
        self.start_url()?;
        self.compile()?;
        Ok(())
    }

    /// Compile selectors and patterns into a form that can be applied to
    /// documents repeatedly.
    pub fn compile(&self) -> Result<CompiledRule, RuleError> {
        let selectors = if self.links.is_empty() {
            vec![parse_selector(DEFAULT_LINK_SELECTOR)?]
        } else {
            self.links
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<Vec<_>, _>>()?
        };

        let attribute = self
            .attribute
            .as_deref()
            .map_or(DEFAULT_ATTRIBUTE, str::trim);
        if attribute.is_empty() {
            return Err(RuleError::EmptyAttribute);
        }

        Ok(CompiledRule {
            selectors,
            attribute: attribute.to_owned(),
            accept: compile_patterns("accept", &self.accept)?,
            reject: compile_patterns("reject", &self.reject)?,
            same_host: self.same_host,
        })
    }

    /// Apply the rule to `document`, resolving relative links against `base`.
    pub fn extract_links(&self, document: &Document, base: &Url) -> Result<Vec<Url>, RuleError> {
        self.compile()?.extract_links(document, base)
    }
}

/// A [`Rule`] with its selectors and patterns compiled.
#[derive(Debug)]
pub struct CompiledRule {
    selectors: Vec<Selector>,
    attribute: String,
    accept: Vec<Regex>,
    reject: Vec<Regex>,
    same_host: bool,
}

impl CompiledRule {
    /// Extract the links this rule follows from `document`.
    ///
    /// Links are returned in document order (selector by selector), each URL
    /// at most once. Only http(s) targets are kept; fragments are stripped.
    pub fn extract_links(&self, document: &Document, base: &Url) -> Result<Vec<Url>, RuleError> {
        if base.cannot_be_a_base() {
            return Err(RuleError::InvalidBase(base.to_string()));
        }

        let base = match document.base_href() {
            Some(href) => base.join(href).unwrap_or_else(|_| base.clone()),
            None => base.clone(),
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for selector in &self.selectors {
            for raw in document.attribute_values(selector, &self.attribute) {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }

                let mut url = match base.join(raw) {
                    Ok(url) => url,
                    Err(e) => {
                        debug!(link = raw, error = %e, "skipping unresolvable link");
                        continue;
                    }
                };
                url.set_fragment(None);

                if !self.follows(&url, &base) {
                    continue;
                }

                if seen.insert(url.as_str().to_owned()) {
                    links.push(url);
                }
            }
        }

        Ok(links)
    }

    fn follows(&self, url: &Url, base: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        if self.same_host && url.host_str() != base.host_str() {
            return false;
        }

        let candidate = url.as_str();
        if self.reject.iter().any(|re| re.is_match(candidate)) {
            return false;
        }
        self.accept.is_empty() || self.accept.iter().any(|re| re.is_match(candidate))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, RuleError> {
    Selector::parse(selector).map_err(|e| RuleError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

fn compile_patterns(list: &'static str, patterns: &[String]) -> Result<Vec<Regex>, RuleError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
                list,
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}
