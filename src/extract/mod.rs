//! Field extraction primitive
//!
//! The pipeline never inspects raw markup. A fetched body is wrapped in a
//! [`Document`] and fields are pulled out through [`extract`] /
//! [`extract_all`] against declarative [`FieldSelector`] descriptors.
//! Absence is a first-class result ([`Extracted::Absent`]); extraction never
//! fails, and every call site supplies its own documented default.
//!
//! The selector table for the target site lives in [`selectors`] — the only
//! module in the crate that knows what the pages look like.

pub mod selectors;

use scraper::{Html, Selector};
use url::Url;

/// A parsed page plus the base URL for resolving relative links
///
/// Holds a `scraper::Html`, which is not `Send`; construct and consume a
/// `Document` synchronously between awaits.
pub struct Document {
    html: Html,
    base_url: Url,
}

/// Result of extracting a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// The selector matched and produced a non-empty value
    Value(String),
    /// Nothing matched (or the match was empty after trimming)
    Absent,
}

impl Extracted {
    /// Resolves absence to the given default
    pub fn or_default(self, default: &str) -> String {
        match self {
            Self::Value(v) => v,
            Self::Absent => default.to_string(),
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent => None,
        }
    }
}

/// Describes where a field lives on the page
///
/// `attr = None` takes the element's text content; `attr = Some(..)` takes
/// that attribute's value.
#[derive(Debug, Clone, Copy)]
pub struct FieldSelector {
    /// Field name, used only for diagnostics
    pub name: &'static str,
    pub css: &'static str,
    pub attr: Option<&'static str>,
}

impl Document {
    /// Parses an HTML body fetched from `base_url`
    pub fn parse(body: &str, base_url: Url) -> Self {
        Self {
            html: Html::parse_document(body),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an href against the document's base URL
    ///
    /// Returns None for non-http(s) results and unparseable hrefs.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        match self.base_url.join(href) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
            _ => None,
        }
    }

    pub(crate) fn html(&self) -> &Html {
        &self.html
    }
}

/// Extracts the first match for a field
///
/// Never fails: an unmatched selector, an element without the requested
/// attribute, or a value that trims to empty all come back as
/// [`Extracted::Absent`]. A selector that does not compile is a programming
/// error in the selector table; it is logged and treated as absent.
pub fn extract(doc: &Document, field: &FieldSelector) -> Extracted {
    let selector = match Selector::parse(field.css) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("invalid selector for field '{}': {:?}", field.name, e);
            return Extracted::Absent;
        }
    };

    for element in doc.html().select(&selector) {
        let raw = match field.attr {
            Some(attr) => element.value().attr(attr).map(str::to_string),
            None => Some(element.text().collect::<String>()),
        };

        if let Some(value) = raw {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Extracted::Value(trimmed.to_string());
            }
        }
    }

    Extracted::Absent
}

/// Extracts every match for a field
///
/// Returns an empty vec (never `Absent`) when nothing matches; blank values
/// are dropped.
pub fn extract_all(doc: &Document, field: &FieldSelector) -> Vec<String> {
    let selector = match Selector::parse(field.css) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("invalid selector for field '{}': {:?}", field.name, e);
            return Vec::new();
        }
    };

    doc.html()
        .select(&selector)
        .filter_map(|element| {
            let raw = match field.attr {
                Some(attr) => element.value().attr(attr).map(str::to_string),
                None => Some(element.text().collect::<String>()),
            };
            raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        })
        .collect()
}

/// Upgrades protocol-relative URLs to https
///
/// CDN image srcs come back as `//cdn.example.com/...`.
pub fn ensure_https(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}
