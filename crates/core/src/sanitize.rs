//! Structural sanitization of a document before extraction.
//!
//! The [`Sanitizer`] trait is the seam the article uses to strip
//! non-content nodes. [`StructuralSanitizer`] is the default: a single
//! `lol_html` rewriting pass over the serialized document followed by a
//! rebuild of the tree.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::parse::Document;
use crate::{ReadError, Result};

/// Strips non-content structure from a document in place.
pub trait Sanitizer: Send + Sync {
    /// Applies the built-in rules plus `extra_rules` (CSS selectors whose
    /// matches are removed) to `doc`.
    fn prepare(&self, doc: &mut Document, extra_rules: &[String]) -> Result<()>;
}

/// Tags that never carry article content.
const STRIP_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "canvas", "object", "embed", "template"];

static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup)",
    )
    .unwrap()
});

static MAYBE_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story|tweet)").unwrap()
});

static HIDDEN_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").unwrap());

/// Configuration for the default sanitizer.
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Remove script, style, iframe and other non-content tags
    pub remove_non_content_tags: bool,
    /// Remove HTML comments
    pub remove_comments: bool,
    /// Unwrap elements whose class or id looks like page chrome
    pub remove_unlikely: bool,
    /// Keep unlikely-looking elements that also look like content
    pub keep_positive: bool,
    /// Remove elements hidden with `hidden` or inline styles
    pub remove_hidden: bool,
    /// Make `href`/`src` absolute against the document URL
    pub absolutize_urls: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            remove_non_content_tags: true,
            remove_comments: true,
            remove_unlikely: true,
            keep_positive: true,
            remove_hidden: true,
            absolutize_urls: true,
        }
    }
}

/// Default [`Sanitizer`] built on `lol_html`.
#[derive(Debug, Clone, Default)]
pub struct StructuralSanitizer {
    config: SanitizeConfig,
}

impl StructuralSanitizer {
    pub fn new(config: SanitizeConfig) -> Self {
        Self { config }
    }

    /// Rewrites serialized markup according to the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidSelector`] when an extra rule is not a
    /// selector `lol_html` understands.
    pub fn sanitize_markup(&self, html: &str, base_url: Option<&Url>, extra_rules: &[String]) -> Result<String> {
        for rule in extra_rules {
            rule.parse::<lol_html::Selector>()
                .map_err(|e| ReadError::InvalidSelector(format!("{rule}: {e}")))?;
        }

        let config = &self.config;
        let mut element_handlers = vec![lol_html::element!("*", |el| {
            let tag = el.tag_name();
            if matches!(tag.as_str(), "html" | "head" | "body" | "title" | "meta") {
                return Ok(());
            }

            if config.remove_non_content_tags && STRIP_TAGS.contains(&tag.as_str()) {
                el.remove();
                return Ok(());
            }

            if config.remove_hidden
                && (el.has_attribute("hidden") || el.get_attribute("style").is_some_and(|s| HIDDEN_STYLE.is_match(&s)))
            {
                el.remove();
                return Ok(());
            }

            if config.remove_unlikely && is_unlikely(el, config.keep_positive) {
                el.remove_and_keep_content();
                return Ok(());
            }

            if config.absolutize_urls
                && let Some(base) = base_url
            {
                for attr in ["href", "src"] {
                    if let Some(value) = el.get_attribute(attr)
                        && let Ok(absolute) = base.join(&value)
                    {
                        el.set_attribute(attr, absolute.as_str()).ok();
                    }
                }
            }

            Ok(())
        })];

        for rule in extra_rules {
            element_handlers.push(lol_html::element!(rule.as_str(), |el| {
                el.remove();
                Ok(())
            }));
        }

        let document_handlers = if config.remove_comments {
            vec![lol_html::doc_comments!(|c| {
                c.remove();
                Ok(())
            })]
        } else {
            Vec::new()
        };

        let mut output = Vec::with_capacity(html.len());
        let mut rewriter = lol_html::HtmlRewriter::new(
            lol_html::Settings {
                element_content_handlers: element_handlers,
                document_content_handlers: document_handlers,
                ..Default::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        let written = rewriter.write(html.as_bytes()).and_then(|_| rewriter.end());
        if let Err(e) = written {
            tracing::warn!(error = %e, "sanitizer rewrite failed, keeping document unchanged");
            return Ok(html.to_string());
        }

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

impl Sanitizer for StructuralSanitizer {
    fn prepare(&self, doc: &mut Document, extra_rules: &[String]) -> Result<()> {
        let before = doc.as_string();
        let cleaned = self.sanitize_markup(&before, doc.url(), extra_rules)?;

        tracing::debug!(before = before.len(), after = cleaned.len(), rules = extra_rules.len(), "sanitized document");

        doc.rebuild(&cleaned)
    }
}

fn is_unlikely(el: &lol_html::html_content::Element<'_, '_>, keep_positive: bool) -> bool {
    let matches = |value: &str| UNLIKELY.is_match(value) && (!keep_positive || !MAYBE_CANDIDATE.is_match(value));

    if el.get_attribute("id").is_some_and(|id| matches(&id)) {
        return true;
    }

    el.get_attribute("class")
        .is_some_and(|class| class.split_whitespace().any(matches))
}
