//! The extraction orchestrator.
//!
//! An [`Article`] owns the parsed [`Document`] and computes four derived
//! artifacts on demand: `content`, `title`, `text_body` and the body
//! snapshot taken right after sanitization. Each artifact is computed at
//! most once and cached; `html` and `document` always reflect the live tree.
//!
//! Computing `content` may replace the live body: when the primary scorer
//! pass finds no text, the body is restored from the snapshot and the scorer
//! runs once more in relaxed mode. Read `html()` or `document()` before
//! `content()` if you need the tree as sanitized.
//!
//! After [`Article::close`] every query fails with [`ReadError::Released`].
//!
//! # Example
//!
//! ```rust
//! use legible_core::{Article, Components, Document};
//!
//! let markup = "<html><head><title>A Long Enough Title | Site</title></head><body><article><p>Hello, reader.</p></article></body></html>";
//! let doc = Document::parse(markup, None).unwrap();
//! let mut article = Article::prepare(doc, None, &Components::default(), &[], tracing::Span::none()).unwrap();
//!
//! assert_eq!(article.title().unwrap(), "A Long Enough Title");
//! assert_eq!(article.text_body().unwrap(), "Hello, reader.");
//! article.close();
//! assert!(article.content().is_err());
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::Span;
use url::Url;

use crate::cache::{ArtifactCache, ArtifactKey, CacheState};
use crate::extract::{Candidate, ContentScorer, HeuristicScorer};
use crate::fetch::ResponseMeta;
use crate::metadata::{Metadata, MetadataSummarizer, Summarizer};
use crate::parse::{Document, Fragment};
use crate::sanitize::{Sanitizer, StructuralSanitizer};
use crate::title::best_title;
use crate::{ReadError, Result};

/// The pluggable collaborators an article is prepared with.
#[derive(Clone)]
pub struct Components {
    pub sanitizer: Arc<dyn Sanitizer>,
    pub scorer: Arc<dyn ContentScorer>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl Default for Components {
    fn default() -> Self {
        Self {
            sanitizer: Arc::new(StructuralSanitizer::default()),
            scorer: Arc::new(HeuristicScorer::default()),
            summarizer: Arc::new(MetadataSummarizer),
        }
    }
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Components").finish_non_exhaustive()
    }
}

/// A readable article extracted from one document.
pub struct Article {
    doc: Option<Document>,
    cache: ArtifactCache,
    metadata: Metadata,
    response: Option<ResponseMeta>,
    url: Option<Url>,
    scorer: Arc<dyn ContentScorer>,
    span: Span,
}

/// Serializable view of an article's artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSnapshot {
    pub title: String,
    /// `None` when no content could be extracted.
    pub content: Option<String>,
    pub text_body: String,
    pub metadata: Metadata,
    pub url: Option<String>,
}

impl Article {
    /// Brings a freshly parsed document to the ready state.
    ///
    /// Reads the summarizer's structured data from the untouched document,
    /// runs the sanitizer with `extra_rules`, records the body snapshot and
    /// summarizes the sanitized markup. Structured data is merged over the
    /// summary.
    ///
    /// # Errors
    ///
    /// Propagates sanitizer failures, such as an invalid extra rule.
    pub fn prepare(
        mut doc: Document,
        response: Option<ResponseMeta>,
        components: &Components,
        extra_rules: &[String],
        span: Span,
    ) -> Result<Self> {
        let entered = span.enter();

        let structured = components.summarizer.structured_data(&doc);
        components.sanitizer.prepare(&mut doc, extra_rules)?;

        let mut cache = ArtifactCache::new();
        cache.store(ArtifactKey::BodySnapshot, doc.body_inner_html());

        let mut metadata = Metadata::default();
        metadata.merge(components.summarizer.summarize(&doc.inner_html()));
        metadata.merge(structured);

        tracing::debug!(title = ?metadata.title, rules = extra_rules.len(), "article ready");

        let url = doc.url().cloned();
        drop(entered);

        Ok(Self { doc: Some(doc), cache, metadata, response, url, scorer: Arc::clone(&components.scorer), span })
    }

    /// The extracted article body as markup.
    ///
    /// Returns `Ok(None)` when neither the primary nor the relaxed pass found
    /// any text. The result is cached, so the scorer runs at most twice per
    /// article.
    pub fn content(&mut self) -> Result<Option<&str>> {
        self.ensure_open()?;

        if !self.cache.is_computed(ArtifactKey::Content) {
            let span = self.span.clone();
            let _entered = span.enter();

            match self.extract_content()? {
                Some(candidate) => {
                    tracing::debug!(score = candidate.score, len = candidate.html.len(), "content extracted");
                    self.cache.store(ArtifactKey::Content, candidate.html);
                }
                None => {
                    tracing::warn!("no readable content found");
                    self.cache.store_empty(ArtifactKey::Content);
                }
            }
        } else {
            tracing::debug!(parent: &self.span, artifact = %ArtifactKey::Content, "cache hit");
        }

        Ok(match self.cache.get(ArtifactKey::Content) {
            CacheState::Computed(content) => Some(content),
            CacheState::NotComputed | CacheState::ComputedEmpty => None,
        })
    }

    fn extract_content(&mut self) -> Result<Option<Candidate>> {
        let doc = self.doc.as_mut().ok_or(ReadError::Released)?;

        if let Some(candidate) = self.scorer.extract(doc, false).filter(has_text) {
            return Ok(Some(candidate));
        }

        tracing::warn!("primary extraction found no text, retrying relaxed on the body snapshot");

        if let CacheState::Computed(snapshot) = self.cache.get(ArtifactKey::BodySnapshot)
            && let Err(e) = doc.replace_body(snapshot)
        {
            tracing::warn!(error = %e, "could not restore body snapshot");
        }

        Ok(self.scorer.extract(doc, true).filter(has_text))
    }

    /// Best-guess title of the article.
    pub fn title(&mut self) -> Result<&str> {
        let doc = self.doc.as_ref().ok_or(ReadError::Released)?;

        if !self.cache.is_computed(ArtifactKey::Title) {
            let title = best_title(doc);
            tracing::debug!(parent: &self.span, %title, "title computed");
            self.cache.store(ArtifactKey::Title, title);
        }

        Ok(match self.cache.get(ArtifactKey::Title) {
            CacheState::Computed(title) => title,
            CacheState::NotComputed | CacheState::ComputedEmpty => "",
        })
    }

    /// Plain text of the content, one line per non-empty child of its root.
    pub fn text_body(&mut self) -> Result<&str> {
        self.ensure_open()?;

        if !self.cache.is_computed(ArtifactKey::TextBody) {
            let text = self.content()?.map(text_lines).unwrap_or_default();
            self.cache.store(ArtifactKey::TextBody, text);
        }

        Ok(match self.cache.get(ArtifactKey::TextBody) {
            CacheState::Computed(text) => text,
            CacheState::NotComputed | CacheState::ComputedEmpty => "",
        })
    }

    /// Serialization of the live `<html>` element's children. Never cached.
    pub fn html(&self) -> Result<String> {
        Ok(self.document()?.inner_html())
    }

    /// The live document.
    pub fn document(&self) -> Result<&Document> {
        self.doc.as_ref().ok_or(ReadError::Released)
    }

    pub fn metadata(&self) -> Result<&Metadata> {
        self.ensure_open()?;
        Ok(&self.metadata)
    }

    /// Response details for fetched targets, `None` for literal markup.
    pub fn response(&self) -> Result<Option<&ResponseMeta>> {
        self.ensure_open()?;
        Ok(self.response.as_ref())
    }

    /// The URL the document was retrieved from.
    pub fn url(&self) -> Result<Option<&Url>> {
        self.ensure_open()?;
        Ok(self.url.as_ref())
    }

    /// Collects every artifact into a serializable value.
    pub fn snapshot(&mut self) -> Result<ArticleSnapshot> {
        let content = self.content()?.map(str::to_string);
        let title = self.title()?.to_string();
        let text_body = self.text_body()?.to_string();

        Ok(ArticleSnapshot {
            title,
            content,
            text_body,
            metadata: self.metadata.clone(),
            url: self.url.as_ref().map(Url::to_string),
        })
    }

    /// The content artifact rendered as Markdown.
    #[cfg(feature = "markdown")]
    pub fn to_markdown(&mut self) -> Result<Option<String>> {
        Ok(self.content()?.map(|html| htmd::convert(html).unwrap_or_default()))
    }

    /// Releases the document. Calling it again has no effect.
    pub fn close(&mut self) {
        if self.doc.take().is_some() {
            self.cache = ArtifactCache::new();
            tracing::debug!(parent: &self.span, "article released");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.doc.is_none()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() { Err(ReadError::Released) } else { Ok(()) }
    }
}

impl std::fmt::Debug for Article {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Article")
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

fn has_text(candidate: &Candidate) -> bool {
    !candidate.visible_text().is_empty()
}

/// Visible text of each child of the fragment's first element, joined by
/// newlines with empty texts skipped.
fn text_lines(content: &str) -> String {
    let fragment = Fragment::parse(content);
    let Some(root) = fragment.root() else {
        return String::new();
    };

    root.child_texts()
        .into_iter()
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
