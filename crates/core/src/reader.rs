//! The read pipeline: resolve, fetch, normalize, preprocess, parse, prepare.
//!
//! [`Reader`] is the main entry point. It classifies the target, retrieves
//! and decodes remote resources exactly once, runs the preprocessing hook,
//! builds the [`Document`] and hands it to an [`Article`].
//!
//! # Example
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> legible_core::Result<()> {
//! use legible_core::{ReadConfig, Reader};
//!
//! let config = ReadConfig::builder().sanitize_rule("aside.promo").build();
//! let reader = Reader::with_config(config);
//!
//! let mut article = reader
//!     .read("<html><body><aside class=\"promo\">Buy</aside><article><p>Story, told.</p></article></body></html>")
//!     .await?;
//! assert!(!article.html()?.contains("Buy"));
//! assert_eq!(article.text_body()?, "Story, told.");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

use crate::article::{Article, Components};
use crate::charset;
use crate::extract::ContentScorer;
use crate::fetch::{FetchConfig, ResponseMeta, Target, fetch_resource};
use crate::hook::PreprocessHook;
use crate::metadata::Summarizer;
use crate::parse::Document;
use crate::sanitize::Sanitizer;
use crate::{ReadError, Result};

/// Options for one read.
///
/// # Example
///
/// ```rust
/// use legible_core::{FetchConfig, ReadConfig};
///
/// let config = ReadConfig::builder()
///     .encoding("windows-1252")
///     .fetch(FetchConfig { timeout: 10, ..Default::default() })
///     .sanitize_rules(["div.share", "figure.ad"])
///     .build();
/// assert_eq!(config.sanitize_rules.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReadConfig {
    /// Charset that overrides every declaration in the response.
    pub encoding: Option<String>,
    /// Transform applied to decoded text of fetched resources.
    pub preprocess: Option<PreprocessHook>,
    /// Transport options.
    pub fetch: FetchConfig,
    /// CSS selectors whose matches are stripped during sanitization.
    pub sanitize_rules: Vec<String>,
    /// Aborts the read with [`ReadError::Cancelled`] when fired.
    pub cancel: Option<CancellationToken>,
}

impl ReadConfig {
    pub fn builder() -> ReadConfigBuilder {
        ReadConfigBuilder::new()
    }
}

/// Builder for [`ReadConfig`].
#[derive(Debug, Default)]
pub struct ReadConfigBuilder {
    config: ReadConfig,
}

impl ReadConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the charset used to decode fetched bodies.
    pub fn encoding(mut self, charset: impl Into<String>) -> Self {
        self.config.encoding = Some(charset.into());
        self
    }

    pub fn preprocess(mut self, hook: PreprocessHook) -> Self {
        self.config.preprocess = Some(hook);
        self
    }

    pub fn fetch(mut self, fetch: FetchConfig) -> Self {
        self.config.fetch = fetch;
        self
    }

    /// Adds one sanitizer rule.
    pub fn sanitize_rule(mut self, rule: impl Into<String>) -> Self {
        self.config.sanitize_rules.push(rule.into());
        self
    }

    /// Adds several sanitizer rules.
    pub fn sanitize_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sanitize_rules.extend(rules.into_iter().map(Into::into));
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    pub fn build(self) -> ReadConfig {
        self.config
    }
}

/// Reads targets into [`Article`]s.
///
/// Work is recorded under the reader's span (`legible` at info level by
/// default); each article gets a child span for its artifact computations.
#[derive(Debug, Clone)]
pub struct Reader {
    config: ReadConfig,
    components: Components,
    span: Span,
}

impl Reader {
    pub fn new() -> Self {
        Self::with_config(ReadConfig::default())
    }

    pub fn with_config(config: ReadConfig) -> Self {
        Self { config, components: Components::default(), span: tracing::info_span!("legible") }
    }

    /// Replaces the sanitizer used to prepare documents.
    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.components.sanitizer = Arc::new(sanitizer);
        self
    }

    /// Replaces the scorer used for the content artifact.
    pub fn with_scorer(mut self, scorer: impl ContentScorer + 'static) -> Self {
        self.components.scorer = Arc::new(scorer);
        self
    }

    /// Replaces the metadata summarizer.
    pub fn with_summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
        self.components.summarizer = Arc::new(summarizer);
        self
    }

    /// Records work under `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Reads a URL or a literal markup string.
    ///
    /// # Errors
    ///
    /// - transport failures ([`ReadError::is_fetch`]);
    /// - [`ReadError::Conversion`] for an unknown charset;
    /// - [`ReadError::NotText`] and [`ReadError::EmptyBody`];
    /// - [`ReadError::Preprocess`] from the hook;
    /// - [`ReadError::Parse`] and [`ReadError::Structural`] from the parser;
    /// - [`ReadError::Cancelled`] when the cancel token fires first.
    pub async fn read(&self, target: &str) -> Result<Article> {
        let work = self.run(target).instrument(self.span.clone());

        match &self.config.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!(parent: &self.span, "read cancelled");
                        Err(ReadError::Cancelled)
                    }
                    result = work => result,
                }
            }
            None => work.await,
        }
    }

    async fn run(&self, target: &str) -> Result<Article> {
        let (markup, url, response) = match Target::resolve(target) {
            Target::Markup(markup) => {
                tracing::debug!(len = markup.len(), "reading literal markup");
                (markup, None, None)
            }
            Target::Remote(url) => {
                let (text, response) = self.retrieve(&url).await?;
                let final_url = Url::parse(&response.final_url).unwrap_or(url);
                (text, Some(final_url), Some(response))
            }
        };

        self.build(&markup, url, response)
    }

    /// Reads `markup` as a literal document, never as a URL.
    ///
    /// Use this for text already in hand, such as a decoded file, whose
    /// content could otherwise be mistaken for a URL target.
    ///
    /// # Errors
    ///
    /// [`ReadError::EmptyBody`], [`ReadError::Parse`],
    /// [`ReadError::Structural`] and sanitizer failures.
    pub fn read_markup(&self, markup: &str) -> Result<Article> {
        self.span.in_scope(|| {
            tracing::debug!(len = markup.len(), "reading markup directly");
            self.build(markup, None, None)
        })
    }

    fn build(&self, markup: &str, url: Option<Url>, response: Option<ResponseMeta>) -> Result<Article> {
        if markup.trim().is_empty() {
            return Err(ReadError::EmptyBody);
        }

        let span = tracing::debug_span!(parent: &self.span, "article", url = ?url.as_ref().map(Url::as_str));
        let doc = Document::parse(markup, url)?;

        Article::prepare(doc, response, &self.components, &self.config.sanitize_rules, span)
    }

    /// Fetches, decodes and preprocesses a remote resource.
    async fn retrieve(&self, url: &Url) -> Result<(String, ResponseMeta)> {
        let fetched = fetch_resource(url, &self.config.fetch).await?;
        let mut response = fetched.meta;

        if !response.content_type.is_text() {
            return Err(ReadError::NotText { mime_type: response.content_type.mime_type });
        }

        let normalized =
            charset::normalize(&fetched.body, response.content_type_header(), self.config.encoding.as_deref())?;
        response.content_type = normalized.content_type;

        let text = match &self.config.preprocess {
            Some(hook) => hook.apply(normalized.text, &response).await?,
            None => normalized.text,
        };

        Ok((text, response))
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a target with default settings.
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() -> legible_core::Result<()> {
/// let mut article = legible_core::read("<html><head><title>Hi</title></head><body><p>Hello</p></body></html>").await?;
/// assert_eq!(article.title()?, "Hi");
/// # Ok(())
/// # }
/// ```
pub async fn read(target: &str) -> Result<Article> {
    Reader::new().read(target).await
}

/// Reads a target with the given configuration.
pub async fn read_with_config(target: &str, config: ReadConfig) -> Result<Article> {
    Reader::with_config(config).read(target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Candidate;
    use std::collections::BTreeMap;

    struct BodyScorer;

    impl ContentScorer for BodyScorer {
        fn extract(&self, doc: &mut Document, _relaxed: bool) -> Option<Candidate> {
            Some(Candidate { html: format!("<div>{}</div>", doc.body_inner_html()), score: 1.0 })
        }
    }

    struct FixedSummarizer;

    impl Summarizer for FixedSummarizer {
        fn summarize(&self, _markup: &str) -> BTreeMap<String, serde_json::Value> {
            BTreeMap::from([("publisher".to_string(), serde_json::Value::from("Fixed"))])
        }
    }

    #[test]
    fn test_read_config_builder() {
        let token = CancellationToken::new();
        let config = ReadConfig::builder()
            .encoding("latin1")
            .sanitize_rule("nav")
            .sanitize_rules(vec!["aside".to_string()])
            .cancel_token(token)
            .build();

        assert_eq!(config.encoding.as_deref(), Some("latin1"));
        assert_eq!(config.sanitize_rules, vec!["nav", "aside"]);
        assert!(config.cancel.is_some());
        assert!(config.preprocess.is_none());
        assert_eq!(config.fetch.timeout, 30);
    }

    #[tokio::test]
    async fn test_literal_markup_uses_custom_components() {
        let reader = Reader::new().with_scorer(BodyScorer).with_summarizer(FixedSummarizer);
        let mut article = reader.read("<p>One</p><p>Two</p>").await.unwrap();

        assert_eq!(article.text_body().unwrap(), "One\nTwo");
        assert_eq!(article.metadata().unwrap().publisher.as_deref(), Some("Fixed"));
        assert!(article.response().unwrap().is_none());
        assert!(article.url().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hook_is_not_applied_to_literal_markup() {
        let hook = PreprocessHook::from_fn(|_text, _meta| Err::<String, _>("should not run"));
        let reader = Reader::with_config(ReadConfig::builder().preprocess(hook).build());
        assert!(reader.read("<p>fine</p>").await.is_ok());
    }

    #[test]
    fn test_read_markup_never_fetches() {
        let reader = Reader::new().with_scorer(BodyScorer);
        let mut article = reader.read_markup("http://127.0.0.1:9/unreachable").unwrap();

        assert!(article.response().unwrap().is_none());
        assert!(article.url().unwrap().is_none());
        assert_eq!(article.text_body().unwrap(), "http://127.0.0.1:9/unreachable");
        assert!(matches!(reader.read_markup(" \n"), Err(ReadError::EmptyBody)));
    }

    #[tokio::test]
    async fn test_blank_markup_is_empty_body() {
        let err = read("   \n\t").await.unwrap_err();
        assert!(matches!(err, ReadError::EmptyBody));
        assert!(err.is_empty_result());
    }

    #[tokio::test]
    async fn test_binary_markup_is_parse_error() {
        let err = read("GIF89a\u{0}\u{0}").await.unwrap_err();
        assert!(matches!(err, ReadError::Parse(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();

        let config = ReadConfig::builder().cancel_token(token).build();
        let err = read_with_config("<p>never read</p>", config).await.unwrap_err();
        assert!(matches!(err, ReadError::Cancelled));
    }
}
