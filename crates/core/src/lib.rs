//! Fetch, decode and extract readable articles.
//!
//! A read resolves its target (a URL or literal markup), retrieves and
//! decodes remote bytes once, applies an optional preprocessing hook,
//! parses the document and prepares an [`Article`] whose artifacts
//! (`content`, `title`, `text_body`) are computed lazily and cached.
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> legible_core::Result<()> {
//! let mut article = legible_core::read(
//!     "<html><head><title>Field Notes From The Coast | Blog</title></head>\
//!      <body><article><p>Tide pools, gulls, and fog.</p></article></body></html>",
//! )
//! .await?;
//!
//! assert_eq!(article.title()?, "Field Notes From The Coast");
//! assert_eq!(article.text_body()?, "Tide pools, gulls, and fog.");
//! article.close();
//! # Ok(())
//! # }
//! ```

pub mod article;
pub mod cache;
pub mod charset;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod hook;
pub mod metadata;
pub mod parse;
pub mod reader;
pub mod sanitize;
pub mod scoring;
pub mod title;

pub use article::{Article, ArticleSnapshot, Components};
pub use cache::{ArtifactCache, ArtifactKey, CacheState};
pub use charset::{ContentTypeInfo, NormalizedText, convert_to_utf8, normalize};
pub use error::{ReadError, Result};
pub use extract::{Candidate, ContentScorer, HeuristicScorer, ScorerConfig};
pub use fetch::{FetchConfig, FetchedResource, ResponseMeta, Target, fetch_resource};
pub use hook::PreprocessHook;
pub use metadata::{Metadata, MetadataSummarizer, Summarizer};
pub use parse::{Document, Element, Fragment};
pub use reader::{ReadConfig, ReadConfigBuilder, Reader, read, read_with_config};
pub use sanitize::{SanitizeConfig, Sanitizer, StructuralSanitizer};
pub use tokio_util::sync::CancellationToken;
