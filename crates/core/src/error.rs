//! Error types for legible operations.
//!
//! Every stage of the read pipeline reports failures through [`ReadError`].
//! Errors are terminal for the invocation that raised them: a read either
//! yields a complete [`Article`](crate::Article) or one of these variants,
//! never both.
//!
//! # Example
//!
//! ```rust
//! use legible_core::{ReadError, Result};
//!
//! fn require_markup(text: &str) -> Result<&str> {
//!     if text.trim().is_empty() {
//!         return Err(ReadError::EmptyBody);
//!     }
//!     Ok(text)
//! }
//! ```

use thiserror::Error;

/// Main error type for fetching, decoding and extracting an article.
///
/// Variants fall into the classes checked by [`ReadError::is_fetch`] and
/// [`ReadError::is_empty_result`]; the rest are single-purpose.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Transport failure from reqwest (DNS, connection, TLS, body read).
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("Failed to fetch {url}: HTTP status {status}")]
    Status { url: String, status: u16 },

    /// The target names a fetchable scheme with no transport available.
    #[error("Failed to fetch {url}: unsupported transport scheme `{scheme}`")]
    UnsupportedScheme { url: String, scheme: String },

    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The response body exceeded the configured size limit.
    #[error("Failed to fetch {url}: body larger than {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    /// The resolved charset has no known converter to UTF-8.
    #[error("Cannot convert from charset `{charset}` to utf-8")]
    Conversion { charset: String },

    /// The markup could not be parsed into a document at all.
    #[error("Failed to parse markup: {0}")]
    Parse(String),

    /// The markup parsed but has no usable body.
    #[error("Document has no usable body: {0}")]
    Structural(String),

    /// The retrieved body was empty.
    #[error("Empty story body returned")]
    EmptyBody,

    /// The retrieved body is not a text document.
    #[error("Response is not a text document (content type `{mime_type}`)")]
    NotText { mime_type: String },

    /// The preprocessing hook rejected the document.
    #[error("Preprocess hook failed: {0}")]
    Preprocess(String),

    /// A sanitizer rule is not a valid CSS selector.
    #[error("Invalid sanitizer rule: {0}")]
    InvalidSelector(String),

    /// The read was cancelled through its cancellation token.
    #[error("Read was cancelled")]
    Cancelled,

    /// The article was queried after [`Article::close`](crate::Article::close).
    #[error("Article resources were already released")]
    Released,
}

impl ReadError {
    /// Returns true for transport-level failures.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            ReadError::Fetch { .. }
                | ReadError::Status { .. }
                | ReadError::UnsupportedScheme { .. }
                | ReadError::Timeout { .. }
                | ReadError::BodyTooLarge { .. }
        )
    }

    /// Returns true when the retrieved body was empty or not text.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, ReadError::EmptyBody | ReadError::NotText { .. })
    }
}

/// Result type alias for ReadError.
pub type Result<T> = std::result::Result<T, ReadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReadError::Conversion { charset: "x-klingon".to_string() };
        assert!(err.to_string().contains("x-klingon"));
    }

    #[test]
    fn test_status_error_is_fetch() {
        let err = ReadError::Status { url: "https://example.com".to_string(), status: 404 };
        assert!(err.is_fetch());
        assert!(err.to_string().contains("404"));
        assert!(!err.is_empty_result());
    }

    #[test]
    fn test_timeout_error() {
        let err = ReadError::Timeout { seconds: 30 };
        assert!(err.to_string().contains("30"));
        assert!(err.is_fetch());
    }

    #[test]
    fn test_empty_result_class() {
        assert!(ReadError::EmptyBody.is_empty_result());
        assert!(ReadError::NotText { mime_type: "image/png".to_string() }.is_empty_result());
        assert!(!ReadError::Released.is_empty_result());
    }
}
