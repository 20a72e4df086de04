//! Target resolution and binary retrieval of remote resources.
//!
//! A target is either a URL with a fetchable scheme or a literal markup
//! string. Only URL targets touch the network; the response body is kept
//! as raw bytes so that charset resolution happens exactly once, in
//! [`crate::charset`].

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use serde::Serialize;
use url::Url;

use crate::charset::ContentTypeInfo;
use crate::{ReadError, Result};

/// Schemes that are treated as remote resources.
pub const FETCHABLE_SCHEMES: &[&str] = &["http", "https", "unix", "ftp", "sftp"];

/// Maximum allowed body size (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Extra request headers, sent after the defaults.
    pub headers: BTreeMap<String, String>,
    /// Proxy URL applied to every request.
    pub proxy: Option<String>,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Continue with the body of non-2xx responses instead of failing.
    pub accept_error_status: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Legible/0.1)".to_string(),
            headers: BTreeMap::new(),
            proxy: None,
            max_redirects: 10,
            accept_error_status: false,
            max_body_size: MAX_CONTENT_LENGTH,
        }
    }
}

/// What a target string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A remote resource to retrieve.
    Remote(Url),
    /// The target string is the markup itself.
    Markup(String),
}

impl Target {
    /// Classifies a target string.
    ///
    /// Anything that is not an absolute URL with one of
    /// [`FETCHABLE_SCHEMES`] is literal markup.
    pub fn resolve(target: &str) -> Self {
        match Url::parse(target.trim()) {
            Ok(url) if FETCHABLE_SCHEMES.contains(&url.scheme()) => Target::Remote(url),
            _ => Target::Markup(target.to_string()),
        }
    }

    /// Whether this target needs transport I/O.
    pub fn is_remote(&self) -> bool {
        matches!(self, Target::Remote(_))
    }
}

/// Response details handed to the preprocessing hook and returned with the article.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    /// The URL that was requested.
    pub url: String,
    /// The URL after following redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Declared content type; the charset is replaced by the resolved one
    /// once the body has been decoded.
    pub content_type: ContentTypeInfo,
}

impl ResponseMeta {
    /// Raw `Content-Type` header value, if any.
    pub fn content_type_header(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// Raw bytes of a retrieved resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub meta: ResponseMeta,
    pub body: Vec<u8>,
}

/// Retrieves a remote resource in binary mode.
///
/// Redirects are followed up to the configured limit and the final URL is
/// recorded. Non-2xx responses fail with [`ReadError::Status`] unless
/// `accept_error_status` is set.
pub async fn fetch_resource(url: &Url, config: &FetchConfig) -> Result<FetchedResource> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ReadError::UnsupportedScheme { url: url.to_string(), scheme: url.scheme().to_string() });
    }

    let client = build_client(url, config)?;

    let mut request = client
        .get(url.clone())
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9");
    for (name, value) in &config.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    tracing::debug!(%url, "fetching resource");

    let response = request.send().await.map_err(|e| transport_error(url, config, e))?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();

    if !response.status().is_success() && !config.accept_error_status {
        return Err(ReadError::Status { url: url.to_string(), status });
    }

    if let Some(len) = response.content_length()
        && len as usize > config.max_body_size
    {
        return Err(ReadError::BodyTooLarge { url: url.to_string(), limit: config.max_body_size });
    }

    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_lowercase(), v.to_string())))
        .collect();

    let body = response.bytes().await.map_err(|e| transport_error(url, config, e))?;
    if body.len() > config.max_body_size {
        return Err(ReadError::BodyTooLarge { url: url.to_string(), limit: config.max_body_size });
    }

    tracing::debug!(%final_url, status, bytes = body.len(), "fetched resource");

    let content_type = ContentTypeInfo::parse(headers.get("content-type").map(String::as_str));
    let meta = ResponseMeta { url: url.to_string(), final_url, status, headers, content_type };

    Ok(FetchedResource { meta, body: body.to_vec() })
}

fn build_client(url: &Url, config: &FetchConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .user_agent(config.user_agent.as_str())
        .redirect(Policy::limited(config.max_redirects));

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|source| ReadError::Fetch { url: url.to_string(), source })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|source| ReadError::Fetch { url: url.to_string(), source })
}

fn transport_error(url: &Url, config: &FetchConfig, source: reqwest::Error) -> ReadError {
    if source.is_timeout() {
        ReadError::Timeout { seconds: config.timeout }
    } else {
        ReadError::Fetch { url: url.to_string(), source }
    }
}
