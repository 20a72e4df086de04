//! Charset resolution and conversion of raw response bytes to UTF-8.
//!
//! The source charset is resolved with this precedence:
//!
//! 1. an explicit override from the caller,
//! 2. an HTML meta declaration, when the response is `text/html`,
//! 3. the `charset` parameter of the `Content-Type` header,
//! 4. `utf-8`.
//!
//! # Example
//!
//! ```rust
//! use legible_core::charset::{ContentTypeInfo, resolve_charset};
//!
//! let header = ContentTypeInfo::parse(Some("text/html; charset=ISO-8859-1"));
//! let body = br#"<html><head><meta charset="utf-8"></head></html>"#;
//! assert_eq!(resolve_charset(body, &header, None), "utf-8");
//! ```

use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::Regex;
use serde::Serialize;

use crate::{ReadError, Result};

/// Charset assumed when nothing else declares one.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// How many leading bytes are scanned for a meta charset declaration.
const META_SCAN_LIMIT: usize = 64 * 1024;

static HTTP_EQUIV_META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+http-equiv=["']content-type["'][^>]*?>"#).unwrap());

static HTTP_EQUIV_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)charset\s?=\s?([a-zA-Z\-0-9]*);?").unwrap());

static META_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+charset=["'](.*?)["']"#).unwrap());

static UTF8_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^utf-?8$").unwrap());

/// Mime type and charset parsed from a `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentTypeInfo {
    /// Lowercased mime type, empty when no header was present.
    pub mime_type: String,
    /// Lowercased charset label.
    pub charset: String,
}

impl Default for ContentTypeInfo {
    fn default() -> Self {
        Self { mime_type: String::new(), charset: DEFAULT_CHARSET.to_string() }
    }
}

impl ContentTypeInfo {
    /// Parses a `Content-Type` header value.
    ///
    /// The charset defaults to `utf-8` when the header has no `charset`
    /// parameter or is missing altogether.
    pub fn parse(header: Option<&str>) -> Self {
        let Some(header) = header else {
            return Self::default();
        };

        let mut parts = header.split(';');
        let mime_type = parts.next().unwrap_or_default().trim().to_lowercase();
        let mut charset = None;

        for part in parts {
            if let Some((name, value)) = part.split_once('=')
                && name.trim().eq_ignore_ascii_case("charset")
            {
                charset = Some(clean_label(value));
            }
        }

        Self {
            mime_type,
            charset: charset.filter(|c| !c.is_empty()).unwrap_or_else(|| DEFAULT_CHARSET.to_string()),
        }
    }

    /// Whether the mime type denotes an HTML document.
    pub fn is_html(&self) -> bool {
        self.mime_type == "text/html"
    }

    /// Whether the mime type can carry markup or text.
    ///
    /// An empty mime type (no header) is treated as text.
    pub fn is_text(&self) -> bool {
        self.mime_type.is_empty()
            || self.mime_type.starts_with("text/")
            || self.mime_type.ends_with("+xml")
            || self.mime_type.ends_with("/xml")
    }
}

/// Text decoded from a response, together with the charset it was decoded from.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub text: String,
    pub content_type: ContentTypeInfo,
}

/// Scans the ASCII-safe prefix of a buffer for an HTML charset declaration.
///
/// `<meta http-equiv="content-type" content="...; charset=X">` is tried
/// before `<meta charset="X">`.
pub fn find_html_charset(buffer: &[u8]) -> Option<String> {
    let prefix = &buffer[..buffer.len().min(META_SCAN_LIMIT)];
    let ascii: String = prefix.iter().map(|&b| if b.is_ascii() { b as char } else { '?' }).collect();

    let from_http_equiv = HTTP_EQUIV_META
        .find(&ascii)
        .and_then(|meta| HTTP_EQUIV_CHARSET.captures(meta.as_str()))
        .and_then(|caps| caps.get(1))
        .map(|m| clean_label(m.as_str()))
        .filter(|c| !c.is_empty());

    if from_http_equiv.is_some() {
        return from_http_equiv;
    }

    META_CHARSET
        .captures(&ascii)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_label(m.as_str()))
        .filter(|c| !c.is_empty())
}

/// Resolves the charset of a response body.
pub fn resolve_charset(buffer: &[u8], content_type: &ContentTypeInfo, override_charset: Option<&str>) -> String {
    if let Some(forced) = override_charset.map(clean_label).filter(|c| !c.is_empty()) {
        return forced;
    }

    if content_type.is_html()
        && let Some(declared) = find_html_charset(buffer)
    {
        return declared;
    }

    if content_type.charset.is_empty() { DEFAULT_CHARSET.to_string() } else { clean_label(&content_type.charset) }
}

/// Whether a charset label names UTF-8 (`utf-8` or `utf8`).
pub fn is_utf8(label: &str) -> bool {
    UTF8_LABEL.is_match(label.trim())
}

/// Converts bytes in the given charset to a UTF-8 string.
///
/// Malformed sequences are replaced with U+FFFD.
///
/// # Errors
///
/// Returns [`ReadError::Conversion`] when the label is not a known encoding.
pub fn convert_to_utf8(buffer: &[u8], charset: &str) -> Result<String> {
    if is_utf8(charset) {
        let (text, _) = encoding_rs::UTF_8.decode_with_bom_removal(buffer);
        return Ok(text.into_owned());
    }

    let encoding = Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| ReadError::Conversion { charset: charset.to_string() })?;

    let (text, _) = encoding.decode_without_bom_handling(buffer);
    Ok(text.into_owned())
}

/// Resolves the charset of a response and decodes it exactly once.
pub fn normalize(buffer: &[u8], header: Option<&str>, override_charset: Option<&str>) -> Result<NormalizedText> {
    let mut content_type = ContentTypeInfo::parse(header);
    content_type.charset = resolve_charset(buffer, &content_type, override_charset);

    tracing::debug!(mime_type = %content_type.mime_type, charset = %content_type.charset, "resolved charset");

    let text = convert_to_utf8(buffer, &content_type.charset)?;
    Ok(NormalizedText { text, content_type })
}

fn clean_label(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_lowercase()
}
