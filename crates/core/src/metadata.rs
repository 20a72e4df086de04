//! Document metadata summarization.
//!
//! A [`Summarizer`] turns the sanitized document markup into a flat map of
//! fields; the article merges that map into [`Metadata`]. Field names the
//! struct knows land in typed slots, anything else is kept in
//! [`Metadata::extra`].
//!
//! Embedded JSON-LD lives in `<script>` blocks the sanitizer strips, so it is
//! read from the unsanitized document through
//! [`Summarizer::structured_data`] and merged last.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::parse::Document;
use crate::title::meta_content;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[\w'-]+\b").unwrap());

/// Produces metadata fields from a document's markup.
pub trait Summarizer: Send + Sync {
    /// Summarizes `markup` into named fields. Missing fields are omitted.
    fn summarize(&self, markup: &str) -> BTreeMap<String, Value>;

    /// Fields read from the document before sanitization. They override
    /// what [`Summarizer::summarize`] found.
    fn structured_data(&self, _doc: &Document) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }
}

/// Metadata merged from the summarizer output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    /// Fields without a dedicated slot.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Merges summarizer output into this metadata.
    ///
    /// Known fields overwrite their slot when the value has the right shape;
    /// a known field with the wrong shape, or an unknown field, goes to
    /// `extra`.
    pub fn merge(&mut self, fields: BTreeMap<String, Value>) {
        for (key, value) in fields {
            let slot = match key.as_str() {
                "title" => Some(&mut self.title),
                "soft_title" => Some(&mut self.soft_title),
                "author" => Some(&mut self.author),
                "date" => Some(&mut self.date),
                "description" => Some(&mut self.description),
                "publisher" => Some(&mut self.publisher),
                "language" => Some(&mut self.language),
                "canonical_link" => Some(&mut self.canonical_link),
                "image" => Some(&mut self.image),
                "favicon" => Some(&mut self.favicon),
                "keywords" => Some(&mut self.keywords),
                "copyright" => Some(&mut self.copyright),
                _ => None,
            };

            match (key.as_str(), slot, &value) {
                (_, Some(slot), Value::String(s)) => *slot = Some(s.clone()),
                ("word_count", None, Value::Number(n)) if n.as_u64().is_some() => {
                    self.word_count = n.as_u64().map(|n| n as usize);
                }
                ("tags", None, Value::Array(items)) if items.iter().all(Value::is_string) => {
                    self.tags = items.iter().filter_map(Value::as_str).map(str::to_string).collect();
                }
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }
}

/// Default [`Summarizer`]: Open Graph, Twitter and plain meta tags with
/// document fallbacks, plus JSON-LD as structured data.
#[derive(Debug, Clone, Default)]
pub struct MetadataSummarizer;

impl Summarizer for MetadataSummarizer {
    fn summarize(&self, markup: &str) -> BTreeMap<String, Value> {
        let Ok(doc) = Document::parse(markup, None) else {
            return BTreeMap::new();
        };
        let mut fields = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| put_string(&mut fields, key, value);

        put(
            "title",
            meta_content(&doc, "og:title")
                .or_else(|| meta_content(&doc, "twitter:title"))
                .or_else(|| doc.title()),
        );
        put("soft_title", doc.title());
        put(
            "author",
            meta_content(&doc, "author")
                .or_else(|| meta_content(&doc, "DC.creator"))
                .or_else(|| first_text(&doc, "[rel=\"author\"]"))
                .or_else(|| first_text(&doc, "[itemprop=\"author\"]")),
        );
        put(
            "date",
            meta_content(&doc, "article:published_time")
                .or_else(|| first_attr(&doc, "time[datetime]", "datetime"))
                .or_else(|| meta_content(&doc, "date"))
                .or_else(|| meta_content(&doc, "DC.date")),
        );
        put("description", meta_content(&doc, "og:description").or_else(|| meta_content(&doc, "description")));
        put("publisher", meta_content(&doc, "og:site_name"));
        put("language", first_attr(&doc, "html[lang]", "lang").or_else(|| meta_content(&doc, "og:locale")));
        put(
            "canonical_link",
            first_attr(&doc, "link[rel=\"canonical\"]", "href").or_else(|| meta_content(&doc, "og:url")),
        );
        put("image", meta_content(&doc, "og:image").or_else(|| meta_content(&doc, "twitter:image")));
        put(
            "favicon",
            first_attr(&doc, "link[rel=\"icon\"]", "href")
                .or_else(|| first_attr(&doc, "link[rel=\"shortcut icon\"]", "href")),
        );
        put("keywords", meta_content(&doc, "keywords"));
        put("copyright", meta_content(&doc, "copyright"));

        let tags: Vec<Value> = doc
            .select("meta[property=\"article:tag\"]")
            .unwrap_or_default()
            .iter()
            .filter_map(|el| el.attr("content"))
            .map(|tag| Value::String(tag.trim().to_string()))
            .collect();
        if !tags.is_empty() {
            fields.insert("tags".to_string(), Value::Array(tags));
        }

        let words = doc.body().map(|body| count_words(&body.text())).unwrap_or_default();
        fields.insert("word_count".to_string(), Value::from(words));

        fields
    }

    /// `headline`, `author`, `datePublished`, `description`, `publisher` and
    /// `image` from the first JSON-LD block that parses.
    fn structured_data(&self, doc: &Document) -> BTreeMap<String, Value> {
        let mut fields = BTreeMap::new();
        let Some(ld) = json_ld(doc) else {
            return fields;
        };
        let string = |key: &str| ld.get(key).and_then(Value::as_str).map(str::to_string);

        put_string(&mut fields, "title", string("headline"));
        put_string(&mut fields, "author", ld.get("author").and_then(author_name));
        put_string(&mut fields, "date", string("datePublished"));
        put_string(&mut fields, "description", string("description"));
        put_string(
            &mut fields,
            "publisher",
            ld.get("publisher").and_then(|p| p.get("name")).and_then(Value::as_str).map(str::to_string),
        );
        put_string(&mut fields, "image", ld.get("image").and_then(image_url));

        fields
    }
}

/// Inserts a trimmed, non-empty string field.
fn put_string(fields: &mut BTreeMap<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        fields.insert(key.to_string(), Value::String(value));
    }
}

/// First JSON-LD block that parses.
fn json_ld(doc: &Document) -> Option<Value> {
    doc.select("script[type=\"application/ld+json\"]")
        .unwrap_or_default()
        .iter()
        .find_map(|el| serde_json::from_str::<Value>(el.text().trim()).ok())
        .map(|value| match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        })
}

/// Author from a JSON-LD `author`, which may be a string, an object or a list.
fn author_name(author: &Value) -> Option<String> {
    match author {
        Value::String(name) => Some(name.clone()),
        Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items.first().and_then(author_name),
        _ => None,
    }
}

fn image_url(image: &Value) -> Option<String> {
    match image {
        Value::String(url) => Some(url.clone()),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items.first().and_then(image_url),
        _ => None,
    }
}

fn first_text(doc: &Document, selector: &str) -> Option<String> {
    doc.select(selector)
        .ok()?
        .first()
        .map(|el| el.visible_text())
        .filter(|text| !text.is_empty())
}

fn first_attr(doc: &Document, selector: &str, attr: &str) -> Option<String> {
    doc.select(selector).ok()?.first()?.attr(attr).map(str::to_string)
}

fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}
