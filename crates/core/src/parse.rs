//! Document construction and DOM access.
//!
//! This module provides the [`Document`] handle the read pipeline works on,
//! plus the [`Element`] and [`Fragment`] views used by the scorer and the
//! text-body artifact.
//!
//! A `scraper` tree is immutable once built, so in-place changes (stripping
//! nodes, restoring the body) are expressed as rebuilding the tree from new
//! markup. Holders of a `&mut Document` observe the change immediately.
//!
//! # Example
//!
//! ```rust
//! use legible_core::Document;
//!
//! let mut doc = Document::parse("<html><head><title>T</title></head><body><p>old</p></body></html>", None).unwrap();
//! doc.replace_body("<p>new</p>").unwrap();
//! assert_eq!(doc.body_inner_html(), "<p>new</p>");
//! assert_eq!(doc.title(), Some("T".to_string()));
//! ```

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{ReadError, Result};

/// A parsed HTML document and the URL it was retrieved from.
pub struct Document {
    html: Html,
    url: Option<Url>,
}

impl Document {
    /// Parses markup into a document.
    ///
    /// # Errors
    ///
    /// - [`ReadError::Parse`] when the input is binary rather than markup.
    /// - [`ReadError::Structural`] when the parsed tree has no `<body>`
    ///   (for example a frameset page).
    pub fn parse(markup: &str, url: Option<Url>) -> Result<Self> {
        if markup.contains('\0') {
            return Err(ReadError::Parse("input contains NUL bytes and is not markup".to_string()));
        }

        let doc = Self { html: Html::parse_document(markup), url };
        if doc.body().is_none() {
            return Err(ReadError::Structural("no body tag was found".to_string()));
        }

        Ok(doc)
    }

    /// Gets the URL the document was retrieved from, `None` for literal markup.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Gets the underlying `scraper::Html` tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the entire document.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Serializes the children of the `<html>` element.
    pub fn inner_html(&self) -> String {
        self.html.root_element().inner_html()
    }

    /// Gets the `<body>` element.
    pub fn body(&self) -> Option<Element<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next().map(|element| Element { element })
    }

    /// Serializes the children of `<body>`.
    pub fn body_inner_html(&self) -> String {
        self.body().map(|body| body.inner_html()).unwrap_or_default()
    }

    /// Gets the text of the `<title>` element, whitespace collapsed.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidSelector`] if the selector does not parse.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|element| Element { element }).collect())
    }

    /// Replaces the whole tree with freshly parsed markup, keeping the URL.
    ///
    /// # Errors
    ///
    /// Fails like [`Document::parse`]; the current tree is kept on error.
    pub fn rebuild(&mut self, markup: &str) -> Result<()> {
        let rebuilt = Self::parse(markup, None)?;
        self.html = rebuilt.html;
        Ok(())
    }

    /// Replaces the children of `<body>` with the given markup.
    ///
    /// The `<head>` and the attributes of `<html>` and `<body>` are kept.
    pub fn replace_body(&mut self, body_inner: &str) -> Result<()> {
        let root = self.html.root_element();
        let head = root
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "head")
            .map(|el| el.inner_html())
            .unwrap_or_default();
        let body_attrs = self.body().map(|body| attributes(&body.element)).unwrap_or_default();

        let markup = format!(
            "<!DOCTYPE html><html{}><head>{}</head><body{}>{}</body></html>",
            attributes(&root),
            head,
            body_attrs,
            body_inner
        );

        self.rebuild(&markup)
    }
}

/// A parsed markup fragment, such as an extracted article body.
pub struct Fragment {
    html: Html,
}

impl Fragment {
    /// Parses a markup fragment.
    pub fn parse(markup: &str) -> Self {
        Self { html: Html::parse_fragment(markup) }
    }

    /// Gets the first top-level element of the fragment.
    pub fn root(&self) -> Option<Element<'_>> {
        self.html
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// Whitespace-normalized text of the whole fragment.
    pub fn visible_text(&self) -> String {
        normalize_whitespace(&self.html.root_element().text().collect::<String>())
    }
}

/// A wrapper around scraper's ElementRef.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the raw concatenated text of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the trimmed text with runs of whitespace collapsed to one space.
    pub fn visible_text(&self) -> String {
        normalize_whitespace(&self.text())
    }

    /// Gets the visible text of each immediate child node.
    ///
    /// Text nodes and elements contribute their text; comments and other
    /// nodes contribute an empty string.
    pub fn child_texts(&self) -> Vec<String> {
        self.element
            .children()
            .map(|child| {
                if let Some(el) = ElementRef::wrap(child) {
                    normalize_whitespace(&el.text().collect::<String>())
                } else if let Some(text) = child.value().as_text() {
                    normalize_whitespace(text)
                } else {
                    String::new()
                }
            })
            .collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Identity of this element within its tree.
    pub fn node_id(&self) -> NodeId {
        self.element.id()
    }

    /// Gets the parent element, if the parent is an element.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(|element| Element { element })
    }

    /// Gets the immediate child elements in document order.
    pub fn child_elements(&self) -> Vec<Element<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(|element| Element { element }).collect()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidSelector`] if the selector does not parse.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|element| Element { element }).collect())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ReadError::InvalidSelector(format!("{selector}: {e}")))
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn attributes(element: &ElementRef<'_>) -> String {
    element
        .value()
        .attrs()
        .map(|(name, value)| format!(" {}=\"{}\"", name, value.replace('&', "&amp;").replace('"', "&quot;")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body class="post">
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML, None).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert!(doc.url().is_none());
    }

    #[test]
    fn test_title_collapses_whitespace() {
        let doc = Document::parse(
            "<html><head><title>\n    Field Notes\n    From The  Coast\n  </title></head><body></body></html>",
            None,
        )
        .unwrap();
        assert_eq!(doc.title(), Some("Field Notes From The Coast".to_string()));
    }

    #[test]
    fn test_parse_keeps_url() {
        let url = Url::parse("https://example.com/post").unwrap();
        let doc = Document::parse(SAMPLE_HTML, Some(url.clone())).unwrap();
        assert_eq!(doc.url(), Some(&url));
    }

    #[test]
    fn test_parse_rejects_binary() {
        let result = Document::parse("\u{0}\u{1}PNG", None);
        assert!(matches!(result, Err(ReadError::Parse(_))));
    }

    #[test]
    fn test_frameset_has_no_body() {
        let html = r#"<html><head><title>Frames</title></head><frameset cols="50%,50%"><frame src="a.html"></frameset></html>"#;
        let result = Document::parse(html, None);
        assert!(matches!(result, Err(ReadError::Structural(_))));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML, None).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML, None).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(ReadError::InvalidSelector(_))));
    }

    #[test]
    fn test_inner_html_excludes_html_tag() {
        let doc = Document::parse(SAMPLE_HTML, None).unwrap();
        let inner = doc.inner_html();
        assert!(inner.starts_with("<head>"));
        assert!(!inner.contains("<html"));
    }

    #[test]
    fn test_replace_body_keeps_head_and_attributes() {
        let mut doc = Document::parse(SAMPLE_HTML, None).unwrap();
        doc.replace_body("<article><p>Restored</p></article>").unwrap();

        assert_eq!(doc.body_inner_html(), "<article><p>Restored</p></article>");
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert_eq!(doc.body().unwrap().attr("class"), Some("post"));
        assert!(doc.as_string().contains(r#"lang="en""#));
    }

    #[test]
    fn test_child_texts() {
        let fragment = Fragment::parse("<div><p>A</p><p>  </p><!-- note --><p>B\n  two</p></div>");
        let root = fragment.root().unwrap();
        assert_eq!(root.child_texts(), vec!["A", "", "", "B two"]);
    }

    #[test]
    fn test_fragment_visible_text() {
        let fragment = Fragment::parse("<div>\n  <p>Hello   world</p>\n</div>");
        assert_eq!(fragment.visible_text(), "Hello world");
        assert!(Fragment::parse("<div> <span></span> </div>").visible_text().is_empty());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
        assert_eq!(normalize_whitespace(""), "");
    }
}
