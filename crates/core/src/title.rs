//! Best-guess article title.
//!
//! The candidate comes from the social meta tags, falling back to
//! `<title>`. Site names glued on with a separator are dropped when exactly
//! one kind of separator appears and what is left is still a real title.
//!
//! ```rust
//! use legible_core::{Document, title::best_title};
//!
//! let doc = Document::parse("<html><head><title>Great Article | My Site</title></head><body></body></html>", None).unwrap();
//! assert_eq!(best_title(&doc), "Great Article");
//! ```

use crate::parse::Document;

/// Separators checked in order when refining a title.
pub const TITLE_SEPARATORS: &[&str] = &[" | ", " _ ", " - ", "«", "»", "—"];

/// A refined title must be longer than this many characters.
const MIN_REFINED_CHARS: usize = 10;

/// Computes the best-guess title of a document.
pub fn best_title(doc: &Document) -> String {
    refine_title(&candidate_title(doc))
}

/// Raw title: first `og:title` / `twitter:title` meta, else `<title>`, else "".
///
/// A meta tag with a blank or missing `content` counts as absent.
pub fn candidate_title(doc: &Document) -> String {
    doc.select(r#"meta[property="og:title"], meta[name="twitter:title"]"#)
        .unwrap_or_default()
        .first()
        .and_then(|meta| meta.attr("content"))
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
        .or_else(|| doc.title())
        .unwrap_or_default()
}

/// Drops a trailing site name from `title` when the result is unambiguous.
pub fn refine_title(title: &str) -> String {
    let mut refined: Option<&str> = None;

    for separator in TITLE_SEPARATORS {
        let mut segments = title.split(separator);
        let Some(first) = segments.next() else { continue };
        if segments.next().is_none() {
            continue;
        }

        if refined.is_some() {
            return title.to_string();
        }
        refined = Some(first.trim());
    }

    match refined {
        Some(refined) if refined.chars().count() > MIN_REFINED_CHARS => refined.to_string(),
        _ => title.to_string(),
    }
}

/// Content of the first `<meta>` whose `name`, then `property`, is `key`.
pub fn meta_content(doc: &Document, key: &str) -> Option<String> {
    ["name", "property"].iter().find_map(|attr| {
        doc.select(&format!("meta[{attr}=\"{key}\"]"))
            .ok()?
            .first()?
            .attr("content")
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn doc(head: &str) -> Document {
        Document::parse(&format!("<html><head>{head}</head><body><p>x</p></body></html>"), None).unwrap()
    }

    #[rstest]
    #[case("Great Article | My Site", "Great Article")]
    #[case("A | B", "A | B")]
    #[case("Plain headline without separators", "Plain headline without separators")]
    #[case("Some Long Headline | Site - Section", "Some Long Headline | Site - Section")]
    #[case("Rust Release Notes » Blog", "Rust Release Notes")]
    #[case("Exactly10c | Site", "Exactly10c | Site")]
    #[case("Eleven char | Site", "Eleven char")]
    #[case("", "")]
    fn test_refine_title(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(refine_title(input), expected);
    }

    #[test]
    fn test_refine_counts_characters_not_bytes() {
        assert_eq!(refine_title("ÉÉÉÉÉÉÉÉÉÉ | Site"), "ÉÉÉÉÉÉÉÉÉÉ | Site");
        assert_eq!(refine_title("ÉÉÉÉÉÉÉÉÉÉÉ | Site"), "ÉÉÉÉÉÉÉÉÉÉÉ");
    }

    #[test]
    fn test_og_title_wins_over_title_element() {
        let doc = doc(r#"<title>Fallback</title><meta property="og:title" content="Social Headline Here | Site">"#);
        assert_eq!(candidate_title(&doc), "Social Headline Here | Site");
        assert_eq!(best_title(&doc), "Social Headline Here");
    }

    #[test]
    fn test_first_social_meta_in_document_order() {
        let doc = doc(
            r#"<meta name="twitter:title" content="Twitter Headline"><meta property="og:title" content="OG Headline">"#,
        );
        assert_eq!(candidate_title(&doc), "Twitter Headline");
    }

    #[test]
    fn test_title_element_fallback() {
        assert_eq!(best_title(&doc("<title>Only The Title</title>")), "Only The Title");
    }

    #[test]
    fn test_blank_social_meta_falls_back_to_title_element() {
        let doc1 = doc(r#"<meta property="og:title" content=""><title>Real Page Headline Here</title>"#);
        assert_eq!(best_title(&doc1), "Real Page Headline Here");

        let doc2 = doc(r#"<meta name="twitter:title"><title>Another Headline</title>"#);
        assert_eq!(best_title(&doc2), "Another Headline");
    }

    #[test]
    fn test_multiline_title_element() {
        let doc = doc("<title>\n    Field Notes From The Coast\n  </title>");
        assert_eq!(best_title(&doc), "Field Notes From The Coast");
    }

    #[test]
    fn test_no_title_at_all() {
        assert_eq!(best_title(&doc("")), "");
    }

    #[test]
    fn test_meta_content_by_name_then_property() {
        let doc = doc(r#"<meta property="description" content="by property"><meta name="author" content="Ann">"#);
        assert_eq!(meta_content(&doc, "author").as_deref(), Some("Ann"));
        assert_eq!(meta_content(&doc, "description").as_deref(), Some("by property"));
        assert_eq!(meta_content(&doc, "missing"), None);
    }
}
