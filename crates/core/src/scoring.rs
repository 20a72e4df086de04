use std::sync::LazyLock;

use regex::Regex;

use crate::parse::Element;

/// Positive patterns that suggest an element contains main content
static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story|tweet)").unwrap()
});

/// Negative patterns that suggest an element does NOT contain main content
static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup)",
    )
    .unwrap()
});

const CLASS_WEIGHT: f64 = 25.0;
const CHARS_PER_POINT: usize = 100;
const MAX_CHAR_POINTS: f64 = 3.0;
const MAX_COMMA_POINTS: f64 = 3.0;

/// Score contributed by the tag itself.
///
/// - ARTICLE: +10
/// - SECTION: +8
/// - DIV: +5
/// - TD, BLOCKQUOTE: +3
/// - FORM, lists and list items: -3
/// - headings, TH, HEADER, FOOTER, NAV: -5
pub fn base_tag_score(element: &Element<'_>) -> f64 {
    match element.tag_name().as_str() {
        "article" => 10.0,
        "section" => 8.0,
        "div" | "main" => 5.0,
        "td" | "blockquote" => 3.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" => -5.0,
        _ => 0.0,
    }
}

/// Class/ID weight: positive patterns win over negative ones, id before class.
pub fn class_id_weight(element: &Element<'_>) -> f64 {
    let weigh = |value: &str| {
        if POSITIVE.is_match(value) {
            Some(CLASS_WEIGHT)
        } else if NEGATIVE.is_match(value) {
            Some(-CLASS_WEIGHT)
        } else {
            None
        }
    };

    if let Some(weight) = element.attr("id").and_then(weigh) {
        return weight;
    }

    element
        .attr("class")
        .and_then(|class| class.split_whitespace().find_map(weigh))
        .unwrap_or(0.0)
}

/// One point per hundred characters and one per comma, each capped at three.
pub fn content_density_score(text: &str) -> f64 {
    let char_points = ((text.chars().count() / CHARS_PER_POINT) as f64).min(MAX_CHAR_POINTS);
    let comma_points = (text.matches(',').count() as f64).min(MAX_COMMA_POINTS);
    char_points + comma_points
}

/// Ratio of link text to all text, from 0.0 to 1.0.
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.text().chars().count();
    if text_length == 0 {
        return 0.0;
    }

    let link_length: usize = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.text().chars().count())
        .sum();

    link_length as f64 / text_length as f64
}

/// Final score of a single element before ancestor propagation.
///
/// Link density scales the raw score down; the penalty is halved for
/// elements that look like content or carry more than 500 characters.
pub fn element_score(element: &Element<'_>) -> f64 {
    let text = element.text();
    let class_weight = class_id_weight(element);
    let raw = base_tag_score(element) + class_weight + content_density_score(&text);

    let density = link_density(element);
    let penalty = if class_weight > 0.0 || text.chars().count() > 500 { 1.0 - density * 0.5 } else { 1.0 - density };

    raw * penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;

    fn first<'a>(doc: &'a Document, selector: &str) -> Element<'a> {
        doc.select(selector).unwrap().into_iter().next().unwrap()
    }

    #[test]
    fn test_base_tag_scores() {
        let doc = Document::parse(
            "<article>a</article><section>s</section><div>d</div><nav>n</nav><ul><li>l</li></ul><p>p</p>",
            None,
        )
        .unwrap();

        assert_eq!(base_tag_score(&first(&doc, "article")), 10.0);
        assert_eq!(base_tag_score(&first(&doc, "section")), 8.0);
        assert_eq!(base_tag_score(&first(&doc, "div")), 5.0);
        assert_eq!(base_tag_score(&first(&doc, "nav")), -5.0);
        assert_eq!(base_tag_score(&first(&doc, "li")), -3.0);
        assert_eq!(base_tag_score(&first(&doc, "p")), 0.0);
    }

    #[test]
    fn test_class_weight() {
        let doc = Document::parse(
            r#"<div id="x" class="post-body">a</div><div class="sidebar">b</div><div class="plain">c</div><div class="comment-content">d</div>"#,
            None,
        )
        .unwrap();
        let divs = doc.select("div").unwrap();

        assert_eq!(class_id_weight(&divs[0]), 25.0);
        assert_eq!(class_id_weight(&divs[1]), -25.0);
        assert_eq!(class_id_weight(&divs[2]), 0.0);
        assert_eq!(class_id_weight(&divs[3]), 25.0);
    }

    #[test]
    fn test_content_density() {
        assert_eq!(content_density_score("short"), 0.0);
        assert_eq!(content_density_score(&"x".repeat(250)), 2.0);
        assert_eq!(content_density_score(&"x".repeat(5000)), 3.0);
        assert_eq!(content_density_score("a, b, c, d, e"), 3.0);
    }

    #[test]
    fn test_link_density() {
        let doc = Document::parse(r#"<div><a href="/">1234</a>5678</div><p>none</p>"#, None).unwrap();
        assert!((link_density(&first(&doc, "div")) - 0.5).abs() < f64::EPSILON);
        assert_eq!(link_density(&first(&doc, "p")), 0.0);
    }

    #[test]
    fn test_link_heavy_element_scores_zero() {
        let doc = Document::parse(r#"<div><a href="/a">Home</a><a href="/b">About</a></div>"#, None).unwrap();
        assert_eq!(element_score(&first(&doc, "div")), 0.0);
    }

    #[test]
    fn test_article_outscores_nav() {
        let doc = Document::parse(
            r#"<nav class="menu"><a href="/">Home</a></nav><article class="post"><p>Text, with, commas.</p></article>"#,
            None,
        )
        .unwrap();
        assert!(element_score(&first(&doc, "article")) > element_score(&first(&doc, "nav")));
    }
}
