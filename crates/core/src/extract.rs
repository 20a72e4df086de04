//! Content scoring: picking the element that holds the article body.
//!
//! [`ContentScorer`] is the seam the article calls for the `content`
//! artifact. [`HeuristicScorer`] scores candidate containers by tag,
//! class/id, text density and link density, propagates scores to parents
//! and grandparents, and joins qualifying siblings of the winner.

use std::cmp::Ordering;
use std::collections::HashMap;

use ego_tree::NodeId;

use crate::parse::{Document, Element, Fragment};
use crate::scoring::{element_score, link_density};

/// Finds the article body in a document.
pub trait ContentScorer: Send + Sync {
    /// Returns the best candidate, or `None` when nothing qualifies.
    ///
    /// `relaxed` asks for a lower-confidence pass that accepts candidates a
    /// normal pass would reject.
    fn extract(&self, doc: &mut Document, relaxed: bool) -> Option<Candidate>;
}

/// Serialized markup of an extracted article body.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Outer markup of the winning element and any joined siblings, in
    /// document order.
    pub html: String,
    /// Score of the winning element.
    pub score: f64,
}

impl Candidate {
    /// Whitespace-normalized text of the candidate.
    pub fn visible_text(&self) -> String {
        Fragment::parse(&self.html).visible_text()
    }
}

/// Thresholds for [`HeuristicScorer`].
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Minimum score of the top candidate (default: 20.0).
    pub min_score: f64,
    /// Minimum character count for content; elements with less than a
    /// tenth of it are not scored (default: 500).
    pub char_threshold: usize,
    /// Minimum score in relaxed mode (default: 0.0).
    pub relaxed_min_score: f64,
    /// Character threshold in relaxed mode (default: 0).
    pub relaxed_char_threshold: usize,
    /// Siblings scoring at least this fraction of the top score are joined
    /// (default: 0.2).
    pub sibling_threshold: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            min_score: 20.0,
            char_threshold: 500,
            relaxed_min_score: 0.0,
            relaxed_char_threshold: 0,
            sibling_threshold: 0.2,
        }
    }
}

/// Tags that are considered potential content containers
const CANDIDATE_TAGS: &[&str] = &["div", "article", "section", "main", "p", "td", "pre", "blockquote"];

/// Default [`ContentScorer`].
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: ScorerConfig,
}

struct Scored<'a> {
    element: Element<'a>,
    score: f64,
}

impl HeuristicScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    fn score_candidates<'a>(&self, body: &Element<'a>, char_threshold: usize) -> HashMap<NodeId, Scored<'a>> {
        let mut scored: HashMap<NodeId, Scored<'a>> = HashMap::new();

        for tag in CANDIDATE_TAGS {
            for element in body.select(tag).unwrap_or_default() {
                let tag_name = element.tag_name();
                if !matches!(tag_name.as_str(), "article" | "section" | "main")
                    && element.text().trim().chars().count() < char_threshold / 10
                {
                    continue;
                }

                let own = element_score(&element);
                let parent = element.parent();
                let grandparent = parent.as_ref().and_then(Element::parent);

                add_score(&mut scored, element, 0.0);
                if let Some(parent) = parent {
                    add_score(&mut scored, parent, own / 2.0);
                }
                if let Some(grandparent) = grandparent {
                    add_score(&mut scored, grandparent, own / 3.0);
                }
            }
        }

        scored
    }

    fn join_siblings(&self, top: &Scored<'_>, scored: &HashMap<NodeId, Scored<'_>>) -> String {
        if top.element.tag_name() == "body" {
            return format!("<div>{}</div>", top.element.inner_html());
        }

        let Some(parent) = top.element.parent().filter(|p| p.tag_name() != "html") else {
            return top.element.outer_html();
        };

        let bar = (top.score * self.config.sibling_threshold).max(10.0);
        let mut html = String::new();

        for sibling in parent.child_elements() {
            let is_top = sibling.node_id() == top.element.node_id();
            let qualifies = is_top
                || scored.get(&sibling.node_id()).is_some_and(|s| s.score >= bar)
                || (sibling.tag_name() == "p"
                    && sibling.text().trim().chars().count() > 80
                    && link_density(&sibling) < 0.25);

            if qualifies {
                if !html.is_empty() {
                    html.push('\n');
                }
                html.push_str(&sibling.outer_html());
            }
        }

        html
    }
}

impl ContentScorer for HeuristicScorer {
    fn extract(&self, doc: &mut Document, relaxed: bool) -> Option<Candidate> {
        let (min_score, char_threshold) = if relaxed {
            (self.config.relaxed_min_score, self.config.relaxed_char_threshold)
        } else {
            (self.config.min_score, self.config.char_threshold)
        };

        let body = doc.body()?;
        let scored = self.score_candidates(&body, char_threshold);

        let top = scored
            .values()
            .filter(|s| s.element.tag_name() != "html")
            .max_by(|a, b| compare_candidates(a, b))?;

        tracing::debug!(candidates = scored.len(), score = top.score, tag = %top.element.tag_name(), relaxed, "top candidate");

        if top.score < min_score {
            return None;
        }

        Some(Candidate { html: self.join_siblings(top, &scored), score: top.score })
    }
}

fn add_score<'a>(scored: &mut HashMap<NodeId, Scored<'a>>, element: Element<'a>, bonus: f64) {
    scored
        .entry(element.node_id())
        .or_insert_with(|| {
            let score = element_score(&element);
            Scored { element, score }
        })
        .score += bonus;
}

fn compare_candidates(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| candidate_priority(&a.element.tag_name()).cmp(&candidate_priority(&b.element.tag_name())))
        .then_with(|| a.element.text().chars().count().cmp(&b.element.text().chars().count()))
}

fn candidate_priority(tag_name: &str) -> u8 {
    match tag_name {
        "article" | "main" | "section" => 3,
        "div" => 2,
        "body" => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
        <html>
            <body>
                <div class="sidebar"><p>Short sidebar text</p></div>
                <article class="main-content" id="main">
                    <h1>Main Article Title</h1>
                    <p>This is a very long paragraph with extensive content. It contains multiple sentences,
                    commas, periods, and various punctuation marks. The purpose is to create a substantial
                    amount of text that will score well in the content density calculation. More text here,
                    more content, more sentences, more everything.</p>
                    <p>Another paragraph with substantial content. It has multiple sentences,
                    commas for density, and enough text to be considered meaningful content.</p>
                </article>
            </body>
        </html>
    "#;

    #[test]
    fn test_scorer_config_default() {
        let config = ScorerConfig::default();
        assert_eq!(config.min_score, 20.0);
        assert_eq!(config.char_threshold, 500);
        assert_eq!(config.relaxed_min_score, 0.0);
        assert_eq!(config.relaxed_char_threshold, 0);
        assert_eq!(config.sibling_threshold, 0.2);
    }

    #[test]
    fn test_extracts_article() {
        let mut doc = Document::parse(ARTICLE_HTML, None).unwrap();
        let candidate = HeuristicScorer::default().extract(&mut doc, false).unwrap();

        assert!(candidate.html.starts_with("<article"));
        assert!(candidate.visible_text().contains("very long paragraph"));
        assert!(!candidate.html.contains("Short sidebar text"));
        assert!(candidate.score >= 20.0);
    }

    #[test]
    fn test_strict_pass_rejects_navigation() {
        let html = r##"
            <html><body>
                <nav class="menu">
                    <a href="#">Link 1</a>
                    <a href="#">Link 2</a>
                    <a href="#">Link 3</a>
                </nav>
            </body></html>
        "##;
        let mut doc = Document::parse(html, None).unwrap();
        assert!(HeuristicScorer::default().extract(&mut doc, false).is_none());
    }

    #[test]
    fn test_relaxed_pass_accepts_short_content() {
        let html = "<html><body><div><p>Tiny note.</p></div></body></html>";
        let mut doc = Document::parse(html, None).unwrap();
        let scorer = HeuristicScorer::default();

        assert!(scorer.extract(&mut doc, false).is_none());

        let candidate = scorer.extract(&mut doc, true).unwrap();
        assert_eq!(candidate.visible_text(), "Tiny note.");
    }

    #[test]
    fn test_empty_body_has_no_candidate() {
        let mut doc = Document::parse("<html><body></body></html>", None).unwrap();
        let scorer = HeuristicScorer::default();
        assert!(scorer.extract(&mut doc, false).is_none());
        assert!(scorer.extract(&mut doc, true).is_none());
    }

    #[test]
    fn test_joins_long_paragraph_siblings() {
        let long = "This sibling paragraph carries plenty of prose, long enough to be joined with the winner.";
        let html = format!(
            r#"<html><body><div id="wrap">
                <div class="post-body"><p>{long} {long} {long} {long} {long} {long}</p></div>
                <p>{long}</p>
                <p><a href="/x">{long}</a></p>
            </div></body></html>"#
        );
        let mut doc = Document::parse(&html, None).unwrap();
        let candidate = HeuristicScorer::default().extract(&mut doc, false).unwrap();
        let fragment = Fragment::parse(&candidate.html);

        assert_eq!(fragment.root().unwrap().attr("class"), Some("post-body"));
        assert_eq!(candidate.html.matches("<p>").count(), 2);
        assert!(!candidate.html.contains("href"));
    }
}
