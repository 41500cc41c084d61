//! Readability-style main-content extraction.
//!
//! Given raw page HTML, find the region most likely to hold the article body
//! and pull its text out, skipping chrome (navigation, scripts, footers).
//! The heuristic: prefer `<article>`, then `<main>`, then `[role=main]`,
//! picking the densest candidate; fall back to `<body>`.

use scraper::{ElementRef, Html, Node, Selector};

/// Subtrees that never contain article text.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "svg", "form", "button",
    "iframe", "template",
];

/// Elements that end a visual block; a newline is emitted after each.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "blockquote", "pre", "tr", "table", "br", "figcaption",
];

/// Extract the readable main-content text from an HTML document.
///
/// Returns `None` when the document yields no text at all.
pub fn extract_readable(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let region = main_region(&doc)?;

    let mut out = String::new();
    collect_text(*region, &mut out);

    let trimmed = out.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Pick the densest main-content candidate, falling back to `<body>`.
fn main_region(doc: &Html) -> Option<ElementRef<'_>> {
    for candidate in ["article", "main", r#"[role="main"]"# ] {
        let selector = Selector::parse(candidate).expect("static selector");
        let densest = doc
            .select(&selector)
            .max_by_key(|el| el.text().map(str::len).sum::<usize>());
        if let Some(el) = densest {
            return Some(el);
        }
    }

    let body = Selector::parse("body").expect("static selector");
    doc.select(&body).next()
}

fn collect_text(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text),
            Node::Element(el) => {
                let name = el.name();
                if SKIP_TAGS.contains(&name) {
                    continue;
                }
                collect_text(child, out);
                if BLOCK_TAGS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_over_body_chrome() {
        let html = r#"
            <html><body>
                <nav>Home | About | Contact</nav>
                <article><p>Photosynthesis converts light into chemical energy.</p></article>
                <footer>Copyright 2024</footer>
            </body></html>
        "#;
        let text = extract_readable(html).unwrap();
        assert!(text.contains("Photosynthesis converts light"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Home | About"));
    }

    #[test]
    fn skips_script_and_style_inside_content() {
        let html = r#"
            <html><body><main>
                <script>var x = "tracking";</script>
                <style>.hidden { display: none }</style>
                <p>Visible text.</p>
            </main></body></html>
        "#;
        let text = extract_readable(html).unwrap();
        assert!(text.contains("Visible text."));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("display"));
    }

    #[test]
    fn falls_back_to_body_when_no_landmark() {
        let html = "<html><body><p>Just a paragraph.</p></body></html>";
        let text = extract_readable(html).unwrap();
        assert!(text.contains("Just a paragraph."));
    }

    #[test]
    fn paragraphs_are_newline_separated() {
        let html = "<html><body><article><p>First.</p><p>Second.</p></article></body></html>";
        let text = extract_readable(html).unwrap();
        assert!(text.contains("First.\nSecond.") || text.contains("First.\n\nSecond."));
    }

    #[test]
    fn empty_document_yields_none() {
        assert!(extract_readable("<html><body></body></html>").is_none());
        assert!(extract_readable("").is_none());
    }

    #[test]
    fn densest_article_wins() {
        let html = r#"
            <html><body>
                <article><p>Teaser.</p></article>
                <article><p>The long-form explanation of the topic with much more substance.</p></article>
            </body></html>
        "#;
        let text = extract_readable(html).unwrap();
        assert!(text.contains("long-form explanation"));
    }
}
