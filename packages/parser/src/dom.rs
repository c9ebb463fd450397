//! Minimal DOM query capability the parsers are written against.
//!
//! Parsers only need to query by CSS selector, read attributes, test
//! classes, and walk child nodes. [`DomNode`] captures exactly that so the
//! row and detail parsers stay independent of any particular HTML backend.
//! The [`scraper`] backend is provided here.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node, Selector};

/// Captures the numeric card id from a `cid=` query parameter.
pub(crate) static CID_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]cid=(\d+)").expect("valid regex"));

/// A child of a [`DomNode`]: either raw text or a nested element.
#[derive(Debug, Clone)]
pub enum DomChild<N> {
    Text(String),
    Element(N),
}

/// Read-only element access used by every parser in this crate.
pub trait DomNode: Sized + Clone {
    /// First descendant matching `selector`. Invalid selectors match
    /// nothing.
    fn query(&self, selector: &str) -> Option<Self>;

    /// All descendants matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self>;

    /// Attribute value, if present.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Whether the element's `class` list contains `class`.
    fn has_class(&self, class: &str) -> bool;

    /// Lowercase tag name.
    fn tag(&self) -> String;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self) -> String;

    /// Direct children, skipping comments and processing instructions.
    fn child_nodes(&self) -> Vec<DomChild<Self>>;
}

impl DomNode for ElementRef<'_> {
    fn query(&self, selector: &str) -> Option<Self> {
        let sel = Selector::parse(selector).ok()?;
        self.select(&sel).next()
    }

    fn query_all(&self, selector: &str) -> Vec<Self> {
        Selector::parse(selector)
            .map(|sel| self.select(&sel).collect())
            .unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_owned)
    }

    fn has_class(&self, class: &str) -> bool {
        self.value().classes().any(|c| c == class)
    }

    fn tag(&self) -> String {
        self.value().name().to_ascii_lowercase()
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }

    fn child_nodes(&self) -> Vec<DomChild<Self>> {
        self.children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => Some(DomChild::Text(text.to_string())),
                Node::Element(_) => ElementRef::wrap(child).map(DomChild::Element),
                _ => None,
            })
            .collect()
    }
}

/// Options for [`render_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Drop `<hr>` elements entirely.
    pub drop_rules: bool,
    /// Replace `<a href="...cid=N">label</a>` with `{{label|N}}`.
    pub card_links: bool,
}

impl RenderOptions {
    /// `<br>` becomes a newline; nothing else is rewritten.
    pub const PLAIN: Self = Self {
        drop_rules: false,
        card_links: false,
    };

    /// Remarks blocks: line breaks plus horizontal rules removed.
    pub const REMARKS: Self = Self {
        drop_rules: true,
        card_links: false,
    };

    /// FAQ and supplement bodies: line breaks plus inline card templates.
    pub const TEMPLATED: Self = Self {
        drop_rules: false,
        card_links: true,
    };
}

/// Renders the text of `node` with `<br>` turned into `\n`, applying the
/// rewrites selected by `options`, and trims the result.
pub fn render_text<N: DomNode>(node: &N, options: RenderOptions) -> String {
    let mut out = String::new();
    render_into(node, options, &mut out);
    out.trim().to_owned()
}

/// Like [`render_text`] but maps an empty result to `None`.
pub fn render_optional<N: DomNode>(node: &N, options: RenderOptions) -> Option<String> {
    Some(render_text(node, options)).filter(|s| !s.is_empty())
}

fn render_into<N: DomNode>(node: &N, options: RenderOptions, out: &mut String) {
    for child in node.child_nodes() {
        match child {
            DomChild::Text(text) => out.push_str(&text),
            DomChild::Element(el) => match el.tag().as_str() {
                "br" => out.push('\n'),
                "hr" if options.drop_rules => {}
                "a" if options.card_links => {
                    if let Some(token) = card_link_template(&el) {
                        out.push_str(&token);
                    } else {
                        render_into(&el, options, out);
                    }
                }
                _ => render_into(&el, options, out),
            },
        }
    }
}

/// `{{label|cardId}}` for an anchor whose `href` carries a `cid=` parameter.
fn card_link_template<N: DomNode>(anchor: &N) -> Option<String> {
    let href = anchor.attribute("href")?;
    let cid = CID_PARAM.captures(&href)?.get(1)?.as_str().to_owned();
    let label = anchor.text_content();
    Some(format!("{{{{{}|{cid}}}}}", label.trim()))
}

/// Trimmed text content, `None` when empty.
pub fn trimmed_text<N: DomNode>(node: &N) -> Option<String> {
    let text = node.text_content();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

/// First run of ASCII digits in `text`.
pub(crate) fn first_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn with_fragment<T>(html: &str, f: impl FnOnce(ElementRef<'_>) -> T) -> T {
        let doc = Html::parse_fragment(html);
        let root = doc.root_element();
        let first = root
            .child_nodes()
            .into_iter()
            .find_map(|c| match c {
                DomChild::Element(e) => Some(e),
                DomChild::Text(_) => None,
            })
            .unwrap();
        f(first)
    }

    #[test]
    fn br_becomes_newline_and_result_is_trimmed() {
        with_fragment("<div>  line one<br>line two<br/>  </div>", |el| {
            assert_eq!(render_text(&el, RenderOptions::PLAIN), "line one\nline two");
        });
    }

    #[test]
    fn horizontal_rules_are_dropped_only_when_requested() {
        with_fragment("<div>a<hr>b</div>", |el| {
            assert_eq!(render_text(&el, RenderOptions::REMARKS), "ab");
            assert_eq!(render_text(&el, RenderOptions::PLAIN), "ab");
        });
        with_fragment("<div>a<hr><span>b</span></div>", |el| {
            assert_eq!(render_text(&el, RenderOptions::REMARKS), "ab");
        });
    }

    #[test]
    fn card_links_become_templates() {
        let html = r#"<div>Use <a href="card_search.action?ope=2&cid=4007"> Blue-Eyes </a> and <a href="/other">x</a></div>"#;
        with_fragment(html, |el| {
            assert_eq!(
                render_text(&el, RenderOptions::TEMPLATED),
                "Use {{Blue-Eyes|4007}} and x"
            );
            assert_eq!(render_text(&el, RenderOptions::PLAIN), "Use  Blue-Eyes  and x");
        });
    }

    #[test]
    fn nested_elements_keep_inner_line_breaks() {
        with_fragment("<div><p>one<br>two</p><span>three</span></div>", |el| {
            assert_eq!(render_text(&el, RenderOptions::PLAIN), "one\ntwothree");
        });
    }

    #[test]
    fn empty_render_is_none() {
        with_fragment("<div> <br> </div>", |el| {
            assert_eq!(render_optional(&el, RenderOptions::PLAIN), None);
        });
    }

    #[test]
    fn query_and_attributes() {
        with_fragment(
            r#"<div><span class="a b" data-x="1">t</span><span class="b">u</span></div>"#,
            |el| {
                let first = el.query(".b").unwrap();
                assert!(first.has_class("a"));
                assert_eq!(first.attribute("data-x").as_deref(), Some("1"));
                assert_eq!(el.query_all("span").len(), 2);
                assert!(el.query("[[invalid").is_none());
                assert!(el.query_all("[[invalid").is_empty());
            },
        );
    }

    #[test]
    fn first_integer_finds_leading_digit_run() {
        assert_eq!(first_integer("レベル 12"), Some(12));
        assert_eq!(first_integer("Link 3 arrows 4"), Some(3));
        assert_eq!(first_integer("none"), None);
    }
}
