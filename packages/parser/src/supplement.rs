//! Card Q&A page parser (supplementary rulings attached to a card).

use scraper::Html;
use ygo_db_models::CardSupplement;

use crate::dom::{self, DomNode, RenderOptions};

const SUPPLEMENT_ID: &str = "supplement";
const PENDULUM_SUPPLEMENT_ID: &str = "pen_supplement";

/// Parses a card Q&A page rooted at `root`.
///
/// The card name comes from the page title (the part before the first
/// `|`). Each `.supplement` block is routed by the id of its `.text`
/// element; blocks with any other id are ignored.
pub fn parse_card_supplement<N: DomNode>(root: &N, card_id: &str) -> CardSupplement {
    let card_name = root
        .query("title")
        .map(|t| t.text_content())
        .and_then(|title| title.split('|').next().map(|s| s.trim().to_owned()))
        .unwrap_or_default();

    let mut supplement = CardSupplement {
        card_id: card_id.to_owned(),
        card_name,
        supplement_info: None,
        supplement_date: None,
        pendulum_supplement_info: None,
        pendulum_supplement_date: None,
    };

    for block in root.query_all(".supplement") {
        let Some(text_elem) = block.query(".text") else {
            continue;
        };
        let date = block.query(".title .update").as_ref().and_then(dom::trimmed_text);
        let text = dom::render_optional(&text_elem, RenderOptions::TEMPLATED);

        match text_elem.attribute("id").as_deref() {
            Some(SUPPLEMENT_ID) => {
                supplement.supplement_info = text;
                supplement.supplement_date = date;
            }
            Some(PENDULUM_SUPPLEMENT_ID) => {
                supplement.pendulum_supplement_info = text;
                supplement.pendulum_supplement_date = date;
            }
            other => log::trace!("Ignoring supplement block with id {other:?}"),
        }
    }

    supplement
}

/// Parses a card Q&A page from raw HTML.
#[must_use]
pub fn parse_card_supplement_html(html: &str, card_id: &str) -> CardSupplement {
    let document = Html::parse_document(html);
    parse_card_supplement(&document.root_element(), card_id)
}
