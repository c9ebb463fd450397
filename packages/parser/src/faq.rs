//! FAQ detail and FAQ search-list parsers.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use ygo_db_models::FaqEntry;

use crate::dom::{self, DomNode, RenderOptions};

static FID_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]fid=(\d+)").expect("valid regex"));

/// Parses a FAQ detail page rooted at `root`.
///
/// Returns `None` when the question block is missing or renders empty. A
/// missing answer block yields an empty answer.
pub fn parse_faq_detail<N: DomNode>(root: &N, faq_id: &str) -> Option<FaqEntry> {
    let question = dom::render_text(&root.query("#question_text")?, RenderOptions::TEMPLATED);
    if question.is_empty() {
        return None;
    }

    let answer = root
        .query("#answer_text")
        .map(|el| dom::render_text(&el, RenderOptions::TEMPLATED))
        .unwrap_or_default();

    let updated_at = root
        .query("#tag_update .date")
        .as_ref()
        .and_then(dom::trimmed_text);

    Some(FaqEntry {
        faq_id: faq_id.to_owned(),
        question,
        answer,
        updated_at,
    })
}

/// Parses a FAQ detail page from raw HTML.
#[must_use]
pub fn parse_faq_detail_html(html: &str, faq_id: &str) -> Option<FaqEntry> {
    let document = Html::parse_document(html);
    parse_faq_detail(&document.root_element(), faq_id)
}

/// Extracts FAQ ids, in page order, from a FAQ search-result page.
///
/// Rows whose hidden link input is missing or lacks an `fid=` parameter are
/// skipped.
#[must_use]
pub fn parse_faq_id_list(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .root_element()
        .query_all(".t_row")
        .iter()
        .filter_map(|row| row.query("input.link_value")?.attribute("value"))
        .filter_map(|value| {
            FID_PARAM
                .captures(&value)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_owned())
        })
        .collect()
}

/// Number of `.t_row` elements on a FAQ search-result page, used to detect
/// the last page.
#[must_use]
pub fn count_list_rows(html: &str) -> usize {
    Html::parse_document(html)
        .root_element()
        .query_all(".t_row")
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"<html><body>
<div id="question_text">
  <a href="/yugiohdb/card_search.action?ope=2&cid=4007">青眼の白龍</a>の効果は<br>どう処理しますか？
</div>
<div id="answer_text">
  チェーンブロックを作ります。<br><a href="faq_search.action?ope=5&fid=9">関連FAQ</a>
</div>
<div id="tag_update"><span class="date">2021-04-01</span></div>
</body></html>"#;

    #[test]
    fn parses_templated_question_and_answer() {
        let faq = parse_faq_detail_html(DETAIL, "123").unwrap();
        assert_eq!(faq.faq_id, "123");
        assert_eq!(faq.question, "{{青眼の白龍|4007}}の効果は\nどう処理しますか？");
        assert_eq!(faq.answer, "チェーンブロックを作ります。\n関連FAQ");
        assert_eq!(faq.updated_at.as_deref(), Some("2021-04-01"));
    }

    #[test]
    fn missing_answer_is_empty_string() {
        let html = r#"<div id="question_text">質問</div>"#;
        let faq = parse_faq_detail_html(html, "1").unwrap();
        assert_eq!(faq.answer, "");
        assert_eq!(faq.updated_at, None);
    }

    #[test]
    fn missing_or_blank_question_is_unparseable() {
        assert!(parse_faq_detail_html("<div id=\"answer_text\">a</div>", "1").is_none());
        assert!(parse_faq_detail_html("<div id=\"question_text\"> <br> </div>", "1").is_none());
    }

    #[test]
    fn extracts_fids_in_page_order() {
        let html = r#"<div class="t_row"><input class="link_value" value="faq_search.action?ope=5&fid=300"></div>
<div class="t_row"><input class="link_value" value="faq_search.action?ope=5&cid=1"></div>
<div class="t_row"></div>
<div class="t_row"><input class="link_value" value="faq_search.action?ope=5&fid=12"></div>"#;
        assert_eq!(parse_faq_id_list(html), vec!["300", "12"]);
        assert_eq!(count_list_rows(html), 4);
    }
}
