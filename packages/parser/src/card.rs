//! Card search-result row parser.
//!
//! A result page is a list of `.t_row` elements, one per card. Each row is
//! parsed independently into a [`Card`]; a row missing a required field is
//! reported as unparseable (`None`) rather than failing the page.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use ygo_db_models::{
    Card, CardBase, CardType, ImageRef, LevelType, LimitRegulation, MonsterCard, MonsterType,
    Race, SpellCard, StatValue, TrapCard,
};

use crate::dom::{self, CID_PARAM, DomNode, RenderOptions};
use crate::field_mapping;
use crate::normalize::{is_not_legal_for_official, normalize_name};

static IMAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"get_image\.action\?[^'"]*cid=(\d+)(?:&(?:amp;)?ciid=(\d+))?(?:&(?:amp;)?enc=([^&'"\s]+))?"#,
    )
    .expect("valid regex")
});

static ATTRIBUTE_ICON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"attribute_icon_([^.]+)\.png").expect("valid regex"));

static LINK_ICON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"link(\d+)\.png").expect("valid regex"));

static EFFECT_ICON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"effect_icon_([^.]+)\.png").expect("valid regex"));

static ATK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"攻撃力[:\s]*([0-9X?]+)").expect("valid regex"));

static DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"守備力[:\s]*([0-9X?]+)").expect("valid regex"));

/// Species labels that always mean an extra deck monster.
const EXTRA_DECK_SPECIES: &[&str] = &["融合", "シンクロ"];

const ROW_SELECTOR: &str = ".t_row";

/// Image variant and hash found for a card id in the raw page HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    pub ciid: Option<String>,
    pub img_hash: Option<String>,
}

/// Card id to image info, built once per page.
pub type ImageInfoMap = HashMap<String, ImageInfo>;

/// Result of parsing one search-result page.
#[derive(Debug, Clone, Default)]
pub struct CardListPage {
    /// Cards that parsed, in page order.
    pub cards: Vec<Card>,
    /// Number of `.t_row` elements on the page, parseable or not.
    pub rows: usize,
    /// Rows that could not be parsed.
    pub skipped: usize,
}

/// Scans the raw page HTML for image URLs and records the `ciid` and `enc`
/// parameters per card id. Later URLs for the same card id win.
#[must_use]
pub fn extract_image_info(html: &str) -> ImageInfoMap {
    let mut map = ImageInfoMap::new();
    for caps in IMAGE_URL_RE.captures_iter(html) {
        let Some(cid) = caps.get(1) else {
            continue;
        };
        map.insert(
            cid.as_str().to_owned(),
            ImageInfo {
                ciid: caps.get(2).map(|m| m.as_str().to_owned()),
                img_hash: caps.get(3).map(|m| m.as_str().to_owned()),
            },
        );
    }
    map
}

/// Parses every card row on a search-result page.
#[must_use]
pub fn parse_card_list_page(html: &str) -> CardListPage {
    let image_info = extract_image_info(html);
    let document = Html::parse_document(html);
    let rows = document.root_element().query_all(ROW_SELECTOR);

    let mut page = CardListPage {
        rows: rows.len(),
        ..CardListPage::default()
    };

    for row in &rows {
        if let Some(card) = parse_card_row(row, &image_info) {
            page.cards.push(card);
        } else {
            log::debug!("Skipping unparseable card row");
            page.skipped += 1;
        }
    }

    page
}

/// Detects the card kind from the attribute icon.
pub fn detect_card_type<N: DomNode>(row: &N) -> Option<CardType> {
    let src = attribute_icon_src(row)?;
    if src.contains("attribute_icon_spell") {
        Some(CardType::Spell)
    } else if src.contains("attribute_icon_trap") {
        Some(CardType::Trap)
    } else if src.contains("attribute_icon_") {
        Some(CardType::Monster)
    } else {
        None
    }
}

/// Parses one `.t_row` element. Returns `None` when the card kind, name,
/// id, or any required monster field cannot be determined.
pub fn parse_card_row<N: DomNode>(row: &N, image_info: &ImageInfoMap) -> Option<Card> {
    let card_type = detect_card_type(row)?;
    let base = parse_card_base(row, image_info)?;

    match card_type {
        CardType::Monster => parse_monster(row, base).map(Card::Monster),
        CardType::Spell => Some(Card::Spell(SpellCard {
            base,
            effect_type: field_mapping::map_spell_effect(effect_icon_token(row).as_deref()),
        })),
        CardType::Trap => Some(Card::Trap(TrapCard {
            base,
            effect_type: field_mapping::map_trap_effect(effect_icon_token(row).as_deref()),
        })),
    }
}

fn attribute_icon_src<N: DomNode>(row: &N) -> Option<String> {
    row.query(".box_card_attribute img")
        .and_then(|img| img.attribute("src"))
        .filter(|src| !src.is_empty())
}

fn effect_icon_token<N: DomNode>(row: &N) -> Option<String> {
    let src = row.query(".box_card_effect img")?.attribute("src")?;
    EFFECT_ICON_RE
        .captures(&src)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

// ── Shared fields ─────────────────────────────────────────────────────

fn parse_card_base<N: DomNode>(row: &N, image_info: &ImageInfoMap) -> Option<CardBase> {
    let name = row.query(".card_name").as_ref().and_then(dom::trimmed_text)?;

    let link_value = row.query("input.link_value")?.attribute("value")?;
    let card_id = CID_PARAM
        .captures(&link_value)?
        .get(1)?
        .as_str()
        .to_owned();

    let ruby = row.query(".card_ruby").as_ref().and_then(dom::trimmed_text);

    let info = image_info.get(&card_id);
    let ciid = info
        .and_then(|i| i.ciid.clone())
        .unwrap_or_else(|| "1".to_owned());
    let img_hash = info
        .and_then(|i| i.img_hash.clone())
        .unwrap_or_else(|| format!("{card_id}_1_1_1"));

    let text = row
        .query(".box_card_text:not(.biko)")
        .and_then(|el| dom::render_optional(&el, RenderOptions::PLAIN));

    let limit_regulation = row.query(".lr_icon").and_then(|icon| {
        if icon.has_class("fl_1") {
            Some(LimitRegulation::Forbidden)
        } else if icon.has_class("fl_2") {
            Some(LimitRegulation::Limited)
        } else if icon.has_class("fl_3") {
            Some(LimitRegulation::SemiLimited)
        } else {
            None
        }
    });

    let biko = row
        .query(".box_card_text.biko")
        .and_then(|el| dom::render_optional(&el, RenderOptions::REMARKS));
    let is_not_legal_for_official = biko.as_deref().is_some_and(is_not_legal_for_official);

    Some(CardBase {
        normalized_name: normalize_name(&name),
        name,
        ruby,
        images: vec![ImageRef {
            ciid: ciid.clone(),
            img_hash,
        }],
        card_id,
        ciid,
        text,
        limit_regulation,
        biko,
        is_not_legal_for_official,
    })
}

// ── Monsters ──────────────────────────────────────────────────────────

fn parse_monster<N: DomNode>(row: &N, base: CardBase) -> Option<MonsterCard> {
    let attribute_src = attribute_icon_src(row)?;
    let attribute_token = ATTRIBUTE_ICON_RE.captures(&attribute_src)?.get(1)?;
    let attribute = field_mapping::map_attribute(attribute_token.as_str())?;

    let level_elem = row.query(".box_card_level_rank");
    let (level_type, level_value, link_markers) = if let Some(level) = &level_elem {
        let (level_type, level_value) = parse_level_or_rank(level)?;
        (level_type, level_value, None)
    } else {
        let link = row.query(".box_card_linkmarker")?;
        let (rating, markers) = parse_link(&link)?;
        (LevelType::Link, rating, markers)
    };

    let species_text = row
        .query(".card_info_species_and_other_item")?
        .text_content();
    let (race, monster_types) = parse_species(&species_text)?;

    let (atk, def) = parse_stats(row);

    let pendulum_scale = row
        .query(".box_card_pen_scale")
        .and_then(|el| dom::first_integer(&el.text_content()));
    let pendulum_text = row
        .query(".box_card_pen_effect")
        .and_then(|el| dom::render_optional(&el, RenderOptions::PLAIN));

    let is_extra_deck = is_extra_deck(level_elem.as_ref(), &species_text);

    Some(MonsterCard {
        base,
        attribute,
        level_type,
        level_value,
        race,
        monster_types,
        atk,
        def,
        link_markers,
        pendulum_scale,
        pendulum_text,
        is_extra_deck,
    })
}

/// Level or rank from `.box_card_level_rank`. The element's class gives a
/// first guess that the star icon overrides.
fn parse_level_or_rank<N: DomNode>(elem: &N) -> Option<(LevelType, u32)> {
    let mut level_type = if elem.has_class("rank") {
        LevelType::Rank
    } else {
        LevelType::Level
    };

    if let Some(src) = elem.query("img").and_then(|img| img.attribute("src")) {
        if src.contains("icon_rank.png") {
            level_type = LevelType::Rank;
        } else if src.contains("icon_level.png") {
            level_type = LevelType::Level;
        }
    }

    let value = dom::first_integer(&elem.query("span")?.text_content())?;
    Some((level_type, value))
}

/// Link rating and arrow bitmask from `.box_card_linkmarker`.
fn parse_link<N: DomNode>(elem: &N) -> Option<(u32, Option<u16>)> {
    let rating = dom::first_integer(&elem.query("span")?.text_content())?;
    let markers = elem
        .query("img")
        .and_then(|img| img.attribute("src"))
        .and_then(|src| {
            LINK_ICON_RE
                .captures(&src)
                .and_then(|c| c.get(1))
                .map(|m| decode_link_markers(m.as_str()))
        });
    Some((rating, markers))
}

/// Turns the arrow digits of a `link<digits>.png` icon into a bitmask.
///
/// Each digit is a numeric-keypad direction; direction `d` sets bit `d - 1`.
/// `5` (the center) and non-digits are ignored.
#[must_use]
pub fn decode_link_markers(digits: &str) -> u16 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .filter(|&d| (1..=9).contains(&d) && d != 5)
        .fold(0, |acc, d| acc | (1 << (d - 1)))
}

/// Splits the bracketed species line into a race and monster types.
///
/// The first segment must be a known race. Unknown type labels are dropped.
#[must_use]
pub fn parse_species(text: &str) -> Option<(Race, Vec<MonsterType>)> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '【' | '】' | '[' | ']'))
        .collect();
    let mut parts = cleaned
        .split(['／', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let race = field_mapping::map_race(parts.next()?)?;
    let types = parts.filter_map(field_mapping::map_monster_type).collect();
    Some((race, types))
}

fn parse_stats<N: DomNode>(row: &N) -> (Option<StatValue>, Option<StatValue>) {
    let mut atk = None;
    let mut def = None;
    let Some(spec) = row.query(".box_card_spec") else {
        return (atk, def);
    };

    for span in spec.query_all("span") {
        let text = span.text_content();
        if let Some(m) = ATK_RE.captures(&text).and_then(|c| c.get(1)) {
            atk = Some(StatValue::from_token(m.as_str()));
        }
        if let Some(m) = DEF_RE.captures(&text).and_then(|c| c.get(1)) {
            def = Some(StatValue::from_token(m.as_str()));
        }
    }

    (atk, def)
}

/// Decides whether a monster belongs to the extra deck.
///
/// | level element      | star icon      | species has 融合/シンクロ | result |
/// |--------------------|----------------|---------------------------|--------|
/// | present            | `icon_rank`    | any                       | true   |
/// | present            | other / none   | yes                       | true   |
/// | present            | other / none   | no                        | false  |
/// | absent (link)      | n/a            | any                       | true   |
fn is_extra_deck<N: DomNode>(level_elem: Option<&N>, species_text: &str) -> bool {
    let Some(level) = level_elem else {
        return true;
    };
    if level
        .query("img")
        .and_then(|img| img.attribute("src"))
        .is_some_and(|src| src.contains("icon_rank.png"))
    {
        return true;
    }

    EXTRA_DECK_SPECIES
        .iter()
        .any(|label| species_text.contains(label))
}

#[cfg(test)]
mod tests {
    use ygo_db_models::{Attribute, SpellEffectType, TrapEffectType};

    use super::*;

    const ICON_BASE: &str = "/yugiohdb/external/image/parts";

    fn page(rows: &str) -> String {
        format!("<html><head><title>t</title></head><body><div id=\"card_list\">{rows}</div></body></html>")
    }

    fn monster_row(cid: &str, attribute: &str, level_html: &str, species: &str, extra: &str) -> String {
        format!(
            r#"<div class="t_row">
  <input type="hidden" class="link_value" value="/yugiohdb/card_search.action?ope=2&cid={cid}">
  <div class="box_card_img"><img src="/yugiohdb/get_image.action?type=1&osplang=1&cid={cid}&ciid=2&enc=AbCdEf123"></div>
  <span class="card_name">テストモンスター</span>
  <span class="card_ruby">てすともんすたー</span>
  <span class="box_card_attribute"><img src="{ICON_BASE}/attribute/attribute_icon_{attribute}.png"><span>光属性</span></span>
  {level_html}
  <span class="card_info_species_and_other_item">{species}</span>
  <span class="box_card_spec"><span>攻撃力 2500</span><span>守備力 ?</span></span>
  <dd class="box_card_text">一行目<br>二行目</dd>
  {extra}
</div>"#
        )
    }

    fn spell_row(cid: &str, effect_icon: Option<&str>, kind: &str) -> String {
        let effect = effect_icon.map_or_else(String::new, |icon| {
            format!(r#"<span class="box_card_effect"><img src="{ICON_BASE}/effect/effect_icon_{icon}.png"></span>"#)
        });
        format!(
            r#"<div class="t_row">
  <input type="hidden" class="link_value" value="/yugiohdb/card_search.action?ope=2&cid={cid}">
  <span class="card_name">ＡＢＣ魔法</span>
  <span class="box_card_attribute"><img src="{ICON_BASE}/attribute/attribute_icon_{kind}.png"></span>
  {effect}
  <dd class="box_card_text">効果テキスト</dd>
</div>"#
        )
    }

    fn only_card(html: &str) -> Card {
        let parsed = parse_card_list_page(html);
        assert_eq!(parsed.rows, 1);
        assert_eq!(parsed.skipped, 0);
        parsed.cards.into_iter().next().unwrap()
    }

    const LEVEL_4: &str = r#"<span class="box_card_level_rank level"><img src="/icon_level.png"><span>レベル 4</span></span>"#;

    #[test]
    fn parses_main_deck_effect_monster() {
        let html = page(&monster_row("4007", "light", LEVEL_4, "【ドラゴン族／チューナー／効果】", ""));
        let card = only_card(&html);
        let monster = card.as_monster().unwrap();

        assert_eq!(card.card_id(), "4007");
        assert_eq!(monster.base.name, "テストモンスター");
        assert_eq!(monster.base.ruby.as_deref(), Some("てすともんすたー"));
        assert_eq!(monster.base.ciid, "2");
        assert_eq!(monster.base.images[0].img_hash, "AbCdEf123");
        assert_eq!(monster.base.text.as_deref(), Some("一行目\n二行目"));
        assert_eq!(monster.attribute, Attribute::Light);
        assert_eq!(monster.level_type, LevelType::Level);
        assert_eq!(monster.level_value, 4);
        assert_eq!(monster.race, Race::Dragon);
        assert_eq!(monster.monster_types, vec![MonsterType::Tuner, MonsterType::Effect]);
        assert_eq!(monster.atk, Some(StatValue::Number(2500)));
        assert_eq!(monster.def, Some(StatValue::Variable("?".to_owned())));
        assert_eq!(monster.link_markers, None);
        assert!(!monster.is_extra_deck);
    }

    #[test]
    fn rank_icon_overrides_level_class_and_marks_extra_deck() {
        let level = r#"<span class="box_card_level_rank level"><img src="/icon_rank.png"><span>ランク 4</span></span>"#;
        let html = page(&monster_row("100", "dark", level, "【戦士族／エクシーズ／効果】", ""));
        let monster = only_card(&html).as_monster().cloned().unwrap();

        assert_eq!(monster.level_type, LevelType::Rank);
        assert_eq!(monster.level_value, 4);
        assert!(monster.is_extra_deck);
    }

    #[test]
    fn fusion_and_synchro_species_mark_extra_deck() {
        for species in ["【魔法使い族／融合／効果】", "【機械族／シンクロ／効果】"] {
            let html = page(&monster_row("1", "earth", LEVEL_4, species, ""));
            let monster = only_card(&html).as_monster().cloned().unwrap();
            assert!(monster.is_extra_deck, "{species}");
        }
    }

    #[test]
    fn link_monster_decodes_arrow_bits() {
        let link = r#"<span class="box_card_linkmarker"><img src="/link/link137.png"><span>LINK-3</span></span>"#;
        let html = page(&monster_row("200", "dark", link, "【サイバース族／リンク／効果】", ""));
        let monster = only_card(&html).as_monster().cloned().unwrap();

        assert_eq!(monster.level_type, LevelType::Link);
        assert_eq!(monster.level_value, 3);
        assert_eq!(monster.link_markers, Some(0b0100_0101));
        assert!(monster.is_extra_deck);
    }

    #[test]
    fn unknown_race_makes_row_unparseable() {
        let html = page(&monster_row("1", "light", LEVEL_4, "【謎族／効果】", ""));
        let parsed = parse_card_list_page(&html);
        assert_eq!(parsed.rows, 1);
        assert_eq!(parsed.skipped, 1);
        assert!(parsed.cards.is_empty());
    }

    #[test]
    fn unknown_monster_type_is_dropped() {
        let html = page(&monster_row("1", "light", LEVEL_4, "【炎族／謎／効果】", ""));
        let monster = only_card(&html).as_monster().cloned().unwrap();
        assert_eq!(monster.race, Race::Pyro);
        assert_eq!(monster.monster_types, vec![MonsterType::Effect]);
    }

    #[test]
    fn pendulum_fields_and_remarks() {
        let extra = r#"<span class="box_card_pen_scale">8</span>
<span class="box_card_pen_effect">ペンデュラム<br>効果</span>
<span class="lr_icon fl_3"></span>
<dd class="box_card_text biko">注意<hr>このカードは公式のデュエルでは使用できません。</dd>"#;
        let html = page(&monster_row("300", "wind", LEVEL_4, "【鳥獣族／ペンデュラム／効果】", extra));
        let monster = only_card(&html).as_monster().cloned().unwrap();

        assert_eq!(monster.pendulum_scale, Some(8));
        assert_eq!(monster.pendulum_text.as_deref(), Some("ペンデュラム\n効果"));
        assert_eq!(monster.base.limit_regulation, Some(LimitRegulation::SemiLimited));
        assert_eq!(
            monster.base.biko.as_deref(),
            Some("注意このカードは公式のデュエルでは使用できません。")
        );
        assert!(monster.base.is_not_legal_for_official);
        assert_eq!(monster.base.text.as_deref(), Some("一行目\n二行目"));
    }

    #[test]
    fn spell_and_trap_effect_icons() {
        let rows = [
            spell_row("10", Some("quickplay"), "spell"),
            spell_row("11", None, "spell"),
            spell_row("12", Some("counter"), "trap"),
        ]
        .concat();
        let parsed = parse_card_list_page(&page(&rows));
        assert_eq!(parsed.cards.len(), 3);

        let Card::Spell(quick) = &parsed.cards[0] else {
            panic!("expected spell");
        };
        assert_eq!(quick.effect_type, SpellEffectType::Quick);
        assert_eq!(quick.base.normalized_name, "abc魔法");
        assert_eq!(quick.base.ciid, "1");
        assert_eq!(quick.base.images[0].img_hash, "10_1_1_1");

        let Card::Spell(normal) = &parsed.cards[1] else {
            panic!("expected spell");
        };
        assert_eq!(normal.effect_type, SpellEffectType::Normal);

        let Card::Trap(counter) = &parsed.cards[2] else {
            panic!("expected trap");
        };
        assert_eq!(counter.effect_type, TrapEffectType::Counter);
    }

    #[test]
    fn row_without_card_id_is_skipped() {
        let row = r#"<div class="t_row"><span class="card_name">x</span>
<span class="box_card_attribute"><img src="/attribute_icon_spell.png"></span></div>"#;
        let parsed = parse_card_list_page(&page(row));
        assert_eq!(parsed.rows, 1);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn image_info_handles_escaped_ampersands() {
        let html = r#"<img src="get_image.action?type=1&amp;cid=55&amp;ciid=3&amp;enc=xyz">"#;
        let info = extract_image_info(html);
        assert_eq!(
            info.get("55"),
            Some(&ImageInfo {
                ciid: Some("3".to_owned()),
                img_hash: Some("xyz".to_owned()),
            })
        );
    }

    #[test]
    fn link_marker_bits() {
        assert_eq!(decode_link_markers("28"), 0b1000_0010);
        assert_eq!(decode_link_markers("5"), 0);
        assert_eq!(decode_link_markers("12346789"), 0b1_1110_1111);
    }
}
