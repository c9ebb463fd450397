//! Column schemas and record encoders for every dataset kind.
//!
//! Each record kind has one fixed, ordered column list. Cards are a sum type
//! but still occupy every column: the schema is split into sections and each
//! variant fills only its own section, the rest are padded with empty
//! strings. Decoding indexes columns with bounds checks so rows written by an
//! older, narrower schema read as if their trailing fields were empty.

use std::str::FromStr;

use ygo_db_models::{
    Card, CardBase, CardSupplement, CardType, FaqEntry, FaqListEntry, ImageRef, MonsterCard,
    MonsterType, SpellCard, StatValue, TrapCard,
};

use crate::TsvError;

/// A record kind with a fixed TSV layout.
pub trait TsvRecord: Sized {
    /// Column names, in order.
    const HEADER: &'static [&'static str];

    /// Name of the column holding the record's id.
    const ID_COLUMN: &'static str;

    /// The record's id.
    fn id(&self) -> &str;

    /// Decoded (unescaped) field values, exactly `HEADER.len()` long.
    fn to_fields(&self) -> Vec<String>;

    /// Builds a record from decoded field values. Missing trailing fields
    /// read as empty.
    ///
    /// # Errors
    ///
    /// Returns [`TsvError::InvalidField`] if a required field is empty or
    /// holds a value outside its enumeration.
    fn from_fields(fields: &[String]) -> Result<Self, TsvError>;
}

/// Bounds-checked column access; out-of-range columns read as `""`.
#[must_use]
pub fn field(fields: &[String], index: usize) -> &str {
    fields.get(index).map_or("", String::as_str)
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn opt_to_string<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

fn parse_enum<T: FromStr>(header: &[&str], fields: &[String], index: usize) -> Result<T, TsvError> {
    let value = field(fields, index);
    T::from_str(value).map_err(|_| invalid(header, index, value))
}

fn parse_opt_number<T: FromStr>(
    header: &[&str],
    fields: &[String],
    index: usize,
) -> Result<Option<T>, TsvError> {
    let value = field(fields, index);
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| invalid(header, index, value))
}

fn parse_json_list<T: serde::de::DeserializeOwned>(
    header: &[&str],
    fields: &[String],
    index: usize,
) -> Result<Vec<T>, TsvError> {
    let value = field(fields, index);
    if value.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(value).map_err(|_| invalid(header, index, value))
}

fn invalid(header: &[&str], index: usize, value: &str) -> TsvError {
    TsvError::InvalidField {
        column: header.get(index).copied().unwrap_or("?").to_owned(),
        value: value.to_owned(),
    }
}

// ── Cards ─────────────────────────────────────────────────────────────

const COMMON_COLUMNS: &[&str] = &[
    "cardType",
    "name",
    "nameModified",
    "ruby",
    "cardId",
    "ciid",
    "imgs",
    "text",
    "biko",
    "isNotLegalForOfficial",
];

const MONSTER_COLUMNS: &[&str] = &[
    "attribute",
    "levelType",
    "levelValue",
    "race",
    "monsterTypes",
    "atk",
    "def",
    "linkMarkers",
    "pendulumScale",
    "pendulumText",
    "isExtraDeck",
];

const SPELL_COLUMNS: &[&str] = &["spellEffectType"];

const TRAP_COLUMNS: &[&str] = &["trapEffectType"];

/// Variant-specific column sections, in file order. A card fills the
/// section matching its type and pads every other section.
const CARD_SECTIONS: &[(CardType, &[&str])] = &[
    (CardType::Monster, MONSTER_COLUMNS),
    (CardType::Spell, SPELL_COLUMNS),
    (CardType::Trap, TRAP_COLUMNS),
];

/// Full 23-column card header.
pub const CARD_HEADER: &[&str] = &[
    "cardType",
    "name",
    "nameModified",
    "ruby",
    "cardId",
    "ciid",
    "imgs",
    "text",
    "biko",
    "isNotLegalForOfficial",
    "attribute",
    "levelType",
    "levelValue",
    "race",
    "monsterTypes",
    "atk",
    "def",
    "linkMarkers",
    "pendulumScale",
    "pendulumText",
    "isExtraDeck",
    "spellEffectType",
    "trapEffectType",
];

fn section_offset(card_type: CardType) -> usize {
    let mut offset = COMMON_COLUMNS.len();
    for (kind, columns) in CARD_SECTIONS {
        if *kind == card_type {
            return offset;
        }
        offset += columns.len();
    }
    offset
}

fn common_fields(card_type: CardType, base: &CardBase) -> Vec<String> {
    vec![
        card_type.to_string(),
        base.name.clone(),
        base.normalized_name.clone(),
        base.ruby.clone().unwrap_or_default(),
        base.card_id.clone(),
        base.ciid.clone(),
        serde_json::to_string(&base.images).unwrap_or_else(|_| "[]".to_owned()),
        base.text.clone().unwrap_or_default(),
        base.biko.clone().unwrap_or_default(),
        base.is_not_legal_for_official.to_string(),
    ]
}

fn monster_fields(monster: &MonsterCard) -> Vec<String> {
    vec![
        monster.attribute.to_string(),
        monster.level_type.to_string(),
        monster.level_value.to_string(),
        monster.race.to_string(),
        serde_json::to_string(&monster.monster_types).unwrap_or_else(|_| "[]".to_owned()),
        opt_to_string(monster.atk.as_ref()),
        opt_to_string(monster.def.as_ref()),
        opt_to_string(monster.link_markers.as_ref()),
        opt_to_string(monster.pendulum_scale.as_ref()),
        monster.pendulum_text.clone().unwrap_or_default(),
        monster.is_extra_deck.to_string(),
    ]
}

fn decode_base(fields: &[String]) -> Result<CardBase, TsvError> {
    let card_id = field(fields, 4);
    if card_id.is_empty() {
        return Err(invalid(CARD_HEADER, 4, card_id));
    }
    let images: Vec<ImageRef> = parse_json_list(CARD_HEADER, fields, 6)?;

    Ok(CardBase {
        name: field(fields, 1).to_owned(),
        normalized_name: field(fields, 2).to_owned(),
        ruby: optional(field(fields, 3)),
        card_id: card_id.to_owned(),
        ciid: field(fields, 5).to_owned(),
        images,
        text: optional(field(fields, 7)),
        limit_regulation: None,
        biko: optional(field(fields, 8)),
        is_not_legal_for_official: field(fields, 9) == "true",
    })
}

fn decode_monster(base: CardBase, fields: &[String], at: usize) -> Result<MonsterCard, TsvError> {
    let h = CARD_HEADER;
    let level_value = field(fields, at + 2);
    let level_value = level_value
        .parse()
        .map_err(|_| invalid(h, at + 2, level_value))?;
    let monster_types: Vec<MonsterType> = parse_json_list(h, fields, at + 4)?;
    let stat = |i: usize| optional(field(fields, i)).map(|v| StatValue::from_token(&v));

    Ok(MonsterCard {
        base,
        attribute: parse_enum(h, fields, at)?,
        level_type: parse_enum(h, fields, at + 1)?,
        level_value,
        race: parse_enum(h, fields, at + 3)?,
        monster_types,
        atk: stat(at + 5),
        def: stat(at + 6),
        link_markers: parse_opt_number(h, fields, at + 7)?,
        pendulum_scale: parse_opt_number(h, fields, at + 8)?,
        pendulum_text: optional(field(fields, at + 9)),
        is_extra_deck: field(fields, at + 10) == "true",
    })
}

/// Parses an effect-type column, treating an empty value as the default.
fn parse_effect<T: FromStr + Default>(fields: &[String], index: usize) -> Result<T, TsvError> {
    if field(fields, index).is_empty() {
        Ok(T::default())
    } else {
        parse_enum(CARD_HEADER, fields, index)
    }
}

impl TsvRecord for Card {
    const HEADER: &'static [&'static str] = CARD_HEADER;
    const ID_COLUMN: &'static str = "cardId";

    fn id(&self) -> &str {
        self.card_id()
    }

    fn to_fields(&self) -> Vec<String> {
        let card_type = self.card_type();
        let mut fields = common_fields(card_type, self.base());

        for (kind, columns) in CARD_SECTIONS {
            if *kind != card_type {
                fields.extend(std::iter::repeat_n(String::new(), columns.len()));
                continue;
            }
            match self {
                Self::Monster(m) => fields.extend(monster_fields(m)),
                Self::Spell(s) => fields.push(s.effect_type.to_string()),
                Self::Trap(t) => fields.push(t.effect_type.to_string()),
            }
        }

        fields
    }

    fn from_fields(fields: &[String]) -> Result<Self, TsvError> {
        let card_type: CardType = parse_enum(CARD_HEADER, fields, 0)?;
        let base = decode_base(fields)?;
        let at = section_offset(card_type);

        Ok(match card_type {
            CardType::Monster => Self::Monster(decode_monster(base, fields, at)?),
            CardType::Spell => Self::Spell(SpellCard {
                base,
                effect_type: parse_effect(fields, at)?,
            }),
            CardType::Trap => Self::Trap(TrapCard {
                base,
                effect_type: parse_effect(fields, at)?,
            }),
        })
    }
}

// ── FAQ ───────────────────────────────────────────────────────────────

pub const FAQ_HEADER: &[&str] = &["faqId", "question", "answer", "updatedAt"];

impl TsvRecord for FaqEntry {
    const HEADER: &'static [&'static str] = FAQ_HEADER;
    const ID_COLUMN: &'static str = "faqId";

    fn id(&self) -> &str {
        &self.faq_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.faq_id.clone(),
            self.question.clone(),
            self.answer.clone(),
            self.updated_at.clone().unwrap_or_default(),
        ]
    }

    fn from_fields(fields: &[String]) -> Result<Self, TsvError> {
        let faq_id = field(fields, 0);
        if faq_id.is_empty() {
            return Err(invalid(FAQ_HEADER, 0, faq_id));
        }
        Ok(Self {
            faq_id: faq_id.to_owned(),
            question: field(fields, 1).to_owned(),
            answer: field(fields, 2).to_owned(),
            updated_at: optional(field(fields, 3)),
        })
    }
}

// ── Card supplements ──────────────────────────────────────────────────

pub const SUPPLEMENT_HEADER: &[&str] = &[
    "cardId",
    "cardName",
    "supplementInfo",
    "supplementDate",
    "pendulumSupplementInfo",
    "pendulumSupplementDate",
];

impl TsvRecord for CardSupplement {
    const HEADER: &'static [&'static str] = SUPPLEMENT_HEADER;
    const ID_COLUMN: &'static str = "cardId";

    fn id(&self) -> &str {
        &self.card_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.card_id.clone(),
            self.card_name.clone(),
            self.supplement_info.clone().unwrap_or_default(),
            self.supplement_date.clone().unwrap_or_default(),
            self.pendulum_supplement_info.clone().unwrap_or_default(),
            self.pendulum_supplement_date.clone().unwrap_or_default(),
        ]
    }

    fn from_fields(fields: &[String]) -> Result<Self, TsvError> {
        let card_id = field(fields, 0);
        if card_id.is_empty() {
            return Err(invalid(SUPPLEMENT_HEADER, 0, card_id));
        }
        Ok(Self {
            card_id: card_id.to_owned(),
            card_name: field(fields, 1).to_owned(),
            supplement_info: optional(field(fields, 2)),
            supplement_date: optional(field(fields, 3)),
            pendulum_supplement_info: optional(field(fields, 4)),
            pendulum_supplement_date: optional(field(fields, 5)),
        })
    }
}

// ── FAQ id list ───────────────────────────────────────────────────────

pub const FAQ_LIST_HEADER: &[&str] = &["faqId"];

impl TsvRecord for FaqListEntry {
    const HEADER: &'static [&'static str] = FAQ_LIST_HEADER;
    const ID_COLUMN: &'static str = "faqId";

    fn id(&self) -> &str {
        &self.faq_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![self.faq_id.clone()]
    }

    fn from_fields(fields: &[String]) -> Result<Self, TsvError> {
        let faq_id = field(fields, 0);
        if faq_id.is_empty() {
            return Err(invalid(FAQ_LIST_HEADER, 0, faq_id));
        }
        Ok(Self {
            faq_id: faq_id.to_owned(),
        })
    }
}
