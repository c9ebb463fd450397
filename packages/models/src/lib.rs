#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Record types produced by the card database scraper.
//!
//! A search-result row becomes a [`Card`] (a sum type over monster, spell
//! and trap cards sharing a [`CardBase`]). FAQ detail pages become
//! [`FaqEntry`] records and card Q&A pages become [`CardSupplement`]
//! records. Records are immutable once parsed; only the on-disk datasets
//! they are merged into change over time.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Top-level card kind, used as the discriminator column of the cards
/// dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardType {
    /// Monster card
    Monster,
    /// Spell card
    Spell,
    /// Trap card
    Trap,
}

/// Monster attribute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Attribute {
    Light,
    Dark,
    Water,
    Fire,
    Earth,
    Wind,
    Divine,
}

/// How a monster's star value is expressed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LevelType {
    /// Main deck and fusion/synchro/ritual monsters
    Level,
    /// Xyz monsters
    Rank,
    /// Link monsters (the value is the link rating)
    Link,
}

/// Monster race ("species").
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Race {
    Dragon,
    Warrior,
    Spellcaster,
    Fairy,
    Fiend,
    Zombie,
    Machine,
    Aqua,
    Pyro,
    Rock,
    /// Winged Beast
    WindBeast,
    Plant,
    Insect,
    Thunder,
    Beast,
    BeastWarrior,
    Dinosaur,
    Fish,
    SeaSerpent,
    Reptile,
    Psychic,
    /// Divine-Beast
    Divine,
    CreatorGod,
    Wyrm,
    Cyberse,
    Illusion,
}

impl Race {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Dragon,
            Self::Warrior,
            Self::Spellcaster,
            Self::Fairy,
            Self::Fiend,
            Self::Zombie,
            Self::Machine,
            Self::Aqua,
            Self::Pyro,
            Self::Rock,
            Self::WindBeast,
            Self::Plant,
            Self::Insect,
            Self::Thunder,
            Self::Beast,
            Self::BeastWarrior,
            Self::Dinosaur,
            Self::Fish,
            Self::SeaSerpent,
            Self::Reptile,
            Self::Psychic,
            Self::Divine,
            Self::CreatorGod,
            Self::Wyrm,
            Self::Cyberse,
            Self::Illusion,
        ]
    }
}

/// Monster sub-type tags. A monster carries an ordered list of these.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MonsterType {
    Normal,
    Effect,
    Fusion,
    Ritual,
    Synchro,
    Xyz,
    Pendulum,
    Link,
    Tuner,
    Spirit,
    Union,
    /// Gemini (dual) monsters
    Gemini,
    Flip,
    Toon,
    /// Special summon only
    Special,
}

/// Spell card icon type.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpellEffectType {
    #[default]
    Normal,
    /// Quick-play
    Quick,
    Continuous,
    Equip,
    Field,
    Ritual,
}

/// Trap card icon type.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrapEffectType {
    #[default]
    Normal,
    Continuous,
    Counter,
}

/// Forbidden/limited list status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LimitRegulation {
    Forbidden,
    Limited,
    SemiLimited,
}

/// One artwork variant of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Image variant id.
    pub ciid: String,
    /// Opaque image hash from the `enc=` query parameter.
    pub img_hash: String,
}

/// ATK or DEF value. Some cards print `?` or `X` instead of a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(u32),
    Variable(String),
}

impl StatValue {
    /// Interprets a raw token: all-digit tokens become [`StatValue::Number`],
    /// anything else is kept verbatim.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if !token.is_empty()
            && token.bytes().all(|b| b.is_ascii_digit())
            && let Ok(n) = token.parse()
        {
            return Self::Number(n);
        }
        Self::Variable(token.to_owned())
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Variable(s) => f.write_str(s),
        }
    }
}

/// Fields shared by every card variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBase {
    /// Display name.
    pub name: String,
    /// Search-friendly folded form of `name`. Never used for identity.
    pub normalized_name: String,
    /// Phonetic reading.
    pub ruby: Option<String>,
    /// Stable numeric identifier, kept as a string.
    pub card_id: String,
    /// Primary image variant id.
    pub ciid: String,
    /// All known artwork variants, in page order.
    pub images: Vec<ImageRef>,
    /// Effect or flavor text with line breaks as `\n`.
    pub text: Option<String>,
    /// Forbidden/limited status. Not persisted in the cards dataset.
    pub limit_regulation: Option<LimitRegulation>,
    /// Remarks text.
    pub biko: Option<String>,
    /// Derived from `biko`: the remarks say the card cannot be used in
    /// official play.
    pub is_not_legal_for_official: bool,
}

/// Monster-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterCard {
    #[serde(flatten)]
    pub base: CardBase,
    pub attribute: Attribute,
    pub level_type: LevelType,
    /// Level, rank, or link rating depending on `level_type`.
    pub level_value: u32,
    pub race: Race,
    pub monster_types: Vec<MonsterType>,
    pub atk: Option<StatValue>,
    pub def: Option<StatValue>,
    /// Bit `n - 1` is set when the link arrow in direction `n` is present.
    /// Directions follow the numeric keypad, so bit 4 (direction 5) is never
    /// set.
    pub link_markers: Option<u16>,
    pub pendulum_scale: Option<u32>,
    pub pendulum_text: Option<String>,
    pub is_extra_deck: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCard {
    #[serde(flatten)]
    pub base: CardBase,
    pub effect_type: SpellEffectType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrapCard {
    #[serde(flatten)]
    pub base: CardBase,
    pub effect_type: TrapEffectType,
}

/// A parsed card, tagged by [`CardType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cardType", rename_all = "lowercase")]
pub enum Card {
    Monster(MonsterCard),
    Spell(SpellCard),
    Trap(TrapCard),
}

impl Card {
    /// Returns the discriminator for this card.
    #[must_use]
    pub const fn card_type(&self) -> CardType {
        match self {
            Self::Monster(_) => CardType::Monster,
            Self::Spell(_) => CardType::Spell,
            Self::Trap(_) => CardType::Trap,
        }
    }

    /// Returns the fields shared by all variants.
    #[must_use]
    pub const fn base(&self) -> &CardBase {
        match self {
            Self::Monster(m) => &m.base,
            Self::Spell(s) => &s.base,
            Self::Trap(t) => &t.base,
        }
    }

    #[must_use]
    pub fn card_id(&self) -> &str {
        &self.base().card_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// Returns the monster fields, if this is a monster.
    #[must_use]
    pub const fn as_monster(&self) -> Option<&MonsterCard> {
        match self {
            Self::Monster(m) => Some(m),
            _ => None,
        }
    }
}

/// One FAQ question/answer pair.
///
/// Card references inside `question` and `answer` are inlined as
/// `{{name|cardId}}` template tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqEntry {
    pub faq_id: String,
    pub question: String,
    /// Empty when the page has no answer block.
    pub answer: String,
    /// Lexically comparable date string (`YYYY-MM-DD`).
    pub updated_at: Option<String>,
}

/// Official supplementary text attached to a card (its Q&A page header).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSupplement {
    pub card_id: String,
    pub card_name: String,
    pub supplement_info: Option<String>,
    pub supplement_date: Option<String>,
    pub pendulum_supplement_info: Option<String>,
    pub pendulum_supplement_date: Option<String>,
}

impl CardSupplement {
    /// Whether either supplement block carried text.
    #[must_use]
    pub const fn has_any_supplement(&self) -> bool {
        self.supplement_info.is_some() || self.pendulum_supplement_info.is_some()
    }
}

/// A row of the flat FAQ id list dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqListEntry {
    pub faq_id: String,
}
