//! Maps site-specific tokens to the canonical enums in [`ygo_db_models`].
//!
//! The site encodes attributes and spell/trap icons in image file names and
//! writes races and monster types in Japanese. Every table here is a
//! constant; lookups return `None` for anything unrecognized and the caller
//! decides whether that makes the record unparseable.

use ygo_db_models::{Attribute, MonsterType, Race, SpellEffectType, TrapEffectType};

// ── Attribute ─────────────────────────────────────────────────────────

const ATTRIBUTES: &[(&str, Attribute)] = &[
    ("light", Attribute::Light),
    ("dark", Attribute::Dark),
    ("water", Attribute::Water),
    ("fire", Attribute::Fire),
    ("earth", Attribute::Earth),
    ("wind", Attribute::Wind),
    ("divine", Attribute::Divine),
];

/// Maps the `attribute_icon_<token>.png` token to an [`Attribute`].
#[must_use]
pub fn map_attribute(token: &str) -> Option<Attribute> {
    lookup(ATTRIBUTES, token)
}

// ── Race ──────────────────────────────────────────────────────────────

const RACES: &[(&str, Race)] = &[
    ("魔法使い族", Race::Spellcaster),
    ("ドラゴン族", Race::Dragon),
    ("アンデット族", Race::Zombie),
    ("戦士族", Race::Warrior),
    ("獣戦士族", Race::BeastWarrior),
    ("獣族", Race::Beast),
    ("鳥獣族", Race::WindBeast),
    ("悪魔族", Race::Fiend),
    ("天使族", Race::Fairy),
    ("昆虫族", Race::Insect),
    ("恐竜族", Race::Dinosaur),
    ("爬虫類族", Race::Reptile),
    ("魚族", Race::Fish),
    ("海竜族", Race::SeaSerpent),
    ("水族", Race::Aqua),
    ("炎族", Race::Pyro),
    ("雷族", Race::Thunder),
    ("岩石族", Race::Rock),
    ("植物族", Race::Plant),
    ("機械族", Race::Machine),
    ("サイキック族", Race::Psychic),
    ("幻神獣族", Race::Divine),
    ("創造神族", Race::CreatorGod),
    ("幻竜族", Race::Wyrm),
    ("サイバース族", Race::Cyberse),
    ("幻想魔族", Race::Illusion),
];

/// Maps a Japanese race label (e.g. `ドラゴン族`) to a [`Race`].
#[must_use]
pub fn map_race(label: &str) -> Option<Race> {
    lookup(RACES, label)
}

// ── Monster type ──────────────────────────────────────────────────────

const MONSTER_TYPES: &[(&str, MonsterType)] = &[
    ("通常", MonsterType::Normal),
    ("効果", MonsterType::Effect),
    ("儀式", MonsterType::Ritual),
    ("融合", MonsterType::Fusion),
    ("シンクロ", MonsterType::Synchro),
    ("エクシーズ", MonsterType::Xyz),
    ("トゥーン", MonsterType::Toon),
    ("スピリット", MonsterType::Spirit),
    ("ユニオン", MonsterType::Union),
    ("デュアル", MonsterType::Gemini),
    ("チューナー", MonsterType::Tuner),
    ("リバース", MonsterType::Flip),
    ("ペンデュラム", MonsterType::Pendulum),
    ("特殊召喚", MonsterType::Special),
    ("リンク", MonsterType::Link),
];

/// Maps a Japanese monster type label (e.g. `チューナー`) to a
/// [`MonsterType`].
#[must_use]
pub fn map_monster_type(label: &str) -> Option<MonsterType> {
    lookup(MONSTER_TYPES, label)
}

// ── Spell / trap icons ────────────────────────────────────────────────

const SPELL_EFFECTS: &[(&str, SpellEffectType)] = &[
    ("quickplay", SpellEffectType::Quick),
    ("continuous", SpellEffectType::Continuous),
    ("equip", SpellEffectType::Equip),
    ("field", SpellEffectType::Field),
    ("ritual", SpellEffectType::Ritual),
];

const TRAP_EFFECTS: &[(&str, TrapEffectType)] = &[
    ("continuous", TrapEffectType::Continuous),
    ("counter", TrapEffectType::Counter),
];

/// Maps the `effect_icon_<token>.png` token of a spell card. Spells without
/// an icon (or with an unknown one) are normal spells.
#[must_use]
pub fn map_spell_effect(token: Option<&str>) -> SpellEffectType {
    token
        .and_then(|t| lookup(SPELL_EFFECTS, t))
        .unwrap_or_default()
}

/// Maps the `effect_icon_<token>.png` token of a trap card. Traps without
/// an icon (or with an unknown one) are normal traps.
#[must_use]
pub fn map_trap_effect(token: Option<&str>) -> TrapEffectType {
    token
        .and_then(|t| lookup(TRAP_EFFECTS, t))
        .unwrap_or_default()
}

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table
        .iter()
        .find_map(|(k, v)| if *k == key { Some(*v) } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_race_has_exactly_one_label() {
        for race in Race::all() {
            let count = RACES.iter().filter(|(_, r)| r == race).count();
            assert_eq!(count, 1, "{race} should have one label");
        }
    }

    #[test]
    fn similar_race_labels_do_not_collide() {
        assert_eq!(map_race("獣族"), Some(Race::Beast));
        assert_eq!(map_race("獣戦士族"), Some(Race::BeastWarrior));
        assert_eq!(map_race("鳥獣族"), Some(Race::WindBeast));
        assert_eq!(map_race("水族"), Some(Race::Aqua));
        assert_eq!(map_race("海竜族"), Some(Race::SeaSerpent));
        assert_eq!(map_race("幻竜族"), Some(Race::Wyrm));
        assert_eq!(map_race("ドラゴン"), None);
    }

    #[test]
    fn monster_types_map_by_exact_label() {
        assert_eq!(map_monster_type("デュアル"), Some(MonsterType::Gemini));
        assert_eq!(map_monster_type("リバース"), Some(MonsterType::Flip));
        assert_eq!(map_monster_type("特殊召喚"), Some(MonsterType::Special));
        assert_eq!(map_monster_type("効果モンスター"), None);
    }

    #[test]
    fn attributes_map_from_icon_tokens() {
        assert_eq!(map_attribute("divine"), Some(Attribute::Divine));
        assert_eq!(map_attribute("LIGHT"), None);
    }

    #[test]
    fn spell_and_trap_icons_default_to_normal() {
        assert_eq!(map_spell_effect(Some("quickplay")), SpellEffectType::Quick);
        assert_eq!(map_spell_effect(Some("counter")), SpellEffectType::Normal);
        assert_eq!(map_spell_effect(None), SpellEffectType::Normal);
        assert_eq!(map_trap_effect(Some("counter")), TrapEffectType::Counter);
        assert_eq!(map_trap_effect(Some("equip")), TrapEffectType::Normal);
    }
}
