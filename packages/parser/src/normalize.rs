//! Card name normalization for search.
//!
//! The folded form is deterministic and idempotent, and is never used for
//! identity (the card id is).

use regex::Regex;
use std::sync::LazyLock;

/// Symbols that carry no meaning for search, in both half- and full-width
/// forms.
const STRIPPED_SYMBOLS: &str = "・★☆※‼！？。、,.，．:：;；「」『』【】〔〕（）()［］[]｛｝{}〈〉《》〜～~-－_＿/／\\＼|｜&＆@＠#＃$＄%％^＾*＊+＋=＝<＜>＞'\"‘’“”`´｀";

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\u{3000}]+").expect("valid regex"));

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[{}]+", regex::escape(STRIPPED_SYMBOLS))).expect("valid regex")
});

/// Variant kanji folded to a single form.
const KANJI_VARIANTS: &[(char, char)] = &[('竜', '龍'), ('剣', '劍')];

/// Folds a card name into its search form.
///
/// The pipeline:
/// 1. Remove all whitespace (including the ideographic space)
/// 2. Strip punctuation and symbols
/// 3. Fold variant kanji (竜→龍, 剣→劍)
/// 4. Full-width ASCII letters and digits to half-width
/// 5. Lowercase
/// 6. Hiragana to katakana
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let no_space = WHITESPACE_RE.replace_all(name, "");
    let no_symbols = SYMBOL_RE.replace_all(&no_space, "");

    no_symbols
        .chars()
        .map(fold_kanji)
        .map(to_half_width)
        .flat_map(char::to_lowercase)
        .map(hiragana_to_katakana)
        .collect()
}

fn fold_kanji(c: char) -> char {
    KANJI_VARIANTS
        .iter()
        .find_map(|&(from, to)| (from == c).then_some(to))
        .unwrap_or(c)
}

fn to_half_width(c: char) -> char {
    match c {
        'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
            char::from_u32(u32::from(c) - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

fn hiragana_to_katakana(c: char) -> char {
    match c {
        '\u{3041}'..='\u{3096}' => char::from_u32(u32::from(c) + 0x60).unwrap_or(c),
        _ => c,
    }
}

/// Phrases in a card's remarks meaning it cannot be used in official play.
const NOT_LEGAL_PHRASES: &[&str] = &["公式のデュエルでは使用できません", "公式大会で使用できません"];

/// Lowercased English phrases with the same meaning.
const NOT_LEGAL_PHRASES_EN: &[&str] = &["cannot be used in official", "not legal for official"];

/// Whether the remarks text marks a card as not legal for official play.
#[must_use]
pub fn is_not_legal_for_official(remarks: &str) -> bool {
    if NOT_LEGAL_PHRASES.iter().any(|p| remarks.contains(p)) {
        return true;
    }
    let lower = remarks.to_lowercase();
    NOT_LEGAL_PHRASES_EN.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_symbols() {
        assert_eq!(normalize_name("青眼の白龍 ・ 「極」"), "青眼ノ白龍極");
        assert_eq!(normalize_name("Blue-Eyes　White Dragon"), "blueeyeswhitedragon");
    }

    #[test]
    fn folds_variant_kanji() {
        assert_eq!(normalize_name("竜の剣"), normalize_name("龍の劍"));
    }

    #[test]
    fn folds_full_width_ascii() {
        assert_eq!(normalize_name("ＡＢＣ１２３"), "abc123");
        assert_eq!(
            normalize_name("Ｂｌｕｅ－Ｅｙｅｓ　Ｗｈｉｔｅ　Ｄｒａｇｏｎ"),
            "blueeyeswhitedragon"
        );
    }

    #[test]
    fn folds_hiragana_to_katakana() {
        assert_eq!(normalize_name("ぶらっく"), "ブラック");
        assert_eq!(normalize_name("ゔ"), "ヴ");
    }

    #[test]
    fn is_idempotent() {
        for name in [
            "E・HERO ネオス",
            "ＳＲ ベイゴマックス",
            "剛鬼ザ・グレート・オーガ",
            "No.39 希望皇ホープ",
            "“Infinite Impermanence”",
        ] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once, "{name}");
        }
    }

    #[test]
    fn detects_not_legal_remarks() {
        assert!(is_not_legal_for_official(
            "このカードは公式のデュエルでは使用できません。"
        ));
        assert!(is_not_legal_for_official("This card CANNOT be used in Official events."));
        assert!(!is_not_legal_for_official("このカードは「E・HERO」カードとしても扱う。"));
    }
}
