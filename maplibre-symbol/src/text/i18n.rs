//! Unicode script properties relevant for line breaking, letter spacing and vertical text.

macro_rules! in_ranges {
    ($chr:expr, $($range:expr),+ $(,)?) => {
        { let c = $chr as u32; false $(|| ($range).contains(&c))+ }
    };
}

const BOPOMOFO_EXTENDED: std::ops::RangeInclusive<u32> = 0x31A0..=0x31BF;
const BOPOMOFO: std::ops::RangeInclusive<u32> = 0x3100..=0x312F;
const CJK_COMPATIBILITY_FORMS: std::ops::RangeInclusive<u32> = 0xFE30..=0xFE4F;
const CJK_COMPATIBILITY_IDEOGRAPHS: std::ops::RangeInclusive<u32> = 0xF900..=0xFAFF;
const CJK_COMPATIBILITY: std::ops::RangeInclusive<u32> = 0x3300..=0x33FF;
const CJK_RADICALS_SUPPLEMENT: std::ops::RangeInclusive<u32> = 0x2E80..=0x2EFF;
const CJK_STROKES: std::ops::RangeInclusive<u32> = 0x31C0..=0x31EF;
const CJK_SYMBOLS_AND_PUNCTUATION: std::ops::RangeInclusive<u32> = 0x3000..=0x303F;
const CJK_UNIFIED_IDEOGRAPHS_EXTENSION_A: std::ops::RangeInclusive<u32> = 0x3400..=0x4DBF;
const CJK_UNIFIED_IDEOGRAPHS: std::ops::RangeInclusive<u32> = 0x4E00..=0x9FFF;
const ENCLOSED_CJK_LETTERS_AND_MONTHS: std::ops::RangeInclusive<u32> = 0x3200..=0x32FF;
const HALFWIDTH_AND_FULLWIDTH_FORMS: std::ops::RangeInclusive<u32> = 0xFF00..=0xFFEF;
const HIRAGANA: std::ops::RangeInclusive<u32> = 0x3040..=0x309F;
const IDEOGRAPHIC_DESCRIPTION_CHARACTERS: std::ops::RangeInclusive<u32> = 0x2FF0..=0x2FFF;
const KANGXI_RADICALS: std::ops::RangeInclusive<u32> = 0x2F00..=0x2FDF;
const KATAKANA_PHONETIC_EXTENSIONS: std::ops::RangeInclusive<u32> = 0x31F0..=0x31FF;
const KATAKANA: std::ops::RangeInclusive<u32> = 0x30A0..=0x30FF;
const VERTICAL_FORMS: std::ops::RangeInclusive<u32> = 0xFE10..=0xFE1F;
const YI_RADICALS: std::ops::RangeInclusive<u32> = 0xA490..=0xA4CF;
const YI_SYLLABLES: std::ops::RangeInclusive<u32> = 0xA000..=0xA48F;
const HANGUL_COMPATIBILITY_JAMO: std::ops::RangeInclusive<u32> = 0x3130..=0x318F;
const HANGUL_JAMO_EXTENDED_A: std::ops::RangeInclusive<u32> = 0xA960..=0xA97F;
const HANGUL_JAMO_EXTENDED_B: std::ops::RangeInclusive<u32> = 0xD7B0..=0xD7FF;
const HANGUL_JAMO: std::ops::RangeInclusive<u32> = 0x1100..=0x11FF;
const HANGUL_SYLLABLES: std::ops::RangeInclusive<u32> = 0xAC00..=0xD7AF;
const KANBUN: std::ops::RangeInclusive<u32> = 0x3190..=0x319F;
const SMALL_FORM_VARIANTS: std::ops::RangeInclusive<u32> = 0xFE50..=0xFE6F;
const UNIFIED_CANADIAN_ABORIGINAL_SYLLABICS: std::ops::RangeInclusive<u32> = 0x1400..=0x167F;
const UNIFIED_CANADIAN_ABORIGINAL_SYLLABICS_EXTENDED: std::ops::RangeInclusive<u32> =
    0x18B0..=0x18FF;
const YIJING_HEXAGRAM_SYMBOLS: std::ops::RangeInclusive<u32> = 0x4DC0..=0x4DFF;

pub fn allows_word_breaking(chr: char) -> bool {
    matches!(
        chr,
        '\u{0a}'      /* newline */
        | '\u{20}'    /* space */
        | '\u{26}'    /* ampersand */
        | '\u{28}'    /* open parenthesis */
        | '\u{29}'    /* close parenthesis */
        | '\u{2b}'    /* plus sign */
        | '\u{2d}'    /* hyphen-minus */
        | '\u{2f}'    /* solidus */
        | '\u{ad}'    /* soft hyphen */
        | '\u{b7}'    /* middle dot */
        | '\u{200b}'  /* zero-width space */
        | '\u{2010}'  /* hyphen */
        | '\u{2013}' /* en dash */
    )
}

/// Letter spacing breaks the joining of Arabic script.
pub fn char_allows_letter_spacing(chr: char) -> bool {
    !in_ranges!(
        chr,
        0x0600..=0x06FF, // Arabic
        0x0750..=0x077F, // Arabic Supplement
        0x08A0..=0x08FF, // Arabic Extended-A
        0xFB50..=0xFDFF, // Arabic Presentation Forms-A
        0xFE70..=0xFEFF, // Arabic Presentation Forms-B
    )
}

pub fn allows_letter_spacing(string: &str) -> bool {
    string.chars().all(char_allows_letter_spacing)
}

pub fn allows_ideographic_breaking(chr: char) -> bool {
    // Return early for characters outside all ideographic ranges.
    if (chr as u32) < 0x2E80 {
        return false;
    }

    in_ranges!(
        chr,
        BOPOMOFO_EXTENDED,
        BOPOMOFO,
        CJK_COMPATIBILITY_FORMS,
        CJK_COMPATIBILITY_IDEOGRAPHS,
        CJK_COMPATIBILITY,
        CJK_RADICALS_SUPPLEMENT,
        CJK_STROKES,
        CJK_SYMBOLS_AND_PUNCTUATION,
        CJK_UNIFIED_IDEOGRAPHS_EXTENSION_A,
        CJK_UNIFIED_IDEOGRAPHS,
        ENCLOSED_CJK_LETTERS_AND_MONTHS,
        HALFWIDTH_AND_FULLWIDTH_FORMS,
        HIRAGANA,
        IDEOGRAPHIC_DESCRIPTION_CHARACTERS,
        KANGXI_RADICALS,
        KATAKANA_PHONETIC_EXTENSIONS,
        KATAKANA,
        VERTICAL_FORMS,
        YI_RADICALS,
        YI_SYLLABLES,
    )
}

/// Whether any character of the string is drawn upright in vertical text.
pub fn allows_vertical_writing_mode(string: &str) -> bool {
    string.chars().any(has_upright_vertical_orientation)
}

// The following logic comes from
// <http://www.unicode.org/Public/12.0.0/ucd/VerticalOrientation.txt>.
// The data file denotes with “U” or “Tu” any codepoint that may be drawn
// upright in vertical text but does not distinguish between upright and
// “neutral” characters.

pub fn has_upright_vertical_orientation(chr: char) -> bool {
    let c = chr as u32;
    if c == 0x02EA /* modifier letter yin departing tone mark */
        || c == 0x02EB
    /* modifier letter yang departing tone mark */
    {
        return true;
    }

    // Return early for characters outside all ranges whose characters remain
    // upright in vertical writing mode.
    if c < 0x1100 {
        return false;
    }

    if in_ranges!(
        chr,
        BOPOMOFO_EXTENDED,
        BOPOMOFO,
        CJK_COMPATIBILITY_IDEOGRAPHS,
        CJK_COMPATIBILITY,
        CJK_RADICALS_SUPPLEMENT,
        CJK_STROKES,
        CJK_UNIFIED_IDEOGRAPHS_EXTENSION_A,
        CJK_UNIFIED_IDEOGRAPHS,
        ENCLOSED_CJK_LETTERS_AND_MONTHS,
        HANGUL_COMPATIBILITY_JAMO,
        HANGUL_JAMO_EXTENDED_A,
        HANGUL_JAMO_EXTENDED_B,
        HANGUL_JAMO,
        HANGUL_SYLLABLES,
        HIRAGANA,
        IDEOGRAPHIC_DESCRIPTION_CHARACTERS,
        KANBUN,
        KANGXI_RADICALS,
        KATAKANA_PHONETIC_EXTENSIONS,
        UNIFIED_CANADIAN_ABORIGINAL_SYLLABICS,
        UNIFIED_CANADIAN_ABORIGINAL_SYLLABICS_EXTENDED,
        VERTICAL_FORMS,
        YIJING_HEXAGRAM_SYMBOLS,
        YI_SYLLABLES,
        YI_RADICALS,
    ) {
        return true;
    }

    if CJK_COMPATIBILITY_FORMS.contains(&c) && !(0xFE49..=0xFE4F).contains(&c) {
        return true;
    }

    if CJK_SYMBOLS_AND_PUNCTUATION.contains(&c)
        && !(0x3008..=0x3011).contains(&c)
        && !(0x3014..=0x301F).contains(&c)
        && c != 0x3030
    {
        return true;
    }

    if KATAKANA.contains(&c) && c != 0x30FC {
        return true;
    }

    if HALFWIDTH_AND_FULLWIDTH_FORMS.contains(&c)
        && c != 0xFF08
        && c != 0xFF09
        && c != 0xFF0D
        && !(0xFF1A..=0xFF1E).contains(&c)
        && c != 0xFF3B
        && c != 0xFF3D
        && c != 0xFF3F
        && !(0xFF5B..=0xFFDF).contains(&c)
        && c != 0xFFE3
        && !(0xFFE8..=0xFFEF).contains(&c)
    {
        return true;
    }

    SMALL_FORM_VARIANTS.contains(&c)
        && !(0xFE58..=0xFE5E).contains(&c)
        && !(0xFE63..=0xFE66).contains(&c)
}

pub fn has_neutral_vertical_orientation(chr: char) -> bool {
    let c = chr as u32;

    // Latin-1 Supplement
    if matches!(
        c,
        0x00A7 | 0x00A9 | 0x00AE | 0x00B1 | 0x00BC | 0x00BD | 0x00BE | 0x00D7 | 0x00F7
    ) {
        return true;
    }

    // General Punctuation
    if matches!(
        c,
        0x2016
            | 0x2020
            | 0x2021
            | 0x2030
            | 0x2031
            | 0x203B
            | 0x203C
            | 0x2042
            | 0x2047
            | 0x2048
            | 0x2049
            | 0x2051
    ) {
        return true;
    }

    if in_ranges!(
        chr,
        0x2100..=0x214F, // Letterlike Symbols
        0x2150..=0x218F, // Number Forms
        0x2440..=0x245F, // Optical Character Recognition
        0x2460..=0x24FF, // Enclosed Alphanumerics
        0x25A0..=0x25FF, // Geometric Shapes
        CJK_SYMBOLS_AND_PUNCTUATION,
        KATAKANA,
        0xE000..=0xF8FF, // Private Use Area
        CJK_COMPATIBILITY_FORMS,
        SMALL_FORM_VARIANTS,
        HALFWIDTH_AND_FULLWIDTH_FORMS,
        0x2700..=0x2767,
        0x2776..=0x2793,
    ) {
        return true;
    }

    // Miscellaneous Technical
    if in_ranges!(
        chr,
        0x2300..=0x2307,
        0x230C..=0x231F,
        0x2324..=0x2328,
        0x232B..=0x232B,
        0x237D..=0x239A,
        0x23BE..=0x23CD,
        0x23CF..=0x23CF,
        0x23D1..=0x23DB,
        0x23E2..=0x23FF,
    ) {
        return true;
    }

    // Control Pictures
    if (0x2400..=0x243F).contains(&c) && c != 0x2423 {
        return true;
    }

    // Miscellaneous Symbols
    if (0x2600..=0x26FF).contains(&c) && !(0x261A..=0x261F).contains(&c) {
        return true;
    }

    // Miscellaneous Symbols and Arrows
    if in_ranges!(chr, 0x2B12..=0x2B2F, 0x2B50..=0x2B59, 0x2BB8..=0x2BEB) {
        return true;
    }

    matches!(c, 0x221E | 0x2234 | 0x2235 | 0xFFFC | 0xFFFD)
}

pub fn has_rotated_vertical_orientation(chr: char) -> bool {
    !(has_upright_vertical_orientation(chr) || has_neutral_vertical_orientation(chr))
}

/// Vertical presentation form of horizontal punctuation.
fn verticalized_character(chr: char) -> Option<char> {
    let vertical = match chr {
        '!' => '︕',
        '#' => '＃',
        '$' => '＄',
        '%' => '％',
        '&' => '＆',
        '(' => '︵',
        ')' => '︶',
        '*' => '＊',
        '+' => '＋',
        ',' => '︐',
        '-' => '︲',
        '.' => '・',
        '/' => '／',
        ':' => '︓',
        ';' => '︔',
        '<' => '︿',
        '=' => '＝',
        '>' => '﹀',
        '?' => '︖',
        '@' => '＠',
        '[' => '﹇',
        '\\' => '＼',
        ']' => '﹈',
        '^' => '＾',
        '_' => '︳',
        '`' => '｀',
        '{' => '︷',
        '|' => '―',
        '}' => '︸',
        '~' => '～',
        '¢' => '￠',
        '£' => '￡',
        '¥' => '￥',
        '¦' => '￤',
        '¬' => '￢',
        '¯' => '￣',
        '–' => '︲',
        '—' => '︱',
        '‘' => '﹃',
        '’' => '﹄',
        '“' => '﹁',
        '”' => '﹂',
        '…' => '︙',
        '‧' => '・',
        '₩' => '￦',
        '、' => '︑',
        '。' => '︒',
        '〈' => '︿',
        '〉' => '﹀',
        '《' => '︽',
        '》' => '︾',
        '「' => '﹁',
        '」' => '﹂',
        '『' => '﹃',
        '』' => '﹄',
        '【' => '︻',
        '】' => '︼',
        '〔' => '︹',
        '〕' => '︺',
        '〖' => '︗',
        '〗' => '︘',
        '！' => '︕',
        '（' => '︵',
        '）' => '︶',
        '，' => '︐',
        '－' => '︲',
        '．' => '・',
        '：' => '︓',
        '；' => '︔',
        '＜' => '︿',
        '＞' => '﹀',
        '？' => '︖',
        '［' => '﹇',
        '］' => '﹈',
        '＿' => '︳',
        '｛' => '︷',
        '｜' => '―',
        '｝' => '︸',
        '｟' => '︵',
        '｠' => '︶',
        '｡' => '︒',
        '｢' => '﹁',
        '｣' => '﹂',
        _ => return None,
    };
    Some(vertical)
}

// Replaces "horizontal" with "vertical" punctuation in place
// Does not re-order or change length of string
pub fn verticalize_punctuation_str(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut output = String::with_capacity(input.len());

    for (i, chr) in chars.iter().enumerate() {
        let neighbour_allows = |neighbour: Option<&char>| match neighbour {
            None => true,
            Some(n) => !has_rotated_vertical_orientation(*n) || verticalized_character(*n).is_some(),
        };
        let previous = i.checked_sub(1).and_then(|p| chars.get(p));
        let can_replace_punctuation =
            neighbour_allows(chars.get(i + 1)) && neighbour_allows(previous);

        match verticalized_character(*chr) {
            Some(vertical) if can_replace_punctuation => output.push(vertical),
            _ => output.push(*chr),
        }
    }

    output
}

pub fn is_whitespace(chr: char) -> bool {
    matches!(chr, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

#[cfg(test)]
mod tests {
    use crate::text::i18n::{
        allows_ideographic_breaking, allows_letter_spacing, allows_vertical_writing_mode,
        allows_word_breaking, has_rotated_vertical_orientation, has_upright_vertical_orientation,
        verticalize_punctuation_str,
    };

    #[test]
    fn ideographic_breaking() {
        assert!(allows_ideographic_breaking('中'));
        assert!(allows_ideographic_breaking('カ'));
        assert!(!allows_ideographic_breaking('a'));
        assert!(!allows_ideographic_breaking('\u{200b}'));
        assert!(allows_word_breaking('\u{200b}'));
    }

    #[test]
    fn letter_spacing() {
        assert!(allows_letter_spacing("Main Street"));
        assert!(!allows_letter_spacing("شارع"));
    }

    #[test]
    fn vertical_orientation() {
        assert!(has_upright_vertical_orientation('中'));
        assert!(has_upright_vertical_orientation('한'));
        assert!(!has_upright_vertical_orientation('a'));
        assert!(!has_upright_vertical_orientation('ー'));
        assert!(has_rotated_vertical_orientation('a'));
        assert!(allows_vertical_writing_mode("abc中"));
        assert!(!allows_vertical_writing_mode("abc"));
    }

    #[test]
    fn verticalizes_punctuation_between_upright_characters() {
        assert_eq!(verticalize_punctuation_str("中(国)"), "中︵国︶");
        // latin neighbours keep their punctuation
        assert_eq!(verticalize_punctuation_str("a-b"), "a-b");
        assert_eq!(verticalize_punctuation_str("中。"), "中︒");
    }
}
