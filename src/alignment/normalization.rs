/// Turns punctuation and symbols into word breaks and collapses whitespace.
/// Letters and combining marks of any script are kept untouched; deeper
/// language-specific cleaning plugs in through `TextNormalizer`.
pub fn normalize_basic(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| if is_word_break(c) { ' ' } else { c })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_break(c: char) -> bool {
    // Joiners and soft hyphens sit inside words, notably in Indic scripts.
    if matches!(c, '\'' | '\u{00AD}' | '\u{200C}' | '\u{200D}' | '\u{2060}') {
        return false;
    }
    c.is_whitespace()
        || c.is_control()
        || c.is_ascii_punctuation()
        || matches!(c, '¡' | '¿' | '«' | '»' | '·' | '।' | '॥')
        || matches!(c as u32,
            0x2000..=0x206F // general punctuation
            | 0x2190..=0x27BF // arrows, technical, dingbats, music
            | 0x3000..=0x303F // CJK punctuation
        )
}
