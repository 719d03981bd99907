use regex::Regex;
use std::sync::OnceLock;

/// Counts "words" the way CJK word counts work: one unit per character left
/// after stripping whitespace and Unicode punctuation.
pub fn count_words(text: &str) -> usize {
    static STRIP_RE: OnceLock<Regex> = OnceLock::new();
    let strip_re = STRIP_RE.get_or_init(|| Regex::new(r"[\s\p{P}]").unwrap());

    strip_re.replace_all(text, "").chars().count()
}
