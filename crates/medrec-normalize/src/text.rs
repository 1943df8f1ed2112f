//! Token-level text helpers.

/// Lower-case and collapse runs of whitespace to a single space.
pub fn collapse_whitespace(input: &str) -> String {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Alphanumeric words of `input`, in order.
pub fn words(input: &str) -> Vec<&str> {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whether `phrase` occurs in `haystack` as a run of consecutive words.
pub fn contains_phrase(haystack: &[&str], phrase: &[String]) -> bool {
    !phrase.is_empty()
        && haystack
            .windows(phrase.len())
            .any(|window| window.iter().zip(phrase).all(|(w, p)| *w == p))
}

/// Whether `phrase` starts at `haystack[at]`.
pub fn phrase_at(haystack: &[&str], at: usize, phrase: &[String]) -> bool {
    !phrase.is_empty()
        && haystack.len() >= at + phrase.len()
        && haystack[at..at + phrase.len()]
            .iter()
            .zip(phrase)
            .all(|(w, p)| *w == p)
}

/// Split a phrase into owned words.
pub fn phrase_words(phrase: &str) -> Vec<String> {
    words(&phrase.to_lowercase())
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Strip leading and trailing non-alphanumeric characters.
pub fn trim_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}
