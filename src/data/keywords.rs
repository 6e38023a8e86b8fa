// ============================================================
// Layer 4 — Keyword Extraction
// ============================================================
// A deliberately simple extractor used by the HTTP response:
// normalised words longer than 3 characters that are not
// stop-words, in text order, at most `limit` of them. Repeated
// words are reported each time they occur.

use crate::data::normalizer::normalize;

/// Default number of keywords reported per text.
pub const DEFAULT_KEYWORD_LIMIT: usize = 5;

/// Fixed English stop-word set.
pub const STOP_WORDS: [&str; 10] = ["the", "and", "is", "in", "to", "of", "a", "an", "on", "at"];

/// Extract up to `limit` keywords from `text`.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for word in normalize(text).split(' ') {
        if keywords.len() == limit {
            break;
        }
        if word.chars().count() <= 3 || STOP_WORDS.contains(&word) {
            continue;
        }
        keywords.push(word.to_string());
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flood_warning_keywords() {
        let kw = extract_keywords("flood warning issued", DEFAULT_KEYWORD_LIMIT);
        assert_eq!(kw, vec!["flood", "warning", "issued"]);
    }

    #[test]
    fn test_short_words_and_stop_words_are_dropped() {
        let kw = extract_keywords("The storm is at the coast and in town", 5);
        assert_eq!(kw, vec!["storm", "coast", "town"]);
        assert!(kw.iter().all(|k| !STOP_WORDS.contains(&k.as_str())));
    }

    #[test]
    fn test_limit_keeps_text_order_and_repeats() {
        let kw = extract_keywords(
            "tornado flood tornado wildfire hurricane earthquake tsunami",
            5,
        );
        assert_eq!(
            kw,
            vec!["tornado", "flood", "tornado", "wildfire", "hurricane"]
        );
    }

    #[test]
    fn test_repeated_word_is_reported_twice() {
        assert_eq!(extract_keywords("flood flood", 5), vec!["flood", "flood"]);
    }

    #[test]
    fn test_empty_text_has_no_keywords() {
        assert!(extract_keywords("", 5).is_empty());
        assert!(extract_keywords("!!! 123", 5).is_empty());
    }
}
