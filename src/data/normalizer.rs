// ============================================================
// Layer 4 — Text Normalizer
// ============================================================
// Canonicalises raw post text before tokenisation.
//
// Steps (applied in this exact order):
//   1. Lowercase
//   2. Strip URL-like substrings (http…, https…, www…)
//   3. Strip @mentions
//   4. Strip ASCII punctuation
//   5. Strip digits
//   6. Collapse whitespace runs to one space and trim
//
// Removing characters in steps 4–5 can glue fragments back into
// something steps 2–3 would have removed ("htt.px" → "httpx"),
// so the steps are repeated until the text stops changing.
// Every pass after the first only deletes characters, so the
// loop always terminates and the result is idempotent.
//
// Reference: regex crate documentation
//            Rust Book §8 (Strings in Rust)

use std::sync::LazyLock;

use regex::Regex;

static NORMALIZER: LazyLock<Normalizer> =
    LazyLock::new(|| Normalizer::new().expect("normalizer patterns are constants"));

/// Normalise a single text with the shared, pre-compiled normalizer.
pub fn normalize(text: &str) -> String {
    NORMALIZER.normalize(text)
}

pub struct Normalizer {
    re_url: Regex,
    re_mention: Regex,
    re_digits: Regex,
}

impl Normalizer {
    /// Compile the normalisation patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            re_url: Regex::new(r"(?i)http\S+|www\S+|https\S+")?,
            re_mention: Regex::new(r"@\w+")?,
            re_digits: Regex::new(r"\d+")?,
        })
    }

    /// Produce canonical text. Never fails; worst case is `""`.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.pass(text);
        loop {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let no_urls = self.re_url.replace_all(&lowered, "");
        let no_mentions = self.re_mention.replace_all(&no_urls, "");
        let no_punct: String = no_mentions
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect();
        let no_digits = self.re_digits.replace_all(&no_punct, "");

        no_digits.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const TRICKY: &[&str] = &[
        "",
        "   ",
        "Flood warning issued for coastal areas due to heavy rainfall",
        "Tsunami alert after magnitude 8.0 earthquake",
        "RT @NWS: Evacuate NOW!!! https://t.co/abc123 #flood",
        "visit www.example.com or HTTP://X.Y",
        "htt.px and w.wwa and h1ttp2x",
        "a@b.c @@user @ 42",
        "Ünïcödé  ÇAFÉ\t\n über ٣٤ ½",
        "tab\tseparated\nnew   lines",
    ];

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn test_strips_urls_and_mentions() {
        assert_eq!(
            normalize("@user check https://t.co/xyz now www.site.org"),
            "check now"
        );
    }

    #[test]
    fn test_strips_digits_without_splitting_words() {
        assert_eq!(normalize("abc123def 2024"), "abcdef");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  a \t b\n\nc  "), "a b c");
    }

    #[test]
    fn test_is_idempotent() {
        for text in TRICKY {
            let once = normalize(text);
            assert_eq!(normalize(&once), once, "input: {text:?}");
        }
    }

    #[test]
    fn test_rejoined_fragments_are_stripped() {
        assert_eq!(normalize("htt.px"), "");
        assert_eq!(normalize("w.wwa"), "");
    }

    #[test]
    fn test_output_has_no_digits() {
        for text in TRICKY {
            let out = normalize(text);
            assert!(!out.chars().any(|c| c.is_ascii_digit()), "{out:?}");
        }
    }
}
