//! # Normalizer
//! Stateless text cleanup applied before classification.
//!
//! Order matters: HTML entities are decoded, emoji and `@mentions` are cut out
//! without leaving a gap, then URLs and every remaining character outside
//! `[A-Za-z0-9 ]` become spaces, and finally whitespace is collapsed.
//! The output alphabet is `[A-Za-z0-9 ]`, so `normalize` is idempotent.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re_emoji() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            "[",
            "\u{1F600}-\u{1F64F}", // emoticons
            "\u{1F300}-\u{1F5FF}", // symbols & pictographs
            "\u{1F680}-\u{1F6FF}", // transport & map
            "\u{1F1E0}-\u{1F1FF}", // flags
            "\u{2702}-\u{27B0}",
            "\u{24C2}-\u{1F251}",
            "]+"
        ))
        .unwrap()
    })
}

fn re_mention() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"@\w+").unwrap())
}

fn re_url() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\w+://\S+").unwrap())
}

fn re_non_alnum() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[^0-9A-Za-z ]").unwrap())
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r" +").unwrap())
}

/// Remove emoji code-point ranges.
pub fn strip_emoji(s: &str) -> String {
    re_emoji().replace_all(s, "").into_owned()
}

/// Remove `@username` mentions.
pub fn strip_mentions(s: &str) -> String {
    re_mention().replace_all(s, "").into_owned()
}

/// Full cleanup; total, pure and idempotent.
pub fn normalize(s: &str) -> String {
    // 1) HTML entity decode (&amp; &lt; ... show up in stream payloads)
    let decoded = html_escape::decode_html_entities(s);

    // 2) Emoji and mentions vanish without a gap
    let out = strip_emoji(&decoded);
    let out = strip_mentions(&out);

    // 3) URLs first, then anything outside the output alphabet
    let out = re_url().replace_all(&out, " ");
    let out = re_non_alnum().replace_all(&out, " ");

    // 4) Collapse + trim
    re_ws().replace_all(&out, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_a_typical_post() {
        let s = "@bob I LOVE this 😀 &amp; that!!! https://t.co/xyz #yes";
        assert_eq!(normalize(s), "I LOVE this that yes");
    }

    #[test]
    fn emoji_and_mentions_leave_no_gap() {
        assert_eq!(normalize("good😀day"), "goodday");
        assert_eq!(normalize("hi@bob there"), "hi there");
    }

    #[test]
    fn idempotent_on_mixed_input() {
        for s in [
            "",
            "   ",
            "tabs\tand\nnewlines",
            "café déjà vu",
            "a://b c",
            "x @ y",
            "ünïcödé ✂ ✈ 🇨🇿",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input {s:?}");
            assert!(once
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ' '));
            assert!(!once.contains("  "));
        }
    }
}
