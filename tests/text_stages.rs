// tests/text_stages.rs
//
// Properties of the stateless stages: normalizer, classifier, tokenizer.

use rand::Rng;
use sentiment_topwords::normalize::normalize;
use sentiment_topwords::sentiment::{classify, LexiconScorer};
use sentiment_topwords::{Sentiment, StopWords, Tokenizer};

const ALPHABET: &[&str] = &[
    "a", "Z", "9", " ", "\t", "\n", "@", "_", "#", "!", ":", "/", ".", "&amp;", "&lt;", "é",
    "ß", "😀", "🚀", "✂", "http://x.y/z", "@user", "LOVE", "terrible",
];

fn random_text(rng: &mut impl Rng) -> String {
    let n = rng.random_range(0..40);
    (0..n)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
        .collect()
}

#[test]
fn normalize_is_idempotent_and_ascii_alnum() {
    let mut rng = rand::rng();
    for _ in 0..2_000 {
        let s = random_text(&mut rng);
        let once = normalize(&s);
        assert_eq!(normalize(&once), once, "input {s:?}");
        assert!(
            once.chars().all(|c| c.is_ascii_alphanumeric() || c == ' '),
            "{once:?}"
        );
        assert_eq!(once, once.trim());
        assert!(!once.contains("  "));
    }
}

#[test]
fn empty_is_ok() {
    assert_eq!(normalize(""), "");
}

#[test]
fn classification_is_total_and_zero_is_neutral() {
    let scorer = LexiconScorer::new();
    let mut rng = rand::rng();
    for _ in 0..500 {
        let text = normalize(&random_text(&mut rng));
        let c = classify(&scorer, &text);
        assert!(Sentiment::ALL.contains(&c.sentiment));
    }
    let zero = |_: &str| 0.0;
    assert_eq!(classify(&zero, "anything").sentiment, Sentiment::Neutral);
}

#[test]
fn tokens_are_lowercase_and_never_stopwords() {
    let stop = StopWords::english();
    let tk = Tokenizer::new(stop.clone());
    let mut rng = rand::rng();
    for _ in 0..500 {
        let text = normalize(&random_text(&mut rng));
        for t in tk.tokenize(Sentiment::Neutral, &text) {
            assert_eq!(t.word, t.word.to_lowercase());
            assert!(!stop.contains(&t.word));
            assert!(!t.word.is_empty());
        }
    }
}
