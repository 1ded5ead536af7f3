// tests/stopwords_config.rs
use sentiment_topwords::config::{load_stopwords, load_stopwords_from};
use std::{env, fs};

#[test]
fn parse_toml_json_and_plain_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("stop.toml");
    fs::write(&p_toml, r#"words = [" The ", "", "AND", "and"]"#).unwrap();
    let v = load_stopwords_from(&p_toml).unwrap();
    assert_eq!(v.len(), 2);
    assert!(v.contains("the"));

    let p_json = dir.path().join("stop.json");
    fs::write(&p_json, r#"["Of", " to "]"#).unwrap();
    assert!(load_stopwords_from(&p_json).unwrap().contains("to"));

    let p_txt = dir.path().join("stop.txt");
    fs::write(&p_txt, "# comment\nfoo\nbar\n").unwrap();
    assert_eq!(load_stopwords_from(&p_txt).unwrap().len(), 2);
}

#[serial_test::serial]
#[test]
fn explicit_then_env_then_builtin() {
    let dir = tempfile::tempdir().unwrap();
    env::remove_var("STOPWORDS_PATH");

    // 1) nothing configured → built-in list
    let builtin = load_stopwords(None).unwrap();
    assert!(builtin.contains("the"));

    // 2) env path
    let p_env = dir.path().join("env.txt");
    fs::write(&p_env, "zebra\n").unwrap();
    env::set_var("STOPWORDS_PATH", p_env.display().to_string());
    let from_env = load_stopwords(None).unwrap();
    assert!(from_env.contains("zebra"));
    assert!(!from_env.contains("the"));

    // 3) explicit path wins over env
    let p_explicit = dir.path().join("explicit.json");
    fs::write(&p_explicit, r#"["lion"]"#).unwrap();
    let explicit = load_stopwords(Some(&p_explicit)).unwrap();
    assert!(explicit.contains("lion") && !explicit.contains("zebra"));

    // 4) env pointing nowhere is an error
    env::set_var("STOPWORDS_PATH", dir.path().join("missing.txt").display().to_string());
    assert!(load_stopwords(None).is_err());

    env::remove_var("STOPWORDS_PATH");
}
