//! Glob Pattern Tests

use tiny_mp_cache::store::GlobPattern;

fn matches(pattern: &str, key: &str) -> bool {
    GlobPattern::new(pattern).matches(key)
}

#[test]
fn test_literal_pattern() {
    assert!(matches("hello", "hello"));
    assert!(!matches("hello", "hello!"));
    assert!(!matches("hello", "hell"));
    assert!(matches("", ""));
    assert!(!matches("", "a"));
}

#[test]
fn test_star() {
    assert!(matches("*", ""));
    assert!(matches("*", "anything at all"));
    assert!(matches("job:*", "job:"));
    assert!(matches("job:*", "job:123"));
    assert!(!matches("job:*", "jobs:1"));
    assert!(matches("*:done", "task:done"));
    assert!(matches("a*b*c", "aXXbYYc"));
    assert!(!matches("a*b*c", "aXXbYY"));
}

#[test]
fn test_star_backtracking() {
    assert!(matches("*ab", "aab"));
    assert!(matches("a*ab", "aaab"));
    assert!(matches("*a*a*a", "banana"));
    assert!(!matches("*a*a*a*a", "banana"));
}

#[test]
fn test_question_mark() {
    assert!(matches("job:?", "job:1"));
    assert!(!matches("job:?", "job:12"));
    assert!(!matches("job:?", "job:"));
    assert!(matches("??", "ab"));
}

#[test]
fn test_question_mark_is_one_character_not_one_byte() {
    assert!(matches("caf?", "café"));
    assert!(matches("?", "é"));
}

#[test]
fn test_escapes() {
    assert!(matches(r"a\*", "a*"));
    assert!(!matches(r"a\*", "ab"));
    assert!(matches(r"what\?", "what?"));
    assert!(!matches(r"what\?", "whats"));
    assert!(matches(r"\\", r"\"));
}

#[test]
fn test_trailing_backslash_is_literal() {
    assert!(matches(r"dir\", r"dir\"));
    assert!(!matches(r"dir\", "dir"));
}

#[test]
fn test_literal_prefix() {
    assert_eq!(GlobPattern::new("job:*").literal_prefix(), "job:");
    assert_eq!(GlobPattern::new("*").literal_prefix(), "");
    assert_eq!(GlobPattern::new("a?c").literal_prefix(), "a");
    assert_eq!(GlobPattern::new(r"a\*b*").literal_prefix(), "a*b");
    assert_eq!(GlobPattern::new("plain").literal_prefix(), "plain");
}

#[test]
fn test_has_wildcards() {
    assert!(GlobPattern::new("a*").has_wildcards());
    assert!(GlobPattern::new("a?").has_wildcards());
    assert!(!GlobPattern::new("abc").has_wildcards());
    assert!(!GlobPattern::new(r"a\*").has_wildcards());
}

#[test]
fn test_repeated_stars_collapse() {
    assert!(matches("a**b", "ab"));
    assert!(matches("a**b", "a-x-b"));
    assert!(!matches("a**b", "a-x-c"));
}

#[test]
fn test_multibyte_keys() {
    assert!(matches("?", "日"));
    assert!(matches("日?語", "日本語"));
    assert!(matches("*語", "日本語"));
    assert!(matches("*本*", "日本語"));
    assert!(!matches("??", "日本語"));
    assert!(matches("é*é", "éaé"));
    assert!(!matches("*x", "日本語"));
}
