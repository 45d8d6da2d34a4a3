#![allow(missing_docs)]
use otp_entry_core::paste::resolve_inserted;

#[test]
fn test_single_character_previous_values() {
    assert_eq!(resolve_inserted("1", "11234"), Some("1234"));
    // Ambiguous: "1" is both prefix and suffix, so the front one is stripped.
    assert_eq!(resolve_inserted("1", "12341"), Some("2341"));
    for d in '2'..='9' {
        assert_eq!(resolve_inserted(&d.to_string(), &format!("{d}1234")), Some("1234"));
    }
    assert_eq!(resolve_inserted("5", "12345"), Some("1234"));
    assert_eq!(resolve_inserted("9", "12349"), Some("1234"));
}

#[test]
fn test_multi_character_previous_values() {
    assert_eq!(resolve_inserted("123", "1231234"), Some("1234"));
    assert_eq!(resolve_inserted("123", "1234123"), Some("4123"));
    assert_eq!(resolve_inserted("222", "2221234"), Some("1234"));
    assert_eq!(resolve_inserted("222", "1234222"), Some("1234"));
}

#[test]
fn test_small_edits_are_not_pastes() {
    assert_eq!(resolve_inserted("", ""), None);
    assert_eq!(resolve_inserted("", "7"), None);
    assert_eq!(resolve_inserted("4", "8"), None);
}

#[test]
fn test_empty_previous_returns_observed() {
    assert_eq!(resolve_inserted("", "482913"), Some("482913"));
}

#[test]
fn test_unanchored_previous_means_full_replacement() {
    assert_eq!(resolve_inserted("9", "482913"), Some("482913"));
    assert_eq!(resolve_inserted("AB", "XABY"), Some("XABY"));
}

#[test]
fn test_multibyte_text() {
    assert_eq!(resolve_inserted("é", "é1234"), Some("1234"));
    assert_eq!(resolve_inserted("é", "1234é"), Some("1234"));
    assert_eq!(resolve_inserted("", "é"), None);
}
