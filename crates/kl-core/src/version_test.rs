use super::*;
use std::collections::HashSet;

#[test]
fn test_parse_simple_token() {
    let v = Version::parse("001").unwrap();
    assert_eq!(v.as_str(), "001");
    assert_eq!(v.segments(), &[1]);
}

#[test]
fn test_parse_timestamp_token() {
    let v = Version::parse("20240101120000").unwrap();
    assert_eq!(v.segments(), &[20240101120000]);
}

#[test]
fn test_parse_dotted_token() {
    let v = Version::parse("1.2.10").unwrap();
    assert_eq!(v.segments(), &[1, 2, 10]);
    assert_eq!(v.to_string(), "1.2.10");
}

#[test]
fn test_parse_rejects_malformed_tokens() {
    for token in ["", "12a", "1..2", ".1", "1.", "v1", "-1", "1 2"] {
        assert!(Version::parse(token).is_none(), "accepted {token:?}");
    }
}

#[test]
fn test_parse_rejects_overflow() {
    assert!(Version::parse("99999999999999999999999").is_none());
}

#[test]
fn test_numeric_ordering_beats_lexical() {
    let two = Version::parse("2").unwrap();
    let ten = Version::parse("10").unwrap();
    assert!(two < ten);
    assert!("2" > "10", "sanity: lexical order is the opposite");
}

#[test]
fn test_leading_zeros_compare_equal() {
    let a = Version::parse("001").unwrap();
    let b = Version::parse("1").unwrap();
    assert_eq!(a, b);

    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn test_dotted_ordering() {
    let mut versions: Vec<Version> = ["1.10", "1.2", "2", "1"]
        .iter()
        .map(|t| Version::parse(t).unwrap())
        .collect();
    versions.sort();
    let raw: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
    assert_eq!(raw, vec!["1", "1.2", "1.10", "2"]);
}
