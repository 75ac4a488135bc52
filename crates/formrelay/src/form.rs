//! Decoding of `application/x-www-form-urlencoded` bodies.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::record::Record;

/// Parse a raw form body into a [`Record`].
///
/// Pairs are separated by `&` and split at their first `=`. Keys and values
/// are decoded after splitting, so `%26` and `%3D` survive inside values.
///
/// # Errors
///
/// Returns [`Error::FormParse`] if the body is not UTF-8, if any pair lacks an
/// `=` (an empty body counts as one such pair), or if a percent-escape decodes
/// to invalid UTF-8.
pub fn parse_form(body: &[u8]) -> Result<Record> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::form_parse(format!("body is not UTF-8: {e}")))?;

    let mut record = Record::new();
    for pair in text.split('&') {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::form_parse(format!("pair '{pair}' has no '='")))?;
        record.insert(decode_component(key)?, decode_component(value)?);
    }
    Ok(record)
}

/// Decode one key or value: `+` becomes a space, then percent-escapes.
fn decode_component(raw: &str) -> Result<String> {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|e| Error::form_parse(format!("cannot decode '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_pairs() {
        let record = parse_form(b"name=Alice&msg=Hi").unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("name"), Some("Alice"));
        assert_eq!(record.get("msg"), Some("Hi"));
    }

    #[test]
    fn test_parse_plus_and_percent() {
        let record = parse_form(b"msg=Hello+world%21&city=S%C3%A3o+Paulo").unwrap();
        assert_eq!(record.get("msg"), Some("Hello world!"));
        assert_eq!(record.get("city"), Some("São Paulo"));
    }

    #[test]
    fn test_parse_encoded_separators_in_value() {
        let record = parse_form(b"q=a%26b%3Dc&x=1").unwrap();
        assert_eq!(record.get("q"), Some("a&b=c"));
        assert_eq!(record.get("x"), Some("1"));
    }

    #[test]
    fn test_parse_splits_at_first_equals() {
        let record = parse_form(b"expr=1+1=2").unwrap();
        assert_eq!(record.get("expr"), Some("1 1=2"));
    }

    #[test]
    fn test_parse_empty_value() {
        let record = parse_form(b"name=&msg=Hi").unwrap();
        assert_eq!(record.get("name"), Some(""));
    }

    #[test]
    fn test_parse_missing_equals_rejected() {
        let err = parse_form(b"name=Alice&oops").unwrap_err();
        assert!(err.is_form_error());
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn test_parse_empty_body_rejected() {
        assert!(parse_form(b"").unwrap_err().is_form_error());
    }

    #[test]
    fn test_parse_invalid_utf8_rejected() {
        assert!(parse_form(&[0x6e, 0x3d, 0xff]).unwrap_err().is_form_error());
    }

    #[test]
    fn test_parse_invalid_escape_rejected() {
        assert!(parse_form(b"name=%FF").unwrap_err().is_form_error());
    }

    #[test]
    fn test_parse_preserves_field_order() {
        let record = parse_form(b"z=1&a=2&m=3").unwrap();
        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }
}
