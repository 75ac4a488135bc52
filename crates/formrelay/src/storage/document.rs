//! On-disk document format of the record file.
//!
//! The whole [`RecordStore`] is one pretty-printed JSON object, UTF-8,
//! four-space indentation, non-ASCII characters written literally.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::record::RecordStore;

/// Indentation used for the record file.
pub const INDENT: &[u8] = b"    ";

/// Encode a store as the full record document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(store: &RecordStore) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    store.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

/// Decode a record document.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON object of string-valued
/// objects.
pub fn decode(bytes: &[u8]) -> serde_json::Result<RecordStore> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn test_encode_empty_store() {
        let bytes = encode(&RecordStore::new()).unwrap();
        assert_eq!(bytes, b"{}\n");
    }

    #[test]
    fn test_encode_uses_four_space_indent() {
        let mut store = RecordStore::new();
        let record: Record = [("name", "Alice")].into_iter().collect();
        store.insert_unique("2024-01-15 10:00:00.000000", record);

        let text = String::from_utf8(encode(&store).unwrap()).unwrap();
        assert!(text.contains("\n    \"2024-01-15 10:00:00.000000\": {"));
        assert!(text.contains("\n        \"name\": \"Alice\""));
    }

    #[test]
    fn test_encode_keeps_non_ascii_literal() {
        let mut store = RecordStore::new();
        let record: Record = [("msg", "Привіт")].into_iter().collect();
        store.insert_unique("t", record);

        let text = String::from_utf8(encode(&store).unwrap()).unwrap();
        assert!(text.contains("Привіт"));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode(b"{ not json").is_err());
        assert!(decode(b"[]").is_err());
        assert!(decode(br#"{"t": "flat"}"#).is_err());
    }

    #[test]
    fn test_decode_accepts_empty_object() {
        assert!(decode(b"{}").unwrap().is_empty());
    }
}
