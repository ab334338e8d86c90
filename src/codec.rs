//! The type-preserving encode/decode policy.
//!
//! Writes are encoded with one of two disjoint byte forms:
//!
//! - **Text form**: a `Value::String` is stored as its UTF-8 bytes, verbatim.
//!   No framing is added, so a stored string is readable by any other client
//!   of the same store.
//! - **Binary form**: everything else is stored as a two-byte header (magic
//!   `0xC1`, format version) followed by the MessagePack encoding of the
//!   [`Value`].
//!
//! `0xC1` never occurs in valid UTF-8, which keeps the two forms disjoint:
//! binary payloads never decode as text, and text payloads never start with
//! the binary magic. Reads still follow a hint-driven fallback chain because
//! the store may hold bytes written by foreign clients that fit neither form;
//! those come back as `Value::Bytes`, never as an error.
//!
//! All functions here are pure and stateless; they perform no I/O and are safe
//! for unbounded concurrent use.

use crate::error::{Error, Result};
use crate::value::Value;

/// First byte of every binary-form encoding.
///
/// Chosen from the bytes that can never appear in well-formed UTF-8, so a
/// binary payload is never mistaken for text.
pub const BINARY_MAGIC: u8 = 0xC1;

/// Current binary format version. Bumped on any incompatible change to the
/// MessagePack layout; decoders only accept their own version.
pub const FORMAT_VERSION: u8 = 1;

/// Which decode strategy to attempt first when recovering a value.
///
/// The encoded bytes carry no discriminator between "string stored verbatim"
/// and "foreign raw bytes", so callers who know what they stored can steer
/// the guess. For values written by [`encode`] the chain resolves correctly
/// under either hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeHint {
    /// Try UTF-8 text first, then the binary format. The default.
    #[default]
    TextFirst,
    /// Try the binary format first, then UTF-8 text.
    BinaryFirst,
}

/// Encode a value into its stored byte form.
///
/// Strings pass through as UTF-8; everything else is serialized to the
/// version-tagged binary form. Fails with [`Error::Serialization`] when the
/// serializer cannot represent the value.
///
/// ```
/// use directkv::{codec, Value};
///
/// assert_eq!(codec::encode(&Value::String("hello".into())).unwrap(), b"hello");
///
/// let encoded = codec::encode(&Value::Int(42)).unwrap();
/// assert_eq!(encoded[0], codec::BINARY_MAGIC);
/// ```
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.clone().into_bytes()),
        other => {
            let body = rmp_serde::to_vec(other)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            let mut out = Vec::with_capacity(body.len() + 2);
            out.push(BINARY_MAGIC);
            out.push(FORMAT_VERSION);
            out.extend_from_slice(&body);
            Ok(out)
        }
    }
}

/// Encode every value of a field/value mapping, leaving field names untouched.
///
/// Used by the bulk-set operations; each value is encoded independently with
/// [`encode`].
pub fn encode_pairs<'a, I>(pairs: I) -> Result<Vec<(String, Vec<u8>)>>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    pairs
        .into_iter()
        .map(|(field, value)| Ok((field.to_owned(), encode(value)?)))
        .collect()
}

/// Recover a value from its stored byte form.
///
/// Returns `None` only for a `None` input (missing key). Otherwise the
/// fallback chain guarantees some value comes back:
///
/// 1. With [`DecodeHint::BinaryFirst`], attempt the binary format; return on
///    success.
/// 2. Attempt UTF-8; valid text returns as `Value::String`.
/// 3. If the bytes are not UTF-8 and step 1 was skipped, attempt the binary
///    format now.
/// 4. Last resort: return the raw bytes as `Value::Bytes`.
///
/// ```
/// use directkv::{codec, DecodeHint, Value};
///
/// let encoded = codec::encode(&Value::Int(42)).unwrap();
/// assert_eq!(codec::decode(Some(&encoded), DecodeHint::TextFirst), Some(Value::Int(42)));
/// assert_eq!(codec::decode(None, DecodeHint::TextFirst), None);
/// ```
pub fn decode(encoded: Option<&[u8]>, hint: DecodeHint) -> Option<Value> {
    let bytes = encoded?;

    if hint == DecodeHint::BinaryFirst {
        if let Some(value) = try_binary(bytes) {
            return Some(value);
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => return Some(Value::String(text.to_owned())),
        Err(_) => {
            if hint == DecodeHint::TextFirst {
                if let Some(value) = try_binary(bytes) {
                    return Some(value);
                }
            }
        }
    }

    Some(Value::Bytes(bytes.to_vec()))
}

/// The text-only half of [`decode`], for store metadata.
///
/// Key names and type names are textual by construction of the store, so the
/// binary format is never attempted; non-UTF-8 input degrades lossily rather
/// than failing.
pub fn decode_key(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Attempt the binary half of the chain. Failure is internal only: it drives
/// the fallback chain and is never surfaced to callers.
fn try_binary(bytes: &[u8]) -> Option<Value> {
    if bytes.len() < 2 || bytes[0] != BINARY_MAGIC || bytes[1] != FORMAT_VERSION {
        return None;
    }
    rmp_serde::from_slice(&bytes[2..]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn string_passes_through_verbatim() {
        let encoded = encode(&Value::String("hello".into())).unwrap();
        assert_eq!(encoded, b"hello");
    }

    #[test]
    fn non_string_is_tagged_binary() {
        let encoded = encode(&Value::Int(42)).unwrap();
        assert_eq!(encoded[0], BINARY_MAGIC);
        assert_eq!(encoded[1], FORMAT_VERSION);
    }

    #[test]
    fn missing_input_decodes_to_none() {
        assert_eq!(decode(None, DecodeHint::TextFirst), None);
        assert_eq!(decode(None, DecodeHint::BinaryFirst), None);
    }

    #[test]
    fn int_round_trips_under_both_hints() {
        let encoded = encode(&Value::Int(42)).unwrap();
        // Not valid UTF-8, so TextFirst falls through to the binary attempt.
        assert_eq!(
            decode(Some(&encoded), DecodeHint::BinaryFirst),
            Some(Value::Int(42))
        );
        assert_eq!(
            decode(Some(&encoded), DecodeHint::TextFirst),
            Some(Value::Int(42))
        );
    }

    #[test]
    fn text_round_trips_even_when_binary_is_tried_first() {
        let encoded = encode(&Value::String("hello".into())).unwrap();
        // The binary attempt fails safely on text bytes and falls through.
        assert_eq!(
            decode(Some(&encoded), DecodeHint::BinaryFirst),
            Some(Value::String("hello".into()))
        );
    }

    #[test]
    fn nested_value_round_trips() {
        let mut obj = HashMap::new();
        obj.insert("name".to_owned(), Value::String("alice".into()));
        obj.insert(
            "scores".to_owned(),
            Value::Array(vec![Value::Int(1), Value::Float(2.5), Value::Bool(true)]),
        );
        obj.insert("blob".to_owned(), Value::Bytes(vec![0, 159, 146, 150]));
        let value = Value::Object(obj);

        let encoded = encode(&value).unwrap();
        assert_eq!(decode(Some(&encoded), DecodeHint::BinaryFirst), Some(value));
    }

    #[test]
    fn foreign_bytes_fall_back_to_raw() {
        // Not UTF-8, not our binary format.
        let foreign = [0xff, 0xfe, 0x00, 0x01];
        assert_eq!(
            decode(Some(&foreign), DecodeHint::TextFirst),
            Some(Value::Bytes(foreign.to_vec()))
        );
        assert_eq!(
            decode(Some(&foreign), DecodeHint::BinaryFirst),
            Some(Value::Bytes(foreign.to_vec()))
        );
    }

    #[test]
    fn truncated_binary_falls_back_to_raw() {
        let mut encoded = encode(&Value::Array(vec![Value::Int(7)])).unwrap();
        encoded.truncate(2);
        // Header alone carries no payload; the chain ends at raw bytes.
        assert_eq!(
            decode(Some(&encoded), DecodeHint::BinaryFirst),
            Some(Value::Bytes(encoded))
        );
    }

    #[test]
    fn wrong_format_version_is_not_decoded() {
        let mut encoded = encode(&Value::Int(7)).unwrap();
        encoded[1] = FORMAT_VERSION + 1;
        assert_eq!(
            decode(Some(&encoded), DecodeHint::BinaryFirst),
            Some(Value::Bytes(encoded))
        );
    }

    #[test]
    fn empty_bytes_decode_to_empty_string() {
        assert_eq!(
            decode(Some(b""), DecodeHint::TextFirst),
            Some(Value::String(String::new()))
        );
        assert_eq!(
            decode(Some(b""), DecodeHint::BinaryFirst),
            Some(Value::String(String::new()))
        );
    }

    #[test]
    fn decode_key_is_lossy_on_bad_utf8() {
        assert_eq!(decode_key(b"user:1"), "user:1");
        assert_eq!(decode_key(&[0x68, 0xff, 0x69]), "h\u{fffd}i");
    }

    #[test]
    fn encode_pairs_leaves_fields_untouched() {
        let v1 = Value::Int(1);
        let v2 = Value::String("two".into());
        let encoded = encode_pairs(vec![("a", &v1), ("b", &v2)]).unwrap();
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0].0, "a");
        assert_eq!(encoded[1].1, b"two");
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            // Finite floats only: NaN breaks equality-based assertions.
            (-1e12f64..1e12f64).prop_map(Value::Float),
            ".*".prop_map(Value::String),
            proptest::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
        ];
        leaf.prop_recursive(3, 32, 8, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                proptest::collection::hash_map(".*", inner, 0..8).prop_map(Value::Object),
            ]
        })
    }

    proptest! {
        #[test]
        fn any_string_round_trips_under_both_hints(s in ".*") {
            let encoded = encode(&Value::String(s.clone())).unwrap();
            prop_assert_eq!(
                decode(Some(&encoded), DecodeHint::TextFirst),
                Some(Value::String(s.clone()))
            );
            prop_assert_eq!(
                decode(Some(&encoded), DecodeHint::BinaryFirst),
                Some(Value::String(s))
            );
        }

        #[test]
        fn any_value_round_trips_binary_first(v in value_strategy()) {
            let encoded = encode(&v).unwrap();
            prop_assert_eq!(decode(Some(&encoded), DecodeHint::BinaryFirst), Some(v));
        }

        #[test]
        fn any_non_string_round_trips_text_first(i in any::<i64>(), b in any::<bool>()) {
            // The magic byte makes binary encodings invalid UTF-8, so even
            // the text-first chain recovers them.
            let v = Value::Array(vec![Value::Int(i), Value::Bool(b)]);
            let encoded = encode(&v).unwrap();
            prop_assert_eq!(decode(Some(&encoded), DecodeHint::TextFirst), Some(v));
        }
    }
}
