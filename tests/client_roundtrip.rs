//! End-to-end tests of the decorator over the in-memory store: values of
//! every variant go in through the client, and come back as the same variant
//! under both decode hints.

use std::collections::HashMap;

use directkv::prelude::*;
use directkv::codec;

fn client() -> DirectClient<MemoryStore> {
    DirectClient::new(MemoryStore::new())
}

#[test]
fn string_round_trips_under_both_hints() {
    let c = client();
    c.set("greeting", "hello").unwrap();

    // The stored bytes are the verbatim UTF-8 of the string.
    assert_eq!(c.store().get("greeting").unwrap().unwrap(), b"hello");

    assert_eq!(
        c.get("greeting", DecodeHint::TextFirst).unwrap(),
        Some(Value::String("hello".into()))
    );
    // Binary attempt on text bytes fails safely and falls through.
    assert_eq!(
        c.get("greeting", DecodeHint::BinaryFirst).unwrap(),
        Some(Value::String("hello".into()))
    );
}

#[test]
fn int_round_trips_under_both_hints() {
    let c = client();
    c.set("answer", 42i64).unwrap();

    assert_eq!(
        c.get("answer", DecodeHint::BinaryFirst).unwrap(),
        Some(Value::Int(42))
    );
    // The binary form is not valid UTF-8, so the text-first chain also
    // reaches the binary decoder.
    assert_eq!(
        c.get("answer", DecodeHint::TextFirst).unwrap(),
        Some(Value::Int(42))
    );
}

#[test]
fn missing_key_is_none_not_an_error() {
    let c = client();
    assert_eq!(c.get("nope", DecodeHint::TextFirst).unwrap(), None);
    assert_eq!(c.get("nope", DecodeHint::BinaryFirst).unwrap(), None);
}

#[test]
fn composite_values_round_trip() {
    let c = client();
    let mut profile = HashMap::new();
    profile.insert("name".to_owned(), Value::String("alice".into()));
    profile.insert(
        "tags".to_owned(),
        Value::Array(vec![Value::from("admin"), Value::Bool(true), Value::Null]),
    );
    profile.insert("balance".to_owned(), Value::Float(12.5));
    let value = Value::Object(profile);

    c.set("profile", value.clone()).unwrap();
    assert_eq!(
        c.get("profile", DecodeHint::BinaryFirst).unwrap(),
        Some(value)
    );
}

#[test]
fn bulk_get_maps_gaps_to_none_in_place() {
    let c = client();
    let mut mapping = HashMap::new();
    mapping.insert("k1".to_owned(), Value::Int(1));
    mapping.insert("k3".to_owned(), Value::from("three"));
    c.mset(&mapping).unwrap();

    let got = c.mget(&["k1", "k2", "k3"], DecodeHint::BinaryFirst).unwrap();
    assert_eq!(
        got,
        vec![
            Some(Value::Int(1)),
            None,
            Some(Value::String("three".into()))
        ]
    );
}

#[test]
fn foreign_bytes_come_back_raw() {
    let c = client();
    // Written behind the decorator's back: neither UTF-8 nor our binary form.
    let foreign = vec![0xff, 0x00, 0x80];
    c.store()
        .set("foreign", foreign.clone(), &SetOptions::new())
        .unwrap();

    assert_eq!(
        c.get("foreign", DecodeHint::TextFirst).unwrap(),
        Some(Value::Bytes(foreign))
    );
}

#[test]
fn keyspace_metadata_is_textual() {
    let c = client();
    c.set("user:1", "a").unwrap();
    c.set("user:2", 2i64).unwrap();
    c.set("account:1", "b").unwrap();

    let mut users = c.keys("user:*").unwrap();
    users.sort();
    assert_eq!(users, vec!["user:1".to_owned(), "user:2".to_owned()]);

    assert_eq!(c.type_of("user:1").unwrap(), Some("string".to_owned()));
    assert_eq!(c.type_of("gone").unwrap(), None);
    assert!(c.random_key().unwrap().is_some());
}

#[test]
fn hash_fields_encode_independently() {
    let c = client();
    let mut mapping = HashMap::new();
    mapping.insert("count".to_owned(), Value::Int(3));
    mapping.insert("label".to_owned(), Value::from("primary"));
    c.hset_mapping("h", &mapping).unwrap();
    c.hset("h", "extra", Value::Bool(false)).unwrap();

    assert_eq!(
        c.hget("h", "count", DecodeHint::BinaryFirst).unwrap(),
        Some(Value::Int(3))
    );
    assert_eq!(
        c.hmget("h", &["label", "missing", "count"], DecodeHint::BinaryFirst)
            .unwrap(),
        vec![
            Some(Value::String("primary".into())),
            None,
            Some(Value::Int(3))
        ]
    );

    let mut fields = c.hkeys("h").unwrap();
    fields.sort();
    assert_eq!(fields, vec!["count", "extra", "label"]);

    let all = c.hgetall("h", DecodeHint::BinaryFirst).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all["extra"], Value::Bool(false));
    assert_eq!(c.hvals("h", DecodeHint::BinaryFirst).unwrap().len(), 3);
}

#[test]
fn set_members_round_trip_without_order() {
    let c = client();
    c.sadd("s", vec![Value::Int(1), Value::from("one"), Value::Bool(true)])
        .unwrap();

    let members = c.smembers("s", DecodeHint::BinaryFirst).unwrap();
    assert_eq!(members.len(), 3);
    assert!(members.contains(&Value::Int(1)));
    assert!(members.contains(&Value::String("one".into())));
    assert!(members.contains(&Value::Bool(true)));

    assert_eq!(c.srem("s", vec![Value::Bool(true)]).unwrap(), 1);
    let popped = c.spop("s", DecodeHint::BinaryFirst).unwrap().unwrap();
    assert!(popped == Value::Int(1) || popped == Value::String("one".into()));
    assert_eq!(c.spop_count("s", 5, DecodeHint::BinaryFirst).unwrap().len(), 1);
    assert_eq!(c.spop("s", DecodeHint::BinaryFirst).unwrap(), None);
}

#[test]
fn sdiff_decodes_first_minus_rest() {
    let c = client();
    c.sadd("a", vec![Value::from("x"), Value::from("y")]).unwrap();
    c.sadd("b", vec![Value::from("y")]).unwrap();
    assert_eq!(c.sdiff(&["a", "b"]).unwrap(), vec![Value::String("x".into())]);
}

#[test]
fn list_operations_preserve_order() {
    let c = client();
    c.rpush("l", vec![Value::Int(2), Value::Int(3)]).unwrap();
    c.lpush("l", vec![Value::Int(1)]).unwrap();

    assert_eq!(
        c.lrange("l", 0, -1, DecodeHint::BinaryFirst).unwrap(),
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
    assert_eq!(
        c.lindex("l", -1, DecodeHint::BinaryFirst).unwrap(),
        Some(Value::Int(3))
    );
    assert_eq!(
        c.lpop("l", DecodeHint::BinaryFirst).unwrap(),
        Some(Value::Int(1))
    );
    assert_eq!(
        c.rpop_count("l", 10, DecodeHint::BinaryFirst).unwrap(),
        vec![Value::Int(3), Value::Int(2)]
    );
    assert_eq!(c.lpop("l", DecodeHint::BinaryFirst).unwrap(), None);

    // pushx never creates lists.
    assert_eq!(c.lpushx("gone", Value::Int(1)).unwrap(), 0);
    assert_eq!(c.rpushx("gone", Value::Int(1)).unwrap(), 0);
}

#[test]
fn mixed_hint_usage_stays_consistent() {
    let c = client();
    c.rpush(
        "mixed",
        vec![Value::from("text"), Value::Int(7), Value::Float(0.5)],
    )
    .unwrap();

    // Hints never change what a correctly-encoded element decodes to.
    for hint in [DecodeHint::TextFirst, DecodeHint::BinaryFirst] {
        assert_eq!(
            c.lrange("mixed", 0, -1, hint).unwrap(),
            vec![Value::String("text".into()), Value::Int(7), Value::Float(0.5)]
        );
    }
}

#[test]
fn tensor_round_trips_through_the_store() {
    let c = client();
    let tensor = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    c.set_tensor("weights", &tensor).unwrap();

    let got = c.get_tensor("weights").unwrap().unwrap();
    assert_eq!(got, tensor);
    assert_eq!(got.shape(), &[2, 3]);
    assert_eq!(got.dtype(), ElementType::F32);
    assert_eq!(
        got.to_vec::<f32>().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    );

    assert_eq!(c.get_tensor("absent").unwrap(), None);
}

#[test]
fn tensor_is_not_part_of_the_default_decode_chain() {
    let c = client();
    let tensor = Tensor::from_vec(vec![0xffu8, 2, 3], &[3]).unwrap();
    c.set_tensor("t", &tensor).unwrap();

    // Read through the default chain, the packed bytes are opaque: not valid
    // UTF-8 and not the binary-form magic.
    let raw = c.get("t", DecodeHint::TextFirst).unwrap().unwrap();
    assert_eq!(raw, Value::Bytes(tensor.encode()));
}

#[test]
fn deleting_and_existence() {
    let c = client();
    c.set("a", 1i64).unwrap();
    c.set("b", 2i64).unwrap();
    assert!(c.exists("a").unwrap());
    assert_eq!(c.del(&["a", "b", "c"]).unwrap(), 2);
    assert!(!c.exists("a").unwrap());
}

#[test]
fn stored_bytes_match_the_codec_exactly() {
    let c = client();
    c.set("v", Value::Array(vec![Value::Int(1)])).unwrap();
    let stored = c.store().get("v").unwrap().unwrap();
    assert_eq!(stored, codec::encode(&Value::Array(vec![Value::Int(1)])).unwrap());
    assert_eq!(stored[0], codec::BINARY_MAGIC);
}
