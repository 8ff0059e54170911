mod common;

use serde_json::{Value, json};
use spotharvest::{
    enrich::{NormalizationError, normalize},
    types::RawAnalysis,
};

#[test]
fn test_normalize_derives_duration_and_loudness() {
    let raw = common::sample_raw("abc");
    let features = normalize(&raw).unwrap();

    assert_eq!(features.duration_seconds, 225);
    assert_eq!(features.loudness_db, -7);
}

#[test]
fn test_normalize_copies_other_fields_verbatim() {
    let mut raw = common::sample_raw("abc");
    raw.insert("key", json!("C#"));
    raw.insert("tempo", json!(128.5));
    raw.insert("energy", json!(null));

    let features = normalize(&raw).unwrap();

    assert_eq!(features.key, json!("C#"));
    assert_eq!(features.mode, json!("major"));
    assert_eq!(features.camelot, json!("7B"));
    assert_eq!(features.tempo, json!(128.5));
    assert_eq!(features.popularity, json!(70));
    assert_eq!(features.energy, Value::Null);
    assert_eq!(features.danceability, json!(80));
    assert_eq!(features.happiness, json!(55));
    assert_eq!(features.acousticness, json!(10));
    assert_eq!(features.instrumentalness, json!(0));
    assert_eq!(features.liveness, json!(12));
    assert_eq!(features.speechiness, json!(4));
}

#[test]
fn test_normalize_ignores_extra_fields() {
    let mut raw = common::sample_raw("abc");
    raw.insert("label", json!("Some Records"));
    assert!(normalize(&raw).is_ok());
}

#[test]
fn test_missing_tempo_fails() {
    let mut raw = common::sample_raw("abc");
    raw.remove("tempo");

    assert_eq!(
        normalize(&raw),
        Err(NormalizationError::MissingField("tempo"))
    );
}

#[test]
fn test_every_field_is_required() {
    let fields = [
        "key",
        "mode",
        "camelot",
        "tempo",
        "duration",
        "popularity",
        "energy",
        "danceability",
        "happiness",
        "acousticness",
        "instrumentalness",
        "liveness",
        "speechiness",
        "loudness",
    ];

    for field in fields {
        let mut raw = common::sample_raw("abc");
        raw.remove(field);
        assert_eq!(
            normalize(&raw),
            Err(NormalizationError::MissingField(field)),
            "removing {field}"
        );
    }
}

#[test]
fn test_malformed_duration_fails() {
    let mut raw = common::sample_raw("abc");
    raw.insert("duration", json!("3m45s"));
    assert_eq!(
        normalize(&raw),
        Err(NormalizationError::MalformedDuration("3m45s".to_string()))
    );

    raw.insert("duration", json!(225));
    assert_eq!(
        normalize(&raw),
        Err(NormalizationError::MalformedDuration("225".to_string()))
    );
}

#[test]
fn test_malformed_loudness_fails() {
    let mut raw = common::sample_raw("abc");
    raw.insert("loudness", json!("-7"));
    assert_eq!(
        normalize(&raw),
        Err(NormalizationError::MalformedLoudness("-7".to_string()))
    );
}

#[test]
fn test_empty_payload_names_first_missing_field() {
    let raw = RawAnalysis::default();
    assert_eq!(normalize(&raw), Err(NormalizationError::MissingField("key")));
}

#[test]
fn test_out_of_range_duration_fails() {
    let mut raw = common::sample_raw("abc");
    raw.insert("duration", json!("307445734561825861:00"));

    assert_eq!(
        normalize(&raw),
        Err(NormalizationError::MalformedDuration(
            "307445734561825861:00".to_string()
        ))
    );
}
