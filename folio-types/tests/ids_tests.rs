use folio_types::{DocumentId, ObjectId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

// ── ObjectId ──────────────────────────────────────────────────────

#[test]
fn object_id_new_is_unique() {
    let ids: HashSet<ObjectId> = (0..1000).map(|_| ObjectId::new()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn object_id_new_is_valid() {
    let id = ObjectId::new();
    assert!(id.is_valid());
    assert!(!id.is_nil());
}

#[test]
fn object_id_nil_is_not_valid() {
    let id = ObjectId::nil();
    assert!(id.is_nil());
    assert!(!id.is_valid());
    assert_eq!(id.as_uuid(), uuid::Uuid::nil());
}

#[test]
fn object_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::new_v4();
    let id = ObjectId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn object_id_display_and_parse() {
    let id = ObjectId::new();
    let parsed = ObjectId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn object_id_from_str_invalid() {
    assert!(ObjectId::from_str("garbage").is_err());
    assert!(ObjectId::parse("not-a-uuid").is_err());
}

#[test]
fn object_id_serializes_as_plain_string() {
    let id = ObjectId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    let parsed: ObjectId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn object_ids_sort_by_creation() {
    let a = ObjectId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = ObjectId::new();
    assert!(a < b);
}

// ── DocumentId ────────────────────────────────────────────────────

#[test]
fn document_id_default_is_unique() {
    assert_ne!(DocumentId::default(), DocumentId::default());
}

#[test]
fn document_id_display_and_parse() {
    let id = DocumentId::new();
    let parsed: DocumentId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn invalid_text_fails_with_crate_error() {
    let err = DocumentId::parse("nope").unwrap_err();
    assert!(matches!(err, folio_types::Error::InvalidUuid(_)));
    assert!(err.to_string().contains("invalid UUID"));

    let err = "nope".parse::<ObjectId>().unwrap_err();
    assert!(matches!(err, folio_types::Error::InvalidUuid(_)));
}

proptest! {
    #[test]
    fn any_uuid_roundtrips_through_text(bits in any::<u128>()) {
        let id = ObjectId::from_uuid(uuid::Uuid::from_u128(bits));
        let parsed = ObjectId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(id, parsed);
        prop_assert_eq!(id.is_nil(), bits == 0);
    }
}
