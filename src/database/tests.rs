use super::*;

#[test]
fn faq_record_structure() {
    let record = FaqRecord {
        id: "faq_123".to_string(),
        values: vec![0.1, 0.2, 0.3],
        metadata: Some(FaqMetadata::new("What is the return policy?", "30 days.")),
    };

    assert_eq!(record.id, "faq_123");
    assert_eq!(record.values.len(), 3);
    assert_eq!(
        record.metadata.as_ref().and_then(|m| m.answer.as_deref()),
        Some("30 days.")
    );
}

#[test]
fn faq_metadata_serialization() {
    let metadata = FaqMetadata::new("Do you ship abroad?", "Yes, to most countries.");

    let json = serde_json::to_string(&metadata).expect("can serialize json");
    assert!(json.contains("\"question\""));
    let deserialized: FaqMetadata = serde_json::from_str(&json).expect("can parse json");

    assert_eq!(metadata, deserialized);
}

#[test]
fn default_query_options() {
    let options = QueryOptions::default();
    assert_eq!(options.top_k, 1);
    assert!(options.return_metadata);
}
