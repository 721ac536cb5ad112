//! Integration tests for csig-envelope.

use chrono::{TimeZone, Utc};
use csig_envelope::{
    build_envelope, validate_shape, EnvelopeBuilder, EnvelopeParts, ExpectedType, ShapeHint,
    StageOutcome, ValidationResult, ValidationStatus,
};
use serde_json::{json, Map};

#[test]
fn test_failed_validation_envelope() {
    let validation = validate_shape(
        &json!({"items": {}}),
        &[ShapeHint::required("value", ExpectedType::Array)],
    );
    assert!(validation.is_failed());

    let envelope = EnvelopeBuilder::new(json!({"isMfaEnforced": false}))
        .validation(validation)
        .fail_reason("input failed validation")
        .recommendation("check that the identity provider returned a user list")
        .build();

    let v = envelope.into_value();
    let info = &v["additionalInfo"];
    assert_eq!(info["validation"]["status"], "failed");
    assert_eq!(info["validation"]["errors"], json!(["missing 'value'"]));
    assert_eq!(info["evaluation"]["failReasons"], json!(["input failed validation"]));
    assert_eq!(info["transformation"]["status"], "success");
}

#[test]
fn test_one_call_and_builder_agree() {
    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let mut metadata = Map::new();
    metadata.insert("vendor".into(), json!("acme"));

    let from_parts = build_envelope(
        json!({"isBackupEnabled": false}),
        EnvelopeParts {
            validation: Some(ValidationResult::passed()),
            fail_reasons: vec!["no enabled jobs".into()],
            transformation_errors: vec!["jobs list empty".into()],
            metadata: metadata.clone(),
            transformation_id: Some("acme.backup".into()),
            evaluated_at: Some(at),
            ..Default::default()
        },
    );
    let from_builder = EnvelopeBuilder::new(json!({"isBackupEnabled": false}))
        .validation(ValidationResult::passed())
        .fail_reasons(vec!["no enabled jobs".into()])
        .transformation_error("jobs list empty")
        .metadata_override(metadata)
        .transformation_id("acme.backup")
        .evaluated_at(at)
        .build();

    assert_eq!(from_parts, from_builder);
    assert_eq!(from_parts.transformation_status(), StageOutcome::Error);
    assert_eq!(from_parts.additional_info.metadata["evaluationDate"], "2026-01-02T03:04:05Z");
    assert!(!from_parts.is_compliant("isBackupEnabled"));
}

#[test]
fn test_envelope_round_trips_through_json() {
    let envelope = EnvelopeBuilder::new(json!({"isEndpointProtectionDeployed": true}))
        .input_summary(json!({"type": "mapping", "keyCount": 1, "keys": ["value"]}))
        .build();

    let text = serde_json::to_string(&envelope).unwrap();
    let back: csig_envelope::EvaluationEnvelope = serde_json::from_str(&text).unwrap();
    assert_eq!(back, envelope);
}

#[test]
fn test_shape_hints_from_yaml() {
    let hints: Vec<ShapeHint> = serde_yaml::from_str(
        r#"
- path: value
  expect: array
- path: nextLink
  expect: string
  required: false
"#,
    )
    .unwrap();

    let v = validate_shape(&json!({"value": []}), &hints);
    assert_eq!(v.status, ValidationStatus::Passed);
    assert_eq!(v.warnings, vec!["missing 'nextLink'"]);
}

#[test]
fn test_primary_flag_absent_or_non_bool() {
    let envelope = EnvelopeBuilder::new(json!({"score": 80})).build();
    assert_eq!(envelope.primary_flag("score"), None);
    assert_eq!(envelope.primary_flag("isBackupEnabled"), None);
    assert!(!envelope.is_compliant("isBackupEnabled"));
}
