//! Integration tests for csig-coverage.
//!
//! Score vendor-shaped inventories with the built-in profiles and with
//! profiles loaded from YAML.

use csig_coverage::{
    evaluate, percentage, CategoryRule, CoverageScorer, Denominator, Predicate, ThresholdProfile,
};
use serde_json::{json, Value};

fn inventory(servers: usize, protected_servers: usize, computers: usize, protected_computers: usize) -> Vec<Value> {
    let mut assets = Vec::new();
    for i in 0..servers {
        assets.push(json!({"type": "Windows Server 2022", "protected": i < protected_servers}));
    }
    for i in 0..computers {
        assets.push(json!({"type": "workstation", "protectionStatus": if i < protected_computers { "protected" } else { "unprotected" }}));
    }
    assets
}

// =============================================================================
// Denominators
// =============================================================================

#[test]
fn test_ten_assets_four_servers_two_protected() {
    let profile = ThresholdProfile::endpoint_protection();
    let scorer = profile.build_scorer().unwrap();

    let report = scorer.score(&inventory(4, 2, 6, 0));
    assert_eq!(report.total_assets, 10);
    assert_eq!(report.partition("server"), 4);
    assert_eq!(report.partition("computer"), 6);
    assert_eq!(report.score("Server Protection"), 50);
    assert_eq!(report.score("Endpoint Protection"), 0);
    assert_eq!(report.score("Protected"), 20);
}

#[test]
fn test_no_assets_of_relevant_type() {
    let profile = ThresholdProfile::endpoint_protection();
    let scorer = profile.build_scorer().unwrap();

    let report = scorer.score(&inventory(0, 0, 3, 3));
    assert_eq!(report.denominator("Server Protection"), 0);
    assert_eq!(report.score("Server Protection"), 0);
    assert_eq!(report.score("Endpoint Protection"), 100);

    let flags = profile.derive_flags(&report);
    assert!(!flags["isServerProtectionDeployed"]);
    assert!(flags["isEndpointProtectionDeployed"]);
}

#[test]
fn test_encryption_measured_against_protected() {
    let assets = vec![
        json!({"type": "laptop", "protected": true, "encryptionStatus": "Encrypted"}),
        json!({"type": "laptop", "protected": true, "encrypted": false}),
        json!({"type": "laptop", "protected": false, "encrypted": true}),
    ];
    let evaluation = evaluate(&ThresholdProfile::endpoint_protection(), &json!({"endpoints": assets})).unwrap();

    assert_eq!(evaluation.report.denominator("Disk Encryption"), 2);
    assert_eq!(evaluation.report.score("Disk Encryption"), 50);
    assert!(evaluation.flags["isDiskEncryptionEnabled"]);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_scores_bounded_and_monotonic() {
    let scorer = CoverageScorer::new(vec![CategoryRule::new(
        "On",
        Predicate::field_truthy("on"),
        Denominator::TotalAssets,
    )])
    .unwrap();

    for total in 0..=25usize {
        let mut previous = 0u8;
        for on in 0..=total {
            let assets: Vec<Value> = (0..total).map(|i| json!({"on": i < on})).collect();
            let score = scorer.score(&assets).score("On");
            assert!(score <= 100);
            assert!(score >= previous, "score dropped at {}/{}", on, total);
            previous = score;
        }
    }

    assert_eq!(percentage(0, 0), 0);
}

#[test]
fn test_malformed_asset_lists() {
    let scorer = ThresholdProfile::backup_coverage().build_scorer().unwrap();

    for bad in [json!(null), json!(3), json!("jobs"), json!({"jobs": []})] {
        assert!(scorer.score_value(&bad).is_err(), "should reject {}", bad);
    }

    let zero = scorer.zeroed();
    assert!(zero.scores.values().all(|s| *s == 0));
    assert_eq!(zero.scores.len(), 2);
}

// =============================================================================
// YAML profiles
// =============================================================================

#[test]
fn test_yaml_profile_with_classifier_overrides() {
    let yaml = r#"
name: rubrik-sla@1.0
asset_keys: [slaDomains]
classifier:
  type_keys: [objectType]
  aliases:
    vmwarevm: cloud
    mssqldatabase: server
categories:
  - name: Protected Objects
    predicate:
      kind: not
      predicate: { kind: field_equals, field: slaName, value: Unprotected }
  - name: Protected VMs
    predicate:
      kind: all
      of:
        - { kind: type_is, asset_type: cloud }
        - kind: not
          predicate: { kind: field_equals, field: slaName, value: Unprotected }
    denominator: { kind: asset_type, asset_type: cloud }
flags:
  - criteria_key: isBackupEnabled
    category: Protected Objects
  - criteria_key: areVmsProtected
    category: Protected VMs
    threshold: { kind: at_least, percent: 100 }
"#;
    let profile = ThresholdProfile::from_yaml(yaml).unwrap();
    let payload = json!({"slaDomains": [
        {"objectType": "VmwareVm", "slaName": "Gold"},
        {"objectType": "VmwareVm", "slaName": "unprotected"},
        {"objectType": "MssqlDatabase", "slaName": "Silver"},
    ]});

    let evaluation = evaluate(&profile, &payload).unwrap();
    assert_eq!(evaluation.report.partition("cloud"), 2);
    assert_eq!(evaluation.report.partition("server"), 1);
    assert_eq!(evaluation.report.score("Protected Objects"), 67);
    assert_eq!(evaluation.report.score("Protected VMs"), 50);
    assert!(evaluation.flags["isBackupEnabled"]);
    assert!(!evaluation.flags["areVmsProtected"]);
}
