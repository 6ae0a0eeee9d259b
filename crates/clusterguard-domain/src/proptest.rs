//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Classification totality and exclusivity
//! - Metadata diagnostic counts
//! - METADATA header parsing

use crate::correlate::correlate;
use crate::metadata::{metadata_errors, parse_annotations};
use crate::outcome::RawResult;
use crate::result::PolicyEvaluationResult;
use crate::test_support::{compiled, outcome, policy_source, skeleton};
use clusterguard_types::{Policy, ProcessingError};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

fn arb_group() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("Security".to_string()),
        Just("Reliability".to_string()),
        Just("Management".to_string()),
    ]
}

/// Header text that YAML reads back as the same plain string.
fn arb_header_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("Pol[a-z]{0,10}( [a-z0-9]{1,8}){0,3}").unwrap()
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    (
        "[a-z]{1,8}",
        arb_group(),
        prop::option::of(any::<bool>()),
        any::<bool>(),
    )
        .prop_map(|(name, group, valid, errored)| Policy {
            name,
            group,
            valid,
            processing_errors: if errored {
                vec![ProcessingError::new("test", "error")]
            } else {
                Vec::new()
            },
            ..Policy::default()
        })
}

/// Engine outcomes for names `p0..p7`; only `p0..p3` are compiled.
fn arb_outcome() -> impl Strategy<Value = RawResult> {
    prop_oneof![
        (0usize..8, any::<bool>())
            .prop_map(|(i, valid)| outcome(&format!("p{i}"), json!({ "valid": valid }))),
        (0usize..8).prop_map(|i| outcome(&format!("p{i}"), json!({ "violation": [] }))),
        Just(RawResult::default()),
    ]
}

// ============================================================================
// Classification
// ============================================================================

proptest! {
    /// Every added policy lands in exactly one bucket.
    #[test]
    fn add_policy_is_total_and_exclusive(policies in prop::collection::vec(arb_policy(), 0..30)) {
        let mut result = PolicyEvaluationResult::new();
        for policy in &policies {
            result.add_policy(policy.clone());
        }

        prop_assert_eq!(result.total(), policies.len());
        let expected_errored = policies.iter().filter(|p| p.has_processing_errors()).count();
        prop_assert_eq!(result.errored_count(), expected_errored);

        for group in result.groups() {
            prop_assert!(result.valid(group).iter().all(|p| p.valid == Some(true)));
            prop_assert!(result.violated(group).iter().all(|p| p.valid != Some(true)));
        }
        prop_assert!(result.errored().iter().all(Policy::has_processing_errors));
    }

    /// Every outcome is accounted for and every compiled policy shows up.
    #[test]
    fn correlation_never_drops_outcomes_or_policies(
        outcomes in prop::collection::vec(arb_outcome(), 0..20)
    ) {
        let policies: Vec<Policy> = (0..4)
            .map(|i| skeleton(&format!("gke.policy.p{i}"), "Security"))
            .collect();
        let compiled = compiled("gke.policy", policies, Vec::new());

        let mentioned: std::collections::BTreeSet<String> = outcomes
            .iter()
            .filter_map(|raw| raw.clone().bind().ok())
            .map(|bound| compiled.namespace().qualify(&bound.name))
            .filter(|identity| compiled.policy(identity).is_some())
            .collect();
        let unseen = compiled.len() - mentioned.len();

        let count = outcomes.len();
        let result = correlate(outcomes, &compiled);
        prop_assert_eq!(result.total(), count + unseen);

        for skeleton in compiled.policies() {
            let classified = result
                .valid("Security")
                .iter()
                .chain(result.violated("Security"))
                .filter(|p| p.name == skeleton.name)
                .count();
            prop_assert!(classified <= 1, "{} classified {} times", skeleton.name, classified);
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

proptest! {
    /// One diagnostic per empty required field.
    #[test]
    fn metadata_error_count_matches_empty_fields(
        title in prop::option::of(arb_header_text()),
        description in prop::option::of(arb_header_text()),
        group in prop::option::of(arb_header_text()),
    ) {
        let policy = Policy {
            name: "gke.policy.p".to_string(),
            title: title.clone().unwrap_or_default(),
            description: description.clone().unwrap_or_default(),
            group: group.clone().unwrap_or_default(),
            ..Policy::default()
        };
        let expected = [&title, &description, &group].iter().filter(|f| f.is_none()).count();
        let errors = metadata_errors(&policy);
        prop_assert_eq!(errors.len(), expected);
        prop_assert!(errors.len() <= 3);
    }

    /// Header fields written into a METADATA block are read back unchanged.
    #[test]
    fn header_fields_round_trip(
        title in prop::option::of(arb_header_text()),
        description in prop::option::of(arb_header_text()),
        group in prop::option::of(arb_header_text()),
    ) {
        let source = policy_source(
            "gke.policy.p",
            title.as_deref(),
            description.as_deref(),
            group.as_deref(),
        );
        let annotations = parse_annotations(&source).unwrap().unwrap();

        prop_assert_eq!(annotations.title, title);
        prop_assert_eq!(annotations.description, description);
        prop_assert_eq!(annotations.custom.and_then(|c| c.group), group);
    }

    /// Parsing never panics on arbitrary text.
    #[test]
    fn annotation_parsing_is_total(source in ".{0,200}") {
        let _ = parse_annotations(&source);
    }
}
