//! Integration tests for altgraph-resolver
//!
//! End-to-end resolution scenarios plus property tests for the invariants
//! every mutation must preserve.

use altgraph_domain::{Evidence, OverrideRule, ParsedTranscript, QuarantineSeed, RawBatch};
use altgraph_extractor::{parse_batch, parse_transcript_at, to_evidence};
use altgraph_resolver::{
    apply_overrides, expand_fixpoint, merge, merge_batch, merge_observation, parse_overrides,
    QuarantinePlan,
};
use altgraph_store::IdentityStore;
use chrono::{Duration, Utc};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn transcript(main: &str, alts: &[&str], ips: &[&str]) -> Evidence {
    Evidence::Transcript(ParsedTranscript {
        main: main.to_string(),
        alts: alts.iter().map(|s| s.to_string()).collect(),
        ips: ips.iter().map(|s| s.to_string()).collect(),
        timestamp: Utc::now(),
    })
}

#[test]
fn test_transcripts_chain_into_one_group() {
    let mut store = IdentityStore::in_memory();
    merge_observation(&mut store, &transcript("alice", &["bob"], &["1.2.3.4"]).into_observation());
    merge_observation(&mut store, &transcript("bob", &["carol"], &["5.6.7.8"]).into_observation());

    for id in ["alice", "bob", "carol"] {
        let record = store.get(id).unwrap();
        assert_eq!(record.alts, set(&["alice", "bob", "carol"]));
        assert_eq!(record.ips, set(&["1.2.3.4", "5.6.7.8"]));
    }
    assert!(store.closure_violations().is_empty());
}

#[test]
fn test_override_inherits_ips_from_members() {
    let mut store = IdentityStore::in_memory();
    merge_observation(&mut store, &transcript("eve", &[], &["9.9.9.9"]).into_observation());
    merge_observation(&mut store, &transcript("mallory", &[], &["8.8.8.8"]).into_observation());

    let rules = parse_overrides(r#"{"eve": {"alts": ["mallory"]}}"#);
    assert!(apply_overrides(&mut store, &rules, Utc::now()));

    assert_eq!(store.get("eve").unwrap().ips, set(&["8.8.8.8", "9.9.9.9"]));
    assert_eq!(store.get("mallory").unwrap().ips, set(&["8.8.8.8", "9.9.9.9"]));
}

#[test]
fn test_quarantine_strips_seed_from_other_records() {
    let ts = Utc::now();
    let batch = parse_batch(r#"{"X": ["Y", "Z"], "W": ["X", "Y"]}"#).unwrap();
    let seed = QuarantineSeed::new(["X"], Vec::<String>::new());
    let plan = QuarantinePlan::build(&batch, &seed);

    assert!(!plan.quarantined.contains("W"));
    assert_eq!(plan.isolated_pool, set(&["Y", "Z"]));
    assert_eq!(plan.filtered_batch.get("W"), Some(&vec!["Y".to_string()]));

    let mut store = IdentityStore::in_memory();
    merge_batch(&mut store, &plan.filtered_batch, ts);
    plan.apply_isolation(&mut store, ts);

    assert_eq!(store.get("X").unwrap().alts, set(&["X", "Y", "Z"]));
    assert!(store.get("X").unwrap().ips.is_empty());
    assert!(store.closure_violations().is_empty());
}

#[test]
fn test_override_severs_fourth_member() {
    let ts = Utc::now();
    let mut store = IdentityStore::in_memory();
    merge(&mut store, &set(&["p1", "p2", "p3", "stray"]), &set(&["4.4.4.4"]), ts);

    let rules = vec![OverrideRule::new("p1", ["p2", "p3"])];
    assert!(apply_overrides(&mut store, &rules, ts));

    let stray = store.get("stray").unwrap();
    assert!(stray.alts.contains("stray"));
    assert!(!stray.alts.iter().any(|a| ["p1", "p2", "p3"].contains(&a.as_str())));
    assert_eq!(store.get("p2").unwrap().alts, set(&["p1", "p2", "p3"]));
    assert!(store.closure_violations().is_empty());
}

#[test]
fn test_disjoint_rules_are_idempotent() {
    let ts = Utc::now();
    let mut store = IdentityStore::in_memory();
    merge(&mut store, &set(&["a", "b", "c", "d"]), &set(&["1.1.1.1"]), ts);
    merge(&mut store, &set(&["d", "e"]), &set(&["2.2.2.2"]), ts);

    let rules = vec![OverrideRule::new("a", ["b"]), OverrideRule::new("c", ["e"])];
    assert!(apply_overrides(&mut store, &rules, ts));
    let settled = store.clone();
    assert!(!apply_overrides(&mut store, &rules, ts + Duration::days(1)));
    assert_eq!(store, settled);
}

#[test]
fn test_full_pipeline_from_text() {
    let ts = Utc::now();
    let mut store = IdentityStore::in_memory();

    let batch = parse_batch(r#"{"10.0.0.1": ["alice", "bob"], "10.0.0.2": ["carol"]}"#).unwrap();
    merge_batch(&mut store, &batch, ts);

    let parsed = parse_transcript_at("carol has 1 alts:\n-> bob\nOn 1 IPs:\n-> 10.0.0.3", ts).unwrap();
    merge_observation(&mut store, &to_evidence(parsed).into_observation());

    let alice = store.get("alice").unwrap();
    assert_eq!(alice.alts, set(&["alice", "bob", "carol"]));
    assert_eq!(alice.ips, set(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]));
}

const NAMES: &[&str] = &["alice", "bob", "carol", "dave", "eve", "frank", "grace", "heidi"];
const IPS: &[&str] = &["1.1.1.1", "2.2.2.2", "3.3.3.3", "2001:db8::1", "bogus"];

fn observation() -> impl Strategy<Value = (BTreeSet<String>, BTreeSet<String>)> {
    (
        prop::collection::btree_set(prop::sample::select(NAMES), 0..4),
        prop::collection::btree_set(prop::sample::select(IPS), 0..3),
    )
        .prop_map(|(members, ips)| {
            (
                members.into_iter().map(String::from).collect(),
                ips.into_iter().map(String::from).collect(),
            )
        })
}

fn rule() -> impl Strategy<Value = OverrideRule> {
    (
        prop::sample::select(NAMES),
        prop::collection::btree_set(prop::sample::select(NAMES), 0..4),
        prop::option::of(prop::collection::btree_set(prop::sample::select(IPS), 0..3)),
    )
        .prop_map(|(main, alts, ips)| {
            let rule = OverrideRule::new(main, alts);
            match ips {
                Some(ips) => rule.with_pinned_ips(ips),
                None => rule,
            }
        })
}

fn raw_batch() -> impl Strategy<Value = RawBatch> {
    let keys = prop::sample::select(vec!["k1", "k2", "k3", "k4", "alice", "bob", "1.1.1.1"]);
    let pool = prop::sample::select(vec!["k1", "k2", "k3", "alice", "bob", "carol", "...x"]);
    prop::collection::btree_map(keys, prop::collection::vec(pool, 0..4), 0..6).prop_map(|b| {
        b.into_iter()
            .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
            .collect()
    })
}

fn build_store(observations: &[(BTreeSet<String>, BTreeSet<String>)]) -> IdentityStore {
    let ts = Utc::now();
    let mut store = IdentityStore::in_memory();
    for (members, ips) in observations {
        merge(&mut store, members, ips, ts);
    }
    store
}

proptest! {
    #[test]
    fn prop_merges_preserve_closure(observations in prop::collection::vec(observation(), 0..12)) {
        let store = build_store(&observations);
        prop_assert!(store.closure_violations().is_empty());
    }

    #[test]
    fn prop_merge_is_monotonic(
        observations in prop::collection::vec(observation(), 0..10),
        next in observation(),
    ) {
        let mut store = build_store(&observations);
        let before = store.clone();
        merge(&mut store, &next.0, &next.1, Utc::now());

        for member in &next.0 {
            if let Some(old) = before.get(member) {
                let new = store.get(member).unwrap();
                prop_assert!(new.alts.is_superset(&old.alts));
                prop_assert!(new.ips.is_superset(&old.ips));
            }
        }
    }

    #[test]
    fn prop_override_applied_twice_is_noop(
        observations in prop::collection::vec(observation(), 0..10),
        rule in rule(),
    ) {
        let mut store = build_store(&observations);
        let rules = vec![rule];
        apply_overrides(&mut store, &rules, Utc::now());
        prop_assert!(store.closure_violations().is_empty());

        let settled = store.clone();
        prop_assert!(!apply_overrides(&mut store, &rules, Utc::now() + Duration::hours(1)));
        prop_assert_eq!(store, settled);
    }

    #[test]
    fn prop_fixpoint_is_stable(batch in raw_batch()) {
        let seed = QuarantineSeed::new(["alice"], Vec::<String>::new()).with_prefixes(["..."]);
        let q0 = seed.initial_set(&batch);
        let q = expand_fixpoint(&q0, &batch);
        prop_assert!(q.is_superset(&q0));
        prop_assert_eq!(expand_fixpoint(&q, &batch), q);
    }

    #[test]
    fn prop_quarantine_preserves_closure(
        observations in prop::collection::vec(observation(), 0..8),
        batch in raw_batch(),
    ) {
        let ts = Utc::now();
        let mut store = build_store(&observations);
        let seed = QuarantineSeed::new(["alice"], ["3.3.3.3"]);
        let plan = QuarantinePlan::build(&batch, &seed);
        merge_batch(&mut store, &plan.filtered_batch, ts);
        plan.apply_isolation(&mut store, ts);

        prop_assert!(store.closure_violations().is_empty());
        for member in plan.filtered_batch.values().flatten() {
            prop_assert!(!plan.quarantined.contains(member));
        }
    }
}
