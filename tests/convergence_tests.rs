//! # Convergence Tests: Concurrency and Crash Recovery
//!
//! Hammers the ledger from many threads to check single admission and the
//! balance bound under contention, then simulates a crash between the
//! result row and the snapshot write.

use assay_codec::{Catalog, Outcome, ResultRecord};
use assay_core::{
    AssignmentLedger, Credentials, Identity, LedgerError, LoginRequest, ResourceRegistry,
    ResultLedger, SharedSecret,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::Path;
use std::time::Instant;

static_assertions::assert_impl_all!(AssignmentLedger: Send, Sync);

const LABELS: [&str; 4] = ["Al", "Cu", "Fe", "Zn"];

fn open(dir: &Path, seed: u64) -> AssignmentLedger {
    let catalog: Catalog = LABELS
        .iter()
        .map(|label| (label.to_string(), serde_json::from_value(json!({})).unwrap()))
        .collect();
    let registry = ResourceRegistry::from_catalog(catalog).unwrap();
    let credentials = Credentials::new(SharedSecret::new("Chem123"), SharedSecret::new("Chem123"));
    AssignmentLedger::open(dir, registry, credentials, Box::new(StdRng::seed_from_u64(seed))).unwrap()
}

fn request(id: u32, period: &str) -> LoginRequest {
    LoginRequest {
        full_name: format!("Student {id}"),
        id950: format!("{id:08}"),
        period: period.to_string(),
        password: "Chem123".to_string(),
    }
}

/// Sixteen racing logins for one identity: exactly one wins.
#[test]
fn test_concurrent_single_admission() {
    let t = Instant::now();

    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path(), 3);

    let outcomes: Vec<Result<_, LedgerError>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| s.spawn(|| ledger.login(&request(95_000_100, "1"))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::Conflict { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(ledger.counts()["1"].values().sum::<u64>(), 1);

    let overhead = t.elapsed();
    println!("test_concurrent_single_admission: Testing Overhead = {:?}", overhead);
}

/// Concurrent logins across two groups keep each group within max - min <= 1.
#[test]
fn test_concurrent_balance_bound() {
    let t = Instant::now();

    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path(), 8);

    std::thread::scope(|s| {
        for worker in 0..8u32 {
            let ledger = &ledger;
            s.spawn(move || {
                for i in 0..10u32 {
                    let id = 95_100_000 + worker * 100 + i;
                    let period = if i % 2 == 0 { "1" } else { "2" };
                    ledger.login(&request(id, period)).unwrap();
                }
            });
        }
    });

    let counts = ledger.counts();
    for period in ["1", "2"] {
        let per = &counts[period];
        let max = per.values().max().copied().unwrap();
        let min = per.values().min().copied().unwrap();
        assert!(max - min <= 1, "group {period} unbalanced: {per:?}");
        assert_eq!(per.values().sum::<u64>(), 40);
    }
    assert_eq!(ledger.status().active, 80);

    let overhead = t.elapsed();
    println!("test_concurrent_balance_bound: Testing Overhead = {:?}", overhead);
}

/// Racing submits with one token: one outcome, one row, the rest NotFound.
#[test]
fn test_concurrent_single_consumption() {
    let t = Instant::now();

    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path(), 5);
    let admitted = ledger.login(&request(95_000_200, "3")).unwrap();
    let token = admitted.token.as_str();

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| ledger.submit(token, "Zn")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(LedgerError::NotFound))));
    assert_eq!(ledger.results().unwrap().len(), 1);

    let overhead = t.elapsed();
    println!("test_concurrent_single_consumption: Testing Overhead = {:?}", overhead);
}

/// A result row without the matching snapshot update still consumes the identity.
#[test]
fn test_crash_between_row_and_snapshot_converges() {
    let t = Instant::now();

    let dir = tempfile::tempdir().unwrap();
    let (token, resource) = {
        let ledger = open(dir.path(), 13);
        let admitted = ledger.login(&request(95_000_300, "6")).unwrap();
        (admitted.token, admitted.resource)
    };

    // Row committed, process died before the snapshot was rewritten.
    let mut results = ResultLedger::open(dir.path().join("results.csv")).unwrap();
    results
        .append(&ResultRecord {
            identity: "95000300".into(),
            display_name: "Student 95000300".into(),
            guess: resource.clone(),
            correct: resource,
            outcome: Outcome::Correct,
            group: "6".into(),
        })
        .unwrap();

    let ledger = open(dir.path(), 13);
    let identity = Identity::parse("95000300").unwrap();
    assert!(ledger.is_used(&identity));
    assert!(!ledger.is_active(&identity));
    assert!(matches!(ledger.submit(token.as_str(), "Zn"), Err(LedgerError::NotFound)));
    assert!(matches!(
        ledger.login(&request(95_000_300, "6")),
        Err(LedgerError::Conflict { .. })
    ));
    assert_eq!(ledger.counts()["6"].values().sum::<u64>(), 1, "allocation history is kept");

    // Reconciliation was written back; a second reopen agrees.
    drop(ledger);
    let ledger = open(dir.path(), 13);
    assert!(ledger.is_used(&identity));

    let overhead = t.elapsed();
    println!("test_crash_between_row_and_snapshot_converges: Testing Overhead = {:?}", overhead);
}

/// A row torn by a crash mid-append is dropped on reopen; its session stays live.
#[test]
fn test_torn_result_row_is_discarded() {
    use std::io::Write;

    let t = Instant::now();

    let dir = tempfile::tempdir().unwrap();
    let pending = {
        let ledger = open(dir.path(), 17);
        let done = ledger.login(&request(95_000_001, "1")).unwrap();
        ledger.submit(done.token.as_str(), "Al").unwrap();
        ledger.login(&request(95_000_002, "1")).unwrap()
    };

    let path = dir.path().join("results.csv");
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b"95000002,S,A").unwrap();
    drop(file);

    let ledger = open(dir.path(), 17);
    let results = ledger.results().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].identity, "95000001");

    let identity = Identity::parse("95000002").unwrap();
    assert!(ledger.is_active(&identity));
    assert!(!ledger.is_used(&identity));
    ledger.submit(pending.token.as_str(), &pending.resource).unwrap();
    assert_eq!(ledger.results().unwrap().len(), 2);
    assert!(ledger.is_used(&identity));

    let overhead = t.elapsed();
    println!("test_torn_result_row_is_discarded: Testing Overhead = {:?}", overhead);
}

/// A corrupt snapshot refuses to open instead of silently starting empty.
#[test]
fn test_corrupt_snapshot_is_fatal() {
    let t = Instant::now();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ledger.json"), b"{\"used\": [\"12\"]}").unwrap();

    let credentials = Credentials::new(SharedSecret::new("a"), SharedSecret::new("b"));
    let catalog: Catalog = [("Zn".to_string(), serde_json::from_value(json!({})).unwrap())]
        .into_iter()
        .collect();
    let result = AssignmentLedger::open(
        dir.path(),
        ResourceRegistry::from_catalog(catalog).unwrap(),
        credentials,
        Box::new(StdRng::seed_from_u64(0)),
    );
    assert!(matches!(result, Err(LedgerError::Config(_))));

    let overhead = t.elapsed();
    println!("test_corrupt_snapshot_is_fatal: Testing Overhead = {:?}", overhead);
}
