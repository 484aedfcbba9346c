//! Contract Test: Failure Policy
//!
//! Constraints verified:
//! - A rejected update does not stop the remaining updates
//! - Any rejected update leaves the stored IP untouched and fails the pass
//! - A failed ping aborts before records are listed
//! - A configured record missing at the registrar aborts the remaining records
//! - An unreachable IP source aborts before state or registrar are touched

mod common;

use common::*;
use porkddns_core::traits::ApiStatus;
use porkddns_core::{Error, PublicIp};
use tokio_test::assert_err;
use tracing::Level;

#[tokio::test]
async fn partial_failure_keeps_previous_state() {
    let config = config_for(&["www", "api", "@"]);
    let provider = MockDnsProvider::new(vec![
        record("1", "www.example.com", "198.51.100.1"),
        record("2", "api.example.com", "198.51.100.1"),
        record("3", "example.com", "198.51.100.1"),
    ])
    .rejecting("api");
    let state = MockStateStore::with_ip("198.51.100.1");
    let (reconciler, sink) =
        reconciler(FixedIpSource::new("203.0.113.7"), &provider, &state, &config);

    let err = assert_err!(reconciler.run_pass().await);

    match err {
        Error::RecordsFailed { failed, total } => {
            assert_eq!(failed, vec!["api".to_string()]);
            assert_eq!(total, 3);
        }
        other => panic!("expected RecordsFailed, got {:?}", other),
    }
    assert_eq!(provider.updates().len(), 3, "remaining records are still attempted");
    assert_eq!(state.commit_count(), 0);
    assert_eq!(state.stored(), Some(PublicIp::new("198.51.100.1")));
    assert!(sink.contains("1 of 3 record update(s) failed (api)"));
}

#[tokio::test]
async fn all_updates_failing_is_reported_distinctly() {
    let config = config_for(&["www", "@"]);
    let provider = MockDnsProvider::new(vec![
        record("1", "www.example.com", "198.51.100.1"),
        record("2", "example.com", "198.51.100.1"),
    ])
    .rejecting("www")
    .rejecting("");
    let state = MockStateStore::new();
    let (reconciler, sink) =
        reconciler(FixedIpSource::new("203.0.113.7"), &provider, &state, &config);

    let err = assert_err!(reconciler.run_pass().await);

    assert!(matches!(err, Error::RecordsFailed { ref failed, total: 2 } if failed.len() == 2));
    assert_eq!(state.stored(), None);
    assert!(sink.contains("All 2 record update(s) failed"));
}

#[tokio::test]
async fn failed_ping_aborts_before_listing() {
    let config = config_for(&["www"]);
    let provider = MockDnsProvider::new(vec![record("1", "www.example.com", "198.51.100.1")])
        .with_ping_status(ApiStatus::from_fields(
            Some("ERROR".to_string()),
            Some("Invalid API key. (002)".to_string()),
        ));
    let state = MockStateStore::new();
    let (reconciler, sink) =
        reconciler(FixedIpSource::new("203.0.113.7"), &provider, &state, &config);

    let err = assert_err!(reconciler.run_pass().await);

    assert!(matches!(err, Error::Authentication(_)), "got {:?}", err);
    assert_eq!(provider.calls(), vec![ProviderCall::Ping]);
    assert_eq!(state.commit_count(), 0);
    assert!(sink.contains("Ping response: ERROR: Invalid API key. (002)"));
}

#[tokio::test]
async fn ping_without_status_is_an_authentication_failure() {
    let config = config_for(&["www"]);
    let provider = MockDnsProvider::new(vec![record("1", "www.example.com", "198.51.100.1")])
        .with_ping_status(ApiStatus::from_fields(None, None));
    let state = MockStateStore::new();
    let (reconciler, _sink) =
        reconciler(FixedIpSource::new("203.0.113.7"), &provider, &state, &config);

    let err = assert_err!(reconciler.run_pass().await);

    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(provider.list_count(), 0);
}

#[tokio::test]
async fn unmatched_record_aborts_remaining_records() {
    let config = config_for(&["www", "missing", "api"]);
    let provider = MockDnsProvider::new(vec![
        record("1", "www.example.com", "198.51.100.1"),
        record("2", "api.example.com", "198.51.100.1"),
    ]);
    let state = MockStateStore::new();
    let (reconciler, sink) =
        reconciler(FixedIpSource::new("203.0.113.7"), &provider, &state, &config);

    let err = assert_err!(reconciler.run_pass().await);

    match err {
        Error::RecordNotFound {
            name,
            record_type,
            domain,
        } => {
            assert_eq!(name, "missing.example.com");
            assert_eq!(record_type, "A");
            assert_eq!(domain, DOMAIN);
        }
        other => panic!("expected RecordNotFound, got {:?}", other),
    }
    let names: Vec<String> = provider.updates().into_iter().map(|u| u.name).collect();
    assert_eq!(names, vec!["www"], "records after the unmatched one are not attempted");
    assert_eq!(state.commit_count(), 0);
    assert!(
        sink.lines()
            .iter()
            .any(|(level, line)| *level == Level::ERROR && line.contains("missing.example.com"))
    );
}

#[tokio::test]
async fn unreachable_ip_source_touches_nothing() {
    let config = config_for(&["www"]);
    let provider = MockDnsProvider::new(vec![record("1", "www.example.com", "198.51.100.1")]);
    let state = MockStateStore::new();
    let (reconciler, sink) = reconciler(UnreachableIpSource, &provider, &state, &config);

    let err = assert_err!(reconciler.run_pass().await);

    assert!(matches!(err, Error::RetryExhausted { attempts: 10, .. }), "got {:?}", err);
    assert_eq!(state.read_count(), 0);
    assert!(provider.calls().is_empty());
    assert!(sink.contains("public IP lookup failed after 10 attempt(s)"));
}
