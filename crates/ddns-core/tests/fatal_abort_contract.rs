//! Contract Test: Run-Fatal vs Per-Host Failures
//!
//! Constraints verified:
//! - No public IP means no provider calls at all
//! - No zone means no record listing and no writes
//! - A failed zone lookup is run-fatal, not a per-host failure
//! - A failed record listing fails every host but still completes the run
//! - The first returned zone is used even when its name differs

mod common;

use common::*;
use ddns_core::traits::HostedZone;
use ddns_core::{Error, HostOutcome, Reconciler};

#[tokio::test]
async fn ip_failure_aborts_before_any_provider_call() {
    let source = ScriptedIpSource::failing("connection refused");
    let provider = MockDnsProvider::new();

    let reconciler = Reconciler::new(
        Box::new(ScriptedIpSource::sharing_counters_with(&source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        config_for(&["a.example.net"]),
    )
    .expect("reconciler construction succeeds");

    let err = reconciler.reconcile().await.expect_err("run must abort");

    assert!(matches!(err, Error::Network(_)), "got {err:?}");
    assert!(err.is_fatal());
    assert_eq!(source.call_count(), 1, "IP is resolved exactly once");
    assert_eq!(provider.lookup_call_count(), 0);
    assert_eq!(provider.list_call_count(), 0);
    assert_eq!(provider.upsert_call_count(), 0);
}

#[tokio::test]
async fn non_network_ip_error_is_reported_as_network_error() {
    let reconciler = Reconciler::new(
        Box::new(ScriptedIpSource::failing_with_other("body had no ip= line")),
        Box::new(MockDnsProvider::new()),
        config_for(&["a.example.net"]),
    )
    .expect("reconciler construction succeeds");

    let err = reconciler.reconcile().await.expect_err("run must abort");

    match err {
        Error::Network(msg) => assert!(msg.contains("body had no ip= line"), "got {msg}"),
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_zone_aborts_before_host_processing() {
    let provider = MockDnsProvider::without_zones().with_address("a.example.net", "9.9.9.9");

    let reconciler = Reconciler::new(
        Box::new(ScriptedIpSource::returning(ip(1, 2, 3, 4))),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        config_for(&["a.example.net", "b.example.net"]),
    )
    .expect("reconciler construction succeeds");

    let err = reconciler.reconcile().await.expect_err("run must abort");

    match &err {
        Error::ZoneNotFound { zone } => assert_eq!(zone, ZONE_NAME),
        other => panic!("expected zone-not-found, got {other:?}"),
    }
    assert!(err.is_fatal());
    assert_eq!(provider.lookup_call_count(), 1);
    assert_eq!(provider.list_call_count(), 0);
    assert_eq!(provider.upsert_call_count(), 0);
}

#[tokio::test]
async fn zone_lookup_failure_aborts_before_host_processing() {
    let provider = MockDnsProvider::new()
        .with_address("a.example.net", "9.9.9.9")
        .failing_lookup();

    let reconciler = Reconciler::new(
        Box::new(ScriptedIpSource::returning(ip(1, 2, 3, 4))),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        config_for(&["a.example.net", "b.example.net"]),
    )
    .expect("reconciler construction succeeds");

    let err = reconciler.reconcile().await.expect_err("run must abort");

    match &err {
        Error::ZoneLookup { zone, message } => {
            assert_eq!(zone, ZONE_NAME);
            assert!(message.contains("AccessDenied"), "diagnostic kept: {message}");
        }
        other => panic!("expected zone lookup failure, got {other:?}"),
    }
    assert!(err.is_fatal());
    assert_eq!(provider.lookup_call_count(), 1);
    assert_eq!(provider.list_call_count(), 0);
    assert_eq!(provider.upsert_call_count(), 0);
}

#[tokio::test]
async fn listing_failure_fails_each_host_without_writes() {
    let provider = MockDnsProvider::new().failing_listing();

    let reconciler = Reconciler::new(
        Box::new(ScriptedIpSource::returning(ip(1, 2, 3, 4))),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        config_for(&["a.example.net", "b.example.net"]),
    )
    .expect("reconciler construction succeeds");

    let report = reconciler.reconcile().await.expect("run still completes");

    assert_eq!(provider.list_call_count(), 1, "zone is walked once");
    assert_eq!(provider.upsert_call_count(), 0);
    assert_eq!(report.failed_count(), 2);
    for host in &report.hosts {
        match &host.outcome {
            HostOutcome::Failed { error } => {
                assert!(error.contains("AccessDenied"), "diagnostic kept: {error}");
                assert!(error.contains(ZONE_ID), "zone id in diagnostic: {error}");
            }
            other => panic!("expected failure for {}, got {other:?}", host.host),
        }
    }
}

#[tokio::test]
async fn first_returned_zone_is_used_without_disambiguation() {
    let provider = MockDnsProvider::new().with_zones(vec![
        HostedZone::new("ZOTHER", "example.org."),
        HostedZone::new(ZONE_ID, "example.net."),
    ]);

    let reconciler = Reconciler::new(
        Box::new(ScriptedIpSource::returning(ip(1, 2, 3, 4))),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        config_for(&["a.example.net"]),
    )
    .expect("reconciler construction succeeds");

    let report = reconciler.reconcile().await.expect("run completes");

    assert_eq!(report.zone_id, "ZOTHER");
    assert_eq!(provider.upserts()[0].zone_id, "ZOTHER");
}
