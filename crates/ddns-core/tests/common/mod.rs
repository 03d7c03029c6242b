//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles keep just enough behavior to observe what the reconciler asks
//! of its collaborators: call counters, an in-memory zone with paging, and
//! failure injection.

#![allow(dead_code)]

use ddns_core::config::ReconcileConfig;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{
    ChangeConfirmation, DnsProvider, HostedZone, IpSource, RecordCursor, RecordSet, RecordSetPage,
};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "Z0123456789EXAMPLE";
pub const ZONE_NAME: &str = "example.net";

/// An IP source that returns a fixed answer
pub struct ScriptedIpSource {
    answer: std::result::Result<Ipv4Addr, String>,
    /// When set, failures come back as a non-network error
    fail_as_other: bool,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn returning(ip: Ipv4Addr) -> Self {
        Self {
            answer: Ok(ip),
            fail_as_other: false,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            fail_as_other: false,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_with_other(message: &str) -> Self {
        Self {
            fail_as_other: true,
            ..Self::failing(message)
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new source with the same answer that shares the call counter
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            answer: other.answer.clone(),
            fail_as_other: other.fail_as_other,
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(ip) => Ok(*ip),
            Err(msg) if self.fail_as_other => Err(Error::Other(msg.clone())),
            Err(msg) => Err(Error::network(msg.clone())),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A recorded UPSERT call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub zone_id: String,
    pub fqdn: String,
    pub value: Ipv4Addr,
    pub ttl: u32,
}

/// In-memory provider with a single paged zone
pub struct MockDnsProvider {
    zones: Vec<HostedZone>,
    /// Zone contents, in listing order
    records: Arc<Mutex<Vec<RecordSet>>>,
    page_size: usize,
    /// Hosts whose UPSERT is rejected
    failing_hosts: Arc<Mutex<HashSet<String>>>,
    fail_lookup: bool,
    fail_listing: bool,
    stuck_cursor: bool,
    lookup_call_count: Arc<AtomicUsize>,
    list_call_count: Arc<AtomicUsize>,
    upserts: Arc<Mutex<Vec<Upsert>>>,
}

impl MockDnsProvider {
    /// A provider hosting `example.net` with no records
    pub fn new() -> Self {
        Self {
            zones: vec![HostedZone::new(ZONE_ID, format!("{ZONE_NAME}."))],
            records: Arc::new(Mutex::new(Vec::new())),
            page_size: 100,
            failing_hosts: Arc::new(Mutex::new(HashSet::new())),
            fail_lookup: false,
            fail_listing: false,
            stuck_cursor: false,
            lookup_call_count: Arc::new(AtomicUsize::new(0)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            upserts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider whose zone lookup returns nothing
    pub fn without_zones() -> Self {
        Self {
            zones: Vec::new(),
            ..Self::new()
        }
    }

    pub fn with_zones(mut self, zones: Vec<HostedZone>) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_record(self, record: RecordSet) -> Self {
        self.records.lock().unwrap().push(record);
        self
    }

    pub fn with_address(self, name: &str, value: &str) -> Self {
        self.with_record(RecordSet::address(format!("{name}."), value, 300))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing_upsert_for(self, host: &str) -> Self {
        self.failing_hosts.lock().unwrap().insert(host.to_string());
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn with_stuck_cursor(mut self) -> Self {
        self.stuck_cursor = true;
        self
    }

    pub fn lookup_call_count(&self) -> usize {
        self.lookup_call_count.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn upserts(&self) -> Vec<Upsert> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn upsert_call_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    /// Current values of the address record for `host`, if any
    pub fn address_values(&self, host: &str) -> Option<Vec<String>> {
        let name = format!("{host}.");
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|rs| rs.name == name && rs.is_address())
            .map(|rs| rs.values.clone())
    }

    /// Create a new MockDnsProvider that shares zone state and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: other.zones.clone(),
            records: Arc::clone(&other.records),
            page_size: other.page_size,
            failing_hosts: Arc::clone(&other.failing_hosts),
            fail_lookup: other.fail_lookup,
            fail_listing: other.fail_listing,
            stuck_cursor: other.stuck_cursor,
            lookup_call_count: Arc::clone(&other.lookup_call_count),
            list_call_count: Arc::clone(&other.list_call_count),
            upserts: Arc::clone(&other.upserts),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn lookup_zones(&self, dns_name: &str) -> Result<Vec<HostedZone>> {
        self.lookup_call_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_lookup {
            return Err(Error::provider(
                "mock",
                format!("AccessDenied: ListHostedZonesByName for {dns_name}"),
            ));
        }

        Ok(self.zones.clone())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordCursor>,
    ) -> Result<RecordSetPage> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_listing {
            return Err(Error::provider("mock", format!("AccessDenied on zone {zone_id}")));
        }

        let records = self.records.lock().unwrap();

        // The mock encodes the start offset in the set identifier
        let offset = start
            .and_then(|c| c.identifier.as_deref())
            .and_then(|id| id.parse::<usize>().ok())
            .unwrap_or(0);

        let end = (offset + self.page_size).min(records.len());
        let record_sets = records[offset.min(end)..end].to_vec();

        let next = if end < records.len() {
            let next_offset = if self.stuck_cursor { offset } else { end };
            Some(RecordCursor {
                name: records[next_offset].name.clone(),
                record_type: records[next_offset].record_type.clone(),
                identifier: Some(next_offset.to_string()),
            })
        } else {
            None
        };

        Ok(RecordSetPage { record_sets, next })
    }

    async fn upsert_address_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        value: Ipv4Addr,
        ttl: u32,
    ) -> Result<ChangeConfirmation> {
        let call_number = {
            let mut upserts = self.upserts.lock().unwrap();
            upserts.push(Upsert {
                zone_id: zone_id.to_string(),
                fqdn: fqdn.to_string(),
                value,
                ttl,
            });
            upserts.len()
        };

        if self.failing_hosts.lock().unwrap().contains(fqdn) {
            return Err(Error::provider(
                "mock",
                format!("Throttling: Rate exceeded for {fqdn}"),
            ));
        }

        let name = format!("{fqdn}.");
        let replacement = RecordSet::address(name.clone(), value.to_string(), i64::from(ttl));
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|rs| rs.name == name && rs.is_address()) {
            Some(existing) => *existing = replacement,
            None => records.push(replacement),
        }

        Ok(ChangeConfirmation {
            change_id: format!("/change/C{call_number}"),
            status: "PENDING".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal configuration for `example.net`
pub fn config_for(hosts: &[&str]) -> ReconcileConfig {
    ReconcileConfig::new(
        ZONE_NAME,
        hosts.iter().map(|h| h.to_string()).collect(),
        300,
    )
}

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}
