// # DNS Provider Trait
//
// Defines the three provider operations the reconciler needs:
//
// 1. Zone lookup by DNS name
// 2. Paged listing of the record sets in a zone
// 3. A single-record UPSERT change
//
// ## Implementations
//
// - AWS Route 53: `ddns-provider-route53` crate
//
// Pagination is driven by the caller through [`RecordCursor`], so providers
// stay single-shot: one API request per trait call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Record type string for IPv4 address records
pub const ADDRESS_RECORD_TYPE: &str = "A";

/// A hosted zone as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Provider-assigned opaque identifier
    pub id: String,
    /// Absolute zone name as reported by the provider (usually with a trailing dot)
    pub name: String,
}

impl HostedZone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One record set from a zone listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Absolute name, with trailing dot
    pub name: String,
    /// Record type, e.g. "A", "AAAA", "CNAME"
    pub record_type: String,
    /// Record values in provider order
    pub values: Vec<String>,
    /// TTL, when the provider reports one (alias records have none)
    pub ttl: Option<i64>,
}

impl RecordSet {
    /// Build an address record set
    pub fn address(name: impl Into<String>, value: impl Into<String>, ttl: i64) -> Self {
        Self {
            name: name.into(),
            record_type: ADDRESS_RECORD_TYPE.to_string(),
            values: vec![value.into()],
            ttl: Some(ttl),
        }
    }

    /// Whether this is an IPv4 address record
    pub fn is_address(&self) -> bool {
        self.record_type.eq_ignore_ascii_case(ADDRESS_RECORD_TYPE)
    }
}

/// Position to resume a paged record listing from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCursor {
    pub name: String,
    pub record_type: String,
    /// Set identifier, for weighted/latency/failover record sets
    pub identifier: Option<String>,
}

/// One page of a record listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSetPage {
    pub record_sets: Vec<RecordSet>,
    /// Where the next page starts; `None` once the listing is exhausted
    pub next: Option<RecordCursor>,
}

/// Acknowledgement of a submitted change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeConfirmation {
    /// Provider change identifier
    pub change_id: String,
    /// Provider status at submission time (e.g., "PENDING")
    pub status: String,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// Providers only translate calls into API requests:
/// - no retry logic (a failed run is retried by the external scheduler)
/// - no caching between calls
/// - no decision about whether a write is needed (owned by the reconciler)
///
/// # Errors
///
/// Every failure is reported as [`crate::Error::Provider`] carrying the
/// provider's diagnostic. An empty zone lookup is not an error at this level;
/// the reconciler turns it into [`crate::Error::ZoneNotFound`].
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up hosted zones by DNS name
    ///
    /// Returns zones in provider order starting at `dns_name`. Providers with
    /// prefix or lexicographic lookup semantics may return zones that do not
    /// exactly match.
    async fn lookup_zones(&self, dns_name: &str) -> Result<Vec<HostedZone>, crate::Error>;

    /// Fetch one page of record sets from a zone
    ///
    /// `start` is `None` for the first page and the previous page's `next`
    /// afterwards.
    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordCursor>,
    ) -> Result<RecordSetPage, crate::Error>;

    /// Create or replace a single-value address record
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Hosted zone identifier
    /// - `fqdn`: Host name without trailing dot
    /// - `value`: The only value the record will hold
    /// - `ttl`: TTL in seconds
    async fn upsert_address_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        value: Ipv4Addr,
        ttl: u32,
    ) -> Result<ChangeConfirmation, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
