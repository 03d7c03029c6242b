//! Record Reader and Record Writer
//!
//! Reading walks the provider's paged listing once and indexes the address
//! records of every wanted host. The walk stops early once all wanted hosts
//! have been seen; the first matching record set in listing order wins, so
//! the result is the same as scanning the whole zone per host.
//!
//! Writing is a thin wrapper over [`DnsProvider::upsert_address_record`] that
//! logs the change and keeps every failure in the provider error class.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::config::normalize_name;
use crate::error::{Error, Result};
use crate::traits::{ChangeConfirmation, DnsProvider, RecordCursor, RecordSet};

/// An existing address record as known to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Absolute name, with trailing dot
    pub name: String,
    pub values: Vec<String>,
    pub ttl: Option<i64>,
}

impl AddressRecord {
    /// The first value, which is what a single-value record resolves to
    pub fn current_value(&self) -> Option<&str> {
        self.values.first().map(|v| v.trim())
    }

    /// True when the record holds exactly `ip` and nothing else
    pub fn is_current(&self, ip: Ipv4Addr) -> bool {
        self.values.len() == 1 && self.current_value() == Some(ip.to_string().as_str())
    }

    /// Values rendered for logs and reports
    pub fn describe(&self) -> String {
        self.values.join(",")
    }
}

impl From<RecordSet> for AddressRecord {
    fn from(rs: RecordSet) -> Self {
        Self {
            name: rs.name,
            values: rs.values,
            ttl: rs.ttl,
        }
    }
}

/// Address records found during one zone walk, keyed by host name
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    records: HashMap<String, AddressRecord>,
    pages_fetched: usize,
}

impl RecordIndex {
    /// Look up a host by name (with or without trailing dot)
    pub fn get(&self, fqdn: &str) -> Option<&AddressRecord> {
        self.records.get(&normalize_name(fqdn))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of listing pages requested to build this index
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

/// `fqdn` in absolute form, as providers report record names
pub fn absolute_name(fqdn: &str) -> String {
    format!("{}.", normalize_name(fqdn))
}

/// Walk the zone once and collect the address records for `fqdns`
///
/// # Errors
///
/// Returns the provider's error if any page fails, or a provider error if the
/// listing cursor stops advancing.
pub async fn scan_address_records(
    provider: &dyn DnsProvider,
    zone_id: &str,
    fqdns: &[String],
) -> Result<RecordIndex> {
    let wanted: HashSet<String> = fqdns.iter().map(|f| normalize_name(f)).collect();
    let mut index = RecordIndex::default();

    if wanted.is_empty() {
        return Ok(index);
    }

    let mut cursor: Option<RecordCursor> = None;

    loop {
        let page = provider.list_record_sets(zone_id, cursor.as_ref()).await?;
        index.pages_fetched += 1;

        for rs in page.record_sets {
            if !rs.is_address() {
                continue;
            }

            // Only absolute names match: "cam.example.net." but not "cam.example.net"
            let Some(host) = rs.name.strip_suffix('.').map(|n| n.to_ascii_lowercase()) else {
                continue;
            };

            if wanted.contains(&host) && !index.records.contains_key(&host) {
                debug!("Found address record {} -> {:?}", rs.name, rs.values);
                index.records.insert(host, AddressRecord::from(rs));
            }
        }

        if index.records.len() == wanted.len() {
            debug!(
                "All {} host(s) found after {} page(s), stopping zone walk",
                wanted.len(),
                index.pages_fetched
            );
            break;
        }

        match page.next {
            Some(next) => {
                if cursor.as_ref() == Some(&next) {
                    return Err(Error::provider(
                        provider.provider_name(),
                        format!(
                            "record listing for zone {zone_id} did not advance past {}",
                            next.name
                        ),
                    ));
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    debug!(
        "Zone {} walk complete: {} of {} host(s) have address records ({} page(s))",
        zone_id,
        index.records.len(),
        wanted.len(),
        index.pages_fetched
    );
    Ok(index)
}

/// Find the current address record for a single host
///
/// `Ok(None)` means the zone has no such record, which is a normal outcome.
pub async fn find_address_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    fqdn: &str,
) -> Result<Option<AddressRecord>> {
    let index = scan_address_records(provider, zone_id, &[fqdn.to_string()]).await?;
    Ok(index.get(fqdn).cloned())
}

/// Set `fqdn` to exactly `value` with `ttl`, creating the record if absent
///
/// No retry is attempted; the provider's diagnostic is returned as-is.
pub async fn upsert_address_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    fqdn: &str,
    value: Ipv4Addr,
    ttl: u32,
) -> Result<ChangeConfirmation> {
    let fqdn = normalize_name(fqdn);

    let confirmation = provider
        .upsert_address_record(zone_id, &fqdn, value, ttl)
        .await
        .map_err(|e| match e {
            Error::Provider { .. } => e,
            other => Error::provider(
                provider.provider_name(),
                format!("UPSERT {fqdn} in zone {zone_id} failed: {other}"),
            ),
        })?;

    info!(
        "Submitted UPSERT {} A {} (ttl {}) in zone {}: change {} ({})",
        fqdn, value, ttl, zone_id, confirmation.change_id, confirmation.status
    );
    Ok(confirmation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        let index = RecordIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.get("cam.example.net").is_none());
    }

    #[test]
    fn test_absolute_name() {
        assert_eq!(absolute_name("cam.example.net"), "cam.example.net.");
        assert_eq!(absolute_name("Cam.Example.net."), "cam.example.net.");
    }

    #[test]
    fn test_is_current_requires_single_matching_value() {
        let ip = Ipv4Addr::new(1, 2, 3, 4);

        let single = AddressRecord {
            name: "cam.example.net.".to_string(),
            values: vec!["1.2.3.4".to_string()],
            ttl: Some(300),
        };
        assert!(single.is_current(ip));
        assert!(!single.is_current(Ipv4Addr::new(5, 6, 7, 8)));

        let multi = AddressRecord {
            values: vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()],
            ..single.clone()
        };
        assert_eq!(multi.current_value(), Some("1.2.3.4"));
        assert!(!multi.is_current(ip));
        assert_eq!(multi.describe(), "1.2.3.4,5.6.7.8");

        let empty = AddressRecord {
            values: Vec::new(),
            ..single
        };
        assert!(!empty.is_current(ip));
        assert_eq!(empty.current_value(), None);
    }
}
