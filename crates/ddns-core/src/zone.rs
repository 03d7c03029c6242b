//! Zone Locator
//!
//! Resolves a zone's DNS name to the provider's hosted zone identifier.
//!
//! The first zone the provider returns is used without disambiguation. With
//! lexicographic lookups (Route 53 `ListHostedZonesByName`) that zone may not
//! be the one asked for when the requested zone does not exist, or when
//! several zones share the name (private and public zones). A mismatch is
//! logged at `warn`.

use tracing::{debug, warn};

use crate::config::normalize_name;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, HostedZone};

/// Resolve `zone_dns_name` to the first hosted zone the provider returns
///
/// # Errors
///
/// - [`Error::ZoneNotFound`] when the lookup returns no zone
/// - [`Error::ZoneLookup`] when the lookup itself fails
pub async fn locate_zone(provider: &dyn DnsProvider, zone_dns_name: &str) -> Result<HostedZone> {
    debug!("Looking up hosted zone for {}", zone_dns_name);

    let zone = provider
        .lookup_zones(zone_dns_name)
        .await
        .map_err(|e| match e {
            Error::Provider { message, .. } => Error::zone_lookup(zone_dns_name, message),
            other => Error::zone_lookup(zone_dns_name, other.to_string()),
        })?
        .into_iter()
        .next()
        .ok_or_else(|| Error::zone_not_found(zone_dns_name))?;

    if normalize_name(&zone.name) != normalize_name(zone_dns_name) {
        warn!(
            "First zone returned for {} is {} ({}); using it anyway",
            zone_dns_name, zone.name, zone.id
        );
    }

    debug!("Found hosted zone {} ({})", zone.name, zone.id);
    Ok(zone)
}
