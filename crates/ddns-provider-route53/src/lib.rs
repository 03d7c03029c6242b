// # Route 53 DNS Provider
//
// This crate provides an AWS Route 53 implementation of `ddns_core::DnsProvider`.
//
// ## API Mapping
//
// | Trait call                 | Route 53 operation          |
// |----------------------------|-----------------------------|
// | `lookup_zones`             | `ListHostedZonesByName`     |
// | `list_record_sets`         | `ListResourceRecordSets`    |
// | `upsert_address_record`    | `ChangeResourceRecordSets`  |
//
// Each trait call is exactly one API request. Pagination of the record
// listing is driven by the caller through `RecordCursor`
// (`StartRecordName`/`StartRecordType`/`StartRecordIdentifier`).
//
// ## Constraints
//
// - NO retry logic beyond the SDK's own transport policy
// - NO caching between calls
// - Credentials come from the AWS SDK default chain (environment, profile,
//   instance metadata) and NEVER appear in logs
//
// ## Zone IDs
//
// Route 53 reports zone IDs as `/hostedzone/Z...`; the prefix is stripped so
// the bare ID is what callers log and pass back.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_route53::Client;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use ddns_core::traits::{
    ChangeConfirmation, DnsProvider, HostedZone, RecordCursor, RecordSet, RecordSetPage,
};
use ddns_core::records::absolute_name;
use ddns_core::{Error, Result};
use std::net::Ipv4Addr;
use std::time::Duration;

const PROVIDER_NAME: &str = "route53";

/// Route 53 is a global service; the SDK still needs a region for signing
const DEFAULT_REGION: &str = "us-east-1";

const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// Route 53 DNS provider
#[derive(Debug, Clone)]
pub struct Route53Provider {
    client: Client,
}

impl Route53Provider {
    /// Wrap an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS SDK default configuration chain
    ///
    /// `timeout` bounds every operation including SDK-internal retries.
    pub async fn from_env(timeout: Duration) -> Self {
        let region = RegionProviderChain::default_provider().or_else(Region::new(DEFAULT_REGION));

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
            .load()
            .await;

        tracing::debug!(
            "Route 53 client configured (region: {:?}, timeout: {:?})",
            sdk_config.region(),
            timeout
        );

        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    /// ```http
    /// GET /2013-04-01/hostedzonesbyname?dnsname=example.net
    /// ```
    async fn lookup_zones(&self, dns_name: &str) -> Result<Vec<HostedZone>> {
        let output = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(dns_name)
            .send()
            .await
            .map_err(|e| sdk_error("ListHostedZonesByName", e))?;

        let zones: Vec<HostedZone> = output
            .hosted_zones()
            .iter()
            .map(|z| HostedZone::new(strip_zone_prefix(z.id()), z.name()))
            .collect();

        tracing::debug!("ListHostedZonesByName({}) returned {} zone(s)", dns_name, zones.len());
        Ok(zones)
    }

    /// ```http
    /// GET /2013-04-01/hostedzone/{Id}/rrset?name=..&type=..&identifier=..
    /// ```
    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordCursor>,
    ) -> Result<RecordSetPage> {
        let mut request = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id);

        if let Some(cursor) = start {
            request = request
                .start_record_name(&cursor.name)
                .start_record_type(RrType::from(cursor.record_type.as_str()))
                .set_start_record_identifier(cursor.identifier.clone());
        }

        let output = request
            .send()
            .await
            .map_err(|e| sdk_error("ListResourceRecordSets", e))?;

        let record_sets: Vec<RecordSet> = output
            .resource_record_sets()
            .iter()
            .map(record_set_from_sdk)
            .collect();

        let next = next_cursor(
            output.is_truncated(),
            output.next_record_name(),
            output.next_record_type(),
            output.next_record_identifier(),
        )?;

        tracing::trace!(
            "ListResourceRecordSets({}) returned {} record set(s), more: {}",
            zone_id,
            record_sets.len(),
            next.is_some()
        );
        Ok(RecordSetPage { record_sets, next })
    }

    /// ```http
    /// POST /2013-04-01/hostedzone/{Id}/rrset
    /// <ChangeBatch><Changes><Change><Action>UPSERT</Action>...</Change></Changes></ChangeBatch>
    /// ```
    async fn upsert_address_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        value: Ipv4Addr,
        ttl: u32,
    ) -> Result<ChangeConfirmation> {
        let batch = build_upsert_batch(fqdn, value, ttl)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| sdk_error("ChangeResourceRecordSets", e))?;

        let confirmation = match output.change_info() {
            Some(info) => ChangeConfirmation {
                change_id: info.id().to_string(),
                status: info.status().as_str().to_string(),
            },
            None => ChangeConfirmation {
                change_id: String::new(),
                status: "UNKNOWN".to_string(),
            },
        };

        Ok(confirmation)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Single-value A record set for `fqdn`
pub fn build_record_set(fqdn: &str, value: Ipv4Addr, ttl: u32) -> Result<ResourceRecordSet> {
    let record = ResourceRecord::builder()
        .value(value.to_string())
        .build()
        .map_err(build_error)?;

    ResourceRecordSet::builder()
        .name(absolute_name(fqdn))
        .r#type(RrType::A)
        .ttl(i64::from(ttl))
        .resource_records(record)
        .build()
        .map_err(build_error)
}

/// Change batch holding one UPSERT of `fqdn`
pub fn build_upsert_batch(fqdn: &str, value: Ipv4Addr, ttl: u32) -> Result<ChangeBatch> {
    let change = Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(build_record_set(fqdn, value, ttl)?)
        .build()
        .map_err(build_error)?;

    ChangeBatch::builder()
        .comment(format!("ddns: {fqdn} -> {value}"))
        .changes(change)
        .build()
        .map_err(build_error)
}

fn record_set_from_sdk(rrs: &ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: unescape_name(rrs.name()),
        record_type: rrs.r#type().as_str().to_string(),
        values: rrs
            .resource_records()
            .iter()
            .map(|r| r.value().to_string())
            .collect(),
        ttl: rrs.ttl(),
    }
}

fn next_cursor(
    is_truncated: bool,
    name: Option<&str>,
    record_type: Option<&RrType>,
    identifier: Option<&str>,
) -> Result<Option<RecordCursor>> {
    if !is_truncated {
        return Ok(None);
    }

    match (name, record_type) {
        (Some(name), Some(record_type)) => Ok(Some(RecordCursor {
            name: name.to_string(),
            record_type: record_type.as_str().to_string(),
            identifier: identifier.map(str::to_string),
        })),
        // Stopping here would report every later host as missing
        _ => Err(Error::provider(
            PROVIDER_NAME,
            "ListResourceRecordSets returned a truncated page without NextRecordName/NextRecordType",
        )),
    }
}

/// `/hostedzone/Z123` → `Z123`
pub fn strip_zone_prefix(id: &str) -> &str {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id)
}

/// Decode Route 53's `\ooo` octal escapes (e.g. `\052` for `*`)
pub fn unescape_name(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..=i + 3].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let code = bytes[i + 1..=i + 3]
                .iter()
                .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
            if let Ok(byte) = u8::try_from(code) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn sdk_error<E>(operation: &str, err: E) -> Error
where
    E: std::error::Error + 'static,
{
    Error::provider(
        PROVIDER_NAME,
        format!("{operation} failed: {}", DisplayErrorContext(err)),
    )
}

fn build_error(err: impl std::fmt::Display) -> Error {
    Error::provider(PROVIDER_NAME, format!("Failed to build request: {err}"))
}
