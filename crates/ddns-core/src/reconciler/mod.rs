//! Reconciler
//!
//! The Reconciler runs one pass of the public IP → DNS record flow:
//!
//! ```text
//! ┌─────────────┐   Ipv4Addr   ┌──────────────┐   zone id   ┌──────────────┐
//! │  IpSource   │─────────────▶│  Reconciler  │◀───────────▶│ DnsProvider  │
//! └─────────────┘              └──────────────┘             └──────────────┘
//!                                     │
//!                                     ▼
//!                            ReconcileReport (per host)
//! ```
//!
//! ## Flow
//!
//! 1. Resolve the public IP once (fatal on failure)
//! 2. Resolve the zone once (fatal on failure)
//! 3. Walk the zone's record sets once for every configured host
//! 4. For each host, in configuration order: no-op if current, otherwise UPSERT
//!
//! Failures in steps 3 and 4 are recorded on the affected hosts and the loop
//! carries on. Nothing is retried and nothing outlives the run.

use std::net::Ipv4Addr;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::config::ReconcileConfig;
use crate::error::{Error, Result};
use crate::records::{self, RecordIndex};
use crate::report::{HostOutcome, HostReport, ReconcileReport};
use crate::traits::{DnsProvider, HostedZone, IpSource};
use crate::zone;

/// Single-pass reconciler
///
/// Dependencies are handed in at construction so tests can substitute fakes.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::reconcile()`]; every call is an independent run
pub struct Reconciler {
    /// Public IP source
    ip_source: Box<dyn IpSource>,

    /// DNS provider for zone lookup, record listing and writes
    provider: Box<dyn DnsProvider>,

    /// Desired state
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: ReconcileConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            config,
        })
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: the run completed; individual hosts may have failed
    /// - `Err(Error)`: the public IP or the zone could not be resolved
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let started_at = Utc::now();
        let zone_dns_name = &self.config.zone_dns_name;

        info!(
            "Reconciling {} host(s) in {} via {} [mode: {}]",
            self.config.host_names.len(),
            zone_dns_name,
            self.provider.provider_name(),
            if self.config.is_dry_run() { "DRY-RUN" } else { "LIVE" }
        );

        let public_ip = self.resolve_public_ip().await?;
        info!("Public IP is {} (via {})", public_ip, self.ip_source.source_name());

        let zone = zone::locate_zone(self.provider.as_ref(), zone_dns_name).await?;

        let index = records::scan_address_records(
            self.provider.as_ref(),
            &zone.id,
            &self.config.host_names,
        )
        .await
        .map_err(|e| {
            error!("Failed to list record sets in {} ({}): {}", zone_dns_name, zone.id, e);
            e.to_string()
        });

        if let Ok(index) = &index
            && index.is_empty()
        {
            debug!(
                "No configured host has an address record in {} yet; all will be created",
                zone_dns_name
            );
        }

        let mut hosts = Vec::with_capacity(self.config.host_names.len());
        for host in &self.config.host_names {
            let outcome = match &index {
                Ok(index) => self.reconcile_host(&zone, host, public_ip, index).await,
                Err(scan_error) => HostOutcome::Failed {
                    error: format!("reading records failed: {scan_error}"),
                },
            };

            hosts.push(HostReport {
                host: host.clone(),
                outcome,
            });
        }

        let report = ReconcileReport {
            zone_name: zone_dns_name.clone(),
            zone_id: zone.id,
            public_ip,
            mode: self.config.mode,
            started_at,
            finished_at: Utc::now(),
            hosts,
        };

        info!(
            "Reconciliation finished: {} host(s), {} updated, {} failed",
            report.hosts.len(),
            report.updated_count(),
            report.failed_count()
        );

        Ok(report)
    }

    /// Resolve the public IP, keeping every failure in the network class
    async fn resolve_public_ip(&self) -> Result<Ipv4Addr> {
        self.ip_source.current().await.map_err(|e| match e {
            Error::Network(_) => e,
            other => Error::network(format!(
                "{} lookup failed: {}",
                self.ip_source.source_name(),
                other
            )),
        })
    }

    /// Compare one host and write if it drifted
    async fn reconcile_host(
        &self,
        zone: &HostedZone,
        host: &str,
        public_ip: Ipv4Addr,
        index: &RecordIndex,
    ) -> HostOutcome {
        let zone_dns_name = &self.config.zone_dns_name;
        let existing = index.get(host);

        if existing.is_some_and(|r| r.is_current(public_ip)) {
            info!(
                "IP in {} ({}) for {} ({}) matches, nothing to do",
                zone_dns_name, zone.id, host, public_ip
            );
            return HostOutcome::AlreadyCurrent { ip: public_ip };
        }

        let previous = existing.map(|r| r.describe());
        info!(
            "Will update IP in {} ({}) for {} from {} to {}",
            zone_dns_name,
            zone.id,
            host,
            previous.as_deref().unwrap_or("none"),
            public_ip
        );

        if self.config.is_dry_run() {
            info!(
                "[DRY-RUN] Would UPSERT {} A {} (ttl {}) in zone {}",
                host, public_ip, self.config.ttl, zone.id
            );
            return HostOutcome::WouldUpdate {
                previous,
                new_ip: public_ip,
            };
        }

        match records::upsert_address_record(
            self.provider.as_ref(),
            &zone.id,
            host,
            public_ip,
            self.config.ttl,
        )
        .await
        {
            Ok(confirmation) => {
                debug!("Update for {} accepted as {}", host, confirmation.change_id);
                HostOutcome::Updated {
                    previous,
                    new_ip: public_ip,
                    change_id: confirmation.change_id,
                }
            }
            Err(e) => {
                error!(
                    "Failed to update {} in {} ({}): {}",
                    host, zone_dns_name, zone.id, e
                );
                HostOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
