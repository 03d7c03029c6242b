//! Run report
//!
//! A [`ReconcileReport`] is the user-visible result of one run: the resolved
//! public IP and zone, and one [`HostReport`] per configured host in
//! configuration order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

use crate::config::RunMode;

/// What happened to one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HostOutcome {
    /// The record already held the public IP; nothing was written
    AlreadyCurrent { ip: Ipv4Addr },

    /// An UPSERT was submitted
    Updated {
        /// Previous value(s), `None` if the record did not exist
        previous: Option<String>,
        new_ip: Ipv4Addr,
        change_id: String,
    },

    /// Dry-run: an UPSERT would have been submitted
    WouldUpdate {
        previous: Option<String>,
        new_ip: Ipv4Addr,
    },

    /// Reading or writing this host failed; other hosts are unaffected
    Failed { error: String },
}

impl HostOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, HostOutcome::Failed { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, HostOutcome::Updated { .. })
    }
}

impl fmt::Display for HostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOutcome::AlreadyCurrent { ip } => write!(f, "already current ({ip})"),
            HostOutcome::Updated {
                previous, new_ip, ..
            } => write!(
                f,
                "updated from {} to {new_ip}",
                previous.as_deref().unwrap_or("none")
            ),
            HostOutcome::WouldUpdate { previous, new_ip } => write!(
                f,
                "would update from {} to {new_ip}",
                previous.as_deref().unwrap_or("none")
            ),
            HostOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Outcome for one configured host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostReport {
    pub host: String,
    #[serde(flatten)]
    pub outcome: HostOutcome,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub zone_name: String,
    pub zone_id: String,
    pub public_ip: Ipv4Addr,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub hosts: Vec<HostReport>,
}

impl ReconcileReport {
    /// Outcome for a host, if it was part of this run
    pub fn outcome(&self, host: &str) -> Option<&HostOutcome> {
        self.hosts
            .iter()
            .find(|h| h.host == host)
            .map(|h| &h.outcome)
    }

    pub fn updated_count(&self) -> usize {
        self.hosts.iter().filter(|h| h.outcome.is_update()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.hosts.iter().filter(|h| h.outcome.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
