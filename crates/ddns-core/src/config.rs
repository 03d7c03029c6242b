//! Configuration for a reconciliation run
//!
//! The agent is configured entirely through the process environment. Values are
//! read once, validated, and frozen into a [`ReconcileConfig`] before any network
//! activity happens.
//!
//! ## Variables
//!
//! - `ROUTE53_HOSTED_ZONE_DNS_NAME`: zone to search (required)
//! - `ROUTE53_MY_DNS_NAMES`: comma-separated host names (preferred)
//! - `ROUTE53_MY_DNS_NAME`: legacy single-host fallback
//! - `ROUTE53_TTL`: TTL in seconds for upserted records (required)
//! - `DDNS_TRACE_URL`: IP-echo endpoint (optional)
//! - `DDNS_HTTP_TIMEOUT_SECS`: timeout for every outbound call (optional)
//! - `DDNS_MODE`: `live` (default) or `dry-run`

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{Error, Result};

pub const ENV_ZONE_DNS_NAME: &str = "ROUTE53_HOSTED_ZONE_DNS_NAME";
pub const ENV_DNS_NAMES: &str = "ROUTE53_MY_DNS_NAMES";
pub const ENV_DNS_NAME_LEGACY: &str = "ROUTE53_MY_DNS_NAME";
pub const ENV_TTL: &str = "ROUTE53_TTL";
pub const ENV_TRACE_URL: &str = "DDNS_TRACE_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DDNS_HTTP_TIMEOUT_SECS";
pub const ENV_MODE: &str = "DDNS_MODE";

/// Default IP-echo endpoint
pub const DEFAULT_TRACE_URL: &str = "https://cloudflare.com/cdn-cgi/trace";

/// Default timeout applied to the trace request and every provider call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Largest TTL Route 53 accepts
pub const MAX_TTL: u32 = 2_147_483_647;

/// Whether writes are submitted or only reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Submit UPSERT changes
    #[default]
    Live,
    /// Read everything, write nothing
    DryRun,
}

impl RunMode {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "live" => Ok(RunMode::Live),
            "dry-run" | "dry_run" | "dryrun" => Ok(RunMode::DryRun),
            other => Err(Error::config(format!(
                "{ENV_MODE} '{other}' is not valid. Valid modes: live, dry-run"
            ))),
        }
    }
}

/// Desired state for one invocation
///
/// Host names are normalized: lowercased, without a trailing dot, distinct,
/// and kept in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// DNS name of the hosted zone to search
    pub zone_dns_name: String,

    /// Host names to reconcile, in processing order
    pub host_names: Vec<String>,

    /// TTL applied to every upserted record
    pub ttl: u32,

    /// IP-echo endpoint
    #[serde(default = "default_trace_url")]
    pub trace_url: String,

    /// Timeout for each outbound request, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Live or dry-run
    #[serde(default)]
    pub mode: RunMode,
}

impl ReconcileConfig {
    /// Create a configuration with defaults for the optional settings
    pub fn new(zone_dns_name: impl Into<String>, host_names: Vec<String>, ttl: u32) -> Self {
        Self {
            zone_dns_name: zone_dns_name.into(),
            host_names,
            ttl,
            trace_url: default_trace_url(),
            http_timeout_secs: default_http_timeout_secs(),
            mode: RunMode::default(),
        }
    }

    /// Switch to dry-run mode
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the IP-echo endpoint
    pub fn with_trace_url(mut self, url: impl Into<String>) -> Self {
        self.trace_url = url.into();
        self
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let zone_dns_name = get(ENV_ZONE_DNS_NAME).ok_or_else(|| {
            Error::config(format!(
                "{ENV_ZONE_DNS_NAME} is required. \
                Set it via: export {ENV_ZONE_DNS_NAME}=example.net"
            ))
        })?;

        // The plural form wins whenever it is set, even to whitespace; only an
        // absent or empty value falls back to the legacy one
        let raw_names = lookup(ENV_DNS_NAMES)
            .filter(|v| !v.is_empty())
            .or_else(|| get(ENV_DNS_NAME_LEGACY))
            .ok_or_else(|| {
                Error::config(format!("Set {ENV_DNS_NAMES} or {ENV_DNS_NAME_LEGACY}"))
            })?;

        let raw_ttl = get(ENV_TTL)
            .ok_or_else(|| Error::config(format!("{ENV_TTL} is required (seconds)")))?;
        let ttl = parse_ttl(&raw_ttl)?;

        let http_timeout_secs = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{ENV_HTTP_TIMEOUT_SECS} must be an integer. Got: {raw}"
                ))
            })?,
            None => default_http_timeout_secs(),
        };

        let config = Self {
            zone_dns_name: normalize_name(&zone_dns_name),
            host_names: parse_host_names(&raw_names)
                .into_iter()
                .map(|n| normalize_name(&n))
                .collect(),
            ttl,
            trace_url: get(ENV_TRACE_URL)
                .map(|u| u.trim().to_string())
                .unwrap_or_else(default_trace_url),
            http_timeout_secs,
            mode: get(ENV_MODE)
                .map(|m| RunMode::parse(&m))
                .transpose()?
                .unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_domain_name(&self.zone_dns_name, false)
            .map_err(|e| Error::config(format!("{ENV_ZONE_DNS_NAME}: {e}")))?;

        if self.host_names.is_empty() {
            return Err(Error::config(format!(
                "{ENV_DNS_NAMES} must contain at least one host name"
            )));
        }

        let mut seen = HashSet::new();
        for host in &self.host_names {
            validate_domain_name(host, true)
                .map_err(|e| Error::config(format!("{ENV_DNS_NAMES}: {e}")))?;
            if !seen.insert(host.as_str()) {
                return Err(Error::config(format!(
                    "{ENV_DNS_NAMES} lists '{host}' more than once"
                )));
            }
        }

        if self.ttl > MAX_TTL {
            return Err(Error::config(format!(
                "{ENV_TTL} must be at most {MAX_TTL}. Got: {}",
                self.ttl
            )));
        }

        if !self.trace_url.starts_with("https://") && !self.trace_url.starts_with("http://") {
            return Err(Error::config(format!(
                "{ENV_TRACE_URL} must use HTTP or HTTPS scheme. Got: {}",
                self.trace_url
            )));
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            return Err(Error::config(format!(
                "{ENV_HTTP_TIMEOUT_SECS} must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            )));
        }

        Ok(())
    }

    /// Timeout for each outbound request
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Whether writes are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.mode == RunMode::DryRun
    }
}

/// Split a comma-separated host list, trimming whitespace and dropping empties
pub fn parse_host_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ttl(raw: &str) -> Result<u32> {
    let ttl: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{ENV_TTL} must be an integer. Got: {raw}")))?;

    if ttl < 0 || ttl > i64::from(MAX_TTL) {
        return Err(Error::config(format!(
            "{ENV_TTL} must be between 0 and {MAX_TTL}. Got: {ttl}"
        )));
    }

    Ok(ttl as u32)
}

/// Lowercase and drop the trailing dot of an absolute name
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Basic RFC 1035 checks; `allow_wildcard` permits a leading `*` label
fn validate_domain_name(domain: &str, allow_wildcard: bool) -> std::result::Result<(), String> {
    if domain.is_empty() {
        return Err("domain name cannot be empty".to_string());
    }

    if domain.len() > 253 {
        return Err(format!(
            "domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        ));
    }

    for (i, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(format!("domain name has empty label: '{domain}'"));
        }

        if allow_wildcard && i == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(format!(
                "domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            ));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(format!(
                "domain label contains invalid characters. Label: '{label}'"
            ));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!(
                "domain label cannot start or end with hyphen. Label: '{label}'"
            ));
        }
    }

    Ok(())
}

fn default_trace_url() -> String {
    DEFAULT_TRACE_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}
