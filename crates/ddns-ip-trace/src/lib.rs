// # Trace IP Source
//
// Resolves the caller's public IPv4 address from a Cloudflare-style trace
// endpoint (`https://cloudflare.com/cdn-cgi/trace`).
//
// The endpoint answers with `key=value` lines:
//
// ```text
// fl=490f68
// h=cloudflare.com
// ip=203.0.113.7
// ts=1743642238.374
// ...
// ```
//
// Only the `ip` key is used. One GET per `current()` call, no retry, no cache.
// A body without an `ip` line is a network error, never an empty address.

use ddns_core::config::ReconcileConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Public IP source backed by a trace endpoint
#[derive(Debug, Clone)]
pub struct TraceIpSource {
    /// Trace endpoint URL
    url: String,

    /// HTTP client (timeout applied per request)
    client: reqwest::Client,
}

impl TraceIpSource {
    /// Create a new trace IP source
    ///
    /// # Parameters
    ///
    /// - `url`: Trace endpoint (e.g., "https://cloudflare.com/cdn-cgi/trace")
    /// - `timeout`: Total timeout for the request
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a source from the run configuration
    pub fn from_config(config: &ReconcileConfig) -> Result<Self> {
        Self::new(config.trace_url.clone(), config.http_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the trace body
    async fn fetch_trace(&self) -> Result<String> {
        tracing::debug!("Fetching trace from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "Trace endpoint {} answered {}",
                self.url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read trace response: {e}")))
    }
}

/// Extract the IPv4 address from a trace body
///
/// # Errors
///
/// [`Error::Network`] when no `ip=` line exists, when its value is empty or not
/// an address, or when the address is IPv6.
pub fn parse_trace(body: &str) -> Result<Ipv4Addr> {
    let value = body
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "ip")
        .map(|(_, value)| value.trim())
        .ok_or_else(|| Error::network("Trace response has no ip= line"))?;

    match value.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(ip)) => Err(Error::network(format!(
            "Trace endpoint reported an IPv6 address ({ip}); an IPv4 address is required"
        ))),
        Err(_) => Err(Error::network(format!(
            "Trace response has an invalid ip value: '{value}'"
        ))),
    }
}

#[async_trait::async_trait]
impl IpSource for TraceIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let body = self.fetch_trace().await?;
        let ip = parse_trace(&body)?;
        tracing::debug!("Trace endpoint reports {}", ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "cloudflare-trace"
    }
}
