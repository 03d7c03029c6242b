// # IP Source Trait
//
// Defines the interface for resolving the caller's public IPv4 address.
//
// ## Implementations
//
// - Cloudflare-style trace endpoint: `ddns-ip-trace` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main(flavor = "current_thread")]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let ip = source.current().await?;
//     println!("public IP: {ip}");
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP source implementations
///
/// A source is asked exactly once per run. It must not cache across calls:
/// every call reflects the address as seen by the remote service right now.
///
/// # Errors
///
/// Implementations return [`crate::Error::Network`] when the service is
/// unreachable, answers with a non-success status, or answers with a body that
/// does not carry a usable IPv4 address. A missing address is always an error,
/// never an empty value.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IPv4 address
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name for logging (e.g., "cloudflare-trace")
    fn source_name(&self) -> &'static str;
}
