// # ddns-core
//
// Core library for the Route 53 dynamic DNS agent.
//
// ## Architecture Overview
//
// One invocation reconciles the caller's public IPv4 address against the
// address records of a set of host names in a single hosted zone:
// - **IpSource**: Trait for resolving the current public IP
// - **DnsProvider**: Trait for zone lookup, paged record listing and UPSERT
// - **zone**: Zone Locator (zone DNS name → hosted zone ID)
// - **records**: Record Reader (one shared zone walk) and Record Writer
// - **Reconciler**: Orchestrates IP → zone → per-host compare/write
//
// ## Design Principles
//
// 1. **Passed-in dependencies**: no process-wide clients; the reconciler owns
//    the source and provider it was constructed with
// 2. **Typed configuration**: the environment is read once into `ReconcileConfig`
// 3. **Stateless runs**: nothing is cached or persisted between invocations
// 4. **Per-host isolation**: only IP and zone resolution can abort a run

pub mod traits;
pub mod reconciler;
pub mod zone;
pub mod records;
pub mod report;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use reconciler::Reconciler;
pub use config::{ReconcileConfig, RunMode};
pub use report::{HostOutcome, HostReport, ReconcileReport};
pub use error::{Error, Result};
