//! Core traits for the DDNS agent
//!
//! This module defines the seams the reconciler is built against.
//!
//! - [`IpSource`]: Resolve the caller's public IPv4 address
//! - [`DnsProvider`]: Zone lookup, paged record listing and UPSERT against a provider

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{
    ChangeConfirmation, DnsProvider, HostedZone, RecordCursor, RecordSet, RecordSetPage,
};
