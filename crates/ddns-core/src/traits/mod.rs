//! Core traits for the DDNS reconciler
//!
//! This module defines the two external collaborators a reconciliation
//! cycle talks to. Both are injected into the [`crate::Reconciler`], so tests
//! can substitute in-memory doubles.
//!
//! - [`IpSource`]: Look up the current public IPv4 address
//! - [`DnsProvider`]: Read and mutate records at the DNS provider

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, RecordType, TokenStatus};
