// # ddns-core
//
// Core library for the DDNS reconciler.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping one A record in
// sync with the caller's public IPv4 address:
// - **IpSource**: Trait for looking up the current public IP
// - **DnsProvider**: Trait for reading and updating records via provider APIs
// - **Reconciler**: One cycle of lookup → compare → conditionally update
// - **Scheduler**: Runs the Reconciler now, then on a fixed interval until shutdown
//
// ## Design Principles
//
// 1. **Injected collaborators**: the IP source and the provider are passed in,
//    never global, so tests can substitute doubles
// 2. **Cycle boundary**: errors are logged where they occur and never stop
//    the schedule
// 3. **Library-First**: the daemon is a thin wiring layer over this crate
// 4. **Idempotency**: an update is issued only when the observed IP differs
//    from the provider's stored content

pub mod traits;
pub mod reconciler;
pub mod scheduler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpSource, RecordType, TokenStatus};
pub use reconciler::{ReconcileOutcome, ReconcileTarget, Reconciler};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerEvent, StopReason};
pub use config::DdnsConfig;
pub use error::{Error, Result};
