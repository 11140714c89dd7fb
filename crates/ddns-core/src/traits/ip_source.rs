// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP lookup service (ipify-style JSON): `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let ip = source.current().await?;
//     println!("public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP lookup implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// A lookup is a single request: no caching between calls and no retry.
/// Each reconciliation cycle asks for a fresh observation, and the next
/// scheduled cycle is the retry mechanism.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The observed address
    /// - `Err(Error)`: If the service was unreachable, answered with a
    ///   non-success status, or returned a body that is not a valid IPv4
    ///   observation
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Get the source name (for logging)
    fn source_name(&self) -> &'static str;
}
