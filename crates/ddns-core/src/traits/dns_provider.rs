// # DNS Provider Trait
//
// Defines the interface to a managed DNS provider API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.zone_id("example.com").await?;
//     let records = provider.list_records(&zone_id, RecordType::A).await?;
//     if let Some(record) = records.iter().find(|r| r.name == "home.example.com") {
//         provider.update_record_content(&zone_id, &record.id, "5.6.7.8").await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS record type
///
/// Only A records are managed; the other variants exist so that listings
/// returned by a provider can still be represented faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
    /// CNAME record
    Cname,
    /// TXT record
    Txt,
    /// Anything else the provider returns
    #[serde(other)]
    Other,
}

impl RecordType {
    /// Wire name used in provider query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Other => "OTHER",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a DNS record as known to the provider at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Current content (an IP string for A records)
    pub content: String,
}

/// Result of a credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    /// Provider-reported status (e.g. "active")
    pub status: String,
}

impl TokenStatus {
    /// Whether the provider considers the credential usable
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// Every method is a single API call: providers do not retry, back off,
/// cache or decide whether an update is needed. That decision belongs to
/// the [`crate::Reconciler`].
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check that the configured credential is valid
    ///
    /// Used as an optional startup sanity check.
    async fn verify_token(&self) -> Result<TokenStatus, crate::Error>;

    /// Resolve a zone identifier from its name
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone ID
    /// - `Err(Error::NotFound)`: If no zone carries that name
    async fn zone_id(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// List the records of a given type in a zone
    ///
    /// Records are returned in provider order; callers rely on it to break
    /// ties between records sharing a name.
    async fn list_records(
        &self,
        zone_id: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace the content of a record
    ///
    /// # Returns
    ///
    /// The record as stored by the provider after the update
    async fn update_record_content(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_round_trips_provider_names() {
        let record: DnsRecord = serde_json::from_value(serde_json::json!({
            "id": "rec1",
            "name": "home.example.com",
            "type": "A",
            "content": "1.2.3.4",
        }))
        .unwrap();
        assert_eq!(record.record_type, RecordType::A);

        let mx: RecordType = serde_json::from_str("\"MX\"").unwrap();
        assert_eq!(mx, RecordType::Other);
    }

    #[test]
    fn token_status_active_is_case_insensitive() {
        assert!(TokenStatus { status: "active".into() }.is_active());
        assert!(TokenStatus { status: "Active".into() }.is_active());
        assert!(!TokenStatus { status: "disabled".into() }.is_active());
    }
}
