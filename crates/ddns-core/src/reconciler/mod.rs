//! Reconciliation cycle
//!
//! The Reconciler performs one full cycle:
//! - Look up the current public IPv4 address via [`IpSource`]
//! - Resolve the zone and list its A records via [`DnsProvider`]
//! - Compare the managed record's content with the observed address
//! - Update the record if it differs (unless dry-run is set)
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐   Ipv4Addr   ┌──────────────┐  zone_id / list / update  ┌─────────────┐
//! │  IpSource   │─────────────▶│  Reconciler  │──────────────────────────▶│ DnsProvider │
//! └─────────────┘              └──────────────┘                           └─────────────┘
//!                                     │
//!                                     ▼
//!                             ReconcileOutcome
//! ```
//!
//! A cycle either updates the one record or it does not. There is no retry
//! inside a cycle; the next scheduled cycle is the retry mechanism.

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource, RecordType};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, error, info};

/// What a cycle reconciles: one A record in one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileTarget {
    /// Zone containing the record
    pub zone_name: String,
    /// Fully qualified record name
    pub record_name: String,
    /// Log the intended change instead of applying it
    pub dry_run: bool,
}

impl ReconcileTarget {
    /// Create a live (non dry-run) target
    pub fn new(zone_name: impl Into<String>, record_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            record_name: record_name.into(),
            dry_run: false,
        }
    }

    /// Enable or disable dry-run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.zone_name.is_empty() {
            return Err(Error::invalid_input("zone name cannot be empty"));
        }
        if self.record_name.is_empty() {
            return Err(Error::invalid_input("record name cannot be empty"));
        }
        Ok(())
    }
}

/// Result of a successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Record already held the observed address (no-op)
    Unchanged {
        record_name: String,
        ip: Ipv4Addr,
    },

    /// Record content was replaced
    Updated {
        record_name: String,
        previous: String,
        new_ip: Ipv4Addr,
    },

    /// Record differs but dry-run suppressed the update
    DryRun {
        record_name: String,
        current: String,
        intended: Ipv4Addr,
    },
}

impl ReconcileOutcome {
    /// Whether the cycle mutated the provider
    pub fn is_update(&self) -> bool {
        matches!(self, ReconcileOutcome::Updated { .. })
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::Unchanged { record_name, ip } => {
                write!(f, "{} unchanged ({})", record_name, ip)
            }
            ReconcileOutcome::Updated {
                record_name,
                previous,
                new_ip,
            } => write!(f, "{} updated {} -> {}", record_name, previous, new_ip),
            ReconcileOutcome::DryRun {
                record_name,
                current,
                intended,
            } => write!(f, "{} would update {} -> {}", record_name, current, intended),
        }
    }
}

/// Performs reconciliation cycles against injected collaborators
pub struct Reconciler {
    /// Public IP lookup
    ip_source: Arc<dyn IpSource>,

    /// DNS provider API
    provider: Arc<dyn DnsProvider>,
}

impl Reconciler {
    /// Create a new reconciler
    pub fn new(ip_source: Arc<dyn IpSource>, provider: Arc<dyn DnsProvider>) -> Self {
        Self {
            ip_source,
            provider,
        }
    }

    /// Run one reconciliation cycle
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileOutcome)`: The record is now (or would be, in dry-run)
    ///   pointing at the observed address
    /// - `Err(Error)`: The cycle was aborted at the first failing step. No
    ///   mutation happened unless the failing step was the update itself.
    pub async fn reconcile(&self, target: &ReconcileTarget) -> Result<ReconcileOutcome> {
        target.validate()?;

        let ip = self.ip_source.current().await?;
        info!("{} returned IP address: {}", self.ip_source.source_name(), ip);

        let zone_id = self.provider.zone_id(&target.zone_name).await?;
        debug!("Zone {} resolved to {}", target.zone_name, zone_id);

        info!("Getting DNS records");
        let records = self.provider.list_records(&zone_id, RecordType::A).await?;
        debug!("Found {} A record(s)", records.len());

        let record = records
            .into_iter()
            .find(|record| record.name == target.record_name)
            .ok_or_else(|| Error::record_not_found(&target.record_name, &target.zone_name))?;

        debug!("Target record: {}, {}", record.name, record.content);

        let observed = ip.to_string();
        if record.content == observed {
            info!("Record {} already up to date, skipping update", record.name);
            return Ok(ReconcileOutcome::Unchanged {
                record_name: record.name,
                ip,
            });
        }

        if target.dry_run {
            info!(
                "[DRY-RUN] Would update {}: {} -> {}",
                record.name, record.content, observed
            );
            return Ok(ReconcileOutcome::DryRun {
                record_name: record.name,
                current: record.content,
                intended: ip,
            });
        }

        self.provider
            .update_record_content(&zone_id, &record.id, &observed)
            .await?;

        info!(
            "IP address set on {}: {} -> {}",
            record.name, record.content, observed
        );
        Ok(ReconcileOutcome::Updated {
            record_name: record.name,
            previous: record.content,
            new_ip: ip,
        })
    }

    /// Run one cycle and absorb its failure
    ///
    /// This is the cycle boundary: errors are logged here and never reach the
    /// scheduler.
    pub async fn run_cycle(&self, target: &ReconcileTarget) -> Option<ReconcileOutcome> {
        match self.reconcile(target).await {
            Ok(outcome) => Some(outcome),
            Err(e @ Error::RecordNotFound { .. }) => {
                error!("Configured target record not found: {}", e);
                None
            }
            Err(e) => {
                error!(
                    "Reconciliation of {} failed ({}): {}",
                    target.record_name,
                    self.provider.provider_name(),
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_display() {
        let updated = ReconcileOutcome::Updated {
            record_name: "home.example.com".to_string(),
            previous: "1.2.3.4".to_string(),
            new_ip: Ipv4Addr::new(5, 6, 7, 8),
        };
        assert_eq!(updated.to_string(), "home.example.com updated 1.2.3.4 -> 5.6.7.8");
        assert!(updated.is_update());

        let dry = ReconcileOutcome::DryRun {
            record_name: "home.example.com".to_string(),
            current: "1.2.3.4".to_string(),
            intended: Ipv4Addr::new(5, 6, 7, 8),
        };
        assert!(!dry.is_update());
    }

    #[test]
    fn empty_target_is_invalid() {
        assert!(ReconcileTarget::new("", "home.example.com").validate().is_err());
        assert!(ReconcileTarget::new("example.com", "").validate().is_err());
        assert!(ReconcileTarget::new("example.com", "home.example.com").validate().is_ok());
    }
}
