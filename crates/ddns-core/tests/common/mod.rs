//! Test doubles and common utilities for contract tests
//!
//! The doubles stand in for the public IP service and the DNS provider. The
//! provider keeps its records in memory and applies updates to them, so a
//! second cycle observes the first cycle's write the way a real zone would.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, RecordType, TokenStatus};
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// An IpSource returning a settable address, or failing
pub struct FakeIpSource {
    /// `None` makes the lookup fail
    ip: Mutex<Option<Ipv4Addr>>,
    /// Call counter for current()
    calls: AtomicUsize,
}

impl FakeIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip: Mutex::new(Some(ip)),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source whose service answers with something that is not JSON
    pub fn failing() -> Self {
        Self {
            ip: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_ip(&self, ip: Ipv4Addr) {
        *self.ip.lock().unwrap() = Some(ip);
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FakeIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip
            .lock()
            .unwrap()
            .ok_or_else(|| Error::ip_lookup("malformed response: expected value at line 1 column 1"))
    }

    fn source_name(&self) -> &'static str {
        "fake-ip"
    }
}

/// A DnsProvider holding one zone in memory
pub struct FakeDnsProvider {
    zone_name: String,
    zone_id: String,
    records: Mutex<Vec<DnsRecord>>,

    zone_calls: AtomicUsize,
    list_calls: AtomicUsize,
    update_calls: AtomicUsize,
    /// (record_id, content) of every update call
    updates: Mutex<Vec<(String, String)>>,

    fail_zone: AtomicBool,
    fail_list: AtomicBool,
    fail_update: AtomicBool,

    /// Simulated latency of list_records()
    list_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDnsProvider {
    pub fn new(zone_name: &str, zone_id: &str) -> Self {
        Self {
            zone_name: zone_name.to_string(),
            zone_id: zone_id.to_string(),
            records: Mutex::new(Vec::new()),
            zone_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
            fail_zone: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            list_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_record(self, record: DnsRecord) -> Self {
        self.records.lock().unwrap().push(record);
        self
    }

    pub fn with_list_delay(self, delay: Duration) -> Self {
        *self.list_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn fail_zone_lookup(&self, fail: bool) {
        self.fail_zone.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn zone_call_count(&self) -> usize {
        self.zone_calls.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Total provider calls of any kind
    pub fn total_calls(&self) -> usize {
        self.zone_call_count() + self.list_call_count() + self.update_call_count()
    }

    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn content_of(&self, record_id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == record_id)
            .map(|r| r.content.clone())
    }

    /// Highest number of list_records() calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn verify_token(&self) -> Result<TokenStatus> {
        Ok(TokenStatus {
            status: "active".to_string(),
        })
    }

    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        self.zone_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_zone.load(Ordering::SeqCst) {
            return Err(Error::provider("fake", "zone lookup unavailable"));
        }
        if zone_name != self.zone_name {
            return Err(Error::not_found(format!("zone {}", zone_name)));
        }
        Ok(self.zone_id.clone())
    }

    async fn list_records(&self, zone_id: &str, record_type: RecordType) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::provider("fake", "record listing unavailable"));
        }
        if zone_id != self.zone_id {
            return Err(Error::not_found(format!("zone id {}", zone_id)));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.record_type == record_type)
            .cloned()
            .collect())
    }

    async fn update_record_content(
        &self,
        _zone_id: &str,
        record_id: &str,
        content: &str,
    ) -> Result<DnsRecord> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.updates
            .lock()
            .unwrap()
            .push((record_id.to_string(), content.to_string()));

        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Error::rate_limited("fake provider refused the update"));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(format!("record id {}", record_id)))?;
        record.content = content.to_string();
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Helper to build an A record snapshot
pub fn a_record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: RecordType::A,
        content: content.to_string(),
    }
}

pub const ZONE: &str = "example.com";
pub const RECORD: &str = "home.example.com";

/// A zone holding the managed record at `content`, plus an unrelated record
pub fn zone_with_record(content: &str) -> FakeDnsProvider {
    FakeDnsProvider::new(ZONE, "zone-1")
        .with_record(a_record("rec-www", "www.example.com", "9.9.9.9"))
        .with_record(a_record("rec-home", RECORD, content))
}
