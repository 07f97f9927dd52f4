// # Mock DNS Manager
//
// Used whenever DNS management is disabled or unconfigured (local and dev
// operation). Writes are accepted and kept in memory so that callers can
// list what they wrote, but nothing leaves the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{DnsManager, DnsRecord, DnsRecordMatch, DnsType};
use crate::error::Result;

/// A record held by the mock manager
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub record: DnsRecord,
    pub written_at: DateTime<Utc>,
}

/// No-op DNS manager backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct MockDnsManager {
    inner: Arc<RwLock<HashMap<(DnsType, String), StoredRecord>>>,
}

impl MockDnsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// When a record was last written
    pub async fn written_at(&self, record_type: DnsType, fqdn: &str) -> Option<DateTime<Utc>> {
        let guard = self.inner.read().await;
        guard
            .get(&(record_type, fqdn.to_ascii_lowercase()))
            .map(|stored| stored.written_at)
    }
}

#[async_trait]
impl DnsManager for MockDnsManager {
    async fn list(&self, matcher: &DnsRecordMatch) -> Result<Vec<DnsRecord>> {
        let guard = self.inner.read().await;
        let mut records: Vec<DnsRecord> = guard
            .values()
            .filter(|stored| matcher.matches(&stored.record))
            .map(|stored| stored.record.clone())
            .collect();
        records.sort_by(|a, b| a.fqdn.cmp(&b.fqdn));
        Ok(records)
    }

    async fn write(&self, record: &DnsRecord) -> Result<bool> {
        let key = (record.record_type, record.fqdn.to_ascii_lowercase());
        let mut guard = self.inner.write().await;

        if guard.get(&key).is_some_and(|stored| stored.record == *record) {
            tracing::debug!("Mock DNS record unchanged: {} {}", record.record_type.as_str(), record.fqdn);
            return Ok(false);
        }

        tracing::info!(
            "Mock DNS write (no external change): {} {} -> {}",
            record.record_type.as_str(),
            record.fqdn,
            record.value
        );
        guard.insert(
            key,
            StoredRecord {
                record: record.clone(),
                written_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn remove(&self, matcher: &DnsRecordMatch) -> Result<usize> {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|_, stored| !matcher.matches(&stored.record));
        Ok(before - guard.len())
    }

    async fn publish(&self) -> Result<()> {
        // Nothing to publish
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
