// # DNS Managers
//
// The configuration layer hands out exactly one DNS manager per process.
// Which one is decided by `dnsMode` together with the `dns` settings:
//
// - `dns` absent or disabled → [`MockDnsManager`] (accepts updates, changes nothing)
// - `dyn`                    → [`DynDnsManager`]
// - `internal` | `cdns`      → [`DnsClient`]
// - anything else            → fatal [`Error::InvalidDnsMode`]
//
// How each backend talks to its server is the backend's business; callers
// only see the [`DnsManager`] trait.

pub mod client;
pub mod dyn_dns;
pub mod mock;
pub mod selector;

pub use client::DnsClient;
pub use dyn_dns::DynDnsManager;
pub use mock::MockDnsManager;
pub use selector::init_dns_manager;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Declarative DNS backend discriminator
///
/// Adding a variant forces every `match` over it, including the backend
/// selector, to handle the new mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsMode {
    /// Dyn Managed DNS
    Dyn,
    /// cloudos-dns server running on this host
    Internal,
    /// Central cloudos-dns server
    Cdns,
}

impl DnsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsMode::Dyn => "dyn",
            DnsMode::Internal => "internal",
            DnsMode::Cdns => "cdns",
        }
    }
}

impl FromStr for DnsMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dyn" => Ok(DnsMode::Dyn),
            "internal" => Ok(DnsMode::Internal),
            "cdns" => Ok(DnsMode::Cdns),
            other => Err(Error::invalid_dns_mode(other)),
        }
    }
}

impl fmt::Display for DnsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Txt,
}

impl DnsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsType::A => "A",
            DnsType::Aaaa => "AAAA",
            DnsType::Cname => "CNAME",
            DnsType::Mx => "MX",
            DnsType::Ns => "NS",
            DnsType::Txt => "TXT",
        }
    }

    /// Parse a type name as it appears in provider responses
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Some(DnsType::A),
            "AAAA" => Some(DnsType::Aaaa),
            "CNAME" => Some(DnsType::Cname),
            "MX" => Some(DnsType::Mx),
            "NS" => Some(DnsType::Ns),
            "TXT" => Some(DnsType::Txt),
            _ => None,
        }
    }
}

/// Default TTL for records written by cloudos (seconds)
pub const DEFAULT_TTL: u32 = 86_400;

/// A single DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: DnsType,
    pub fqdn: String,
    pub value: String,
    pub ttl: u32,
}

impl DnsRecord {
    pub fn new(record_type: DnsType, fqdn: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            record_type,
            fqdn: fqdn.into(),
            value: value.into(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Selects records for listing or removal. Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecordMatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<DnsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    /// Matches records at or below this domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
}

impl DnsRecordMatch {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn fqdn(fqdn: impl Into<String>) -> Self {
        Self {
            fqdn: Some(fqdn.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, record_type: DnsType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    pub fn subdomain(subdomain: impl Into<String>) -> Self {
        Self {
            subdomain: Some(subdomain.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &DnsRecord) -> bool {
        if let Some(record_type) = self.record_type
            && record_type != record.record_type
        {
            return false;
        }
        if let Some(fqdn) = &self.fqdn
            && !fqdn.eq_ignore_ascii_case(&record.fqdn)
        {
            return false;
        }
        if let Some(sub) = &self.subdomain {
            let fqdn = record.fqdn.to_ascii_lowercase();
            let sub = sub.to_ascii_lowercase();
            if fqdn != sub && !fqdn.ends_with(&format!(".{}", sub)) {
                return false;
            }
        }
        true
    }
}

/// A DNS backend
///
/// Implementations must be thread-safe; one instance is shared by every
/// request path for the lifetime of the process.
#[async_trait]
pub trait DnsManager: Send + Sync + fmt::Debug {
    /// List records selected by `matcher`
    async fn list(&self, matcher: &DnsRecordMatch) -> Result<Vec<DnsRecord>>;

    /// Create or replace a record. Returns `true` if anything changed.
    async fn write(&self, record: &DnsRecord) -> Result<bool>;

    /// Remove records selected by `matcher`, returning how many were removed
    async fn remove(&self, matcher: &DnsRecordMatch) -> Result<usize>;

    /// Make pending changes visible (no-op for backends that apply immediately)
    async fn publish(&self) -> Result<()>;

    /// Backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// Map a non-success HTTP response to a DNS error
pub(crate) async fn ensure_success(
    manager: &'static str,
    action: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    let message = match status.as_u16() {
        401 | 403 => format!("Authentication failed during {}. Status: {}", action, status),
        404 => format!("Not found during {}: {}", action, error_text),
        429 => format!("Rate limit exceeded during {}. Status: {}", action, status),
        500..=599 => format!("Server error (transient) during {}: {} - {}", action, status, error_text),
        _ => format!("{} failed: {} - {}", action, status, error_text),
    };
    Err(Error::dns(manager, message))
}
