//! Backend selection for the process-wide DNS manager

use std::sync::Arc;

use super::{DnsClient, DnsManager, DnsMode, DynDnsManager, MockDnsManager};
use crate::config::DnsSettings;
use crate::error::{Error, Result};

/// Choose and construct the DNS manager for this process
///
/// Disabled or missing DNS settings always yield the mock manager, whatever
/// `mode` says. With DNS enabled, `mode` must name a known backend; an
/// unknown or missing mode is a fatal [`Error::InvalidDnsMode`] and never
/// falls back to the mock.
pub fn init_dns_manager(mode: Option<&str>, dns: Option<&DnsSettings>) -> Result<Arc<dyn DnsManager>> {
    let Some(dns) = dns.filter(|dns| dns.is_enabled()) else {
        tracing::warn!("DNS management disabled, using mock DNS manager");
        return Ok(Arc::new(MockDnsManager::new()));
    };

    let mode: DnsMode = mode
        .ok_or_else(|| Error::invalid_dns_mode("<unset>"))?
        .parse()?;

    let manager: Arc<dyn DnsManager> = match mode {
        DnsMode::Dyn => Arc::new(DynDnsManager::new(dns)?),
        DnsMode::Internal | DnsMode::Cdns => Arc::new(DnsClient::new(dns)?),
    };

    tracing::info!("DNS manager initialized: mode={} backend={}", mode, manager.name());
    Ok(manager)
}
