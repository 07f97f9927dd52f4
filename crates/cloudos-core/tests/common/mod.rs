//! Test doubles shared by the contract tests

#![allow(dead_code)]

use cloudos_core::{CloudOsConfiguration, CloudOsSettings, DnsSettings, HostProbe};
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A HostProbe that returns fixed answers and counts calls
#[derive(Clone)]
pub struct CountingProbe {
    hostname: String,
    addresses: Vec<IpAddr>,
    hostname_calls: Arc<AtomicUsize>,
    resolve_calls: Arc<AtomicUsize>,
}

impl CountingProbe {
    pub fn new(hostname: &str, addresses: Vec<IpAddr>) -> Self {
        Self {
            hostname: hostname.to_string(),
            addresses,
            hostname_calls: Arc::new(AtomicUsize::new(0)),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn hostname_calls(&self) -> usize {
        self.hostname_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

impl HostProbe for CountingProbe {
    fn hostname(&self) -> io::Result<String> {
        self.hostname_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hostname.clone())
    }

    fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.addresses.clone())
    }
}

/// A HostProbe whose address lookups fail a fixed number of times
pub struct FlakyResolveProbe {
    failures_left: AtomicUsize,
    address: IpAddr,
    resolve_calls: Arc<AtomicUsize>,
}

impl FlakyResolveProbe {
    pub fn new(failures: usize, address: IpAddr) -> (Self, Arc<AtomicUsize>) {
        let resolve_calls = Arc::new(AtomicUsize::new(0));
        let probe = Self {
            failures_left: AtomicUsize::new(failures),
            address,
            resolve_calls: Arc::clone(&resolve_calls),
        };
        (probe, resolve_calls)
    }
}

impl HostProbe for FlakyResolveProbe {
    fn hostname(&self) -> io::Result<String> {
        Ok("flaky.example.com".to_string())
    }

    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unknown host {}", host),
            ));
        }
        Ok(vec![self.address])
    }
}

/// A HostProbe with no hostname at all
pub struct NoHostnameProbe;

impl HostProbe for NoHostnameProbe {
    fn hostname(&self) -> io::Result<String> {
        Err(io::Error::other("gethostname failed"))
    }

    fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        Ok(Vec::new())
    }
}

/// Settings with DNS enabled and the given mode
pub fn settings_with_dns(mode: Option<&str>, enabled: bool) -> CloudOsSettings {
    let mut settings = CloudOsSettings::new();
    settings.dns_mode = mode.map(str::to_string);
    settings.dns = Some(DnsSettings {
        enabled,
        ..DnsSettings::enabled("https://dns.example.com")
    });
    settings
}

/// Configuration using a fixed host probe
pub fn configuration(settings: CloudOsSettings) -> CloudOsConfiguration {
    let probe = CountingProbe::new("build.example.com", vec![IpAddr::from([10, 0, 0, 5])]);
    CloudOsConfiguration::with_host_probe(settings, Box::new(probe))
}
