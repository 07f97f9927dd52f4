// # Host Identity
//
// Machine-facing facts: the configured hostname, its short form, and the
// address the hostname resolves to. Each is looked up from the operating
// system on first read and cached for the life of the process.
//
// Failing to learn the hostname or address is fatal. A server that does not
// know its own identity cannot publish DNS records or build public URLs.

use std::fmt;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};

use crate::error::{Error, Result};
use crate::lazy::LazySlot;

/// Source of host facts
pub trait HostProbe: Send + Sync {
    /// The machine's configured hostname
    fn hostname(&self) -> io::Result<String>;

    /// Addresses the given host name resolves to
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Probe backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostProbe;

impl HostProbe for SystemHostProbe {
    fn hostname(&self) -> io::Result<String> {
        hostname::get()?.into_string().map_err(|raw| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("hostname is not valid UTF-8: {:?}", raw),
            )
        })
    }

    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        Ok((host, 0).to_socket_addrs()?.map(|addr| addr.ip()).collect())
    }
}

/// Everything up to the first `.`, or the whole name if there is none
pub fn short_hostname(hostname: &str) -> &str {
    match hostname.find('.') {
        Some(pos) => &hostname[..pos],
        None => hostname,
    }
}

/// Lazily-resolved host facts
pub struct HostIdentity {
    probe: Box<dyn HostProbe>,
    hostname: LazySlot<String>,
    short_hostname: LazySlot<String>,
    public_ip: LazySlot<IpAddr>,
}

impl HostIdentity {
    /// Resolve facts from the operating system
    pub fn new() -> Self {
        Self::with_probe(Box::new(SystemHostProbe))
    }

    pub fn with_probe(probe: Box<dyn HostProbe>) -> Self {
        Self {
            probe,
            hostname: LazySlot::new("hostname"),
            short_hostname: LazySlot::new("short_hostname"),
            public_ip: LazySlot::new("public_ip"),
        }
    }

    pub fn hostname(&self) -> Result<&str> {
        self.hostname
            .get_or_try_init(|| {
                self.probe
                    .hostname()
                    .map(|h| h.trim().to_string())
                    .map_err(|source| Error::Hostname { source })
            })
            .map(String::as_str)
    }

    pub fn short_hostname(&self) -> Result<&str> {
        self.short_hostname
            .get_or_try_init(|| Ok::<_, Error>(short_hostname(self.hostname()?).to_string()))
            .map(String::as_str)
    }

    /// Address of the local host, preferring IPv4
    pub fn public_ip(&self) -> Result<IpAddr> {
        self.public_ip
            .get_or_try_init(|| {
                let hostname = self.hostname()?;
                let addresses = self.probe.resolve(hostname).map_err(|source| Error::PublicIp {
                    hostname: hostname.to_string(),
                    source,
                })?;

                let ip = addresses
                    .iter()
                    .find(|ip| ip.is_ipv4())
                    .or_else(|| addresses.first())
                    .copied()
                    .ok_or_else(|| Error::PublicIp {
                        hostname: hostname.to_string(),
                        source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
                    })?;

                tracing::info!("Resolved public ip: {}", ip);
                Ok::<_, Error>(ip)
            })
            .copied()
    }
}

impl Default for HostIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostIdentity")
            .field("hostname", &self.hostname)
            .field("short_hostname", &self.short_hostname)
            .field("public_ip", &self.public_ip)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(&'static str, Vec<IpAddr>);

    impl HostProbe for FixedProbe {
        fn hostname(&self) -> io::Result<String> {
            Ok(self.0.to_string())
        }

        fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            Ok(self.1.clone())
        }
    }

    #[test]
    fn short_hostname_cuts_at_first_dot() {
        assert_eq!(short_hostname("build.example.com"), "build");
        assert_eq!(short_hostname("localhost"), "localhost");
        assert_eq!(short_hostname(".hidden"), "");
    }

    #[test]
    fn prefers_ipv4() {
        let v6: IpAddr = "fe80::1".parse().unwrap();
        let v4: IpAddr = "192.168.1.20".parse().unwrap();
        let host = HostIdentity::with_probe(Box::new(FixedProbe("box.example.com\n", vec![v6, v4])));

        assert_eq!(host.hostname().unwrap(), "box.example.com");
        assert_eq!(host.short_hostname().unwrap(), "box");
        assert_eq!(host.public_ip().unwrap(), v4);
    }

    #[test]
    fn no_addresses_is_fatal() {
        let host = HostIdentity::with_probe(Box::new(FixedProbe("box", Vec::new())));
        let err = host.public_ip().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("no addresses found"));
    }

    #[test]
    fn system_probe_reports_hostname() {
        let name = SystemHostProbe.hostname().unwrap();
        assert!(!name.is_empty());
    }
}
