// # cloudos-core
//
// Configuration root and service locator for a cloudos server.
//
// ## Architecture Overview
//
// - **CloudOsSettings**: declarative settings loaded once at startup
// - **LazySlot**: compute-once holder behind every expensive accessor
// - **HostIdentity**: hostname, short hostname and public IP of this machine
// - **DnsManager**: DNS backend chosen by `dnsMode` (mock, Dyn, cloudos-dns)
// - **CloudOsConfiguration**: aggregates all of the above behind one read API
//
// ## Error Model
//
// Fatal errors (`Error::is_fatal`) abort startup: an invalid DNS mode, or a
// host whose name or address cannot be determined. Disabled DNS is not an
// error; it resolves to the mock manager.

pub mod clients;
pub mod config;
pub mod configuration;
pub mod derived;
pub mod dns;
pub mod error;
pub mod host;
pub mod layout;
pub mod lazy;

// Re-export core types for convenience
pub use clients::{AppStoreClient, TwoFactorAuthClient};
pub use config::{ApiConnectionInfo, CloudOsSettings, DnsSettings, Secret};
pub use configuration::CloudOsConfiguration;
pub use derived::HasLocale;
pub use dns::{DnsManager, DnsMode, DnsRecord, DnsRecordMatch, DnsType};
pub use error::{Error, Result};
pub use host::{HostIdentity, HostProbe, SystemHostProbe};
pub use layout::{AppLayout, AppManifest};
pub use lazy::LazySlot;
