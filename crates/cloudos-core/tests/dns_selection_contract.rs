//! Contract Test: DNS manager selection
//!
//! Constraints verified:
//! - Unknown modes with DNS enabled fail with a fatal "invalid mode" error
//! - Disabled or absent DNS settings always yield the mock manager
//! - The manager is constructed once and the same instance is returned
//! - A failed resolution is retried on the next read

mod common;

use cloudos_core::dns::DnsRecord;
use cloudos_core::{CloudOsSettings, DnsManager, DnsRecordMatch, DnsType, Error};
use common::*;
use std::sync::{Arc, Barrier};

#[test]
fn unknown_modes_fail_with_invalid_mode() {
    for mode in ["route53", "mock", "DYN", "", "cdns "] {
        let config = configuration(settings_with_dns(Some(mode), true));
        let err = config.dns_manager().unwrap_err();

        assert!(
            matches!(&err, Error::InvalidDnsMode { mode: m } if m == mode),
            "mode {:?} should be rejected, got {:?}",
            mode,
            err
        );
        assert!(err.is_fatal());
    }
}

#[test]
fn disabled_dns_always_uses_mock() {
    for mode in [None, Some("dyn"), Some("internal"), Some("cdns"), Some("nonsense")] {
        let config = configuration(settings_with_dns(mode, false));
        assert_eq!(config.dns_manager().unwrap().name(), "mock");
    }

    let config = configuration(CloudOsSettings::new());
    assert_eq!(config.dns_manager().unwrap().name(), "mock");
}

#[test]
fn known_modes_select_backend() {
    let config = configuration(settings_with_dns(Some("cdns"), true));
    assert_eq!(config.dns_manager().unwrap().name(), "cdns");

    let config = configuration(settings_with_dns(Some("internal"), true));
    assert_eq!(config.dns_manager().unwrap().name(), "cdns");
}

#[test]
fn repeated_reads_return_same_instance() {
    let config = configuration(CloudOsSettings::new());

    let first = config.dns_manager().unwrap();
    let second = config.dns_manager().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // Writes through one handle are visible through the other
    tokio_test::block_on(async {
        let record = DnsRecord::new(DnsType::A, "build.example.com", "10.0.0.5");
        assert!(first.write(&record).await.unwrap());
        let listed = second
            .list(&DnsRecordMatch::fqdn("build.example.com"))
            .await
            .unwrap();
        assert_eq!(listed, vec![record]);
    });
}

#[test]
fn resolved_manager_survives_settings_change() {
    let mut config = configuration(settings_with_dns(Some("cdns"), true));
    let first = config.dns_manager().unwrap();

    config.settings_mut().dns = None;
    let second = config.dns_manager().unwrap();

    assert_eq!(second.name(), "cdns");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn failed_resolution_is_retried() {
    let mut config = configuration(settings_with_dns(Some("bogus"), true));
    assert!(config.dns_manager().unwrap_err().is_fatal());

    config.settings_mut().dns_mode = Some("cdns".to_string());
    assert_eq!(config.dns_manager().unwrap().name(), "cdns");
}

#[test]
fn concurrent_first_reads_share_one_manager() {
    let config = Arc::new(configuration(CloudOsSettings::new()));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let config = Arc::clone(&config);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                config.dns_manager().unwrap()
            })
        })
        .collect();

    let managers: Vec<Arc<dyn DnsManager>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(managers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}
