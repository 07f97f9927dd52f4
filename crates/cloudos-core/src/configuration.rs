// # Configuration Root
//
// One object, built at startup and then shared (`Arc<CloudOsConfiguration>`)
// with every component that needs settings or the resources derived from
// them. Callers read everything through the same accessors whether the
// value is a plain field, built once and cached, or recomputed on each call:
//
// | Accessor                      | Kind                          |
// |-------------------------------|-------------------------------|
// | settings fields               | plain                         |
// | `dns_manager`                 | lazy, fatal on invalid mode   |
// | `hostname`, `short_hostname`  | lazy, fatal                   |
// | `public_ip`                   | lazy, fatal                   |
// | `app_store_client`            | lazy                          |
// | `two_factor_auth_client`      | lazy                          |
// | urls, locale, app layouts     | recomputed                    |
//
// Mutation (`settings_mut`, the client setters) is for startup wiring only.
// Resources already resolved are not rebuilt when settings change.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use crate::clients::{AppStoreClient, TwoFactorAuthClient};
use crate::config::{
    ApiConnectionInfo, CloudOsSettings, CloudStorageSettings, DatabaseSettings, DnsSettings,
    HttpSettings, LdapSettings, RedisSettings, RootySettings, SmtpSettings,
};
use crate::derived::{self, HasLocale};
use crate::dns::{DnsManager, init_dns_manager};
use crate::error::{Error, Result};
use crate::host::{HostIdentity, HostProbe};
use crate::lazy::LazySlot;
use crate::layout::{AppLayout, AppManifest};

/// Process-wide settings plus lazily-built services
#[derive(Debug)]
pub struct CloudOsConfiguration {
    settings: CloudOsSettings,
    host: HostIdentity,
    dns_manager: LazySlot<Arc<dyn DnsManager>>,
    app_store_client: LazySlot<Arc<AppStoreClient>>,
    two_factor_auth_client: LazySlot<Arc<TwoFactorAuthClient>>,
}

impl CloudOsConfiguration {
    /// Wrap settings; host facts come from the operating system
    pub fn new(settings: CloudOsSettings) -> Self {
        Self::with_host_identity(settings, HostIdentity::new())
    }

    /// Wrap settings with a custom source of host facts
    pub fn with_host_probe(settings: CloudOsSettings, probe: Box<dyn HostProbe>) -> Self {
        Self::with_host_identity(settings, HostIdentity::with_probe(probe))
    }

    fn with_host_identity(settings: CloudOsSettings, host: HostIdentity) -> Self {
        Self {
            settings,
            host,
            dns_manager: LazySlot::new("dns_manager"),
            app_store_client: LazySlot::new("app_store_client"),
            two_factor_auth_client: LazySlot::new("two_factor_auth_client"),
        }
    }

    // ─── Plain settings ───────────────────────────────────────

    pub fn settings(&self) -> &CloudOsSettings {
        &self.settings
    }

    /// Mutable settings, for startup wiring
    pub fn settings_mut(&mut self) -> &mut CloudOsSettings {
        &mut self.settings
    }

    pub fn database(&self) -> Option<&DatabaseSettings> {
        self.settings.database.as_ref()
    }

    pub fn redis(&self) -> &RedisSettings {
        &self.settings.redis
    }

    pub fn app_repository(&self) -> &Path {
        &self.settings.app_repository
    }

    pub fn app_refresh_key(&self) -> Option<&str> {
        self.settings.app_refresh_key.as_deref()
    }

    pub fn cloud_config(&self) -> &CloudStorageSettings {
        &self.settings.cloud_config
    }

    pub fn smtp(&self) -> Option<&SmtpSettings> {
        self.settings.smtp.as_ref()
    }

    pub fn email_template_root(&self) -> Option<&Path> {
        self.settings.email_template_root.as_deref()
    }

    pub fn app_store(&self) -> Option<&ApiConnectionInfo> {
        self.settings.app_store.as_ref()
    }

    pub fn authy(&self) -> Option<&ApiConnectionInfo> {
        self.settings.authy.as_ref()
    }

    pub fn ldap(&self) -> &LdapSettings {
        &self.settings.ldap
    }

    pub fn default_admin(&self) -> &str {
        &self.settings.default_admin
    }

    pub fn rooty(&self) -> Option<&RootySettings> {
        self.settings.rooty.as_ref()
    }

    pub fn rooty_group(&self) -> &str {
        &self.settings.rooty_group
    }

    pub fn dns_mode(&self) -> Option<&str> {
        self.settings.dns_mode.as_deref()
    }

    pub fn dns(&self) -> Option<&DnsSettings> {
        self.settings.dns.as_ref()
    }

    pub fn public_uri_base(&self) -> &str {
        &self.settings.public_uri_base
    }

    pub fn http(&self) -> &HttpSettings {
        &self.settings.http
    }

    // ─── Lazily-resolved services ─────────────────────────────

    /// The DNS manager selected by `dnsMode` and `dns`, built on first call
    pub fn dns_manager(&self) -> Result<Arc<dyn DnsManager>> {
        self.dns_manager
            .get_or_try_init(|| init_dns_manager(self.dns_mode(), self.dns()))
            .cloned()
    }

    pub fn hostname(&self) -> Result<&str> {
        self.host.hostname()
    }

    pub fn short_hostname(&self) -> Result<&str> {
        self.host.short_hostname()
    }

    pub fn public_ip(&self) -> Result<IpAddr> {
        self.host.public_ip()
    }

    /// App store client, built from `appStore` on first call
    pub fn app_store_client(&self) -> Result<Arc<AppStoreClient>> {
        self.app_store_client
            .get_or_try_init(|| {
                let connection = self
                    .app_store()
                    .ok_or_else(|| Error::config("appStore is not configured"))?;
                AppStoreClient::new(connection).map(Arc::new)
            })
            .cloned()
    }

    /// Install a pre-built app store client. Fails once the client is resolved.
    pub fn set_app_store_client(&self, client: AppStoreClient) -> Result<()> {
        self.app_store_client
            .set(Arc::new(client))
            .map_err(|_| Error::AlreadyResolved("app_store_client"))
    }

    /// Two-factor auth client, built from `authy` on first call
    pub fn two_factor_auth_client(&self) -> Result<Arc<TwoFactorAuthClient>> {
        self.two_factor_auth_client
            .get_or_try_init(|| {
                let connection = self
                    .authy()
                    .ok_or_else(|| Error::config("authy is not configured"))?;
                TwoFactorAuthClient::new(connection).map(Arc::new)
            })
            .cloned()
    }

    /// Install a pre-built two-factor auth client. Fails once the client is resolved.
    pub fn set_two_factor_auth_client(&self, client: TwoFactorAuthClient) -> Result<()> {
        self.two_factor_auth_client
            .set(Arc::new(client))
            .map_err(|_| Error::AlreadyResolved("two_factor_auth_client"))
    }

    // ─── Derived values ───────────────────────────────────────

    pub fn reset_password_url(&self, token: &str) -> String {
        derived::reset_password_url(self.public_uri_base(), token)
    }

    pub fn asset_url_base(&self) -> String {
        derived::asset_url_base(self.public_uri_base(), &self.http().base_uri)
    }

    pub fn locale<A: HasLocale + ?Sized>(&self, account: &A) -> String {
        derived::locale_for(account)
    }

    pub fn system_locale(&self) -> String {
        derived::system_locale()
    }

    pub fn app_layout(&self, name: &str) -> AppLayout {
        AppLayout::new(self.app_repository(), name)
    }

    pub fn app_layout_version(&self, name: &str, version: &str) -> AppLayout {
        AppLayout::with_version(self.app_repository(), name, version)
    }

    pub fn app_layout_for_manifest(&self, manifest: &AppManifest) -> AppLayout {
        AppLayout::for_manifest(self.app_repository(), manifest)
    }

    pub fn app_layout_for_latest_version(&self, name: &str) -> AppLayout {
        AppLayout::for_latest_version(self.app_repository(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration() -> CloudOsConfiguration {
        let mut settings = CloudOsSettings::new();
        settings.public_uri_base = "https://host/".to_string();
        settings.app_repository = "/var/cloudos/apps".into();
        CloudOsConfiguration::new(settings)
    }

    #[test]
    fn plain_fields() {
        let mut config = configuration();
        assert_eq!(config.default_admin(), "admin");
        assert_eq!(config.rooty_group(), "rooty");
        assert!(config.database().is_none());
        assert_eq!(config.http().port, 3001);
        assert_eq!(config.http().base_uri, "/api");
        assert!(config.cloud_config().bucket.is_none());

        config.settings_mut().default_admin = "root".to_string();
        config.settings_mut().cloud_config.bucket = Some("cloudos-backups".to_string());
        config.settings_mut().http.base_uri = "/v2".to_string();
        assert_eq!(config.default_admin(), "root");
        assert_eq!(config.cloud_config().bucket.as_deref(), Some("cloudos-backups"));
        assert_eq!(config.asset_url_base(), "https://host/v2/app_assets/");
    }

    #[test]
    fn derived_urls() {
        let config = configuration();
        assert_eq!(config.asset_url_base(), "https://host/api/app_assets/");
        assert_eq!(
            config.reset_password_url("tok"),
            "https://host//reset_password.html?key=tok"
        );
    }

    #[test]
    fn missing_app_store_is_not_fatal_and_retries() {
        let mut config = configuration();
        let err = config.app_store_client().unwrap_err();
        assert!(!err.is_fatal());

        config.settings_mut().app_store = Some(ApiConnectionInfo::new("https://store.example.com"));
        let first = config.app_store_client().unwrap();
        let second = config.app_store_client().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn two_factor_client_built_once_from_authy() {
        let mut config = configuration();
        let err = config.two_factor_auth_client().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        config.settings_mut().authy = Some(ApiConnectionInfo::new("https://api.authy.com"));
        let first = config.two_factor_auth_client().unwrap();
        let second = config.two_factor_auth_client().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.connection().base_uri, "https://api.authy.com");
    }

    #[test]
    fn injected_client_wins() {
        let config = configuration();
        let client = TwoFactorAuthClient::new(&ApiConnectionInfo::new("https://api.authy.com")).unwrap();
        config.set_two_factor_auth_client(client).unwrap();

        let resolved = config.two_factor_auth_client().unwrap();
        assert_eq!(resolved.connection().base_uri, "https://api.authy.com");

        let again = TwoFactorAuthClient::new(&ApiConnectionInfo::new("https://other.example.com")).unwrap();
        assert!(matches!(
            config.set_two_factor_auth_client(again),
            Err(Error::AlreadyResolved(_))
        ));
    }

    #[test]
    fn layouts_rooted_at_repository() {
        let config = configuration();
        let versioned = config.app_layout_version("myapp", "2.0");
        let plain = config.app_layout("myapp");
        assert_eq!(versioned.app_dir(), plain.app_dir());
        assert!(versioned.app_dir().starts_with("/var/cloudos/apps"));
    }
}
