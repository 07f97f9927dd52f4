//! Declarative settings for cloudos
//!
//! These structures are loaded once at startup from a JSON document and
//! are plain data: nothing here performs I/O beyond reading the document.
//! Derived and lazily-built resources live on
//! [`CloudOsConfiguration`](crate::configuration::CloudOsConfiguration).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default username of the bootstrap administrator
pub const DEFAULT_ADMIN: &str = "admin";

/// Directory name of the app repository under the user's home
pub const APP_REPOSITORY: &str = "app-repository";

/// Default automation group name
pub const DEFAULT_ROOTY_GROUP: &str = "rooty";

/// A credential that never shows up in `Debug` output
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret value. Never log this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// Top-level cloudos settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudOsSettings {
    /// Database connection settings (handed to the persistence layer as-is)
    pub database: Option<DatabaseSettings>,

    pub redis: RedisSettings,

    /// Root directory holding installed apps
    pub app_repository: PathBuf,

    /// Shared key allowing the app store to trigger a refresh
    pub app_refresh_key: Option<String>,

    pub cloud_config: CloudStorageSettings,

    pub smtp: Option<SmtpSettings>,

    /// Root directory of email templates
    pub email_template_root: Option<PathBuf>,

    /// App store endpoint
    pub app_store: Option<ApiConnectionInfo>,

    /// Two-factor auth endpoint
    pub authy: Option<ApiConnectionInfo>,

    pub ldap: LdapSettings,

    /// Username of the bootstrap administrator
    pub default_admin: String,

    /// Automation/config-management integration
    pub rooty: Option<RootySettings>,

    /// Unix group the automation agent runs under
    pub rooty_group: String,

    /// Raw DNS mode. Parsed when the DNS manager is first resolved, so an
    /// unknown value only matters when DNS is enabled.
    pub dns_mode: Option<String>,

    pub dns: Option<DnsSettings>,

    /// Externally reachable base URI, e.g. `https://cloud.example.com`
    pub public_uri_base: String,

    pub http: HttpSettings,
}

impl CloudOsSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self {
            database: None,
            redis: RedisSettings::default(),
            app_repository: default_app_repository(),
            app_refresh_key: None,
            cloud_config: CloudStorageSettings::default(),
            smtp: None,
            email_template_root: None,
            app_store: None,
            authy: None,
            ldap: LdapSettings::default(),
            default_admin: DEFAULT_ADMIN.to_string(),
            rooty: None,
            rooty_group: DEFAULT_ROOTY_GROUP.to_string(),
            dns_mode: None,
            dns: None,
            public_uri_base: String::new(),
            http: HttpSettings::default(),
        }
    }

    /// Parse settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse settings from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read settings file {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded settings from {}", path.display());
        Self::from_json_str(&contents)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.default_admin.trim().is_empty() {
            return Err(Error::config("defaultAdmin cannot be empty"));
        }

        if self.app_repository.as_os_str().is_empty() {
            return Err(Error::config("appRepository cannot be empty"));
        }

        if !self.public_uri_base.is_empty()
            && !self.public_uri_base.starts_with("https://")
            && !self.public_uri_base.starts_with("http://")
        {
            return Err(Error::config(format!(
                "publicUriBase must use HTTP or HTTPS scheme. Got: {}",
                self.public_uri_base
            )));
        }

        if !self.http.base_uri.is_empty() && !self.http.base_uri.starts_with('/') {
            return Err(Error::config(format!(
                "http.baseUri must start with '/'. Got: {}",
                self.http.base_uri
            )));
        }

        if let Some(dns) = &self.dns {
            dns.validate()?;
        }
        if let Some(app_store) = &self.app_store {
            app_store.validate("appStore")?;
        }
        if let Some(authy) = &self.authy {
            authy.validate("authy")?;
        }

        Ok(())
    }
}

impl Default for CloudOsSettings {
    fn default() -> Self {
        Self::new()
    }
}

fn default_app_repository() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_REPOSITORY)
}

/// Connection info for a remote HTTP API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConnectionInfo {
    pub base_uri: String,
    pub user: Option<String>,
    pub password: Secret,
}

impl ApiConnectionInfo {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Secret::new(password);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.user.is_some() && !self.password.is_empty()
    }

    fn validate(&self, field: &str) -> Result<()> {
        if self.base_uri.is_empty() {
            return Err(Error::config(format!("{}.baseUri cannot be empty", field)));
        }
        Ok(())
    }
}

/// DNS backend settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsSettings {
    /// When false the no-op DNS manager is used regardless of mode
    pub enabled: bool,
    pub base_uri: String,
    pub user: Option<String>,
    pub password: Secret,
    /// Dyn customer/account name
    pub account: Option<String>,
    /// Zone managed by this host
    pub zone: Option<String>,
}

impl DnsSettings {
    /// Enabled settings pointing at `base_uri`
    pub fn enabled(base_uri: impl Into<String>) -> Self {
        Self {
            enabled: true,
            base_uri: base_uri.into(),
            ..Self::default()
        }
    }

    /// Whether the settings select a real backend
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn validate(&self) -> Result<()> {
        if self.enabled && self.base_uri.is_empty() {
            return Err(Error::config("dns.baseUri is required when dns.enabled=true"));
        }
        Ok(())
    }
}

/// HTTP layer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpSettings {
    pub port: u16,
    /// Path prefix of the REST API, e.g. `/api`
    pub base_uri: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            port: 3001,
            base_uri: "/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    pub driver: String,
    pub url: String,
    pub user: String,
    pub password: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    /// Prefix applied to every key written by cloudos
    pub key_prefix: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            key_prefix: "cloudos".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudStorageSettings {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Secret,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Secret,
    pub tls: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapSettings {
    pub server: Option<String>,
    pub domain: Option<String>,
    pub user: Option<String>,
    pub password: Secret,
}

/// Automation agent settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RootySettings {
    pub queue_name: String,
    /// Handler names the agent is allowed to dispatch to (e.g. `chef`, `postfix`)
    pub handlers: Vec<String>,
    pub secret: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = CloudOsSettings::new();
        assert_eq!(settings.default_admin, "admin");
        assert_eq!(settings.rooty_group, "rooty");
        assert_eq!(settings.http.base_uri, "/api");
        assert!(settings.app_repository.ends_with(APP_REPOSITORY));
        assert!(settings.dns.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn parse_camel_case_document() {
        let json = r#"{
            "appRepository": "/var/cloudos/apps",
            "publicUriBase": "https://cloud.example.com/",
            "dnsMode": "cdns",
            "dns": { "enabled": true, "baseUri": "https://dns.example.com", "password": "pw" },
            "appStore": { "baseUri": "https://store.example.com", "user": "u", "password": "p" },
            "http": { "port": 8080, "baseUri": "/api" }
        }"#;

        let settings = CloudOsSettings::from_json_str(json).unwrap();
        assert_eq!(settings.app_repository, PathBuf::from("/var/cloudos/apps"));
        assert_eq!(settings.dns_mode.as_deref(), Some("cdns"));
        let dns = settings.dns.as_ref().unwrap();
        assert!(dns.is_enabled());
        assert_eq!(dns.password.expose(), "pw");
        assert!(settings.app_store.as_ref().unwrap().has_credentials());
        assert_eq!(settings.http.port, 8080);
        assert_eq!(settings.default_admin, "admin");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn enabled_dns_requires_base_uri() {
        let mut settings = CloudOsSettings::new();
        settings.dns = Some(DnsSettings {
            enabled: true,
            ..DnsSettings::default()
        });
        assert!(settings.validate().is_err());

        settings.dns = Some(DnsSettings::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_bad_public_uri_base() {
        let mut settings = CloudOsSettings::new();
        settings.public_uri_base = "ftp://host".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn secrets_not_exposed_in_debug() {
        let info = ApiConnectionInfo::new("https://store.example.com")
            .with_credentials("cloudos", "secret_password_123");
        let debug_str = format!("{:?}", info);
        assert!(!debug_str.contains("secret_password_123"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn from_json_file_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudos.json");
        std::fs::write(&path, r#"{ "defaultAdmin": "root" }"#).unwrap();

        let settings = CloudOsSettings::from_json_file(&path).unwrap();
        assert_eq!(settings.default_admin, "root");

        let missing = CloudOsSettings::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
