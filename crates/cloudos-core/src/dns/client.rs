// # cloudos-dns Client
//
// Direct client for a cloudos-dns server, used for both the `internal`
// (server on this host) and `cdns` (central server) modes. Changes are
// applied by the server immediately, so `publish` is a no-op.

use async_trait::async_trait;
use std::time::Duration;

use super::{DnsManager, DnsRecord, DnsRecordMatch, ensure_success};
use crate::config::{DnsSettings, Secret};
use crate::error::{Error, Result};

const MANAGER: &str = "cdns";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a cloudos-dns server
pub struct DnsClient {
    base_uri: String,
    user: Option<String>,
    password: Secret,
    client: reqwest::Client,
}

impl std::fmt::Debug for DnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsClient")
            .field("base_uri", &self.base_uri)
            .field("user", &self.user)
            .field("password", &self.password)
            .finish()
    }
}

impl DnsClient {
    pub fn new(settings: &DnsSettings) -> Result<Self> {
        reqwest::Url::parse(&settings.base_uri)
            .map_err(|e| Error::config(format!("invalid dns.baseUri {}: {}", settings.base_uri, e)))?;

        let client = reqwest::Client::builder().timeout(DEFAULT_HTTP_TIMEOUT).build()?;

        Ok(Self {
            base_uri: settings.base_uri.trim_end_matches('/').to_string(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            client,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/dns/{}", self.base_uri, path));
        match &self.user {
            Some(user) => builder.basic_auth(user, Some(self.password.expose())),
            None => builder,
        }
    }
}

#[async_trait]
impl DnsManager for DnsClient {
    async fn list(&self, matcher: &DnsRecordMatch) -> Result<Vec<DnsRecord>> {
        let response = self
            .request(reqwest::Method::POST, "records/list")
            .json(matcher)
            .send()
            .await?;
        Ok(ensure_success(MANAGER, "list", response).await?.json().await?)
    }

    async fn write(&self, record: &DnsRecord) -> Result<bool> {
        tracing::info!(
            "Writing cloudos-dns record: {} {} -> {}",
            record.record_type.as_str(),
            record.fqdn,
            record.value
        );
        let response = self
            .request(reqwest::Method::PUT, "records")
            .json(record)
            .send()
            .await?;
        Ok(ensure_success(MANAGER, "write", response).await?.json().await?)
    }

    async fn remove(&self, matcher: &DnsRecordMatch) -> Result<usize> {
        let response = self
            .request(reqwest::Method::POST, "records/remove")
            .json(matcher)
            .send()
            .await?;
        Ok(ensure_success(MANAGER, "remove", response).await?.json().await?)
    }

    async fn publish(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        MANAGER
    }
}
