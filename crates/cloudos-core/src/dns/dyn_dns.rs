// # Dyn DNS Manager
//
// Talks to the Dyn Managed DNS REST API. A session token is obtained on
// first use and reused until the API rejects it.
//
// ## API Reference
//
// - Login: POST `/REST/Session/`
// - List: GET `/REST/AllRecord/:zone/:fqdn/?detail=Y`
// - Write: PUT `/REST/:TypeRecord/:zone/:fqdn/`
// - Remove: DELETE `/REST/:TypeRecord/:zone/:fqdn/`
// - Publish: PUT `/REST/Zone/:zone/`

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{DnsManager, DnsRecord, DnsRecordMatch, DnsType, ensure_success};
use crate::config::{DnsSettings, Secret};
use crate::error::{Error, Result};

const MANAGER: &str = "dyn";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Dyn-backed DNS manager
pub struct DynDnsManager {
    base_uri: String,
    account: String,
    user: String,
    password: Secret,
    zone: String,
    client: reqwest::Client,
    /// Session token, obtained lazily
    token: Mutex<Option<String>>,
}

impl std::fmt::Debug for DynDnsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynDnsManager")
            .field("base_uri", &self.base_uri)
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password)
            .field("zone", &self.zone)
            .finish()
    }
}

impl DynDnsManager {
    /// Build a manager from DNS settings
    ///
    /// `account`, `user`, `password` and `zone` are all required.
    pub fn new(settings: &DnsSettings) -> Result<Self> {
        let missing = |field: &str| Error::config(format!("dyn DNS mode requires dns.{}", field));

        let account = settings.account.clone().ok_or_else(|| missing("account"))?;
        let user = settings.user.clone().ok_or_else(|| missing("user"))?;
        let zone = settings.zone.clone().ok_or_else(|| missing("zone"))?;
        if settings.password.is_empty() {
            return Err(missing("password"));
        }
        reqwest::Url::parse(&settings.base_uri)
            .map_err(|e| Error::config(format!("invalid dns.baseUri {}: {}", settings.base_uri, e)))?;

        let client = reqwest::Client::builder().timeout(DEFAULT_HTTP_TIMEOUT).build()?;

        Ok(Self {
            base_uri: settings.base_uri.trim_end_matches('/').to_string(),
            account,
            user,
            password: settings.password.clone(),
            zone,
            client,
            token: Mutex::new(None),
        })
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    fn url(&self, path: &str) -> String {
        format!("{}/REST/{}", self.base_uri, path)
    }

    fn record_path(&self, record_type: DnsType, fqdn: &str) -> String {
        format!("{}Record/{}/{}/", record_type.as_str(), self.zone, fqdn)
    }

    async fn session_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        tracing::debug!("Opening Dyn session for account {}", self.account);
        let response = self
            .client
            .post(self.url("Session/"))
            .json(&json!({
                "customer_name": self.account,
                "user_name": self.user,
                "password": self.password.expose(),
            }))
            .send()
            .await?;
        let body: Value = ensure_success(MANAGER, "login", response).await?.json().await?;

        let token = body["data"]["token"]
            .as_str()
            .ok_or_else(|| Error::dns(MANAGER, "Invalid response format: data.token is not a string"))?
            .to_string();
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn send(&self, action: &str, request: reqwest::RequestBuilder) -> Result<Value> {
        let token = self.session_token().await?;
        let response = request.header("Auth-Token", &token).send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            // Token expired; the next call logs in again
            *self.token.lock().await = None;
        }

        let body = ensure_success(MANAGER, action, response).await?.text().await?;
        Self::parse_body(action, &body)
    }

    /// An empty body is `Null`; anything else must be JSON
    fn parse_body(action: &str, body: &str) -> Result<Value> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(body)
            .map_err(|e| Error::dns(MANAGER, format!("{} returned a non-JSON body: {}", action, e)))
    }

    fn rdata(record: &DnsRecord) -> Value {
        match record.record_type {
            DnsType::A | DnsType::Aaaa => json!({ "address": record.value }),
            DnsType::Cname => json!({ "cname": record.value }),
            DnsType::Mx => json!({ "exchange": record.value, "preference": 10 }),
            DnsType::Ns => json!({ "nsdname": record.value }),
            DnsType::Txt => json!({ "txtdata": record.value }),
        }
    }

    fn parse_records(data: &Value) -> Vec<DnsRecord> {
        let Some(groups) = data.as_object() else {
            return Vec::new();
        };

        groups
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(|entry| {
                let record_type = DnsType::parse(entry["record_type"].as_str()?)?;
                let fqdn = entry["fqdn"].as_str()?;
                let value = entry["rdata"]
                    .as_object()?
                    .values()
                    .find_map(Value::as_str)?;
                let ttl = entry["ttl"].as_u64().unwrap_or(u64::from(super::DEFAULT_TTL));
                Some(
                    DnsRecord::new(record_type, fqdn, value)
                        .with_ttl(u32::try_from(ttl).unwrap_or(u32::MAX)),
                )
            })
            .collect()
    }
}

#[async_trait]
impl DnsManager for DynDnsManager {
    async fn list(&self, matcher: &DnsRecordMatch) -> Result<Vec<DnsRecord>> {
        let node = matcher.fqdn.as_deref().unwrap_or(&self.zone);
        let url = self.url(&format!("AllRecord/{}/{}/?detail=Y", self.zone, node));
        let body = self.send("list", self.client.get(url)).await?;
        if body.is_null() {
            return Err(Error::dns(MANAGER, "list returned an empty body"));
        }

        Ok(Self::parse_records(&body["data"])
            .into_iter()
            .filter(|record| matcher.matches(record))
            .collect())
    }

    async fn write(&self, record: &DnsRecord) -> Result<bool> {
        tracing::info!(
            "Writing Dyn DNS record: {} {} -> {}",
            record.record_type.as_str(),
            record.fqdn,
            record.value
        );
        let url = self.url(&self.record_path(record.record_type, &record.fqdn));
        let payload = json!({
            "rdata": Self::rdata(record),
            "ttl": record.ttl,
        });
        self.send("write", self.client.put(url).json(&payload)).await?;
        Ok(true)
    }

    async fn remove(&self, matcher: &DnsRecordMatch) -> Result<usize> {
        let targets = self.list(matcher).await?;
        for record in &targets {
            tracing::info!("Removing Dyn DNS record: {} {}", record.record_type.as_str(), record.fqdn);
            let url = self.url(&self.record_path(record.record_type, &record.fqdn));
            self.send("remove", self.client.delete(url)).await?;
        }
        Ok(targets.len())
    }

    async fn publish(&self) -> Result<()> {
        tracing::info!("Publishing Dyn zone {}", self.zone);
        let url = self.url(&format!("Zone/{}/", self.zone));
        self.send("publish", self.client.put(url).json(&json!({ "publish": true })))
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        MANAGER
    }
}
