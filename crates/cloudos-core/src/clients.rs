//! Handles for remote services configured through [`ApiConnectionInfo`]
//!
//! Only construction is owned here: the base URI is validated and an HTTP
//! client is built. What each service's API looks like is up to the code
//! that uses the handle.

use std::time::Duration;

use crate::config::ApiConnectionInfo;
use crate::error::{Error, Result};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared construction for API handles
#[derive(Debug, Clone)]
struct ApiHandle {
    connection: ApiConnectionInfo,
    base: reqwest::Url,
    http: reqwest::Client,
}

impl ApiHandle {
    fn new(service: &str, connection: &ApiConnectionInfo) -> Result<Self> {
        let mut base = reqwest::Url::parse(&connection.base_uri).map_err(|e| {
            Error::config(format!("invalid {} baseUri {}: {}", service, connection.base_uri, e))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(format!("cloudos/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::info!("Created {} client for {}", service, base);
        Ok(Self {
            connection: connection.clone(),
            base,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::config(format!("invalid endpoint path {}: {}", path, e)))
    }

    /// Request builder with credentials applied
    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let builder = self.http.request(method, self.endpoint(path)?);
        Ok(match &self.connection.user {
            Some(user) => builder.basic_auth(user, Some(self.connection.password.expose())),
            None => builder,
        })
    }
}

/// Client for the app store
#[derive(Debug, Clone)]
pub struct AppStoreClient {
    inner: ApiHandle,
}

impl AppStoreClient {
    pub fn new(connection: &ApiConnectionInfo) -> Result<Self> {
        Ok(Self {
            inner: ApiHandle::new("app store", connection)?,
        })
    }

    pub fn connection(&self) -> &ApiConnectionInfo {
        &self.inner.connection
    }

    /// Absolute URL of `path` under the app store base URI
    pub fn endpoint(&self, path: &str) -> Result<reqwest::Url> {
        self.inner.endpoint(path)
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        self.inner.request(method, path)
    }
}

/// Client for the two-factor authentication service
#[derive(Debug, Clone)]
pub struct TwoFactorAuthClient {
    inner: ApiHandle,
}

impl TwoFactorAuthClient {
    pub fn new(connection: &ApiConnectionInfo) -> Result<Self> {
        Ok(Self {
            inner: ApiHandle::new("two-factor auth", connection)?,
        })
    }

    pub fn connection(&self) -> &ApiConnectionInfo {
        &self.inner.connection
    }

    pub fn endpoint(&self, path: &str) -> Result<reqwest::Url> {
        self.inner.endpoint(path)
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        self.inner.request(method, path)
    }
}
