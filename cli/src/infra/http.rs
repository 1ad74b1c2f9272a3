//! HTTP implementation of the `ConfigBackend` port.
//!
//! Talks to the console API: `GET/PUT {base}/config`, `GET/PUT {base}/env`
//! and `POST {base}/backup`, all with JSON bodies.

use std::time::Duration;

use anyhow::{Context, Result};
use polis_common::{ConsoleConfig, EnvVars};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::ConfigBackend;
use crate::domain::error::PersistenceError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Console API client.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a client for `base_url`. A trailing slash is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("polis-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, op: &'static str, req: RequestBuilder) -> Result<Response> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| PersistenceError::Io {
                op,
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PersistenceError::Status {
                op,
                status: status.as_u16(),
            }
            .into());
        }
        tracing::debug!(op, status = status.as_u16(), "console API request ok");
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, op: &'static str, path: &str) -> Result<T> {
        let resp = self.send(op, self.client.get(self.url(path))).await?;
        resp.json::<T>()
            .await
            .with_context(|| format!("{op}: decoding response body"))
    }

    async fn put_json<T: Serialize + ?Sized>(
        &self,
        op: &'static str,
        path: &str,
        body: &T,
    ) -> Result<()> {
        self.send(op, self.client.put(self.url(path)).json(body))
            .await
            .map(drop)
    }
}

impl ConfigBackend for HttpBackend {
    async fn get_config(&self) -> Result<ConsoleConfig> {
        self.get_json("GET config", "config").await
    }

    async fn put_config(&self, config: &ConsoleConfig) -> Result<()> {
        self.put_json("PUT config", "config", config).await
    }

    async fn get_env(&self) -> Result<EnvVars> {
        self.get_json("GET env", "env").await
    }

    async fn put_env(&self, env: &EnvVars) -> Result<()> {
        self.put_json("PUT env", "env", env).await
    }

    async fn post_backup(&self) -> Result<()> {
        self.send("POST backup", self.client.post(self.url("backup")))
            .await
            .map(drop)
    }
}
