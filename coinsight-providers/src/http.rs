//! Shared GET-and-decode plumbing for the HTTP providers.

use coinsight_core::{CoinsightError, ProviderConfig};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use url::Url;

pub struct Http {
    provider: &'static str,
    client: reqwest::Client,
    base: String,
    headers: Vec<(&'static str, String)>,
    params: Vec<(&'static str, String)>,
}

impl Http {
    pub fn new(provider: &'static str, cfg: &ProviderConfig) -> Result<Self, CoinsightError> {
        let base = Url::parse(cfg.base_url.trim()).map_err(|e| {
            CoinsightError::InvalidArg(format!(
                "{provider}: invalid base_url '{}': {e}",
                cfg.base_url
            ))
        })?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(concat!("coinsight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoinsightError::InvalidArg(format!("{provider}: http client: {e}")))?;
        Ok(Self {
            provider,
            client,
            base: base.as_str().trim_end_matches('/').to_string(),
            headers: Vec::new(),
            params: Vec::new(),
        })
    }

    /// Send `value` as header `name` on every request.
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Append `name=value` to every request's query string.
    pub fn with_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn transport(&self, path: &str, e: &reqwest::Error) -> CoinsightError {
        if e.is_timeout() {
            CoinsightError::provider_timeout(self.provider)
        } else {
            CoinsightError::unavailable(self.provider, format!("GET {path}: {e}"))
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "coinsight::providers::http::send",
            level = "debug",
            skip(self, query),
            fields(provider = self.provider),
        )
    )]
    async fn send(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, CoinsightError> {
        let mut req = self.client.get(self.url(path)).query(query).query(&self.params);
        for (name, value) in &self.headers {
            req = req.header(*name, value.as_str());
        }
        let resp = req.send().await.map_err(|e| self.transport(path, &e))?;
        let status = resp.status();
        #[cfg(feature = "tracing")]
        tracing::debug!(status = status.as_u16(), "response");
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1_000));
            return Err(CoinsightError::rate_limited(self.provider, retry_after_ms));
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, CoinsightError> {
        let body = resp.bytes().await.map_err(|e| self.transport(path, &e))?;
        serde_json::from_slice(&body).map_err(|e| {
            CoinsightError::unavailable(self.provider, format!("GET {path}: decode: {e}"))
        })
    }

    /// GET `path` and decode a JSON body. Any non-success status is an outage.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CoinsightError> {
        let resp = self.send(path, query).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoinsightError::unavailable(
                self.provider,
                format!("GET {path}: HTTP {status}"),
            ));
        }
        self.decode(path, resp).await
    }

    /// Like [`Http::get_json`], but 400 and 404 answer `Ok(None)`.
    pub async fn get_json_or_missing<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, CoinsightError> {
        let resp = self.send(path, query).await?;
        match resp.status() {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Ok(None),
            s if !s.is_success() => Err(CoinsightError::unavailable(
                self.provider,
                format!("GET {path}: HTTP {s}"),
            )),
            _ => self.decode(path, resp).await.map(Some),
        }
    }
}
