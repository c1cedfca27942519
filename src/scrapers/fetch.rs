//! Gated HTTP retrieval of listing pages and report files.
//!
//! Pages and files go through separate connection pools and separate gates so
//! a burst of report downloads never starves pagination (and vice versa).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::gate::FetchGate;
use crate::{config::IngestConfig, error::FetchError};

const USER_AGENT: &str = "spimex-ingest/0.1";

#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, FetchError>;
    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpFetchClient {
    page_http: Client,
    file_http: Client,
    page_gate: FetchGate,
    file_gate: FetchGate,
    file_timeout: Duration,
}

impl HttpFetchClient {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let page_http = Client::builder()
            .timeout(config.page_timeout)
            .pool_max_idle_per_host(config.page_concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build listing page HTTP client")?;

        let file_http = Client::builder()
            .pool_max_idle_per_host(config.file_concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build report file HTTP client")?;

        Ok(Self {
            page_http,
            file_http,
            page_gate: FetchGate::new("page", config.page_concurrency),
            file_gate: FetchGate::new("file", config.file_concurrency),
            file_timeout: config.file_timeout,
        })
    }

    pub fn page_gate(&self) -> &FetchGate {
        &self.page_gate
    }

    pub fn file_gate(&self) -> &FetchGate {
        &self.file_gate
    }

    async fn get(
        client: &Client,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>, FetchError> {
        let mut request = client.get(url);
        if let Some(t) = timeout {
            request = request.timeout(t);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl FetchClient for HttpFetchClient {
    async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let _permit = self.page_gate.acquire().await?;
        Self::get(&self.page_http, url, None).await
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let _permit = self.file_gate.acquire().await?;
        Self::get(&self.file_http, url, Some(self.file_timeout)).await
    }
}
