use async_trait::async_trait;
use log::debug;
use reqwest::Client;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::errors::CoreError;
use crate::models::settings::ClientConfig;

/// `Transport` backed by reqwest.
///
/// - **Base URL**: every request path is appended to `ClientConfig::base_url`.
/// - **Deadline**: the reqwest client timeout is `ClientConfig::timeout_secs`;
///   hitting it yields `CoreError::Timeout`.
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        Ok(Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn map_error(&self, e: reqwest::Error) -> CoreError {
        if e.is_timeout() {
            CoreError::Timeout(self.config.timeout_secs)
        } else {
            CoreError::from(e)
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, CoreError> {
        let url = self.config.url_for(&request.path);
        debug!("{} {}", request.method, request.path);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        let builder = if request.query.is_empty() {
            builder
        } else {
            builder.query(&request.query)
        };
        let builder = match &request.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.map_error(e))?;
        debug!("{} {} -> {}", request.method, request.path, status);

        Ok(ApiResponse { status, body })
    }
}
