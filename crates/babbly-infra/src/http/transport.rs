//! reqwest-backed transport to the API Gateway.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use babbly_core::ports::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

use crate::config::ClientConfig;

/// HTTP transport with a fixed base URL and timeout.
pub struct ReqwestTransport {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid base URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self { base, client })
    }

    fn url_for(&self, request: &HttpRequest) -> Result<Url, TransportError> {
        let mut url = self
            .base
            .join(&request.path)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request)?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        if let Some(token) = &request.bearer {
            builder = builder.header(AUTHORIZATION, token.bearer());
        }
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
