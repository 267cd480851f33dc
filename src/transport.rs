//! HTTP transport seam.
//!
//! The scanner only needs "send this query, give me the body". [`Transport`]
//! is the trait it talks to; [`HttpTransport`] is the reqwest-backed
//! implementation used by the CLI.

use crate::config::HttpConfig;
use crate::{Result, ScanError};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `query` to `url` (which carries no query string of its own).
    ///
    /// Implementations report non-2xx responses as [`TransportError::Status`].
    async fn send(
        &self,
        method: HttpMethod,
        url: &Url,
        query: &[(String, String)],
    ) -> std::result::Result<TransportResponse, TransportError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.custom_headers {
            let name = HeaderName::from_str(name)
                .map_err(|e| ScanError::InvalidInput(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ScanError::InvalidInput(format!("Invalid header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(config.max_redirects as usize)
            } else {
                reqwest::redirect::Policy::none()
            })
            .user_agent(&config.user_agent)
            .default_headers(headers);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &Url,
        query: &[(String, String)],
    ) -> std::result::Result<TransportResponse, TransportError> {
        let request = match method {
            HttpMethod::Get => self.client.get(url.clone()).query(query),
            HttpMethod::Post => self.client.post(url.clone()).form(query),
        };

        let response = request.send().await?;
        let status = response.status();
        debug!("{} {} -> {}", method, url, status.as_u16());

        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}
