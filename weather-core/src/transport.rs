//! HTTP transport boundary.
//!
//! The orchestrator depends only on the [`Transport`] trait so tests can
//! substitute a scripted double for the real `reqwest` client.

use async_trait::async_trait;
use reqwest::Url;
use std::fmt::Debug;
use std::time::Duration;

/// Transport-level failure, before any HTTP status is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection refused")]
    ConnectionRefused,
    #[error("remote host closed the connection")]
    RemoteHostClosed,
    #[error("host not found")]
    HostNotFound,
    #[error("request timed out")]
    Timeout,
    #[error("TLS handshake failed")]
    TlsHandshake,
    #[error("transport error: {0}")]
    Other(String),
}

/// A completed HTTP exchange. Non-success statuses are replies, not
/// transport errors; classifying them is the caller's job.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

impl TransportReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: Url, timeout: Duration) -> Result<TransportReply, TransportError>;
}

const USER_AGENT: &str = "weather-core/0.1";

/// Production transport backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url, timeout: Duration) -> Result<TransportReply, TransportError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(TransportReply { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }

    if err.is_connect() {
        let text = err.to_string();
        if text.contains("dns") || text.contains("resolve") {
            return TransportError::HostNotFound;
        }
        return TransportError::ConnectionRefused;
    }

    let text = err.to_string();
    if text.contains("tls") || text.contains("certificate") {
        return TransportError::TlsHandshake;
    }

    TransportError::Other(text)
}
