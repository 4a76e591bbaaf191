use crate::config::GraphConfig;
use crate::errors::RelayError;
use async_trait::async_trait;
use http::HeaderMap;
use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use std::error::Error as _;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum TransportError {
    /// The HTTP client failed to complete the exchange
    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // The URL carries the access token and must not leak into messages.
        let e = e.without_url();
        let mut message = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        TransportError::Request(message)
    }
}

#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// A single outbound HTTP exchange.
///
/// Implementations must resolve to the destination's status and body for any
/// answer the destination gives, and only fail when no answer was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        Ok(OutboundResponse { status, body })
    }
}

/// `<api_base_url>/<api_version>/<pixel_id>/events?access_token=<token>`
pub fn events_url(
    graph: &GraphConfig,
    pixel_id: &str,
    access_token: &str,
) -> Result<Url, RelayError> {
    let mut url = graph.api_base_url.clone();
    url.path_segments_mut()
        .map_err(|_| RelayError::InvalidUpstreamUrl(graph.api_base_url.to_string()))?
        .pop_if_empty()
        .push(&graph.api_version)
        .push(pixel_id)
        .push("events");
    url.query_pairs_mut()
        .clear()
        .append_pair("access_token", access_token);

    Ok(url)
}
