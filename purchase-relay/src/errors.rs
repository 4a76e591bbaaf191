use crate::config::ValidationError;
use crate::transport::TransportError;
use http::header::{ALLOW, HeaderValue};
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use shared::http::text_response;
use thiserror::Error;

/// Result type alias for purchase-relay operations
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Errors raised by the relay itself.
///
/// A non-2xx answer from the Graph API is not an error: it is passed through
/// to the caller unchanged.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed(Method),

    #[error("Invalid JSON: {0}")]
    InvalidPayload(String),

    #[error("Error sending to Graph API: {0}")]
    Delivery(#[from] TransportError),

    #[error("Invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::InvalidPayload(_) | RelayError::RequestBody(_) => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::MissingConfig(_)
            | RelayError::Delivery(_)
            | RelayError::InvalidUpstreamUrl(_)
            | RelayError::Serialization(_)
            | RelayError::InvalidConfig(_)
            | RelayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Tag value used for the `outcome` label of the request counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::MissingConfig(_) => "missing_config",
            RelayError::MethodNotAllowed(_) => "method_not_allowed",
            RelayError::InvalidPayload(_) | RelayError::RequestBody(_) => "invalid_payload",
            RelayError::PayloadTooLarge(_) => "payload_too_large",
            RelayError::Delivery(_) => "delivery_failed",
            RelayError::InvalidUpstreamUrl(_) => "invalid_upstream_url",
            RelayError::Serialization(_) => "serialization",
            RelayError::InvalidConfig(_) => "invalid_config",
            RelayError::Io(_) => "io",
        }
    }

    /// Plain-text response for this error. Adds `Allow: POST` on 405.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = text_response(self.status(), self.to_string());
        if let RelayError::MethodNotAllowed(_) = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}
