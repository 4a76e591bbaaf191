//! Inbound purchase payload posted by the storefront.
//!
//! Every field is optional. Values are kept as raw JSON so that the
//! custom-data fields reach the Graph API exactly as the client sent them.

use crate::errors::RelayError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PurchasePayload {
    /// Client-supplied deduplication key, shared with the browser pixel event
    pub event_id: Option<Value>,
    pub value: Option<Value>,
    pub currency: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    /// `_fbp` browser cookie
    pub fbp: Option<Value>,
    /// `_fbc` click-id cookie
    pub fbc: Option<Value>,
    pub content_ids: Option<Value>,
    pub contents: Option<Value>,
    pub event_source_url: Option<Value>,
}

impl PurchasePayload {
    /// Parses a request body.
    ///
    /// An empty body is an empty payload. A body of only whitespace is not
    /// JSON and is rejected. Valid JSON that is not an object carries no
    /// fields and is treated as an empty payload.
    pub fn from_body(body: &[u8]) -> Result<Self, RelayError> {
        if body.is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RelayError::InvalidPayload(e.to_string()))?;

        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RelayError> {
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| RelayError::InvalidPayload(e.to_string())),
            _ => Ok(Self::default()),
        }
    }
}
