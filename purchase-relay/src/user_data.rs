//! Customer information parameters (`user_data`) of a conversion event.
//!
//! Email and phone are normalized and SHA-256 hashed before they leave the
//! relay. The browser identifiers and network metadata are sent as-is.
//!
//! Hashing is gated on the truthiness of the value the client sent, not on
//! the normalized result. The two paths differ on purpose:
//!
//! - email: a whitespace-only address is truthy, so the empty string is hashed
//! - phone: an input without any digit is dropped after normalization

use crate::client_info::ClientInfo;
use crate::payload::PurchasePayload;
use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_agent: Option<String>,
}

impl UserData {
    pub fn builder() -> UserDataBuilder {
        UserDataBuilder::default()
    }

    pub fn from_payload(payload: &PurchasePayload, client: ClientInfo) -> Self {
        Self::builder()
            .email(payload.email.as_ref())
            .phone(payload.phone.as_ref())
            .fbp(payload.fbp.as_ref())
            .fbc(payload.fbc.as_ref())
            .client(client)
            .build()
    }
}

/// Collects user data fields, keeping only the ones that are present.
#[derive(Default)]
pub struct UserDataBuilder {
    inner: UserData,
}

impl UserDataBuilder {
    pub fn email(mut self, email: Option<&Value>) -> Self {
        self.inner.em = hashed_email(email);
        self
    }

    pub fn phone(mut self, phone: Option<&Value>) -> Self {
        self.inner.ph = hashed_phone(phone);
        self
    }

    pub fn fbp(mut self, fbp: Option<&Value>) -> Self {
        self.inner.fbp = fbp.filter(|v| is_truthy(v)).cloned();
        self
    }

    pub fn fbc(mut self, fbc: Option<&Value>) -> Self {
        self.inner.fbc = fbc.filter(|v| is_truthy(v)).cloned();
        self
    }

    pub fn client(mut self, client: ClientInfo) -> Self {
        self.inner.client_ip_address = client.ip_address.filter(|ip| !ip.is_empty());
        self.inner.client_user_agent = client.user_agent.filter(|ua| !ua.is_empty());
        self
    }

    pub fn build(self) -> UserData {
        self.inner
    }
}

/// Lowercase hex SHA-256 of the UTF-8 bytes of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loose truthiness used to decide whether a client field was sent at all.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn normalize_email(email: &Value) -> Option<String> {
    scalar_text(email).map(|e| e.trim().to_lowercase())
}

/// Keeps ASCII digits only. No digits means no phone number.
pub fn normalize_phone(phone: &Value) -> Option<String> {
    let digits: String = scalar_text(phone)?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    (!digits.is_empty()).then_some(digits)
}

pub fn hashed_email(email: Option<&Value>) -> Option<String> {
    email
        .filter(|e| is_truthy(e))
        .and_then(normalize_email)
        .map(|e| sha256_hex(&e))
}

pub fn hashed_phone(phone: Option<&Value>) -> Option<String> {
    phone
        .filter(|p| is_truthy(p))
        .and_then(normalize_phone)
        .map(|p| sha256_hex(&p))
}

// Arrays and objects are not identifiers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Browser number formatting: whole floats lose the `.0` and large or tiny
/// magnitudes use a signed exponent (`1e+21`, `1.5e-7`).
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => float_text(f),
        _ => n.to_string(),
    }
}

fn float_text(f: f64) -> String {
    if f == 0.0 {
        return "0".into();
    }
    if (1e-6..1e21).contains(&f.abs()) {
        // f64 Display is the shortest round-trip form and never an exponent.
        return f.to_string();
    }
    let text = format!("{f:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}
