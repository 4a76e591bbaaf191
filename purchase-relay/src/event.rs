//! Conversions API event payload.
//!
//! Example body sent to `/<version>/<pixel_id>/events`:
//!
//! ```json
//! {
//!   "data": [{
//!     "event_name": "Purchase",
//!     "event_time": 1700000000,
//!     "event_id": "order-1001",
//!     "event_source_url": "https://shop.example.com/checkout",
//!     "action_source": "website",
//!     "user_data": {"em": "973dfe46...", "client_ip_address": "1.2.3.4"},
//!     "custom_data": {"value": 49.9, "currency": "EUR"}
//!   }],
//!   "test_event_code": "TEST4242"
//! }
//! ```

use crate::payload::PurchasePayload;
use crate::user_data::UserData;
use serde::Serialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

pub const PURCHASE_EVENT_NAME: &str = "Purchase";
pub const WEBSITE_ACTION_SOURCE: &str = "website";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub event_name: &'static str,
    pub event_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<Value>,
    pub action_source: &'static str,
    pub user_data: UserData,
    pub custom_data: CustomData,
}

impl EventRecord {
    pub fn purchase(payload: PurchasePayload, user_data: UserData, event_time: u64) -> Self {
        Self {
            event_name: PURCHASE_EVENT_NAME,
            event_time,
            event_id: payload.event_id,
            event_source_url: payload.event_source_url,
            action_source: WEBSITE_ACTION_SOURCE,
            user_data,
            custom_data: CustomData {
                value: payload.value,
                currency: payload.currency,
                content_ids: payload.content_ids,
                contents: payload.contents,
            },
        }
    }
}

/// Purchase details, copied from the client without interpretation.
///
/// An explicit JSON `null` from the client is treated like a missing field
/// and left out, rather than forwarded as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CustomData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_ids: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    pub data: [EventRecord; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_event_code: Option<String>,
}

impl Envelope {
    pub fn new(event: EventRecord, test_event_code: Option<&str>) -> Self {
        Self {
            data: [event],
            test_event_code: test_event_code
                .filter(|code| !code.is_empty())
                .map(String::from),
        }
    }
}

/// Current time in whole seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_info::ClientInfo;
    use serde_json::json;

    fn payload() -> PurchasePayload {
        PurchasePayload::from_value(json!({
            "event_id": "order-1001",
            "value": 49.9,
            "currency": "EUR",
            "email": "shopper@example.com",
            "content_ids": ["sku-1", "sku-2"],
            "contents": [{"id": "sku-1", "quantity": 2, "item_price": 12.5}],
            "event_source_url": "https://shop.example.com/checkout"
        }))
        .unwrap()
    }

    #[test]
    fn test_purchase_event() {
        let payload = payload();
        let user_data = UserData::from_payload(&payload, ClientInfo::default());
        let event = EventRecord::purchase(payload, user_data, 1_700_000_000);

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event_name": "Purchase",
                "event_time": 1_700_000_000,
                "event_id": "order-1001",
                "event_source_url": "https://shop.example.com/checkout",
                "action_source": "website",
                "user_data": {
                    "em": crate::user_data::sha256_hex("shopper@example.com")
                },
                "custom_data": {
                    "value": 49.9,
                    "currency": "EUR",
                    "content_ids": ["sku-1", "sku-2"],
                    "contents": [{"id": "sku-1", "quantity": 2, "item_price": 12.5}]
                }
            })
        );
    }

    #[test]
    fn test_custom_data_is_verbatim() {
        let inbound = payload();
        let event = EventRecord::purchase(inbound.clone(), UserData::default(), 0);

        assert_eq!(event.custom_data.value, inbound.value);
        assert_eq!(event.custom_data.currency, inbound.currency);
        assert_eq!(event.custom_data.content_ids, inbound.content_ids);
        assert_eq!(event.custom_data.contents, inbound.contents);
    }

    #[test]
    fn test_empty_payload_event() {
        let event = EventRecord::purchase(PurchasePayload::default(), UserData::default(), 42);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event_name": "Purchase",
                "event_time": 42,
                "action_source": "website",
                "user_data": {},
                "custom_data": {}
            })
        );
    }

    #[test]
    fn test_envelope_test_event_code() {
        let event = EventRecord::purchase(PurchasePayload::default(), UserData::default(), 42);

        let envelope = serde_json::to_value(Envelope::new(event.clone(), None)).unwrap();
        assert_eq!(envelope["data"].as_array().unwrap().len(), 1);
        assert!(envelope.get("test_event_code").is_none());

        let envelope = serde_json::to_value(Envelope::new(event.clone(), Some(""))).unwrap();
        assert!(envelope.get("test_event_code").is_none());

        let envelope = serde_json::to_value(Envelope::new(event, Some("TEST4242"))).unwrap();
        assert_eq!(envelope["test_event_code"], "TEST4242");
    }

    #[test]
    fn test_unix_now_is_seconds() {
        let now = unix_now();
        // Well after 2023-11-14 and not in milliseconds.
        assert!(now > 1_700_000_000);
        assert!(now < 100_000_000_000);
    }
}
