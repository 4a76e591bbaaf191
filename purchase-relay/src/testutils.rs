use crate::transport::{OutboundRequest, OutboundResponse, Transport, TransportError};
use async_trait::async_trait;
use hyper::StatusCode;
use hyper::body::Bytes;
use std::sync::{Arc, Mutex};

/// Records every outbound request and answers with a canned result.
pub struct FakeTransport {
    result: Result<OutboundResponse, String>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl FakeTransport {
    pub fn responding(status: StatusCode, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(OutboundResponse {
                status,
                body: Bytes::from_static(body.as_bytes()),
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Body of the only request sent so far, parsed as JSON.
    pub fn sent_json(&self) -> serde_json::Value {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one outbound request");
        serde_json::from_slice(&requests[0].body).unwrap()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.result.clone().map_err(TransportError::Request)
    }
}
