//! Server-side purchase relay.
//!
//! `POST` a purchase from the storefront, get the Graph API answer back:
//!
//! 1. reject the request if the pixel id or access token is not configured
//! 2. reject anything but `POST`
//! 3. parse the JSON body (empty body = empty purchase)
//! 4. hash email/phone, collect browser ids and client network metadata
//! 5. send one `Purchase` event to `/<version>/<pixel_id>/events`
//! 6. relay the Graph API status and body unchanged
//!
//! Errors raised by the relay become plain-text responses. Errors reported
//! by the Graph API are not relay errors and reach the caller verbatim.

use crate::client_info::ClientInfo;
use crate::config::GraphConfig;
use crate::errors::{RelayError, Result};
use crate::event::{Envelope, EventRecord, unix_now};
use crate::metrics_defs::{RELAY_REQUESTS, UPSTREAM_DURATION};
use crate::payload::PurchasePayload;
use crate::transport::{OutboundRequest, OutboundResponse, Transport, events_url};
use crate::user_data::UserData;
use http::HeaderMap;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

pub struct PurchaseRelay {
    graph: GraphConfig,
    client_ip_headers: Vec<HeaderName>,
    transport: Arc<dyn Transport>,
}

impl PurchaseRelay {
    pub fn new(
        graph: GraphConfig,
        client_ip_headers: Vec<HeaderName>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            graph,
            client_ip_headers,
            transport,
        }
    }

    /// Ready once the Graph credentials are configured.
    pub fn is_ready(&self) -> bool {
        self.graph.is_complete()
    }

    /// Handles one purchase request. Always produces exactly one response.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        match self.forward(request).await {
            Ok(response) => {
                counter!(RELAY_REQUESTS, "outcome" => "forwarded").increment(1);
                response
            }
            Err(e) => {
                counter!(RELAY_REQUESTS, "outcome" => e.outcome()).increment(1);
                match &e {
                    RelayError::MethodNotAllowed(_)
                    | RelayError::InvalidPayload(_)
                    | RelayError::RequestBody(_) => {
                        tracing::debug!(error = %e, "Rejected purchase request")
                    }
                    _ => tracing::error!(error = %e, "Failed to relay purchase event"),
                }
                e.into_response()
            }
        }
    }

    async fn forward(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let (pixel_id, access_token) = self.graph.credentials()?;

        if request.method() != Method::POST {
            return Err(RelayError::MethodNotAllowed(request.method().clone()));
        }

        let (parts, body) = request.into_parts();
        let payload = PurchasePayload::from_body(&body)?;
        let client = ClientInfo::from_headers(&parts.headers, &self.client_ip_headers);
        let envelope = build_envelope(payload, client, self.graph.test_event_code(), unix_now());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let outbound = OutboundRequest {
            method: Method::POST,
            url: events_url(&self.graph, pixel_id, access_token)?,
            headers,
            body: serde_json::to_vec(&envelope)?.into(),
        };

        let start = Instant::now();
        let response = self.transport.send(outbound).await?;
        histogram!(UPSTREAM_DURATION, "status" => response.status.as_str().to_owned())
            .record(start.elapsed().as_secs_f64());

        if !response.status.is_success() {
            tracing::warn!(status = %response.status, "Graph API did not accept the event");
        }

        Ok(passthrough(response))
    }
}

/// Assembles the outbound body for one purchase.
pub fn build_envelope(
    payload: PurchasePayload,
    client: ClientInfo,
    test_event_code: Option<&str>,
    event_time: u64,
) -> Envelope {
    let user_data = UserData::from_payload(&payload, client);
    let event = EventRecord::purchase(payload, user_data, event_time);
    Envelope::new(event, test_event_code)
}

fn passthrough(upstream: OutboundResponse) -> Response<Bytes> {
    let mut response = Response::new(upstream.body);
    *response.status_mut() = upstream.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
    response
}
