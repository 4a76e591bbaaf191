use crate::errors::RelayError;
use crate::pixel::PixelScript;
use crate::relay::PurchaseRelay;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use shared::http::{into_boxed, make_error_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Public listener: routes by path to the purchase relay or the pixel script.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<Inner>,
}

struct Inner {
    relay: Arc<PurchaseRelay>,
    pixel: PixelScript,
    purchase_path: String,
    pixel_path: String,
    max_body_size: usize,
}

enum Route {
    Purchase,
    Pixel,
}

impl RelayService {
    pub fn new(
        relay: Arc<PurchaseRelay>,
        pixel: PixelScript,
        purchase_path: impl Into<String>,
        pixel_path: impl Into<String>,
        max_body_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                relay,
                pixel,
                purchase_path: purchase_path.into(),
                pixel_path: pixel_path.into(),
                max_body_size,
            }),
        }
    }

    fn route<B>(&self, request: &Request<B>) -> Option<Route> {
        let path = request.uri().path();
        if path == self.inner.purchase_path {
            Some(Route::Purchase)
        } else if path == self.inner.pixel_path {
            Some(Route::Pixel)
        } else {
            None
        }
    }

    /// Handles a request whose body has already been collected.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<Bytes> {
        match self.route(&request) {
            Some(Route::Purchase) => self.inner.relay.handle(request).await,
            Some(Route::Pixel) => self.inner.pixel.response(),
            None => {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    "No route matched"
                );
                make_error_response(StatusCode::NOT_FOUND)
            }
        }
    }
}

impl Service<Request<Incoming>> for RelayService {
    type Response = Response<BoxBody<Bytes, RelayError>>;
    type Error = RelayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let response = match read_body(body, service.inner.max_body_size).await {
                Ok(bytes) => service.dispatch(Request::from_parts(parts, bytes)).await,
                Err(e) => {
                    tracing::debug!(error = %e, "Could not read request body");
                    e.into_response()
                }
            };
            Ok(into_boxed(response))
        })
    }
}

/// Buffers a request body of at most `limit` bytes.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, RelayError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(RelayError::PayloadTooLarge(limit)),
        Err(e) => Err(RelayError::RequestBody(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::testutils::FakeTransport;
    use http::header::CONTENT_TYPE;
    use http_body_util::Full;
    use hyper::Method;

    fn service(transport: Arc<FakeTransport>) -> RelayService {
        let graph = GraphConfig {
            pixel_id: Some("1234567890".into()),
            access_token: Some("EAAB-token".into()),
            ..Default::default()
        };
        let pixel = PixelScript::new(graph.pixel_id());
        let relay = PurchaseRelay::new(graph, Vec::new(), transport);
        RelayService::new(
            Arc::new(relay),
            pixel,
            "/capi-purchase",
            "/pixel.js",
            1024,
        )
    }

    fn request(method: Method, path: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_purchase_route() {
        let transport = FakeTransport::responding(StatusCode::OK, r#"{"events_received":1}"#);
        let service = service(transport.clone());

        let response = service
            .dispatch(request(Method::POST, "/capi-purchase", r#"{"value": 5}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), br#"{"events_received":1}"#);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_purchase_route_ignores_query() {
        let transport = FakeTransport::responding(StatusCode::OK, "{}");
        let service = service(transport.clone());

        let response = service
            .dispatch(request(Method::POST, "/capi-purchase?utm_source=x", "{}"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_pixel_route() {
        let transport = FakeTransport::responding(StatusCode::OK, "{}");
        let service = service(transport.clone());

        let response = service.dispatch(request(Method::GET, "/pixel.js", "")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/javascript; charset=utf-8"
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let transport = FakeTransport::responding(StatusCode::OK, "{}");
        let service = service(transport.clone());

        let response = service
            .dispatch(request(Method::POST, "/capi-purchase/extra", "{}"))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), b"Not Found");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = Full::new(Bytes::from_static(br#"{"value": 5}"#));
        let bytes = read_body(body, 12).await.unwrap();
        assert_eq!(bytes.as_ref(), br#"{"value": 5}"#);
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let body = Full::new(Bytes::from(vec![b' '; 1025]));
        let err = read_body(body, 1024).await.unwrap_err();
        assert!(matches!(err, RelayError::PayloadTooLarge(1024)));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
