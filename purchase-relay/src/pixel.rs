use crate::metrics_defs::PIXEL_REQUESTS;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use shared::counter;

const JAVASCRIPT_UTF8: &str = "application/javascript; charset=utf-8";
const CACHE_FIVE_MINUTES: &str = "public, max-age=300";
const MISSING_PIXEL_SCRIPT: &str = "/* pixel_id missing */";

/// Browser bootstrap script: loads `fbevents.js` and fires a `PageView`
/// for the configured pixel.
pub struct PixelScript {
    script: Option<Bytes>,
}

impl PixelScript {
    pub fn new(pixel_id: Option<&str>) -> Self {
        Self {
            script: pixel_id.map(|id| Bytes::from(render(id))),
        }
    }

    pub fn response(&self) -> Response<Bytes> {
        let (status, body) = match &self.script {
            Some(script) => {
                counter!(PIXEL_REQUESTS, "outcome" => "served").increment(1);
                (StatusCode::OK, script.clone())
            }
            None => {
                counter!(PIXEL_REQUESTS, "outcome" => "missing_config").increment(1);
                tracing::warn!("Pixel script requested but pixel_id is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Bytes::from_static(MISSING_PIXEL_SCRIPT.as_bytes()),
                )
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JAVASCRIPT_UTF8));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_FIVE_MINUTES));
        response
    }
}

fn render(pixel_id: &str) -> String {
    // A JSON string is a valid JS string literal, so the id cannot break out.
    let pixel_id = serde_json::Value::from(pixel_id).to_string();

    format!(
        r#"(function(){{
  var s = document.createElement('script');
  s.src = 'https://connect.facebook.net/en_US/fbevents.js';
  s.async = true;
  s.onload = function(){{
    try{{
      var fbq = window.fbq;
      if (typeof fbq === 'function'){{
        fbq('init', {pixel_id});
        fbq('track', 'PageView');
      }}
    }}catch(e){{}}
  }};
  document.head.appendChild(s);
}})();"#
    )
}
