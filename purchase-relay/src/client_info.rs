// Network metadata about the shopper, derived from the inbound request headers.
// The relay usually sits behind a CDN or load balancer, so the socket peer is
// not the client: the edge reports the original address in a header.

use http::HeaderMap;
use http::header::{HeaderName, USER_AGENT};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// `ip_headers` is consulted in order; the first header with a non-empty
    /// value wins. For a forwarded-for chain only the first hop is kept.
    pub fn from_headers(headers: &HeaderMap, ip_headers: &[HeaderName]) -> Self {
        let ip_address = ip_headers
            .iter()
            .find_map(|name| header_str(headers, name))
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(String::from);

        let user_agent = header_str(headers, &USER_AGENT).map(String::from);

        Self {
            ip_address,
            user_agent,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
