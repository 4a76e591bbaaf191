use crate::errors::RelayError;
use http::HeaderName;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("api_base_url must be an http(s) URL: {0}")]
    InvalidApiBaseUrl(String),

    #[error("api_version cannot be empty")]
    EmptyApiVersion,

    #[error("Path must start with '/': {0}")]
    InvalidPath(String),

    #[error("purchase_path and pixel_path must differ: {0}")]
    DuplicatePath(String),

    #[error("Invalid client IP header name: {0}")]
    InvalidHeaderName(String),
}

/// Purchase relay configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for incoming requests
    pub listener: Listener,
    /// Admin listener for health and readiness checks
    pub admin_listener: Listener,
    /// Path of the purchase relay endpoint
    #[serde(default = "default_purchase_path")]
    pub purchase_path: String,
    /// Path of the browser pixel bootstrap script
    #[serde(default = "default_pixel_path")]
    pub pixel_path: String,
    /// Headers consulted for the client IP, highest priority first
    #[serde(default = "default_client_ip_headers")]
    pub client_ip_headers: Vec<String>,
    /// Largest request body accepted, in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Graph API destination and credentials
    #[serde(default)]
    pub graph: GraphConfig,
}

impl Config {
    /// Validates the relay configuration.
    ///
    /// Missing Graph credentials are not a validation error: requests are
    /// rejected with a 500 until they are provided.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        for path in [&self.purchase_path, &self.pixel_path] {
            if !path.starts_with('/') {
                return Err(ValidationError::InvalidPath(path.clone()));
            }
        }
        if self.purchase_path == self.pixel_path {
            return Err(ValidationError::DuplicatePath(self.pixel_path.clone()));
        }

        self.client_ip_header_names()?;
        self.graph.validate()
    }

    pub fn client_ip_header_names(&self) -> Result<Vec<HeaderName>, ValidationError> {
        self.client_ip_headers
            .iter()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| ValidationError::InvalidHeaderName(name.clone()))
            })
            .collect()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Where conversion events are delivered and how the relay authenticates.
#[derive(Clone, Deserialize, PartialEq)]
pub struct GraphConfig {
    /// Pixel (dataset) the events belong to
    pub pixel_id: Option<String>,
    /// System user access token, sent as a query parameter
    pub access_token: Option<String>,
    /// Routes events to the Events Manager test tab when set
    pub test_event_code: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Url,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.api_base_url.scheme(), "http" | "https")
            || self.api_base_url.cannot_be_a_base()
        {
            return Err(ValidationError::InvalidApiBaseUrl(
                self.api_base_url.to_string(),
            ));
        }
        if self.api_version.trim().is_empty() {
            return Err(ValidationError::EmptyApiVersion);
        }
        Ok(())
    }

    pub fn pixel_id(&self) -> Option<&str> {
        non_empty(&self.pixel_id)
    }

    pub fn test_event_code(&self) -> Option<&str> {
        non_empty(&self.test_event_code)
    }

    /// Returns `(pixel_id, access_token)`, or names whichever is missing.
    pub fn credentials(&self) -> Result<(&str, &str), RelayError> {
        match (self.pixel_id(), non_empty(&self.access_token)) {
            (Some(pixel_id), Some(access_token)) => Ok((pixel_id, access_token)),
            (pixel_id, access_token) => {
                let missing: Vec<&str> = [
                    pixel_id.is_none().then_some("pixel_id"),
                    access_token.is_none().then_some("access_token"),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(RelayError::MissingConfig(missing.join(", ")))
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.credentials().is_ok()
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            pixel_id: None,
            access_token: None,
            test_event_code: None,
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
        }
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("pixel_id", &self.pixel_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("test_event_code", &self.test_event_code)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn default_purchase_path() -> String {
    "/capi-purchase".into()
}

fn default_pixel_path() -> String {
    "/pixel.js".into()
}

fn default_client_ip_headers() -> Vec<String> {
    vec!["x-nf-client-connection-ip".into(), "x-forwarded-for".into()]
}

fn default_max_body_size() -> usize {
    64 * 1024
}

fn default_api_base_url() -> Url {
    Url::parse("https://graph.facebook.com").expect("static URL is valid")
}

fn default_api_version() -> String {
    "v19.0".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            listener: Listener {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 8081,
            },
            purchase_path: default_purchase_path(),
            pixel_path: default_pixel_path(),
            client_ip_headers: default_client_ip_headers(),
            max_body_size: default_max_body_size(),
            graph: GraphConfig {
                pixel_id: Some("1234567890".into()),
                access_token: Some("EAAB-token".into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 8080
admin_listener:
    host: "127.0.0.1"
    port: 8081
graph:
    pixel_id: "1234567890"
    access_token: EAAB-token
    test_event_code: TEST4242
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.purchase_path, "/capi-purchase");
        assert_eq!(config.pixel_path, "/pixel.js");
        assert_eq!(config.max_body_size, 65536);
        assert_eq!(
            config.client_ip_headers,
            vec!["x-nf-client-connection-ip", "x-forwarded-for"]
        );
        assert_eq!(config.graph.api_base_url.as_str(), "https://graph.facebook.com/");
        assert_eq!(config.graph.api_version, "v19.0");
        assert_eq!(config.graph.test_event_code(), Some("TEST4242"));
        assert_eq!(
            config.graph.credentials().unwrap(),
            ("1234567890", "EAAB-token")
        );
    }

    #[test]
    fn test_graph_section_is_optional() {
        let yaml = r#"
listener: {host: "0.0.0.0", port: 8080}
admin_listener: {host: "127.0.0.1", port: 8081}
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.graph.is_complete());
    }

    #[test]
    fn test_credentials() {
        let mut graph = base_config().graph;
        assert!(graph.is_complete());

        graph.access_token = Some(String::new());
        let err = graph.credentials().unwrap_err();
        assert_eq!(err.to_string(), "Missing configuration: access_token");

        graph.pixel_id = None;
        let err = graph.credentials().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing configuration: pixel_id, access_token"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = base_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("EAAB-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = base_config();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base_config();
        config.pixel_path = "pixel.js".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPath(_)
        ));

        let mut config = base_config();
        config.pixel_path = config.purchase_path.clone();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::DuplicatePath(_)
        ));

        let mut config = base_config();
        config.client_ip_headers.push("bad header".into());
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidHeaderName(_)
        ));

        let mut config = base_config();
        config.graph.api_base_url = Url::parse("ftp://graph.example.com").unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidApiBaseUrl(_)
        ));

        let mut config = base_config();
        config.graph.api_version = " ".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyApiVersion
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 8080}
admin_listener: {host: "127.0.0.1", port: 8081}
graph: {api_base_url: "not-a-url"}
"#
            )
            .is_err()
        );

        // Missing required field
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0"}
"#
            )
            .is_err()
        );
    }
}
