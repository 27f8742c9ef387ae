use http::{HeaderName, Method};
use serde::Deserialize;
use std::{str::FromStr, time::Duration};

/// Configuration for Cross-Origin Resource Sharing (CORS).
///
/// CORS controls which web origins can call the API from a browser. When
/// `allowed_origins` is configured, only listed origins are reflected into
/// CORS response headers; everything else gets no CORS headers at all.
///
/// # Examples
///
/// In TOML configuration:
/// ```toml
/// [http.cors]
/// allowed_origins = ["https://app.example.com", "https://admin.example.com"]
/// allowed_methods = ["GET", "POST", "OPTIONS"]
/// allowed_headers = ["content-type", "x-request-id"]
/// max_age = "1h"
/// ```
///
/// The allow-list may also be a single comma-separated string, which is what
/// makes environment substitution work:
/// ```toml
/// [http.cors]
/// allowed_origins = "{{ CORS_ALLOWED_ORIGINS }}"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HttpCorsConfig {
    /// Whether to allow credentials (cookies, authorization headers) in CORS
    /// requests. When true, explicit origins must be configured.
    pub allow_credentials: Option<bool>,

    /// Origins allowed to make CORS requests, as a list or a comma-separated
    /// string. If not specified, behavior depends on the environment (see
    /// `setup_cors`).
    pub allowed_origins: Option<OriginList>,

    /// HTTP methods allowed in CORS requests.
    pub allowed_methods: Option<Vec<CorsMethod>>,

    /// Headers allowed in CORS requests.
    pub allowed_headers: Option<Vec<CorsHeader>>,

    /// Response headers exposed to browser JavaScript, e.g. the
    /// `x-ratelimit-*` trio.
    pub exposed_headers: Option<Vec<CorsHeader>>,

    /// How long browsers may cache CORS preflight responses.
    #[serde(default, with = "humantime_serde")]
    pub max_age: Option<Duration>,
}

impl HttpCorsConfig {
    /// Enables credentials in CORS requests.
    pub fn with_allow_credentials(mut self) -> Self {
        self.allow_credentials = Some(true);
        self
    }

    /// Sets the list of origins allowed to make CORS requests.
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Some(OriginList::List(origins));
        self
    }

    /// Sets the HTTP methods allowed in CORS requests.
    pub fn with_allowed_methods(mut self, methods: Vec<CorsMethod>) -> Self {
        self.allowed_methods = Some(methods);
        self
    }

    /// Sets the headers allowed in CORS requests.
    pub fn with_allowed_headers(mut self, headers: Vec<CorsHeader>) -> Self {
        self.allowed_headers = Some(headers);
        self
    }

    /// Sets the headers exposed to the browser in CORS responses.
    pub fn with_exposed_headers(mut self, headers: Vec<CorsHeader>) -> Self {
        self.exposed_headers = Some(headers);
        self
    }

    /// Sets the preflight cache lifetime.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// The normalized allow-list: trimmed, empty entries dropped.
    ///
    /// `None` means "not configured", which is distinct from an empty list
    /// (configured but allowing nothing, e.g. a missing env var substituted
    /// to an empty string).
    pub fn origins(&self) -> Option<Vec<String>> {
        self.allowed_origins.as_ref().map(OriginList::normalized)
    }
}

/// An origin allow-list, deserializable from either a TOML array or a single
/// comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OriginList {
    List(Vec<String>),
    CommaSeparated(String),
}

impl OriginList {
    /// Flattens into a trimmed list with empty entries removed.
    pub fn normalized(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            OriginList::List(items) => items.iter().map(String::as_str).collect(),
            OriginList::CommaSeparated(joined) => joined.split(',').collect(),
        };
        raw.iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Wrapper type for HTTP methods in CORS configuration, deserializable from
/// strings like `"GET"`.
#[derive(Debug, Clone)]
pub struct CorsMethod(pub Method);

impl<'de> Deserialize<'de> for CorsMethod {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let method = Method::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(CorsMethod(method))
    }
}

/// Wrapper type for HTTP header names in CORS configuration, deserializable
/// from strings like `"content-type"`.
#[derive(Debug, Clone)]
pub struct CorsHeader(pub HeaderName);

impl<'de> Deserialize<'de> for CorsHeader {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let header = HeaderName::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(CorsHeader(header))
    }
}
