//! Request and response types for intercepted fetches.

use hashbrown::HashMap;
use url::Url;

/// An intercepted request (method + URL + headers).
///
/// Header names are normalized to lowercase on insertion so lookups are
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request URL.
    pub url: Url,

    /// Request method (uppercase).
    pub method: String,

    /// Request headers.
    pub headers: HashMap<String, String>,
}

impl FetchRequest {
    /// Create a request with the given method.
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            url,
            method: method.to_ascii_uppercase(),
            headers: HashMap::new(),
        }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Add a header (builder style).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Check if this is a GET request.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Check if this request is an HTML navigation, based on the Accept
    /// header.
    pub fn is_navigation(&self) -> bool {
        self.header("accept")
            .map(|accept| accept.contains("text/html"))
            .unwrap_or(false)
    }
}

/// A response produced by the controller (from network or cache).
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Status code.
    pub status: u16,

    /// Status text.
    pub status_text: String,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Vec<u8>,

    /// Whether this response was served from cache.
    pub from_cache: bool,
}

impl FetchResponse {
    /// Create a 200 OK response with the given body.
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            headers: HashMap::new(),
            body,
            from_cache: false,
        }
    }

    /// Check if the status is success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get body as text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }
}
