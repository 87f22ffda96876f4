// Request descriptors: immutable values describing a single API call.
//
// A new descriptor is built for every call (including every polling tick);
// once constructed it's never modified, only read by the executor.

use std::fmt;

use serde_json::Value;

/// HTTP method used by the Meme Market API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Describes one HTTP call against the API origin.
///
/// `endpoint` is the path relative to the configured base URL
/// (e.g. `/predictions/top`). Query parameters are kept separately so the
/// HTTP client can encode them.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    endpoint: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl RequestDescriptor {
    /// A GET request with no query parameters.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    /// A POST request with no body.
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Post, endpoint)
    }

    fn new(method: Method, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.starts_with('/') {
            endpoint
        } else {
            format!("/{endpoint}")
        };
        Self {
            method,
            endpoint,
            query: Vec::new(),
            body: None,
        }
    }

    /// Append a query parameter. Consumes the descriptor under construction.
    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Look up the first query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Full URL for this request against `base_url`, without query string.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.endpoint)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}
