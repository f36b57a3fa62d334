//! HTTP transport seam
//!
//! Services build an [`ApiRequest`] and hand it to a [`Transport`]. Only
//! failures to obtain a response are errors at this layer; every HTTP
//! status comes back as an [`ApiResponse`] for the caller to judge.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::fmt;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// HTTP method used by the console backend
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

/// A file sent as one part of a `multipart/form-data` body
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new<F, N>(field: F, file_name: N, bytes: Vec<u8>) -> Self
    where
        F: Into<String>,
        N: Into<String>,
    {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// An outgoing request
///
/// At most one of `body` (JSON) and `file` (multipart) is set.
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub file: Option<FilePart>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    /// A GET request without parameters
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            query: Vec::new(),
            body: None,
            file: None,
            bearer: None,
        }
    }

    /// A POST request with a JSON body
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::Post,
            url,
            query: Vec::new(),
            body: Some(body),
            file: None,
            bearer: None,
        }
    }

    /// A POST request carrying one file as `multipart/form-data`
    pub fn upload(url: Url, file: FilePart) -> Self {
        Self {
            method: Method::Post,
            url,
            query: Vec::new(),
            body: None,
            file: Some(file),
            bearer: None,
        }
    }

    /// Append query parameters
    pub fn with_query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a bearer token; empty tokens are ignored
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token.filter(|t| !t.is_empty());
        self
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bodies may carry credentials
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("query", &self.query)
            .field("body", &self.body.as_ref().map(|_| "[REDACTED]"))
            .field("file", &self.file)
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Status and decoded body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Exactly 200, the only status collection and item reads accept
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Any 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a raw body: empty is `null`, non-JSON text is kept as a string
    pub fn decode_body(bytes: &[u8]) -> Value {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Sends requests to the backend
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send the request and return whatever the server answered
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// Transport backed by a reqwest client
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client honoring the configured timeout and user agent
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(file) = &request.file {
            // Sets its own multipart Content-Type over the client's JSON default
            let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            builder = builder.multipart(Form::new().part(file.field.clone(), part));
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        tracing::debug!(method = %request.method, url = %request.url, status, "backend responded");
        Ok(ApiResponse::new(status, ApiResponse::decode_body(&bytes)))
    }
}
