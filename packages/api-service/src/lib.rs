//! Typed request builders for HTTP APIs.
//!
//! An [`ApiServiceFactory`] holds a base URL and shared [`ServiceOptions`].
//! Each [`ApiService`] it creates points at one resource and knows how to
//! encode bodies, classify responses and report results through the
//! configured hooks. The actual I/O is done by an [`HttpClient`]
//! implementation, such as `api-service-reqwest`.
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;

pub mod body;
mod factory;
pub mod options;
mod service;
pub mod status;
pub mod url;

pub use body::{DataTypes, RequestBody, RequestDataType, ResponseBody, ResponseDataType};
pub use factory::ApiServiceFactory;
pub use options::{RequestOptions, ServiceOptions};
pub use service::{
    ApiService, DeleteEndpoint, GetEndpoint, PostEndpoint, PutEndpoint, Untyped, WithHeaders,
};
pub use status::StatusClass;

/// The errors that can happen during a request.
///
/// Note; This may contain sensitive information such as URLs or parameter
/// values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Couldn't encode query parameters: {0}")]
    EncodeParams(String),
    #[error("Couldn't encode request body: {0}")]
    EncodeBody(String),
    #[error("Couldn't send request: {0}")]
    Send(String),
    #[error("Couldn't receive response: {0}")]
    Receive(String),
    #[error("Client error: {0}")]
    Client(u16),
    #[error("Server error: {0}")]
    Server(u16),
    #[error("Errors in response body: {}", .0.join("; "))]
    ResponseErrors(Vec<String>),
    #[error("Couldn't parse response fetched from {url}: {reason}")]
    ParseResponse { url: String, reason: String },
    #[error("Couldn't deserialize result: {0}")]
    DeserializeResult(String),
}

impl Error {
    pub fn send(e: impl Display) -> Self {
        Self::Send(e.to_string())
    }

    pub fn receive(e: impl Display) -> Self {
        Self::Receive(e.to_string())
    }

    pub fn deserialize_result(e: impl Display) -> Self {
        Self::DeserializeResult(e.to_string())
    }

    pub(crate) fn encode_params(e: impl Display) -> Self {
        Self::EncodeParams(e.to_string())
    }

    pub(crate) fn encode_body(e: impl Display) -> Self {
        Self::EncodeBody(e.to_string())
    }
}

/// Sends a fully built [`Request`] and reads the whole response.
///
/// Implementations should only fail for transport problems. Status codes are
/// classified by [`ApiService`], so any response that arrives must be returned
/// as `Ok`.
#[async_trait(?Send)]
pub trait HttpClient: Clone {
    async fn send(&self, request: Request) -> Result<Response, Error>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a body.
    pub fn has_body(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone)]
pub enum MimeType {
    Json,
    FormData,
}

impl MimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormData => "multipart/form-data",
        }
    }
}

pub const CONTENT_TYPE: &str = "content-type";

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Look up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }
}

fn find_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
