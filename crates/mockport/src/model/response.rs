//! Mock response definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a mock response participates in selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    #[default]
    Enabled,
    Disabled,
}

/// A single response header. Duplicate names are allowed and emitted in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Encoding applied to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentEncoding {
    Gzip,
    Deflate,
    Base64,
    Identity,
}

impl ContentEncoding {
    /// Token advertised in the `Content-Encoding` header, if this is an HTTP coding.
    pub fn http_token(&self) -> Option<&'static str> {
        match self {
            ContentEncoding::Gzip => Some("gzip"),
            ContentEncoding::Deflate => Some("deflate"),
            ContentEncoding::Base64 | ContentEncoding::Identity => None,
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentEncoding::Gzip => "GZIP",
            ContentEncoding::Deflate => "DEFLATE",
            ContentEncoding::Base64 => "BASE64",
            ContentEncoding::Identity => "IDENTITY",
        };
        f.write_str(name)
    }
}

/// XPath expression that must evaluate to `value` against the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPathExpression {
    pub expression: String,
    pub value: String,
}

/// JSON path expression whose first match must equal `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonPathExpression {
    pub expression: String,
    pub value: String,
}

/// A stored candidate reply of one operation or method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockResponse {
    pub id: String,
    /// Owning operation or method; fixed at creation.
    pub operation_id: String,
    pub name: String,
    pub status: ResponseStatus,
    pub http_status_code: Option<u16>,
    pub body: String,
    pub headers: Vec<HttpHeader>,
    pub content_encodings: Vec<ContentEncoding>,
    /// Whether `${...}` expressions in the body are expanded.
    pub using_expressions: bool,
    pub xpath_expressions: Vec<XPathExpression>,
    pub json_path_expressions: Vec<JsonPathExpression>,
}

impl MockResponse {
    pub fn is_enabled(&self) -> bool {
        self.status == ResponseStatus::Enabled
    }

    pub fn status_code(&self) -> u16 {
        self.http_status_code.unwrap_or(200)
    }
}
