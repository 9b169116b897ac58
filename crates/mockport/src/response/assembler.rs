//! Builds the outbound response from a selected mock response.

use super::encoding::{encode_all, EncodingError};
use super::template::{render, ExpressionContext};
use crate::error::EngineError;
use crate::model::{ContentEncoding, MockResponse};
use bytes::Bytes;
use serde::Serialize;

/// Transport-independent response produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundResponse {
    pub status: u16,
    /// Headers in emission order; duplicate names are kept.
    pub headers: Vec<(String, String)>,
    #[serde(skip)]
    pub body: Bytes,
    pub applied_encodings: Vec<ContentEncoding>,
}

impl OutboundResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            applied_encodings: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// All values of a header, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl From<EncodingError> for EngineError {
    fn from(e: EncodingError) -> Self {
        EngineError::EncodingFailure {
            encoding: e.encoding.to_string(),
            reason: e.source.to_string(),
        }
    }
}

/// Assemble status, headers and encoded body of `response`.
///
/// A `Content-Encoding` header listing the applied HTTP codings is appended
/// unless the response already configures one.
pub fn assemble(
    response: &MockResponse,
    context: &ExpressionContext<'_>,
) -> Result<OutboundResponse, EngineError> {
    let body = if response.using_expressions {
        render(&response.body, context)
    } else {
        response.body.clone()
    };
    let encoded = encode_all(&response.content_encodings, body.as_bytes())?;

    let mut headers: Vec<(String, String)> = response
        .headers
        .iter()
        .map(|h| (h.name.clone(), h.value.clone()))
        .collect();

    let tokens: Vec<&str> = response
        .content_encodings
        .iter()
        .filter_map(ContentEncoding::http_token)
        .collect();
    let has_content_encoding = headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-encoding"));
    if !tokens.is_empty() && !has_content_encoding {
        headers.push(("Content-Encoding".to_string(), tokens.join(", ")));
    }

    Ok(OutboundResponse {
        status: response.status_code(),
        headers,
        body: Bytes::from(encoded),
        applied_encodings: response.content_encodings.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpHeader;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_to_200_and_keeps_duplicate_headers() {
        let response = MockResponse {
            id: "r".to_string(),
            body: "<ok/>".to_string(),
            headers: vec![
                HttpHeader::new("Set-Cookie", "a=1"),
                HttpHeader::new("Set-Cookie", "b=2"),
                HttpHeader::new("Content-Type", "text/xml"),
            ],
            ..Default::default()
        };
        let out = assemble(&response, &ExpressionContext::default()).unwrap();
        assert_eq!(out.status, 200);
        assert_eq!(out.body, Bytes::from("<ok/>"));
        assert_eq!(
            out.header_values("set-cookie").collect::<Vec<_>>(),
            vec!["a=1", "b=2"]
        );
        assert_eq!(out.headers[2].0, "Content-Type");
        assert!(out.applied_encodings.is_empty());
    }

    #[test]
    fn test_encodings_advertise_http_tokens() {
        let response = MockResponse {
            http_status_code: Some(201),
            body: "payload".to_string(),
            content_encodings: vec![ContentEncoding::Base64, ContentEncoding::Gzip],
            ..Default::default()
        };
        let out = assemble(&response, &ExpressionContext::default()).unwrap();
        assert_eq!(out.status, 201);
        assert_eq!(
            out.header_values("Content-Encoding").collect::<Vec<_>>(),
            vec!["gzip"]
        );
        assert_eq!(
            out.applied_encodings,
            vec![ContentEncoding::Base64, ContentEncoding::Gzip]
        );
        assert_eq!(&out.body[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_configured_content_encoding_header_wins() {
        let response = MockResponse {
            headers: vec![HttpHeader::new("content-encoding", "x-custom")],
            content_encodings: vec![ContentEncoding::Deflate],
            ..Default::default()
        };
        let out = assemble(&response, &ExpressionContext::default()).unwrap();
        assert_eq!(
            out.header_values("Content-Encoding").collect::<Vec<_>>(),
            vec!["x-custom"]
        );
    }

    #[test]
    fn test_expressions_only_when_enabled() {
        let params = HashMap::from([("id".to_string(), "7".to_string())]);
        let context = ExpressionContext {
            path_parameters: Some(&params),
            ..Default::default()
        };
        let mut response = MockResponse {
            body: r#"id=${PATH_PARAMETER(key="id")}"#.to_string(),
            ..Default::default()
        };
        let out = assemble(&response, &context).unwrap();
        assert_eq!(out.body, Bytes::from(r#"id=${PATH_PARAMETER(key="id")}"#));

        response.using_expressions = true;
        let out = assemble(&response, &context).unwrap();
        assert_eq!(out.body, Bytes::from("id=7"));
    }

    #[test]
    fn test_encoding_error_maps_to_engine_error() {
        let err = EngineError::from(EncodingError {
            encoding: ContentEncoding::Gzip,
            source: std::io::Error::other("disk full"),
        });
        assert_eq!(err.kind(), crate::error::FailureKind::EncodingFailure);
        assert!(err.to_string().contains("GZIP"));
    }
}
