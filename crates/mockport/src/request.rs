//! Transport-independent description of an inbound request.

use bytes::Bytes;
use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    /// Path without the query string.
    pub path: String,
    pub query: Option<String>,
    /// Headers in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl InboundRequest {
    /// Build a request; a query string in `path` is split off.
    pub fn new(method: impl Into<String>, path: &str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path.to_string(), None),
        };
        Self {
            method: method.into(),
            path,
            query,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn query_params(&self) -> HashMap<String, String> {
        parse_query_string(self.query.as_deref())
    }
}

/// Parse a query string into a map; later duplicates win.
pub fn parse_query_string(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(q) = query {
        for pair in q.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(key).map(Cow::into_owned);
            let value = urlencoding::decode(&value.replace('+', " ")).map(Cow::into_owned);
            if let (Ok(key), Ok(value)) = (key, value) {
                params.insert(key, value);
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_query() {
        let request = InboundRequest::new("GET", "/orders/42?expand=items&x=1");
        assert_eq!(request.path, "/orders/42");
        assert_eq!(request.query.as_deref(), Some("expand=items&x=1"));
        assert_eq!(request.query_params().get("expand").unwrap(), "items");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = InboundRequest::new("POST", "/")
            .with_header("SOAPAction", "\"urn:get\"")
            .with_header("soapaction", "second");
        assert_eq!(request.header("soapaction"), Some("\"urn:get\""));
        assert_eq!(request.header("Content-Type"), None);
    }

    #[test]
    fn test_parse_query_string_decodes() {
        let params = parse_query_string(Some("name=John%20Doe&city=New+York&flag"));
        assert_eq!(params.get("name").unwrap(), "John Doe");
        assert_eq!(params.get("city").unwrap(), "New York");
        assert_eq!(params.get("flag").unwrap(), "");
    }
}
