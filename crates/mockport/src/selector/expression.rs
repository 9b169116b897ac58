//! XPath and JSON path evaluation against request bodies.

use crate::model::{JsonPathExpression, XPathExpression};
use serde_json_path::JsonPath;
use sxd_document::{parser, Package};
use sxd_xpath::{evaluate_xpath, Value};
use tracing::debug;

/// A request body parsed once as XML for repeated XPath evaluation.
pub struct XmlBody {
    package: Option<Package>,
}

impl XmlBody {
    pub fn parse(body: &str) -> Self {
        Self {
            package: parser::parse(body).ok(),
        }
    }

    pub fn is_xml(&self) -> bool {
        self.package.is_some()
    }

    /// Evaluate `expression` and render the result as a string.
    ///
    /// Integral numbers render without a fraction; node-sets render the
    /// string value of their first node.
    pub fn evaluate(&self, expression: &str) -> Option<String> {
        let package = self.package.as_ref()?;
        let document = package.as_document();
        match evaluate_xpath(&document, expression) {
            Ok(Value::String(s)) => Some(s),
            Ok(Value::Number(n)) => {
                if n.fract() == 0.0 {
                    Some(format!("{}", n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Ok(Value::Boolean(b)) => Some(b.to_string()),
            Ok(Value::Nodeset(nodes)) => nodes
                .document_order_first()
                .map(|node| node.string_value()),
            Err(e) => {
                debug!("XPath '{}' failed: {}", expression, e);
                None
            }
        }
    }

    /// True when every expression evaluates to its expected value. An empty
    /// expression list never matches.
    pub fn matches_all(&self, expressions: &[XPathExpression]) -> bool {
        !expressions.is_empty()
            && expressions
                .iter()
                .all(|e| self.evaluate(&e.expression).as_deref() == Some(e.value.as_str()))
    }
}

/// A request body parsed once as JSON.
pub struct JsonBody {
    value: Option<serde_json::Value>,
}

impl JsonBody {
    pub fn parse(body: &str) -> Self {
        Self {
            value: serde_json::from_str(body).ok(),
        }
    }

    /// First node selected by `expression`, rendered as a string. Strings
    /// render without quotes; other values render as compact JSON.
    pub fn evaluate(&self, expression: &str) -> Option<String> {
        let value = self.value.as_ref()?;
        let path = match JsonPath::parse(expression) {
            Ok(path) => path,
            Err(e) => {
                debug!("JSON path '{}' failed to parse: {}", expression, e);
                return None;
            }
        };
        match path.query(value).first()? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn matches_all(&self, expressions: &[JsonPathExpression]) -> bool {
        !expressions.is_empty()
            && expressions
                .iter()
                .all(|e| self.evaluate(&e.expression).as_deref() == Some(e.value.as_str()))
    }
}

/// Check that an XPath expression compiles.
pub fn validate_xpath(expression: &str) -> Result<(), String> {
    let factory = sxd_xpath::Factory::new();
    match factory.build(expression) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err("empty XPath expression".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Check that a JSON path expression parses.
pub fn validate_json_path(expression: &str) -> Result<(), String> {
    JsonPath::parse(expression)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
