//! SOAP ports, operations and resources.

use super::operation::OperationSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapPort {
    pub id: String,
    pub project_id: String,
    pub name: String,
    /// Path segment the port is served under; unique within its project.
    pub uri: String,
    pub target_namespace: Option<String>,
}

/// Name (and optionally namespace) of the SOAP body root element an operation accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl OperationIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Whether a body element with this local name and namespace is addressed to us.
    /// A missing namespace on the identifier matches any namespace.
    pub fn accepts(&self, local_name: &str, namespace: Option<&str>) -> bool {
        if self.name != local_name {
            return false;
        }
        match &self.namespace {
            Some(expected) => namespace == Some(expected.as_str()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoapVersion {
    #[default]
    Soap11,
    Soap12,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapOperation {
    pub id: String,
    pub port_id: String,
    pub name: String,
    pub identifier: OperationIdentifier,
    pub soap_action: Option<String>,
    pub version: SoapVersion,
    pub settings: OperationSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoapResourceType {
    Wsdl,
    Schema,
}

/// A WSDL or XSD document attached to a SOAP project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResource {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub resource_type: SoapResourceType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_without_namespace_accepts_any_namespace() {
        let identifier = OperationIdentifier::new("GetQuote");
        assert!(identifier.accepts("GetQuote", None));
        assert!(identifier.accepts("GetQuote", Some("urn:quotes")));
        assert!(!identifier.accepts("getQuote", None));
    }

    #[test]
    fn test_identifier_with_namespace_requires_it() {
        let identifier = OperationIdentifier {
            name: "GetQuote".to_string(),
            namespace: Some("urn:quotes".to_string()),
        };
        assert!(identifier.accepts("GetQuote", Some("urn:quotes")));
        assert!(!identifier.accepts("GetQuote", Some("urn:other")));
        assert!(!identifier.accepts("GetQuote", None));
    }
}
