//! Domain entities served by the engine.
//!
//! Entities are plain values. The store hands them out as `Arc` snapshots, so
//! header, encoding and expression lists are never mutated in place: an update
//! replaces the whole entity.

mod operation;
mod response;
mod rest;
mod soap;

pub use operation::{OperationSettings, OperationStatus, ResponseStrategy};
pub use response::{
    ContentEncoding, HttpHeader, JsonPathExpression, MockResponse, ResponseStatus,
    XPathExpression,
};
pub use rest::{HttpMethod, RestApplication, RestMethod, RestResource};
pub use soap::{
    OperationIdentifier, SoapOperation, SoapPort, SoapResource, SoapResourceType, SoapVersion,
};

use serde::{Deserialize, Serialize};

/// Protocol family of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Soap,
    Rest,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Soap => "soap",
            ProjectKind::Rest => "rest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ProjectKind,
}
