//! Protocol-aware rendering of engine failures.
//!
//! SOAP callers receive a SOAP 1.1 fault envelope with HTTP 500. REST callers
//! receive a JSON error whose status depends on the failure: unmatched and
//! disabled targets are 404, forwarding is 502, everything else is 500.

use crate::error::{EngineError, FailureKind};
use crate::model::ProjectKind;
use crate::response::OutboundResponse;
use serde::Serialize;

pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// HTTP status reported for `kind`.
pub fn status_for(protocol: Option<ProjectKind>, kind: FailureKind) -> u16 {
    if protocol == Some(ProjectKind::Soap) {
        return 500;
    }
    match kind {
        k if k.is_unmatched() => 404,
        FailureKind::ForwardingUnsupported => 502,
        _ => 500,
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// SOAP 1.1 fault envelope naming the failure.
pub fn soap_fault_envelope(error: &EngineError) -> String {
    let code = if error.kind().is_unmatched() {
        "soapenv:Client"
    } else {
        "soapenv:Server"
    };
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<soapenv:Body><soapenv:Fault>",
            "<faultcode>{}</faultcode>",
            "<faultstring>{}</faultstring>",
            "<detail><failure>{}</failure></detail>",
            "</soapenv:Fault></soapenv:Body></soapenv:Envelope>"
        ),
        code,
        escape_xml(&error.to_string()),
        error.kind().as_str()
    )
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

/// Response sent to the caller for a failed request.
pub fn fault_response(protocol: Option<ProjectKind>, error: &EngineError) -> OutboundResponse {
    let status = status_for(protocol, error.kind());
    match protocol {
        Some(ProjectKind::Soap) => OutboundResponse::new(status, soap_fault_envelope(error))
            .with_header("Content-Type", SOAP_CONTENT_TYPE),
        _ => {
            let body = ErrorBody {
                error: error.kind().as_str(),
                message: error.to_string(),
            };
            let json = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());
            OutboundResponse::new(status, json).with_header("Content-Type", "application/json")
        }
    }
}
