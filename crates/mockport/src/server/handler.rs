//! Request routing for the mock server.

use super::response::{build_response_with_headers, json_response, not_found, to_http_response};
use super::ServerState;
use crate::fault::SOAP_CONTENT_TYPE;
use crate::matcher::MockTarget;
use crate::metrics::collect_metrics;
use crate::model::SoapResourceType;
use crate::recording::InvocationRecord;
use crate::request::InboundRequest;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

pub const METRICS_PATH: &str = "/metrics";
pub const INVOCATIONS_PATH: &str = "/__admin/invocations";
pub const SEQUENCES_PATH: &str = "/__admin/sequences";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvocationsResponse<'a> {
    count: usize,
    invocations: Vec<&'a InvocationRecord>,
}

pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    match (&method, path.as_str()) {
        (&Method::GET, METRICS_PATH) if state.metrics_enabled => {
            return Ok(build_response_with_headers(
                StatusCode::OK,
                [("Content-Type", "text/plain; version=0.0.4")],
                collect_metrics(),
            ));
        }
        (&Method::GET, INVOCATIONS_PATH) => {
            return Ok(list_invocations(&state, query.as_deref()));
        }
        (&Method::DELETE, INVOCATIONS_PATH) => {
            state.invocations.clear();
            return Ok(json_response(
                StatusCode::OK,
                &serde_json::json!({ "cleared": true }),
            ));
        }
        (&Method::DELETE, SEQUENCES_PATH) => {
            return Ok(reset_sequences(&state, query.as_deref()));
        }
        _ => {}
    }

    if method == Method::GET && is_wsdl_query(query.as_deref()) {
        if let Some(response) = serve_wsdl(&state, &path) {
            return Ok(response);
        }
    }

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            Bytes::new()
        }
    };

    let request = InboundRequest {
        method: method.to_string(),
        path,
        query,
        headers,
        body,
    };
    let outbound = state.engine.respond(&request).await;
    Ok(to_http_response(outbound))
}

fn list_invocations(state: &ServerState, query: Option<&str>) -> Response<Full<Bytes>> {
    let params = crate::request::parse_query_string(query);
    let invocations = match params.get("operationId") {
        Some(operation_id) => state.invocations.entries_for_operation(operation_id),
        None => state.invocations.entries(),
    };
    json_response(
        StatusCode::OK,
        &InvocationsResponse {
            count: invocations.len(),
            invocations: invocations.iter().map(|record| record.as_ref()).collect(),
        },
    )
}

/// Restart SEQUENCE selection of one operation, or of every operation.
fn reset_sequences(state: &ServerState, query: Option<&str>) -> Response<Full<Bytes>> {
    let params = crate::request::parse_query_string(query);
    let cursors = state.engine.selector().cursors();
    match params.get("operationId") {
        Some(operation_id) => {
            cursors.reset(operation_id);
            debug!(operation = %operation_id, "Reset sequence cursor");
        }
        None => {
            cursors.reset_all();
            debug!("Reset all sequence cursors");
        }
    }
    json_response(StatusCode::OK, &serde_json::json!({ "reset": true }))
}

fn is_wsdl_query(query: Option<&str>) -> bool {
    query.is_some_and(|q| q.split('&').any(|p| p.eq_ignore_ascii_case("wsdl")))
}

/// The WSDL document of the SOAP project a port URL belongs to.
fn serve_wsdl(state: &ServerState, path: &str) -> Option<Response<Full<Bytes>>> {
    let resources = state.resources.as_ref()?;
    let Some(MockTarget::Soap { project_id, .. }) =
        crate::matcher::parse_mock_path(&state.context_path, path)
    else {
        return None;
    };

    let Some(wsdl) = resources
        .find(&project_id, Some(SoapResourceType::Wsdl))
        .into_iter()
        .next()
    else {
        return Some(not_found());
    };
    match resources.load_content(&wsdl.id) {
        Ok(content) => {
            debug!(project = %project_id, resource = %wsdl.id, "Serving WSDL");
            Some(build_response_with_headers(
                StatusCode::OK,
                [("Content-Type", SOAP_CONTENT_TYPE)],
                content,
            ))
        }
        Err(e) => {
            warn!("Failed to read WSDL {}: {}", wsdl.id, e);
            Some(not_found())
        }
    }
}
