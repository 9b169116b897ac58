//! Request handling pipeline.
//!
//! ```text
//! InboundRequest -> RequestMatcher -> ResponseSelector -> delay -> assemble -> record
//! ```
//!
//! Every request leaves exactly one invocation record, including requests
//! whose future is dropped while the simulated delay is pending.

use crate::delay;
use crate::error::{EngineError, FailureKind};
use crate::fault;
use crate::matcher::{Disposition, MatchedOperation, MockTarget, RequestMatcher};
use crate::metrics;
use crate::model::ProjectKind;
use crate::recording::{record_quietly, InvocationRecord, InvocationRecorder, InvocationTarget};
use crate::request::InboundRequest;
use crate::response::{assemble, ExpressionContext, OutboundResponse};
use crate::selector::{ResponseSelector, Selection};
use crate::store::ConfigurationStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Status recorded for requests abandoned by the caller.
pub const CLIENT_CLOSED_STATUS: u16 = 499;

fn protocol_label(protocol: Option<ProjectKind>) -> &'static str {
    protocol.map_or("unknown", |p| p.as_str())
}

/// Owns the in-flight invocation record and commits it exactly once.
///
/// Dropping the guard before [`InvocationGuard::succeed`] or
/// [`InvocationGuard::fail`] records the request as interrupted.
struct InvocationGuard {
    recorder: Arc<dyn InvocationRecorder>,
    record: Option<InvocationRecord>,
    started: Instant,
}

impl InvocationGuard {
    fn new(
        recorder: Arc<dyn InvocationRecorder>,
        request: &InboundRequest,
        protocol: Option<ProjectKind>,
    ) -> Self {
        let mut record = InvocationRecord::new(request.method.clone(), request.path.clone());
        record.protocol = protocol;
        Self {
            recorder,
            record: Some(record),
            started: Instant::now(),
        }
    }

    fn matched(&mut self, matched: &MatchedOperation) {
        if let Some(record) = self.record.as_mut() {
            record.target = InvocationTarget::Matched {
                project_id: matched.project_id.clone(),
                operation_id: matched.operation_id.clone(),
            };
        }
    }

    fn selected(&mut self, selection: &Selection) {
        if let Some(record) = self.record.as_mut() {
            record.mock_response_id = Some(selection.response.id.clone());
        }
    }

    fn commit(&mut self, status_code: u16, failure: Option<FailureKind>) {
        if let Some(mut record) = self.record.take() {
            record.status_code = status_code;
            record.failure = failure;
            record.duration_ms = self.started.elapsed().as_millis() as u64;
            metrics::record_request(
                protocol_label(record.protocol),
                failure.map_or("success", |f| f.as_str()),
            );
            record_quietly(self.recorder.as_ref(), record);
        }
    }

    fn succeed(mut self, status_code: u16) {
        self.commit(status_code, None);
    }

    /// The error describing a request dropped before it completed.
    fn interrupted(&self) -> EngineError {
        let operation_id = self
            .record
            .as_ref()
            .and_then(|r| r.operation_id())
            .unwrap_or("unmatched");
        EngineError::DelayInterrupted(operation_id.to_string())
    }

    fn fail(mut self, error: &EngineError) {
        let protocol = self.record.as_ref().and_then(|r| r.protocol);
        let kind = error.kind();
        self.commit(fault::status_for(protocol, kind), Some(kind));
    }
}

impl Drop for InvocationGuard {
    fn drop(&mut self) {
        if self.record.is_some() {
            let error = self.interrupted();
            debug!("{}", error);
            self.commit(CLIENT_CLOSED_STATUS, Some(error.kind()));
        }
    }
}

/// Resolves requests to mock responses and records every outcome.
pub struct MockEngine {
    matcher: RequestMatcher,
    selector: ResponseSelector,
    recorder: Arc<dyn InvocationRecorder>,
}

impl MockEngine {
    pub fn new(
        store: Arc<dyn ConfigurationStore>,
        recorder: Arc<dyn InvocationRecorder>,
        context_path: impl Into<String>,
    ) -> Self {
        Self {
            matcher: RequestMatcher::new(Arc::clone(&store), context_path),
            selector: ResponseSelector::new(store),
            recorder,
        }
    }

    pub fn matcher(&self) -> &RequestMatcher {
        &self.matcher
    }

    pub fn selector(&self) -> &ResponseSelector {
        &self.selector
    }

    /// Handle one request. Failures are recorded before they are returned.
    pub async fn handle(&self, request: &InboundRequest) -> Result<OutboundResponse, EngineError> {
        let target = self.matcher.target(request);
        let protocol = target.as_ref().map(|t| t.protocol());
        let mut guard = InvocationGuard::new(Arc::clone(&self.recorder), request, protocol);

        let result = match target {
            Some(target) => self.run(&target, request, &mut guard).await,
            None => Err(EngineError::NoMatchingResource(request.path.clone())),
        };

        match result {
            Ok(response) => {
                guard.succeed(response.status);
                Ok(response)
            }
            Err(e) => {
                warn!(
                    protocol = protocol_label(protocol),
                    method = %request.method,
                    path = %request.path,
                    failure = e.kind().as_str(),
                    "Mock request failed: {}",
                    e
                );
                guard.fail(&e);
                Err(e)
            }
        }
    }

    /// Handle one request, rendering failures the way the protocol expects.
    pub async fn respond(&self, request: &InboundRequest) -> OutboundResponse {
        match self.handle(request).await {
            Ok(response) => response,
            Err(e) => {
                let protocol = self.matcher.target(request).map(|t| t.protocol());
                fault::fault_response(protocol, &e)
            }
        }
    }

    async fn run(
        &self,
        target: &MockTarget,
        request: &InboundRequest,
        guard: &mut InvocationGuard,
    ) -> Result<OutboundResponse, EngineError> {
        let matched = self.matcher.resolve_target(target, request)?;
        guard.matched(&matched);

        match &matched.disposition {
            Disposition::Forward { endpoint } => Err(EngineError::ForwardingUnsupported {
                operation: matched.operation_id.clone(),
                endpoint: endpoint.clone(),
            }),
            Disposition::Echo => {
                delay::simulate(&matched.settings, matched.protocol.as_str()).await;
                Ok(echo(request))
            }
            Disposition::Mock => {
                let selection = self.select(&matched, request)?;
                guard.selected(&selection);
                delay::simulate(&matched.settings, matched.protocol.as_str()).await;

                let body = request.body_text();
                let context = ExpressionContext {
                    path_parameters: Some(&matched.path_parameters),
                    query: request.query_params(),
                    body: &body,
                };
                assemble(&selection.response, &context)
            }
        }
    }

    fn select(
        &self,
        matched: &MatchedOperation,
        request: &InboundRequest,
    ) -> Result<Selection, EngineError> {
        self.selector.select(
            &matched.operation_id,
            matched.settings.strategy,
            &request.body_text(),
        )
    }
}

fn echo(request: &InboundRequest) -> OutboundResponse {
    let response = OutboundResponse::new(200, request.body.clone());
    match request.header("Content-Type") {
        Some(content_type) => response.with_header("Content-Type", content_type),
        None => response,
    }
}
