//! Response selection: picks exactly one enabled mock response of a matched
//! operation according to its strategy.

mod expression;
mod sequence;

pub use expression::{validate_json_path, validate_xpath, JsonBody, XmlBody};
pub use sequence::SequenceCursors;

use crate::error::EngineError;
use crate::metrics;
use crate::model::{MockResponse, ResponseStrategy};
use crate::store::ConfigurationStore;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// The outcome of a successful selection.
#[derive(Debug, Clone)]
pub struct Selection {
    pub response: Arc<MockResponse>,
    /// Position of the response among the enabled candidates.
    pub index: usize,
    /// SEQUENCE cursor value consumed by this selection.
    pub cursor: Option<u64>,
    /// True when an input strategy fell back to the default response.
    pub via_default: bool,
}

impl Selection {
    fn at(candidates: &[Arc<MockResponse>], index: usize) -> Self {
        Self {
            response: Arc::clone(&candidates[index]),
            index,
            cursor: None,
            via_default: false,
        }
    }

    fn fallback(candidates: &[Arc<MockResponse>], index: usize) -> Self {
        Self {
            via_default: true,
            ..Self::at(candidates, index)
        }
    }
}

/// Chooses mock responses; owns the SEQUENCE cursors.
pub struct ResponseSelector {
    store: Arc<dyn ConfigurationStore>,
    cursors: SequenceCursors,
}

impl ResponseSelector {
    pub fn new(store: Arc<dyn ConfigurationStore>) -> Self {
        Self {
            store,
            cursors: SequenceCursors::new(),
        }
    }

    pub fn cursors(&self) -> &SequenceCursors {
        &self.cursors
    }

    /// Select a response of `operation_id` from the current store snapshot.
    pub fn select(
        &self,
        operation_id: &str,
        strategy: ResponseStrategy,
        body: &str,
    ) -> Result<Selection, EngineError> {
        let candidates = self.store.list_mock_responses(operation_id);
        let default = self.store.default_response(operation_id);
        let selection = self.select_from(operation_id, strategy, &candidates, default, body)?;
        debug!(
            operation = operation_id,
            strategy = strategy.as_str(),
            response = %selection.response.id,
            index = selection.index,
            "Selected mock response"
        );
        metrics::record_selection(strategy.as_str());
        Ok(selection)
    }

    /// Select among `candidates`, which must be enabled and in creation order.
    pub fn select_from(
        &self,
        operation_id: &str,
        strategy: ResponseStrategy,
        candidates: &[Arc<MockResponse>],
        default: Option<Arc<MockResponse>>,
        body: &str,
    ) -> Result<Selection, EngineError> {
        if candidates.is_empty() {
            return Err(EngineError::NoEnabledResponse(operation_id.to_string()));
        }
        // The default only counts when it is one of the enabled candidates.
        let default = default
            .filter(|r| r.is_enabled())
            .and_then(|d| candidates.iter().position(|r| r.id == d.id));

        match strategy {
            ResponseStrategy::Random => {
                let index = rand::thread_rng().gen_range(0..candidates.len());
                Ok(Selection::at(candidates, index))
            }
            ResponseStrategy::Sequence => {
                let (index, cursor) = self
                    .cursors
                    .next_index(operation_id, candidates.len())
                    .ok_or_else(|| EngineError::NoEnabledResponse(operation_id.to_string()))?;
                Ok(Selection {
                    cursor: Some(cursor),
                    ..Selection::at(candidates, index)
                })
            }
            ResponseStrategy::XPathInput => {
                let xml = XmlBody::parse(body);
                let found = candidates
                    .iter()
                    .position(|r| xml.matches_all(&r.xpath_expressions));
                input_selection(operation_id, candidates, found, default)
            }
            ResponseStrategy::JsonPathInput => {
                let json = JsonBody::parse(body);
                let found = candidates
                    .iter()
                    .position(|r| json.matches_all(&r.json_path_expressions));
                input_selection(operation_id, candidates, found, default)
            }
            ResponseStrategy::Default => {
                if candidates.len() == 1 {
                    return Ok(Selection::at(candidates, 0));
                }
                match default {
                    Some(index) => Ok(Selection::fallback(candidates, index)),
                    None => Ok(Selection::at(candidates, 0)),
                }
            }
        }
    }
}

fn input_selection(
    operation_id: &str,
    candidates: &[Arc<MockResponse>],
    found: Option<usize>,
    default: Option<usize>,
) -> Result<Selection, EngineError> {
    match (found, default) {
        (Some(index), _) => Ok(Selection::at(candidates, index)),
        (None, Some(index)) => Ok(Selection::fallback(candidates, index)),
        (None, None) => Err(EngineError::NoMatchingResponse(operation_id.to_string())),
    }
}
