//! Mockport: SOAP and REST service mocking.
//!
//! An inbound request is matched to a configured operation, one of the
//! operation's mock responses is chosen by its response strategy, an
//! optional network delay is simulated, and the assembled response is
//! returned. Every outcome is recorded.

pub mod config;
pub mod delay;
pub mod engine;
pub mod error;
pub mod fault;
pub mod matcher;
pub mod metrics;
pub mod model;
pub mod recording;
pub mod repository;
pub mod request;
pub mod response;
pub mod selector;
pub mod server;
pub mod store;

pub use engine::MockEngine;
pub use error::{EngineError, FailureKind};
pub use request::InboundRequest;
pub use response::OutboundResponse;
pub use store::{CatalogStore, ConfigurationStore};
