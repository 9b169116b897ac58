//! HTTP/1.1 server exposing the mock URL layout.
//!
//! Besides the mock endpoints the server answers:
//!
//! - `GET /metrics` - Prometheus text format
//! - `GET /__admin/invocations[?operationId=..]` - Recorded invocations
//! - `DELETE /__admin/invocations` - Clear the invocation log
//! - `DELETE /__admin/sequences[?operationId=..]` - Restart SEQUENCE selection
//! - `GET {soap port url}?wsdl` - WSDL document of the SOAP project

mod handler;
mod response;

pub use handler::{handle_request, INVOCATIONS_PATH, METRICS_PATH, SEQUENCES_PATH};
pub use response::to_http_response;

use crate::config::{load_projects, ServerConfig};
use crate::engine::MockEngine;
use crate::recording::{CompositeRecorder, InvocationLog, InvocationRecorder, JournalRecorder};
use crate::repository::SoapResourceStore;
use crate::store::CatalogStore;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Shared state of every connection.
pub struct ServerState {
    pub engine: MockEngine,
    pub catalog: Arc<CatalogStore>,
    pub invocations: Arc<InvocationLog>,
    pub resources: Option<Arc<SoapResourceStore>>,
    pub context_path: String,
    pub metrics_enabled: bool,
}

impl ServerState {
    /// Assemble state around an already populated catalog.
    pub fn new(
        catalog: Arc<CatalogStore>,
        recorder: Arc<dyn InvocationRecorder>,
        invocations: Arc<InvocationLog>,
        context_path: impl Into<String>,
    ) -> Self {
        let context_path = context_path.into();
        Self {
            engine: MockEngine::new(catalog.clone(), recorder, context_path.clone()),
            catalog,
            invocations,
            resources: None,
            context_path,
            metrics_enabled: true,
        }
    }
}

pub struct MockServer {
    state: Arc<ServerState>,
    journal: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn from_state(state: ServerState) -> Self {
        Self {
            state: Arc::new(state),
            journal: None,
        }
    }

    /// Load every project of `config` and wire the recorders.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, anyhow::Error> {
        let catalog = Arc::new(CatalogStore::new());
        let resources = config
            .resource_directory
            .as_ref()
            .map(|dir| Arc::new(SoapResourceStore::new(dir)));
        let projects = load_projects(&config.projects, &catalog, resources.as_deref())?;
        info!("Loaded {} project(s)", projects.len());

        let invocations = Arc::new(InvocationLog::new(config.recorder.capacity));
        let mut recorder = CompositeRecorder::new().with(invocations.clone());
        let mut journal = None;
        if let Some(path) = &config.recorder.journal {
            let (journal_recorder, handle) =
                JournalRecorder::spawn(path, config.recorder.journal_buffer).await?;
            recorder = recorder.with(Arc::new(journal_recorder));
            journal = Some(handle);
        }

        let mut state = ServerState::new(
            catalog,
            Arc::new(recorder),
            invocations,
            config.context_path.clone(),
        );
        state.resources = resources;
        state.metrics_enabled = config.metrics.enabled;
        Ok(Self {
            state: Arc::new(state),
            journal,
        })
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Accept connections until `shutdown` resolves.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), anyhow::Error> {
        let addr = listener.local_addr()?;
        info!("Mockport listening on http://{}", addr);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let io = TokioIo::new(stream);
                            let state = Arc::clone(&self.state);
                            tokio::spawn(async move {
                                let service = service_fn(move |req| {
                                    let state = Arc::clone(&state);
                                    async move { handle_request(req, state).await }
                                });
                                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                    debug!("Connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error on {}: {}", addr, e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Mockport on {} shutting down", addr);
                    break;
                }
            }
        }

        // Dropping the state releases the journal sender once connections finish.
        let Self { state, journal } = self;
        drop(state);
        if let Some(handle) = journal {
            if tokio::time::timeout(std::time::Duration::from_secs(5), handle)
                .await
                .is_err()
            {
                debug!("Invocation journal still draining at shutdown");
            }
        }
        Ok(())
    }

    /// Bind `addr` and run until `shutdown` resolves.
    pub async fn serve(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        self.run(listener, shutdown).await
    }
}
