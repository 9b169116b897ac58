use clap::Parser;
use mockport::config::ServerConfig;
use mockport::model::ProjectKind;
use mockport::server::MockServer;
use mockport::store::project_ids;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mockport", version, about = "SOAP and REST service mocking")]
struct Args {
    /// Server configuration file (YAML)
    #[arg(short, long, env = "MOCKPORT_CONFIG")]
    config: Option<PathBuf>,
    /// Override the listen port
    #[arg(short, long, env = "MOCKPORT_PORT")]
    port: Option<u16>,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "MOCKPORT_LOG_LEVEL", default_value = "info")]
    log_level: String,
    /// Load and validate the configuration, then exit
    #[arg(long)]
    validate: bool,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    config.validate()?;

    let server = MockServer::from_config(&config).await?;
    if args.validate {
        let catalog = server.state().catalog.as_ref();
        info!(
            soap = ?project_ids(catalog, ProjectKind::Soap),
            rest = ?project_ids(catalog, ProjectKind::Rest),
            "Configuration is valid"
        );
        return Ok(());
    }

    let addr: SocketAddr = config.listen_address().parse()?;
    server.serve(addr, shutdown_signal()).await
}
