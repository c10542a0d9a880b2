use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowgate::adapters::{serve, GatewayAdapter, ReqwestUpstream};
use flowgate::config::GatewayConfig;
use flowgate::domain::GatewayService;

#[derive(Parser, Debug)]
#[clap(version = env!("FLOWGATE_VERSION"))]
pub struct Opts {
    /// listen on this network address
    #[clap(long, short = 'b')]
    bind: Option<String>,

    /// alternate configuration file
    #[clap(long, short = 'c')]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let mut config = GatewayConfig::load(opts.config.as_deref())?;
    if let Some(bind) = opts.bind {
        config.bind = bind;
    }

    let upstream = Arc::new(ReqwestUpstream::new());
    let service = Arc::new(GatewayService::new(upstream, config.upstream_api_prefix.as_str()));
    let adapter = Arc::new(GatewayAdapter::new(service, config.route_prefix.as_str()));

    let listener = TcpListener::bind(&config.bind).await?;
    info!(bind = %config.bind, prefix = %config.route_prefix, "gateway listening");

    serve(listener, adapter).await;
    Ok(())
}
