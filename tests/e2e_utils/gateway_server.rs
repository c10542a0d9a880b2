#![cfg(test)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use flowgate::adapters::{serve, GatewayAdapter, ReqwestUpstream};
use flowgate::domain::GatewayService;

/// A full gateway wired exactly as the binary wires it, bound to an
/// ephemeral port.
pub struct TestGatewayServer {
    addr: SocketAddr,
    _server_handle: JoinHandle<()>,
}

impl TestGatewayServer {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let upstream = Arc::new(ReqwestUpstream::new());
        let service = Arc::new(GatewayService::new(upstream, "api/v1"));
        let adapter = Arc::new(GatewayAdapter::new(service, "/api/orchestrator"));

        let server_handle = tokio::spawn(async move {
            serve(listener, adapter).await;
        });

        Ok(Self {
            addr,
            _server_handle: server_handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api/orchestrator{}", self.addr, path)
    }
}
