#![cfg(test)]
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{header, Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ServerBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request as the stub saw it, header names lowercased.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            body: body.to_string().into_bytes(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: body.as_bytes().to_vec(),
        }
    }
}

pub type Responder = dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync;

/// Minimal upstream orchestrator double: records every request it sees and
/// answers through the supplied responder.
pub struct StubOrchestrator {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    _server_handle: JoinHandle<()>,
}

impl StubOrchestrator {
    pub async fn start(responder: Arc<Responder>) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(vec![]));

        let recorded = requests.clone();
        let server_handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let recorded = recorded.clone();
                        let responder = responder.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req: Request<Incoming>| {
                                let recorded = recorded.clone();
                                let responder = responder.clone();
                                async move {
                                    let method = req.method().to_string();
                                    let path = req.uri().path().to_string();
                                    let query = req.uri().query().map(str::to_string);
                                    let headers: HashMap<String, String> = req
                                        .headers()
                                        .iter()
                                        .filter_map(|(k, v)| {
                                            v.to_str().ok().map(|val| (k.to_string(), val.to_string()))
                                        })
                                        .collect();
                                    let body = req
                                        .into_body()
                                        .collect()
                                        .await
                                        .map(|collected| collected.to_bytes().to_vec())
                                        .unwrap_or_default();

                                    let request = RecordedRequest {
                                        method,
                                        path,
                                        query,
                                        headers,
                                        body,
                                    };
                                    let response = responder(&request);
                                    recorded.lock().unwrap().push(request);

                                    Ok::<_, hyper::Error>(
                                        Response::builder()
                                            .status(response.status)
                                            .header(header::CONTENT_TYPE, response.content_type)
                                            .body(Full::new(Bytes::from(response.body)))
                                            .unwrap(),
                                    )
                                }
                            });

                            let _ = ServerBuilder::new(hyper_util::rt::TokioExecutor::new())
                                .serve_connection(io, service)
                                .await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            addr,
            requests,
            _server_handle: server_handle,
        })
    }

    /// Stub that answers every request with the same canned response.
    pub async fn always(response: StubResponse) -> Result<Self, Box<dyn std::error::Error>> {
        Self::start(Arc::new(move |_| response.clone())).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}
