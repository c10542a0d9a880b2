use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{header, Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ServerBuilder;
use tokio::net::TcpListener;
use tracing::{error, warn};

use crate::domain::{
    error_response, ApiError, GatewayService, InboundRequest, RelayBody, RelayMethod,
    RelayResponse, StatusCode, BASE_URL_HEADER,
};

type Body = Full<Bytes>;

/// Hyper-facing edge of the gateway. Converts the wire request into the
/// domain descriptor, lets `GatewayService` decide, and renders the result.
pub struct GatewayAdapter {
    service: Arc<GatewayService>,
    route_prefix: String,
}

impl GatewayAdapter {
    pub fn new(service: Arc<GatewayService>, route_prefix: impl Into<String>) -> Self {
        let route_prefix = route_prefix.into();
        Self {
            service,
            route_prefix: format!("/{}", route_prefix.trim_matches('/')),
        }
    }

    pub async fn handle(&self, req: Request<Incoming>) -> Response<Body> {
        render(self.handle_internal(req).await)
    }

    async fn handle_internal(&self, req: Request<Incoming>) -> RelayResponse {
        let path = req.uri().path().to_string();
        let segments = match self.wildcard_segments(&path) {
            Some(segments) => segments,
            None => return RelayResponse::envelope(StatusCode::NOT_FOUND, "Unknown route"),
        };

        let method = match RelayMethod::from_str(req.method().as_str()) {
            Some(method) => method,
            None => {
                return error_response(&ApiError::UnsupportedMethod(req.method().to_string()))
            }
        };

        let query = req.uri().query().map(str::to_string);
        let base_url = header_value(&req, BASE_URL_HEADER);
        let authorization = header_value(&req, header::AUTHORIZATION.as_str());

        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!(error = %err, "failed to read inbound body");
                return RelayResponse::envelope(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
            }
        };

        self.service
            .handle(InboundRequest {
                method,
                path: segments,
                query,
                base_url,
                authorization,
                body,
            })
            .await
    }

    fn wildcard_segments(&self, path: &str) -> Option<Vec<String>> {
        let rest = path.strip_prefix(self.route_prefix.as_str())?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        Some(
            rest.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

fn header_value(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn render(response: RelayResponse) -> Response<Body> {
    let (content_type, bytes) = match response.body {
        RelayBody::Json(value) => ("application/json", Bytes::from(value.to_string())),
        RelayBody::Text(text) => ("text/plain", Bytes::from(text)),
    };
    Response::builder()
        .status(response.status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(bytes))
        .unwrap()
}

/// Accept loop used by the binary and the integration fixtures alike.
pub async fn serve(listener: TcpListener, adapter: Arc<GatewayAdapter>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let io = TokioIo::new(stream);
                let adapter = adapter.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let adapter = adapter.clone();
                        async move { Ok::<_, hyper::Error>(adapter.handle(req).await) }
                    });

                    if let Err(err) = ServerBuilder::new(hyper_util::rt::TokioExecutor::new())
                        .serve_connection(io, service)
                        .await
                    {
                        warn!(error = %err, "connection closed with error");
                    }
                });
            }
            Err(err) => {
                error!(error = %err, "accept failed");
                break;
            }
        }
    }
}
