use async_trait::async_trait;
use hyper::body::Bytes;

use crate::domain::{ApiError, Result, StatusCode};
use crate::ports::{OutboundRequest, UpstreamPort, UpstreamResponse};

/// Network-backed upstream executor. One shared connection pool; no
/// retries, no timeouts beyond the transport's own.
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamPort for ReqwestUpstream {
    async fn execute(&self, request: &OutboundRequest) -> Result<UpstreamResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .unwrap_or(reqwest::Method::GET);

        let mut builder = self
            .client
            .request(method, request.url.as_str())
            .headers(build_headers(&request.headers));

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(format!("HTTP request failed: {}", e)))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Unreachable(format!("Failed to read response body: {}", e)))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body: Bytes::from(body.to_vec()),
        })
    }
}

fn build_headers(headers: &std::collections::HashMap<String, String>) -> reqwest::header::HeaderMap {
    let mut header_map = reqwest::header::HeaderMap::new();

    for (key, value) in headers {
        if let (Ok(name), Ok(val)) = (
            key.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            header_map.insert(name, val);
        }
    }

    header_map
}
