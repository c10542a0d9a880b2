use std::collections::HashMap;

use async_trait::async_trait;
use hyper::body::Bytes;
use url::Url;

use crate::domain::{RelayMethod, Result, StatusCode};

/// One fully resolved request the gateway wants executed upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: RelayMethod,
    pub url: Url,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[async_trait]
pub trait UpstreamPort: Send + Sync {
    async fn execute(&self, request: &OutboundRequest) -> Result<UpstreamResponse>;
}
