use std::collections::HashMap;
use std::sync::Arc;

use hyper::body::Bytes;
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use super::{ApiError, Result, StatusCode};
use crate::ports::{OutboundRequest, UpstreamPort};

/// Custom header carrying the orchestrator the browser wants to talk to.
pub const BASE_URL_HEADER: &str = "x-orchestrator-base-url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl RelayMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMethod::Get => "GET",
            RelayMethod::Post => "POST",
            RelayMethod::Patch => "PATCH",
            RelayMethod::Put => "PUT",
            RelayMethod::Delete => "DELETE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(RelayMethod::Get),
            "POST" => Some(RelayMethod::Post),
            "PATCH" => Some(RelayMethod::Patch),
            "PUT" => Some(RelayMethod::Put),
            "DELETE" => Some(RelayMethod::Delete),
            _ => None,
        }
    }

    /// GET and DELETE never forward a body, even when the inbound request
    /// carried one.
    pub fn forwards_body(&self) -> bool {
        !matches!(self, RelayMethod::Get | RelayMethod::Delete)
    }
}

/// One inbound request as seen by the gateway, already detached from the
/// transport. `path` holds the wildcard segments below the route prefix.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: RelayMethod,
    pub path: Vec<String>,
    pub query: Option<String>,
    pub base_url: Option<String>,
    pub authorization: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayBody {
    Json(serde_json::Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: RelayBody,
}

impl RelayResponse {
    pub fn envelope(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: RelayBody::Json(json!({ "error": message.into() })),
        }
    }
}

/// Maps a relay failure to the JSON error envelope the browser sees.
/// Nothing below the gateway leaks to the caller unshaped.
pub fn error_response(err: &ApiError) -> RelayResponse {
    match err {
        ApiError::MissingBaseUrl => RelayResponse::envelope(StatusCode::BAD_REQUEST, err.to_string()),
        ApiError::MissingAuthorization => {
            RelayResponse::envelope(StatusCode::UNAUTHORIZED, err.to_string())
        }
        ApiError::UnsupportedMethod(_) => {
            RelayResponse::envelope(StatusCode::METHOD_NOT_ALLOWED, err.to_string())
        }
        ApiError::Http { status, message, .. } => RelayResponse::envelope(*status, message.clone()),
        other => RelayResponse::envelope(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// Stateless single-hop forwarder. Validates the connection headers,
/// rebuilds the upstream URL, applies the header and body policy, and
/// relays the response. Holds nothing between requests.
pub struct GatewayService {
    upstream: Arc<dyn UpstreamPort>,
    api_prefix: String,
}

impl GatewayService {
    pub fn new(upstream: Arc<dyn UpstreamPort>, api_prefix: impl Into<String>) -> Self {
        Self {
            upstream,
            api_prefix: api_prefix.into().trim_matches('/').to_string(),
        }
    }

    pub async fn handle(&self, request: InboundRequest) -> RelayResponse {
        let request_id = Uuid::new_v4();
        debug!(%request_id, method = request.method.as_str(), path = %request.path.join("/"), "relaying");
        match self.relay(&request).await {
            Ok(response) => response,
            Err(err) => {
                error!(%request_id, error = %err, "relay failed");
                error_response(&err)
            }
        }
    }

    async fn relay(&self, request: &InboundRequest) -> Result<RelayResponse> {
        let base_url = request.base_url.as_deref().ok_or(ApiError::MissingBaseUrl)?;
        let authorization = request
            .authorization
            .as_deref()
            .ok_or(ApiError::MissingAuthorization)?;

        let url = self.build_upstream_url(base_url, &request.path, request.query.as_deref())?;
        let wants_text = is_log_path(&request.path);

        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), authorization.to_string());
        headers.insert("content-type".to_string(), "application/json".to_string());
        if wants_text {
            // Upstream log endpoints return text; a JSON accept header
            // changes the response shape on some implementations.
            headers.insert("accept".to_string(), "text/plain".to_string());
        }

        let body = if request.method.forwards_body() && !request.body.is_empty() {
            Some(request.body.clone())
        } else {
            None
        };

        let outbound = OutboundRequest {
            method: request.method,
            url,
            headers,
            body,
        };

        let response = self.upstream.execute(&outbound).await?;

        if !response.status.is_success() {
            let text = String::from_utf8_lossy(&response.body).into_owned();
            let message = if text.is_empty() {
                response
                    .status
                    .canonical_reason()
                    .unwrap_or("Upstream error")
                    .to_string()
            } else {
                text
            };
            return Err(ApiError::http(response.status, message));
        }

        let is_text = wants_text
            || response
                .content_type
                .as_deref()
                .map_or(false, |ct| ct.contains("text/plain"));

        if is_text {
            let text = String::from_utf8_lossy(&response.body).into_owned();
            return Ok(RelayResponse {
                status: response.status,
                body: RelayBody::Text(text),
            });
        }

        let value: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::Decode(format!("upstream returned invalid JSON: {}", e)))?;
        Ok(RelayResponse {
            status: response.status,
            body: RelayBody::Json(value),
        })
    }

    fn build_upstream_url(
        &self,
        base_url: &str,
        segments: &[String],
        query: Option<&str>,
    ) -> Result<url::Url> {
        let mut target = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.api_prefix,
            segments.join("/")
        );
        if let Some(query) = query {
            if !query.is_empty() {
                target.push('?');
                target.push_str(query);
            }
        }
        target
            .parse()
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))
    }
}

fn is_log_path(segments: &[String]) -> bool {
    segments.iter().any(|s| s == "logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::UpstreamResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockUpstream {
        requests: Mutex<Vec<OutboundRequest>>,
        response: UpstreamResponse,
    }

    impl MockUpstream {
        fn returning(status: u16, content_type: &str, body: &str) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(vec![]),
                response: UpstreamResponse {
                    status: StatusCode::from_u16(status).unwrap(),
                    content_type: Some(content_type.to_string()),
                    body: Bytes::from(body.to_string()),
                },
            })
        }

        fn seen(&self) -> Vec<OutboundRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UpstreamPort for MockUpstream {
        async fn execute(&self, request: &OutboundRequest) -> Result<UpstreamResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn inbound(method: RelayMethod, path: &[&str]) -> InboundRequest {
        InboundRequest {
            method,
            path: path.iter().map(|s| s.to_string()).collect(),
            query: None,
            base_url: Some("http://orchestrator.local".to_string()),
            authorization: Some("Basic dXNlcjpwdw==".to_string()),
            body: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn missing_base_url_is_400_without_upstream_call() {
        let upstream = MockUpstream::returning(200, "application/json", "{}");
        let service = GatewayService::new(upstream.clone(), "api/v1");

        for method in [
            RelayMethod::Get,
            RelayMethod::Post,
            RelayMethod::Patch,
            RelayMethod::Put,
            RelayMethod::Delete,
        ] {
            let mut request = inbound(method, &["dags"]);
            request.base_url = None;
            let response = service.handle(request).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            match response.body {
                RelayBody::Json(value) => assert!(value.get("error").is_some()),
                RelayBody::Text(_) => panic!("expected a JSON envelope"),
            }
        }
        assert!(upstream.seen().is_empty());
    }

    #[tokio::test]
    async fn missing_authorization_is_401_without_upstream_call() {
        let upstream = MockUpstream::returning(200, "application/json", "{}");
        let service = GatewayService::new(upstream.clone(), "api/v1");

        let mut request = inbound(RelayMethod::Get, &["dags"]);
        request.authorization = None;
        let response = service.handle(request).await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(upstream.seen().is_empty());
    }

    #[tokio::test]
    async fn url_joins_prefix_segments_and_query() {
        let upstream = MockUpstream::returning(200, "application/json", "{\"dags\": []}");
        let service = GatewayService::new(upstream.clone(), "api/v1");

        let mut request = inbound(RelayMethod::Get, &["dags"]);
        request.base_url = Some("http://orchestrator.local/".to_string());
        request.query = Some("limit=100&offset=0".to_string());
        service.handle(request).await;

        let seen = upstream.seen();
        assert_eq!(
            seen[0].url.as_str(),
            "http://orchestrator.local/api/v1/dags?limit=100&offset=0"
        );
    }

    #[tokio::test]
    async fn logs_path_overrides_accept_and_relays_raw_text() {
        let upstream = MockUpstream::returning(200, "text/plain", "task log line\n");
        let service = GatewayService::new(upstream.clone(), "api/v1");

        let request = inbound(
            RelayMethod::Get,
            &["dags", "etl", "dagRuns", "r1", "taskInstances", "t1", "logs", "1"],
        );
        let response = service.handle(request).await;

        let seen = upstream.seen();
        assert_eq!(seen[0].headers.get("accept").map(String::as_str), Some("text/plain"));
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, RelayBody::Text("task log line\n".to_string()));
    }

    #[tokio::test]
    async fn get_and_delete_never_forward_a_body() {
        let upstream = MockUpstream::returning(200, "application/json", "{}");
        let service = GatewayService::new(upstream.clone(), "api/v1");

        for method in [RelayMethod::Get, RelayMethod::Delete] {
            let mut request = inbound(method, &["dags", "etl"]);
            request.body = Bytes::from_static(b"{\"ignored\": true}");
            service.handle(request).await;
        }

        for outbound in upstream.seen() {
            assert!(outbound.body.is_none());
        }
    }

    #[tokio::test]
    async fn patch_body_is_forwarded_unchanged() {
        let upstream = MockUpstream::returning(200, "application/json", "{}");
        let service = GatewayService::new(upstream.clone(), "api/v1");

        let payload = b"{\"is_paused\": true}";
        let mut request = inbound(RelayMethod::Patch, &["dags", "etl"]);
        request.body = Bytes::from_static(payload);
        service.handle(request).await;

        let seen = upstream.seen();
        assert_eq!(seen[0].body.as_deref(), Some(&payload[..]));
        assert_eq!(
            seen[0].headers.get("authorization").map(String::as_str),
            Some("Basic dXNlcjpwdw==")
        );
        assert_eq!(
            seen[0].headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn upstream_error_body_becomes_envelope_with_same_status() {
        let upstream = MockUpstream::returning(404, "text/plain", "not found");
        let service = GatewayService::new(upstream, "api/v1");

        let response = service.handle(inbound(RelayMethod::Get, &["dags", "missing"])).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, RelayBody::Json(json!({ "error": "not found" })));
    }

    #[tokio::test]
    async fn upstream_error_with_empty_body_uses_status_text() {
        let upstream = MockUpstream::returning(503, "text/plain", "");
        let service = GatewayService::new(upstream, "api/v1");

        let response = service.handle(inbound(RelayMethod::Get, &["dags"])).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.body,
            RelayBody::Json(json!({ "error": "Service Unavailable" }))
        );
    }

    #[tokio::test]
    async fn malformed_upstream_json_is_a_500_envelope() {
        let upstream = MockUpstream::returning(200, "application/json", "{not json");
        let service = GatewayService::new(upstream, "api/v1");

        let response = service.handle(inbound(RelayMethod::Get, &["dags"])).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
