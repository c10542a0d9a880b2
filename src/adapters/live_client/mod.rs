use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::domain::{
    ApiError, ClearTaskInstancesRequest, ClearTaskInstancesResponse, Credentials, Dag, DagList,
    DagRun, DagRunList, DagUpdate, MarkState, Result, Session, SetTaskStateRequest, StatusCode,
    TaskInstance, TaskInstanceList, TriggerRunRequest, User,
};
use crate::ports::{OrchestrationClient, SessionStore};

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Network-backed client. Reads the session store on every call and fails
/// with `NotAuthenticated` before any I/O when no session is present.
pub struct LiveClient {
    http: reqwest::Client,
    store: Arc<dyn SessionStore>,
}

impl LiveClient {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
        }
    }

    async fn session(&self) -> Result<Session> {
        self.store.get().await?.ok_or(ApiError::NotAuthenticated)
    }

    fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
            path.pop_if_empty();
            for part in API_PREFIX {
                path.push(part);
            }
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url, token: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Basic {}", token))
            .header(header::CONTENT_TYPE, "application/json")
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T> {
        let response = check_status(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Unreachable(format!("Failed to read response body: {}", e)))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Sends the request and maps transport and HTTP failures. Returns the
/// response only when the status is 2xx.
async fn check_status(builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = builder
        .send()
        .await
        .map_err(|e| ApiError::Unreachable(e.to_string()))?;

    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        message
    };
    Err(ApiError::http(status, message))
}

#[async_trait]
impl OrchestrationClient for LiveClient {
    async fn list_dags(&self, limit: u32, offset: u32) -> Result<DagList> {
        let session = self.session().await?;
        let mut url = Self::endpoint(&session.base_url, &["dags"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        self.send_json(self.request(reqwest::Method::GET, url, &session.token))
            .await
    }

    async fn get_dag(&self, dag_id: &str) -> Result<Dag> {
        let session = self.session().await?;
        let url = Self::endpoint(&session.base_url, &["dags", dag_id])?;
        self.send_json(self.request(reqwest::Method::GET, url, &session.token))
            .await
    }

    async fn update_dag(&self, dag_id: &str, patch: DagUpdate) -> Result<Dag> {
        let session = self.session().await?;
        let url = Self::endpoint(&session.base_url, &["dags", dag_id])?;
        self.send_json(
            self.request(reqwest::Method::PATCH, url, &session.token)
                .json(&patch),
        )
        .await
    }

    async fn list_runs(&self, dag_id: &str, limit: u32, offset: u32) -> Result<DagRunList> {
        let session = self.session().await?;
        let mut url = Self::endpoint(&session.base_url, &["dags", dag_id, "dagRuns"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("order_by", "-execution_date");
        self.send_json(self.request(reqwest::Method::GET, url, &session.token))
            .await
    }

    async fn get_run(&self, dag_id: &str, run_id: &str) -> Result<DagRun> {
        let session = self.session().await?;
        let url = Self::endpoint(&session.base_url, &["dags", dag_id, "dagRuns", run_id])?;
        self.send_json(self.request(reqwest::Method::GET, url, &session.token))
            .await
    }

    async fn trigger_run(
        &self,
        dag_id: &str,
        conf: serde_json::Value,
        logical_date: Option<String>,
    ) -> Result<DagRun> {
        let session = self.session().await?;
        let url = Self::endpoint(&session.base_url, &["dags", dag_id, "dagRuns"])?;
        let body = TriggerRunRequest { conf, logical_date };
        self.send_json(
            self.request(reqwest::Method::POST, url, &session.token)
                .json(&body),
        )
        .await
    }

    async fn list_task_instances(
        &self,
        dag_id: &str,
        run_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TaskInstanceList> {
        let session = self.session().await?;
        let mut url = Self::endpoint(
            &session.base_url,
            &["dags", dag_id, "dagRuns", run_id, "taskInstances"],
        )?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        self.send_json(self.request(reqwest::Method::GET, url, &session.token))
            .await
    }

    async fn get_task_instance(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
    ) -> Result<TaskInstance> {
        let session = self.session().await?;
        let url = Self::endpoint(
            &session.base_url,
            &["dags", dag_id, "dagRuns", run_id, "taskInstances", task_id],
        )?;
        self.send_json(self.request(reqwest::Method::GET, url, &session.token))
            .await
    }

    async fn clear_task_instance(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
    ) -> Result<Vec<TaskInstance>> {
        let session = self.session().await?;
        let url = Self::endpoint(&session.base_url, &["dags", dag_id, "clearTaskInstances"])?;
        let body = ClearTaskInstancesRequest::single(run_id, task_id);
        let response: ClearTaskInstancesResponse = self
            .send_json(
                self.request(reqwest::Method::POST, url, &session.token)
                    .json(&body),
            )
            .await?;
        Ok(response.task_instances)
    }

    async fn set_task_instance_state(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
        state: MarkState,
    ) -> Result<TaskInstance> {
        let session = self.session().await?;
        let url = Self::endpoint(
            &session.base_url,
            &["dags", dag_id, "dagRuns", run_id, "taskInstances", task_id],
        )?;
        self.send_json(
            self.request(reqwest::Method::PATCH, url, &session.token)
                .json(&SetTaskStateRequest { state }),
        )
        .await
    }

    async fn task_logs(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
        try_number: u32,
    ) -> Result<String> {
        let session = self.session().await?;
        let url = Self::endpoint(
            &session.base_url,
            &[
                "dags",
                dag_id,
                "dagRuns",
                run_id,
                "taskInstances",
                task_id,
                "logs",
                &try_number.to_string(),
            ],
        )?;
        let response = check_status(
            self.http
                .get(url)
                .header(header::AUTHORIZATION, format!("Basic {}", session.token))
                .header(header::ACCEPT, "text/plain"),
        )
        .await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::Unreachable(format!("Failed to read log body: {}", e)))
    }

    async fn validate_credentials(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<(User, String)> {
        let token = credentials.token();

        // Session-establishing probe. Some deployments lack this endpoint
        // entirely, so the outcome is ignored.
        if let Ok(login_url) = base_url.join("auth/login") {
            let probe = self
                .http
                .post(login_url)
                .json(&json!({
                    "username": credentials.username,
                    "password": credentials.password,
                }))
                .send()
                .await;
            if let Err(err) = probe {
                debug!(error = %err, "login probe failed, continuing");
            }
        }

        // The authoritative check: fetching the user's own record with the
        // Basic token is the sole source of truth for credential validity.
        let url = Self::endpoint(base_url, &["users", &credentials.username])?;
        let user: User = self
            .send_json(self.request(reqwest::Method::GET, url, &token))
            .await?;
        Ok((user, token))
    }

    async fn login(&self, base_url: &Url, credentials: &Credentials) -> Result<User> {
        let (user, token) = self.validate_credentials(base_url, credentials).await?;
        self.store
            .set(Session {
                base_url: base_url.clone(),
                token,
                user: user.clone(),
            })
            .await?;
        Ok(user)
    }

    async fn logout(&self) -> Result<()> {
        self.store.clear().await
    }
}
