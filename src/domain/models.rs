pub use http::StatusCode;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Bare base64 token, the value the session store keeps.
    pub fn token(&self) -> String {
        use base64::Engine;
        let credentials = format!("{}:{}", self.username, self.password);
        base64::prelude::BASE64_STANDARD.encode(credentials)
    }

    pub fn to_basic_auth(&self) -> String {
        format!("Basic {}", self.token())
    }
}

/// Everything the client persists between calls. Stored and cleared as one
/// value; logout never leaves a partial session behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub base_url: Url,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dag {
    pub dag_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub is_paused: bool,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub tags: Vec<DagTag>,
    #[serde(default)]
    pub schedule_interval: Option<ScheduleInterval>,
    #[serde(default)]
    pub timetable_description: Option<String>,
    #[serde(default)]
    pub next_dagrun: Option<String>,
    #[serde(default)]
    pub max_active_runs: Option<u32>,
    #[serde(default)]
    pub max_active_tasks: Option<u32>,
    #[serde(default)]
    pub fileloc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagTag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInterval {
    #[serde(rename = "__type")]
    pub interval_type: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DagRunState {
    Queued,
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagRun {
    pub dag_id: String,
    pub dag_run_id: String,
    #[serde(default)]
    pub conf: serde_json::Value,
    pub execution_date: String,
    #[serde(default)]
    pub logical_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub state: DagRunState,
    #[serde(default)]
    pub external_trigger: bool,
    #[serde(default)]
    pub run_type: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Success,
    Running,
    Failed,
    UpstreamFailed,
    Skipped,
    UpForRetry,
    UpForReschedule,
    Queued,
    NoStatus,
    Scheduled,
    Deferred,
    Removed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub task_id: String,
    pub dag_id: String,
    #[serde(default)]
    pub dag_run_id: Option<String>,
    #[serde(default)]
    pub state: Option<TaskState>,
    #[serde(default)]
    pub try_number: u32,
    #[serde(default)]
    pub max_tries: u32,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub execution_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub map_index: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagList {
    pub dags: Vec<Dag>,
    pub total_entries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagRunList {
    pub dag_runs: Vec<DagRun>,
    pub total_entries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstanceList {
    pub task_instances: Vec<TaskInstance>,
    pub total_entries: u32,
}

/// Partial DAG update; only the fields present are patched upstream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DagUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
}

impl DagUpdate {
    pub fn paused(is_paused: bool) -> Self {
        Self {
            is_paused: Some(is_paused),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerRunRequest {
    pub conf: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_date: Option<String>,
}

/// Clears exactly the named task instances. All propagation flags default
/// to false; nothing downstream, upstream, or run-level is touched unless
/// asked for explicitly.
#[derive(Debug, Clone, Serialize)]
pub struct ClearTaskInstancesRequest {
    pub dag_run_id: String,
    pub task_ids: Vec<String>,
    pub include_downstream: bool,
    pub include_upstream: bool,
    pub reset_dag_runs: bool,
}

impl ClearTaskInstancesRequest {
    pub fn single(dag_run_id: &str, task_id: &str) -> Self {
        Self {
            dag_run_id: dag_run_id.to_string(),
            task_ids: vec![task_id.to_string()],
            include_downstream: false,
            include_upstream: false,
            reset_dag_runs: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClearTaskInstancesResponse {
    #[serde(default)]
    pub task_instances: Vec<TaskInstance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkState {
    Success,
    Failed,
}

impl MarkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkState::Success => "success",
            MarkState::Failed => "failed",
        }
    }

    pub fn as_task_state(&self) -> TaskState {
        match self {
            MarkState::Success => TaskState::Success,
            MarkState::Failed => TaskState::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetTaskStateRequest {
    pub state: MarkState,
}

/// Parses a user-supplied run configuration. Caught here, at the edge
/// closest to the input, so a typo never turns into a network call.
pub fn parse_run_conf(raw: &str) -> crate::domain::Result<serde_json::Value> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|e| {
        crate::domain::ApiError::InvalidInput(format!("invalid run configuration: {}", e))
    })
}
