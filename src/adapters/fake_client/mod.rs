use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use crate::domain::{
    ApiError, Credentials, Dag, DagList, DagRun, DagRunList, DagRunState, DagUpdate, MarkState,
    Result, Role, Session, StatusCode, TaskInstance, TaskInstanceList, TaskState, User,
};
use crate::ports::{OrchestrationClient, SessionStore};

/// In-memory client with the same interface as `LiveClient`. Backs demos
/// and tests; the fixture semantics mirror the upstream contract (toggles
/// echo stored state, triggers prepend runs, clears reset task state).
pub struct FakeClient {
    state: RwLock<FakeState>,
    store: Arc<dyn SessionStore>,
}

struct FakeState {
    dags: Vec<Dag>,
    runs: HashMap<String, Vec<DagRun>>,
    tasks: HashMap<(String, String), Vec<TaskInstance>>,
}

impl FakeClient {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            state: RwLock::new(FakeState {
                dags: vec![],
                runs: HashMap::new(),
                tasks: HashMap::new(),
            }),
            store,
        }
    }

    /// A couple of DAGs with one run each, enough to drive every operation.
    pub fn with_fixtures(store: Arc<dyn SessionStore>) -> Self {
        let client = Self::new(store);
        {
            let mut guard = client.state.try_write().expect("fresh lock");
            let state = &mut *guard;
            state.dags = vec![fixture_dag("etl_daily", false), fixture_dag("reporting", true)];
            for dag in &state.dags {
                let run = fixture_run(&dag.dag_id, "scheduled__2026-08-20");
                state.tasks.insert(
                    (dag.dag_id.clone(), run.dag_run_id.clone()),
                    vec![
                        fixture_task(&dag.dag_id, &run.dag_run_id, "extract", TaskState::Success),
                        fixture_task(&dag.dag_id, &run.dag_run_id, "load", TaskState::Failed),
                    ],
                );
                state.runs.insert(dag.dag_id.clone(), vec![run]);
            }
        }
        client
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::http(StatusCode::NOT_FOUND, format!("{} not found", what))
    }
}

fn fixture_dag(dag_id: &str, is_paused: bool) -> Dag {
    Dag {
        dag_id: dag_id.to_string(),
        description: Some(format!("{} pipeline", dag_id)),
        is_active: true,
        is_paused,
        owners: vec!["data-platform".to_string()],
        tags: vec![],
        schedule_interval: None,
        timetable_description: Some("Daily at midnight".to_string()),
        next_dagrun: None,
        max_active_runs: Some(16),
        max_active_tasks: Some(16),
        fileloc: Some(format!("/opt/dags/{}.py", dag_id)),
    }
}

fn fixture_run(dag_id: &str, run_id: &str) -> DagRun {
    DagRun {
        dag_id: dag_id.to_string(),
        dag_run_id: run_id.to_string(),
        conf: serde_json::json!({}),
        execution_date: "2026-08-20T00:00:00+00:00".to_string(),
        logical_date: Some("2026-08-20T00:00:00+00:00".to_string()),
        start_date: Some("2026-08-20T00:00:05+00:00".to_string()),
        end_date: None,
        state: DagRunState::Success,
        external_trigger: false,
        run_type: Some("scheduled".to_string()),
        note: None,
    }
}

fn fixture_task(dag_id: &str, run_id: &str, task_id: &str, state: TaskState) -> TaskInstance {
    TaskInstance {
        task_id: task_id.to_string(),
        dag_id: dag_id.to_string(),
        dag_run_id: Some(run_id.to_string()),
        state: Some(state),
        try_number: 1,
        max_tries: 3,
        operator: Some("BashOperator".to_string()),
        duration: Some(12.5),
        execution_date: Some("2026-08-20T00:00:00+00:00".to_string()),
        start_date: Some("2026-08-20T00:00:05+00:00".to_string()),
        end_date: Some("2026-08-20T00:00:17+00:00".to_string()),
        hostname: Some("worker-1".to_string()),
        pool: Some("default_pool".to_string()),
        map_index: -1,
        note: None,
    }
}

#[async_trait]
impl OrchestrationClient for FakeClient {
    async fn list_dags(&self, limit: u32, offset: u32) -> Result<DagList> {
        let state = self.state.read().await;
        let dags: Vec<Dag> = state
            .dags
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(DagList {
            dags,
            total_entries: state.dags.len() as u32,
        })
    }

    async fn get_dag(&self, dag_id: &str) -> Result<Dag> {
        let state = self.state.read().await;
        state
            .dags
            .iter()
            .find(|d| d.dag_id == dag_id)
            .cloned()
            .ok_or_else(|| Self::not_found("DAG"))
    }

    async fn update_dag(&self, dag_id: &str, patch: DagUpdate) -> Result<Dag> {
        let mut state = self.state.write().await;
        let dag = state
            .dags
            .iter_mut()
            .find(|d| d.dag_id == dag_id)
            .ok_or_else(|| Self::not_found("DAG"))?;
        if let Some(is_paused) = patch.is_paused {
            dag.is_paused = is_paused;
        }
        Ok(dag.clone())
    }

    async fn list_runs(&self, dag_id: &str, limit: u32, offset: u32) -> Result<DagRunList> {
        let state = self.state.read().await;
        let runs = state.runs.get(dag_id).cloned().unwrap_or_default();
        Ok(DagRunList {
            dag_runs: runs
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
            total_entries: runs.len() as u32,
        })
    }

    async fn get_run(&self, dag_id: &str, run_id: &str) -> Result<DagRun> {
        let state = self.state.read().await;
        state
            .runs
            .get(dag_id)
            .and_then(|runs| runs.iter().find(|r| r.dag_run_id == run_id))
            .cloned()
            .ok_or_else(|| Self::not_found("DAG run"))
    }

    async fn trigger_run(
        &self,
        dag_id: &str,
        conf: serde_json::Value,
        logical_date: Option<String>,
    ) -> Result<DagRun> {
        let mut state = self.state.write().await;
        if !state.dags.iter().any(|d| d.dag_id == dag_id) {
            return Err(Self::not_found("DAG"));
        }
        let run_id = format!("manual__{}", Uuid::new_v4());
        let mut run = fixture_run(dag_id, &run_id);
        run.conf = conf;
        run.state = DagRunState::Queued;
        run.external_trigger = true;
        run.run_type = Some("manual".to_string());
        if let Some(logical_date) = logical_date {
            run.logical_date = Some(logical_date);
        }
        state.runs.entry(dag_id.to_string()).or_default().insert(0, run.clone());
        Ok(run)
    }

    async fn list_task_instances(
        &self,
        dag_id: &str,
        run_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TaskInstanceList> {
        let state = self.state.read().await;
        let tasks = state
            .tasks
            .get(&(dag_id.to_string(), run_id.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(TaskInstanceList {
            task_instances: tasks
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
            total_entries: tasks.len() as u32,
        })
    }

    async fn get_task_instance(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
    ) -> Result<TaskInstance> {
        let state = self.state.read().await;
        state
            .tasks
            .get(&(dag_id.to_string(), run_id.to_string()))
            .and_then(|tasks| tasks.iter().find(|t| t.task_id == task_id))
            .cloned()
            .ok_or_else(|| Self::not_found("Task instance"))
    }

    async fn clear_task_instance(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
    ) -> Result<Vec<TaskInstance>> {
        let mut state = self.state.write().await;
        let tasks = state
            .tasks
            .get_mut(&(dag_id.to_string(), run_id.to_string()))
            .ok_or_else(|| Self::not_found("DAG run"))?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| Self::not_found("Task instance"))?;
        task.state = None;
        task.end_date = None;
        Ok(vec![task.clone()])
    }

    async fn set_task_instance_state(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
        state: MarkState,
    ) -> Result<TaskInstance> {
        let mut fake = self.state.write().await;
        let tasks = fake
            .tasks
            .get_mut(&(dag_id.to_string(), run_id.to_string()))
            .ok_or_else(|| Self::not_found("DAG run"))?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| Self::not_found("Task instance"))?;
        task.state = Some(state.as_task_state());
        Ok(task.clone())
    }

    async fn task_logs(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
        try_number: u32,
    ) -> Result<String> {
        let state = self.state.read().await;
        if !state
            .tasks
            .get(&(dag_id.to_string(), run_id.to_string()))
            .map_or(false, |tasks| tasks.iter().any(|t| t.task_id == task_id))
        {
            return Err(Self::not_found("Task instance"));
        }
        Ok(format!(
            "[2026-08-20 00:00:05] {{taskinstance.py}} INFO - Starting attempt {} for task {}.{}\n\
             [2026-08-20 00:00:17] {{taskinstance.py}} INFO - Task exited with return code 0\n",
            try_number, dag_id, task_id
        ))
    }

    async fn validate_credentials(
        &self,
        _base_url: &Url,
        credentials: &Credentials,
    ) -> Result<(User, String)> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(ApiError::http(
                StatusCode::UNAUTHORIZED,
                "Authentication failed: 401",
            ));
        }
        let user = User {
            username: credentials.username.clone(),
            email: Some(format!("{}@example.com", credentials.username)),
            first_name: Some(credentials.username.clone()),
            last_name: Some("User".to_string()),
            roles: vec![Role {
                name: "Admin".to_string(),
            }],
        };
        Ok((user, credentials.token()))
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
