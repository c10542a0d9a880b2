use async_trait::async_trait;
use url::Url;

use crate::domain::{
    Credentials, Dag, DagList, DagRun, DagRunList, DagUpdate, MarkState, Result, TaskInstance,
    TaskInstanceList, User,
};

/// One method per upstream operation. Two implementations exist, the
/// network-backed `LiveClient` and the in-memory `FakeClient`; call sites
/// pick one at composition time and never special-case.
#[async_trait]
pub trait OrchestrationClient: Send + Sync {
    async fn list_dags(&self, limit: u32, offset: u32) -> Result<DagList>;

    async fn get_dag(&self, dag_id: &str) -> Result<Dag>;

    async fn update_dag(&self, dag_id: &str, patch: DagUpdate) -> Result<Dag>;

    /// PATCHes `is_paused` and returns the server-echoed DAG. No optimistic
    /// value survives a disagreeing server; callers roll back on error.
    async fn set_dag_paused(&self, dag_id: &str, is_paused: bool) -> Result<Dag> {
        self.update_dag(dag_id, DagUpdate::paused(is_paused)).await
    }

    async fn list_runs(&self, dag_id: &str, limit: u32, offset: u32) -> Result<DagRunList>;

    async fn get_run(&self, dag_id: &str, run_id: &str) -> Result<DagRun>;

    async fn trigger_run(
        &self,
        dag_id: &str,
        conf: serde_json::Value,
        logical_date: Option<String>,
    ) -> Result<DagRun>;

    async fn list_task_instances(
        &self,
        dag_id: &str,
        run_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TaskInstanceList>;

    async fn get_task_instance(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
    ) -> Result<TaskInstance>;

    async fn clear_task_instance(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
    ) -> Result<Vec<TaskInstance>>;

    async fn set_task_instance_state(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
        state: MarkState,
    ) -> Result<TaskInstance>;

    async fn task_logs(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
        try_number: u32,
    ) -> Result<String>;

    /// Checks the credentials against the upstream and returns the user
    /// record plus the Basic token. Persists nothing; `login` does that.
    async fn validate_credentials(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<(User, String)>;

    /// Validates, then persists the session in the store.
    async fn login(&self, base_url: &Url, credentials: &Credentials) -> Result<User>;

    async fn logout(&self) -> Result<()>;
}
