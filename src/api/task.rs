use reqwest::{Client, Url};
use tracing::debug;

use super::error::ApiError;
use super::http::{HttpTimeouts, build_client, check_status, endpoint, parse_base, with_identity};
use super::types::{Identity, TaskUpdate};

/// Write access to the caller's task records.
pub trait TaskApi {
    /// Applies a partial update. The task service overwrites scalar fields
    /// and merges `context` into what is already stored.
    fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdate,
        identity: &Identity,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

pub struct TaskClient {
    client: Client,
    base_url: Url,
}

impl TaskClient {
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client(timeouts)?,
            base_url: parse_base(base_url)?,
        })
    }
}

impl TaskApi for TaskClient {
    async fn update_task(
        &self,
        task_id: &str,
        update: &TaskUpdate,
        identity: &Identity,
    ) -> Result<(), ApiError> {
        let url = endpoint(&self.base_url, ["tasks", task_id])?;
        debug!(%url, state = ?update.state, status = ?update.status, "Updating task");
        let response = with_identity(self.client.patch(url), identity)
            .json(update)
            .send()
            .await?;
        check_status(response, "Task", task_id).await?;
        Ok(())
    }
}
