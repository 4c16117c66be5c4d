use std::collections::HashMap;

use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::error::ApiError;
use super::http::{HttpTimeouts, build_client, endpoint, parse_base, read_json};
use super::types::{Identity, RemoteJob, TaskStatus};

/// Launches jobs on one automation source.
pub trait AutomationClient {
    fn order_service(
        &self,
        job_type: &str,
        source_ref: &str,
        params: &Value,
    ) -> impl Future<Output = Result<RemoteJob, ApiError>> + Send;

    /// Link to the job in the engine's web UI.
    fn job_external_url(&self, job: &RemoteJob) -> String;

    fn job_status_to_task_status(&self, status: &str) -> TaskStatus;
}

/// Builds an [`AutomationClient`] scoped to a source, task and caller.
pub trait AutomationConnector {
    type Client: AutomationClient + Send + Sync;

    fn connect(
        &self,
        source_id: &str,
        task_id: &str,
        identity: &Identity,
    ) -> Result<Self::Client, ApiError>;
}

/// Maps a native Tower job status to the task status vocabulary.
///
/// Unknown statuses map to `Pending`: the job exists and reconciliation
/// will settle it.
pub fn map_job_status(status: &str) -> TaskStatus {
    match status {
        "successful" => TaskStatus::Ok,
        "failed" | "error" | "canceled" => TaskStatus::Error,
        _ => TaskStatus::Pending,
    }
}

/// Launch endpoint collection for a job type tag written by the collector.
fn launch_collection(job_type: &str) -> Option<&'static str> {
    match job_type {
        "job_template" => Some("job_templates"),
        "workflow_job_template" => Some("workflow_job_templates"),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct LaunchRequest<'a> {
    extra_vars: &'a Value,
}

/// Tower/AWX REST client for a single source.
pub struct TowerClient {
    client: Client,
    base_url: Url,
    web_url: String,
    source_id: String,
    task_id: String,
}

impl TowerClient {
    pub fn new(
        base_url: &str,
        source_id: impl Into<String>,
        task_id: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client(timeouts)?,
            base_url: parse_base(base_url)?,
            web_url: base_url.trim_end_matches('/').to_string(),
            source_id: source_id.into(),
            task_id: task_id.into(),
        })
    }
}

impl AutomationClient for TowerClient {
    async fn order_service(
        &self,
        job_type: &str,
        source_ref: &str,
        params: &Value,
    ) -> Result<RemoteJob, ApiError> {
        let collection = launch_collection(job_type)
            .ok_or_else(|| ApiError::UnsupportedJobType(job_type.to_string()))?;
        let mut url = endpoint(
            &self.base_url,
            ["api", "v2", collection, source_ref, "launch"],
        )?;
        // Launch endpoints end with a slash.
        if let Ok(mut path) = url.path_segments_mut() {
            path.push("");
        }

        debug!(
            source_id = %self.source_id,
            task_id = %self.task_id,
            %url,
            "Launching Tower job"
        );
        let response = self
            .client
            .post(url)
            .json(&LaunchRequest { extra_vars: params })
            .send()
            .await?;
        let job: RemoteJob = read_json(response, "JobTemplate", source_ref).await?;

        info!(
            source_id = %self.source_id,
            task_id = %self.task_id,
            job_id = %job.id,
            status = %job.status,
            "Tower job launched"
        );
        Ok(job)
    }

    fn job_external_url(&self, job: &RemoteJob) -> String {
        let kind = match job.kind.as_str() {
            "workflow_job" => "workflow",
            _ => "playbook",
        };
        format!("{}/#/jobs/{kind}/{}", self.web_url, job.id)
    }

    fn job_status_to_task_status(&self, status: &str) -> TaskStatus {
        map_job_status(status)
    }
}

/// Resolves sources to Tower endpoints from configuration.
pub struct TowerConnector {
    endpoints: HashMap<String, String>,
    timeouts: HttpTimeouts,
}

impl TowerConnector {
    pub fn new(endpoints: HashMap<String, String>, timeouts: HttpTimeouts) -> Self {
        Self {
            endpoints,
            timeouts,
        }
    }
}

impl AutomationConnector for TowerConnector {
    type Client = TowerClient;

    fn connect(
        &self,
        source_id: &str,
        task_id: &str,
        _identity: &Identity,
    ) -> Result<TowerClient, ApiError> {
        let url = self
            .endpoints
            .get(source_id)
            .ok_or_else(|| ApiError::UnknownSource(source_id.to_string()))?;
        TowerClient::new(url.as_str(), source_id, task_id, self.timeouts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job(id: &str, kind: &str) -> RemoteJob {
        RemoteJob {
            id: id.into(),
            status: "pending".into(),
            kind: kind.into(),
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(map_job_status("successful"), TaskStatus::Ok);
        assert_eq!(map_job_status("failed"), TaskStatus::Error);
        assert_eq!(map_job_status("error"), TaskStatus::Error);
        assert_eq!(map_job_status("canceled"), TaskStatus::Error);
        for status in ["new", "pending", "waiting", "running", "", "something-else"] {
            assert_eq!(map_job_status(status), TaskStatus::Pending, "{status}");
        }
    }

    #[test]
    fn external_urls() {
        let client =
            TowerClient::new("https://tower/", "S1", "T1", HttpTimeouts::default()).unwrap();
        assert_eq!(
            client.job_external_url(&job("J1", "job")),
            "https://tower/#/jobs/playbook/J1"
        );
        assert_eq!(
            client.job_external_url(&job("8", "workflow_job")),
            "https://tower/#/jobs/workflow/8"
        );
    }

    #[tokio::test]
    async fn launches_job_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/R1/launch/"))
            .and(body_json(json!({"extra_vars": {"hosts": "web"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 55,
                "status": "pending",
                "type": "job",
                "job": 55
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TowerClient::new(&server.uri(), "S1", "T1", HttpTimeouts::default()).unwrap();
        let job = client
            .order_service("job_template", "R1", &json!({"hosts": "web"}))
            .await
            .unwrap();
        assert_eq!(job.id, "55");
        assert_eq!(job.status, "pending");
    }

    #[tokio::test]
    async fn launches_workflow_job_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/workflow_job_templates/12/launch/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 7,
                "status": "new",
                "type": "workflow_job"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TowerClient::new(&server.uri(), "S1", "T1", HttpTimeouts::default()).unwrap();
        let job = client
            .order_service("workflow_job_template", "12", &json!({}))
            .await
            .unwrap();
        assert_eq!(job.kind, "workflow_job");
        assert!(client.job_external_url(&job).ends_with("/#/jobs/workflow/7"));
    }

    #[tokio::test]
    async fn unsupported_job_type_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = TowerClient::new(&server.uri(), "S1", "T1", HttpTimeouts::default()).unwrap();
        let err = client
            .order_service("inventory_source", "1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedJobType(t) if t == "inventory_source"));
    }

    #[tokio::test]
    async fn source_ref_is_escaped_in_launch_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/1%2F..%2F..%2Fusers/launch/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 3,
                "status": "pending",
                "type": "job"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TowerClient::new(&server.uri(), "S1", "T1", HttpTimeouts::default()).unwrap();
        let job = client
            .order_service("job_template", "1/../../users", &json!({}))
            .await
            .unwrap();
        assert_eq!(job.id, "3");

        let err = client
            .order_service("job_template", "..", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidId(_)));
    }

    #[test]
    fn bad_source_endpoint_is_rejected() {
        let connector = TowerConnector::new(
            HashMap::from([("S1".to_string(), "tower.example.com".to_string())]),
            HttpTimeouts::default(),
        );
        let err = connector
            .connect("S1", "T1", &Identity::default())
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn launch_rejected_by_tower() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/R1/launch/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"variables_needed_to_start":["x"]}"#),
            )
            .mount(&server)
            .await;

        let client = TowerClient::new(&server.uri(), "S1", "T1", HttpTimeouts::default()).unwrap();
        let err = client
            .order_service("job_template", "R1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 400, .. }));
    }

    #[test]
    fn connector_resolves_configured_sources() {
        let connector = TowerConnector::new(
            HashMap::from([("S1".to_string(), "https://tower.example.com".to_string())]),
            HttpTimeouts::default(),
        );
        let client = connector.connect("S1", "T1", &Identity::default()).unwrap();
        assert_eq!(client.base_url.as_str(), "https://tower.example.com/");
        assert_eq!(client.web_url, "https://tower.example.com");

        let err = connector
            .connect("S2", "T1", &Identity::default())
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::UnknownSource(id) if id == "S2"));
    }
}
