use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{OrderState, OrderStep};

/// Distinguishes failures that need a data fix from infrastructure failures.
/// Neither is retried inside a run; the caller decides on a new invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Unresolvable ids or malformed catalog data.
    Business(String),
    /// Network, timeout or error response from a remote system.
    System(String),
}

impl FailureKind {
    /// Whether a fresh invocation could succeed without an upstream fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::System(_))
    }

    pub fn message(&self) -> &str {
        match self {
            FailureKind::Business(msg) | FailureKind::System(msg) => msg,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Business(msg) => write!(f, "Business failure: {msg}"),
            FailureKind::System(msg) => write!(f, "System failure: {msg}"),
        }
    }
}

/// The result of executing one step of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Success,
    Failure(FailureKind),
}

/// What the caller of the workflow gets back.
///
/// `Success` means the job was accepted by the engine, not that it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Error,
}

/// Progress of a single order invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRun {
    pub id: String,
    pub task_id: String,
    pub service_offering_id: Option<String>,
    pub state: OrderState,
    pub step: OrderStep,
    pub state_history: Vec<OrderState>,
    pub failed_step: Option<OrderStep>,
    pub failure: Option<FailureKind>,
    /// Remote job id once the engine accepted the launch.
    pub job_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRun {
    pub fn new(task_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            service_offering_id: None,
            state: OrderState::Started,
            step: OrderStep::MarkRunning,
            state_history: Vec::new(),
            failed_step: None,
            failure: None,
            job_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Structured record produced when a run ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub run_id: String,
    pub task_id: String,
    pub service_offering_id: Option<String>,
    pub status: OperationStatus,
    pub state: OrderState,
    pub state_transitions: Vec<OrderState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<OrderStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl OrderSummary {
    pub fn from_run(run: &OrderRun) -> Self {
        let now = Utc::now();
        let duration = now - run.created_at;
        let mut transitions = run.state_history.clone();
        transitions.push(run.state);

        let status = match run.state {
            OrderState::Launched => OperationStatus::Success,
            _ => OperationStatus::Error,
        };

        Self {
            run_id: run.id.clone(),
            task_id: run.task_id.clone(),
            service_offering_id: run.service_offering_id.clone(),
            status,
            state: run.state,
            state_transitions: transitions,
            failed_step: run.failed_step,
            error: run.failure.as_ref().map(|f| f.message().to_string()),
            job_id: run.job_id.clone(),
            started_at: run.created_at,
            completed_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_creation_defaults() {
        let run = OrderRun::new("T1");
        assert_eq!(run.task_id, "T1");
        assert_eq!(run.state, OrderState::Started);
        assert_eq!(run.step, OrderStep::MarkRunning);
        assert!(run.state_history.is_empty());
        assert!(run.failure.is_none());
        assert!(Uuid::parse_str(&run.id).is_ok());
    }

    #[test]
    fn summary_of_unfinished_run_is_error() {
        let run = OrderRun::new("T1");
        let summary = OrderSummary::from_run(&run);
        assert_eq!(summary.status, OperationStatus::Error);
        assert_eq!(summary.state_transitions, vec![OrderState::Started]);
        assert!(summary.duration_ms >= 0);
    }

    #[test]
    fn summary_serialization_skips_empty_fields() {
        let mut run = OrderRun::new("T1");
        run.state = OrderState::Launched;
        run.job_id = Some("J1".into());
        let json = serde_json::to_value(OrderSummary::from_run(&run)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["job_id"], "J1");
        assert!(json.get("error").is_none());
        assert!(json.get("failed_step").is_none());
    }

    #[test]
    fn failure_kind_display_and_retry() {
        let biz = FailureKind::Business("missing type".into());
        assert_eq!(biz.to_string(), "Business failure: missing type");
        assert!(!biz.is_retryable());

        let sys = FailureKind::System("timeout".into());
        assert_eq!(sys.to_string(), "System failure: timeout");
        assert!(sys.is_retryable());
        assert_eq!(sys.message(), "timeout");
    }
}
