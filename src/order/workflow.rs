use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::api::{
    ApiError, AutomationClient, AutomationConnector, CatalogApi, Context, Identity, TaskApi,
    TaskStatus, TaskUpdate,
};
use crate::config::RetryConfig;
use crate::error::OrderError;
use crate::metrics::{ErrorCategory, MetricsSink};
use crate::state_machine::{OperationStatus, OrderRun, OrderSummary, StateMachine, StepOutcome};

use super::mapping::{SERVICE_INSTANCE, error_context, launch_context, parse_offering_type};
use super::request::OrderRequest;

const OPERATION: &str = "ServiceOffering#order";

/// Orders a service offering on the automation engine and tracks it as a task.
///
/// The task is marked `running` before anything else happens. On success it
/// stays `running` and points at the launched job; reconciliation elsewhere
/// completes it when the job finishes. Every failure ends in exactly one
/// `completed`/`error` update.
pub struct OrderWorkflow<T, C, A, M> {
    tasks: T,
    catalog: C,
    connector: A,
    metrics: M,
    retry: RetryConfig,
}

impl<T, C, A, M> OrderWorkflow<T, C, A, M>
where
    T: TaskApi,
    C: CatalogApi,
    A: AutomationConnector,
    M: MetricsSink,
{
    pub fn new(tasks: T, catalog: C, connector: A, metrics: M) -> Self {
        Self {
            tasks,
            catalog,
            connector,
            metrics,
            retry: RetryConfig::default(),
        }
    }

    /// Retry policy for the task update written on the failure path.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self, request: OrderRequest) -> OperationStatus {
        self.run_with_summary(request).await.status
    }

    /// Runs the order and returns an audit record of what happened.
    pub async fn run_with_summary(&self, request: OrderRequest) -> OrderSummary {
        let mut run = OrderRun::new(request.task_id.as_str());
        let mut launch: Option<Context> = None;

        info!(
            operation = OPERATION,
            task_id = %request.task_id,
            service_offering_id = ?request.service_offering_id,
            service_plan_id = ?request.service_plan_id,
            "Order method entered"
        );

        match self.execute(&request, &mut run, &mut launch).await {
            Ok(()) => info!(
                operation = OPERATION,
                task_id = %request.task_id,
                service_offering_id = ?run.service_offering_id,
                job_id = ?run.job_id,
                "Order launched, task updated"
            ),
            Err(err) => {
                self.handle_failure(&request, &mut run, err, launch.as_ref())
                    .await
            }
        }

        OrderSummary::from_run(&run)
    }

    async fn execute(
        &self,
        request: &OrderRequest,
        run: &mut OrderRun,
        launch: &mut Option<Context>,
    ) -> Result<(), OrderError> {
        let task_id = request.task_id.as_str();
        let identity = &request.identity;

        self.tasks
            .update_task(task_id, &TaskUpdate::running(TaskStatus::Ok), identity)
            .await
            .map_err(OrderError::TaskUpdate)?;
        StateMachine::next(run, StepOutcome::Success);

        let offering_id = self.resolve_offering_id(request).await?;
        run.service_offering_id = Some(offering_id.clone());
        StateMachine::next(run, StepOutcome::Success);

        let offering = self
            .catalog
            .show_service_offering(&offering_id, identity)
            .await
            .map_err(OrderError::from_catalog)?;
        StateMachine::next(run, StepOutcome::Success);

        let source_id = offering.source_id.clone();
        let client = self
            .connector
            .connect(&source_id, task_id, identity)
            .map_err(|err| match err {
                ApiError::UnknownSource(_) => OrderError::Lookup(err.to_string()),
                err => OrderError::Submission(err),
            })?;
        StateMachine::next(run, StepOutcome::Success);

        let job_type = parse_offering_type(&offering)?;
        StateMachine::next(run, StepOutcome::Success);

        info!(
            operation = OPERATION,
            task_id,
            service_offering_id = %offering.id,
            source_ref = %offering.source_ref,
            %job_type,
            "Launching job"
        );
        let job = client
            .order_service(&job_type, &offering.source_ref, &request.order_params)
            .await
            .map_err(OrderError::from_submission)?;
        run.job_id = Some(job.id.clone());
        info!(
            operation = OPERATION,
            task_id,
            service_offering_id = %offering.id,
            job_id = %job.id,
            "Job has launched"
        );
        StateMachine::next(run, StepOutcome::Success);

        let context = launch
            .insert(launch_context(&job.status, &client.job_external_url(&job)))
            .clone();
        let update = TaskUpdate::running(client.job_status_to_task_status(&job.status))
            .with_context(context)
            .with_target(source_id, job.id.as_str(), SERVICE_INSTANCE);
        self.tasks
            .update_task(task_id, &update, identity)
            .await
            .map_err(OrderError::TaskUpdate)?;
        StateMachine::next(run, StepOutcome::Success);

        Ok(())
    }

    /// A direct offering id wins; the plan is only consulted without one.
    async fn resolve_offering_id(&self, request: &OrderRequest) -> Result<String, OrderError> {
        if let Some(id) = request.offering_id() {
            return Ok(id.to_string());
        }

        let Some(plan_id) = request.plan_id() else {
            return Err(OrderError::Lookup(
                "neither service_offering_id nor service_plan_id given".into(),
            ));
        };

        let plan = self
            .catalog
            .show_service_plan(plan_id, &request.identity)
            .await
            .map_err(OrderError::from_catalog)?;

        plan.service_offering_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                OrderError::Lookup(format!(
                    "ServicePlan(id: {plan_id}) has no service_offering_id"
                ))
            })
    }

    async fn handle_failure(
        &self,
        request: &OrderRequest,
        run: &mut OrderRun,
        err: OrderError,
        launch: Option<&Context>,
    ) {
        error!(
            operation = OPERATION,
            task_id = %request.task_id,
            service_offering_id = ?run.service_offering_id,
            step = %run.step,
            cause = ?std::error::Error::source(&err).map(|e| e.to_string()),
            "Ordering error: {err}"
        );
        StateMachine::next(run, StepOutcome::Failure(err.failure_kind()));

        self.metrics.record_error(ErrorCategory::Order);
        if let Some(category) = err.remote_category() {
            self.metrics.record_error(category);
        }

        let update = TaskUpdate::completed_error(error_context(&err.to_string(), launch));
        self.finalize_task(&request.task_id, &update, &request.identity)
            .await;
    }

    /// Writes the failure update with bounded retries. When every attempt
    /// fails the task stays `running` and the loss is logged and counted.
    async fn finalize_task(&self, task_id: &str, update: &TaskUpdate, identity: &Identity) {
        let attempts = self.retry.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            match self.tasks.update_task(task_id, update, identity).await {
                Ok(()) => return,
                Err(err) if attempt < attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        operation = OPERATION,
                        task_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Failed to mark task as errored, retrying: {err}"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    error!(
                        operation = OPERATION,
                        task_id,
                        attempts,
                        "Giving up on marking task as errored: {err}"
                    );
                    self.metrics.record_error(ErrorCategory::TaskUpdate);
                }
            }
        }
    }
}
