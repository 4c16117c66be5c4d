use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::run::{FailureKind, OrderRun, StepOutcome};

/// States of an order request.
///
/// An order flows through: STARTED → RUNNING → LAUNCHED | COMPLETED_ERROR.
/// LAUNCHED hands the task over to external reconciliation, which completes
/// it once the remote job finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Started,
    Running,
    Launched,
    CompletedError,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Launched | OrderState::CompletedError)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderState::Started => write!(f, "STARTED"),
            OrderState::Running => write!(f, "RUNNING"),
            OrderState::Launched => write!(f, "LAUNCHED"),
            OrderState::CompletedError => write!(f, "COMPLETED_ERROR"),
        }
    }
}

/// Steps executed by an order, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStep {
    MarkRunning,
    ResolvePlan,
    FetchOffering,
    ConnectSource,
    ParseJobType,
    LaunchJob,
    RecordLaunch,
}

impl OrderStep {
    pub fn next(self) -> Option<OrderStep> {
        match self {
            OrderStep::MarkRunning => Some(OrderStep::ResolvePlan),
            OrderStep::ResolvePlan => Some(OrderStep::FetchOffering),
            OrderStep::FetchOffering => Some(OrderStep::ConnectSource),
            OrderStep::ConnectSource => Some(OrderStep::ParseJobType),
            OrderStep::ParseJobType => Some(OrderStep::LaunchJob),
            OrderStep::LaunchJob => Some(OrderStep::RecordLaunch),
            OrderStep::RecordLaunch => None,
        }
    }
}

impl fmt::Display for OrderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStep::MarkRunning => "mark_running",
            OrderStep::ResolvePlan => "resolve_plan",
            OrderStep::FetchOffering => "fetch_offering",
            OrderStep::ConnectSource => "connect_source",
            OrderStep::ParseJobType => "parse_job_type",
            OrderStep::LaunchJob => "launch_job",
            OrderStep::RecordLaunch => "record_launch",
        };
        f.write_str(name)
    }
}

/// The result of evaluating a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Stay in the current state and move on to the next step.
    Advance(OrderStep),
    /// Enter a new state.
    Next(OrderState),
    /// The run is over (launched, or failed).
    Complete(StepOutcome),
}

/// Drives an `OrderRun` through the state machine.
pub struct StateMachine;

impl StateMachine {
    /// Compute and apply the next transition for the run given the outcome
    /// of its current step.
    ///
    /// - `MarkRunning` succeeding moves `Started` to `Running`.
    /// - `RecordLaunch` succeeding moves `Running` to `Launched`.
    /// - Any other success advances to the next step.
    /// - Any failure moves to `CompletedError` and remembers the step.
    /// - Terminal states never change.
    pub fn next(run: &mut OrderRun, outcome: StepOutcome) -> Transition {
        if run.state.is_terminal() {
            return Transition::Complete(Self::terminal_outcome(run));
        }

        let transition = match outcome {
            StepOutcome::Failure(kind) => {
                run.failed_step = Some(run.step);
                run.failure = Some(kind.clone());
                run.state_history.push(run.state);
                run.state = OrderState::CompletedError;
                Transition::Complete(StepOutcome::Failure(kind))
            }
            StepOutcome::Success => match (run.state, run.step.next()) {
                (OrderState::Started, Some(step)) => {
                    run.state_history.push(run.state);
                    run.state = OrderState::Running;
                    run.step = step;
                    Transition::Next(OrderState::Running)
                }
                (_, Some(step)) => {
                    run.step = step;
                    Transition::Advance(step)
                }
                (_, None) => {
                    run.state_history.push(run.state);
                    run.state = OrderState::Launched;
                    Transition::Next(OrderState::Launched)
                }
            },
        };

        run.updated_at = Utc::now();
        transition
    }

    fn terminal_outcome(run: &OrderRun) -> StepOutcome {
        match run.state {
            OrderState::Launched => StepOutcome::Success,
            _ => StepOutcome::Failure(
                run.failure
                    .clone()
                    .unwrap_or_else(|| FailureKind::System("order failed".into())),
            ),
        }
    }
}
