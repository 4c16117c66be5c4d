mod run;
mod state;

pub use run::{FailureKind, OperationStatus, OrderRun, OrderSummary, StepOutcome};
pub use state::{OrderState, OrderStep, StateMachine, Transition};
