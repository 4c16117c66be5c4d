//! Orders Ansible Tower service offerings on behalf of the inventory
//! service and reports the launched job back as a task.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod order;
pub mod state_machine;

pub use error::OrderError;
pub use order::{OrderRequest, OrderWorkflow};
pub use state_machine::{OperationStatus, OrderSummary};
