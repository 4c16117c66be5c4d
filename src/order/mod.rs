//! The order-request workflow: resolve an offering, launch it on the
//! automation engine and report the job back on the caller's task.

mod mapping;
mod request;
mod workflow;

pub use mapping::{SERVICE_INSTANCE, error_context, launch_context, parse_offering_type};
pub use request::OrderRequest;
pub use workflow::OrderWorkflow;
