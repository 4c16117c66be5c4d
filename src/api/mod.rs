pub mod catalog;
pub mod error;
pub mod http;
pub mod task;
pub mod tower;
pub mod types;

pub use catalog::{CatalogApi, CatalogClient};
pub use error::ApiError;
pub use http::HttpTimeouts;
pub use task::{TaskApi, TaskClient};
pub use tower::{AutomationClient, AutomationConnector, TowerClient, TowerConnector, map_job_status};
pub use types::{
    Context, Identity, RemoteJob, ServiceOffering, ServicePlan, TaskState, TaskStatus, TaskUpdate,
    merge_context,
};
