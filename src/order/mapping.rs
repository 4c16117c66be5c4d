use serde_json::{Value, json};

use crate::api::{Context, ServiceOffering, merge_context};
use crate::error::OrderError;

/// Target type recorded on the task once a job has been launched.
pub const SERVICE_INSTANCE: &str = "ServiceInstance";

/// Reads the job type the collector stored in `extra.type`.
///
/// A missing or blank type cannot be fixed by retrying, so it is reported as
/// a data error.
pub fn parse_offering_type(offering: &ServiceOffering) -> Result<String, OrderError> {
    let job_type = offering
        .extra
        .as_ref()
        .and_then(|extra| extra.get("type"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match job_type {
        Some(t) => Ok(t.to_string()),
        None => Err(OrderError::DataIntegrity(format!(
            "Missing service offering's type: ServiceOffering(id: {}, source_ref: {})",
            offering.id, offering.source_ref
        ))),
    }
}

/// Context describing a freshly launched job.
pub fn launch_context(job_status: &str, url: &str) -> Context {
    let mut context = Context::new();
    context.insert(
        "service_instance".into(),
        json!({ "job_status": job_status, "url": url }),
    );
    context
}

/// Context for a failed order. Whatever was learned about a launched job
/// is kept next to the error so the orphaned job can be found.
pub fn error_context(message: &str, launch: Option<&Context>) -> Context {
    let mut context = Context::new();
    context.insert("error".into(), Value::String(message.to_string()));
    if let Some(launch) = launch {
        merge_context(&mut context, launch.clone());
    }
    context
}
