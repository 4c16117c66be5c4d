use thiserror::Error;

use crate::api::ApiError;
use crate::metrics::ErrorCategory;
use crate::state_machine::FailureKind;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Invalid catalog data: {0}")]
    DataIntegrity(String),

    #[error("Catalog request failed: {0}")]
    Catalog(#[source] ApiError),

    #[error("Job submission failed: {0}")]
    Submission(#[source] ApiError),

    #[error("Task update failed: {0}")]
    TaskUpdate(#[source] ApiError),
}

impl OrderError {
    /// Lookup and data errors need an upstream fix; a new attempt cannot
    /// succeed. Remote failures may.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            OrderError::Lookup(msg) | OrderError::DataIntegrity(msg) => {
                FailureKind::Business(msg.clone())
            }
            OrderError::Catalog(err) | OrderError::Submission(err) | OrderError::TaskUpdate(err) => {
                FailureKind::System(err.to_string())
            }
        }
    }

    /// Remote-system category to count next to `order`, if any.
    pub fn remote_category(&self) -> Option<ErrorCategory> {
        match self {
            OrderError::Catalog(err) | OrderError::Submission(err) | OrderError::TaskUpdate(err) => {
                Some(err.category())
            }
            OrderError::Lookup(_) | OrderError::DataIntegrity(_) => None,
        }
    }

    /// Catalog 404s are lookup failures; anything else from the catalog is
    /// a remote-system failure.
    pub fn from_catalog(err: ApiError) -> Self {
        if err.is_not_found() {
            OrderError::Lookup(err.to_string())
        } else {
            OrderError::Catalog(err)
        }
    }

    /// A job type the engine has no launch endpoint for is bad catalog data,
    /// not a remote failure.
    pub fn from_submission(err: ApiError) -> Self {
        match err {
            ApiError::UnsupportedJobType(_) => OrderError::DataIntegrity(err.to_string()),
            err => OrderError::Submission(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = OrderError::DataIntegrity("missing type".into());
        assert_eq!(err.to_string(), "Invalid catalog data: missing type");

        let err = OrderError::TaskUpdate(ApiError::Unreachable("refused".into()));
        assert_eq!(
            err.to_string(),
            "Task update failed: remote system unreachable: refused"
        );
    }

    #[test]
    fn failure_kinds() {
        assert!(matches!(
            OrderError::Lookup("x".into()).failure_kind(),
            FailureKind::Business(_)
        ));
        assert!(matches!(
            OrderError::Submission(ApiError::Timeout { url: "u".into() }).failure_kind(),
            FailureKind::System(_)
        ));
    }

    #[test]
    fn catalog_not_found_is_lookup() {
        let err = OrderError::from_catalog(ApiError::NotFound {
            resource: "ServicePlan",
            id: "P9".into(),
        });
        assert!(matches!(err, OrderError::Lookup(ref m) if m == "ServicePlan(id: P9) not found"));
        assert!(err.remote_category().is_none());

        let err = OrderError::from_catalog(ApiError::Status {
            status: 500,
            message: String::new(),
        });
        assert_eq!(
            err.remote_category(),
            Some(ErrorCategory::RemoteSystemErrorResponse)
        );
    }

    #[test]
    fn unsupported_job_type_is_data_error() {
        let err = OrderError::from_submission(ApiError::UnsupportedJobType("project".into()));
        assert!(matches!(err, OrderError::DataIntegrity(_)));

        let err = OrderError::from_submission(ApiError::Timeout { url: "u".into() });
        assert_eq!(err.remote_category(), Some(ErrorCategory::RemoteSystemTimeout));
    }
}
