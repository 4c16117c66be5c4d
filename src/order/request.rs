use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::Identity;
use crate::api::types::{de_id, de_opt_id};

/// Parameters of one order invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(deserialize_with = "de_id")]
    pub task_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub service_offering_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub service_plan_id: Option<String>,
    /// Launch parameters, passed to the engine untouched.
    #[serde(default = "empty_params")]
    pub order_params: Value,
    #[serde(default)]
    pub identity: Identity,
}

fn empty_params() -> Value {
    Value::Object(Default::default())
}

fn non_empty(id: &Option<String>) -> Option<&str> {
    id.as_deref().map(str::trim).filter(|id| !id.is_empty())
}

impl OrderRequest {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            service_offering_id: None,
            service_plan_id: None,
            order_params: empty_params(),
            identity: Identity::default(),
        }
    }

    pub fn with_offering(mut self, id: impl Into<String>) -> Self {
        self.service_offering_id = Some(id.into());
        self
    }

    pub fn with_plan(mut self, id: impl Into<String>) -> Self {
        self.service_plan_id = Some(id.into());
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.order_params = params;
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Offering id given directly, ignoring blanks.
    pub fn offering_id(&self) -> Option<&str> {
        non_empty(&self.service_offering_id)
    }

    pub fn plan_id(&self) -> Option<&str> {
        non_empty(&self.service_plan_id)
    }

    pub fn from_reader(reader: impl Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}
