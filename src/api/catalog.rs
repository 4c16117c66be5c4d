use reqwest::{Client, Url};
use tracing::debug;

use super::error::ApiError;
use super::http::{HttpTimeouts, build_client, endpoint, parse_base, read_json, with_identity};
use super::types::{Identity, ServiceOffering, ServicePlan};

/// Read access to service plans and offerings.
pub trait CatalogApi {
    fn show_service_plan(
        &self,
        id: &str,
        identity: &Identity,
    ) -> impl Future<Output = Result<ServicePlan, ApiError>> + Send;

    fn show_service_offering(
        &self,
        id: &str,
        identity: &Identity,
    ) -> impl Future<Output = Result<ServiceOffering, ApiError>> + Send;
}

/// HTTP client for the inventory catalog endpoints.
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client(timeouts)?,
            base_url: parse_base(base_url)?,
        })
    }
}

impl CatalogApi for CatalogClient {
    async fn show_service_plan(
        &self,
        id: &str,
        identity: &Identity,
    ) -> Result<ServicePlan, ApiError> {
        let url = endpoint(&self.base_url, ["service_plans", id])?;
        debug!(%url, "Fetching service plan");
        let response = with_identity(self.client.get(url), identity).send().await?;
        read_json(response, "ServicePlan", id).await
    }

    async fn show_service_offering(
        &self,
        id: &str,
        identity: &Identity,
    ) -> Result<ServiceOffering, ApiError> {
        let url = endpoint(&self.base_url, ["service_offerings", id])?;
        debug!(%url, "Fetching service offering");
        let response = with_identity(self.client.get(url), identity).send().await?;
        read_json(response, "ServiceOffering", id).await
    }
}
