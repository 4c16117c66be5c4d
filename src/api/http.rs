use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::Identity;

/// Header carrying the caller identity on every inventory call.
pub const IDENTITY_HEADER: &str = "x-rh-identity";

/// Timeouts shared by every HTTP client in the crate.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

pub fn build_client(timeouts: HttpTimeouts) -> Result<Client, ApiError> {
    let client = Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .build()?;
    Ok(client)
}

/// Parses a configured base URL. It must be able to take path segments.
pub fn parse_base(base: &str) -> Result<Url, ApiError> {
    let url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(base.to_string()));
    }
    Ok(url)
}

/// Appends `segments` to `base`, percent-encoding each one so that `/`,
/// `?` and `#` inside an id stay part of that id.
///
/// Empty, `.` and `..` segments are rejected: the URL parser would drop
/// them and the request would land on the parent resource.
pub fn endpoint<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(base.to_string()))?;
        path.pop_if_empty();
        for segment in segments {
            if matches!(segment, "" | "." | "..") {
                return Err(ApiError::InvalidId(segment.to_string()));
            }
            path.push(segment);
        }
    }
    Ok(url)
}

pub fn with_identity(req: reqwest::RequestBuilder, identity: &Identity) -> reqwest::RequestBuilder {
    if identity.is_empty() {
        req
    } else {
        req.header(IDENTITY_HEADER, identity.as_str())
    }
}

/// Turns a non-success response into an [`ApiError`]. A 404 becomes
/// `NotFound` for the given resource.
pub async fn check_status(
    response: Response,
    resource: &'static str,
    id: &str,
) -> Result<Response, ApiError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound {
            resource,
            id: id.to_string(),
        });
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    resource: &'static str,
    id: &str,
) -> Result<T, ApiError> {
    let response = check_status(response, resource, id).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("{resource}: {e}")))
}
