//! reqwest-backed implementation of [`OperationsApi`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use super::{ApiError, OperationsApi};
use crate::operation::Operation;

/// User agent string for opwatch HTTP requests
const OPWATCH_USER_AGENT: &str = concat!("opwatch/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout; the monitor does its own pacing between requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct OperationEnvelope {
    operation: Operation,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Authenticated client for the operations endpoint
#[derive(Clone, Debug)]
pub struct HttpClient {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpClient {
    /// Create a client for `api_url` authenticating with a bearer `token`
    pub fn new(api_url: &str, token: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(api_url).map_err(|source| ApiError::InvalidUrl {
            url: api_url.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: api_url.to_string(),
                source: url::ParseError::RelativeUrlWithoutBase,
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::AuthenticationFailed {
                message: format!("token is not a valid header value: {}", e),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(OPWATCH_USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/v1/apps/{app}/operations/{id}`, with each part percent-encoded
    fn operation_url(&self, app: &str, operation_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "apps", app, "operations", operation_id]);
        }
        url
    }
}

#[async_trait]
impl OperationsApi for HttpClient {
    async fn fetch_operation(
        &self,
        app: &str,
        operation_id: &str,
    ) -> Result<Operation, ApiError> {
        let url = self.operation_url(app, operation_id);
        debug!("GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!("Response {}: {}", status, body);

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        let envelope: OperationEnvelope = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(envelope.operation)
    }
}
