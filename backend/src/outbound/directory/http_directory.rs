//! Reqwest-backed pincode directory adapter.
//!
//! Owns transport details only: query-string construction, timeout and
//! status mapping, and decoding. Retries live in the domain's
//! `DirectoryLookup`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::DirectoryResponseDto;
use crate::domain::ports::{
    DirectoryFilter, DirectoryPage, DirectoryQuery, PincodeDirectory, PincodeDirectoryError,
};

const USER_AGENT: &str = concat!("delivery-zones/", env!("CARGO_PKG_VERSION"));

/// Pincode directory adapter issuing HTTP GET requests against one resource.
pub struct HttpPincodeDirectory {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpPincodeDirectory {
    /// Build an adapter whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl PincodeDirectory for HttpPincodeDirectory {
    async fn fetch_page(
        &self,
        query: &DirectoryQuery,
    ) -> Result<DirectoryPage, PincodeDirectoryError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query_params(query, self.api_key.as_deref()))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_page(body.as_ref())
    }
}

/// Query-string pairs for one page request.
///
/// The directory stores state and district names upper-cased and its
/// filters match exactly, so region filters are upper-cased here.
fn query_params(query: &DirectoryQuery, api_key: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(7);
    if let Some(key) = api_key {
        params.push(("api-key", key.to_owned()));
    }
    params.push(("format", "json".to_owned()));
    params.push(("offset", query.offset.to_string()));
    params.push(("limit", query.limit.to_string()));
    match &query.filter {
        DirectoryFilter::Pincode(pincode) => {
            params.push(("filters[pincode]", pincode.as_str().to_owned()));
        }
        DirectoryFilter::Region { state, district } => {
            params.push(("filters[statename]", state.as_str().to_uppercase()));
            if let Some(district) = district {
                params.push(("filters[district]", district.as_str().to_uppercase()));
            }
        }
    }
    params
}

fn parse_page(body: &[u8]) -> Result<DirectoryPage, PincodeDirectoryError> {
    let decoded: DirectoryResponseDto = serde_json::from_slice(body).map_err(|error| {
        PincodeDirectoryError::decode(format!("invalid directory JSON payload: {error}"))
    })?;
    Ok(decoded.into_page())
}

fn map_transport_error(error: reqwest::Error) -> PincodeDirectoryError {
    if error.is_timeout() {
        PincodeDirectoryError::timeout(error.to_string())
    } else {
        PincodeDirectoryError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PincodeDirectoryError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => PincodeDirectoryError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PincodeDirectoryError::timeout(message)
        }
        _ if status.is_client_error() => PincodeDirectoryError::invalid_request(message),
        _ => PincodeDirectoryError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
