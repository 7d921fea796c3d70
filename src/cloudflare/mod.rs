use std::time::Duration;

use reqwest::{header, Client, ClientBuilder, StatusCode, Url};
use thiserror::Error;

use crate::ClientError;

mod records;

pub(crate) use records::{find_record, update_record, RecordLookup};

pub(crate) const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Requests to the API give up after this long.
const API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API returned {status} - Unauthorized. Provided API token is possibly incorrect: {message}")]
    Unauthorized { status: StatusCode, message: String },
    #[error("API returned {status} - {message}")]
    Status { status: StatusCode, message: String },
    #[error("Operation failed: {0}")]
    Rejected(String),
    #[error("Cloudflare API response was malformed: {0}")]
    Malformed(String),
    #[error("Error while sending request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

pub(crate) struct CloudflareAPI<'t> {
    pub(crate) base_url: &'t str,
    pub(crate) zone_id: &'t str,
}

impl<'t> CloudflareAPI<'t> {
    pub(crate) fn records_url(&self) -> Result<Url, ApiError> {
        self.url(&[])
    }

    pub(crate) fn record_url(&self, record_id: &str) -> Result<Url, ApiError> {
        self.url(&[record_id])
    }

    /// Ids are percent-encoded as single path segments, so they can't change the endpoint.
    fn url(&self, ids: &[&str]) -> Result<Url, ApiError> {
        let ids: Vec<&str> = std::iter::once(self.zone_id)
            .chain(ids.iter().copied())
            .collect();
        if let Some(id) = ids.iter().find(|id| matches!(**id, "" | "." | "..")) {
            return Err(ApiError::InvalidUrl(format!("'{}' is not a usable id", id)));
        }

        let mut url = Url::parse(self.base_url)
            .map_err(|error| ApiError::InvalidUrl(format!("{}: {}", self.base_url, error)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{} can't take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["zones", ids[0], "dns_records"])
            .extend(&ids[1..]);
        Ok(url)
    }
}

pub(crate) fn api_client(api_token: &str) -> Result<Client, ClientError> {
    let client_builder = ClientBuilder::new().timeout(API_TIMEOUT);

    let key = format!("Bearer {}", api_token);
    let mut auth_value = header::HeaderValue::from_str(&key)?;
    let mut headers = header::HeaderMap::new();
    auth_value.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth_value);
    let accept_value = header::HeaderValue::from_static("application/json");
    headers.insert(header::ACCEPT, accept_value);
    let client = client_builder.default_headers(headers).build()?;
    Ok(client)
}
