use std::net::Ipv4Addr;
use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use thiserror::Error;

pub mod dnsomatic;
pub mod icanhazip;
pub mod ip_source;
pub mod ipify;
pub mod seeip;

/// Upper bound on a single lookup, so a stuck echo service can't hang a scheduled run.
const IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request for public IP failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Request for public IP failed: service returned {0}")]
    Status(StatusCode),
    #[error("Invalid public IP: '{0}' does not appear to be an IPv4 address")]
    InvalidAddress(String),
}

pub(crate) async fn get_ip(api_url: &str) -> Result<Ipv4Addr, NetworkError> {
    let client = Client::builder().timeout(IP_LOOKUP_TIMEOUT).build()?;
    debug!("Requesting public IP from {}", api_url);
    let response = client.get(api_url).send().await?;
    if !response.status().is_success() {
        return Err(NetworkError::Status(response.status()));
    }
    let text = response.text().await?;
    parse_ipv4(&text)
}

/// Most services end the address with a newline.
fn parse_ipv4(text: &str) -> Result<Ipv4Addr, NetworkError> {
    let text = text.trim();
    text.parse()
        .map_err(|_| NetworkError::InvalidAddress(text.to_string()))
}
